use std::collections::BTreeMap;
use std::sync::Arc;

use convert_map::{RowMapper, RuleSet};
use convert_model::{HeaderDescriptor, RawRow, RuleBinding, Stage, StageLayout, TenantId};
use convert_rules::{FixedRule, FixedValueCache, InMemoryFixedValues};
use proptest::prelude::*;

const RULES: &[&str] = &[
    "NOT_CHANGE",
    "DATE1",
    "DATE2",
    "GENDER_12",
    "GENDER_MF",
    "KANA_FULL_TO_HALF",
    "KANA_HALF_TO_FULL",
    "POSTAL_FORMAT",
    "TIME_BUCKET",
    "GROUP_NO",
    "NOT_A_REAL_RULE",
];

fn input_layout() -> StageLayout {
    StageLayout::new(
        Stage::Input,
        vec![
            HeaderDescriptor::new("氏名", 0),
            HeaderDescriptor::new("フリガナ", 1),
            HeaderDescriptor::new("生年月日", 2),
            HeaderDescriptor::new("性別", 3),
            HeaderDescriptor::new("郵便番号", 4),
            HeaderDescriptor::new("グループ", 6),
        ],
    )
    .unwrap()
}

fn display_layout() -> StageLayout {
    StageLayout::from_names(
        Stage::Display,
        ["カナ", "氏名", "性別", "生年月日", "郵便番号", "グループ", "備考"],
    )
}

fn fixed_cache() -> FixedValueCache {
    let mut values = InMemoryFixedValues::new();
    values.insert(TenantId(1), FixedRule::GroupNo, "A", "G-01");
    FixedValueCache::new(Arc::new(values))
}

fn mapper() -> RowMapper {
    let before = input_layout();
    let rules = RuleSet::compile(
        &[
            RuleBinding::new("NOT_CHANGE", 0, 1),
            RuleBinding::new("KANA_FULL_TO_HALF", 1, 0),
            RuleBinding::new("DATE1", 2, 3),
            RuleBinding::new("GENDER_MF", 3, 2),
            RuleBinding::new("POSTAL_FORMAT", 4, 4),
            RuleBinding::new("GROUP_NO", 6, 5),
        ],
        &before,
        &display_layout(),
    )
    .unwrap();
    let snapshot = fixed_cache().snapshot(TenantId(1), rules.fixed_rules());
    RowMapper::new(rules, before, snapshot)
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

#[test]
fn maps_a_named_row_into_display_order() {
    let named: BTreeMap<String, String> = [
        ("氏名", "山田 太郎"),
        ("フリガナ", "やまだ たろう"),
        ("生年月日", "S50.1.2"),
        ("性別", "男性"),
        ("郵便番号", "〒150-0001"),
        ("グループ", "A"),
        ("extra", "dropped"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let mapped = mapper().map_raw(RawRow::Named(named));
    assert_eq!(
        mapped,
        strings(&[
            "ﾔﾏﾀﾞ ﾀﾛｳ",
            "山田 太郎",
            "M",
            "1975/01/02",
            "150-0001",
            "G-01",
            ""
        ])
    );
}

#[test]
fn missing_header_maps_to_empty() {
    let named: BTreeMap<String, String> =
        BTreeMap::from([("氏名".to_string(), "佐藤".to_string())]);
    let mapped = mapper().map_raw(RawRow::Named(named));
    assert_eq!(mapped, strings(&["", "佐藤", "", "", "", "", ""]));
}

#[test]
fn fixed_lookup_miss_returns_original_value() {
    let mapped = mapper().map_row(&strings(&["", "", "", "", "", "", "X"]));
    assert_eq!(mapped[5], "X");
}

#[test]
fn bad_dates_fall_back_to_raw_value() {
    let mapped = mapper().map_row(&strings(&["", "", "someday", "?", "", "", ""]));
    assert_eq!(mapped[3], "someday");
    assert_eq!(mapped[2], "?");
}

fn binding_sets() -> impl Strategy<Value = Vec<RuleBinding>> {
    (
        proptest::collection::btree_set(0usize..7, 1..7),
        0usize..20,
        proptest::collection::vec(proptest::sample::select(RULES.to_vec()), 7),
    )
        .prop_map(|(destinations, offset, rules)| {
            destinations
                .into_iter()
                .zip(rules)
                .map(|(destination, rule)| {
                    RuleBinding::new(rule, (destination + offset) % 20, destination)
                })
                .collect()
        })
}

fn raw_rows() -> impl Strategy<Value = RawRow> {
    prop_oneof![
        proptest::collection::vec(".{0,8}", 0..12).prop_map(RawRow::Positional),
        proptest::collection::btree_map(
            proptest::sample::select(vec!["氏名", "生年月日", "性別", "unknown"]),
            ".{0,8}",
            0..4,
        )
        .prop_map(|map| RawRow::Named(
            map.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
        )),
    ]
}

proptest! {
    #[test]
    fn mapped_rows_always_have_destination_width(
        bindings in binding_sets(),
        row in raw_rows(),
    ) {
        let before = input_layout();
        let after = display_layout();
        let rules = RuleSet::compile(&bindings, &before, &after).unwrap();
        let snapshot = fixed_cache().snapshot(TenantId(1), rules.fixed_rules());
        let mapper = RowMapper::new(rules, before, snapshot);
        let mapped = mapper.map_raw(row.clone());
        prop_assert_eq!(mapped.len(), after.width());
        prop_assert_eq!(mapper.map_raw(row), mapped);
    }
}
