//! The closed catalog of conversion rules.
//!
//! Rule ids arrive as strings from the rule configuration store. They are
//! parsed once into [`RuleKind`] and dispatched by `match` afterwards.
//! Unknown ids are kept as [`RuleKind::Unknown`] and behave as identity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateStyle {
    /// `YYYY/MM/DD`
    Slash,
    /// `YYYY-MM-DD`
    Hyphen,
}

impl DateStyle {
    pub fn separator(self) -> char {
        match self {
            DateStyle::Slash => '/',
            DateStyle::Hyphen => '-',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenderCode {
    /// `1` / `2`
    Numeric,
    /// `M` / `F`
    Letter,
    /// `男` / `女`
    Kanji,
    /// `男性` / `女性`
    KanjiFull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KanaDirection {
    FullToHalf,
    HalfToFull,
}

/// Rules resolved through the tenant's fixed-value table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FixedRule {
    GroupNo,
    TimeCode1,
    TimeCode2,
    CauseCode1,
    TimeStart,
    TimeEnd,
}

impl FixedRule {
    pub const ALL: [FixedRule; 6] = [
        FixedRule::GroupNo,
        FixedRule::TimeCode1,
        FixedRule::TimeCode2,
        FixedRule::CauseCode1,
        FixedRule::TimeStart,
        FixedRule::TimeEnd,
    ];

    pub fn id(self) -> &'static str {
        match self {
            FixedRule::GroupNo => "GROUP_NO",
            FixedRule::TimeCode1 => "TIME_CODE1",
            FixedRule::TimeCode2 => "TIME_CODE2",
            FixedRule::CauseCode1 => "CAUSE_CODE1",
            FixedRule::TimeStart => "TIME_START",
            FixedRule::TimeEnd => "TIME_END",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        let id = strip_prefix(id);
        Self::ALL.into_iter().find(|rule| rule.id() == id)
    }
}

impl fmt::Display for FixedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleKind {
    NotChange,
    Date(DateStyle),
    Gender(GenderCode),
    Kana(KanaDirection),
    PostalFormat,
    TimeBucket,
    Fixed(FixedRule),
    Unknown(String),
}

/// Pure rules in catalog order with their legacy aliases.
const PURE_RULES: &[(&str, &[&str], RuleKind)] = &[
    ("NOT_CHANGE", &["CR_NOT_CHANGE"], RuleKind::NotChange),
    ("DATE1", &["CR_DATE1"], RuleKind::Date(DateStyle::Slash)),
    ("DATE2", &["CR_DATE2"], RuleKind::Date(DateStyle::Hyphen)),
    ("GENDER_12", &["CR_G_12"], RuleKind::Gender(GenderCode::Numeric)),
    ("GENDER_MF", &["CR_G_MF"], RuleKind::Gender(GenderCode::Letter)),
    ("GENDER_KANJI", &["CR_G_KANJI"], RuleKind::Gender(GenderCode::Kanji)),
    (
        "GENDER_KANJI_FULL",
        &["CR_G_KANJI_FULL"],
        RuleKind::Gender(GenderCode::KanjiFull),
    ),
    (
        "KANA_FULL_TO_HALF",
        &["CR_KANA_F-H"],
        RuleKind::Kana(KanaDirection::FullToHalf),
    ),
    (
        "KANA_HALF_TO_FULL",
        &["CR_KANA_H-F"],
        RuleKind::Kana(KanaDirection::HalfToFull),
    ),
    ("POSTAL_FORMAT", &["CR_POSTAL_FORMAT"], RuleKind::PostalFormat),
    ("TIME_BUCKET", &["CR_TIME_BUCKET"], RuleKind::TimeBucket),
];

fn strip_prefix(id: &str) -> &str {
    let id = id.trim();
    id.strip_prefix("CR_").unwrap_or(id)
}

impl RuleKind {
    /// Parses a rule id; never fails, unknown ids become [`RuleKind::Unknown`].
    pub fn parse(id: &str) -> Self {
        let trimmed = id.trim();
        if let Some((_, _, kind)) = PURE_RULES
            .iter()
            .find(|(name, aliases, _)| {
                *name == trimmed || aliases.iter().any(|alias| *alias == trimmed)
            })
        {
            return kind.clone();
        }
        if let Some(rule) = FixedRule::from_id(trimmed) {
            return RuleKind::Fixed(rule);
        }
        RuleKind::Unknown(id.to_string())
    }

    /// Canonical id of this rule.
    pub fn id(&self) -> &str {
        match self {
            RuleKind::Fixed(rule) => rule.id(),
            RuleKind::Unknown(id) => id,
            pure => PURE_RULES
                .iter()
                .find(|(_, _, kind)| kind == pure)
                .map_or("", |(name, _, _)| name),
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, RuleKind::Fixed(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, RuleKind::Unknown(_))
    }

    pub fn description(&self) -> &'static str {
        match self {
            RuleKind::NotChange => "copy the value unchanged",
            RuleKind::Date(DateStyle::Slash) => "parse any supported date, emit YYYY/MM/DD",
            RuleKind::Date(DateStyle::Hyphen) => "parse any supported date, emit YYYY-MM-DD",
            RuleKind::Gender(GenderCode::Numeric) => "gender as 1 / 2",
            RuleKind::Gender(GenderCode::Letter) => "gender as M / F",
            RuleKind::Gender(GenderCode::Kanji) => "gender as 男 / 女",
            RuleKind::Gender(GenderCode::KanjiFull) => "gender as 男性 / 女性",
            RuleKind::Kana(KanaDirection::FullToHalf) => "hiragana and katakana to half-width",
            RuleKind::Kana(KanaDirection::HalfToFull) => "hiragana and half-width kana to full-width",
            RuleKind::PostalFormat => "postal code as XXX-XXXX",
            RuleKind::TimeBucket => "round H:MM up to a quarter hour, emit HHMM",
            RuleKind::Fixed(_) => "tenant fixed-value lookup",
            RuleKind::Unknown(_) => "unknown rule, value passes through",
        }
    }
}

impl FromStr for RuleKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(RuleKind::parse(s))
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Whether `rule_id` names a fixed-value lookup rather than a pure function.
pub fn is_fixed_rule(rule_id: &str) -> bool {
    FixedRule::from_id(rule_id).is_some()
}

/// One catalog entry for listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: &'static str,
    pub aliases: Vec<&'static str>,
    pub kind: RuleKind,
}

/// Every known rule, pure rules first, then fixed-value rules.
pub fn catalog() -> Vec<CatalogEntry> {
    let pure = PURE_RULES.iter().map(|(id, aliases, kind)| CatalogEntry {
        id: *id,
        aliases: aliases.to_vec(),
        kind: kind.clone(),
    });
    let fixed = FixedRule::ALL.into_iter().map(|rule| CatalogEntry {
        id: rule.id(),
        aliases: Vec::new(),
        kind: RuleKind::Fixed(rule),
    });
    pure.chain(fixed).collect()
}
