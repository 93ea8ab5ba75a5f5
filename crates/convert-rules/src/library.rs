use crate::date::convert_date;
use crate::gender::convert_gender;
use crate::kana::convert_kana;
use crate::postal::format_postal_code;
use crate::rule::RuleKind;
use crate::time::bucket_time;

/// Applies a pure rule to `value`.
///
/// Fixed-value rules need a tenant table and are applied through
/// [`crate::FixedValueSnapshot`]; here they leave the value unchanged, as do
/// unknown rules.
pub fn apply(value: &str, rule: &RuleKind) -> String {
    match rule {
        RuleKind::NotChange => value.to_string(),
        RuleKind::Date(style) => convert_date(value, *style),
        RuleKind::Gender(code) => convert_gender(value, *code),
        RuleKind::Kana(direction) => convert_kana(value, *direction),
        RuleKind::PostalFormat => format_postal_code(value),
        RuleKind::TimeBucket => bucket_time(value),
        RuleKind::Fixed(fixed) => {
            tracing::debug!(rule = %fixed, "fixed-value rule applied without a table");
            value.to_string()
        }
        RuleKind::Unknown(rule_id) => {
            tracing::warn!(rule_id = %rule_id, "unknown conversion rule, value passes through");
            value.to_string()
        }
    }
}

/// Parses `rule_id` and applies it to `value`.
pub fn apply_rule(value: &str, rule_id: &str) -> String {
    apply(value, &RuleKind::parse(rule_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_by_id() {
        assert_eq!(apply_rule("令和5年4月1日", "DATE1"), "2023/04/01");
        assert_eq!(apply_rule("男性", "GENDER_MF"), "M");
        assert_eq!(apply_rule("1234567", "CR_POSTAL_FORMAT"), "123-4567");
        assert_eq!(apply_rule("09:07", "TIME_BUCKET"), "0915");
        assert_eq!(apply_rule("ﾀﾛｳ", "KANA_HALF_TO_FULL"), "タロウ");
        assert_eq!(apply_rule(" keep ", "NOT_CHANGE"), " keep ");
    }

    #[test]
    fn unknown_and_fixed_rules_pass_through() {
        assert_eq!(apply_rule("abc", "NOT_A_REAL_RULE"), "abc");
        assert_eq!(apply_rule("X", "GROUP_NO"), "X");
    }
}
