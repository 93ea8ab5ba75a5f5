use crate::rule::GenderCode;

/// Looks `value` up in the table of the target `code`; no trimming or case
/// folding.
fn lookup(value: &str, code: GenderCode) -> Option<&'static str> {
    match code {
        GenderCode::Numeric => match value {
            "男" | "男性" | "1" => Some("1"),
            "女" | "女性" | "2" => Some("2"),
            _ => None,
        },
        GenderCode::Letter => match value {
            "男" | "男性" | "1" | "M" => Some("M"),
            "女" | "女性" | "2" | "F" => Some("F"),
            _ => None,
        },
        GenderCode::Kanji => match value {
            "1" | "M" | "男性" => Some("男"),
            "2" | "F" | "女性" => Some("女"),
            _ => None,
        },
        GenderCode::KanjiFull => match value {
            "1" | "M" | "男" => Some("男性"),
            "2" | "F" | "女" => Some("女性"),
            _ => None,
        },
    }
}

/// Maps a gender value to `code`; unrecognized values pass through.
pub fn convert_gender(value: &str, code: GenderCode) -> String {
    lookup(value, code).map_or_else(|| value.to_string(), str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_every_representation() {
        assert_eq!(convert_gender("男性", GenderCode::Letter), "M");
        assert_eq!(convert_gender("女", GenderCode::Numeric), "2");
        assert_eq!(convert_gender("2", GenderCode::Numeric), "2");
        assert_eq!(convert_gender("1", GenderCode::Letter), "M");
        assert_eq!(convert_gender("F", GenderCode::KanjiFull), "女性");
        assert_eq!(convert_gender("男性", GenderCode::Kanji), "男");
        assert_eq!(convert_gender("男性", GenderCode::KanjiFull), "男性");
    }

    #[test]
    fn unknown_values_pass_through() {
        assert_eq!(convert_gender("不明", GenderCode::Numeric), "不明");
        assert_eq!(convert_gender("", GenderCode::Letter), "");
    }

    #[test]
    fn letters_and_padding_are_not_numeric_inputs() {
        assert_eq!(convert_gender("M", GenderCode::Numeric), "M");
        assert_eq!(convert_gender("f", GenderCode::Numeric), "f");
        assert_eq!(convert_gender("m", GenderCode::Letter), "m");
        assert_eq!(convert_gender(" 男 ", GenderCode::Kanji), " 男 ");
    }
}
