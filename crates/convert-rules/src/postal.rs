use std::sync::LazyLock;

use regex::Regex;

use crate::digits::to_ascii_digits_and_hyphens;

static POSTAL_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{3})-?(\d{4})").expect("postal pattern is valid"));

/// Formats a Japanese postal code as `XXX-XXXX`.
///
/// Full-width digits and dashes are folded to ASCII, then everything except
/// digits and hyphens is stripped; input that still does not look like a
/// postal code is returned stripped.
pub fn format_postal_code(value: &str) -> String {
    let stripped: String = to_ascii_digits_and_hyphens(value)
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .collect();
    match POSTAL_CODE.captures(&stripped) {
        Some(caps) => format!("{}-{}", &caps[1], &caps[2]),
        None => stripped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_codes() {
        assert_eq!(format_postal_code("1234567"), "123-4567");
        assert_eq!(format_postal_code("〒123-4567"), "123-4567");
        assert_eq!(format_postal_code("123 4567"), "123-4567");
        assert_eq!(format_postal_code("123-4567"), "123-4567");
    }

    #[test]
    fn full_width_codes_are_folded() {
        assert_eq!(format_postal_code("〒１２３４５６７"), "123-4567");
        assert_eq!(format_postal_code("１２３－４５６７"), "123-4567");
        assert_eq!(format_postal_code("〒１２３ー４５６７"), "123-4567");
    }

    #[test]
    fn unmatched_input_is_stripped() {
        assert_eq!(format_postal_code("TEL 03-1234"), "03-1234");
        assert_eq!(format_postal_code(""), "");
    }
}
