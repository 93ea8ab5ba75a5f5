//! Folding of full-width digits and dash variants to ASCII.

/// Replaces full-width digits so they parse as numbers.
pub(crate) fn to_ascii_digits(value: &str) -> String {
    value.chars().map(ascii_digit).collect()
}

/// Like [`to_ascii_digits`], also turning dash-like characters into `-`.
pub(crate) fn to_ascii_digits_and_hyphens(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '－' | 'ー' | 'ｰ' | '‐' | '‑' | '‒' | '–' | '—' | '―' | '−' => '-',
            other => ascii_digit(other),
        })
        .collect()
}

fn ascii_digit(c: char) -> char {
    match c {
        '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_full_width_forms() {
        assert_eq!(to_ascii_digits("令和５年１２月"), "令和5年12月");
        assert_eq!(to_ascii_digits("１２３－４５６７"), "123－4567");
        assert_eq!(to_ascii_digits_and_hyphens("１２３－４５６７"), "123-4567");
        assert_eq!(to_ascii_digits_and_hyphens("123ー4567"), "123-4567");
    }
}
