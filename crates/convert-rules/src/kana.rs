//! Kana normalization: hiragana to katakana, then width conversion.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::rule::KanaDirection;

/// Full-width katakana and kana punctuation with their half-width forms.
///
/// Voiced and semi-voiced letters expand to a base letter plus a separate
/// half-width sound mark.
const KANA_WIDTH: &[(char, &str)] = &[
    ('ァ', "ｧ"), ('ア', "ｱ"), ('ィ', "ｨ"), ('イ', "ｲ"), ('ゥ', "ｩ"), ('ウ', "ｳ"), ('ェ', "ｪ"),
    ('エ', "ｴ"), ('ォ', "ｫ"), ('オ', "ｵ"), ('カ', "ｶ"), ('ガ', "ｶﾞ"), ('キ', "ｷ"), ('ギ', "ｷﾞ"),
    ('ク', "ｸ"), ('グ', "ｸﾞ"), ('ケ', "ｹ"), ('ゲ', "ｹﾞ"), ('コ', "ｺ"), ('ゴ', "ｺﾞ"), ('サ', "ｻ"),
    ('ザ', "ｻﾞ"), ('シ', "ｼ"), ('ジ', "ｼﾞ"), ('ス', "ｽ"), ('ズ', "ｽﾞ"), ('セ', "ｾ"), ('ゼ', "ｾﾞ"),
    ('ソ', "ｿ"), ('ゾ', "ｿﾞ"), ('タ', "ﾀ"), ('ダ', "ﾀﾞ"), ('チ', "ﾁ"), ('ヂ', "ﾁﾞ"), ('ッ', "ｯ"),
    ('ツ', "ﾂ"), ('ヅ', "ﾂﾞ"), ('テ', "ﾃ"), ('デ', "ﾃﾞ"), ('ト', "ﾄ"), ('ド', "ﾄﾞ"), ('ナ', "ﾅ"),
    ('ニ', "ﾆ"), ('ヌ', "ﾇ"), ('ネ', "ﾈ"), ('ノ', "ﾉ"), ('ハ', "ﾊ"), ('バ', "ﾊﾞ"), ('パ', "ﾊﾟ"),
    ('ヒ', "ﾋ"), ('ビ', "ﾋﾞ"), ('ピ', "ﾋﾟ"), ('フ', "ﾌ"), ('ブ', "ﾌﾞ"), ('プ', "ﾌﾟ"), ('ヘ', "ﾍ"),
    ('ベ', "ﾍﾞ"), ('ペ', "ﾍﾟ"), ('ホ', "ﾎ"), ('ボ', "ﾎﾞ"), ('ポ', "ﾎﾟ"), ('マ', "ﾏ"), ('ミ', "ﾐ"),
    ('ム', "ﾑ"), ('メ', "ﾒ"), ('モ', "ﾓ"), ('ャ', "ｬ"), ('ヤ', "ﾔ"), ('ュ', "ｭ"), ('ユ', "ﾕ"),
    ('ョ', "ｮ"), ('ヨ', "ﾖ"), ('ラ', "ﾗ"), ('リ', "ﾘ"), ('ル', "ﾙ"), ('レ', "ﾚ"), ('ロ', "ﾛ"),
    ('ワ', "ﾜ"), ('ヲ', "ｦ"), ('ン', "ﾝ"), ('ヴ', "ｳﾞ"), ('ヷ', "ﾜﾞ"), ('ヺ', "ｦﾞ"), ('ー', "ｰ"),
    ('。', "｡"), ('「', "｢"), ('」', "｣"), ('、', "､"), ('・', "･"), ('゛', "ﾞ"), ('゜', "ﾟ"),
];

const VOICED_MARK: char = 'ﾞ';
const SEMI_VOICED_MARK: char = 'ﾟ';

static FULL_TO_HALF: LazyLock<HashMap<char, &'static str>> =
    LazyLock::new(|| KANA_WIDTH.iter().copied().collect());

static HALF_TO_FULL: LazyLock<HashMap<&'static str, char>> = LazyLock::new(|| {
    KANA_WIDTH
        .iter()
        .map(|&(full, half)| (half, full))
        .collect()
});

/// Full-width characters that have a half-width form.
pub fn convertible_full_width() -> impl Iterator<Item = char> {
    KANA_WIDTH.iter().map(|&(full, _)| full)
}

pub fn hiragana_to_katakana(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            'ぁ'..='ゖ' | 'ゝ' | 'ゞ' => char::from_u32(c as u32 + 0x60).unwrap_or(c),
            other => other,
        })
        .collect()
}

pub fn to_half_width(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match FULL_TO_HALF.get(&c) {
            Some(half) => out.push_str(half),
            None => out.push(c),
        }
    }
    out
}

/// Converts half-width kana to full width, merging sound marks into the
/// preceding letter where a combined form exists.
pub fn to_full_width(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    let mut buf = [0u8; 8];
    while let Some(c) = chars.next() {
        if let Some(&mark) = chars.peek()
            && (mark == VOICED_MARK || mark == SEMI_VOICED_MARK)
        {
            let len = c.encode_utf8(&mut buf).len();
            let combined_len = len + mark.encode_utf8(&mut buf[len..]).len();
            let combined = std::str::from_utf8(&buf[..combined_len]).unwrap_or_default();
            if let Some(&full) = HALF_TO_FULL.get(combined) {
                out.push(full);
                chars.next();
                continue;
            }
        }
        let single = c.encode_utf8(&mut buf);
        match HALF_TO_FULL.get(&*single) {
            Some(&full) => out.push(full),
            None => out.push(c),
        }
    }
    out
}

/// Hiragana becomes katakana first, then the width is converted.
pub fn convert_kana(value: &str, direction: KanaDirection) -> String {
    if value.is_empty() {
        return String::new();
    }
    let katakana = hiragana_to_katakana(value);
    match direction {
        KanaDirection::FullToHalf => to_half_width(&katakana),
        KanaDirection::HalfToFull => to_full_width(&katakana),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hiragana_becomes_katakana() {
        assert_eq!(hiragana_to_katakana("やまだ たろう"), "ヤマダ タロウ");
        assert_eq!(hiragana_to_katakana("abc漢字"), "abc漢字");
    }

    #[test]
    fn full_to_half_expands_sound_marks() {
        assert_eq!(
            convert_kana("ヤマダ　ガッコウ", KanaDirection::FullToHalf),
            "ﾔﾏﾀﾞ　ｶﾞｯｺｳ"
        );
        assert_eq!(convert_kana("ぱーく", KanaDirection::FullToHalf), "ﾊﾟｰｸ");
        assert_eq!(convert_kana("ヴ", KanaDirection::FullToHalf), "ｳﾞ");
    }

    #[test]
    fn half_to_full_merges_sound_marks() {
        assert_eq!(convert_kana("ﾔﾏﾀﾞ ﾀﾛｳ", KanaDirection::HalfToFull), "ヤマダ タロウ");
        assert_eq!(convert_kana("ﾎﾟｲﾝﾄ", KanaDirection::HalfToFull), "ポイント");
        assert_eq!(convert_kana("ｱﾞ", KanaDirection::HalfToFull), "ア゛");
        assert_eq!(convert_kana("すずき", KanaDirection::HalfToFull), "スズキ");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(convert_kana("", KanaDirection::FullToHalf), "");
        assert_eq!(convert_kana("", KanaDirection::HalfToFull), "");
    }
}
