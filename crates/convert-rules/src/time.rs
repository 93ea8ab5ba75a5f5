use std::sync::LazyLock;

use regex::Regex;

static CLOCK_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{1,2}):(\d{2})(?::\d{2})?\s*$").expect("time pattern is valid")
});

/// Rounds `H:MM` up to the next quarter hour and emits `HHMM`.
///
/// Minutes 1-15 become :15, 16-30 :30, 31-45 :45; 46-59 and :00 move to the
/// next full hour, wrapping 23 to 00. Unparseable input is returned as is.
pub fn bucket_time(value: &str) -> String {
    let Some(caps) = CLOCK_TIME.captures(value) else {
        return value.to_string();
    };
    let (Ok(hour), Ok(minute)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) else {
        return value.to_string();
    };
    if hour > 23 || minute > 59 {
        return value.to_string();
    }
    let (hour, minute) = match minute {
        1..=15 => (hour, 15),
        16..=30 => (hour, 30),
        31..=45 => (hour, 45),
        _ => ((hour + 1) % 24, 0),
    };
    format!("{hour:02}{minute:02}")
}
