//! Date parsing across Japanese era, kanji, ISO-like and US notations.
//!
//! Patterns are tried in a fixed order and the first one producing a valid
//! calendar date wins. Anything that does not parse is returned unchanged.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::{Captures, Regex};

use crate::digits::to_ascii_digits;
use crate::rule::DateStyle;

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("date pattern is valid")
}

/// `S50.1.2`, `H31-4-30`, `R5年4月1日`
static ERA_LETTER: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"^([SHR])\s*(\d{1,2}|元)\s*[.\-/年]\s*(\d{1,2})\s*[.\-/月]\s*(\d{1,2})\s*日?")
});

/// `令和5年4月1日`, `平成元年1月8日`
static ERA_KANJI: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"^(昭和|平成|令和)\s*(\d{1,2}|元)\s*[.\-/年]\s*(\d{1,2})\s*[.\-/月]\s*(\d{1,2})\s*日?")
});

static ISO_LIKE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^(\d{4})[/\-](\d{1,2})[/\-](\d{1,2})"));

static KANJI_DATE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^(\d{4})年(\d{1,2})月(\d{1,2})日"));

/// `MM/DD/YYYY` with an optional `HH:MM[:SS] [AM|PM]` suffix.
static US_DATE: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"^(\d{1,2})/(\d{1,2})/(\d{4})(?:\s+(\d{1,2}):(\d{2})(?::(\d{2}))?\s*([AaPp][Mm])?)?\s*$")
});

static DAY_FIRST: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4})"));

/// `YYYY\DD\MM`
static REVERSED: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"^(\d{4})\\(\d{1,2})\\(\d{1,2})"));

/// Year before the first year of each era.
fn era_base(era: &str) -> Option<i32> {
    match era {
        "S" | "昭和" => Some(1925),
        "H" | "平成" => Some(1988),
        "R" | "令和" => Some(2018),
        _ => None,
    }
}

fn number<T: std::str::FromStr>(caps: &Captures<'_>, group: usize) -> Option<T> {
    caps.get(group)?.as_str().parse().ok()
}

fn ymd(caps: &Captures<'_>, year: usize, month: usize, day: usize) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(number(caps, year)?, number(caps, month)?, number(caps, day)?)
}

fn parse_era(value: &str) -> Option<NaiveDate> {
    let caps = ERA_LETTER
        .captures(value)
        .or_else(|| ERA_KANJI.captures(value))?;
    let base = era_base(caps.get(1)?.as_str())?;
    let era_year: i32 = match caps.get(2)?.as_str() {
        "元" => 1,
        digits => digits.parse().ok()?,
    };
    NaiveDate::from_ymd_opt(base + era_year, number(&caps, 3)?, number(&caps, 4)?)
}

/// Whether the optional time part of a US-style match is a real time.
fn us_time_is_valid(caps: &Captures<'_>) -> bool {
    if caps.get(4).is_none() {
        return true;
    }
    let (Some(mut hour), Some(minute)) = (number::<u32>(caps, 4), number::<u32>(caps, 5)) else {
        return false;
    };
    let Some(second) = caps.get(6).map_or(Some(0), |m| m.as_str().parse().ok()) else {
        return false;
    };
    if let Some(meridiem) = caps.get(7) {
        if !(1..=12).contains(&hour) {
            return false;
        }
        let pm = meridiem.as_str().eq_ignore_ascii_case("pm");
        hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
    }
    NaiveTime::from_hms_opt(hour, minute, second).is_some()
}

/// Parses `value` with every supported notation in priority order.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = to_ascii_digits(value.trim());
    if value.is_empty() {
        return None;
    }
    let parsed = parse_era(&value)
        .or_else(|| ISO_LIKE.captures(&value).and_then(|c| ymd(&c, 1, 2, 3)))
        .or_else(|| KANJI_DATE.captures(&value).and_then(|c| ymd(&c, 1, 2, 3)));
    if parsed.is_some() {
        return parsed;
    }
    if let Some(caps) = US_DATE.captures(&value) {
        // A US date with a broken time is not retried as day-first.
        if !us_time_is_valid(&caps) {
            return None;
        }
        if let Some(date) = ymd(&caps, 3, 1, 2) {
            return Some(date);
        }
    }
    DAY_FIRST
        .captures(&value)
        .and_then(|c| ymd(&c, 3, 2, 1))
        .or_else(|| REVERSED.captures(&value).and_then(|c| ymd(&c, 1, 3, 2)))
}

pub fn format_date(date: NaiveDate, style: DateStyle) -> String {
    match style {
        DateStyle::Slash => date.format("%Y/%m/%d").to_string(),
        DateStyle::Hyphen => date.format("%Y-%m-%d").to_string(),
    }
}

/// Normalizes a date, returning the input unchanged when it does not parse.
pub fn convert_date(value: &str, style: DateStyle) -> String {
    match parse_date(value) {
        Some(date) => format_date(date, style),
        None => value.to_string(),
    }
}
