//! Value conversion rules.
//!
//! A fixed catalog of pure transforms (dates, gender codes, kana width,
//! postal codes, time buckets) plus tenant-scoped fixed-value lookups.
//!
//! ```
//! use convert_rules::apply_rule;
//!
//! assert_eq!(apply_rule("令和5年4月1日", "DATE1"), "2023/04/01");
//! assert_eq!(apply_rule("anything", "NOT_A_REAL_RULE"), "anything");
//! ```

pub mod date;
mod digits;
pub mod error;
pub mod fixed;
pub mod gender;
pub mod kana;
pub mod library;
pub mod postal;
pub mod rule;
pub mod time;

pub use error::{Result, RuleError};
pub use fixed::{
    DEFAULT_CACHE_CAPACITY, FixedValueCache, FixedValueRecord, FixedValueSnapshot,
    FixedValueSource, FixedValueTable, InMemoryFixedValues,
};
pub use library::{apply, apply_rule};
pub use rule::{
    CatalogEntry, DateStyle, FixedRule, GenderCode, KanaDirection, RuleKind, catalog,
    is_fixed_rule,
};
