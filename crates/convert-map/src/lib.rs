//! Row mapping between stage layouts.
//!
//! [`RuleSet::compile`] validates a list of rule bindings against the before
//! and after layouts; [`RowMapper`] applies the compiled set to rows.

pub mod error;
pub mod mapper;
pub mod ruleset;

pub use error::{MapError, Result};
pub use mapper::RowMapper;
pub use ruleset::{CompiledBinding, RuleSet};
