//! Error types for rule set validation.

use convert_model::Stage;
use thiserror::Error;

/// Configuration errors found while compiling a rule set.
///
/// These are never recovered from: a run with an invalid rule set fails
/// with the error's message as its status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("rule set is empty")]
    EmptyRuleSet,

    #[error(
        "destination index {index} is bound twice (rules '{first_rule}' and '{second_rule}')"
    )]
    DuplicateDestination {
        index: usize,
        first_rule: String,
        second_rule: String,
    },

    #[error("source index {index} is bound twice (rules '{first_rule}' and '{second_rule}')")]
    DuplicateSource {
        index: usize,
        first_rule: String,
        second_rule: String,
    },

    #[error(
        "destination index {index} of rule '{rule_id}' is not a column of the {} layout",
        .stage.display_name()
    )]
    DestinationNotInLayout {
        index: usize,
        rule_id: String,
        stage: Stage,
    },
}

impl MapError {
    pub fn suggestion(&self) -> &'static str {
        match self {
            MapError::EmptyRuleSet => "Define at least one rule binding for this stage.",
            MapError::DuplicateDestination { .. } => {
                "Each destination column may be produced by one rule only."
            }
            MapError::DuplicateSource { .. } => {
                "Each source column may feed one destination column only."
            }
            MapError::DestinationNotInLayout { .. } => {
                "Update the rule binding or add the column to the destination headers."
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, MapError>;
