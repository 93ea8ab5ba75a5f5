use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A named schema layout that rows pass through.
///
/// Each stage has its own header descriptors and its own batch namespace in
/// the batch store. The batch names are the ones already used by stored
/// sessions and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Rows as read from the uploaded files.
    Input,
    /// Intermediate, user-editable layout.
    Display,
    /// Layout handed to the internal system.
    SystemOutput,
    /// Layout submitted to the external agency.
    AgencyOutput,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Input,
        Stage::Display,
        Stage::SystemOutput,
        Stage::AgencyOutput,
    ];

    /// Name of the batch namespace holding this stage's rows.
    pub fn batch_name(self) -> &'static str {
        match self {
            Stage::Input => "processed",
            Stage::Display => "formatted",
            Stage::SystemOutput => "output",
            Stage::AgencyOutput => "agency",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Stage::Input => "input",
            Stage::Display => "display",
            Stage::SystemOutput => "system output",
            Stage::AgencyOutput => "agency output",
        }
    }

    pub fn from_batch_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.batch_name() == name)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.batch_name())
    }
}

impl FromStr for Stage {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "input" | "before" | "processed" => Ok(Stage::Input),
            "display" | "format" | "formatted" => Ok(Stage::Display),
            "system_output" | "output" => Ok(Stage::SystemOutput),
            "agency_output" | "agency" => Ok(Stage::AgencyOutput),
            _ => Err(ModelError::UnknownStage {
                name: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_names_round_trip() {
        for stage in Stage::ALL {
            assert_eq!(Stage::from_batch_name(stage.batch_name()), Some(stage));
            assert_eq!(stage.batch_name().parse::<Stage>().unwrap(), stage);
        }
    }

    #[test]
    fn parses_aliases() {
        assert_eq!("format".parse::<Stage>().unwrap(), Stage::Display);
        assert_eq!("System-Output".parse::<Stage>().unwrap(), Stage::SystemOutput);
        assert!("archive".parse::<Stage>().is_err());
    }
}
