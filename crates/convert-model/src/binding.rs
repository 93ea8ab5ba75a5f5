use serde::{Deserialize, Serialize};

/// One column-to-column mapping plus the rule to apply on the way.
///
/// Indices refer to header descriptor indices of the before and after
/// stages. Aliases accept the field names of the rule configuration store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleBinding {
    #[serde(alias = "rule")]
    pub rule_id: String,
    #[serde(alias = "source", alias = "index_before")]
    pub source_index: usize,
    #[serde(alias = "destination", alias = "index_after")]
    pub destination_index: usize,
}

impl RuleBinding {
    pub fn new(rule_id: impl Into<String>, source_index: usize, destination_index: usize) -> Self {
        Self {
            rule_id: rule_id.into(),
            source_index,
            destination_index,
        }
    }
}

impl<S: Into<String>> From<(S, usize, usize)> for RuleBinding {
    fn from((rule_id, source_index, destination_index): (S, usize, usize)) -> Self {
        Self::new(rule_id, source_index, destination_index)
    }
}
