//! Validated, destination-ordered rule sets.

use std::collections::BTreeMap;

use convert_model::{RuleBinding, StageLayout};
use convert_rules::{FixedRule, RuleKind};

use crate::error::{MapError, Result};

/// A rule binding with its rule id already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledBinding {
    pub rule: RuleKind,
    pub source_index: usize,
    pub destination_index: usize,
}

/// Rule bindings between two stages, checked against both layouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    bindings: Vec<CompiledBinding>,
    destination_width: usize,
}

impl RuleSet {
    /// Validates `bindings` and orders them by destination index.
    ///
    /// Destination and source indices must each be unique, and every
    /// destination must be a column of `after`. Sources missing from
    /// `before` are accepted and read as empty.
    pub fn compile(
        bindings: &[RuleBinding],
        before: &StageLayout,
        after: &StageLayout,
    ) -> Result<Self> {
        if bindings.is_empty() {
            return Err(MapError::EmptyRuleSet);
        }

        let mut destinations: BTreeMap<usize, &RuleBinding> = BTreeMap::new();
        let mut sources: BTreeMap<usize, &RuleBinding> = BTreeMap::new();
        for binding in bindings {
            if !after.contains_index(binding.destination_index) {
                return Err(MapError::DestinationNotInLayout {
                    index: binding.destination_index,
                    rule_id: binding.rule_id.clone(),
                    stage: after.stage(),
                });
            }
            if let Some(first) = destinations.insert(binding.destination_index, binding) {
                return Err(MapError::DuplicateDestination {
                    index: binding.destination_index,
                    first_rule: first.rule_id.clone(),
                    second_rule: binding.rule_id.clone(),
                });
            }
            if let Some(first) = sources.insert(binding.source_index, binding) {
                return Err(MapError::DuplicateSource {
                    index: binding.source_index,
                    first_rule: first.rule_id.clone(),
                    second_rule: binding.rule_id.clone(),
                });
            }
            if !before.contains_index(binding.source_index) {
                tracing::warn!(
                    rule_id = %binding.rule_id,
                    source_index = binding.source_index,
                    stage = before.stage().display_name(),
                    "source index not in layout, column will be empty"
                );
            }
        }

        let bindings = destinations
            .into_values()
            .map(|binding| {
                let rule = RuleKind::parse(&binding.rule_id);
                if rule.is_unknown() {
                    tracing::warn!(
                        rule_id = %binding.rule_id,
                        destination_index = binding.destination_index,
                        "unknown conversion rule, column passes through unchanged"
                    );
                }
                CompiledBinding {
                    rule,
                    source_index: binding.source_index,
                    destination_index: binding.destination_index,
                }
            })
            .collect();

        Ok(Self {
            bindings,
            destination_width: after.width(),
        })
    }

    pub fn bindings(&self) -> &[CompiledBinding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Length of every mapped row.
    pub fn destination_width(&self) -> usize {
        self.destination_width
    }

    /// Fixed-value rules used by this set, each once.
    pub fn fixed_rules(&self) -> Vec<FixedRule> {
        let mut rules: Vec<FixedRule> = self
            .bindings
            .iter()
            .filter_map(|binding| match binding.rule {
                RuleKind::Fixed(rule) => Some(rule),
                _ => None,
            })
            .collect();
        rules.sort();
        rules.dedup();
        rules
    }
}

#[cfg(test)]
mod tests {
    use convert_model::Stage;

    use super::*;

    fn layouts() -> (StageLayout, StageLayout) {
        (
            StageLayout::from_names(Stage::Input, ["a", "b", "c"]),
            StageLayout::from_names(Stage::Display, ["x", "y", "z"]),
        )
    }

    #[test]
    fn orders_by_destination() {
        let (before, after) = layouts();
        let rules = RuleSet::compile(
            &[
                RuleBinding::new("DATE1", 0, 2),
                RuleBinding::new("NOT_CHANGE", 2, 0),
                RuleBinding::new("GROUP_NO", 1, 1),
            ],
            &before,
            &after,
        )
        .unwrap();
        let destinations: Vec<usize> = rules
            .bindings()
            .iter()
            .map(|binding| binding.destination_index)
            .collect();
        assert_eq!(destinations, vec![0, 1, 2]);
        assert_eq!(rules.fixed_rules(), vec![FixedRule::GroupNo]);
        assert_eq!(rules.destination_width(), 3);
    }

    #[test]
    fn rejects_duplicate_destination() {
        let (before, after) = layouts();
        let err = RuleSet::compile(
            &[RuleBinding::new("DATE1", 0, 1), RuleBinding::new("DATE2", 1, 1)],
            &before,
            &after,
        )
        .unwrap_err();
        assert_eq!(
            err,
            MapError::DuplicateDestination {
                index: 1,
                first_rule: "DATE1".to_string(),
                second_rule: "DATE2".to_string(),
            }
        );
    }

    #[test]
    fn rejects_source_fan_out() {
        let (before, after) = layouts();
        let err = RuleSet::compile(
            &[RuleBinding::new("DATE1", 0, 0), RuleBinding::new("DATE2", 0, 1)],
            &before,
            &after,
        )
        .unwrap_err();
        assert!(matches!(err, MapError::DuplicateSource { index: 0, .. }));
    }

    #[test]
    fn rejects_destination_outside_layout() {
        let (before, after) = layouts();
        let err = RuleSet::compile(&[RuleBinding::new("DATE1", 0, 7)], &before, &after)
            .unwrap_err();
        assert!(err.to_string().contains("display layout"));
    }

    #[test]
    fn rejects_empty_rule_set() {
        let (before, after) = layouts();
        assert_eq!(
            RuleSet::compile(&[], &before, &after),
            Err(MapError::EmptyRuleSet)
        );
    }

    #[test]
    fn accepts_stale_sources() {
        let (before, after) = layouts();
        assert!(RuleSet::compile(&[RuleBinding::new("DATE1", 9, 0)], &before, &after).is_ok());
    }
}
