//! Row mapping between two stage layouts.

use convert_model::{RawRow, Row, StageLayout};
use convert_rules::{FixedValueSnapshot, RuleError, RuleKind, apply};

use crate::ruleset::{CompiledBinding, RuleSet};

/// Maps rows of the before stage onto the after stage.
///
/// Mapping runs in two passes: every binding first carries its raw source
/// value into the destination row, then every binding transforms the value
/// now sitting at its destination. A binding never sees another binding's
/// transformed output during carry-over.
#[derive(Debug, Clone)]
pub struct RowMapper {
    rules: RuleSet,
    before: StageLayout,
    fixed: FixedValueSnapshot,
}

impl RowMapper {
    pub fn new(rules: RuleSet, before: StageLayout, fixed: FixedValueSnapshot) -> Self {
        Self {
            rules,
            before,
            fixed,
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn before(&self) -> &StageLayout {
        &self.before
    }

    /// Length of every row this mapper produces.
    pub fn destination_width(&self) -> usize {
        self.rules.destination_width()
    }

    /// A destination row with every column empty.
    pub fn empty_row(&self) -> Row {
        vec![String::new(); self.destination_width()]
    }

    /// Normalizes a raw row through the before layout, then maps it.
    pub fn map_raw(&self, row: RawRow) -> Row {
        let row = row.into_positional(&self.before);
        self.map_row(&row)
    }

    /// Maps one index-addressed row.
    ///
    /// The result always has [`Self::destination_width`] entries. Columns
    /// without a binding stay empty.
    pub fn map_row(&self, row: &[String]) -> Row {
        let mut destination = self.empty_row();

        for binding in self.rules.bindings() {
            destination[binding.destination_index] = self.carry(row, binding);
        }

        for binding in self.rules.bindings() {
            let slot = &mut destination[binding.destination_index];
            match self.transform(slot, binding) {
                Ok(value) => *slot = value,
                Err(error) => {
                    tracing::warn!(
                        rule_id = %binding.rule,
                        source_index = binding.source_index,
                        destination_index = binding.destination_index,
                        %error,
                        "rule failed, keeping carried value"
                    );
                }
            }
        }

        destination
    }

    fn carry(&self, row: &[String], binding: &CompiledBinding) -> String {
        if !self.before.contains_index(binding.source_index) {
            return String::new();
        }
        row.get(binding.source_index).cloned().unwrap_or_default()
    }

    fn transform(&self, value: &str, binding: &CompiledBinding) -> Result<String, RuleError> {
        match &binding.rule {
            RuleKind::Fixed(rule) => self.fixed.apply(value, *rule),
            RuleKind::Unknown(_) => Ok(value.to_string()),
            rule => Ok(apply(value, rule)),
        }
    }
}
