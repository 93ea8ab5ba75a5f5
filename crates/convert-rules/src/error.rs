use convert_model::TenantId;
use thiserror::Error;

use crate::rule::FixedRule;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("'{rule_id}' is not a fixed-value rule")]
    NotFixedRule { rule_id: String },

    #[error("failed to load fixed values for tenant {tenant_id}, rule {rule}: {message}")]
    SourceUnavailable {
        tenant_id: TenantId,
        rule: FixedRule,
        message: String,
    },

    #[error("fixed-value table for rule {rule} is not available in this run")]
    TableUnavailable { rule: FixedRule },
}

impl RuleError {
    /// Whether the affected value can fall back to its raw input.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, RuleError::NotFixedRule { .. })
    }
}

pub type Result<T> = std::result::Result<T, RuleError>;
