//! Shared data model for the conversion pipeline.
//!
//! Rows flow through four [`Stage`]s. Every stage has a [`StageLayout`] of
//! [`HeaderDescriptor`]s, rows are stored per session in sequence-numbered
//! batches addressed by [`BatchId`], and [`RuleBinding`]s describe how a row
//! of one stage becomes a row of the next.

pub mod batch;
pub mod binding;
pub mod error;
pub mod header;
pub mod ids;
pub mod row;
pub mod stage;
pub mod status;

pub use batch::BatchId;
pub use binding::RuleBinding;
pub use error::{ModelError, Result};
pub use header::{HeaderDescriptor, StageLayout};
pub use ids::{SessionId, TenantId};
pub use row::{RawRow, Row, StoredBatch};
pub use stage::Stage;
pub use status::{RunState, RunStatus};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_status_serializes_lowercase_state() {
        let status = RunStatus::error("no data found for processing");
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(status.to_string(), "error: no data found for processing");
    }

    #[test]
    fn binding_accepts_store_field_names() {
        let binding: RuleBinding =
            serde_json::from_str(r#"{"rule":"DATE1","index_before":2,"index_after":0}"#).unwrap();
        assert_eq!(binding, RuleBinding::new("DATE1", 2, 0));
    }
}
