//! Batch orchestration for the conversion pipeline.
//!
//! # Features
//!
//! - **Batch storage**: [`BatchStore`] with in-memory and file backends,
//!   every batch expiring after a time to live
//! - **Stage runs**: [`BatchOrchestrator`] ingests uploaded files and maps
//!   every batch of one stage into the next on a worker pool
//! - **Sessions**: paging, cell edits, export and cleanup over stored rows
//! - **Profiles**: TOML description of a whole conversion, run end to end
//!   by [`ConversionPipeline`]
//!
//! # Example
//!
//! ```ignore
//! use convert_core::{ConversionPipeline, ConversionProfile, MemoryBatchStore};
//!
//! let profile = ConversionProfile::load(Path::new("profile.toml"))?;
//! let store = Arc::new(MemoryBatchStore::new(profile.batch_ttl()));
//! let pipeline = ConversionPipeline::new(profile, store)?;
//! let report = pipeline.run(&SessionId::new("upload-1")?, &files)?;
//! ```

mod error;
mod orchestrator;
mod pipeline;
mod profile;
mod session;
mod store;

// === Error Types ===
pub use error::{CoreError, Result};

// === Storage ===
pub use store::{BatchStore, DEFAULT_BATCH_TTL, FileBatchStore, MemoryBatchStore, decode_batch};

// === Orchestration ===
pub use orchestrator::{BatchOrchestrator, OrchestratorOptions, StageRun};
pub use pipeline::{ConversionPipeline, PipelineReport, StageReport};

// === Sessions ===
pub use session::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MIN_PAGE_SIZE, Page, PagedRow, Session};

// === Profiles ===
pub use profile::{ConversionProfile, OutputSettings, ProfileLayouts, ProfileRules};
