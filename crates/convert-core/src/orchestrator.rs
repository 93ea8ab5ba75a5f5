//! Stage runs over every batch of a session.
//!
//! Batches are processed one after another in sequence order so the global
//! row index stays contiguous; rows inside a batch are mapped in parallel
//! on the worker pool and collected back in input order.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use convert_ingest::{
    EncodingFallback, FileFormatId, FormatDetector, ReadMode, RowReader, SourceFile,
};
use convert_map::{RowMapper, RuleSet};
use convert_model::{
    BatchId, RawRow, Row, RuleBinding, RunStatus, SessionId, StageLayout, StoredBatch, TenantId,
};
use convert_rules::FixedValueCache;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{CoreError, Result};
use crate::store::BatchStore;

/// One mapping step between two stages of a session.
///
/// Rows are read from the stage of `before` and written to the stage of
/// `after`.
#[derive(Debug, Clone, Copy)]
pub struct StageRun<'a> {
    pub session_id: &'a SessionId,
    pub tenant_id: TenantId,
    pub bindings: &'a [RuleBinding],
    pub before: &'a StageLayout,
    pub after: &'a StageLayout,
}

#[derive(Debug, Clone, Default)]
pub struct OrchestratorOptions {
    /// Worker threads; available parallelism when `None`.
    pub workers: Option<usize>,
    pub encodings: EncodingFallback,
}

pub struct BatchOrchestrator {
    store: Arc<dyn BatchStore>,
    fixed_values: Arc<FixedValueCache>,
    pool: ThreadPool,
    detector: FormatDetector,
    reader: RowReader,
}

impl std::fmt::Debug for BatchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchOrchestrator")
            .field("workers", &self.pool.current_num_threads())
            .field("fixed_values", &self.fixed_values)
            .finish_non_exhaustive()
    }
}

impl BatchOrchestrator {
    pub fn new(store: Arc<dyn BatchStore>, fixed_values: Arc<FixedValueCache>) -> Result<Self> {
        Self::with_options(store, fixed_values, OrchestratorOptions::default())
    }

    pub fn with_options(
        store: Arc<dyn BatchStore>,
        fixed_values: Arc<FixedValueCache>,
        options: OrchestratorOptions,
    ) -> Result<Self> {
        let workers = options.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(usize::from)
                .unwrap_or(1)
        });
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("convert-worker-{index}"))
            .build()
            .map_err(|error| CoreError::WorkerPool {
                message: error.to_string(),
            })?;
        Ok(Self {
            store,
            fixed_values,
            pool,
            detector: FormatDetector::new(options.encodings.clone()),
            reader: RowReader::new(options.encodings),
        })
    }

    pub fn store(&self) -> &Arc<dyn BatchStore> {
        &self.store
    }

    pub fn fixed_values(&self) -> &FixedValueCache {
        &self.fixed_values
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Maps every batch of the source stage into the destination stage.
    ///
    /// Configuration errors and a session without readable batches yield
    /// an `error` status; unreadable batches are skipped.
    pub fn run(&self, run: &StageRun<'_>) -> RunStatus {
        match self.try_run(run) {
            Ok(status) => status,
            Err(error) => {
                tracing::error!(
                    session_id = %run.session_id,
                    stage = run.after.stage().batch_name(),
                    %error,
                    "stage run failed"
                );
                RunStatus::error(error.to_string())
            }
        }
    }

    fn try_run(&self, run: &StageRun<'_>) -> Result<RunStatus> {
        let source = run.before.stage();
        let destination = run.after.stage();
        let span = tracing::info_span!(
            "stage_run",
            session_id = %run.session_id,
            source = source.batch_name(),
            destination = destination.batch_name()
        );
        let _guard = span.enter();
        let started = Instant::now();

        let rules = RuleSet::compile(run.bindings, run.before, run.after)?;
        let fixed = self.fixed_values.snapshot(run.tenant_id, rules.fixed_rules());
        let mapper = RowMapper::new(rules, run.before.clone(), fixed);

        let batches = self.store.list(run.session_id, source)?;
        if batches.is_empty() {
            return Err(CoreError::NoData { stage: source });
        }
        let cleared = self.store.delete_stage(run.session_id, destination)?;
        if cleared > 0 {
            tracing::debug!(cleared, "cleared previous destination batches");
        }

        let mut next_row_index = 0u64;
        let mut written = 0usize;
        let mut skipped = 0usize;
        for id in &batches {
            let batch = match self.store.get_batch(id) {
                Ok(Some(batch)) => batch,
                Ok(None) => {
                    tracing::warn!(key = %id, "batch expired before it was read, skipping");
                    skipped += 1;
                    continue;
                }
                Err(error) => {
                    tracing::warn!(key = %id, %error, "skipping unreadable batch");
                    skipped += 1;
                    continue;
                }
            };

            let rows = self.map_batch(&mapper, id, batch.rows);
            let count = rows.len() as u64;
            let mapped = StoredBatch::new(
                next_row_index,
                rows.into_iter().map(RawRow::Positional).collect(),
            );
            if let Err(error) = self.store.put_batch(&id.with_stage(destination), &mapped) {
                tracing::warn!(key = %id, %error, "failed to store mapped batch, skipping");
                skipped += 1;
                continue;
            }
            tracing::debug!(key = %id, rows = count, start_row_index = next_row_index, "mapped batch");
            next_row_index += count;
            written += 1;
        }

        if written == 0 {
            return Err(CoreError::NoReadableBatches {
                stage: source,
                total: batches.len(),
            });
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            batches = written,
            skipped,
            rows = next_row_index,
            duration_ms,
            "stage run complete"
        );
        Ok(RunStatus::success(format!(
            "converted {next_row_index} rows from {} to {}",
            source.display_name(),
            destination.display_name()
        ))
        .with_counts(written, skipped, next_row_index))
    }

    /// Maps one batch on the pool; a row whose mapping panics becomes an
    /// empty row.
    fn map_batch(&self, mapper: &RowMapper, id: &BatchId, rows: Vec<RawRow>) -> Vec<Row> {
        self.pool.install(|| {
            rows.into_par_iter()
                .enumerate()
                .map(|(position, row)| {
                    panic::catch_unwind(AssertUnwindSafe(|| mapper.map_raw(row))).unwrap_or_else(
                        |_| {
                            tracing::error!(key = %id, position, "row mapping panicked, writing an empty row");
                            mapper.empty_row()
                        },
                    )
                })
                .collect()
        })
    }

    /// Reads uploaded files into the stage of `layout`, one batch per file.
    ///
    /// Files are read in parallel; batch `n` holds the rows of the `n`th
    /// file. Previous batches of the stage are removed first. A file that
    /// cannot be read is skipped unless none can.
    pub fn ingest(
        &self,
        session_id: &SessionId,
        files: &[SourceFile],
        layout: &StageLayout,
        format_id: Option<FileFormatId>,
    ) -> RunStatus {
        match self.try_ingest(session_id, files, layout, format_id) {
            Ok(status) => status,
            Err(error) => {
                tracing::error!(session_id = %session_id, %error, "ingest failed");
                RunStatus::error(error.to_string())
            }
        }
    }

    fn try_ingest(
        &self,
        session_id: &SessionId,
        files: &[SourceFile],
        layout: &StageLayout,
        format_id: Option<FileFormatId>,
    ) -> Result<RunStatus> {
        let stage = layout.stage();
        let span = tracing::info_span!(
            "ingest",
            session_id = %session_id,
            stage = stage.batch_name(),
            files = files.len()
        );
        let _guard = span.enter();
        let started = Instant::now();

        if files.is_empty() {
            return Err(CoreError::NoData { stage });
        }

        let results: Vec<Result<Vec<Row>>> = self.pool.install(|| {
            files
                .par_iter()
                .map(|file| self.read_file(file, layout, format_id))
                .collect()
        });

        self.store.delete_stage(session_id, stage)?;
        let mut next_row_index = 0u64;
        let mut written = 0usize;
        let mut skipped = 0usize;
        let mut failures = Vec::new();
        for (position, (file, result)) in files.iter().zip(results).enumerate() {
            let rows = match result {
                Ok(rows) => rows,
                Err(error) => {
                    tracing::warn!(file = %file.name, %error, "skipping unreadable file");
                    failures.push(error.to_string());
                    skipped += 1;
                    continue;
                }
            };
            let id = BatchId::new(session_id.clone(), stage, position as u64 + 1);
            let count = rows.len() as u64;
            let batch = StoredBatch::new(next_row_index, rows.into_iter().map(RawRow::Positional).collect());
            if let Err(error) = self.store.put_batch(&id, &batch) {
                tracing::warn!(key = %id, %error, "failed to store file batch, skipping");
                failures.push(error.to_string());
                skipped += 1;
                continue;
            }
            tracing::debug!(key = %id, file = %file.name, rows = count, "stored file batch");
            next_row_index += count;
            written += 1;
        }

        if written == 0 {
            return Err(CoreError::NoReadableFiles { failures });
        }

        tracing::info!(
            batches = written,
            skipped,
            rows = next_row_index,
            duration_ms = started.elapsed().as_millis() as u64,
            "ingest complete"
        );
        Ok(RunStatus::success(format!(
            "read {next_row_index} rows from {written} of {} files",
            files.len()
        ))
        .with_counts(written, skipped, next_row_index))
    }

    fn read_file(
        &self,
        file: &SourceFile,
        layout: &StageLayout,
        format_id: Option<FileFormatId>,
    ) -> Result<Vec<Row>> {
        let ingest_error = |source| CoreError::Ingest {
            file: file.name.clone(),
            source,
        };
        let spec = self.detector.detect_file(file, format_id).map_err(ingest_error)?;
        let rows = self
            .reader
            .read(file, &spec, layout, ReadMode::Positional)
            .map_err(ingest_error)?;
        Ok(rows.map(|row| row.into_positional(layout)).collect())
    }
}
