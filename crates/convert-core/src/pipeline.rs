//! End-to-end conversion of a set of files under one profile.

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use convert_ingest::{Container, FileFormatId, SourceFile};
use convert_model::{RunStatus, SessionId, Stage, StageLayout};
use convert_output::{ArchiveEntry, OutputArtifact, OutputWriter, archive_entry_name, bundle};
use convert_rules::FixedValueCache;

use crate::error::{CoreError, Result};
use crate::orchestrator::{BatchOrchestrator, OrchestratorOptions, StageRun};
use crate::profile::ConversionProfile;
use crate::session::Session;
use crate::store::BatchStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: Stage,
    pub status: RunStatus,
}

/// Outcome of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub session_id: SessionId,
    pub stages: Vec<StageReport>,
    pub artifacts: Vec<OutputArtifact>,
    /// Bundled outputs, named `{file_stem}.zip`.
    pub archive: Option<ArchiveEntry>,
    pub duration_ms: u64,
}

impl PipelineReport {
    pub fn rows(&self, stage: Stage) -> Option<u64> {
        self.stages
            .iter()
            .find(|report| report.stage == stage)
            .map(|report| report.status.rows)
    }
}

pub struct ConversionPipeline {
    profile: ConversionProfile,
    orchestrator: BatchOrchestrator,
    writer: OutputWriter,
    date: NaiveDate,
}

impl std::fmt::Debug for ConversionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionPipeline")
            .field("tenant_id", &self.profile.tenant_id)
            .field("orchestrator", &self.orchestrator)
            .field("date", &self.date)
            .finish_non_exhaustive()
    }
}

impl ConversionPipeline {
    pub fn new(profile: ConversionProfile, store: Arc<dyn BatchStore>) -> Result<Self> {
        profile.validate()?;
        let fixed_values = Arc::new(FixedValueCache::new(Arc::new(profile.fixed_value_source()?)));
        let orchestrator = BatchOrchestrator::with_options(
            store,
            fixed_values,
            OrchestratorOptions {
                workers: profile.workers,
                encodings: profile.encoding_fallback(),
            },
        )?;
        let writer = OutputWriter::new(profile.output.sheet_name.clone(), profile.substitution_table()?);
        Ok(Self {
            profile,
            orchestrator,
            writer,
            date: chrono::Local::now().date_naive(),
        })
    }

    /// Date used in archive entry names.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    pub fn profile(&self) -> &ConversionProfile {
        &self.profile
    }

    pub fn orchestrator(&self) -> &BatchOrchestrator {
        &self.orchestrator
    }

    pub fn session(&self, session_id: SessionId) -> Session {
        Session::new(Arc::clone(self.orchestrator.store()), session_id)
    }

    /// Ingests `files`, runs every mapping step and writes the outputs.
    ///
    /// The session's batches are removed afterwards, whether the run
    /// succeeded or not, unless the profile keeps them.
    pub fn run(&self, session_id: &SessionId, files: &[SourceFile]) -> Result<PipelineReport> {
        let span = tracing::info_span!(
            "pipeline",
            session_id = %session_id,
            tenant_id = %self.profile.tenant_id,
            files = files.len()
        );
        let _guard = span.enter();
        let started = Instant::now();

        let result = self.run_stages(session_id, files);
        if !self.profile.keep_batches
            && let Err(error) = self.session(session_id.clone()).clear()
        {
            tracing::warn!(%error, "failed to clear session batches");
        }

        let (stages, artifacts, archive) = result?;
        let duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            artifacts = artifacts.len(),
            archived = archive.is_some(),
            duration_ms,
            "pipeline complete"
        );
        Ok(PipelineReport {
            session_id: session_id.clone(),
            stages,
            artifacts,
            archive,
            duration_ms,
        })
    }

    #[allow(clippy::type_complexity)]
    fn run_stages(
        &self,
        session_id: &SessionId,
        files: &[SourceFile],
    ) -> Result<(Vec<StageReport>, Vec<OutputArtifact>, Option<ArchiveEntry>)> {
        // Fixed-value tables are reloaded once per pipeline run.
        self.orchestrator.fixed_values().clear_cache();

        let input = self.profile.layout(Stage::Input)?;
        let status = self
            .orchestrator
            .ingest(session_id, files, &input, self.profile.input_format);
        let mut stages = vec![checked(Stage::Input, status)?];

        let mut outputs = vec![Stage::Display, Stage::SystemOutput];
        if self.profile.has_agency_output() {
            outputs.push(Stage::AgencyOutput);
        }
        let mut layouts = vec![input];
        for stage in outputs {
            let source = ConversionProfile::source_stage(stage).unwrap_or(Stage::Input);
            let after = self.profile.layout(stage)?;
            let before = layout_of(&layouts, source)?.clone();
            let status = self.orchestrator.run(&StageRun {
                session_id,
                tenant_id: self.profile.tenant_id,
                bindings: self.profile.bindings(stage),
                before: &before,
                after: &after,
            });
            stages.push(checked(stage, status)?);
            layouts.push(after);
        }

        let session = self.session(session_id.clone());
        let stem = &self.profile.output.file_stem;
        let system = layout_of(&layouts, Stage::SystemOutput)?;
        let mut artifacts = vec![session.export(
            system,
            &self.writer,
            self.profile.output.system_format,
            stem,
        )?];
        if self.profile.has_agency_output() {
            let agency = layout_of(&layouts, Stage::AgencyOutput)?;
            let format = self
                .profile
                .output
                .agency_format
                .unwrap_or(self.profile.output.system_format);
            artifacts.push(session.export(agency, &self.writer, format, &format!("{stem}_agency"))?);
        }

        let archive = if self.profile.output.archive {
            Some(self.archive(&session, system, &artifacts)?)
        } else {
            None
        };
        Ok((stages, artifacts, archive))
    }

    /// Bundles the system output as a dated CSV plus any further outputs.
    fn archive(
        &self,
        session: &Session,
        system: &StageLayout,
        artifacts: &[OutputArtifact],
    ) -> Result<ArchiveEntry> {
        let system_format = self.profile.output.system_format;
        let csv = if system_format.spec().container == Container::Csv {
            artifacts[0].bytes.clone()
        } else {
            session
                .export(system, &self.writer, FileFormatId::CsvCommaUtf8, &self.profile.output.file_stem)?
                .bytes
        };
        let mut entries = vec![ArchiveEntry::new(archive_entry_name(self.date), csv)];
        entries.extend(
            artifacts
                .iter()
                .skip(1)
                .map(|artifact| ArchiveEntry::new(artifact.file_name.clone(), artifact.bytes.clone())),
        );
        let bytes = bundle(&entries)?;
        tracing::debug!(entries = entries.len(), bytes = bytes.len(), "bundled outputs");
        Ok(ArchiveEntry::new(format!("{}.zip", self.profile.output.file_stem), bytes))
    }
}

fn checked(stage: Stage, status: RunStatus) -> Result<StageReport> {
    if status.is_success() {
        Ok(StageReport { stage, status })
    } else {
        Err(CoreError::RunFailed {
            stage,
            message: status.message,
        })
    }
}

fn layout_of(layouts: &[StageLayout], stage: Stage) -> Result<&StageLayout> {
    layouts
        .iter()
        .find(|layout| layout.stage() == stage)
        .ok_or(CoreError::NoData { stage })
}
