//! Command implementations, independent of argument parsing.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use convert_core::{
    BatchStore, ConversionPipeline, ConversionProfile, FileBatchStore, MemoryBatchStore,
    PipelineReport,
};
use convert_ingest::{FileFormatId, FormatDetector, FormatSpec, ReadMode, RowReader, SourceFile, TextEncoding};
use convert_model::{Row, SessionId, Stage, StageLayout};
use convert_rules::{CatalogEntry, RuleKind, apply, catalog};
use sha2::{Digest, Sha256};

use crate::logging::redact_value;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub profile: PathBuf,
    pub files: Vec<PathBuf>,
    /// Defaults to the current directory.
    pub output_dir: Option<PathBuf>,
    /// Defaults to a timestamped id.
    pub session: Option<String>,
    /// Keep batches on disk under this directory instead of in memory.
    pub store_dir: Option<PathBuf>,
}

/// One file written by `run`.
#[derive(Debug, Clone)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub format: Option<FileFormatId>,
    pub bytes: usize,
    pub sha256: String,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub report: PipelineReport,
    pub written: Vec<WrittenFile>,
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

pub fn load_profile(path: &Path) -> Result<ConversionProfile> {
    ConversionProfile::load(path)
        .with_context(|| format!("failed to load profile {}", path.display()))
}

fn read_sources(paths: &[PathBuf]) -> Result<Vec<SourceFile>> {
    if paths.is_empty() {
        bail!("no input files given");
    }
    paths
        .iter()
        .map(|path| {
            SourceFile::from_path(path).with_context(|| format!("failed to read {}", path.display()))
        })
        .collect()
}

fn write_output(dir: &Path, name: &str, bytes: &[u8], format: Option<FileFormatId>) -> Result<WrittenFile> {
    let path = dir.join(name);
    fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "wrote output file");
    Ok(WrittenFile {
        path,
        format,
        bytes: bytes.len(),
        sha256: sha256_hex(bytes),
    })
}

/// Runs a profile over `options.files` and writes every output.
pub fn run_profile(options: &RunOptions) -> Result<RunOutcome> {
    let profile = load_profile(&options.profile)?;
    let files = read_sources(&options.files)?;

    let store: Arc<dyn BatchStore> = match &options.store_dir {
        Some(dir) => Arc::new(FileBatchStore::with_ttl(dir, profile.batch_ttl())),
        None => Arc::new(MemoryBatchStore::new(profile.batch_ttl())),
    };
    let session = options
        .session
        .clone()
        .unwrap_or_else(|| format!("run-{}", session_stamp()));
    let session_id = SessionId::new(session).context("invalid session id")?;

    let pipeline = ConversionPipeline::new(profile, store)?;
    let report = pipeline.run(&session_id, &files)?;

    let output_dir = options.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    let mut written = Vec::new();
    for artifact in &report.artifacts {
        written.push(write_output(&output_dir, &artifact.file_name, &artifact.bytes, Some(artifact.format))?);
    }
    if let Some(archive) = &report.archive {
        written.push(write_output(&output_dir, &archive.name, &archive.bytes, None)?);
    }
    Ok(RunOutcome { report, written })
}

fn session_stamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

/// What `inspect` found in one file.
#[derive(Debug, Clone)]
pub struct Inspection {
    pub file: String,
    pub spec: FormatSpec,
    pub encoding: Option<TextEncoding>,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

pub fn inspect_file(path: &Path, format: Option<FileFormatId>, limit: usize) -> Result<Inspection> {
    let file = SourceFile::from_path(path).with_context(|| format!("failed to read {}", path.display()))?;
    let spec = FormatDetector::default()
        .detect_file(&file, format)
        .with_context(|| format!("failed to detect the format of {}", file.name))?;
    let reader = RowReader::default();
    let headers = reader
        .headers(&file, &spec)
        .with_context(|| format!("failed to read headers of {}", file.name))?;

    let layout = StageLayout::from_names(Stage::Input, headers.iter().cloned());
    let rows = reader
        .read(&file, &spec, &layout, ReadMode::Positional)
        .with_context(|| format!("failed to read rows of {}", file.name))?;
    let encoding = rows.encoding();
    let rows: Vec<Row> = rows
        .take(limit)
        .map(|row| row.into_positional(&layout))
        .collect();
    tracing::debug!(file = %file.name, headers = headers.len(), rows = rows.len(), "inspected file");

    Ok(Inspection {
        file: file.name,
        spec,
        encoding,
        headers,
        rows,
    })
}

pub fn rule_catalog() -> Vec<CatalogEntry> {
    catalog()
}

/// Applies a pure rule to each value, returning `(before, after)` pairs.
pub fn apply_values(rule_id: &str, values: &[String]) -> Result<Vec<(String, String)>> {
    let rule = RuleKind::parse(rule_id);
    if rule.is_fixed() {
        bail!("{rule_id} is a fixed-value rule and needs a profile's tables");
    }
    if rule.is_unknown() {
        tracing::warn!(rule_id, "unknown rule, values pass through unchanged");
    }
    Ok(values
        .iter()
        .map(|value| {
            let after = apply(value, &rule);
            tracing::trace!(rule_id, before = redact_value(value), after = redact_value(&after), "applied rule");
            (value.clone(), after)
        })
        .collect())
}
