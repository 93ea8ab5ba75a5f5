//! Argument definitions for the `convert` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use convert_ingest::FileFormatId;

#[derive(Parser)]
#[command(
    name = "convert",
    version,
    about = "Convert uploaded files between header layouts",
    long_about = "Read CSV, Excel, JSON, XML and PDF form files, map every row through\n\
                  the rule bindings of a conversion profile and write the results as\n\
                  CSV, Excel, JSON or XML, optionally bundled into a ZIP archive."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Include cell values in log output (they carry personal data).
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a conversion profile over input files.
    Run(RunArgs),

    /// Show the detected format, headers and first rows of a file.
    Inspect(InspectArgs),

    /// List the conversion rules.
    Rules,

    /// Apply one rule to values given on the command line.
    Apply(ApplyArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Conversion profile (TOML).
    #[arg(long = "profile", short = 'p', value_name = "PROFILE")]
    pub profile: PathBuf,

    /// Directory for output files (default: current directory).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Session id used for the stored batches.
    #[arg(long = "session", value_name = "ID")]
    pub session: Option<String>,

    /// Store batches as files under this directory instead of in memory.
    #[arg(long = "store-dir", value_name = "DIR")]
    pub store_dir: Option<PathBuf>,

    /// Files to convert, processed in the given order.
    #[arg(value_name = "FILES", required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Parser)]
pub struct InspectArgs {
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Format id such as CSV_C_SJIS; detected when omitted.
    #[arg(long = "format", value_name = "ID")]
    pub format: Option<FileFormatId>,

    /// Number of rows to show.
    #[arg(long = "rows", default_value_t = 10)]
    pub rows: usize,
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Rule id or alias, e.g. DATE1 or CR_G_MF.
    #[arg(value_name = "RULE")]
    pub rule: String,

    #[arg(value_name = "VALUE", required = true)]
    pub values: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
