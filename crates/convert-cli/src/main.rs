//! `convert` command-line tool.

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use clap::{ColorChoice, Parser};
use convert_cli::commands::{RunOptions, apply_values, inspect_file, rule_catalog, run_profile};
use convert_cli::logging::{LogConfig, LogFormat, init_logging};
use convert_cli::summary::{applied_table, print_inspection, print_run_summary, rules_table};
use convert_core::CoreError;
use tracing::level_filters::LevelFilter;

mod cli;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};

/// Outcome reported by the run or the tool itself.
const EXIT_FAILURE: u8 = 1;
/// Bad arguments or an invalid profile.
const EXIT_USAGE: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        return ExitCode::from(EXIT_FAILURE);
    }

    let result = match cli.command {
        Command::Run(args) => run_profile(&RunOptions {
            profile: args.profile,
            files: args.files,
            output_dir: args.output_dir,
            session: args.session,
            store_dir: args.store_dir,
        })
        .map(|outcome| print_run_summary(&outcome)),
        Command::Inspect(args) => {
            inspect_file(&args.file, args.format, args.rows).map(|inspection| print_inspection(&inspection))
        }
        Command::Rules => {
            println!("{}", rules_table(&rule_catalog()));
            Ok(())
        }
        Command::Apply(args) => apply_values(&args.rule, &args.values)
            .map(|pairs| println!("{}", applied_table(&args.rule, &pairs))),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            let core = error.downcast_ref::<CoreError>();
            if let Some(suggestion) = core.and_then(CoreError::suggestion) {
                eprintln!("hint: {suggestion}");
            }
            if core.is_some_and(CoreError::is_configuration) {
                ExitCode::from(EXIT_USAGE)
            } else {
                ExitCode::from(EXIT_FAILURE)
            }
        }
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.log_data = cli.log_data;
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
