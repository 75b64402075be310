mod config;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use synthforge_core::CompileError;
use synthforge_emit::sink::write_bytes_atomic;
use thiserror::Error;

use config::{FlagOptions, OptionsFile, merge};
use logging::{LogFormat, init_logging};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error("logging error: {0}")]
    Logging(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("options file error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "synthforge", version, about = "Prototype specification compiler")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile an XML prototype specification into C++ headers.
    Compile(CompileArgs),
}

#[derive(Args, Debug)]
struct CompileArgs {
    /// Prototype specification to compile.
    #[arg(long, value_name = "XML")]
    spec: Option<PathBuf>,
    /// C++ namespace of the generated declarations, e.g. `Acme::Gen`.
    #[arg(long)]
    namespace: Option<String>,
    /// Output base directory.
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,
    /// TOML options file; flags override its values.
    #[arg(long, value_name = "TOML")]
    config: Option<PathBuf>,
    /// Write the emit report as JSON.
    #[arg(long, value_name = "JSON")]
    report: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Compile(args) => run_compile(args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_compile(args: CompileArgs) -> Result<(), CliError> {
    let CompileArgs {
        spec,
        namespace,
        out,
        config,
        report,
        log_format,
    } = args;

    init_logging(log_format)?;

    let file = match &config {
        Some(path) => OptionsFile::load(path)?,
        None => OptionsFile::default(),
    };
    let options = merge(file, FlagOptions { spec, namespace, out })?;

    let timer = Instant::now();
    let emitted = synthforge_emit::compile(&options).map_err(|err| {
        tracing::error!(event = "compile_failed", error = %err);
        err
    })?;

    if let Some(path) = &report {
        let encoded = emitted.to_json_pretty()?;
        write_bytes_atomic(path, encoded.as_bytes())?;
        tracing::info!(event = "report_written", path = %path.display());
    }

    let duration_ms = timer.elapsed().as_millis();
    tracing::info!(
        event = "compile_finished",
        status = "success",
        duration_ms = duration_ms,
        warnings = emitted.warnings.len(),
        skipped_sequences = emitted.skipped_sequences.len()
    );
    Ok(())
}
