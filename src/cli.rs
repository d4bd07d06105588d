//! CLI argument parsing for emitgen

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the generated call-site table
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Rust source with a static lookup table (default)
    Rust,
    /// JSON document for other toolchains
    Json,
}

impl OutputFormat {
    /// File name used when no output path is given
    pub fn default_file_name(self) -> &'static str {
        match self {
            OutputFormat::Rust => "emitter_callsites.rs",
            OutputFormat::Json => "emitter_callsites.json",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "emitgen")]
#[command(version)]
#[command(
    about = "Generate call-site tables for registered instrumentation callbacks",
    long_about = None
)]
pub struct Cli {
    /// Directory holding the package dump (`*.tree.json`)
    #[arg(value_name = "DIR")]
    pub directory: PathBuf,

    /// Output file; a bare file name is placed inside DIR, `-` writes to stdout
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Name of the generated table
    #[arg(long = "var", value_name = "NAME", default_value = crate::codegen::DEFAULT_VAR_NAME)]
    pub var_name: String,

    /// Package name written into the output (default: the dumped package's name)
    #[arg(long = "package", value_name = "NAME")]
    pub package_name: Option<String>,

    /// Output format (rust or json)
    #[arg(long = "format", value_enum, default_value = "rust")]
    pub format: OutputFormat,

    /// Path of the details type used by the Rust table
    #[arg(
        long = "details-type",
        value_name = "PATH",
        default_value = crate::codegen::DEFAULT_DETAILS_TYPE
    )]
    pub details_type: String,

    /// Instrumentation profile (TOML) replacing the built-in emitter profile
    #[arg(long = "profile", value_name = "TOML")]
    pub profile: Option<PathBuf>,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
