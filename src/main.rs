use clap::Parser;
use emitgen::cli::Cli;
use emitgen::generator::{self, GeneratorConfig};
use emitgen::loader::LoadError;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Exit status for a failed run: 2 when no analyzable package could be
/// loaded, 1 for everything else
fn failure_code(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<LoadError>().is_some() {
        2
    } else {
        1
    }
}

fn main() -> ExitCode {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let config = GeneratorConfig::from(&args);
    match generator::generate(&config) {
        Ok(report) => {
            tracing::info!(
                package = %report.package,
                output = %report.output.display(),
                callsites = report.callsites,
                "call-site table written"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(failure_code(&err))
        }
    }
}
