//! Command-line front end: `server` and `check`.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::config::{Configuration, ValidationError};
use crate::lifecycle::signals::shutdown_signal;
use crate::lifecycle::startup::{self, StartupError};
use crate::lifecycle::Bootstrap;

#[derive(Debug, Parser)]
#[command(about, version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Runs the application as an HTTP server
    Server {
        /// Configuration file (TOML); defaults apply when omitted
        file: Option<PathBuf>,
    },
    /// Parses and validates the configuration file
    Check {
        /// Configuration file (TOML); defaults apply when omitted
        file: Option<PathBuf>,
    },
}

/// Parse the process arguments and run the selected command.
pub async fn run<C: Configuration>(bootstrap: Bootstrap<C>) -> ExitCode {
    execute(&bootstrap, Cli::parse()).await
}

/// Run an already parsed command line.
///
/// `check` reports to stdout. `server` reports startup failures to stderr:
/// logging is only initialized once the configuration has been accepted.
pub async fn execute<C: Configuration>(bootstrap: &Bootstrap<C>, cli: Cli) -> ExitCode {
    match cli.command {
        Commands::Server { file } => {
            match startup::run_server(bootstrap, file.as_deref(), shutdown_signal()).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(StartupError::Validation(error)) => {
                    let _ = report_violations(&mut io::stderr().lock(), &error);
                    ExitCode::FAILURE
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Check { file } => match startup::check(bootstrap, file.as_deref()) {
            Ok(_) => {
                println!("Configuration is OK");
                ExitCode::SUCCESS
            }
            Err(StartupError::Validation(error)) => {
                let _ = report_violations(&mut io::stdout().lock(), &error);
                ExitCode::FAILURE
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

/// One line per violation under a `Configuration is invalid:` header.
fn report_violations(out: &mut impl Write, error: &ValidationError) -> io::Result<()> {
    writeln!(out, "Configuration is invalid:")?;
    for violation in error.violations() {
        writeln!(out, "  - {}", violation)?;
    }
    Ok(())
}
