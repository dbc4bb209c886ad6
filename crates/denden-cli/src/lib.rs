//! Command-line client runtime for the DenDen request server.
//!
//! The module owns argument parsing, configuration loading, request
//! preparation and the single JSONL exchange with the server. IO streams and
//! the configuration loader are injectable so the runtime can be exercised
//! from tests without a real terminal.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use denden_config::Config;
use denden_types::{RpcCall, RpcReply};
use serde::Serialize;

mod cli;
mod config;
mod envelope;
mod errors;
mod transport;

use cli::{Cli, CliCommand};
use config::{ConfigLoader, OrthoConfigLoader, split_config_arguments};
use envelope::{EnvelopeDefaults, prepare_request};
pub(crate) use errors::AppError;
use transport::{connect, exchange};

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, &OrthoConfigLoader)
}

pub(crate) fn run_with_loader<I, W, E, L>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);

    let cli = match Cli::try_parse_from(&split.command_arguments) {
        Ok(cli) => cli,
        Err(error) if is_informational(&error) => {
            let _ = write!(stdout, "{error}");
            return ExitCode::SUCCESS;
        }
        Err(error) => {
            let _ = write!(stderr, "{}", AppError::CliUsage(error));
            return ExitCode::FAILURE;
        }
    };

    let result = loader
        .load(&split.config_arguments)
        .and_then(|config| execute(cli.command, &config, stdout));
    match result {
        Ok(exit_code) => exit_code,
        Err(error) => {
            let _ = writeln!(stderr, "error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn is_informational(error: &clap::Error) -> bool {
    matches!(
        error.kind(),
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
    )
}

fn execute<W: Write>(
    command: CliCommand,
    config: &Config,
    stdout: &mut W,
) -> Result<ExitCode, AppError> {
    let call = match command {
        CliCommand::Send { request } => {
            let defaults = EnvelopeDefaults::from_environment()?;
            RpcCall::Send {
                request: prepare_request(&request, &defaults)?,
            }
        }
        CliCommand::Status => RpcCall::Status,
    };

    let mut connection = connect(config.daemon_socket(), config.request_timeout())?;
    match exchange(&mut connection, &call)? {
        RpcReply::Response { response } => {
            print_json(stdout, &response)?;
            Ok(if response.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        RpcReply::Status { status } => {
            print_json(stdout, &status)?;
            Ok(ExitCode::SUCCESS)
        }
        RpcReply::Fault { message } => Err(AppError::Fault(message)),
    }
}

fn print_json<W: Write, T: Serialize>(stdout: &mut W, value: &T) -> Result<(), AppError> {
    serde_json::to_writer_pretty(&mut *stdout, value).map_err(AppError::SerialiseOutput)?;
    stdout.write_all(b"\n").map_err(AppError::WriteOutput)?;
    stdout.flush().map_err(AppError::WriteOutput)
}

#[cfg(test)]
mod tests;
