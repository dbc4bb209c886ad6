//! CLI entrypoint for the DenDen client.
//!
//! The binary delegates to [`denden_cli::run`], which loads configuration,
//! prepares the request envelope and exchanges one JSONL call with the server.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    denden_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
