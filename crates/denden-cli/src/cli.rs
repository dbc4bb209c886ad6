//! CLI argument definitions for the DenDen client.

use clap::{Parser, Subcommand};

/// Command-line client for the DenDen request server.
#[derive(Parser, Debug)]
#[command(name = "denden", disable_help_subcommand = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum CliCommand {
    /// Submits a request envelope and prints the server's response.
    Send {
        /// Request envelope as JSON. Missing identifiers and trace fields are
        /// filled in before sending.
        #[arg(value_name = "JSON")]
        request: String,
    },
    /// Prints the server's uptime.
    Status,
}
