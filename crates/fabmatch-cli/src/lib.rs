//! Command-line front end for fabmatch.
//!
//! Every command prints a single status line on stdout (`Success`,
//! `Matched: N | Manual Check Needed: M`, or `Error: ...`). Logs go to
//! stderr.

use clap::Parser;
use tracing::error;

pub mod commands;

pub use commands::Command;

#[derive(Debug, Parser)]
#[command(
    name = "fabmatch",
    version,
    about = "Match BIM model elements to fabrication assembly parts",
    after_help = "EXAMPLES:\n  \
                  fabmatch parse-ifc hall.ifc out/entities.json\n  \
                  fabmatch parse-xml hall.xml out/parts.json\n  \
                  fabmatch match --ifc-json out/entities.json --xml-json out/parts.json \\\n    \
                  --out-json out/matches.json --out-csv out/matches.csv \\\n    \
                  --property-set '+Träger' --property-key Position\n  \
                  fabmatch finalize out/matches.csv final/"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// What a command run reports to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub status: String,
    pub success: bool,
}

/// Execute a command, turning any failure into an `Error: ...` status.
pub fn run(command: &Command) -> Report {
    match command.execute() {
        Ok(status) => Report {
            status,
            success: true,
        },
        Err(err) => {
            error!("{err:#}");
            Report {
                status: format!("Error: {err:#}"),
                success: false,
            }
        }
    }
}
