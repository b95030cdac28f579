//! CLI argument definitions.

use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

pub const DEFAULT_HISTORY_DIR: &str = "history";

/// Fetch Redmine issues (journals and attachments included) and store each one as JSON.
#[derive(Debug, Parser)]
#[command(
    name = "redmine-export",
    version,
    after_help = "Examples:\n  \
        redmine-export --output-dir /tmp/redmine_data 49121 50001\n  \
        redmine-export -o ./data --skip-existing 49122\n  \
        redmine-export --show-history\n  \
        redmine-export --list-history-dates\n\n\
        REDMINE_URL and REDMINE_API_KEY are read from the environment or a .env file."
)]
pub struct Cli {
    /// Issue ids to export.
    #[arg(value_name = "ISSUE_IDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub issue_ids: Vec<u64>,

    /// Directory receiving `issues/` and `attachments/`.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Directory holding the per-day run history.
    #[arg(long, value_name = "DIR", default_value = DEFAULT_HISTORY_DIR)]
    pub history_dir: PathBuf,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Do not fetch issues whose JSON file already exists.
    #[arg(long)]
    pub skip_existing: bool,

    /// Do not download attachments.
    #[arg(long)]
    pub no_attachments: bool,

    /// Print today's run history and exit.
    #[arg(long)]
    pub show_history: bool,

    /// Print the dates that have a history file and exit.
    #[arg(long)]
    pub list_history_dates: bool,
}

/// What the parsed arguments ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    ShowHistory,
    ListHistoryDates,
    Export {
        output_dir: PathBuf,
        issue_ids: Vec<u64>,
    },
}

impl Cli {
    /// Resolves the run mode, enforcing that exports name an output
    /// directory and at least one issue.
    pub fn mode(&self) -> Result<Mode, clap::Error> {
        if self.show_history {
            return Ok(Mode::ShowHistory);
        }
        if self.list_history_dates {
            return Ok(Mode::ListHistoryDates);
        }

        let mut command = Cli::command();
        let Some(output_dir) = self.output_dir.clone() else {
            return Err(command.error(
                ErrorKind::MissingRequiredArgument,
                "--output-dir is required unless a history option is given",
            ));
        };
        if self.issue_ids.is_empty() {
            return Err(command.error(
                ErrorKind::MissingRequiredArgument,
                "at least one issue id is required unless a history option is given",
            ));
        }

        Ok(Mode::Export {
            output_dir,
            issue_ids: self.issue_ids.clone(),
        })
    }
}
