//! Redmine issue exporter: fetches issues with their journals and
//! attachments and writes them to a local directory tree, keeping a
//! per-day history of every run.

use std::fmt;
use std::path::Path;
use std::process::ExitCode;

use log::{error, info, warn};
use redmine_api::RedmineClient;
use tokio::sync::watch;

pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod issue_store;
pub mod processor;

use cli::{Cli, Mode};
use config::Credentials;
use error::AppError;
use history::{display_date, HistoryLog};
use issue_store::IssueStore;
use processor::{IssueProcessor, ProcessOptions};

/// Success/failure counts for one batch of issue ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub successful: usize,
    pub failed: usize,
    pub total: usize,
}

impl BatchSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, succeeded: bool) {
        if succeeded {
            self.successful += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0 && self.successful == self.total
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "succeeded:{}, failed:{}, total:{}",
            self.successful, self.failed, self.total
        )
    }
}

/// Executes the resolved mode and records the outcome of exports in the
/// history log. The returned code is non-zero iff the run failed.
pub async fn run(cli: &Cli, mode: Mode, command_line: &str) -> ExitCode {
    let history = HistoryLog::new(&cli.history_dir);

    match mode {
        Mode::ShowHistory => {
            print_today(&history);
            ExitCode::SUCCESS
        }
        Mode::ListHistoryDates => {
            print_dates(&history);
            ExitCode::SUCCESS
        }
        Mode::Export {
            output_dir,
            issue_ids,
        } => {
            let options = ProcessOptions {
                skip_existing: cli.skip_existing,
                download_attachments: !cli.no_attachments,
            };
            let result = match Credentials::from_env() {
                Ok(credentials) => {
                    let interrupt = interrupt_signal();
                    export(&credentials, &output_dir, &issue_ids, options, interrupt).await
                }
                Err(err) => Err(err.into()),
            };
            finish_export(&history, command_line, result)
        }
    }
}

/// Probes the server, prepares the output tree and exports every id in
/// order.
pub async fn export(
    credentials: &Credentials,
    output_dir: &Path,
    issue_ids: &[u64],
    options: ProcessOptions,
    interrupt: watch::Receiver<bool>,
) -> Result<BatchSummary, AppError> {
    info!("Starting Redmine export");
    info!("Issues: {:?}", issue_ids);
    info!("Output directory: {}", output_dir.display());

    let client = RedmineClient::new(credentials.client_config())?;

    info!("Testing connection to {}", credentials.url());
    if !client.test_connectivity().await {
        error!("Could not reach Redmine; check REDMINE_URL and REDMINE_API_KEY");
        return Err(AppError::Connectivity);
    }
    info!("Connection OK");

    let store = IssueStore::new(output_dir);
    store.ensure_layout()?;
    info!("Issues directory: {}", store.issues_dir().display());
    info!("Attachments directory: {}", store.attachments_dir().display());
    if options.download_attachments {
        info!("Attachment download enabled");
    } else {
        info!("Attachment download disabled (--no-attachments)");
    }

    let processor = IssueProcessor::new(&client, &store, options);
    export_issues(&processor, issue_ids, interrupt).await
}

/// Runs every id through the processor, one at a time. A `true` on the
/// interrupt channel cancels the current issue and ends the batch.
pub async fn export_issues(
    processor: &IssueProcessor<'_>,
    issue_ids: &[u64],
    mut interrupt: watch::Receiver<bool>,
) -> Result<BatchSummary, AppError> {
    let mut summary = BatchSummary::new(issue_ids.len());

    for &id in issue_ids {
        tokio::select! {
            biased;
            Ok(_) = interrupt.wait_for(|interrupted| *interrupted) => {
                warn!("Interrupted by user before finishing issue {}", id);
                return Err(AppError::Interrupted(summary));
            }
            succeeded = processor.process_issue(id) => summary.record(succeeded),
        }
    }

    info!("==================================================");
    info!("Results:");
    info!("  succeeded: {}", summary.successful);
    info!("  failed:    {}", summary.failed);
    info!("  total:     {}", summary.total);
    Ok(summary)
}

/// Spawns a Ctrl-C listener and returns a receiver that flips to `true`
/// once the signal arrives.
pub fn interrupt_signal() -> watch::Receiver<bool> {
    let (sender, receiver) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = sender.send(true);
            }
            Err(err) => warn!("Could not listen for Ctrl-C: {}", err),
        }
    });
    receiver
}

/// Logs the run result, appends it to the history and maps it to an exit code.
pub fn finish_export(
    history: &HistoryLog,
    command_line: &str,
    result: Result<BatchSummary, AppError>,
) -> ExitCode {
    match result {
        Ok(summary) if summary.all_succeeded() => {
            info!("All issues exported");
            history.append(command_line, true, Some(&summary.to_string()));
            ExitCode::SUCCESS
        }
        Ok(summary) => {
            warn!("{} issue(s) failed", summary.failed);
            history.append(command_line, false, Some(&summary.to_string()));
            ExitCode::FAILURE
        }
        Err(err) => {
            error!("{}", err);
            history.append(command_line, false, Some(&err.to_string()));
            ExitCode::FAILURE
        }
    }
}

fn print_today(history: &HistoryLog) {
    let entries = history.read_today();
    if entries.is_empty() {
        println!("No history for today");
        return;
    }
    println!("=== Today's runs ===");
    for entry in entries {
        println!("{entry}");
    }
}

fn print_dates(history: &HistoryLog) {
    let dates = history.list_available_dates();
    if dates.is_empty() {
        println!("No history files");
        return;
    }
    println!("=== Dates with history ===");
    for date in dates {
        println!("{} ({})", date, display_date(&date));
    }
}
