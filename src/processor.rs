//! Per-issue export pipeline: skip check, fetch, save, attachment fan-out.

use std::path::PathBuf;

use log::{error, info, warn};
use redmine_api::{AttachmentDescriptor, Fetched, RedmineClient};

use crate::issue_store::IssueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOptions {
    pub skip_existing: bool,
    pub download_attachments: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            skip_existing: false,
            download_attachments: true,
        }
    }
}

/// Per-attachment accounting for one issue. Files already on disk count as
/// succeeded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttachmentTally {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl AttachmentTally {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Terminal state reached by one issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueOutcome {
    Skipped,
    NotFound,
    Saved {
        path: PathBuf,
        attachments: AttachmentTally,
    },
    Failed(String),
}

impl IssueOutcome {
    /// Attachment failures never turn a saved issue into a failure.
    pub fn succeeded(&self) -> bool {
        matches!(self, IssueOutcome::Skipped | IssueOutcome::Saved { .. })
    }
}

/// Borrows the client and store for the duration of a batch.
pub struct IssueProcessor<'a> {
    client: &'a RedmineClient,
    store: &'a IssueStore,
    options: ProcessOptions,
}

impl<'a> IssueProcessor<'a> {
    pub fn new(client: &'a RedmineClient, store: &'a IssueStore, options: ProcessOptions) -> Self {
        Self {
            client,
            store,
            options,
        }
    }

    pub async fn process_issue(&self, id: u64) -> bool {
        self.process(id).await.succeeded()
    }

    pub async fn process(&self, id: u64) -> IssueOutcome {
        if self.options.skip_existing && self.store.exists(id) {
            info!("Issue {}: already exported, skipping", id);
            return IssueOutcome::Skipped;
        }

        info!("Issue {}: fetching", id);
        let document = match self.client.fetch_issue(id).await {
            Ok(Fetched::Found(document)) => document,
            Ok(Fetched::NotFound) => {
                error!("Issue {}: not found (404)", id);
                return IssueOutcome::NotFound;
            }
            Err(err) => {
                error!("Issue {}: API error - {}", id, err);
                return IssueOutcome::Failed(err.to_string());
            }
        };

        let path = match self.store.save_issue(id, &document) {
            Ok(path) => path,
            Err(err) => {
                error!("Issue {}: storage error - {}", id, err);
                return IssueOutcome::Failed(err.to_string());
            }
        };
        info!("Issue {}: saved to {}", id, path.display());

        let attachments = if self.options.download_attachments {
            let descriptors = self.client.extract_attachments(&document);
            self.download_attachments(id, &descriptors).await
        } else {
            AttachmentTally::default()
        };

        IssueOutcome::Saved { path, attachments }
    }

    async fn download_attachments(
        &self,
        issue_id: u64,
        descriptors: &[AttachmentDescriptor],
    ) -> AttachmentTally {
        let mut tally = AttachmentTally::default();
        if descriptors.is_empty() {
            info!("Issue {}: no attachments", issue_id);
            return tally;
        }

        info!("Issue {}: downloading {} attachment(s)", issue_id, descriptors.len());
        for descriptor in descriptors {
            let Some(attachment_id) = descriptor.id else {
                warn!("Issue {}: attachment entry without id: {:?}", issue_id, descriptor);
                tally.failed += 1;
                continue;
            };

            let filename = descriptor.file_name();
            let destination = self.store.attachment_path(issue_id, &filename);
            if destination.exists() {
                info!("  {} already present, skipping", filename);
                tally.succeeded += 1;
                tally.skipped += 1;
                continue;
            }

            if self.client.download_attachment(attachment_id, &destination).await {
                info!("  {} downloaded", filename);
                tally.succeeded += 1;
            } else {
                warn!("  {} download failed", filename);
                tally.failed += 1;
            }
        }

        if tally.failed > 0 {
            warn!(
                "Issue {}: {}/{} attachment(s) failed to download",
                issue_id,
                tally.failed,
                descriptors.len()
            );
        } else {
            info!("Issue {}: all attachments downloaded", issue_id);
        }
        tally
    }
}
