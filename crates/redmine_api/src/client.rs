use std::path::{Path, PathBuf};

use tokio::fs::{self as async_fs, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::config::RedmineConfig;
use crate::error::{RedmineError, Result};
use crate::models::{AttachmentDescriptor, Fetched, IssueDocument};
use crate::transport::Transport;

const ISSUE_INCLUDES: &str = "journals,attachments";
const PARTIAL_SUFFIX: &str = "part";

#[derive(Clone)]
pub struct RedmineClient {
    transport: Transport,
    config: RedmineConfig,
}

impl RedmineClient {
    pub fn new(config: RedmineConfig) -> Result<Self> {
        let transport = Transport::new(&config)?;
        Ok(Self { transport, config })
    }

    /// Fetches an issue together with its journals and attachment metadata.
    pub async fn fetch_issue(&self, id: u64) -> Result<Fetched<IssueDocument>> {
        let path = format!("issues/{id}.json");
        self.transport
            .get_json(&path, Some(&[("include", ISSUE_INCLUDES)]), self.config.timeout)
            .await
            .map(|fetched| fetched.map(IssueDocument::new))
            .map_err(|err| RedmineError::for_issue(id, err))
    }

    /// Cheap authenticated request used as a pre-flight check. Any 2xx
    /// passes whatever the body holds. Never errors.
    pub async fn test_connectivity(&self) -> bool {
        let result = self
            .transport
            .get_status("projects.json", Some(&[("limit", "1")]), self.config.probe_timeout)
            .await;
        match result {
            Ok(status) if status.is_success() => true,
            Ok(status) => {
                warn!(%status, "connectivity probe rejected");
                false
            }
            Err(err) => {
                warn!(error = %err, "connectivity probe failed");
                false
            }
        }
    }

    pub fn extract_attachments(&self, document: &IssueDocument) -> Vec<AttachmentDescriptor> {
        document.attachments()
    }

    /// Streams an attachment to `destination`. Returns false on any failure,
    /// after logging the cause; the destination is never left half written.
    pub async fn download_attachment(&self, attachment_id: u64, destination: &Path) -> bool {
        match self.try_download_attachment(attachment_id, destination).await {
            Ok(written) => {
                debug!(attachment_id, bytes = written, path = %destination.display(), "attachment saved");
                true
            }
            Err(err) => {
                warn!(attachment_id, error = %err, "attachment download failed");
                false
            }
        }
    }

    async fn try_download_attachment(&self, attachment_id: u64, destination: &Path) -> Result<u64> {
        let path = format!("attachments/{attachment_id}");
        let mut response = self
            .transport
            .get_stream(&path, self.config.download_timeout)
            .await?;

        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                async_fs::create_dir_all(parent).await?;
            }
        }

        let partial = partial_path(destination);
        let streamed = async {
            let mut file = File::create(&partial).await?;
            let mut written = 0u64;
            while let Some(chunk) = response
                .chunk()
                .await
                .map_err(|err| RedmineError::request(&path, err))?
            {
                file.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            file.flush().await?;
            file.sync_all().await?;
            Ok::<u64, RedmineError>(written)
        }
        .await;

        match streamed {
            Ok(written) => {
                async_fs::rename(&partial, destination).await?;
                Ok(written)
            }
            Err(err) => {
                let _ = async_fs::remove_file(&partial).await;
                Err(err)
            }
        }
    }
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    destination.with_file_name(name)
}
