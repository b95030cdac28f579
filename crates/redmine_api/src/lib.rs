//! Typed Redmine REST API client crate used by the exporter binary.

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod transport;

pub use client::RedmineClient;
pub use config::RedmineConfig;
pub use error::{RedmineError, Result};
pub use models::{AttachmentDescriptor, Fetched, IssueDocument};
pub use transport::Transport;
