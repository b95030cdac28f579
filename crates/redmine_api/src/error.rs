//! Error model used by Redmine API client operations.

use std::io;

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RedmineError>;

const BODY_SNIPPET_LIMIT: usize = 200;

/// Represents the failure modes of a Redmine API call. Every request-level variant records the attempted path so a single log line is enough to diagnose it.
#[derive(Debug, Error)]
pub enum RedmineError {
    #[error("GET {path} returned http {status}: {message}")]
    Http {
        path: String,
        status: StatusCode,
        message: String,
    },
    #[error("GET {path} was rejected ({status}): {message}")]
    Authentication {
        path: String,
        status: StatusCode,
        message: String,
    },
    #[error("GET {path} timed out: {message}")]
    Timeout { path: String, message: String },
    #[error("GET {path} could not connect: {message}")]
    Network { path: String, message: String },
    #[error("GET {path} returned a malformed body: {message}")]
    Malformed { path: String, message: String },
    #[error("issue {id}: {source}")]
    Issue {
        id: u64,
        #[source]
        source: Box<RedmineError>,
    },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid client configuration: {0}")]
    Configuration(String),
    #[error("unexpected error: {0}")]
    Other(String),
}

impl RedmineError {
    /// Builds a status error, keeping only a short snippet of the remote body.
    pub fn http(path: &str, status: StatusCode, body: &str) -> Self {
        let message = body_snippet(body);
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            RedmineError::Authentication {
                path: path.to_string(),
                status,
                message,
            }
        } else {
            RedmineError::Http {
                path: path.to_string(),
                status,
                message,
            }
        }
    }

    /// Classifies a transport failure for the given path.
    pub fn request(path: &str, err: reqwest::Error) -> Self {
        let path = path.to_string();
        let message = err.to_string();
        if err.is_timeout() {
            RedmineError::Timeout { path, message }
        } else if err.is_connect() {
            RedmineError::Network { path, message }
        } else if err.is_decode() {
            RedmineError::Malformed { path, message }
        } else if let Some(status) = err.status() {
            RedmineError::Http {
                path,
                status,
                message,
            }
        } else {
            RedmineError::Other(format!("GET {path}: {message}"))
        }
    }

    /// Wraps a failure with the issue it was raised for.
    pub fn for_issue(id: u64, source: RedmineError) -> Self {
        RedmineError::Issue {
            id,
            source: Box::new(source),
        }
    }

    /// HTTP status attached to this error, looking through issue wrappers.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RedmineError::Http { status, .. } | RedmineError::Authentication { status, .. } => {
                Some(*status)
            }
            RedmineError::Issue { source, .. } => source.status(),
            _ => None,
        }
    }
}

fn body_snippet(body: &str) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= BODY_SNIPPET_LIMIT {
        return collapsed;
    }
    let mut truncated: String = collapsed.chars().take(BODY_SNIPPET_LIMIT - 1).collect();
    truncated.push('…');
    truncated
}
