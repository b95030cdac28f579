use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AttachmentDescriptor;

/// Outcome of a request whose 404 is an expected answer rather than a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Found(T),
    NotFound,
}

impl<T> Fetched<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Fetched::Found(value) => Fetched::Found(f(value)),
            Fetched::NotFound => Fetched::NotFound,
        }
    }

    pub fn found(self) -> Option<T> {
        match self {
            Fetched::Found(value) => Some(value),
            Fetched::NotFound => None,
        }
    }
}

/// Raw issue payload as returned by `issues/{id}.json`. The document is kept
/// untouched; only the attachment lists are ever read from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueDocument(Value);

impl IssueDocument {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Attachments of the issue itself followed by those of every journal
    /// entry, in document order. Unknown shapes yield nothing.
    pub fn attachments(&self) -> Vec<AttachmentDescriptor> {
        let Some(issue) = self.0.get("issue") else {
            return Vec::new();
        };

        let own = attachment_entries(issue);
        let journals = issue
            .get("journals")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .flat_map(attachment_entries);

        own.chain(journals)
            .map(AttachmentDescriptor::from_value)
            .collect()
    }
}

fn attachment_entries(node: &Value) -> impl Iterator<Item = &Value> {
    node.get("attachments")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}
