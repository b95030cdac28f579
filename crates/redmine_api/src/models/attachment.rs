//! Attachment descriptors extracted from Redmine issue documents.

use serde_json::Value;

/// Represents one attachment referenced by an issue or by one of its journal entries. Only the id and filename are kept; the binary content is downloaded separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentDescriptor {
    pub id: Option<u64>,
    pub filename: Option<String>,
}

impl AttachmentDescriptor {
    /// Reads a descriptor from one entry of an `attachments` array.
    ///
    /// Ids may come back as numbers or numeric strings; anything else is
    /// treated as missing.
    pub fn from_value(value: &Value) -> Self {
        let id = value.get("id").and_then(coerce_id);
        let filename = value
            .get("filename")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(ToOwned::to_owned);
        Self { id, filename }
    }

    /// Filename to store the attachment under, reduced to a single path
    /// component. Falls back to `attachment_<id>`.
    pub fn file_name(&self) -> String {
        let fallback = || match self.id {
            Some(id) => format!("attachment_{id}"),
            None => "attachment".to_string(),
        };
        match self.filename.as_deref() {
            Some(name) => {
                let cleaned: String = name
                    .chars()
                    .map(|ch| if matches!(ch, '/' | '\\' | '\0') { '_' } else { ch })
                    .collect();
                if cleaned == "." || cleaned == ".." {
                    fallback()
                } else {
                    cleaned
                }
            }
            None => fallback(),
        }
    }
}

fn coerce_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
