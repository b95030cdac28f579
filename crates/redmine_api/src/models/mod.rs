mod attachment;
mod issue;

pub use attachment::AttachmentDescriptor;
pub use issue::{Fetched, IssueDocument};
