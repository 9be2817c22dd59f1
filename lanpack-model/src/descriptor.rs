//! Lightweight record descriptions for selection and progress UIs.

use serde::Serialize;
use uuid::Uuid;

use crate::kind::RecordKind;

/// Cheap metadata about one sub-record: enough to list it for selection
/// without loading or extracting its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescriptorInfo {
    pub id: Uuid,
    pub kind: RecordKind,
    pub name: String,
    /// Payload size in bytes, when the record carries one and it is known.
    pub size: Option<u64>,
}

impl DescriptorInfo {
    pub fn new(kind: RecordKind, id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            size: None,
        }
    }

    pub fn with_size(mut self, size: i64) -> Self {
        self.size = u64::try_from(size).ok();
        self
    }
}
