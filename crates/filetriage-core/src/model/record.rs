/// Canonical metadata for one ingested file.
///
/// Records are read-only to analyzer modules: they fetch a copy through the
/// [`FileMetadataProvider`](crate::provider::FileMetadataProvider) contract
/// and never write back.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Opaque identifier, stable for the lifetime of an enrichment pass.
    pub object_id: String,
    /// File name only (no directory components).
    pub file_name: String,
    /// Location the file was ingested from, when it came from disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
    /// Lower-case hex SHA-256 of the content, when computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    /// Free-form metadata contributed by ingestion tooling.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl FileRecord {
    /// Create a minimal record carrying only an id and a name.
    pub fn new(object_id: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            file_name: file_name.into(),
            path: None,
            size: 0,
            sha256: None,
            modified: None,
            extra: Map::new(),
        }
    }

    /// Lower-cased extension without the dot, or `""` when there is none.
    pub fn extension(&self) -> String {
        match self.file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
            _ => String::new(),
        }
    }
}
