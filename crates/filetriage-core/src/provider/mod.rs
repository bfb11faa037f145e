/// File metadata provider: the narrow read contract modules use to look up
/// a file by its `object_id`.
///
/// The provider is shared across concurrent passes and is read-only from
/// the analysis core's point of view.
pub mod memory;

pub use memory::InMemoryStore;

use crate::model::FileRecord;
use std::sync::Arc;

/// Errors raised by a metadata provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The identifier does not address any known file.
    #[error("no file metadata for object_id {0}")]
    NotFound(String),
    /// The backing store could not be reached.
    #[error("metadata store unavailable: {0}")]
    Unavailable(String),
}

/// Look up canonical metadata for a file.
pub trait FileMetadataProvider: Send + Sync {
    fn get_file_metadata(&self, object_id: &str) -> Result<FileRecord, ProviderError>;
}

/// Shared handle to a provider, as held by modules and the pipeline.
pub type SharedProvider = Arc<dyn FileMetadataProvider>;
