/// Error types for the image library
///
/// `StoreError` is what a blob store reports. `LibraryError` is what the
/// library operations surface to the UI, always recoverable at the
/// operation boundary.

use thiserror::Error;

use crate::state::data::ImageId;

/// Failure reported by a `BlobStore` implementation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The store refused the operation (e.g. a duplicate identity)
    #[error("{0}")]
    Rejected(String),
}

/// Errors surfaced by library operations
#[derive(Debug, Error)]
pub enum LibraryError {
    /// The blob could not be durably written; the image was not added
    #[error("could not save image {id}: {source}")]
    StorageWrite {
        id: ImageId,
        #[source]
        source: StoreError,
    },

    /// The blob could not be deleted; the image was kept
    #[error("could not delete image {id}: {source}")]
    StorageDelete {
        id: ImageId,
        #[source]
        source: StoreError,
    },

    /// The store could not be enumerated
    #[error("could not read the image library: {0}")]
    StorageRead(#[source] StoreError),

    /// Bytes are not a decodable image
    #[error("image {what} could not be decoded: {reason}")]
    Decode { what: String, reason: String },

    /// The user closed the picker without choosing an image
    #[error("image selection was cancelled")]
    SourceCancelled,

    /// The platform refused access to the requested image
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A position outside the collection was addressed
    #[error("position {position} is out of range for {len} images")]
    PositionOutOfRange { position: usize, len: usize },

    /// A selection-only action was requested with nothing selected
    #[error("no image is selected")]
    NothingSelected,

    /// Writing an exported copy failed
    #[error("could not export image: {0}")]
    Export(#[source] std::io::Error),
}

impl LibraryError {
    /// Build a decode error from any displayable cause
    pub fn decode(what: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        LibraryError::Decode {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    /// Short message suitable for a transient notification
    pub fn user_message(&self) -> String {
        match self {
            LibraryError::StorageWrite { .. } => "Saving the image failed".to_string(),
            LibraryError::StorageDelete { .. } | LibraryError::StorageRead(_) => {
                "Something went wrong".to_string()
            }
            LibraryError::Decode { .. } => "That file is not a supported image".to_string(),
            LibraryError::SourceCancelled => "No image chosen".to_string(),
            LibraryError::PermissionDenied(_) => "Please grant permission to proceed".to_string(),
            LibraryError::PositionOutOfRange { .. } | LibraryError::NothingSelected => {
                "Select an image first".to_string()
            }
            LibraryError::Export(_) => "Exporting the image failed".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
