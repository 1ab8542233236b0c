/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the blob store, the collection and the UI layer.

use std::fmt;
use std::sync::Arc;

/// Opaque identity of a stored image
///
/// Generated from a timestamp at creation time. Identities issued by the
/// library sort in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(String);

impl ImageId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ImageId {
    fn from(value: String) -> Self {
        ImageId(value)
    }
}

impl From<&str> for ImageId {
    fn from(value: &str) -> Self {
        ImageId(value.to_string())
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Represents a single image in the library
///
/// The record does not know its position; that is always its current
/// index in the owning collection.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    /// Key of the blob in the store
    pub id: ImageId,
    /// Encoded image bytes exactly as stored
    pub bytes: Arc<[u8]>,
    /// Pixel width from the encoded header
    pub width: u32,
    /// Pixel height from the encoded header
    pub height: u32,
}

impl ImageRecord {
    /// Height of a tile of the given width that keeps the image's aspect ratio
    pub fn tile_height(&self, tile_width: f32) -> f32 {
        if self.width == 0 {
            return tile_width;
        }
        tile_width * self.height as f32 / self.width as f32
    }
}

/// Outcome of a cold load from the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Records now in the collection
    pub loaded: usize,
    /// Blobs skipped because they could not be decoded
    pub skipped: usize,
}
