use image::imageops::FilterType;

use crate::error::{LibraryError, Result};
use crate::state::data::ImageRecord;

/// Default size of generated thumbnails (longest edge)
pub const THUMBNAIL_SIZE: u32 = 256;

/// Decoded RGBA thumbnail ready to hand to the renderer
#[derive(Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl std::fmt::Debug for Thumbnail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Thumbnail")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

/// Generate a thumbnail for a record without blocking the caller
///
/// Decoding is CPU-bound, so it runs on tokio's blocking pool.
pub async fn generate_thumbnail(record: ImageRecord, size: u32) -> Result<Thumbnail> {
    let what = record.id.to_string();
    tokio::task::spawn_blocking(move || generate_thumbnail_blocking(&record, size))
        .await
        .map_err(|e| LibraryError::decode(what, format!("thumbnail task failed: {}", e)))?
}

/// Blocking implementation of thumbnail generation
pub fn generate_thumbnail_blocking(record: &ImageRecord, size: u32) -> Result<Thumbnail> {
    let img = super::decode(record.id.as_str(), &record.bytes)?;

    // Only shrink; small images are shown as they are
    let img = if img.width() > size || img.height() > size {
        img.resize(size, size, FilterType::Lanczos3)
    } else {
        img
    };

    let rgba = img.to_rgba8();
    log::trace!(
        "📸 Generated thumbnail for {}: {}x{}",
        record.id,
        rgba.width(),
        rgba.height()
    );

    Ok(Thumbnail {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    })
}
