/// Image decoding module
///
/// This module handles:
/// - Fully decoding new and stored blobs
/// - Guessing the file extension of encoded bytes
/// - Generating grid thumbnails off the UI thread

pub mod thumbnail;

use image::DynamicImage;

use crate::error::{LibraryError, Result};

/// Fully decode an encoded image
pub fn decode(what: &str, bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| LibraryError::decode(what, e))
}

/// File extension matching the encoded format, used for exported copies
pub fn extension_for(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .ok()
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or("img")
}
