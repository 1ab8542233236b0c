/// Test helpers
///
/// Image fixtures and an in-memory blob store with injectable failures.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;

use crate::error::StoreError;
use crate::state::data::{ImageId, ImageRecord};
use crate::state::store::BlobStore;

/// Encode a solid-colour PNG
pub fn png_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([rgb[0], rgb[1], rgb[2], 255]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encode png fixture");
    bytes
}

/// A record holding a solid-colour PNG
pub fn record_from(id: &str, width: u32, height: u32, rgb: [u8; 3]) -> ImageRecord {
    ImageRecord {
        id: ImageId::from(id),
        bytes: Arc::from(png_bytes(width, height, rgb)),
        width,
        height,
    }
}

/// In-memory store. Enumeration is ordered by id like the SQLite store.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    pub blobs: BTreeMap<ImageId, Vec<u8>>,
    pub fail_writes: bool,
    pub fail_deletes: bool,
    pub fail_enumerate: bool,
    pub writes: usize,
    pub deletes: usize,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn write(&mut self, id: &ImageId, bytes: &[u8]) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Rejected("injected write failure".to_string()));
        }
        if self.blobs.contains_key(id) {
            return Err(StoreError::Rejected(format!("duplicate id {}", id)));
        }
        self.writes += 1;
        self.blobs.insert(id.clone(), bytes.to_vec());
        Ok(())
    }

    fn delete(&mut self, id: &ImageId) -> Result<bool, StoreError> {
        if self.fail_deletes {
            return Err(StoreError::Rejected("injected delete failure".to_string()));
        }
        self.deletes += 1;
        Ok(self.blobs.remove(id).is_some())
    }

    fn enumerate(&self) -> Result<Vec<(ImageId, Vec<u8>)>, StoreError> {
        if self.fail_enumerate {
            return Err(StoreError::Rejected("injected enumerate failure".to_string()));
        }
        Ok(self
            .blobs
            .iter()
            .map(|(id, bytes)| (id.clone(), bytes.clone()))
            .collect())
    }
}
