/// Image sources: where new library images come from
///
/// Both sources end in the same `SourceOutcome`; the library treats them
/// the same once bytes are in hand.

use rfd::FileDialog;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::LibraryError;
use crate::imaging;

/// Extensions offered by the pickers
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Pick any image file
    Gallery,
    /// Pick a photo from the capture folder
    Camera,
}

/// Result of asking a source for an image
#[derive(Debug)]
pub enum SourceOutcome {
    Picked(Vec<u8>),
    Cancelled,
    Failed(LibraryError),
}

impl SourceOutcome {
    /// The picked bytes; a cancelled pick becomes `SourceCancelled`
    pub fn into_bytes(self) -> Result<Vec<u8>, LibraryError> {
        match self {
            SourceOutcome::Picked(bytes) => Ok(bytes),
            SourceOutcome::Cancelled => Err(LibraryError::SourceCancelled),
            SourceOutcome::Failed(e) => Err(e),
        }
    }
}

/// Show the native picker for `kind` and read the chosen image.
///
/// Blocks until the dialog closes, like every native dialog.
pub fn request_image(kind: SourceKind) -> SourceOutcome {
    let dialog = FileDialog::new().add_filter("Images", IMAGE_EXTENSIONS);
    let dialog = match kind {
        SourceKind::Gallery => dialog.set_title("Add Image from Gallery"),
        SourceKind::Camera => {
            let dialog = dialog.set_title("Add Captured Photo");
            match dirs::picture_dir() {
                Some(dir) => dialog.set_directory(dir),
                None => dialog,
            }
        }
    };

    match dialog.pick_file() {
        Some(path) => read_image(&path),
        None => SourceOutcome::Cancelled,
    }
}

/// Read and validate an image file
pub fn read_image(path: &Path) -> SourceOutcome {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            return SourceOutcome::Failed(LibraryError::PermissionDenied(path.display().to_string()));
        }
        Err(e) => {
            return SourceOutcome::Failed(LibraryError::decode(path.display().to_string(), e));
        }
    };

    // The library only accepts bytes that decode
    match imaging::decode(&path.display().to_string(), &bytes) {
        Ok(_) => SourceOutcome::Picked(bytes),
        Err(e) => SourceOutcome::Failed(e),
    }
}
