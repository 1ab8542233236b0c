/// The ordered image collection
///
/// Insertion order is display order is store enumeration order. Every
/// append writes its blob before the record joins the sequence and every
/// removal deletes its blob before the record leaves it, so the store and
/// the sequence never disagree after a failed operation.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::data::{ImageId, ImageRecord, LoadReport};
use super::store::BlobStore;
use crate::error::{LibraryError, Result};
use crate::imaging;

/// Timestamp layout of generated identities (UTC, millisecond precision)
const ID_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%3f";

/// Width of the collision suffix. Keeps suffixed ids sorting correctly.
const ID_SUFFIX_WIDTH: usize = 6;

/// Largest suffix that still fits `ID_SUFFIX_WIDTH` digits
const ID_SUFFIX_MAX: u32 = 999_999;

/// Generates strictly increasing, timestamp-derived image identities.
///
/// When the clock has not advanced past the last issued id (same
/// millisecond, or the clock stepped backwards) the last timestamp is
/// reused with an incremented `-NNNNNN` suffix.
#[derive(Debug, Default, Clone)]
pub struct IdGenerator {
    last_base: Option<String>,
    last_suffix: u32,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next identity for the current wall clock
    pub fn next_id(&mut self) -> ImageId {
        self.next_at(Utc::now())
    }

    /// Next identity for the given instant
    pub fn next_at(&mut self, now: DateTime<Utc>) -> ImageId {
        let candidate = now.format(ID_TIMESTAMP_FORMAT).to_string();

        if let Some(base) = &self.last_base {
            if candidate <= format_id(base, self.last_suffix) {
                if self.last_suffix < ID_SUFFIX_MAX {
                    self.last_suffix += 1;
                    return ImageId::from(format_id(base, self.last_suffix));
                }
                // Suffixes are exhausted: move the base one step forward
                let rolled = roll_base(base);
                self.last_base = Some(rolled.clone());
                self.last_suffix = 0;
                return ImageId::from(rolled);
            }
        }

        self.last_base = Some(candidate.clone());
        self.last_suffix = 0;
        ImageId::from(candidate)
    }

    /// Make sure future ids sort after `id`
    pub fn observe(&mut self, id: &ImageId) {
        let (base, suffix) = match id.as_str().split_once('-') {
            Some((base, suffix)) => (base, suffix.parse().unwrap_or(0)),
            None => (id.as_str(), 0),
        };

        let newer = match &self.last_base {
            Some(last) => format_id(base, suffix) > format_id(last, self.last_suffix),
            None => true,
        };
        if newer {
            self.last_base = Some(base.to_string());
            self.last_suffix = suffix;
        }
    }
}

/// The next base after `base` in sort order, keeping its width.
///
/// Bases are fixed-width digit strings, so the numeric successor sorts
/// right after every suffixed id of `base`.
fn roll_base(base: &str) -> String {
    match base.parse::<u64>() {
        Ok(value) => format!("{:0width$}", value + 1, width = base.len()),
        // Not a generated id; any extension sorts after it
        Err(_) => format!("{}0", base),
    }
}

fn format_id(base: &str, suffix: u32) -> String {
    if suffix == 0 {
        base.to_string()
    } else {
        format!("{}-{:0width$}", base, suffix, width = ID_SUFFIX_WIDTH)
    }
}

/// In-memory ordered list of image records backed by a blob store.
#[derive(Debug)]
pub struct ImageCollection<S> {
    store: S,
    records: Vec<ImageRecord>,
    ids: IdGenerator,
}

impl<S: BlobStore> ImageCollection<S> {
    /// An empty collection over `store`. Nothing is read yet.
    pub fn new(store: S) -> Self {
        ImageCollection {
            store,
            records: Vec::new(),
            ids: IdGenerator::new(),
        }
    }

    /// Number of images
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at `position`, if any
    pub fn get(&self, position: usize) -> Option<&ImageRecord> {
        self.records.get(position)
    }

    /// All records in display order
    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    /// Persist `bytes` as a new image and append it.
    ///
    /// The bytes must decode in full, the same check `load_all` applies,
    /// so nothing is stored that a later load would skip. If the blob
    /// cannot be written the collection is left unchanged.
    pub fn append(&mut self, bytes: Vec<u8>) -> Result<ImageRecord> {
        let (width, height) =
            imaging::decode("new image", &bytes).map(|img| (img.width(), img.height()))?;
        let id = self.ids.next_id();

        if let Err(source) = self.store.write(&id, &bytes) {
            log::error!("❌ Failed to write image {}: {}", id, source);
            return Err(LibraryError::StorageWrite { id, source });
        }

        let record = ImageRecord {
            id,
            bytes: Arc::from(bytes),
            width,
            height,
        };
        self.records.push(record.clone());

        log::info!(
            "➕ Added image {} ({}x{}) at position {}",
            record.id,
            width,
            height,
            self.records.len() - 1
        );
        Ok(record)
    }

    /// Delete the blob at `index`, then drop its record.
    ///
    /// On a storage failure the removal is aborted and the record stays.
    /// A blob already missing from the store counts as deleted.
    pub fn remove_at(&mut self, index: usize) -> Result<ImageRecord> {
        let Some(record) = self.records.get(index) else {
            return Err(LibraryError::PositionOutOfRange {
                position: index,
                len: self.records.len(),
            });
        };

        match self.store.delete(&record.id) {
            Ok(true) => {}
            Ok(false) => {
                log::warn!("⚠️  Blob for image {} was already gone from the store", record.id);
            }
            Err(source) => {
                log::error!("❌ Failed to delete image {}: {}", record.id, source);
                return Err(LibraryError::StorageDelete {
                    id: record.id.clone(),
                    source,
                });
            }
        }

        let removed = self.records.remove(index);
        log::info!("🗑️  Removed image {} from position {}", removed.id, index);
        Ok(removed)
    }

    /// Replace the sequence with everything in the store.
    ///
    /// Blobs that fail to decode are skipped so one corrupt image cannot
    /// empty the library. If the store cannot be enumerated at all the
    /// current sequence is kept.
    pub fn load_all(&mut self) -> Result<LoadReport> {
        let blobs = self.store.enumerate().map_err(LibraryError::StorageRead)?;

        let mut report = LoadReport::default();
        let mut records = Vec::with_capacity(blobs.len());

        for (id, bytes) in blobs {
            self.ids.observe(&id);

            match imaging::decode(id.as_str(), &bytes) {
                Ok(img) => {
                    records.push(ImageRecord {
                        id,
                        width: img.width(),
                        height: img.height(),
                        bytes: Arc::from(bytes),
                    });
                }
                Err(e) => {
                    log::warn!("⚠️  Skipping unreadable image: {}", e);
                    report.skipped += 1;
                }
            }
        }

        report.loaded = records.len();
        self.records = records;

        log::info!(
            "📚 Loaded {} images ({} skipped)",
            report.loaded,
            report.skipped
        );
        Ok(report)
    }

    /// Replace the sequence with records that are already durable.
    ///
    /// Used for the warm-restart handoff; the store is not touched.
    pub fn restore_from(&mut self, records: impl IntoIterator<Item = ImageRecord>) {
        self.records = records.into_iter().collect();
        for record in &self.records {
            self.ids.observe(&record.id);
        }
        log::info!("♻️  Restored {} images from handoff", self.records.len());
    }

    /// Give up the collection, returning the store and the records
    pub fn into_parts(self) -> (S, Vec<ImageRecord>) {
        (self.store, self.records)
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[cfg(test)]
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::store::SqliteBlobStore;
    use crate::test_utils::{png_bytes, record_from, MemoryBlobStore};
    use chrono::TimeZone;

    fn ids<S: BlobStore>(collection: &ImageCollection<S>) -> Vec<ImageId> {
        collection.records().iter().map(|r| r.id.clone()).collect()
    }

    fn instant(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_790_000_000_000 + millis).unwrap()
    }

    #[test]
    fn test_ids_unique_within_same_millisecond() {
        let mut gen = IdGenerator::new();
        let a = gen.next_at(instant(0));
        let b = gen.next_at(instant(0));
        let c = gen.next_at(instant(0));

        assert!(a < b && b < c);
        assert!(b.as_str().starts_with(a.as_str()));
    }

    #[test]
    fn test_ids_increase_when_clock_goes_backwards() {
        let mut gen = IdGenerator::new();
        let a = gen.next_at(instant(500));
        let b = gen.next_at(instant(100));
        let c = gen.next_at(instant(900));

        assert!(a < b);
        assert!(b < c);
        assert_eq!(c.as_str().len(), 17);
    }

    #[test]
    fn test_exhausted_suffix_rolls_base_forward() {
        let mut gen = IdGenerator::new();
        let first = gen.next_at(instant(0));
        gen.last_suffix = ID_SUFFIX_MAX - 1;

        let last_suffixed = gen.next_at(instant(0));
        let rolled = gen.next_at(instant(0));
        let after = gen.next_at(instant(0));

        assert!(last_suffixed.as_str().ends_with("-999999"));
        assert!(first < last_suffixed);
        assert!(last_suffixed < rolled);
        assert!(rolled < after);
        assert_eq!(rolled.as_str().len(), first.as_str().len());
    }

    #[test]
    fn test_observe_seeds_generator() {
        let mut gen = IdGenerator::new();
        let future = IdGenerator::new().next_at(instant(10_000));
        gen.observe(&future);

        let next = gen.next_at(instant(0));
        assert!(next > future);
    }

    #[test]
    fn test_append_assigns_consecutive_positions() {
        let mut collection = ImageCollection::new(MemoryBlobStore::new());
        let a = collection.append(png_bytes(4, 4, [255, 0, 0])).unwrap();
        let b = collection.append(png_bytes(4, 4, [0, 255, 0])).unwrap();
        let c = collection.append(png_bytes(4, 4, [0, 0, 255])).unwrap();

        assert_eq!(ids(&collection), vec![a.id.clone(), b.id.clone(), c.id.clone()]);
        for (position, record) in collection.records().iter().enumerate() {
            assert_eq!(collection.get(position), Some(record));
        }
        assert_eq!(collection.store().writes, 3);
        assert!(a.id < b.id && b.id < c.id);
    }

    #[test]
    fn test_append_rejects_undecodable_bytes_before_writing() {
        let mut collection = ImageCollection::new(MemoryBlobStore::new());
        let result = collection.append(b"garbage".to_vec());

        assert!(matches!(result, Err(LibraryError::Decode { .. })));
        assert!(collection.is_empty());
        assert_eq!(collection.store().writes, 0);
    }

    #[test]
    fn test_append_rejects_truncated_image() {
        // Intact header, missing pixel data
        let bytes = png_bytes(64, 64, [40, 80, 120]);
        let truncated = bytes[..bytes.len() / 2].to_vec();

        let mut collection = ImageCollection::new(MemoryBlobStore::new());
        let result = collection.append(truncated);

        assert!(matches!(result, Err(LibraryError::Decode { .. })));
        assert!(collection.is_empty());
        assert_eq!(collection.store().writes, 0);
    }

    #[test]
    fn test_append_write_failure_leaves_collection_unchanged() {
        let mut collection = ImageCollection::new(MemoryBlobStore::new());
        collection.append(png_bytes(2, 2, [1, 1, 1])).unwrap();
        collection.store_mut().fail_writes = true;

        let result = collection.append(png_bytes(2, 2, [2, 2, 2]));

        assert!(matches!(result, Err(LibraryError::StorageWrite { .. })));
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.store().blobs.len(), 1);
    }

    #[test]
    fn test_remove_shifts_later_positions_down() {
        let mut collection = ImageCollection::new(MemoryBlobStore::new());
        let a = collection.append(png_bytes(2, 2, [1, 0, 0])).unwrap();
        let b = collection.append(png_bytes(2, 2, [0, 1, 0])).unwrap();
        let c = collection.append(png_bytes(2, 2, [0, 0, 1])).unwrap();

        let removed = collection.remove_at(1).unwrap();

        assert_eq!(removed.id, b.id);
        assert_eq!(ids(&collection), vec![a.id, c.id.clone()]);
        assert_eq!(collection.get(1).map(|r| &r.id), Some(&c.id));
        assert!(!collection.store().blobs.contains_key(&b.id));
    }

    #[test]
    fn test_remove_delete_failure_keeps_record() {
        let mut collection = ImageCollection::new(MemoryBlobStore::new());
        let a = collection.append(png_bytes(2, 2, [1, 0, 0])).unwrap();
        collection.store_mut().fail_deletes = true;

        let result = collection.remove_at(0);

        assert!(matches!(result, Err(LibraryError::StorageDelete { .. })));
        assert_eq!(ids(&collection), vec![a.id.clone()]);
        assert!(collection.store().blobs.contains_key(&a.id));
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut collection = ImageCollection::new(MemoryBlobStore::new());
        collection.append(png_bytes(2, 2, [1, 0, 0])).unwrap();

        let result = collection.remove_at(1);
        assert!(matches!(
            result,
            Err(LibraryError::PositionOutOfRange { position: 1, len: 1 })
        ));
    }

    #[test]
    fn test_remove_with_missing_blob_still_removes() {
        let mut collection = ImageCollection::new(MemoryBlobStore::new());
        let a = collection.append(png_bytes(2, 2, [1, 0, 0])).unwrap();
        collection.store_mut().blobs.remove(&a.id);

        collection.remove_at(0).unwrap();
        assert!(collection.is_empty());
    }

    #[test]
    fn test_positions_stay_dense_over_mixed_operations() {
        let mut collection = ImageCollection::new(MemoryBlobStore::new());
        let mut expected: Vec<ImageId> = Vec::new();

        for step in 0..12u8 {
            if step % 3 == 2 {
                let index = (step as usize * 7) % expected.len();
                collection.remove_at(index).unwrap();
                expected.remove(index);
            } else {
                let record = collection.append(png_bytes(3, 3, [step, 0, 0])).unwrap();
                expected.push(record.id);
            }

            assert_eq!(ids(&collection), expected);
            assert_eq!(collection.records().iter().enumerate().count(), collection.len());
        }
    }

    #[test]
    fn test_load_all_skips_corrupt_blob() {
        let mut store = MemoryBlobStore::new();
        store.blobs.insert(ImageId::from("1"), png_bytes(5, 3, [9, 9, 9]));
        store.blobs.insert(ImageId::from("2"), b"corrupt".to_vec());
        store.blobs.insert(ImageId::from("3"), png_bytes(2, 8, [7, 7, 7]));

        let mut collection = ImageCollection::new(store);
        let report = collection.load_all().unwrap();

        assert_eq!(report, LoadReport { loaded: 2, skipped: 1 });
        assert_eq!(ids(&collection), vec![ImageId::from("1"), ImageId::from("3")]);
        assert_eq!(collection.get(0).map(|r| (r.width, r.height)), Some((5, 3)));
    }

    #[test]
    fn test_load_all_enumerate_failure_keeps_sequence() {
        let mut collection = ImageCollection::new(MemoryBlobStore::new());
        collection.append(png_bytes(2, 2, [1, 0, 0])).unwrap();
        collection.store_mut().fail_enumerate = true;

        assert!(matches!(collection.load_all(), Err(LibraryError::StorageRead(_))));
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_restore_from_does_not_touch_store() {
        let mut collection = ImageCollection::new(MemoryBlobStore::new());
        let records = vec![
            record_from("20300101000000000", 2, 2, [1, 1, 1]),
            record_from("20300101000000001", 2, 2, [2, 2, 2]),
        ];

        collection.restore_from(records.clone());

        assert_eq!(collection.records(), records.as_slice());
        assert_eq!(collection.store().writes, 0);
        assert!(collection.store().blobs.is_empty());

        // New ids must still sort after the restored ones
        let added = collection.append(png_bytes(1, 1, [0, 0, 0])).unwrap();
        assert!(added.id > records[1].id);
    }

    #[test]
    fn test_round_trip_through_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("library.db");
        let colours = [[255u8, 0, 0], [0, 255, 0], [0, 0, 255]];

        {
            let store = SqliteBlobStore::open(&db_path).unwrap();
            let mut collection = ImageCollection::new(store);
            for rgb in colours {
                collection.append(png_bytes(6, 4, rgb)).unwrap();
            }
        }

        let store = SqliteBlobStore::open(&db_path).unwrap();
        let mut collection = ImageCollection::new(store);
        let report = collection.load_all().unwrap();

        assert_eq!(report.loaded, 3);
        for (position, record) in collection.records().iter().enumerate() {
            let pixels = imaging::decode("reloaded", &record.bytes).unwrap().to_rgba8();
            let rgb = colours[position];
            assert_eq!(pixels.dimensions(), (6, 4));
            assert!(pixels
                .pixels()
                .all(|p| p.0 == [rgb[0], rgb[1], rgb[2], 255]));
        }
    }
}
