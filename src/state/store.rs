use rusqlite::{params, Connection, ErrorCode};
use std::path::{Path, PathBuf};

use super::data::ImageId;
use crate::error::StoreError;

/// Durable storage of encoded image bytes keyed by identity.
///
/// Only the image collection talks to a store. Enumeration must return
/// blobs ordered by identity, which is creation order for generated ids.
pub trait BlobStore {
    /// Durably write a new blob. Writing an identity that already exists fails.
    fn write(&mut self, id: &ImageId, bytes: &[u8]) -> Result<(), StoreError>;

    /// Delete a blob. Returns `Ok(false)` if there was nothing to delete.
    fn delete(&mut self, id: &ImageId) -> Result<bool, StoreError>;

    /// All blobs in identity order
    fn enumerate(&self) -> Result<Vec<(ImageId, Vec<u8>)>, StoreError>;
}

/// The SQLite blob store holding the image library.
pub struct SqliteBlobStore {
    conn: Connection,
    db_path: PathBuf,
}

impl SqliteBlobStore {
    /// Open (or create) the library database at `db_path`.
    ///
    /// The parent directory is created when missing.
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;

        log::info!("📁 Image library opened at: {}", db_path.display());

        let mut store = SqliteBlobStore {
            conn,
            db_path: db_path.to_path_buf(),
        };
        store.init_schema()?;

        Ok(store)
    }

    /// Open a throwaway store that lives only in memory
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let mut store = SqliteBlobStore {
            conn,
            db_path: PathBuf::from(":memory:"),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize the database schema.
    fn init_schema(&mut self) -> Result<(), StoreError> {
        // One row per image; the id doubles as the enumeration order
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS blobs (
                id              TEXT PRIMARY KEY NOT NULL,
                bytes           BLOB NOT NULL,
                written_at      INTEGER NOT NULL
            )",
            [],
        )?;

        log::debug!("Library schema initialized");

        Ok(())
    }

    /// Get the path to the database file
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    /// Number of blobs currently stored
    pub fn blob_count(&self) -> Result<i64, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM blobs", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl BlobStore for SqliteBlobStore {
    fn write(&mut self, id: &ImageId, bytes: &[u8]) -> Result<(), StoreError> {
        let result = self.conn.execute(
            "INSERT INTO blobs (id, bytes, written_at) VALUES (?1, ?2, ?3)",
            params![id.as_str(), bytes, chrono::Utc::now().timestamp()],
        );

        match result {
            Ok(_) => Ok(()),
            // UNIQUE constraint on id: never overwrite an existing blob
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::Rejected(format!("duplicate id {}", id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&mut self, id: &ImageId) -> Result<bool, StoreError> {
        let removed = self
            .conn
            .execute("DELETE FROM blobs WHERE id = ?1", params![id.as_str()])?;
        Ok(removed > 0)
    }

    fn enumerate(&self) -> Result<Vec<(ImageId, Vec<u8>)>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, bytes FROM blobs ORDER BY id ASC")?;

        let blob_iter = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            let bytes: Vec<u8> = row.get(1)?;
            Ok((ImageId::from(id), bytes))
        })?;

        let mut blobs = Vec::new();
        for blob in blob_iter {
            blobs.push(blob?);
        }

        Ok(blobs)
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for SqliteBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBlobStore")
            .field("db_path", &self.db_path)
            .finish()
    }
}
