use artbox_core::{ArtworkId, ArtworkRecord, Result};

/// Everything a backend holds when the store opens
#[derive(Debug, Default)]
pub struct StoredCatalogue {
    pub records: Vec<ArtworkRecord>,
    /// Last persisted id counter; `None` for a fresh backend
    pub next_id: Option<u64>,
}

/// Durable home of the catalogue, written one record at a time
///
/// The store calls these while holding its write lock and only changes
/// memory after the call succeeds, so a failed write leaves both sides as
/// they were.
pub trait CatalogueBackend: Send + Sync {
    fn load(&self) -> Result<StoredCatalogue>;

    /// Write a new record, its blobs and the id counter in one transaction
    fn insert(&self, record: &ArtworkRecord, next_id: u64) -> Result<()>;

    /// Overwrite a record's metadata; image and model bytes are not rewritten
    fn update(&self, record: &ArtworkRecord) -> Result<()>;

    /// Remove a record and its blobs; returns whether it existed
    fn remove(&self, id: ArtworkId) -> Result<bool>;

    /// Flush to disk
    fn sync(&self) -> Result<()>;
}
