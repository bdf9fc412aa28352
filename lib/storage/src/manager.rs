use artbox_core::{ArtworkId, ArtworkRecord, ArtworkUpdate, Error, NewArtwork, OwnerId, Result};
use artbox_similarity::CandidateSource;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::backend::CatalogueBackend;
use crate::lmdb_storage::LmdbStorage;

/// Subdirectory of the data directory holding the LMDB environment
pub const CATALOGUE_DIR: &str = "catalogue";

struct StoreState {
    artworks: BTreeMap<ArtworkId, Arc<ArtworkRecord>>,
    next_id: u64,
}

/// Artwork catalogue
///
/// Records are immutable once shared; edits replace the `Arc` under the
/// write lock. A persistent store writes the changed record to its backend
/// inside the same critical section and only touches memory once that write
/// has succeeded.
pub struct ArtworkStore {
    state: RwLock<StoreState>,
    data_dir: Option<PathBuf>,
    backend: Option<Arc<dyn CatalogueBackend>>,
}

impl ArtworkStore {
    /// Open a persistent store rooted at `data_dir`, restoring its catalogue
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        let path = data_dir.join(CATALOGUE_DIR);
        let storage = LmdbStorage::new(&path).map_err(|e| Error::Storage(format!("{:#}", e)))?;

        let mut store = Self::with_backend(Arc::new(storage))?;
        store.data_dir = Some(data_dir);
        info!(
            artworks = store.count(),
            path = %path.display(),
            "Opened artwork catalogue"
        );
        Ok(store)
    }

    /// A store persisted through `backend`, loading what it already holds
    pub fn with_backend(backend: Arc<dyn CatalogueBackend>) -> Result<Self> {
        let stored = backend.load()?;

        let artworks: BTreeMap<_, _> = stored
            .records
            .into_iter()
            .map(|record| (record.id, Arc::new(record)))
            .collect();
        let max_id = artworks.keys().next_back().map(|id| id.0).unwrap_or(0);
        let next_id = stored.next_id.unwrap_or(1).max(max_id + 1);

        Ok(Self {
            state: RwLock::new(StoreState { artworks, next_id }),
            data_dir: None,
            backend: Some(backend),
        })
    }

    /// A store that never touches disk
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(StoreState {
                artworks: BTreeMap::new(),
                next_id: 1,
            }),
            data_dir: None,
            backend: None,
        }
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn is_persistent(&self) -> bool {
        self.backend.is_some()
    }

    /// Validate and store a new artwork, assigning the next id
    ///
    /// A failed write consumes no id.
    pub fn insert(&self, new: NewArtwork) -> Result<Arc<ArtworkRecord>> {
        new.validate()?;

        let mut state = self.state.write();
        let id = ArtworkId(state.next_id);
        let record = ArtworkRecord::from_new(id, new);

        if let Some(backend) = &self.backend {
            backend.insert(&record, id.0 + 1).map_err(|e| {
                warn!(%id, "Insert not stored: {}", e);
                e
            })?;
        }

        let record = Arc::new(record);
        state.next_id = id.0 + 1;
        state.artworks.insert(id, Arc::clone(&record));
        drop(state);

        debug!(%id, name = %record.name, "Stored artwork");
        Ok(record)
    }

    pub fn get(&self, id: ArtworkId) -> Option<Arc<ArtworkRecord>> {
        self.state.read().artworks.get(&id).cloned()
    }

    pub fn contains(&self, id: ArtworkId) -> bool {
        self.state.read().artworks.contains_key(&id)
    }

    pub fn count(&self) -> usize {
        self.state.read().artworks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// All artworks, newest first
    pub fn list(&self) -> Vec<Arc<ArtworkRecord>> {
        let mut records: Vec<_> = self.state.read().artworks.values().cloned().collect();
        sort_newest_first(&mut records);
        records
    }

    /// Artworks belonging to `owner`, newest first
    pub fn list_by_owner(&self, owner: OwnerId) -> Vec<Arc<ArtworkRecord>> {
        let mut records: Vec<_> = self
            .state
            .read()
            .artworks
            .values()
            .filter(|r| r.owner_id == Some(owner))
            .cloned()
            .collect();
        sort_newest_first(&mut records);
        records
    }

    /// Apply a metadata edit and return the updated record
    ///
    /// Only the record's metadata is written; image and model bytes stay put.
    pub fn update(&self, id: ArtworkId, update: &ArtworkUpdate) -> Result<Arc<ArtworkRecord>> {
        let mut state = self.state.write();
        let current = state
            .artworks
            .get(&id)
            .ok_or(Error::ArtworkNotFound(id))?;

        let mut record = ArtworkRecord::clone(current);
        update.apply(&mut record)?;

        if let Some(backend) = &self.backend {
            backend.update(&record).map_err(|e| {
                warn!(%id, "Update not stored: {}", e);
                e
            })?;
        }

        let updated = Arc::new(record);
        state.artworks.insert(id, Arc::clone(&updated));
        drop(state);

        debug!(%id, "Updated artwork");
        Ok(updated)
    }

    /// Remove an artwork; returns `None` if it did not exist
    pub fn delete(&self, id: ArtworkId) -> Result<Option<Arc<ArtworkRecord>>> {
        let mut state = self.state.write();
        if !state.artworks.contains_key(&id) {
            return Ok(None);
        }

        if let Some(backend) = &self.backend {
            backend.remove(id).map_err(|e| {
                warn!(%id, "Delete not stored: {}", e);
                e
            })?;
        }

        let removed = state.artworks.remove(&id);
        drop(state);

        debug!(%id, "Deleted artwork");
        Ok(removed)
    }

    /// Flush the backend to disk; a no-op for in-memory stores
    pub fn save(&self) -> Result<()> {
        match &self.backend {
            Some(backend) => backend.sync(),
            None => Ok(()),
        }
    }
}

impl CandidateSource for ArtworkStore {
    fn fetch_candidates(&self, exclude: ArtworkId) -> Vec<Arc<ArtworkRecord>> {
        self.state
            .read()
            .artworks
            .values()
            .filter(|r| r.id != exclude)
            .cloned()
            .collect()
    }
}

fn sort_newest_first(records: &mut [Arc<ArtworkRecord>]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::StoredCatalogue;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    enum Write {
        Insert { id: ArtworkId, next_id: u64 },
        Update(ArtworkId),
        Remove(ArtworkId),
    }

    /// Keeps records in memory, logs every write and fails on demand
    #[derive(Default)]
    struct RecordingBackend {
        records: Mutex<BTreeMap<ArtworkId, ArtworkRecord>>,
        next_id: Mutex<Option<u64>>,
        writes: Mutex<Vec<Write>>,
        failing: AtomicBool,
        /// When non-zero, every n-th write fails
        fail_every: AtomicUsize,
        calls: AtomicUsize,
    }

    impl RecordingBackend {
        fn check(&self) -> Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let every = self.fail_every.load(Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) || (every > 0 && call % every == 0) {
                return Err(Error::Storage("disk full".to_string()));
            }
            Ok(())
        }

        fn ids(&self) -> Vec<ArtworkId> {
            self.records.lock().keys().copied().collect()
        }
    }

    impl CatalogueBackend for RecordingBackend {
        fn load(&self) -> Result<StoredCatalogue> {
            Ok(StoredCatalogue {
                records: self.records.lock().values().cloned().collect(),
                next_id: *self.next_id.lock(),
            })
        }

        fn insert(&self, record: &ArtworkRecord, next_id: u64) -> Result<()> {
            self.check()?;
            self.records.lock().insert(record.id, record.clone());
            *self.next_id.lock() = Some(next_id);
            self.writes.lock().push(Write::Insert { id: record.id, next_id });
            Ok(())
        }

        fn update(&self, record: &ArtworkRecord) -> Result<()> {
            self.check()?;
            let mut records = self.records.lock();
            let stored = records
                .get_mut(&record.id)
                .ok_or(Error::ArtworkNotFound(record.id))?;
            let blobs = (std::mem::take(&mut stored.image_data), stored.model_data.take());
            *stored = ArtworkRecord {
                image_data: blobs.0,
                model_data: blobs.1,
                ..record.clone()
            };
            self.writes.lock().push(Write::Update(record.id));
            Ok(())
        }

        fn remove(&self, id: ArtworkId) -> Result<bool> {
            self.check()?;
            let existed = self.records.lock().remove(&id).is_some();
            self.writes.lock().push(Write::Remove(id));
            Ok(existed)
        }

        fn sync(&self) -> Result<()> {
            self.check()
        }
    }

    fn recorded_store() -> (ArtworkStore, Arc<RecordingBackend>) {
        let backend = Arc::new(RecordingBackend::default());
        let store = ArtworkStore::with_backend(backend.clone()).unwrap();
        (store, backend)
    }

    fn artwork(name: &str) -> NewArtwork {
        NewArtwork::new(name, format!("{}.png", name), vec![0x89, b'P', b'N', b'G'])
    }

    fn owned(name: &str, owner: u64) -> NewArtwork {
        NewArtwork {
            owner_id: Some(OwnerId(owner)),
            ..artwork(name)
        }
    }

    #[test]
    fn test_insert_assigns_increasing_ids() {
        let store = ArtworkStore::in_memory();
        let a = store.insert(artwork("a")).unwrap();
        let b = store.insert(artwork("b")).unwrap();

        assert_eq!(a.id, ArtworkId(1));
        assert_eq!(b.id, ArtworkId(2));
        assert_eq!(store.count(), 2);
        assert!(store.contains(a.id));
        assert_eq!(store.get(b.id).unwrap().name, "b");
    }

    #[test]
    fn test_insert_rejects_invalid() {
        let store = ArtworkStore::in_memory();
        assert!(matches!(store.insert(artwork("   ")), Err(Error::InvalidInput(_))));

        let mut no_image = artwork("x");
        no_image.image_data.clear();
        assert!(matches!(store.insert(no_image), Err(Error::InvalidInput(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_list_newest_first() {
        let store = ArtworkStore::in_memory();
        for name in ["first", "second", "third"] {
            store.insert(artwork(name)).unwrap();
        }

        let names: Vec<_> = store.list().iter().map(|r| r.name.clone()).collect();
        assert_eq!(names, vec!["third", "second", "first"]);
    }

    #[test]
    fn test_list_by_owner() {
        let store = ArtworkStore::in_memory();
        store.insert(owned("mine-1", 7)).unwrap();
        store.insert(owned("theirs", 8)).unwrap();
        store.insert(artwork("nobody")).unwrap();
        store.insert(owned("mine-2", 7)).unwrap();

        let names: Vec<_> = store
            .list_by_owner(OwnerId(7))
            .iter()
            .map(|r| r.name.clone())
            .collect();
        assert_eq!(names, vec!["mine-2", "mine-1"]);
        assert!(store.list_by_owner(OwnerId(99)).is_empty());
    }

    #[test]
    fn test_update_replaces_record() {
        let store = ArtworkStore::in_memory();
        let original = store.insert(artwork("before")).unwrap();

        let update = ArtworkUpdate::from_json(&json!({"name": "after", "style": "Cubism"})).unwrap();
        let updated = store.update(original.id, &update).unwrap();

        assert_eq!(updated.name, "after");
        assert_eq!(updated.style.as_deref(), Some("Cubism"));
        // Readers holding the old Arc keep their view
        assert_eq!(original.name, "before");
        assert_eq!(store.get(original.id).unwrap().name, "after");
    }

    #[test]
    fn test_update_errors() {
        let store = ArtworkStore::in_memory();
        let update = ArtworkUpdate::from_json(&json!({"name": "x"})).unwrap();
        assert!(matches!(
            store.update(ArtworkId(42), &update),
            Err(Error::ArtworkNotFound(ArtworkId(42)))
        ));

        let record = store.insert(artwork("keep")).unwrap();
        let blank = ArtworkUpdate::from_json(&json!({"name": ""})).unwrap();
        assert!(store.update(record.id, &blank).is_err());
        assert_eq!(store.get(record.id).unwrap().name, "keep");
    }

    #[test]
    fn test_delete() {
        let store = ArtworkStore::in_memory();
        let record = store.insert(artwork("gone")).unwrap();

        let removed = store.delete(record.id).unwrap().unwrap();
        assert_eq!(removed.id, record.id);
        assert!(!store.contains(record.id));
        assert!(store.delete(record.id).unwrap().is_none());
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let store = ArtworkStore::in_memory();
        let a = store.insert(artwork("a")).unwrap();
        store.delete(a.id).unwrap();
        let b = store.insert(artwork("b")).unwrap();
        assert_eq!(b.id, ArtworkId(2));
    }

    #[test]
    fn test_candidates_exclude_target() {
        let store = ArtworkStore::in_memory();
        for name in ["a", "b", "c"] {
            store.insert(artwork(name)).unwrap();
        }

        let ids: Vec<_> = store
            .fetch_candidates(ArtworkId(2))
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![ArtworkId(1), ArtworkId(3)]);
    }

    #[test]
    fn test_in_memory_writes_nothing() {
        let store = ArtworkStore::in_memory();
        assert!(!store.is_persistent());
        assert!(store.data_dir().is_none());
        store.insert(artwork("a")).unwrap();
        store.save().unwrap();
    }

    #[test]
    fn test_writes_one_record_per_mutation() {
        let (store, backend) = recorded_store();
        let mut big = artwork("big");
        big.image_data = vec![0; 1 << 20];
        big.model_data = Some(vec![1; 1 << 20]);
        let record = store.insert(big).unwrap();
        store.insert(artwork("small")).unwrap();

        let update = ArtworkUpdate::from_json(&json!({"price": 99})).unwrap();
        store.update(record.id, &update).unwrap();
        store.delete(ArtworkId(2)).unwrap();
        // Nothing to write for a missing id
        store.delete(ArtworkId(9)).unwrap();

        assert_eq!(
            *backend.writes.lock(),
            vec![
                Write::Insert { id: ArtworkId(1), next_id: 2 },
                Write::Insert { id: ArtworkId(2), next_id: 3 },
                Write::Update(ArtworkId(1)),
                Write::Remove(ArtworkId(2)),
            ]
        );
        let stored = backend.records.lock().get(&record.id).cloned().unwrap();
        assert_eq!(stored.price, Some(99.0));
        assert_eq!(stored.image_data.len(), 1 << 20);
    }

    #[test]
    fn test_failed_write_leaves_memory_unchanged() {
        let (store, backend) = recorded_store();
        let kept = store.insert(artwork("kept")).unwrap();
        backend.failing.store(true, Ordering::SeqCst);

        assert!(matches!(store.insert(artwork("lost")), Err(Error::Storage(_))));
        assert_eq!(store.count(), 1);

        let update = ArtworkUpdate::from_json(&json!({"name": "renamed"})).unwrap();
        assert!(matches!(store.update(kept.id, &update), Err(Error::Storage(_))));
        assert_eq!(store.get(kept.id).unwrap().name, "kept");

        assert!(matches!(store.delete(kept.id), Err(Error::Storage(_))));
        assert!(store.contains(kept.id));
        assert!(store.save().is_err());

        // The failed insert did not burn an id
        backend.failing.store(false, Ordering::SeqCst);
        assert_eq!(store.insert(artwork("next")).unwrap().id, ArtworkId(2));
        assert_eq!(backend.ids(), vec![ArtworkId(1), ArtworkId(2)]);
    }

    #[test]
    fn test_concurrent_mutations_match_backend() {
        let (store, backend) = recorded_store();
        for i in 0..8 {
            store.insert(artwork(&format!("seed-{}", i))).unwrap();
        }
        backend.fail_every.store(3, Ordering::SeqCst);

        std::thread::scope(|scope| {
            for t in 0..4u64 {
                let store = &store;
                scope.spawn(move || {
                    for i in 0..50u64 {
                        let id = ArtworkId(1 + (t + i) % 8);
                        let update =
                            ArtworkUpdate::from_json(&json!({"name": format!("t{}-{}", t, i)}))
                                .unwrap();
                        let _ = store.update(id, &update);
                        if i % 7 == 0 {
                            let _ = store.delete(id);
                        }
                        if i % 5 == 0 {
                            let _ = store.insert(artwork(&format!("new-{}-{}", t, i)));
                        }
                    }
                });
            }
        });

        let mut in_memory: Vec<(ArtworkId, String)> =
            store.list().iter().map(|r| (r.id, r.name.clone())).collect();
        in_memory.sort();
        let stored: Vec<(ArtworkId, String)> = backend
            .records
            .lock()
            .values()
            .map(|r| (r.id, r.name.clone()))
            .collect();
        assert_eq!(in_memory, stored);

        // Reopening from the backend yields the same catalogue and counter
        backend.fail_every.store(0, Ordering::SeqCst);
        let next = store.insert(artwork("after")).unwrap().id;
        let reopened = ArtworkStore::with_backend(backend.clone()).unwrap();
        assert_eq!(reopened.count(), store.count());
        assert_eq!(reopened.insert(artwork("again")).unwrap().id, ArtworkId(next.0 + 1));
    }

    #[test]
    fn test_persistent_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = ArtworkStore::new(dir.path()).unwrap();
            assert!(store.is_persistent());
            assert_eq!(store.data_dir(), Some(dir.path()));
            let mut first = owned("kept", 3);
            first.model_data = Some(vec![1, 2, 3]);
            store.insert(first).unwrap();
            let dropped = store.insert(artwork("dropped")).unwrap();
            store.delete(dropped.id).unwrap();
            let update = ArtworkUpdate::from_json(&json!({"price": "12.5"})).unwrap();
            store.update(ArtworkId(1), &update).unwrap();
            store.save().unwrap();
        }
        assert!(dir.path().join(CATALOGUE_DIR).join("data.mdb").exists());

        let store = ArtworkStore::new(dir.path()).unwrap();
        assert_eq!(store.count(), 1);
        let kept = store.get(ArtworkId(1)).unwrap();
        assert_eq!(kept.name, "kept");
        assert_eq!(kept.owner_id, Some(OwnerId(3)));
        assert_eq!(kept.price, Some(12.5));
        assert_eq!(kept.model_data.as_deref(), Some(&[1u8, 2, 3][..]));

        // Deleted ids stay retired across restarts
        let next = store.insert(artwork("next")).unwrap();
        assert_eq!(next.id, ArtworkId(3));
    }

    #[test]
    fn test_corrupt_catalogue_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CATALOGUE_DIR);
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join("data.mdb"), b"garbage").unwrap();
        assert!(matches!(ArtworkStore::new(dir.path()), Err(Error::Storage(_))));
    }
}
