// LMDB-backed catalogue: metadata and blobs live in separate databases
use anyhow::{anyhow, Context, Result};
use artbox_core::{ArtworkId, ArtworkRecord, OwnerId};
use chrono::{DateTime, Utc};
use heed::types::{Bytes, Str, U64};
use heed::byteorder::BE;
use heed::{Database, Env, EnvOpenOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::backend::{CatalogueBackend, StoredCatalogue};

const DB_ARTWORKS: &str = "artworks";
const DB_IMAGES: &str = "images";
const DB_MODELS: &str = "models";
const DB_META: &str = "meta";

const NEXT_ID_KEY: &str = "next_id";

/// Address space reserved for the environment; the file only grows as written
pub const MAP_SIZE: usize = 16 * 1024 * 1024 * 1024;

type IdDb = Database<U64<BE>, Bytes>;

/// Record fields without the image and model bytes
#[derive(Serialize, Deserialize)]
struct StoredMetadata {
    owner_id: Option<OwnerId>,
    name: String,
    description: Option<String>,
    price: Option<f64>,
    artwork_type: Option<String>,
    artist: Option<String>,
    year_created: Option<i32>,
    dimensions: Option<String>,
    medium: Option<String>,
    style: Option<String>,
    filename: String,
    created_at: DateTime<Utc>,
}

impl StoredMetadata {
    fn from_record(r: &ArtworkRecord) -> Self {
        Self {
            owner_id: r.owner_id,
            name: r.name.clone(),
            description: r.description.clone(),
            price: r.price,
            artwork_type: r.artwork_type.clone(),
            artist: r.artist.clone(),
            year_created: r.year_created,
            dimensions: r.dimensions.clone(),
            medium: r.medium.clone(),
            style: r.style.clone(),
            filename: r.filename.clone(),
            created_at: r.created_at,
        }
    }

    fn into_record(self, id: ArtworkId, image_data: Vec<u8>, model_data: Option<Vec<u8>>) -> ArtworkRecord {
        ArtworkRecord {
            id,
            owner_id: self.owner_id,
            name: self.name,
            description: self.description,
            price: self.price,
            artwork_type: self.artwork_type,
            artist: self.artist,
            year_created: self.year_created,
            dimensions: self.dimensions,
            medium: self.medium,
            style: self.style,
            filename: self.filename,
            image_data,
            model_data,
            created_at: self.created_at,
        }
    }
}

pub struct LmdbStorage {
    env: Arc<Env>,
    artworks_db: IdDb,
    images_db: IdDb,
    models_db: IdDb,
    meta_db: Database<Str, Bytes>,
}

impl LmdbStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        std::fs::create_dir_all(&path)?;

        let env = Arc::new(unsafe {
            EnvOpenOptions::new()
                .map_size(MAP_SIZE)
                .max_dbs(4)
                .open(path)?
        });

        let mut wtxn = env.write_txn()?;
        let artworks_db = env.create_database(&mut wtxn, Some(DB_ARTWORKS))?;
        let images_db = env.create_database(&mut wtxn, Some(DB_IMAGES))?;
        let models_db = env.create_database(&mut wtxn, Some(DB_MODELS))?;
        let meta_db = env.create_database(&mut wtxn, Some(DB_META))?;
        wtxn.commit()?;

        Ok(Self {
            env,
            artworks_db,
            images_db,
            models_db,
            meta_db,
        })
    }

    pub fn load_all(&self) -> Result<StoredCatalogue> {
        let rtxn = self.env.read_txn()?;
        let mut records = Vec::new();

        for result in self.artworks_db.iter(&rtxn)? {
            let (id, data) = result?;
            let metadata: StoredMetadata = bincode::deserialize(data)
                .with_context(|| format!("decoding artwork {}", id))?;
            let image_data = self
                .images_db
                .get(&rtxn, &id)?
                .ok_or_else(|| anyhow!("artwork {} has no image", id))?
                .to_vec();
            let model_data = self.models_db.get(&rtxn, &id)?.map(<[u8]>::to_vec);
            records.push(metadata.into_record(ArtworkId(id), image_data, model_data));
        }

        let next_id = match self.meta_db.get(&rtxn, NEXT_ID_KEY)? {
            Some(bytes) => {
                let bytes: [u8; 8] = bytes
                    .try_into()
                    .map_err(|_| anyhow!("next_id has {} bytes", bytes.len()))?;
                Some(u64::from_be_bytes(bytes))
            }
            None => None,
        };

        Ok(StoredCatalogue { records, next_id })
    }

    pub fn save_artwork(&self, record: &ArtworkRecord, next_id: u64) -> Result<()> {
        let id = record.id.0;
        let metadata = bincode::serialize(&StoredMetadata::from_record(record))?;

        let mut wtxn = self.env.write_txn()?;
        self.artworks_db.put(&mut wtxn, &id, &metadata)?;
        self.images_db.put(&mut wtxn, &id, &record.image_data)?;
        match &record.model_data {
            Some(model) => self.models_db.put(&mut wtxn, &id, model)?,
            None => {
                self.models_db.delete(&mut wtxn, &id)?;
            }
        }
        self.meta_db.put(&mut wtxn, NEXT_ID_KEY, &next_id.to_be_bytes())?;
        wtxn.commit()?;
        Ok(())
    }

    pub fn save_metadata(&self, record: &ArtworkRecord) -> Result<()> {
        let id = record.id.0;
        let metadata = bincode::serialize(&StoredMetadata::from_record(record))?;

        let mut wtxn = self.env.write_txn()?;
        self.artworks_db.put(&mut wtxn, &id, &metadata)?;
        wtxn.commit()?;
        Ok(())
    }

    pub fn delete_artwork(&self, id: ArtworkId) -> Result<bool> {
        let mut wtxn = self.env.write_txn()?;
        let existed = self.artworks_db.delete(&mut wtxn, &id.0)?;
        self.images_db.delete(&mut wtxn, &id.0)?;
        self.models_db.delete(&mut wtxn, &id.0)?;
        wtxn.commit()?;
        Ok(existed)
    }

    pub fn get_image(&self, id: ArtworkId) -> Result<Option<Vec<u8>>> {
        let rtxn = self.env.read_txn()?;
        match self.images_db.get(&rtxn, &id.0)? {
            Some(data) => Ok(Some(data.to_vec())),
            None => Ok(None),
        }
    }

    pub fn flush(&self) -> Result<()> {
        self.env.force_sync()?;
        Ok(())
    }
}

fn storage_error(e: anyhow::Error) -> artbox_core::Error {
    artbox_core::Error::Storage(format!("{:#}", e))
}

impl CatalogueBackend for LmdbStorage {
    fn load(&self) -> artbox_core::Result<StoredCatalogue> {
        self.load_all().map_err(storage_error)
    }

    fn insert(&self, record: &ArtworkRecord, next_id: u64) -> artbox_core::Result<()> {
        self.save_artwork(record, next_id).map_err(storage_error)
    }

    fn update(&self, record: &ArtworkRecord) -> artbox_core::Result<()> {
        self.save_metadata(record).map_err(storage_error)
    }

    fn remove(&self, id: ArtworkId) -> artbox_core::Result<bool> {
        self.delete_artwork(id).map_err(storage_error)
    }

    fn sync(&self) -> artbox_core::Result<()> {
        self.flush().map_err(storage_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artbox_core::NewArtwork;

    fn record(id: u64, name: &str) -> ArtworkRecord {
        let mut new = NewArtwork::new(name, format!("{}.png", name), vec![7; 64]);
        new.owner_id = Some(OwnerId(5));
        new.price = Some(80.0);
        ArtworkRecord::from_new(ArtworkId(id), new)
    }

    #[test]
    fn test_fresh_storage_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LmdbStorage::new(dir.path()).unwrap();
        let loaded = storage.load_all().unwrap();
        assert!(loaded.records.is_empty());
        assert_eq!(loaded.next_id, None);
    }

    fn record_at(loaded: &StoredCatalogue, id: u64) -> ArtworkRecord {
        loaded
            .records
            .iter()
            .find(|r| r.id == ArtworkId(id))
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LmdbStorage::new(dir.path()).unwrap();

        let mut first = record(1, "first");
        first.model_data = Some(vec![1, 2, 3]);
        let second = record(2, "second");
        storage.save_artwork(&first, 2).unwrap();
        storage.save_artwork(&second, 3).unwrap();

        let loaded = storage.load_all().unwrap();
        assert_eq!(loaded.next_id, Some(3));
        assert_eq!(loaded.records, vec![first, second]);
    }

    #[test]
    fn test_metadata_update_leaves_blobs_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LmdbStorage::new(dir.path()).unwrap();
        let original = record(1, "before");
        storage.save_artwork(&original, 2).unwrap();

        // Blobs in the argument are ignored by a metadata write
        let mut edited = original.clone();
        edited.name = "after".to_string();
        edited.image_data.clear();
        storage.save_metadata(&edited).unwrap();

        let loaded = record_at(&storage.load_all().unwrap(), 1);
        assert_eq!(loaded.name, "after");
        assert_eq!(loaded.image_data, original.image_data);
        assert_eq!(storage.get_image(ArtworkId(1)).unwrap(), Some(vec![7; 64]));
    }

    #[test]
    fn test_delete_removes_blobs() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LmdbStorage::new(dir.path()).unwrap();
        storage.save_artwork(&record(1, "gone"), 2).unwrap();

        assert!(storage.delete_artwork(ArtworkId(1)).unwrap());
        assert!(!storage.delete_artwork(ArtworkId(1)).unwrap());
        assert_eq!(storage.get_image(ArtworkId(1)).unwrap(), None);

        let loaded = storage.load_all().unwrap();
        assert!(loaded.records.is_empty());
        assert_eq!(loaded.next_id, Some(2));
    }

    #[test]
    fn test_corrupt_metadata_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LmdbStorage::new(dir.path()).unwrap();
        storage.save_artwork(&record(1, "ok"), 2).unwrap();

        let mut wtxn = storage.env.write_txn().unwrap();
        storage.artworks_db.put(&mut wtxn, &1, b"garbage").unwrap();
        wtxn.commit().unwrap();

        let err = CatalogueBackend::load(&storage).unwrap_err();
        assert!(matches!(err, artbox_core::Error::Storage(_)));
        assert!(err.to_string().contains("decoding artwork 1"));
    }

    #[test]
    fn test_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let storage = LmdbStorage::new(dir.path()).unwrap();
            storage.save_artwork(&record(4, "kept"), 9).unwrap();
            storage.flush().unwrap();
        }

        let storage = LmdbStorage::new(dir.path()).unwrap();
        let loaded = storage.load_all().unwrap();
        assert_eq!(loaded.next_id, Some(9));
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.records[0].id, ArtworkId(4));
        assert_eq!(loaded.records[0].owner_id, Some(OwnerId(5)));
    }
}
