pub mod backend;
pub mod lmdb_storage;
pub mod manager;

pub use backend::{CatalogueBackend, StoredCatalogue};
pub use lmdb_storage::LmdbStorage;
pub use manager::{ArtworkStore, CATALOGUE_DIR};
