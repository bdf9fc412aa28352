//! # artbox
//!
//! Backend for an artwork marketplace with AR previews.
//!
//! Every uploaded image becomes a thin textured box (a "canvas") encoded as
//! a single GLB file that phone AR viewers can place on a wall. The catalogue
//! also recommends similar pieces from artist, style, medium, type,
//! description and colour signals.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! artbox --http-port 5000 --data-dir ./data
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use artbox::prelude::*;
//!
//! let image_bytes = std::fs::read("sunset.png").unwrap();
//! let glb = MeshBuilder::default().build(&image_bytes).unwrap();
//!
//! let store = ArtworkStore::in_memory();
//! let mut new = NewArtwork::new("Sunset", "sunset.png", image_bytes);
//! new.model_data = Some(glb);
//! let record = store.insert(new).unwrap();
//!
//! let recs = SimilarityRanker::default().recommend(&store, &record, 6);
//! ```
//!
//! ## Crate Structure
//!
//! - `artbox-core` - Artwork records, edits and errors
//! - `artbox-mesh` - Image enhancement and GLB canvas generation
//! - `artbox-similarity` - Recommendation scoring
//! - `artbox-storage` - Catalogue with per-record LMDB persistence
//! - `artbox-api` - actix-web REST API

// Re-export core types
pub use artbox_core::{
    ArtworkId, ArtworkRecord, ArtworkSummary, ArtworkUpdate, NewArtwork, OwnerId,
    Error, Result,
};

pub use artbox_mesh::{MeshBuilder, MeshConfig, MeshError};

pub use artbox_similarity::{CandidateSource, Recommendation, ScoreWeights, SimilarityRanker};

// Re-export storage
pub use artbox_storage::ArtworkStore;

// Re-export API
pub use artbox_api::{ApiConfig, AppState, RestApi};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ArtworkId, ArtworkRecord, ArtworkSummary, ArtworkUpdate, NewArtwork, OwnerId,
        Error, Result,
        MeshBuilder, MeshConfig,
        CandidateSource, Recommendation, SimilarityRanker,
        ArtworkStore,
        RestApi,
    };
}
