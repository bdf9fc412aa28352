//! # artbox Core
//!
//! Core types shared by every artbox crate.
//!
//! - [`ArtworkRecord`] - an uploaded artwork: metadata, source image and generated model
//! - [`NewArtwork`] - the payload used to create a record
//! - [`ArtworkUpdate`] - a partial metadata edit
//! - [`ArtworkSummary`] - the JSON view of a record without binary payloads
//!
//! ## Example
//!
//! ```rust
//! use artbox_core::{ArtworkId, ArtworkRecord, ArtworkUpdate, NewArtwork};
//! use serde_json::json;
//!
//! let mut new = NewArtwork::new("Blue Period", "blue.png", vec![0u8; 16]);
//! new.artist = Some("Picasso".to_string());
//! let mut record = ArtworkRecord::from_new(ArtworkId(1), new);
//!
//! let update = ArtworkUpdate::from_json(&json!({ "style": "  cubism " })).unwrap();
//! update.apply(&mut record).unwrap();
//! assert_eq!(record.style.as_deref(), Some("cubism"));
//! ```

pub mod artwork;
pub mod defaults;
pub mod error;

pub use artwork::{
    ArtworkId, ArtworkRecord, ArtworkSummary, ArtworkUpdate, NewArtwork, OwnerId,
};
pub use error::{Error, Result};
