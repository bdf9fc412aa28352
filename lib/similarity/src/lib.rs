//! # artbox Similarity
//!
//! Content-based recommendations for artworks.
//!
//! Every candidate is scored against a target from independent signals:
//!
//! - **Metadata**: exact matches on artist, style, medium and artwork type
//! - **Description**: Jaccard overlap of word tokens
//! - **Image**: colour histogram intersection, normalized by the target
//!
//! ## Example
//!
//! ```rust
//! use artbox_core::{ArtworkId, ArtworkRecord, NewArtwork};
//! use artbox_similarity::SimilarityRanker;
//!
//! let mut target = NewArtwork::new("Water Lilies", "lilies.png", Vec::new());
//! target.artist = Some("Monet".to_string());
//! let target = ArtworkRecord::from_new(ArtworkId(1), target);
//!
//! let mut other = NewArtwork::new("Haystacks", "haystacks.png", Vec::new());
//! other.artist = Some("Monet".to_string());
//! let other = ArtworkRecord::from_new(ArtworkId(2), other);
//!
//! let ranker = SimilarityRanker::default();
//! let recommendations = ranker.rank(&target, &[other], 5);
//! assert_eq!(recommendations[0].score, 3.0);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────┐     ┌─────────────────┐
//! │ CandidateSource │────>│   Ranker    │────>│ Recommendations │
//! │   (storage)     │     │ (weights)   │     │  (top N, desc)  │
//! └─────────────────┘     └─────────────┘     └─────────────────┘
//!                           │         │
//!                 ┌─────────┘         └─────────┐
//!           ┌─────────────┐             ┌─────────────┐
//!           │    Text     │             │  Histogram  │
//!           │  (Jaccard)  │             │ (intersect) │
//!           └─────────────┘             └─────────────┘
//! ```

pub mod histogram;
pub mod rank;
pub mod text;
pub mod weights;

pub use histogram::{histogram_overlap, ColorHistogram, BINS_PER_CHANNEL, HISTOGRAM_SIZE};
pub use rank::{CandidateSource, RankerConfig, Recommendation, ScoreBreakdown, SimilarityRanker};
pub use text::{description_overlap, jaccard, tokenize};
pub use weights::ScoreWeights;
