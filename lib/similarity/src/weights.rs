//! Fixed scoring weights

use serde::{Deserialize, Serialize};

pub const ARTIST_WEIGHT: f64 = 3.0;
pub const STYLE_WEIGHT: f64 = 2.0;
pub const MEDIUM_WEIGHT: f64 = 1.5;
pub const ARTWORK_TYPE_WEIGHT: f64 = 1.0;
pub const DESCRIPTION_WEIGHT: f64 = 3.0;
pub const IMAGE_WEIGHT: f64 = 3.0;

/// Weight of every signal in a similarity score
///
/// Field weights are added on an exact match; the description and image
/// weights scale an overlap in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub artist: f64,
    pub style: f64,
    pub medium: f64,
    pub artwork_type: f64,
    pub description: f64,
    pub image: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            artist: ARTIST_WEIGHT,
            style: STYLE_WEIGHT,
            medium: MEDIUM_WEIGHT,
            artwork_type: ARTWORK_TYPE_WEIGHT,
            description: DESCRIPTION_WEIGHT,
            image: IMAGE_WEIGHT,
        }
    }
}

impl ScoreWeights {
    /// Score of a pair that matches on every signal
    pub fn max_score(&self) -> f64 {
        self.artist + self.style + self.medium + self.artwork_type + self.description + self.image
    }
}
