//! Ranker for content-based recommendations
//!
//! Scores every candidate against a target artwork from independent
//! weighted signals and returns the best matches first.

use artbox_core::{ArtworkId, ArtworkRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::histogram::{histogram_overlap, ColorHistogram, HISTOGRAM_SIZE};
use crate::text::description_overlap;
use crate::weights::ScoreWeights;

/// Supplies the records a target is compared against
///
/// Implemented by the storage layer so ranking stays a pure function over
/// in-memory records.
pub trait CandidateSource {
    /// Every stored record except `exclude`
    fn fetch_candidates(&self, exclude: ArtworkId) -> Vec<Arc<ArtworkRecord>>;
}

/// Weighted contribution of each signal to one candidate's score
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub artist: f64,
    pub style: f64,
    pub medium: f64,
    pub artwork_type: f64,
    pub description: f64,
    pub image: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.artist + self.style + self.medium + self.artwork_type + self.description + self.image
    }
}

/// One entry of a recommendation list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: ArtworkId,
    pub name: String,
    pub artist: Option<String>,
    pub style: Option<String>,
    pub medium: Option<String>,
    /// Total score rounded to 4 decimal places
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankerConfig {
    pub weights: ScoreWeights,
    /// Canvas side used when computing colour histograms
    pub histogram_size: u32,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            histogram_size: HISTOGRAM_SIZE,
        }
    }
}

/// Heuristic similarity ranker
///
/// Holds no state between calls and never fails: a signal that cannot be
/// computed (missing field, undecodable image) contributes zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityRanker {
    config: RankerConfig,
}

impl SimilarityRanker {
    pub fn new(config: RankerConfig) -> Self {
        Self { config }
    }

    pub fn with_weights(weights: ScoreWeights) -> Self {
        Self::new(RankerConfig { weights, ..Default::default() })
    }

    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.config.weights
    }

    /// Fetch candidates from `source` and rank them against `target`
    pub fn recommend<S>(&self, source: &S, target: &ArtworkRecord, top_n: usize) -> Vec<Recommendation>
    where
        S: CandidateSource + ?Sized,
    {
        if top_n == 0 {
            return Vec::new();
        }
        let candidates = source.fetch_candidates(target.id);
        self.rank(target, &candidates, top_n)
    }

    /// Rank `candidates` by similarity to `target`
    ///
    /// The target itself is skipped if present. The result is sorted by
    /// score descending (ties keep candidate order) and holds at most
    /// `top_n` entries.
    pub fn rank<C>(&self, target: &ArtworkRecord, candidates: &[C], top_n: usize) -> Vec<Recommendation>
    where
        C: AsRef<ArtworkRecord>,
    {
        if top_n == 0 || candidates.is_empty() {
            return Vec::new();
        }

        let target_histogram = self.histogram(target);

        let mut scored: Vec<(f64, &ArtworkRecord)> = candidates
            .iter()
            .map(<C as AsRef<ArtworkRecord>>::as_ref)
            .filter(|candidate| candidate.id != target.id)
            .map(|candidate| {
                let breakdown = self.score_with_histogram(target, target_histogram.as_ref(), candidate);
                (breakdown.total(), candidate)
            })
            .collect();

        // Stable sort: equal scores keep candidate order
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_n);

        debug!(
            target = %target.id,
            candidates = candidates.len(),
            returned = scored.len(),
            "Ranked recommendations"
        );

        scored
            .into_iter()
            .map(|(score, candidate)| Recommendation {
                id: candidate.id,
                name: candidate.name.clone(),
                artist: candidate.artist.clone(),
                style: candidate.style.clone(),
                medium: candidate.medium.clone(),
                score: round4(score),
            })
            .collect()
    }

    /// Unrounded per-signal score of one pair
    pub fn score(&self, target: &ArtworkRecord, candidate: &ArtworkRecord) -> ScoreBreakdown {
        let target_histogram = self.histogram(target);
        self.score_with_histogram(target, target_histogram.as_ref(), candidate)
    }

    fn score_with_histogram(
        &self,
        target: &ArtworkRecord,
        target_histogram: Option<&ColorHistogram>,
        candidate: &ArtworkRecord,
    ) -> ScoreBreakdown {
        let weights = &self.config.weights;
        let candidate_histogram = self.histogram(candidate);

        ScoreBreakdown {
            artist: field_match(&target.artist, &candidate.artist, weights.artist),
            style: field_match(&target.style, &candidate.style, weights.style),
            medium: field_match(&target.medium, &candidate.medium, weights.medium),
            artwork_type: field_match(&target.artwork_type, &candidate.artwork_type, weights.artwork_type),
            description: description_overlap(
                target.description.as_deref(),
                candidate.description.as_deref(),
            ) * weights.description,
            image: histogram_overlap(target_histogram, candidate_histogram.as_ref()) * weights.image,
        }
    }

    fn histogram(&self, record: &ArtworkRecord) -> Option<ColorHistogram> {
        ColorHistogram::from_image_bytes_sized(&record.image_data, self.config.histogram_size)
    }
}

/// `weight` on an exact, case-sensitive match of two non-empty values
fn field_match(a: &Option<String>, b: &Option<String>, weight: f64) -> f64 {
    match (a.as_deref(), b.as_deref()) {
        (Some(a), Some(b)) if !a.is_empty() && a == b => weight,
        _ => 0.0,
    }
}

#[inline]
fn round4(score: f64) -> f64 {
    (score * 10_000.0).round() / 10_000.0
}
