//! Colour histograms and their overlap

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};

/// Side of the square canvas images are resized to before counting
pub const HISTOGRAM_SIZE: u32 = 64;

/// Bins per colour channel
pub const BINS_PER_CHANNEL: usize = 256;

/// Per-channel value counts: 256 red bins, then green, then blue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorHistogram {
    bins: Vec<u32>,
}

impl ColorHistogram {
    /// Decode and count at the default canvas size; `None` if undecodable
    pub fn from_image_bytes(bytes: &[u8]) -> Option<Self> {
        Self::from_image_bytes_sized(bytes, HISTOGRAM_SIZE)
    }

    pub fn from_image_bytes_sized(bytes: &[u8], size: u32) -> Option<Self> {
        let image = image::load_from_memory(bytes).ok()?;
        Self::from_image(&image, size)
    }

    /// Force to RGB, resize to `size`×`size` (bicubic) and count
    pub fn from_image(image: &DynamicImage, size: u32) -> Option<Self> {
        if image.width() == 0 || image.height() == 0 || size == 0 {
            return None;
        }
        let rgb = image.to_rgb8();
        let resized = imageops::resize(&rgb, size, size, FilterType::CatmullRom);
        Some(Self::from_rgb(&resized))
    }

    /// Count an image as-is, without resizing
    pub fn from_rgb(image: &RgbImage) -> Self {
        let mut bins = vec![0u32; BINS_PER_CHANNEL * 3];
        for pixel in image.pixels() {
            for (channel, value) in pixel.0.iter().enumerate() {
                bins[channel * BINS_PER_CHANNEL + *value as usize] += 1;
            }
        }
        Self { bins }
    }

    pub fn from_bins(bins: Vec<u32>) -> Self {
        Self { bins }
    }

    pub fn bins(&self) -> &[u32] {
        &self.bins
    }

    pub fn total(&self) -> u64 {
        self.bins.iter().map(|&b| b as u64).sum()
    }

    /// Normalized intersection `Σ min(self, other) / Σ self`
    ///
    /// Divides by this histogram's own total, so `a.overlap(b)` and
    /// `b.overlap(a)` differ whenever the totals differ. Returns 0.0 for an
    /// empty histogram.
    pub fn overlap(&self, other: &ColorHistogram) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let shared: u64 = self
            .bins
            .iter()
            .zip(&other.bins)
            .map(|(&a, &b)| a.min(b) as u64)
            .sum();
        shared as f64 / total as f64
    }
}

/// Overlap of two optional histograms; 0.0 when either is missing
pub fn histogram_overlap(target: Option<&ColorHistogram>, candidate: Option<&ColorHistogram>) -> f64 {
    match (target, candidate) {
        (Some(t), Some(c)) => t.overlap(c),
        _ => 0.0,
    }
}
