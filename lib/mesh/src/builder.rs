//! Image to canvas box model

use artbox_core::defaults::{DEFAULT_THICKNESS_METERS, DEFAULT_WIDTH_METERS};
use image::DynamicImage;
use tracing::debug;

use crate::enhance::enhance;
use crate::error::{MeshError, Result};
use crate::geometry::CanvasBox;
use crate::glb::encode_glb;

/// Real-world size of generated models
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshConfig {
    /// Box width in meters; height follows the image aspect ratio
    pub width_meters: f32,
    /// Box depth in meters
    pub thickness_meters: f32,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            width_meters: DEFAULT_WIDTH_METERS,
            thickness_meters: DEFAULT_THICKNESS_METERS,
        }
    }
}

impl MeshConfig {
    /// Both extents must be finite and positive
    pub fn validate(&self) -> artbox_core::Result<()> {
        let positive = |v: f32| v.is_finite() && v > 0.0;
        if positive(self.width_meters) && positive(self.thickness_meters) {
            Ok(())
        } else {
            Err(artbox_core::Error::InvalidConfig(format!(
                "Canvas dimensions must be positive, got {}m x {}m",
                self.width_meters, self.thickness_meters
            )))
        }
    }
}

/// Builds GLB canvas boxes from artwork images
///
/// Stateless; one builder can serve any number of concurrent uploads.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshBuilder {
    config: MeshConfig,
}

impl MeshBuilder {
    pub fn new(config: MeshConfig) -> Self {
        Self { config }
    }

    pub fn with_dimensions(width_meters: f32, thickness_meters: f32) -> Self {
        Self::new(MeshConfig { width_meters, thickness_meters })
    }

    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    /// Decode `image_bytes` and build the textured model
    ///
    /// Any decodable raster format is accepted. Returns the GLB bytes or a
    /// [`MeshError`]; nothing partial is ever returned.
    pub fn build(&self, image_bytes: &[u8]) -> Result<Vec<u8>> {
        let image = image::load_from_memory(image_bytes)?;
        self.build_from_image(image)
    }

    /// Build the textured model from an already decoded image
    pub fn build_from_image(&self, image: DynamicImage) -> Result<Vec<u8>> {
        // Alpha is dropped, not composited
        let rgb = image.into_rgb8();
        let (width_px, height_px) = rgb.dimensions();
        if width_px == 0 || height_px == 0 {
            return Err(MeshError::InvalidImage(format!(
                "Invalid image dimensions {}x{}",
                width_px, height_px
            )));
        }

        let texture = enhance(rgb);
        let canvas = CanvasBox::for_image(
            width_px,
            height_px,
            self.config.width_meters,
            self.config.thickness_meters,
        );
        let bytes = encode_glb(&canvas, &texture)?;

        debug!(
            width_px,
            height_px,
            width_m = canvas.width(),
            height_m = canvas.height(),
            glb_bytes = bytes.len(),
            "Built canvas box model"
        );
        Ok(bytes)
    }
}
