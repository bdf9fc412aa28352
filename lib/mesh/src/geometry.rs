//! Canvas box geometry and its planar texture mapping

/// Guard against a zero span when normalizing UVs
pub const UV_EPSILON: f32 = 1e-8;

/// Unit cube corners; bit 2 = x, bit 1 = y, bit 0 = z
const UNIT_CORNERS: [[f32; 3]; 8] = [
    [-0.5, -0.5, -0.5],
    [-0.5, -0.5, 0.5],
    [-0.5, 0.5, -0.5],
    [-0.5, 0.5, 0.5],
    [0.5, -0.5, -0.5],
    [0.5, -0.5, 0.5],
    [0.5, 0.5, -0.5],
    [0.5, 0.5, 0.5],
];

/// Outward-facing triangles over `UNIT_CORNERS`
const TRIANGLES: [[u16; 3]; 12] = [
    [1, 3, 0],
    [4, 1, 0],
    [0, 3, 2],
    [2, 4, 0],
    [1, 7, 3],
    [5, 1, 4],
    [5, 7, 1],
    [3, 7, 2],
    [6, 4, 2],
    [2, 7, 6],
    [6, 5, 4],
    [7, 5, 6],
];

/// An axis-aligned box sized to an artwork
///
/// Centred on the origin in x and y; the depth spans `[0, thickness]` so the
/// front face always sits at `z = thickness`.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasBox {
    width: f32,
    height: f32,
    thickness: f32,
    positions: Vec<[f32; 3]>,
}

impl CanvasBox {
    /// Box with explicit extents
    pub fn new(width: f32, height: f32, thickness: f32) -> Self {
        let positions = UNIT_CORNERS
            .iter()
            .map(|[x, y, z]| [x * width, y * height, z * thickness + thickness / 2.0])
            .collect();

        Self { width, height, thickness, positions }
    }

    /// Box whose height follows the pixel aspect ratio of an image
    ///
    /// `pixel_width` must be non-zero.
    pub fn for_image(pixel_width: u32, pixel_height: u32, width: f32, thickness: f32) -> Self {
        let aspect = pixel_height as f32 / pixel_width as f32;
        Self::new(width, width * aspect, thickness)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.height
    }

    #[inline]
    pub fn thickness(&self) -> f32 {
        self.thickness
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn indices(&self) -> impl Iterator<Item = u16> + '_ {
        TRIANGLES.iter().flatten().copied()
    }

    pub fn triangle_count(&self) -> usize {
        TRIANGLES.len()
    }

    /// Component-wise minimum and maximum of the vertex positions
    pub fn bounds(&self) -> ([f32; 3], [f32; 3]) {
        let mut min = [f32::INFINITY; 3];
        let mut max = [f32::NEG_INFINITY; 3];
        for p in &self.positions {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        (min, max)
    }

    /// Planar projection of every vertex onto the xy footprint, in `[0, 1]`
    ///
    /// The same mapping covers all faces; only the front is ever sampled
    /// by a viewer.
    pub fn planar_uvs(&self) -> Vec<[f32; 2]> {
        let (min, max) = self.bounds();
        let span_x = (max[0] - min[0]).max(UV_EPSILON);
        let span_y = (max[1] - min[1]).max(UV_EPSILON);

        self.positions
            .iter()
            .map(|p| [(p[0] - min[0]) / span_x, (p[1] - min[1]) / span_y])
            .collect()
    }
}
