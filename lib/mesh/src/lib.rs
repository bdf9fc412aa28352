//! # artbox Mesh
//!
//! Turns a flat artwork image into a textured "canvas box" model that AR
//! viewers can place at real-world scale.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Decode    │────>│   Enhance   │────>│  CanvasBox  │────>│  GLB export │
//! │ (bytes→RGB) │     │ (contrast,  │     │ (extents +  │     │ (mesh, mat, │
//! │             │     │ saturation) │     │ planar UVs) │     │  texture)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use artbox_mesh::MeshBuilder;
//! use image::{ImageFormat, Rgb, RgbImage};
//! use std::io::Cursor;
//!
//! let img = RgbImage::from_pixel(40, 30, Rgb([200, 40, 40]));
//! let mut png = Vec::new();
//! img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png).unwrap();
//!
//! let glb = MeshBuilder::default().build(&png).unwrap();
//! assert_eq!(&glb[..4], b"glTF");
//! ```

pub mod builder;
pub mod enhance;
pub mod error;
pub mod geometry;
pub mod glb;

pub use builder::{MeshBuilder, MeshConfig};
pub use enhance::{enhance, CONTRAST_FACTOR, SATURATION_FACTOR};
pub use error::{MeshError, Result};
pub use geometry::{CanvasBox, UV_EPSILON};
pub use glb::encode_glb;
