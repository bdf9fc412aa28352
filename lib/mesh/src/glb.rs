//! Binary glTF export of a textured canvas box

use gltf::binary::{Glb, Header};
use image::{ImageFormat, RgbImage};
use serde_json::{json, Value};
use std::borrow::Cow;
use std::io::Cursor;

use crate::error::{MeshError, Result};
use crate::geometry::CanvasBox;

const COMPONENT_F32: u32 = 5126;
const COMPONENT_U16: u32 = 5123;
const TARGET_ARRAY_BUFFER: u32 = 34962;
const TARGET_ELEMENT_ARRAY_BUFFER: u32 = 34963;
const MODE_TRIANGLES: u32 = 4;
const FILTER_LINEAR: u32 = 9729;
const FILTER_LINEAR_MIPMAP_LINEAR: u32 = 9987;
const WRAP_REPEAT: u32 = 10497;

/// One region of the binary chunk
struct View {
    offset: usize,
    length: usize,
    target: Option<u32>,
}

/// Binary chunk under construction; every view starts 4-byte aligned
#[derive(Default)]
struct BinaryChunk {
    data: Vec<u8>,
    views: Vec<View>,
}

impl BinaryChunk {
    fn push(&mut self, bytes: &[u8], target: Option<u32>) -> usize {
        self.pad();
        let offset = self.data.len();
        self.data.extend_from_slice(bytes);
        self.views.push(View { offset, length: bytes.len(), target });
        self.views.len() - 1
    }

    fn push_f32s(&mut self, values: impl IntoIterator<Item = f32>, target: Option<u32>) -> usize {
        let bytes: Vec<u8> = values.into_iter().flat_map(f32::to_le_bytes).collect();
        self.push(&bytes, target)
    }

    fn push_u16s(&mut self, values: impl IntoIterator<Item = u16>, target: Option<u32>) -> usize {
        let bytes: Vec<u8> = values.into_iter().flat_map(u16::to_le_bytes).collect();
        self.push(&bytes, target)
    }

    fn pad(&mut self) {
        while self.data.len() % 4 != 0 {
            self.data.push(0);
        }
    }

    fn views_json(&self) -> Vec<Value> {
        self.views
            .iter()
            .map(|v| {
                let mut view = json!({
                    "buffer": 0,
                    "byteOffset": v.offset,
                    "byteLength": v.length,
                });
                if let Some(target) = v.target {
                    view["target"] = json!(target);
                }
                view
            })
            .collect()
    }
}

/// Encode a canvas box with `texture` as its base colour into GLB bytes
///
/// Produces one mesh, one material, one PNG texture and one UV channel.
/// UVs are stored with V flipped since glTF samples from the top-left.
pub fn encode_glb(canvas: &CanvasBox, texture: &RgbImage) -> Result<Vec<u8>> {
    let mut png = Vec::new();
    texture
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| MeshError::Encoding(format!("texture: {}", e)))?;

    let mut chunk = BinaryChunk::default();
    let positions = chunk.push_f32s(
        canvas.positions().iter().flatten().copied(),
        Some(TARGET_ARRAY_BUFFER),
    );
    let uvs = chunk.push_f32s(
        canvas.planar_uvs().into_iter().flat_map(|[u, v]| [u, 1.0 - v]),
        Some(TARGET_ARRAY_BUFFER),
    );
    let indices = chunk.push_u16s(canvas.indices(), Some(TARGET_ELEMENT_ARRAY_BUFFER));
    let texture_view = chunk.push(&png, None);
    chunk.pad();

    let (min, max) = canvas.bounds();
    let vertex_count = canvas.positions().len();

    let document = json!({
        "asset": { "version": "2.0", "generator": concat!("artbox-mesh ", env!("CARGO_PKG_VERSION")) },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0, "name": "canvas" }],
        "meshes": [{
            "name": "canvas",
            "primitives": [{
                "attributes": { "POSITION": 0, "TEXCOORD_0": 1 },
                "indices": 2,
                "material": 0,
                "mode": MODE_TRIANGLES,
            }],
        }],
        "materials": [{
            "name": "artwork",
            "pbrMetallicRoughness": {
                "baseColorTexture": { "index": 0, "texCoord": 0 },
                "metallicFactor": 0.0,
                "roughnessFactor": 1.0,
            },
        }],
        "textures": [{ "sampler": 0, "source": 0 }],
        "samplers": [{
            "magFilter": FILTER_LINEAR,
            "minFilter": FILTER_LINEAR_MIPMAP_LINEAR,
            "wrapS": WRAP_REPEAT,
            "wrapT": WRAP_REPEAT,
        }],
        "images": [{ "bufferView": texture_view, "mimeType": "image/png" }],
        "accessors": [
            {
                "bufferView": positions,
                "componentType": COMPONENT_F32,
                "count": vertex_count,
                "type": "VEC3",
                "min": min,
                "max": max,
            },
            {
                "bufferView": uvs,
                "componentType": COMPONENT_F32,
                "count": vertex_count,
                "type": "VEC2",
            },
            {
                "bufferView": indices,
                "componentType": COMPONENT_U16,
                "count": canvas.triangle_count() * 3,
                "type": "SCALAR",
            },
        ],
        "bufferViews": chunk.views_json(),
        "buffers": [{ "byteLength": chunk.data.len() }],
    });

    let json = serde_json::to_vec(&document)
        .map_err(|e| MeshError::Encoding(format!("document: {}", e)))?;

    let length = 12 + 8 + align4(json.len()) + 8 + chunk.data.len();
    let glb = Glb {
        header: Header {
            magic: *b"glTF",
            version: 2,
            length: length as u32,
        },
        json: Cow::Owned(json),
        bin: Some(Cow::Owned(chunk.data)),
    };

    glb.to_vec()
        .map_err(|e| MeshError::Encoding(format!("container: {}", e)))
}

#[inline]
fn align4(n: usize) -> usize {
    (n + 3) & !3
}
