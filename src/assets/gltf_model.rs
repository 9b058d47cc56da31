use glam::Mat4;
use gltf::image::Format;

use super::AssetError;
use crate::config::srgb_to_linear;
use crate::model::{Mesh, Vertex};

/// A decoded model: every primitive of the default scene merged into one
/// mesh, node transforms already applied.
#[derive(Debug, Clone)]
pub struct ModelData {
    pub label: String,
    pub mesh: Mesh,
}

/// Decode a `.glb` (or self-contained `.gltf`) file.
///
/// Only triangle primitives are kept. Colors come from vertex colors, a
/// nearest-texel lookup into the base color texture, and the material's base
/// color factor, multiplied together.
pub fn parse_model(label: &str, bytes: &[u8]) -> Result<ModelData, AssetError> {
    let (document, buffers, images) = gltf::import_slice(bytes).map_err(|source| AssetError::Gltf {
        label: label.to_string(),
        source,
    })?;

    let mut mesh = Mesh::default();
    let sources = Sources { buffers: &buffers, images: &images };
    match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => {
            for node in scene.nodes() {
                collect_node(&node, Mat4::IDENTITY, &sources, &mut mesh);
            }
        }
        None => {
            // no scene graph, take the meshes as they are
            for gltf_mesh in document.meshes() {
                append_mesh(&gltf_mesh, &Mat4::IDENTITY, &sources, &mut mesh);
            }
        }
    }

    if mesh.is_empty() {
        return Err(AssetError::EmptyModel { label: label.to_string() });
    }
    tracing::debug!(
        model = label,
        vertices = mesh.vertices.len(),
        triangles = mesh.indices.len() / 3,
        "decoded glTF"
    );
    Ok(ModelData { label: label.to_string(), mesh })
}

struct Sources<'a> {
    buffers: &'a [gltf::buffer::Data],
    images: &'a [gltf::image::Data],
}

fn collect_node(node: &gltf::Node, parent: Mat4, sources: &Sources, out: &mut Mesh) {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    if let Some(gltf_mesh) = node.mesh() {
        append_mesh(&gltf_mesh, &world, sources, out);
    }
    for child in node.children() {
        collect_node(&child, world, sources, out);
    }
}

fn append_mesh(gltf_mesh: &gltf::Mesh, transform: &Mat4, sources: &Sources, out: &mut Mesh) {
    for primitive in gltf_mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            continue;
        }
        let reader = primitive.reader(|b| sources.buffers.get(b.index()).map(|d| d.0.as_slice()));
        let positions: Vec<[f32; 3]> = match reader.read_positions() {
            Some(it) => it.collect(),
            None => continue,
        };
        let count = positions.len() as u32;
        let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|it| it.collect());
        let colors: Option<Vec<[f32; 4]>> = reader.read_colors(0).map(|it| it.into_rgba_f32().collect());

        let pbr = primitive.material().pbr_metallic_roughness();
        let factor = pbr.base_color_factor();
        let texture = pbr.base_color_texture().and_then(|info| {
            let image = sources.images.get(info.texture().source().index())?;
            let uvs: Vec<[f32; 2]> = reader.read_tex_coords(info.tex_coord())?.into_f32().collect();
            Some((image, uvs))
        });

        let vertices = positions
            .iter()
            .enumerate()
            .map(|(i, pos)| {
                let mut color = colors.as_ref().and_then(|c| c.get(i)).copied().unwrap_or([1.0; 4]);
                if let Some(texel) = texture.as_ref().and_then(|(image, uvs)| sample_nearest(image, *uvs.get(i)?)) {
                    color = mul4(color, texel);
                }
                Vertex {
                    pos: *pos,
                    normal: normals.as_ref().and_then(|n| n.get(i)).copied().unwrap_or([0.0, 1.0, 0.0]),
                    color: mul4(color, factor),
                }
            })
            .collect();

        let raw: Vec<u32> = match reader.read_indices() {
            Some(it) => it.into_u32().collect(),
            None => (0..count).collect(),
        };
        let indices = raw
            .chunks_exact(3)
            .filter(|tri| tri.iter().all(|&i| i < count))
            .flatten()
            .copied()
            .collect();

        let mut part = Mesh { vertices, indices };
        if normals.is_none() {
            part.compute_normals();
        }
        out.append_transformed(&part, transform);
    }
}

fn mul4(a: [f32; 4], b: [f32; 4]) -> [f32; 4] {
    [a[0] * b[0], a[1] * b[1], a[2] * b[2], a[3] * b[3]]
}

/// Nearest texel with repeat wrapping, converted to linear RGBA
fn sample_nearest(image: &gltf::image::Data, uv: [f32; 2]) -> Option<[f32; 4]> {
    let channels = match image.format {
        Format::R8G8B8A8 => 4,
        Format::R8G8B8 => 3,
        _ => return None,
    };
    let (w, h) = (image.width as usize, image.height as usize);
    if w == 0 || h == 0 {
        return None;
    }
    let x = ((uv[0].rem_euclid(1.0) * w as f32) as usize).min(w - 1);
    let y = ((uv[1].rem_euclid(1.0) * h as f32) as usize).min(h - 1);
    let start = (y * w + x) * channels;
    let px = image.pixels.get(start..start + channels)?;
    let alpha = if channels == 4 { px[3] as f32 / 255.0 } else { 1.0 };
    Some([
        srgb_to_linear(px[0] as f32 / 255.0),
        srgb_to_linear(px[1] as f32 / 255.0),
        srgb_to_linear(px[2] as f32 / 255.0),
        alpha,
    ])
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal binary glTF: one red triangle under a node translated by +1 Y
    pub(crate) fn triangle_glb() -> Vec<u8> {
        let json = r#"{
            "asset": {"version": "2.0"},
            "scene": 0,
            "scenes": [{"nodes": [0]}],
            "nodes": [{"mesh": 0, "translation": [0.0, 1.0, 0.0]}],
            "meshes": [{"primitives": [{"attributes": {"POSITION": 0}, "indices": 1, "material": 0}]}],
            "materials": [{"pbrMetallicRoughness": {"baseColorFactor": [1.0, 0.0, 0.0, 1.0]}}],
            "buffers": [{"byteLength": 42}],
            "bufferViews": [
                {"buffer": 0, "byteOffset": 0, "byteLength": 36},
                {"buffer": 0, "byteOffset": 36, "byteLength": 6}
            ],
            "accessors": [
                {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                 "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]},
                {"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"}
            ]
        }"#;

        let mut bin = Vec::new();
        for p in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            for c in p {
                bin.extend_from_slice(&c.to_le_bytes());
            }
        }
        for i in [0u16, 1, 2] {
            bin.extend_from_slice(&i.to_le_bytes());
        }
        while bin.len() % 4 != 0 {
            bin.push(0);
        }
        let mut json = json.as_bytes().to_vec();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }

        let total = 12 + 8 + json.len() + 8 + bin.len();
        let mut glb = Vec::with_capacity(total);
        glb.extend_from_slice(b"glTF");
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&(total as u32).to_le_bytes());
        glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"JSON");
        glb.extend_from_slice(&json);
        glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"BIN\0");
        glb.extend_from_slice(&bin);
        glb
    }

    #[test]
    fn decodes_minimal_glb() {
        let model = parse_model("triangle.glb", &triangle_glb()).expect("valid glb");
        assert_eq!(model.label, "triangle.glb");
        assert_eq!(model.mesh.vertices.len(), 3);
        assert_eq!(model.mesh.indices, vec![0, 1, 2]);

        // node translation baked in
        let ys: Vec<f32> = model.mesh.vertices.iter().map(|v| v.pos[1]).collect();
        assert_eq!(ys, vec![1.0, 1.0, 2.0]);

        // base color factor applied, normals computed from the winding
        for v in &model.mesh.vertices {
            assert_eq!(v.color, [1.0, 0.0, 0.0, 1.0]);
            assert!(glam::Vec3::from(v.normal).abs_diff_eq(glam::Vec3::Z, 1e-6));
        }
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_model("junk.glb", b"definitely not a model").unwrap_err();
        assert!(matches!(err, AssetError::Gltf { ref label, .. } if label == "junk.glb"), "{err}");
    }

    #[test]
    fn nearest_sampling_wraps() {
        let image = gltf::image::Data {
            pixels: vec![255, 255, 255, 0, 0, 0],
            format: Format::R8G8B8,
            width: 2,
            height: 1,
        };
        assert_eq!(sample_nearest(&image, [0.25, 0.5]), Some([1.0, 1.0, 1.0, 1.0]));
        assert_eq!(sample_nearest(&image, [0.75, 0.5]), Some([0.0, 0.0, 0.0, 1.0]));
        assert_eq!(sample_nearest(&image, [1.25, 0.5]), Some([1.0, 1.0, 1.0, 1.0]));
    }
}
