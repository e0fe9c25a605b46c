//! glTF assembly for synthesized terrain meshes.
//!
//! Packs the four geometry arrays into a single binary buffer with
//! views/accessors and wraps them in the one supported appearance: a
//! texture-mapped, double-sided, opaque material. The texture itself is
//! referenced by a relative URI next to the exported asset, matching the
//! layout the simulation models use.
//!
//! Positions are kept in the heightfield's Z-up world frame; the
//! consuming simulator is Z-up.

use std::collections::BTreeMap;

use anyhow::Result;
use gltf::json as gltf;
use gltf::{
    accessor::{ComponentType, GenericComponentType},
    validation::{Checked, USize64},
};

use crate::terrain::mesh::TerrainMesh;

/// Export configuration for a terrain asset.
#[derive(Debug, Clone)]
pub struct TerrainExportOptions {
    /// Name used for the mesh, node and scene.
    pub name: String,
    /// Relative URI of the terrain texture (e.g. "texture.png"). Without
    /// it the material falls back to an untextured base color.
    pub texture_uri: Option<String>,
}

impl Default for TerrainExportOptions {
    fn default() -> Self {
        Self {
            name: "terrain".to_string(),
            texture_uri: None,
        }
    }
}

fn append_f32s(bin: &mut Vec<u8>, data: &[f32]) -> (usize, usize) {
    let offset = bin.len();
    for v in data {
        bin.extend_from_slice(&v.to_le_bytes());
    }
    (offset, bin.len() - offset)
}

fn append_u32s(bin: &mut Vec<u8>, data: &[u32]) -> (usize, usize) {
    let offset = bin.len();
    for v in data {
        bin.extend_from_slice(&v.to_le_bytes());
    }
    (offset, bin.len() - offset)
}

/// Build the glTF JSON string and binary buffer for a terrain mesh,
/// ready for GLB packing via [`super::glb::write_glb`].
pub fn build_terrain_gltf(
    mesh: &TerrainMesh,
    options: &TerrainExportOptions,
) -> Result<(String, Vec<u8>)> {
    let vertex_count = mesh.vertex_count();

    let mut bin: Vec<u8> = Vec::new();
    let mut buffer_views = vec![];
    let mut accessors = vec![];

    // Position bounds for the accessor min/max (required for POSITION).
    let mut pos_min = [f32::MAX; 3];
    let mut pos_max = [f32::MIN; 3];
    for p in &mesh.positions {
        for c in 0..3 {
            pos_min[c] = pos_min[c].min(p[c]);
            pos_max[c] = pos_max[c].max(p[c]);
        }
    }

    let mut add_accessor = |name: &str,
                            data_offset: usize,
                            data_len: usize,
                            count: usize,
                            type_: gltf::accessor::Type,
                            component: ComponentType,
                            target: gltf::buffer::Target,
                            min: Option<serde_json::Value>,
                            max: Option<serde_json::Value>|
     -> usize {
        let view_index = buffer_views.len();
        buffer_views.push(gltf::buffer::View {
            buffer: gltf::Index::new(0),
            byte_length: USize64(data_len as u64),
            byte_offset: Some(USize64(data_offset as u64)),
            byte_stride: None,
            target: Some(Checked::Valid(target)),
            extensions: None,
            extras: None,
            name: Some(format!("{}_view", name)),
        });

        let accessor_index = accessors.len();
        accessors.push(gltf::Accessor {
            buffer_view: Some(gltf::Index::new(view_index as u32)),
            byte_offset: Some(USize64(0)),
            component_type: Checked::Valid(GenericComponentType(component)),
            count: USize64(count as u64),
            min,
            max,
            name: Some(format!("{}_accessor", name)),
            normalized: false,
            sparse: None,
            type_: Checked::Valid(type_),
            extensions: None,
            extras: None,
        });
        accessor_index
    };

    let position_data: Vec<f32> = mesh.positions.iter().flatten().copied().collect();
    let (off, len) = append_f32s(&mut bin, &position_data);
    let pos_accessor = add_accessor(
        "position",
        off,
        len,
        vertex_count,
        gltf::accessor::Type::Vec3,
        ComponentType::F32,
        gltf::buffer::Target::ArrayBuffer,
        Some(serde_json::to_value(pos_min)?),
        Some(serde_json::to_value(pos_max)?),
    );

    let normal_data: Vec<f32> = mesh.normals.iter().flatten().copied().collect();
    let (off, len) = append_f32s(&mut bin, &normal_data);
    let normal_accessor = add_accessor(
        "normal",
        off,
        len,
        vertex_count,
        gltf::accessor::Type::Vec3,
        ComponentType::F32,
        gltf::buffer::Target::ArrayBuffer,
        None,
        None,
    );

    let uv_data: Vec<f32> = mesh.uvs.iter().flatten().copied().collect();
    let (off, len) = append_f32s(&mut bin, &uv_data);
    let uv_accessor = add_accessor(
        "uv",
        off,
        len,
        vertex_count,
        gltf::accessor::Type::Vec2,
        ComponentType::F32,
        gltf::buffer::Target::ArrayBuffer,
        None,
        None,
    );

    let (off, len) = append_u32s(&mut bin, &mesh.indices);
    let index_accessor = add_accessor(
        "index",
        off,
        len,
        mesh.indices.len(),
        gltf::accessor::Type::Scalar,
        ComponentType::U32,
        gltf::buffer::Target::ElementArrayBuffer,
        None,
        None,
    );

    let buffer = gltf::Buffer {
        byte_length: USize64(bin.len() as u64),
        uri: None, // GLB BIN chunk
        extensions: None,
        extras: None,
        name: Some(format!("{}_buffer", options.name)),
    };

    // The single supported appearance: textured, double-sided, opaque.
    let mut images = vec![];
    let mut samplers = vec![];
    let mut textures = vec![];

    let base_color_texture = options.texture_uri.as_ref().map(|uri| {
        images.push(gltf::Image {
            buffer_view: None,
            mime_type: None,
            uri: Some(uri.clone()),
            name: Some(format!("{}_texture_image", options.name)),
            extensions: None,
            extras: None,
        });

        // Linear filtering, clamped: the texture stretches once across
        // the whole terrain, it never tiles.
        samplers.push(gltf::texture::Sampler {
            mag_filter: Some(Checked::Valid(gltf::texture::MagFilter::Linear)),
            min_filter: Some(Checked::Valid(gltf::texture::MinFilter::Linear)),
            wrap_s: Checked::Valid(gltf::texture::WrappingMode::ClampToEdge),
            wrap_t: Checked::Valid(gltf::texture::WrappingMode::ClampToEdge),
            name: Some(format!("{}_sampler", options.name)),
            extensions: None,
            extras: None,
        });

        textures.push(gltf::Texture {
            sampler: Some(gltf::Index::new(0)),
            source: gltf::Index::new(0),
            name: Some(format!("{}_texture", options.name)),
            extensions: None,
            extras: None,
        });

        gltf::texture::Info {
            index: gltf::Index::new(0),
            tex_coord: 0,
            extensions: None,
            extras: None,
        }
    });

    let material = gltf::Material {
        alpha_cutoff: None,
        alpha_mode: Checked::Valid(gltf::material::AlphaMode::Opaque),
        double_sided: true,
        pbr_metallic_roughness: gltf::material::PbrMetallicRoughness {
            base_color_factor: gltf::material::PbrBaseColorFactor([1.0, 1.0, 1.0, 1.0]),
            base_color_texture,
            metallic_factor: gltf::material::StrengthFactor(0.0),
            roughness_factor: gltf::material::StrengthFactor(1.0),
            metallic_roughness_texture: None,
            extensions: None,
            extras: None,
        },
        normal_texture: None,
        occlusion_texture: None,
        emissive_texture: None,
        emissive_factor: gltf::material::EmissiveFactor([0.0, 0.0, 0.0]),
        extensions: None,
        extras: None,
        name: Some(format!("{}_material", options.name)),
    };

    let mut attributes = BTreeMap::new();
    attributes.insert(
        Checked::Valid(gltf::mesh::Semantic::Positions),
        gltf::Index::new(pos_accessor as u32),
    );
    attributes.insert(
        Checked::Valid(gltf::mesh::Semantic::Normals),
        gltf::Index::new(normal_accessor as u32),
    );
    attributes.insert(
        Checked::Valid(gltf::mesh::Semantic::TexCoords(0)),
        gltf::Index::new(uv_accessor as u32),
    );

    let primitive = gltf::mesh::Primitive {
        attributes,
        indices: Some(gltf::Index::new(index_accessor as u32)),
        material: Some(gltf::Index::new(0)),
        mode: Checked::Valid(gltf::mesh::Mode::Triangles),
        targets: None,
        extensions: None,
        extras: None,
    };

    let gltf_mesh = gltf::Mesh {
        name: Some(options.name.clone()),
        primitives: vec![primitive],
        weights: None,
        extensions: None,
        extras: None,
    };

    let node = gltf::Node {
        mesh: Some(gltf::Index::new(0)),
        name: Some(format!("{}_node", options.name)),
        ..Default::default()
    };

    let scene = gltf::Scene {
        nodes: vec![gltf::Index::new(0)],
        name: Some(format!("{}_scene", options.name)),
        extensions: None,
        extras: None,
    };

    let root = gltf::Root {
        asset: gltf::Asset {
            version: "2.0".to_string(),
            generator: Some("terrain-tools".to_string()),
            ..Default::default()
        },
        accessors,
        buffers: vec![buffer],
        buffer_views,
        images,
        materials: vec![material],
        meshes: vec![gltf_mesh],
        nodes: vec![node],
        samplers,
        scene: Some(gltf::Index::new(0)),
        scenes: vec![scene],
        textures,
        ..Default::default()
    };

    let json = serde_json::to_string(&root)?;
    Ok((json, bin))
}
