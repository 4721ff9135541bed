//! Model import: [`ResolvedModel`] to a fresh [`Container`]

use std::collections::HashMap;

use glam::Vec3;

use super::resolve::{MATERIAL_SUFFIX, MESH_SUFFIX};
use crate::error::{Error, Result};
use crate::formats::wld::fragment::{
    BmInfo, DmSpriteDef2, InstanceRef, MaterialDef, MaterialPalette, MeshFace, RunGroup, SimpleSprite,
    SimpleSpriteDef,
};
use crate::formats::wld::quantize::{MeshQuantizer, choose_scale_exponent, encode_normal, encode_uv};
use crate::formats::wld::{Container, Fragment, FragmentType, NameTableBuilder, WorldFormat};
use crate::model::ResolvedModel;

/// Mesh flags used by placeable objects.
pub const OBJECT_MESH_FLAGS: u32 = 0x0001_4003;

/// Options for building a container from a model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Layout of the produced container
    pub format: WorldFormat,
    /// Fixed position scale exponent. If None, the finest exponent that fits is chosen
    pub scale_exponent: Option<u16>,
    /// Flags written to the mesh fragment
    pub mesh_flags: u32,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            format: WorldFormat::New,
            scale_exponent: None,
            mesh_flags: OBJECT_MESH_FLAGS,
        }
    }
}

impl BuildOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the container layout
    #[must_use]
    pub fn with_format(mut self, format: WorldFormat) -> Self {
        self.format = format;
        self
    }

    /// Use a fixed scale exponent instead of fitting one
    #[must_use]
    pub fn with_scale_exponent(mut self, scale_exponent: u16) -> Self {
        self.scale_exponent = Some(scale_exponent);
        self
    }

    /// Set the mesh fragment flags
    #[must_use]
    pub fn with_mesh_flags(mut self, flags: u32) -> Self {
        self.mesh_flags = flags;
        self
    }
}

/// Build a container holding one mesh, its materials and textures.
///
/// Fragments are laid out leaf first: bitmap infos and sprites, materials,
/// the palette, the mesh and finally a `DmSprite` instance of it.
///
/// # Errors
/// `QuantizationOverflow` when a coordinate does not fit the scale exponent,
/// `InvalidMaterialGroup` when a triangle names a missing material and
/// `FieldOverflow` when a vertex index does not fit 16 bits.
pub fn build_container(model: &ResolvedModel, options: &BuildOptions) -> Result<Container> {
    let mut names = NameTableBuilder::new();
    let mut container = Container::new(options.format);

    // one sprite chain per distinct texture set
    let mut sprites: HashMap<Vec<String>, u32> = HashMap::new();
    let mut material_refs = Vec::with_capacity(model.materials.len());
    for material in &model.materials {
        let textures: Vec<String> = material.textures().map(str::to_string).collect();
        let sprite_ref = if textures.is_empty() {
            0
        } else if let Some(&ordinal) = sprites.get(&textures) {
            ordinal
        } else {
            let ordinal = push_sprite_chain(&mut container, &mut names, &textures)?;
            sprites.insert(textures, ordinal);
            ordinal
        };

        let def = MaterialDef {
            name_ref: names.add(&format!("{}{MATERIAL_SUFFIX}", material.name)),
            render_method: material.render_method,
            scaled_ambient: 0.75,
            simple_sprite_ref: sprite_ref,
            ..MaterialDef::default()
        };
        material_refs.push(container.push(Fragment::MaterialDef(def)));
    }

    let palette_ref = if material_refs.is_empty() {
        0
    } else {
        container.push(Fragment::MaterialPalette(MaterialPalette {
            name_ref: names.add(&format!("{}_MP", model.name)),
            flags: 0,
            material_refs,
        }))
    };

    let mesh_ordinal = container.fragment_count() as u32 + 1;
    let mut mesh = build_mesh(model, options, mesh_ordinal)?;
    mesh.name_ref = names.add(&format!("{}{MESH_SUFFIX}", model.name));
    mesh.material_palette_ref = palette_ref;
    container.push(Fragment::DmSpriteDef2(mesh));

    container.push(Fragment::DmSprite(InstanceRef {
        reference: mesh_ordinal as i32,
        ..InstanceRef::default()
    }));

    container.name_table = names.finish();
    tracing::debug!(
        "Built container for '{}': {} fragments, {} names",
        model.name,
        container.fragment_count(),
        container.name_table.len()
    );
    Ok(container)
}

/// Push `BmInfo`, `SimpleSpriteDef` and `SimpleSprite`; returns the sprite ordinal.
fn push_sprite_chain(container: &mut Container, names: &mut NameTableBuilder, textures: &[String]) -> Result<u32> {
    let first = textures.first().map(String::as_str).unwrap_or_default();
    let stem = first.rsplit_once('.').map_or(first, |(stem, _)| stem).to_uppercase();

    let bm = container.push(Fragment::BmInfo(BmInfo {
        name_ref: names.add(&first.to_uppercase()),
        file_names: textures.to_vec(),
    }));
    let def = container.push(Fragment::SimpleSpriteDef(SimpleSpriteDef {
        name_ref: names.add(&format!("{stem}_SPRITE")),
        bitmap_refs: vec![bm],
        ..SimpleSpriteDef::default()
    }));
    // the sprite stores its definition ordinal as an i16
    let sprite_ref = i16::try_from(def).map_err(|_| Error::FieldOverflow {
        type_code: FragmentType::SimpleSprite.code(),
        field: "sprite_ref",
        value: i64::from(def),
    })?;
    Ok(container.push(Fragment::SimpleSprite(SimpleSprite {
        sprite_ref,
        ..SimpleSprite::default()
    })))
}

fn build_mesh(model: &ResolvedModel, options: &BuildOptions, ordinal: u32) -> Result<DmSpriteDef2> {
    let positions: Vec<Vec3> = model.vertices.iter().map(|v| v.position).collect();
    let (min, max) = model.bounds().unwrap_or((Vec3::ZERO, Vec3::ZERO));
    let center = (min + max) * 0.5;
    let scale_exponent = options
        .scale_exponent
        .unwrap_or_else(|| choose_scale_exponent(center, &positions));
    let quantizer = MeshQuantizer::new(center, scale_exponent);

    let bounding_radius = positions
        .iter()
        .map(|p| p.distance(center))
        .fold(0.0f32, f32::max);

    let stored = positions
        .iter()
        .map(|&p| quantizer.encode_position(p))
        .collect::<Result<Vec<_>>>()?;

    let uv_width = options.format.mesh_uv_width();
    let uvs = if model.vertices.iter().any(|v| v.uv != glam::Vec2::ZERO) {
        model
            .vertices
            .iter()
            .map(|v| encode_uv(v.uv, uv_width))
            .collect::<Result<Vec<_>>>()?
    } else {
        Vec::new()
    };
    let normals = if model.vertices.iter().any(|v| v.normal != Vec3::ZERO) {
        model.vertices.iter().map(|v| encode_normal(v.normal)).collect()
    } else {
        Vec::new()
    };
    let colors = if model.vertices.iter().any(|v| v.color != [0xFF; 4]) {
        model.vertices.iter().map(|v| v.color).collect()
    } else {
        Vec::new()
    };

    let faces = model
        .triangles
        .iter()
        .map(|t| {
            let mut indices = [0u16; 3];
            for (slot, &index) in indices.iter_mut().zip(&t.indices) {
                *slot = u16::try_from(index).map_err(|_| Error::FieldOverflow {
                    type_code: FragmentType::DmSpriteDef2.code(),
                    field: "faces",
                    value: i64::from(index),
                })?;
            }
            Ok(MeshFace { flags: t.flags, indices })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DmSpriteDef2 {
        flags: options.mesh_flags,
        center: center.to_array(),
        bounding_radius,
        bbox_min: min.to_array(),
        bbox_max: max.to_array(),
        scale_exponent,
        positions: stored,
        uvs,
        normals,
        colors,
        faces,
        face_material_groups: material_runs(model, ordinal)?,
        ..DmSpriteDef2::default()
    })
}

/// Run-length encode the triangle materials in triangle order.
fn material_runs(model: &ResolvedModel, mesh: u32) -> Result<Vec<RunGroup>> {
    if model.materials.is_empty() {
        return Ok(Vec::new());
    }

    let mut runs: Vec<RunGroup> = Vec::new();
    for triangle in &model.triangles {
        match runs.last_mut() {
            Some(run) if run.index == triangle.material && run.count < u16::MAX => run.count += 1,
            _ => {
                if usize::from(triangle.material) >= model.materials.len() {
                    return Err(Error::InvalidMaterialGroup {
                        mesh,
                        group: runs.len(),
                        material: triangle.material,
                        palette_len: model.materials.len(),
                    });
                }
                runs.push(RunGroup {
                    count: 1,
                    index: triangle.material,
                });
            }
        }
    }
    Ok(runs)
}
