//! Reference resolution: mesh fragments to [`ResolvedModel`]
//!
//! Follows the fixed chain mesh → material palette → material → simple
//! sprite → simple sprite definition → bitmap info and collects texture
//! filenames in declared order.

use glam::{Vec2, Vec3};

use crate::error::{Error, Result};
use crate::formats::wld::fragment::{BmInfo, DmSpriteDef2, MaterialDef, MaterialPalette, SimpleSprite, SimpleSpriteDef};
use crate::formats::wld::{Container, Fragment, FragmentType, NameRef};
use crate::model::{Material, MaterialProperty, ResolvedModel, Triangle, Vertex};

pub(crate) const MESH_SUFFIX: &str = "_DMSPRITEDEF";
pub(crate) const MATERIAL_SUFFIX: &str = "_MDF";

/// Resolve the first mesh of a container.
///
/// # Errors
/// `NoMesh` when the container holds no `DmSpriteDef2`, `DanglingReference`
/// when any link of the chain is missing or of the wrong kind.
pub fn resolve(container: &Container) -> Result<ResolvedModel> {
    let (ordinal, _) = container
        .of_type(FragmentType::DmSpriteDef2)
        .next()
        .ok_or(Error::NoMesh)?;
    resolve_mesh(container, ordinal)
}

/// Resolve every mesh of a container, in ordinal order.
pub fn resolve_all(container: &Container) -> Result<Vec<ResolvedModel>> {
    let ordinals: Vec<u32> = container
        .of_type(FragmentType::DmSpriteDef2)
        .map(|(ordinal, _)| ordinal)
        .collect();
    if ordinals.is_empty() {
        return Err(Error::NoMesh);
    }
    ordinals
        .into_iter()
        .map(|ordinal| resolve_mesh(container, ordinal))
        .collect()
}

/// Resolve the mesh at `ordinal`.
pub fn resolve_mesh(container: &Container, ordinal: u32) -> Result<ResolvedModel> {
    let mesh = link(container, 0, ordinal, "DmSpriteDef2", |f| match f {
        Fragment::DmSpriteDef2(m) => Some(m),
        _ => None,
    })?;

    let materials = resolve_materials(container, ordinal, mesh.material_palette_ref)?;
    let triangles = assign_materials(ordinal, mesh, materials.len())?;
    let name = strip_suffix(name_of(container, mesh.name_ref, ordinal)?, MESH_SUFFIX);

    tracing::debug!(
        "Resolved mesh {} '{}': {} vertices, {} triangles, {} materials",
        ordinal,
        name,
        mesh.positions.len(),
        triangles.len(),
        materials.len()
    );

    Ok(ResolvedModel {
        name,
        vertices: vertices(mesh),
        triangles,
        materials,
    })
}

/// Fetch the fragment at `to` and check its variant.
fn link<'c, T>(
    container: &'c Container,
    from: u32,
    to: u32,
    expected: &'static str,
    pick: impl FnOnce(&'c Fragment) -> Option<&'c T>,
) -> Result<&'c T> {
    container
        .fragment(to)
        .and_then(pick)
        .ok_or(Error::DanglingReference { from, to, expected })
}

fn name_of(container: &Container, name: NameRef, ordinal: u32) -> Result<&str> {
    container.name_table.lookup(name, ordinal)
}

fn strip_suffix(name: &str, suffix: &str) -> String {
    name.strip_suffix(suffix).unwrap_or(name).to_string()
}

fn resolve_materials(container: &Container, mesh: u32, palette_ref: u32) -> Result<Vec<Material>> {
    if palette_ref == 0 {
        return Ok(Vec::new());
    }
    let palette: &MaterialPalette = link(container, mesh, palette_ref, "MaterialPalette", |f| match f {
        Fragment::MaterialPalette(p) => Some(p),
        _ => None,
    })?;

    palette
        .material_refs
        .iter()
        .map(|&material_ref| resolve_material(container, palette_ref, material_ref))
        .collect()
}

fn resolve_material(container: &Container, palette: u32, ordinal: u32) -> Result<Material> {
    let def: &MaterialDef = link(container, palette, ordinal, "MaterialDef", |f| match f {
        Fragment::MaterialDef(m) => Some(m),
        _ => None,
    })?;

    let properties = texture_files(container, ordinal, def.simple_sprite_ref)?
        .into_iter()
        .enumerate()
        .map(|(i, file)| MaterialProperty::diffuse(i, file))
        .collect();

    Ok(Material {
        name: strip_suffix(name_of(container, def.name_ref, ordinal)?, MATERIAL_SUFFIX),
        render_method: def.render_method,
        properties,
    })
}

fn texture_files(container: &Container, material: u32, sprite_ref: u32) -> Result<Vec<String>> {
    if sprite_ref == 0 {
        return Ok(Vec::new());
    }
    let sprite: &SimpleSprite = link(container, material, sprite_ref, "SimpleSprite", |f| match f {
        Fragment::SimpleSprite(s) => Some(s),
        _ => None,
    })?;

    // zero or negative: a sprite with no definition, so no texture
    let Ok(def_ref) = u32::try_from(sprite.sprite_ref) else {
        return Ok(Vec::new());
    };
    if def_ref == 0 {
        return Ok(Vec::new());
    }
    let def: &SimpleSpriteDef = link(container, sprite_ref, def_ref, "SimpleSpriteDef", |f| match f {
        Fragment::SimpleSpriteDef(d) => Some(d),
        _ => None,
    })?;

    let mut files = Vec::new();
    for &bitmap_ref in &def.bitmap_refs {
        let info: &BmInfo = link(container, def_ref, bitmap_ref, "BmInfo", |f| match f {
            Fragment::BmInfo(b) => Some(b),
            _ => None,
        })?;
        files.extend(info.file_names.iter().cloned());
    }
    Ok(files)
}

fn vertices(mesh: &DmSpriteDef2) -> Vec<Vertex> {
    let uvs = mesh.vertex_uvs();
    let normals = mesh.vertex_normals();
    mesh.vertex_positions()
        .into_iter()
        .enumerate()
        .map(|(i, position)| Vertex {
            position,
            normal: normals.get(i).copied().unwrap_or(Vec3::ZERO),
            uv: uvs.get(i).copied().unwrap_or(Vec2::ZERO),
            color: mesh.colors.get(i).copied().unwrap_or([0xFF; 4]),
        })
        .collect()
}

/// Expand face material runs into one material index per triangle.
fn assign_materials(ordinal: u32, mesh: &DmSpriteDef2, palette_len: usize) -> Result<Vec<Triangle>> {
    let mut triangles: Vec<Triangle> = mesh
        .faces
        .iter()
        .map(|face| Triangle {
            indices: face.indices.map(u32::from),
            material: 0,
            flags: face.flags,
        })
        .collect();

    let mut next = 0usize;
    for (group, run) in mesh.face_material_groups.iter().enumerate() {
        if usize::from(run.index) >= palette_len {
            return Err(Error::InvalidMaterialGroup {
                mesh: ordinal,
                group,
                material: run.index,
                palette_len,
            });
        }
        let end = (next + usize::from(run.count)).min(triangles.len());
        for triangle in &mut triangles[next..end] {
            triangle.material = run.index;
        }
        next = end;
    }
    if next < triangles.len() && !mesh.face_material_groups.is_empty() {
        tracing::warn!(
            "Mesh {}: material groups cover {} of {} faces",
            ordinal,
            next,
            triangles.len()
        );
    }

    let vertex_count = mesh.positions.len() as u32;
    if triangles.iter().flat_map(|t| t.indices).any(|i| i >= vertex_count) {
        tracing::warn!("Mesh {}: face index beyond {} vertices", ordinal, vertex_count);
    }

    Ok(triangles)
}
