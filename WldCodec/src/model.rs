//! Resolved mesh model
//!
//! The ordinal-free view of one mesh and its materials. Exporters read it,
//! importers produce it, and [`crate::converter::build_container`] turns it
//! back into fragments.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Prefix of the positional texture property names.
pub const DIFFUSE_PROPERTY_PREFIX: &str = "texture_diffuse_";

/// Size of one vertex in [`ResolvedModel::vertex_bytes`].
pub const VERTEX_STRIDE: usize = 36;

/// A mesh with its materials resolved to texture filenames.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedModel {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
    pub materials: Vec<Material>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    /// RGBA tint, white when the mesh has no vertex colors.
    pub color: [u8; 4],
}

impl Vertex {
    #[must_use]
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            normal: Vec3::ZERO,
            uv: Vec2::ZERO,
            color: [0xFF; 4],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    pub indices: [u32; 3],
    /// Index into [`ResolvedModel::materials`].
    pub material: u16,
    pub flags: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub render_method: u32,
    #[serde(default)]
    pub properties: Vec<MaterialProperty>,
}

impl Material {
    /// Texture filenames in declared order.
    pub fn textures(&self) -> impl Iterator<Item = &str> {
        self.properties
            .iter()
            .filter(|p| p.name.starts_with(DIFFUSE_PROPERTY_PREFIX))
            .map(|p| p.value.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialProperty {
    pub name: String,
    pub value: String,
}

impl MaterialProperty {
    /// The `index`-th diffuse texture property.
    #[must_use]
    pub fn diffuse(index: usize, file_name: impl Into<String>) -> Self {
        Self {
            name: format!("{DIFFUSE_PROPERTY_PREFIX}{index}"),
            value: file_name.into(),
        }
    }
}

impl ResolvedModel {
    /// Interleaved vertex buffer: position, normal, uv as `f32`, then RGBA bytes.
    #[must_use]
    pub fn vertex_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.vertices.len() * VERTEX_STRIDE);
        for v in &self.vertices {
            let floats: [f32; 8] = [
                v.position.x,
                v.position.y,
                v.position.z,
                v.normal.x,
                v.normal.y,
                v.normal.z,
                v.uv.x,
                v.uv.y,
            ];
            out.extend_from_slice(bytemuck::bytes_of(&floats));
            out.extend_from_slice(&v.color);
        }
        out
    }

    /// Triangle indices flattened for an index buffer.
    #[must_use]
    pub fn index_buffer(&self) -> Vec<u32> {
        self.triangles.iter().flat_map(|t| t.indices).collect()
    }

    /// Axis-aligned bounds of the vertex positions.
    #[must_use]
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = self.vertices.first()?.position;
        Some(
            self.vertices
                .iter()
                .fold((first, first), |(min, max), v| (min.min(v.position), max.max(v.position))),
        )
    }

    /// Every referenced texture filename, first occurrence first.
    #[must_use]
    pub fn texture_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.materials.iter().flat_map(Material::textures) {
            if !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
                names.push(name);
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> ResolvedModel {
        ResolvedModel {
            name: "QUAD".to_string(),
            vertices: vec![
                Vertex {
                    position: Vec3::new(1.0, 2.0, 3.0),
                    normal: Vec3::Z,
                    uv: Vec2::new(0.5, 0.25),
                    color: [1, 2, 3, 4],
                },
                Vertex::new(Vec3::new(-1.0, 5.0, 0.0)),
            ],
            triangles: vec![Triangle {
                indices: [0, 1, 0],
                material: 0,
                flags: 0,
            }],
            materials: vec![Material {
                name: "SAND".to_string(),
                render_method: 0x8000_0001,
                properties: vec![MaterialProperty::diffuse(0, "sand.bmp"), MaterialProperty::diffuse(1, "SAND.BMP")],
            }],
        }
    }

    #[test]
    fn test_vertex_bytes_layout() {
        let bytes = sample().vertex_bytes();
        assert_eq!(bytes.len(), 2 * VERTEX_STRIDE);
        assert_eq!(&bytes[0..4], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[20..24], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[24..28], &0.5f32.to_le_bytes());
        assert_eq!(&bytes[32..36], &[1, 2, 3, 4]);
        assert_eq!(&bytes[68..72], &[0xFF; 4]);
    }

    #[test]
    fn test_bounds_and_textures() {
        let model = sample();
        assert_eq!(model.bounds(), Some((Vec3::new(-1.0, 2.0, 0.0), Vec3::new(1.0, 5.0, 3.0))));
        assert_eq!(model.texture_names(), vec!["sand.bmp"]);
        assert_eq!(model.index_buffer(), vec![0, 1, 0]);
        assert_eq!(ResolvedModel::default().bounds(), None);
    }

    #[test]
    fn test_serde_shape() {
        let model = sample();
        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["materials"][0]["properties"][0]["name"], "texture_diffuse_0");
        assert_eq!(json["vertices"][0]["position"], serde_json::json!([1.0, 2.0, 3.0]));

        let back: ResolvedModel = serde_json::from_value(json).unwrap();
        assert_eq!(back, model);
    }
}
