//! Meshes: quantized (`DmSpriteDef2`) and legacy float (`DmSpriteDef`)
//!
//! Quantized positions are `i16` triples relative to `center`, scaled by
//! `2^-scale_exponent`. UV storage width follows the world format. See
//! [`crate::formats::wld::quantize`] for the float conversions.

use super::FragmentLayout;
use super::render::gated;
use crate::error::Result;
use crate::formats::wld::io::{FragmentReader, FragmentWriter};
use crate::formats::wld::name_table::NameRef;
use crate::formats::wld::version::UvWidth;

/// Triangle of a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeshFace {
    pub flags: u16,
    pub indices: [u16; 3],
}

impl MeshFace {
    /// Face can be walked through.
    pub const PASSABLE: u16 = 0x10;
}

/// Run of `count` consecutive faces (or vertices) sharing one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunGroup {
    pub count: u16,
    pub index: u16,
}

/// Payload of a mesh op. Op type 4 carries an offset, the others two
/// vertex indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeshOpValue {
    Indices([u16; 2]),
    Offset(f32),
}

impl Default for MeshOpValue {
    fn default() -> Self {
        Self::Indices([0, 0])
    }
}

/// Level-of-detail mesh operation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeshOp {
    pub value: MeshOpValue,
    pub param1: u8,
    pub kind: u8,
}

impl MeshOp {
    pub const KIND_OFFSET: u8 = 4;
}

/// 0x36 - mesh.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DmSpriteDef2 {
    pub name_ref: NameRef,
    pub flags: u32,
    /// Ordinal of a `MaterialPalette`, 0 for an untextured mesh.
    pub material_palette_ref: u32,
    /// Ordinal of a vertex animation (`DmTrack`), 0 for none.
    pub dm_track_ref: i32,
    pub fragment3_ref: i32,
    pub fragment4_ref: i32,
    pub center: [f32; 3],
    pub params2: [u32; 3],
    pub bounding_radius: f32,
    pub bbox_min: [f32; 3],
    pub bbox_max: [f32; 3],
    pub scale_exponent: u16,
    pub positions: Vec<[i16; 3]>,
    /// Texture coordinates, 256 units per texture repeat.
    pub uvs: Vec<[i32; 2]>,
    pub normals: Vec<[i8; 3]>,
    pub colors: Vec<[u8; 4]>,
    pub faces: Vec<MeshFace>,
    /// Vertex runs assigned to skeleton pieces.
    pub skin_groups: Vec<RunGroup>,
    /// Face runs assigned to palette materials.
    pub face_material_groups: Vec<RunGroup>,
    pub vertex_material_groups: Vec<RunGroup>,
    pub mesh_ops: Vec<MeshOp>,
}

fn read_run(r: &mut FragmentReader<'_>, field: &'static str) -> Result<RunGroup> {
    Ok(RunGroup {
        count: r.u16(field)?,
        index: r.u16(field)?,
    })
}

fn write_run(w: &mut FragmentWriter<'_>, run: RunGroup) -> Result<()> {
    w.u16(run.count)?;
    w.u16(run.index)
}

impl FragmentLayout for DmSpriteDef2 {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        let name_ref = r.name_ref("name_ref")?;
        let flags = r.u32("flags")?;
        let material_palette_ref = r.u32("material_palette_ref")?;
        let dm_track_ref = r.i32("dm_track_ref")?;
        let fragment3_ref = r.i32("fragment3_ref")?;
        let fragment4_ref = r.i32("fragment4_ref")?;
        let center = r.vec3("center")?;
        let params2 = [r.u32("params2")?, r.u32("params2")?, r.u32("params2")?];
        let bounding_radius = r.f32("bounding_radius")?;
        let bbox_min = r.vec3("bbox_min")?;
        let bbox_max = r.vec3("bbox_max")?;

        let vertex_count = r.u16("vertex_count")? as usize;
        let uv_count = r.u16("uv_count")? as usize;
        let normal_count = r.u16("normal_count")? as usize;
        let color_count = r.u16("color_count")? as usize;
        let face_count = r.u16("face_count")? as usize;
        let skin_group_count = r.u16("skin_group_count")? as usize;
        let face_material_count = r.u16("face_material_group_count")? as usize;
        let vertex_material_count = r.u16("vertex_material_group_count")? as usize;
        let mesh_op_count = r.u16("mesh_op_count")? as usize;
        let scale_exponent = r.u16("scale")?;

        let positions = r.array(vertex_count, 6, "positions", |r| {
            Ok([r.i16("positions")?, r.i16("positions")?, r.i16("positions")?])
        })?;

        let uv_width = r.format().mesh_uv_width();
        let uvs = r.array(uv_count, uv_width.pair_size(), "uvs", |r| match uv_width {
            UvWidth::I16 => Ok([i32::from(r.i16("uvs")?), i32::from(r.i16("uvs")?)]),
            UvWidth::I32 => Ok([r.i32("uvs")?, r.i32("uvs")?]),
        })?;

        let normals = r.array(normal_count, 3, "normals", |r| {
            Ok([r.i8("normals")?, r.i8("normals")?, r.i8("normals")?])
        })?;
        let colors = r.array(color_count, 4, "colors", |r| {
            Ok([r.u8("colors")?, r.u8("colors")?, r.u8("colors")?, r.u8("colors")?])
        })?;
        let faces = r.array(face_count, 8, "faces", |r| {
            Ok(MeshFace {
                flags: r.u16("faces")?,
                indices: [r.u16("faces")?, r.u16("faces")?, r.u16("faces")?],
            })
        })?;
        let skin_groups = r.array(skin_group_count, 4, "skin_groups", |r| read_run(r, "skin_groups"))?;
        let face_material_groups = r.array(face_material_count, 4, "face_material_groups", |r| {
            read_run(r, "face_material_groups")
        })?;
        let vertex_material_groups = r.array(vertex_material_count, 4, "vertex_material_groups", |r| {
            read_run(r, "vertex_material_groups")
        })?;
        let mesh_ops = r.array(mesh_op_count, 6, "mesh_ops", |r| {
            let raw = r.bytes(4, "mesh_ops")?;
            let param1 = r.u8("mesh_ops")?;
            let kind = r.u8("mesh_ops")?;
            let value = if kind == MeshOp::KIND_OFFSET {
                MeshOpValue::Offset(f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
            } else {
                MeshOpValue::Indices([
                    u16::from_le_bytes([raw[0], raw[1]]),
                    u16::from_le_bytes([raw[2], raw[3]]),
                ])
            };
            Ok(MeshOp { value, param1, kind })
        })?;

        Ok(Self {
            name_ref,
            flags,
            material_palette_ref,
            dm_track_ref,
            fragment3_ref,
            fragment4_ref,
            center,
            params2,
            bounding_radius,
            bbox_min,
            bbox_max,
            scale_exponent,
            positions,
            uvs,
            normals,
            colors,
            faces,
            skin_groups,
            face_material_groups,
            vertex_material_groups,
            mesh_ops,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.u32(self.flags)?;
        w.u32(self.material_palette_ref)?;
        w.i32(self.dm_track_ref)?;
        w.i32(self.fragment3_ref)?;
        w.i32(self.fragment4_ref)?;
        w.vec3(self.center)?;
        w.u32_array(&self.params2)?;
        w.f32(self.bounding_radius)?;
        w.vec3(self.bbox_min)?;
        w.vec3(self.bbox_max)?;

        w.count_u16(self.positions.len(), "vertex_count")?;
        w.count_u16(self.uvs.len(), "uv_count")?;
        w.count_u16(self.normals.len(), "normal_count")?;
        w.count_u16(self.colors.len(), "color_count")?;
        w.count_u16(self.faces.len(), "face_count")?;
        w.count_u16(self.skin_groups.len(), "skin_group_count")?;
        w.count_u16(self.face_material_groups.len(), "face_material_group_count")?;
        w.count_u16(self.vertex_material_groups.len(), "vertex_material_group_count")?;
        w.count_u16(self.mesh_ops.len(), "mesh_op_count")?;
        w.u16(self.scale_exponent)?;

        for position in &self.positions {
            position.iter().try_for_each(|&v| w.i16(v))?;
        }

        match w.format().mesh_uv_width() {
            UvWidth::I16 => {
                for uv in &self.uvs {
                    for &v in uv {
                        let narrow = i16::try_from(v).map_err(|_| w.out_of_range("uvs", i64::from(v)))?;
                        w.i16(narrow)?;
                    }
                }
            }
            UvWidth::I32 => {
                for uv in &self.uvs {
                    uv.iter().try_for_each(|&v| w.i32(v))?;
                }
            }
        }

        for normal in &self.normals {
            normal.iter().try_for_each(|&v| w.i8(v))?;
        }
        for color in &self.colors {
            w.bytes(color)?;
        }
        for face in &self.faces {
            w.u16(face.flags)?;
            face.indices.iter().try_for_each(|&i| w.u16(i))?;
        }
        for &run in &self.skin_groups {
            write_run(w, run)?;
        }
        for &run in &self.face_material_groups {
            write_run(w, run)?;
        }
        for &run in &self.vertex_material_groups {
            write_run(w, run)?;
        }
        for op in &self.mesh_ops {
            match op.value {
                MeshOpValue::Indices([a, b]) => {
                    w.u16(a)?;
                    w.u16(b)?;
                }
                MeshOpValue::Offset(offset) => w.f32(offset)?,
            }
            w.u8(op.param1)?;
            w.u8(op.kind)?;
        }
        w.pad_to_4()
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}

/// Polygon of a legacy mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LegacyPolygon {
    pub flags: u16,
    pub unknown: [u16; 4],
    pub indices: [u16; 3],
}

/// 0x2C - legacy mesh with float vertices.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DmSpriteDef {
    pub name_ref: NameRef,
    pub flags: u32,
    pub fragment1: i16,
    /// Ordinal of a `MaterialPalette`.
    pub material_palette_ref: u32,
    pub fragment3_ref: u32,
    pub center: [f32; 3],
    pub params2: [u32; 3],
    pub vertices: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub colors: Vec<u32>,
    pub polygons: Vec<LegacyPolygon>,
    pub size6_entries: Vec<[u32; 5]>,
    pub vertex_pieces: Vec<RunGroup>,
    /// 0x200
    pub post_vertex_flag: Option<u32>,
    /// 0x800, polygon runs per material.
    pub render_groups: Option<Vec<RunGroup>>,
    /// 0x1000
    pub vertex_tex: Option<Vec<[f32; 2]>>,
    /// 0x2000
    pub params3: Option<[u32; 3]>,
}

impl DmSpriteDef {
    pub const HAS_POST_VERTEX_FLAG: u32 = 0x200;
    pub const HAS_RENDER_GROUPS: u32 = 0x800;
    pub const HAS_VERTEX_TEX: u32 = 0x1000;
    pub const HAS_PARAMS3: u32 = 0x2000;
}

impl FragmentLayout for DmSpriteDef {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        let name_ref = r.name_ref("name_ref")?;
        let flags = r.u32("flags")?;
        let vertex_count = r.u32("vertex_count")? as usize;
        let tex_coord_count = r.u32("tex_coord_count")? as usize;
        let normal_count = r.u32("normal_count")? as usize;
        let color_count = r.u32("color_count")? as usize;
        let polygon_count = r.u32("polygon_count")? as usize;
        let size6_count = r.u16("size6_count")? as usize;
        let fragment1 = r.i16("fragment1")?;
        let vertex_piece_count = r.u32("vertex_piece_count")? as usize;
        let material_palette_ref = r.u32("material_palette_ref")?;
        let fragment3_ref = r.u32("fragment3_ref")?;
        let center = r.vec3("center")?;
        let params2 = [r.u32("params2")?, r.u32("params2")?, r.u32("params2")?];

        let vertices = r.vec3_array(vertex_count, "vertices")?;
        let tex_coords = r.vec3_array(tex_coord_count, "tex_coords")?;
        let normals = r.vec3_array(normal_count, "normals")?;
        let colors = r.u32_array(color_count, "colors")?;
        let polygons = r.array(polygon_count, 16, "polygons", |r| {
            Ok(LegacyPolygon {
                flags: r.u16("polygons")?,
                unknown: [r.u16("polygons")?, r.u16("polygons")?, r.u16("polygons")?, r.u16("polygons")?],
                indices: [r.u16("polygons")?, r.u16("polygons")?, r.u16("polygons")?],
            })
        })?;
        let size6_entries = r.array(size6_count, 20, "size6_entries", |r| {
            let mut entry = [0u32; 5];
            for slot in &mut entry {
                *slot = r.u32("size6_entries")?;
            }
            Ok(entry)
        })?;
        let vertex_pieces = r.array(vertex_piece_count, 4, "vertex_pieces", |r| read_run(r, "vertex_pieces"))?;

        let post_vertex_flag = gated(flags & Self::HAS_POST_VERTEX_FLAG, || r.u32("post_vertex_flag"))?;
        let render_groups = gated(flags & Self::HAS_RENDER_GROUPS, || {
            let count = r.u32("render_group_count")? as usize;
            r.array(count, 4, "render_groups", |r| read_run(r, "render_groups"))
        })?;
        let vertex_tex = gated(flags & Self::HAS_VERTEX_TEX, || {
            let count = r.u32("vertex_tex_count")? as usize;
            r.array(count, 8, "vertex_tex", |r| r.vec2("vertex_tex"))
        })?;
        let params3 = gated(flags & Self::HAS_PARAMS3, || {
            Ok([r.u32("params3")?, r.u32("params3")?, r.u32("params3")?])
        })?;

        Ok(Self {
            name_ref,
            flags,
            fragment1,
            material_palette_ref,
            fragment3_ref,
            center,
            params2,
            vertices,
            tex_coords,
            normals,
            colors,
            polygons,
            size6_entries,
            vertex_pieces,
            post_vertex_flag,
            render_groups,
            vertex_tex,
            params3,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.u32(self.flags)?;
        w.count_u32(self.vertices.len(), "vertex_count")?;
        w.count_u32(self.tex_coords.len(), "tex_coord_count")?;
        w.count_u32(self.normals.len(), "normal_count")?;
        w.count_u32(self.colors.len(), "color_count")?;
        w.count_u32(self.polygons.len(), "polygon_count")?;
        w.count_u16(self.size6_entries.len(), "size6_count")?;
        w.i16(self.fragment1)?;
        w.count_u32(self.vertex_pieces.len(), "vertex_piece_count")?;
        w.u32(self.material_palette_ref)?;
        w.u32(self.fragment3_ref)?;
        w.vec3(self.center)?;
        w.u32_array(&self.params2)?;

        w.vec3_array(&self.vertices)?;
        w.vec3_array(&self.tex_coords)?;
        w.vec3_array(&self.normals)?;
        w.u32_array(&self.colors)?;
        for polygon in &self.polygons {
            w.u16(polygon.flags)?;
            polygon.unknown.iter().try_for_each(|&v| w.u16(v))?;
            polygon.indices.iter().try_for_each(|&i| w.u16(i))?;
        }
        for entry in &self.size6_entries {
            w.u32_array(entry)?;
        }
        for &run in &self.vertex_pieces {
            write_run(w, run)?;
        }

        if self.flags & Self::HAS_POST_VERTEX_FLAG != 0 {
            w.u32(*w.section(&self.post_vertex_flag, "post_vertex_flag")?)?;
        }
        if self.flags & Self::HAS_RENDER_GROUPS != 0 {
            let groups = w.section(&self.render_groups, "render_groups")?;
            w.count_u32(groups.len(), "render_group_count")?;
            for &run in groups {
                write_run(w, run)?;
            }
        }
        if self.flags & Self::HAS_VERTEX_TEX != 0 {
            let coords = w.section(&self.vertex_tex, "vertex_tex")?;
            w.count_u32(coords.len(), "vertex_tex_count")?;
            for &uv in coords {
                w.vec2(uv)?;
            }
        }
        if self.flags & Self::HAS_PARAMS3 != 0 {
            w.u32_array(w.section(&self.params3, "params3")?)?;
        }
        Ok(())
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::wld::fragment::tests::{decode_only, encode_only, names, round_trip, round_trip_in};
    use crate::formats::wld::version::WorldFormat;
    use pretty_assertions::assert_eq;

    fn quad() -> DmSpriteDef2 {
        DmSpriteDef2 {
            name_ref: names::offset("QUAD_DMSPRITEDEF"),
            flags: 0x00018003,
            material_palette_ref: 2,
            center: [0.0, 0.0, 0.0],
            bounding_radius: 1.5,
            bbox_min: [0.0; 3],
            bbox_max: [1.0, 1.0, 0.0],
            scale_exponent: 8,
            positions: vec![[0, 0, 0], [256, 0, 0], [256, 256, 0], [0, 256, 0]],
            uvs: vec![[0, 0], [256, 0], [256, 256], [0, 256]],
            normals: vec![[0, 0, 127]; 4],
            colors: vec![[255, 255, 255, 255]; 4],
            faces: vec![
                MeshFace {
                    flags: 0,
                    indices: [0, 1, 2],
                },
                MeshFace {
                    flags: MeshFace::PASSABLE,
                    indices: [0, 2, 3],
                },
            ],
            face_material_groups: vec![RunGroup { count: 2, index: 0 }],
            vertex_material_groups: vec![RunGroup { count: 4, index: 0 }],
            ..Default::default()
        }
    }

    #[test]
    fn test_mesh_round_trip_old_format() {
        let frag = quad();
        let (decoded, bytes) = round_trip(&frag, 0x36);
        assert_eq!(decoded, frag);
        assert_eq!(bytes.len() % 4, 0);
    }

    #[test]
    fn test_mesh_uv_width_follows_format() {
        let frag = quad();
        let old = encode_only(&frag, 0x36).unwrap();
        let (decoded, new) = round_trip_in(&frag, 0x36, WorldFormat::New);
        assert_eq!(decoded, frag);
        // 4 extra bytes per UV pair
        assert_eq!(new.len(), old.len() + 16);
    }

    #[test]
    fn test_mesh_wide_uvs_overflow_old_format() {
        let mut frag = quad();
        frag.uvs[1] = [70_000, 0];
        assert!(matches!(
            encode_only(&frag, 0x36),
            Err(crate::Error::FieldOverflow { field: "uvs", value: 70_000, .. })
        ));
        assert_eq!(round_trip_in(&frag, 0x36, WorldFormat::New).0, frag);
    }

    #[test]
    fn test_mesh_ops_and_skin_groups() {
        let mut frag = quad();
        frag.skin_groups = vec![RunGroup { count: 4, index: 1 }];
        frag.mesh_ops = vec![
            MeshOp {
                value: MeshOpValue::Indices([1, 2]),
                param1: 0,
                kind: 1,
            },
            MeshOp {
                value: MeshOpValue::Offset(0.25),
                param1: 2,
                kind: MeshOp::KIND_OFFSET,
            },
        ];
        assert_eq!(round_trip(&frag, 0x36).0, frag);
    }

    #[test]
    fn test_mesh_truncated_vertex_array() {
        let frag = quad();
        let bytes = encode_only(&frag, 0x36).unwrap();
        // header is 96 bytes, cut inside the positions
        let err = decode_only::<DmSpriteDef2>(&bytes[..100], 0x36).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::FragmentTruncated { type_code: 0x36, field: "positions", .. }
        ));
    }

    fn legacy_box() -> DmSpriteDef {
        DmSpriteDef {
            name_ref: names::offset("QUAD_DMSPRITEDEF"),
            fragment1: -1,
            material_palette_ref: 2,
            center: [1.0, 2.0, 3.0],
            params2: [0, 1, 0],
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]],
            tex_coords: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            colors: vec![0xFF80_8080; 3],
            polygons: vec![LegacyPolygon {
                flags: 0,
                unknown: [1, 0, 0, 0],
                indices: [0, 1, 2],
            }],
            size6_entries: vec![[1, 2, 3, 4, 5]],
            vertex_pieces: vec![RunGroup { count: 3, index: 0 }],
            ..Default::default()
        }
    }

    #[test]
    fn test_legacy_mesh_round_trip() {
        let frag = legacy_box();
        let (decoded, bytes) = round_trip(&frag, 0x2C);
        assert_eq!(decoded, frag);
        // 68 byte header, 3 * 3 vec3, 3 colors, one polygon, one size6 entry, one piece
        assert_eq!(bytes.len(), 68 + 9 * 12 + 12 + 16 + 20 + 4);
    }

    #[test]
    fn test_legacy_mesh_sections() {
        let all = legacy_box();
        let all = DmSpriteDef {
            flags: DmSpriteDef::HAS_POST_VERTEX_FLAG
                | DmSpriteDef::HAS_RENDER_GROUPS
                | DmSpriteDef::HAS_VERTEX_TEX
                | DmSpriteDef::HAS_PARAMS3,
            post_vertex_flag: Some(7),
            render_groups: Some(vec![RunGroup { count: 1, index: 0 }]),
            vertex_tex: Some(vec![[0.0, 0.5], [1.0, 0.5], [1.0, 1.0]]),
            params3: Some([9, 8, 7]),
            ..all
        };
        assert_eq!(round_trip(&all, 0x2C).0, all);

        let only = |flag: u32| DmSpriteDef {
            flags: flag,
            post_vertex_flag: all.post_vertex_flag.filter(|_| flag == DmSpriteDef::HAS_POST_VERTEX_FLAG),
            render_groups: all.render_groups.clone().filter(|_| flag == DmSpriteDef::HAS_RENDER_GROUPS),
            vertex_tex: all.vertex_tex.clone().filter(|_| flag == DmSpriteDef::HAS_VERTEX_TEX),
            params3: all.params3.filter(|_| flag == DmSpriteDef::HAS_PARAMS3),
            ..all.clone()
        };
        for flag in [
            DmSpriteDef::HAS_POST_VERTEX_FLAG,
            DmSpriteDef::HAS_RENDER_GROUPS,
            DmSpriteDef::HAS_VERTEX_TEX,
            DmSpriteDef::HAS_PARAMS3,
        ] {
            let frag = only(flag);
            assert_eq!(round_trip(&frag, 0x2C).0, frag);
        }
    }

    #[test]
    fn test_legacy_mesh_missing_section() {
        let frag = DmSpriteDef {
            flags: DmSpriteDef::HAS_RENDER_GROUPS,
            ..legacy_box()
        };
        assert!(matches!(
            encode_only(&frag, 0x2C),
            Err(crate::Error::MissingSection { field: "render_groups", .. })
        ));
    }

    #[test]
    fn test_legacy_mesh_truncated() {
        let bytes = encode_only(&legacy_box(), 0x2C).unwrap();
        assert!(matches!(
            decode_only::<DmSpriteDef>(&bytes[..67], 0x2C),
            Err(crate::Error::FragmentTruncated { type_code: 0x2C, field: "params2", .. })
        ));
        // cut inside the vertex array
        assert!(matches!(
            decode_only::<DmSpriteDef>(&bytes[..80], 0x2C),
            Err(crate::Error::FragmentTruncated { type_code: 0x2C, field: "vertices", .. })
        ));
    }
}
