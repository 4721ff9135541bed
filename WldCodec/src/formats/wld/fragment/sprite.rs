//! Sprite definitions, skeletons and the small reference records that
//! instantiate them

use super::FragmentLayout;
use super::render::{FullRenderInfo, RenderInfo, RenderLayout, gated};
use crate::error::Result;
use crate::formats::wld::io::{FragmentReader, FragmentWriter};
use crate::formats::wld::name_table::NameRef;

/// Name, one reference and a flag word.
///
/// Layout of every instance record that points back at its definition
/// (`Sprite2D`, `Sprite3D`, `Light`, `DmSprite`, `HierarchicalSprite`, ...).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InstanceRef {
    pub name_ref: NameRef,
    /// Ordinal of the referenced definition.
    pub reference: i32,
    pub flags: u32,
}

impl FragmentLayout for InstanceRef {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        Ok(Self {
            name_ref: r.name_ref("name_ref")?,
            reference: r.i32("reference")?,
            flags: r.u32("flags")?,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.i32(self.reference)?;
        w.u32(self.flags)
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}

/// Name and a flag word (`CompositeSpriteDef`, `PointLightOld`, `Sound`, `SoundDef`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NamedFlags {
    pub name_ref: NameRef,
    pub flags: u32,
}

impl FragmentLayout for NamedFlags {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        Ok(Self {
            name_ref: r.name_ref("name_ref")?,
            flags: r.u32("flags")?,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.u32(self.flags)
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}

/// 0x06 - camera-facing sprite.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sprite2DDef {
    pub name_ref: NameRef,
    pub flags: u32,
    pub texture_count: u32,
    pub scale: [f32; 2],
    pub sphere_ref: u32,
    /// 0x80
    pub depth_scale: Option<f32>,
    /// 0x01
    pub center: Option<[f32; 3]>,
    /// 0x02
    pub bounding_radius: Option<f32>,
    /// 0x04
    pub current_frame: Option<i32>,
    /// 0x08
    pub sleep: Option<u32>,
    /// One entry per pitch.
    pub headings: Vec<u32>,
    /// 0x10
    pub render: Option<RenderInfo>,
}

impl Sprite2DDef {
    pub const HAS_CENTER: u32 = 0x01;
    pub const HAS_RADIUS: u32 = 0x02;
    pub const HAS_CURRENT_FRAME: u32 = 0x04;
    pub const HAS_SLEEP: u32 = 0x08;
    pub const HAS_RENDER_INFO: u32 = 0x10;
    pub const HAS_DEPTH_SCALE: u32 = 0x80;
}

impl FragmentLayout for Sprite2DDef {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        let name_ref = r.name_ref("name_ref")?;
        let flags = r.u32("flags")?;
        let texture_count = r.u32("texture_count")?;
        let pitch_count = r.u32("pitch_count")? as usize;
        let scale = r.vec2("scale")?;
        let sphere_ref = r.u32("sphere_ref")?;
        let depth_scale = gated(flags & Self::HAS_DEPTH_SCALE, || r.f32("depth_scale"))?;
        let center = gated(flags & Self::HAS_CENTER, || r.vec3("center"))?;
        let bounding_radius = gated(flags & Self::HAS_RADIUS, || r.f32("bounding_radius"))?;
        let current_frame = gated(flags & Self::HAS_CURRENT_FRAME, || r.i32("current_frame"))?;
        let sleep = gated(flags & Self::HAS_SLEEP, || r.u32("sleep"))?;
        let headings = r.u32_array(pitch_count, "headings")?;
        let render = gated(flags & Self::HAS_RENDER_INFO, || {
            RenderInfo::read(r, RenderLayout::Wide)
        })?;

        Ok(Self {
            name_ref,
            flags,
            texture_count,
            scale,
            sphere_ref,
            depth_scale,
            center,
            bounding_radius,
            current_frame,
            sleep,
            headings,
            render,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.u32(self.flags)?;
        w.u32(self.texture_count)?;
        w.count_u32(self.headings.len(), "pitch_count")?;
        w.vec2(self.scale)?;
        w.u32(self.sphere_ref)?;
        if self.flags & Self::HAS_DEPTH_SCALE != 0 {
            w.f32(*w.section(&self.depth_scale, "depth_scale")?)?;
        }
        if self.flags & Self::HAS_CENTER != 0 {
            w.vec3(*w.section(&self.center, "center")?)?;
        }
        if self.flags & Self::HAS_RADIUS != 0 {
            w.f32(*w.section(&self.bounding_radius, "bounding_radius")?)?;
        }
        if self.flags & Self::HAS_CURRENT_FRAME != 0 {
            w.i32(*w.section(&self.current_frame, "current_frame")?)?;
        }
        if self.flags & Self::HAS_SLEEP != 0 {
            w.u32(*w.section(&self.sleep, "sleep")?)?;
        }
        w.u32_array(&self.headings)?;
        if self.flags & Self::HAS_RENDER_INFO != 0 {
            w.section(&self.render, "render")?
                .write(w, RenderLayout::Wide)?;
        }
        Ok(())
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}

/// One node of a `Sprite3DDef` BSP tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BspNode {
    pub front: u32,
    pub back: u32,
    pub vertex_indices: Vec<u32>,
    pub render: RenderInfo,
}

/// 0x08 - 3D sprite made of BSP nodes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sprite3DDef {
    pub name_ref: NameRef,
    pub flags: u32,
    pub sphere_list_ref: u32,
    /// 0x01
    pub center: Option<[f32; 3]>,
    /// 0x02
    pub bounding_radius: Option<f32>,
    pub vertices: Vec<[f32; 3]>,
    pub bsp_nodes: Vec<BspNode>,
}

impl Sprite3DDef {
    pub const HAS_CENTER: u32 = 0x01;
    pub const HAS_RADIUS: u32 = 0x02;
}

impl FragmentLayout for Sprite3DDef {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        let name_ref = r.name_ref("name_ref")?;
        let flags = r.u32("flags")?;
        let vertex_count = r.u32("vertex_count")? as usize;
        let node_count = r.u32("bsp_node_count")? as usize;
        let sphere_list_ref = r.u32("sphere_list_ref")?;
        let center = gated(flags & Self::HAS_CENTER, || r.vec3("center"))?;
        let bounding_radius = gated(flags & Self::HAS_RADIUS, || r.f32("bounding_radius"))?;
        let vertices = r.vec3_array(vertex_count, "vertices")?;
        let bsp_nodes = r.array(node_count, 17, "bsp_nodes", |r| {
            let index_count = r.u32("vertex_index_count")? as usize;
            let front = r.u32("front")?;
            let back = r.u32("back")?;
            let vertex_indices = r.u32_array(index_count, "vertex_indices")?;
            let render = RenderInfo::read(r, RenderLayout::Node)?;
            Ok(BspNode {
                front,
                back,
                vertex_indices,
                render,
            })
        })?;
        // Trailing zero bytes
        if r.remaining() >= 3 {
            r.bytes(3, "padding")?;
        }

        Ok(Self {
            name_ref,
            flags,
            sphere_list_ref,
            center,
            bounding_radius,
            vertices,
            bsp_nodes,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.u32(self.flags)?;
        w.count_u32(self.vertices.len(), "vertex_count")?;
        w.count_u32(self.bsp_nodes.len(), "bsp_node_count")?;
        w.u32(self.sphere_list_ref)?;
        if self.flags & Self::HAS_CENTER != 0 {
            w.vec3(*w.section(&self.center, "center")?)?;
        }
        if self.flags & Self::HAS_RADIUS != 0 {
            w.f32(*w.section(&self.bounding_radius, "bounding_radius")?)?;
        }
        w.vec3_array(&self.vertices)?;
        for node in &self.bsp_nodes {
            w.count_u32(node.vertex_indices.len(), "vertex_index_count")?;
            w.u32(node.front)?;
            w.u32(node.back)?;
            w.u32_array(&node.vertex_indices)?;
            node.render.write(w, RenderLayout::Node)?;
        }
        w.bytes(&[0; 3])
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}

/// 0x0A - sprite switching between other sprites.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sprite4DDef {
    pub name_ref: NameRef,
    pub flags: u32,
    pub frame_count: u32,
    pub polygon_ref: i32,
    /// 0x01
    pub center: Option<[f32; 3]>,
    /// 0x02
    pub bounding_radius: Option<f32>,
    /// 0x04
    pub current_frame: Option<u32>,
    /// 0x08
    pub sleep: Option<u32>,
    /// 0x10, `frame_count` entries.
    pub sprite_refs: Option<Vec<u32>>,
}

impl Sprite4DDef {
    pub const HAS_CENTER: u32 = 0x01;
    pub const HAS_RADIUS: u32 = 0x02;
    pub const HAS_CURRENT_FRAME: u32 = 0x04;
    pub const HAS_SLEEP: u32 = 0x08;
    pub const HAS_SPRITES: u32 = 0x10;
}

impl FragmentLayout for Sprite4DDef {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        let name_ref = r.name_ref("name_ref")?;
        let flags = r.u32("flags")?;
        let frame_count = r.u32("frame_count")?;
        let polygon_ref = r.i32("polygon_ref")?;
        let center = gated(flags & Self::HAS_CENTER, || r.vec3("center"))?;
        let bounding_radius = gated(flags & Self::HAS_RADIUS, || r.f32("bounding_radius"))?;
        let current_frame = gated(flags & Self::HAS_CURRENT_FRAME, || r.u32("current_frame"))?;
        let sleep = gated(flags & Self::HAS_SLEEP, || r.u32("sleep"))?;
        let sprite_refs = gated(flags & Self::HAS_SPRITES, || {
            r.u32_array(frame_count as usize, "sprite_refs")
        })?;
        Ok(Self {
            name_ref,
            flags,
            frame_count,
            polygon_ref,
            center,
            bounding_radius,
            current_frame,
            sleep,
            sprite_refs,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.u32(self.flags)?;
        w.u32(self.frame_count)?;
        w.i32(self.polygon_ref)?;
        if self.flags & Self::HAS_CENTER != 0 {
            w.vec3(*w.section(&self.center, "center")?)?;
        }
        if self.flags & Self::HAS_RADIUS != 0 {
            w.f32(*w.section(&self.bounding_radius, "bounding_radius")?)?;
        }
        if self.flags & Self::HAS_CURRENT_FRAME != 0 {
            w.u32(*w.section(&self.current_frame, "current_frame")?)?;
        }
        if self.flags & Self::HAS_SLEEP != 0 {
            w.u32(*w.section(&self.sleep, "sleep")?)?;
        }
        if self.flags & Self::HAS_SPRITES != 0 {
            let refs = w.section(&self.sprite_refs, "sprite_refs")?;
            w.expect_len(refs.len(), self.frame_count as usize, "sprite_refs")?;
            w.u32_array(refs)?;
        }
        Ok(())
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}

/// 0x0C - particle sprite.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParticleSpriteDef {
    pub name_ref: NameRef,
    pub flags: u32,
    pub unknown: u32,
    /// 0x01
    pub center: Option<[f32; 3]>,
    /// 0x02
    pub bounding_radius: Option<f32>,
    pub vertices: Vec<[f32; 3]>,
    pub render: FullRenderInfo,
}

impl ParticleSpriteDef {
    pub const HAS_CENTER: u32 = 0x01;
    pub const HAS_RADIUS: u32 = 0x02;
}

impl FragmentLayout for ParticleSpriteDef {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        let name_ref = r.name_ref("name_ref")?;
        let flags = r.u32("flags")?;
        let vertex_count = r.u32("vertex_count")? as usize;
        let unknown = r.u32("unknown")?;
        let center = gated(flags & Self::HAS_CENTER, || r.vec3("center"))?;
        let bounding_radius = gated(flags & Self::HAS_RADIUS, || r.f32("bounding_radius"))?;
        let vertices = r.vec3_array(vertex_count, "vertices")?;
        let render = FullRenderInfo::read(r)?;
        Ok(Self {
            name_ref,
            flags,
            unknown,
            center,
            bounding_radius,
            vertices,
            render,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.u32(self.flags)?;
        w.count_u32(self.vertices.len(), "vertex_count")?;
        w.u32(self.unknown)?;
        if self.flags & Self::HAS_CENTER != 0 {
            w.vec3(*w.section(&self.center, "center")?)?;
        }
        if self.flags & Self::HAS_RADIUS != 0 {
            w.f32(*w.section(&self.bounding_radius, "bounding_radius")?)?;
        }
        w.vec3_array(&self.vertices)?;
        self.render.write(w)
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}

/// One bone of a skeleton.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dag {
    pub name_ref: NameRef,
    pub flags: u32,
    /// Ordinal of a `Track`.
    pub track_ref: u32,
    /// Ordinal of the attached sprite, 0 for none.
    pub mesh_ref: u32,
    /// Indices of child dags.
    pub sub_dags: Vec<u32>,
}

/// 0x10 - skeleton.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HierarchicalSpriteDef {
    pub name_ref: NameRef,
    pub flags: u32,
    pub collision_volume_ref: u32,
    /// 0x01
    pub center: Option<[f32; 3]>,
    /// 0x02
    pub bounding_radius: Option<f32>,
    pub dags: Vec<Dag>,
    /// 0x200
    pub skins: Option<Vec<u32>>,
    /// 0x200, same length as `skins`.
    pub skin_links: Option<Vec<u32>>,
}

impl HierarchicalSpriteDef {
    pub const HAS_CENTER: u32 = 0x01;
    pub const HAS_RADIUS: u32 = 0x02;
    pub const HAS_SKINS: u32 = 0x200;
}

impl FragmentLayout for HierarchicalSpriteDef {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        let name_ref = r.name_ref("name_ref")?;
        let flags = r.u32("flags")?;
        let dag_count = r.u32("dag_count")? as usize;
        let collision_volume_ref = r.u32("collision_volume_ref")?;
        let center = gated(flags & Self::HAS_CENTER, || r.vec3("center"))?;
        let bounding_radius = gated(flags & Self::HAS_RADIUS, || r.f32("bounding_radius"))?;
        let dags = r.array(dag_count, 20, "dags", |r| {
            let name_ref = r.name_ref("dag_name_ref")?;
            let flags = r.u32("dag_flags")?;
            let track_ref = r.u32("track_ref")?;
            let mesh_ref = r.u32("mesh_ref")?;
            let sub_count = r.u32("sub_dag_count")? as usize;
            let sub_dags = r.u32_array(sub_count, "sub_dags")?;
            Ok(Dag {
                name_ref,
                flags,
                track_ref,
                mesh_ref,
                sub_dags,
            })
        })?;

        let (skins, skin_links) = if flags & Self::HAS_SKINS != 0 {
            let count = r.u32("skin_count")? as usize;
            let skins = r.u32_array(count, "skins")?;
            let links = r.u32_array(count, "skin_links")?;
            (Some(skins), Some(links))
        } else {
            (None, None)
        };

        Ok(Self {
            name_ref,
            flags,
            collision_volume_ref,
            center,
            bounding_radius,
            dags,
            skins,
            skin_links,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.u32(self.flags)?;
        w.count_u32(self.dags.len(), "dag_count")?;
        w.u32(self.collision_volume_ref)?;
        if self.flags & Self::HAS_CENTER != 0 {
            w.vec3(*w.section(&self.center, "center")?)?;
        }
        if self.flags & Self::HAS_RADIUS != 0 {
            w.f32(*w.section(&self.bounding_radius, "bounding_radius")?)?;
        }
        for dag in &self.dags {
            w.name_ref(dag.name_ref)?;
            w.u32(dag.flags)?;
            w.u32(dag.track_ref)?;
            w.u32(dag.mesh_ref)?;
            w.count_u32(dag.sub_dags.len(), "sub_dag_count")?;
            w.u32_array(&dag.sub_dags)?;
        }
        if self.flags & Self::HAS_SKINS != 0 {
            let skins = w.section(&self.skins, "skins")?;
            let links = w.section(&self.skin_links, "skin_links")?;
            w.expect_len(links.len(), skins.len(), "skin_links")?;
            w.count_u32(skins.len(), "skin_count")?;
            w.u32_array(skins)?;
            w.u32_array(links)?;
        }
        Ok(())
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }

    fn extra_names(&self, out: &mut Vec<NameRef>) {
        out.extend(self.dags.iter().map(|dag| dag.name_ref));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::wld::fragment::render::{UvInfo, UvMap};
    use crate::formats::wld::fragment::tests::{decode_only, encode_only, names, round_trip};
    use pretty_assertions::assert_eq;

    fn sprite_2d(flags: u32) -> Sprite2DDef {
        let on = |bit: u32| flags & bit != 0;
        Sprite2DDef {
            name_ref: names::offset("FIRE_SPRITE"),
            flags,
            texture_count: 2,
            scale: [1.0, 2.0],
            sphere_ref: 0,
            depth_scale: on(Sprite2DDef::HAS_DEPTH_SCALE).then_some(0.5),
            center: on(Sprite2DDef::HAS_CENTER).then_some([1.0, 2.0, 3.0]),
            bounding_radius: on(Sprite2DDef::HAS_RADIUS).then_some(4.0),
            current_frame: on(Sprite2DDef::HAS_CURRENT_FRAME).then_some(-1),
            sleep: on(Sprite2DDef::HAS_SLEEP).then_some(100),
            headings: vec![1, 1],
            render: on(Sprite2DDef::HAS_RENDER_INFO).then(|| RenderInfo {
                method: 0x80000001,
                flags: RenderInfo::HAS_PEN | RenderInfo::HAS_UV_MAP,
                pen: Some(3),
                uv_map: Some(UvMap::Points(vec![[0.0, 0.0]])),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_sprite_2d_def_flag_combinations() {
        let flags = [0, 0x01, 0x02, 0x04, 0x08, 0x10, 0x80, 0x9F];
        for flag in flags {
            let frag = sprite_2d(flag);
            assert_eq!(round_trip(&frag, 0x06).0, frag, "flags 0x{flag:02X}");
        }
    }

    #[test]
    fn test_sprite_3d_def_round_trip() {
        let frag = Sprite3DDef {
            name_ref: names::offset("FIRE_SPRITE"),
            flags: Sprite3DDef::HAS_CENTER | Sprite3DDef::HAS_RADIUS,
            sphere_list_ref: 0,
            center: Some([0.0; 3]),
            bounding_radius: Some(1.5),
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            bsp_nodes: vec![BspNode {
                front: 0,
                back: 0,
                vertex_indices: vec![0, 1, 2],
                render: RenderInfo {
                    method: 1,
                    flags: RenderInfo::HAS_UV_INFO | RenderInfo::HAS_UV_MAP,
                    uv_info: Some(UvInfo::default()),
                    uv_map: Some(UvMap::Projections(vec![UvInfo::default()])),
                    ..Default::default()
                },
            }],
        };
        let (decoded, bytes) = round_trip(&frag, 0x08);
        assert_eq!(decoded, frag);
        assert_eq!(&bytes[bytes.len() - 3..], &[0, 0, 0]);
    }

    #[test]
    fn test_sprite_4d_def_sprite_count_must_match() {
        let frag = Sprite4DDef {
            name_ref: names::offset("FIRE_SPRITE"),
            flags: 0x1F,
            frame_count: 2,
            polygon_ref: 0,
            center: Some([0.0; 3]),
            bounding_radius: Some(1.0),
            current_frame: Some(0),
            sleep: Some(50),
            sprite_refs: Some(vec![4, 5]),
        };
        assert_eq!(round_trip(&frag, 0x0A).0, frag);

        let bad = Sprite4DDef {
            sprite_refs: Some(vec![4]),
            ..frag
        };
        assert!(matches!(
            encode_only(&bad, 0x0A),
            Err(crate::Error::CountMismatch { field: "sprite_refs", expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn test_particle_sprite_def_round_trip() {
        let frag = ParticleSpriteDef {
            name_ref: names::offset("FIRE_SPRITE"),
            flags: ParticleSpriteDef::HAS_RADIUS,
            unknown: 0,
            center: None,
            bounding_radius: Some(2.0),
            vertices: vec![[1.0, 1.0, 1.0]],
            render: FullRenderInfo {
                method: 0x0B,
                uv_map: vec![[0.5, 0.5]],
                ..Default::default()
            },
        };
        assert_eq!(round_trip(&frag, 0x0C).0, frag);
    }

    #[test]
    fn test_hierarchical_sprite_def_skins() {
        let mut frag = HierarchicalSpriteDef {
            name_ref: names::offset("ELF_HS_DEF"),
            flags: 0,
            collision_volume_ref: 0,
            center: None,
            bounding_radius: None,
            dags: vec![
                Dag {
                    name_ref: names::offset("ELF_DAG"),
                    flags: 0,
                    track_ref: 3,
                    mesh_ref: 0,
                    sub_dags: vec![1],
                },
                Dag {
                    name_ref: NameRef::None,
                    flags: 0,
                    track_ref: 4,
                    mesh_ref: 2,
                    sub_dags: vec![],
                },
            ],
            skins: None,
            skin_links: None,
        };
        assert_eq!(round_trip(&frag, 0x10).0, frag);

        frag.flags = HierarchicalSpriteDef::HAS_SKINS | HierarchicalSpriteDef::HAS_RADIUS;
        frag.bounding_radius = Some(3.0);
        frag.skins = Some(vec![7, 8]);
        frag.skin_links = Some(vec![0, 1]);
        assert_eq!(round_trip(&frag, 0x10).0, frag);

        let mut names_seen = Vec::new();
        frag.extra_names(&mut names_seen);
        assert_eq!(names_seen, vec![names::offset("ELF_DAG"), NameRef::None]);
    }

    #[test]
    fn test_sprite_4d_def_single_sections() {
        let bare = Sprite4DDef {
            name_ref: names::offset("FIRE_SPRITE"),
            frame_count: 2,
            ..Default::default()
        };
        let cases = [
            Sprite4DDef {
                flags: Sprite4DDef::HAS_CENTER,
                center: Some([1.0, 2.0, 3.0]),
                ..bare.clone()
            },
            Sprite4DDef {
                flags: Sprite4DDef::HAS_RADIUS,
                bounding_radius: Some(1.0),
                ..bare.clone()
            },
            Sprite4DDef {
                flags: Sprite4DDef::HAS_CURRENT_FRAME,
                current_frame: Some(1),
                ..bare.clone()
            },
            Sprite4DDef {
                flags: Sprite4DDef::HAS_SLEEP,
                sleep: Some(50),
                ..bare.clone()
            },
            Sprite4DDef {
                flags: Sprite4DDef::HAS_SPRITES,
                sprite_refs: Some(vec![4, 5]),
                ..bare
            },
        ];
        for frag in cases {
            assert_eq!(round_trip(&frag, 0x0A).0, frag, "flags 0x{:02X}", frag.flags);
        }
    }

    #[test]
    fn test_particle_sprite_def_single_sections() {
        let bare = ParticleSpriteDef {
            name_ref: names::offset("FIRE_SPRITE"),
            vertices: vec![[0.0, 1.0, 0.0]],
            ..Default::default()
        };
        let center_only = ParticleSpriteDef {
            flags: ParticleSpriteDef::HAS_CENTER,
            center: Some([4.0, 5.0, 6.0]),
            ..bare.clone()
        };
        assert_eq!(round_trip(&center_only, 0x0C).0, center_only);

        let radius_only = ParticleSpriteDef {
            flags: ParticleSpriteDef::HAS_RADIUS,
            bounding_radius: Some(0.25),
            ..bare
        };
        assert_eq!(round_trip(&radius_only, 0x0C).0, radius_only);
    }

    #[test]
    fn test_hierarchical_sprite_def_single_sections() {
        let bare = HierarchicalSpriteDef {
            name_ref: names::offset("ELF_HS_DEF"),
            dags: vec![Dag {
                name_ref: names::offset("ELF_DAG"),
                track_ref: 3,
                ..Default::default()
            }],
            ..Default::default()
        };
        let cases = [
            HierarchicalSpriteDef {
                flags: HierarchicalSpriteDef::HAS_CENTER,
                center: Some([0.0, 0.0, 1.0]),
                ..bare.clone()
            },
            HierarchicalSpriteDef {
                flags: HierarchicalSpriteDef::HAS_RADIUS,
                bounding_radius: Some(6.0),
                ..bare.clone()
            },
            HierarchicalSpriteDef {
                flags: HierarchicalSpriteDef::HAS_SKINS,
                skins: Some(vec![9]),
                skin_links: Some(vec![0]),
                ..bare
            },
        ];
        for frag in cases {
            assert_eq!(round_trip(&frag, 0x10).0, frag, "flags 0x{:03X}", frag.flags);
        }
    }

    #[test]
    fn test_truncated_dag_list() {
        let frag = HierarchicalSpriteDef {
            name_ref: names::offset("ELF_HS_DEF"),
            dags: vec![Dag::default()],
            ..Default::default()
        };
        let bytes = encode_only(&frag, 0x10).unwrap();
        let err = decode_only::<HierarchicalSpriteDef>(&bytes[..bytes.len() - 2], 0x10).unwrap_err();
        assert!(matches!(err, crate::Error::FragmentTruncated { type_code: 0x10, .. }));
    }

    #[test]
    fn test_instance_records() {
        let frag = InstanceRef {
            name_ref: names::offset("FIRE_SPRITE"),
            reference: 6,
            flags: 0,
        };
        let (decoded, bytes) = round_trip(&frag, 0x07);
        assert_eq!(decoded, frag);
        assert_eq!(bytes.len(), 12);

        let frag = NamedFlags {
            name_ref: names::offset("FIRE_SPRITE"),
            flags: 0x10,
        };
        assert_eq!(round_trip(&frag, 0x0E).0, frag);
    }
}
