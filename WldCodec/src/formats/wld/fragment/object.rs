//! Actors, collision volumes and particle clouds

use super::FragmentLayout;
use super::render::gated;
use crate::error::Result;
use crate::formats::wld::hash::xor_name_bytes;
use crate::formats::wld::io::{FragmentReader, FragmentWriter};
use crate::formats::wld::name_table::NameRef;

/// Read a `u32` size followed by that many hashed bytes, when any payload is left.
pub(crate) fn read_hashed_block(r: &mut FragmentReader<'_>, field: &'static str) -> Result<Option<Vec<u8>>> {
    if r.remaining() < 4 {
        return Ok(None);
    }
    let size = r.u32(field)? as usize;
    let mut data = r.bytes(size, field)?;
    xor_name_bytes(&mut data);
    Ok(Some(data))
}

/// Write a `u32` size and the hashed bytes, padded to four bytes.
pub(crate) fn write_hashed_block(w: &mut FragmentWriter<'_>, data: Option<&Vec<u8>>, field: &'static str) -> Result<()> {
    let Some(data) = data else {
        return Ok(());
    };
    let mut hashed = data.clone();
    xor_name_bytes(&mut hashed);
    w.count_u32(hashed.len(), field)?;
    w.bytes(&hashed)?;
    w.pad_to_4()
}

/// One action of an actor: a ladder of level-of-detail distances.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActorAction {
    pub unknown: u32,
    pub lods: Vec<f32>,
}

/// Placement stored on `ActorDef` when flag 0x02 is set.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActorLocation {
    pub values: [f32; 6],
    pub unknown: u32,
}

/// 0x14 - object definition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActorDef {
    pub name_ref: NameRef,
    pub flags: u32,
    pub callback_ref: NameRef,
    pub bounds_ref: i32,
    /// 0x01
    pub current_action: Option<u32>,
    /// 0x02
    pub location: Option<ActorLocation>,
    pub actions: Vec<ActorAction>,
    /// Ordinals of the sprites this actor can show.
    pub sprite_refs: Vec<u32>,
    /// Decoded (un-hashed) user data, when the record carries the block.
    pub user_data: Option<Vec<u8>>,
}

impl ActorDef {
    pub const HAS_CURRENT_ACTION: u32 = 0x01;
    pub const HAS_LOCATION: u32 = 0x02;
}

impl FragmentLayout for ActorDef {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        let name_ref = r.name_ref("name_ref")?;
        let flags = r.u32("flags")?;
        let callback_ref = r.name_ref("callback_ref")?;
        let action_count = r.u32("action_count")? as usize;
        let sprite_count = r.u32("sprite_count")? as usize;
        let bounds_ref = r.i32("bounds_ref")?;
        let current_action = gated(flags & Self::HAS_CURRENT_ACTION, || r.u32("current_action"))?;
        let location = gated(flags & Self::HAS_LOCATION, || {
            let mut values = [0f32; 6];
            for v in &mut values {
                *v = r.f32("location")?;
            }
            Ok(ActorLocation {
                values,
                unknown: r.u32("location")?,
            })
        })?;
        let actions = r.array(action_count, 8, "actions", |r| {
            let lod_count = r.u32("lod_count")? as usize;
            let unknown = r.u32("action_unknown")?;
            let lods = r.array(lod_count, 4, "lods", |r| r.f32("lods"))?;
            Ok(ActorAction { unknown, lods })
        })?;
        let sprite_refs = r.u32_array(sprite_count, "sprite_refs")?;
        let user_data = read_hashed_block(r, "user_data")?;

        Ok(Self {
            name_ref,
            flags,
            callback_ref,
            bounds_ref,
            current_action,
            location,
            actions,
            sprite_refs,
            user_data,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.u32(self.flags)?;
        w.name_ref(self.callback_ref)?;
        w.count_u32(self.actions.len(), "action_count")?;
        w.count_u32(self.sprite_refs.len(), "sprite_count")?;
        w.i32(self.bounds_ref)?;
        if self.flags & Self::HAS_CURRENT_ACTION != 0 {
            w.u32(*w.section(&self.current_action, "current_action")?)?;
        }
        if self.flags & Self::HAS_LOCATION != 0 {
            let location = *w.section(&self.location, "location")?;
            location.values.iter().try_for_each(|&v| w.f32(v))?;
            w.u32(location.unknown)?;
        }
        for action in &self.actions {
            w.count_u32(action.lods.len(), "lod_count")?;
            w.u32(action.unknown)?;
            action.lods.iter().try_for_each(|&v| w.f32(v))?;
        }
        w.u32_array(&self.sprite_refs)?;
        write_hashed_block(w, self.user_data.as_ref(), "user_data")
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }

    fn extra_names(&self, out: &mut Vec<NameRef>) {
        out.push(self.callback_ref);
    }
}

/// What an `Actor` instance points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorDefRef {
    /// Named definition (also used for "no reference").
    Name(NameRef),
    /// Ordinal of an `ActorDef`.
    Ordinal(u32),
}

impl Default for ActorDefRef {
    fn default() -> Self {
        Self::Name(NameRef::None)
    }
}

/// Offset and rotation stored on `Actor` when flag 0x02 is set.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActorPlacement {
    pub offset: [f32; 3],
    pub rotation: [f32; 3],
    pub unknown: u32,
}

/// 0x15 - object instance.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Actor {
    pub name_ref: NameRef,
    pub actor_def: ActorDefRef,
    pub flags: u32,
    pub sphere_ref: u32,
    /// 0x01
    pub current_action: Option<u32>,
    /// 0x02
    pub placement: Option<ActorPlacement>,
    /// 0x04
    pub bounding_radius: Option<f32>,
    /// 0x08
    pub scale: Option<f32>,
    /// 0x10
    pub sound_ref: Option<NameRef>,
    pub user_data_size: i32,
}

impl Actor {
    pub const HAS_CURRENT_ACTION: u32 = 0x01;
    pub const HAS_PLACEMENT: u32 = 0x02;
    pub const HAS_RADIUS: u32 = 0x04;
    pub const HAS_SCALE: u32 = 0x08;
    pub const HAS_SOUND: u32 = 0x10;
}

impl FragmentLayout for Actor {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        let name_ref = r.name_ref("name_ref")?;
        let raw_def = r.i32("actor_def_ref")?;
        let actor_def = if raw_def > 0 {
            ActorDefRef::Ordinal(raw_def as u32)
        } else {
            ActorDefRef::Name(r.name_from_raw(raw_def)?)
        };
        let flags = r.u32("flags")?;
        let sphere_ref = r.u32("sphere_ref")?;
        let current_action = gated(flags & Self::HAS_CURRENT_ACTION, || r.u32("current_action"))?;
        let placement = gated(flags & Self::HAS_PLACEMENT, || {
            Ok(ActorPlacement {
                offset: r.vec3("offset")?,
                rotation: r.vec3("rotation")?,
                unknown: r.u32("placement_unknown")?,
            })
        })?;
        let bounding_radius = gated(flags & Self::HAS_RADIUS, || r.f32("bounding_radius"))?;
        let scale = gated(flags & Self::HAS_SCALE, || r.f32("scale"))?;
        let sound_ref = gated(flags & Self::HAS_SOUND, || r.name_ref("sound_ref"))?;
        let user_data_size = r.i32("user_data_size")?;

        Ok(Self {
            name_ref,
            actor_def,
            flags,
            sphere_ref,
            current_action,
            placement,
            bounding_radius,
            scale,
            sound_ref,
            user_data_size,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        match self.actor_def {
            ActorDefRef::Name(name) => w.name_ref(name)?,
            ActorDefRef::Ordinal(ordinal) => {
                let raw = i32::try_from(ordinal)
                    .ok()
                    .filter(|&v| v > 0)
                    .ok_or_else(|| w.out_of_range("actor_def_ref", i64::from(ordinal)))?;
                w.i32(raw)?;
            }
        }
        w.u32(self.flags)?;
        w.u32(self.sphere_ref)?;
        if self.flags & Self::HAS_CURRENT_ACTION != 0 {
            w.u32(*w.section(&self.current_action, "current_action")?)?;
        }
        if self.flags & Self::HAS_PLACEMENT != 0 {
            let placement = *w.section(&self.placement, "placement")?;
            w.vec3(placement.offset)?;
            w.vec3(placement.rotation)?;
            w.u32(placement.unknown)?;
        }
        if self.flags & Self::HAS_RADIUS != 0 {
            w.f32(*w.section(&self.bounding_radius, "bounding_radius")?)?;
        }
        if self.flags & Self::HAS_SCALE != 0 {
            w.f32(*w.section(&self.scale, "scale")?)?;
        }
        if self.flags & Self::HAS_SOUND != 0 {
            w.name_ref(*w.section(&self.sound_ref, "sound_ref")?)?;
        }
        w.i32(self.user_data_size)
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }

    fn extra_names(&self, out: &mut Vec<NameRef>) {
        if let ActorDefRef::Name(name) = self.actor_def {
            out.push(name);
        }
        out.extend(self.sound_ref);
    }
}

/// 0x16 - collision sphere.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sphere {
    pub name_ref: NameRef,
    pub radius: f32,
}

impl FragmentLayout for Sphere {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        Ok(Self {
            name_ref: r.name_ref("name_ref")?,
            radius: r.f32("radius")?,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.f32(self.radius)
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}

/// A face of a `PolyhedronDef`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PolyhedronFace {
    pub vertex_indices: Vec<u32>,
}

/// 0x17 - convex collision volume.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolyhedronDef {
    pub name_ref: NameRef,
    pub flags: u32,
    pub bounding_radius: f32,
    pub scale_factor: f32,
    pub vertices: Vec<[f32; 3]>,
    pub faces: Vec<PolyhedronFace>,
}

impl FragmentLayout for PolyhedronDef {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        let name_ref = r.name_ref("name_ref")?;
        let flags = r.u32("flags")?;
        let vertex_count = r.u32("vertex_count")? as usize;
        let face_count = r.u32("face_count")? as usize;
        let bounding_radius = r.f32("bounding_radius")?;
        let scale_factor = r.f32("scale_factor")?;
        let vertices = r.vec3_array(vertex_count, "vertices")?;
        let faces = r.array(face_count, 4, "faces", |r| {
            let count = r.u32("face_vertex_count")? as usize;
            Ok(PolyhedronFace {
                vertex_indices: r.u32_array(count, "face_vertex_indices")?,
            })
        })?;
        Ok(Self {
            name_ref,
            flags,
            bounding_radius,
            scale_factor,
            vertices,
            faces,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.u32(self.flags)?;
        w.count_u32(self.vertices.len(), "vertex_count")?;
        w.count_u32(self.faces.len(), "face_count")?;
        w.f32(self.bounding_radius)?;
        w.f32(self.scale_factor)?;
        w.vec3_array(&self.vertices)?;
        for face in &self.faces {
            w.count_u32(face.vertex_indices.len(), "face_vertex_count")?;
            w.u32_array(&face.vertex_indices)?;
        }
        Ok(())
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}

/// 0x18 - polyhedron instance.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polyhedron {
    pub name_ref: NameRef,
    pub polyhedron_def_ref: i32,
    pub flags: u32,
    pub scale: f32,
}

impl FragmentLayout for Polyhedron {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        Ok(Self {
            name_ref: r.name_ref("name_ref")?,
            polyhedron_def_ref: r.i32("polyhedron_def_ref")?,
            flags: r.u32("flags")?,
            scale: r.f32("scale")?,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.i32(self.polyhedron_def_ref)?;
        w.u32(self.flags)?;
        w.f32(self.scale)
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}

/// 0x19 - group of collision spheres.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SphereListDef {
    pub name_ref: NameRef,
    pub flags: u32,
    pub bounding_radius: f32,
    pub scale: f32,
    /// Center and radius of each sphere.
    pub spheres: Vec<[f32; 4]>,
}

impl FragmentLayout for SphereListDef {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        let name_ref = r.name_ref("name_ref")?;
        let flags = r.u32("flags")?;
        let count = r.u32("sphere_count")? as usize;
        let bounding_radius = r.f32("bounding_radius")?;
        let scale = r.f32("scale")?;
        let spheres = r.array(count, 16, "spheres", |r| r.vec4("spheres"))?;
        Ok(Self {
            name_ref,
            flags,
            bounding_radius,
            scale,
            spheres,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.u32(self.flags)?;
        w.count_u32(self.spheres.len(), "sphere_count")?;
        w.f32(self.bounding_radius)?;
        w.f32(self.scale)?;
        self.spheres.iter().try_for_each(|&s| w.vec4(s))
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}

/// 0x34 - particle emitter parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParticleCloudDef {
    pub name_ref: NameRef,
    pub unknown1: u32,
    pub unknown2: u32,
    pub movement: u32,
    pub flags: u32,
    pub simultaneous_particles: u32,
    pub unknown6: u32,
    pub unknown7: u32,
    pub unknown8: u32,
    pub unknown9: u32,
    pub unknown10: u32,
    pub spawn_radius: f32,
    pub spawn_angle: f32,
    pub spawn_lifespan: u32,
    pub spawn_velocity: f32,
    /// Spawn normal, stored z, x, y.
    pub spawn_normal_zxy: [f32; 3],
    pub spawn_rate: u32,
    pub spawn_scale: f32,
    pub color: [u8; 4],
    /// Ordinal of the particle sprite.
    pub particle_ref: u32,
}

impl FragmentLayout for ParticleCloudDef {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        Ok(Self {
            name_ref: r.name_ref("name_ref")?,
            unknown1: r.u32("unknown1")?,
            unknown2: r.u32("unknown2")?,
            movement: r.u32("movement")?,
            flags: r.u32("flags")?,
            simultaneous_particles: r.u32("simultaneous_particles")?,
            unknown6: r.u32("unknown6")?,
            unknown7: r.u32("unknown7")?,
            unknown8: r.u32("unknown8")?,
            unknown9: r.u32("unknown9")?,
            unknown10: r.u32("unknown10")?,
            spawn_radius: r.f32("spawn_radius")?,
            spawn_angle: r.f32("spawn_angle")?,
            spawn_lifespan: r.u32("spawn_lifespan")?,
            spawn_velocity: r.f32("spawn_velocity")?,
            spawn_normal_zxy: r.vec3("spawn_normal")?,
            spawn_rate: r.u32("spawn_rate")?,
            spawn_scale: r.f32("spawn_scale")?,
            color: [r.u8("color")?, r.u8("color")?, r.u8("color")?, r.u8("color")?],
            particle_ref: r.u32("particle_ref")?,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        for value in [
            self.unknown1,
            self.unknown2,
            self.movement,
            self.flags,
            self.simultaneous_particles,
            self.unknown6,
            self.unknown7,
            self.unknown8,
            self.unknown9,
            self.unknown10,
        ] {
            w.u32(value)?;
        }
        w.f32(self.spawn_radius)?;
        w.f32(self.spawn_angle)?;
        w.u32(self.spawn_lifespan)?;
        w.f32(self.spawn_velocity)?;
        w.vec3(self.spawn_normal_zxy)?;
        w.u32(self.spawn_rate)?;
        w.f32(self.spawn_scale)?;
        w.bytes(&self.color)?;
        w.u32(self.particle_ref)
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}
