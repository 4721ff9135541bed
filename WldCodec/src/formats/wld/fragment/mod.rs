//! Fragment registry
//!
//! Every record in a world file is one [`Fragment`]. The type code selects
//! the layout; each layout lives in a submodule grouped by what it
//! describes. Dispatch is an exhaustive `match`, so adding a type code
//! without a layout does not compile.

mod animation;
mod light;
mod material;
mod mesh;
mod object;
mod opaque;
mod region;
mod render;
mod sprite;

use std::fmt;

pub use animation::{DmRgbTrackDef, DmTrackDef2, Track, TrackDef, TrackFrame};
pub use light::{AmbientLight, GlobalAmbientLightDef, LightDef, PointLight, PointLightOldDef};
pub use material::{BlitSpriteDef, BmInfo, DefaultPaletteFile, MaterialDef, MaterialPalette, SimpleSprite, SimpleSpriteDef};
pub use mesh::{DmSpriteDef, DmSpriteDef2, LegacyPolygon, MeshFace, MeshOp, MeshOpValue, RunGroup};
pub use object::{
    Actor, ActorAction, ActorDef, ActorDefRef, ActorLocation, ActorPlacement, ParticleCloudDef, Polyhedron,
    PolyhedronDef, PolyhedronFace, Sphere, SphereListDef,
};
pub use opaque::Opaque;
pub use region::{Obstacle, Region, VisList, VisNode, Wall, WorldNode, WorldTree, Zone};
pub use render::{FullRenderInfo, RenderInfo, UvInfo, UvMap};
pub use sprite::{
    BspNode, Dag, HierarchicalSpriteDef, InstanceRef, NamedFlags, ParticleSpriteDef, Sprite2DDef, Sprite3DDef,
    Sprite4DDef,
};

use super::io::{DecodeContext, EncodeContext, FragmentReader, FragmentWriter};
use super::name_table::NameRef;
use crate::error::{Error, Result};

/// Binary layout of one fragment body.
pub(crate) trait FragmentLayout {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self>
    where
        Self: Sized;

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()>;

    /// The fragment's own name.
    fn name_ref(&self) -> NameRef;

    /// Name slots beyond the fragment's own name.
    fn extra_names(&self, _out: &mut Vec<NameRef>) {}
}

/// Type code of a fragment.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FragmentType {
    Default = 0x00,
    DefaultPaletteFile = 0x01,
    UserData = 0x02,
    BmInfo = 0x03,
    SimpleSpriteDef = 0x04,
    SimpleSprite = 0x05,
    Sprite2DDef = 0x06,
    Sprite2D = 0x07,
    Sprite3DDef = 0x08,
    Sprite3D = 0x09,
    Sprite4DDef = 0x0A,
    Sprite4D = 0x0B,
    ParticleSpriteDef = 0x0C,
    ParticleSprite = 0x0D,
    CompositeSpriteDef = 0x0E,
    CompositeSprite = 0x0F,
    HierarchicalSpriteDef = 0x10,
    HierarchicalSprite = 0x11,
    TrackDef = 0x12,
    Track = 0x13,
    ActorDef = 0x14,
    Actor = 0x15,
    Sphere = 0x16,
    PolyhedronDef = 0x17,
    Polyhedron = 0x18,
    SphereListDef = 0x19,
    SphereList = 0x1A,
    LightDef = 0x1B,
    Light = 0x1C,
    PointLightOld = 0x1D,
    PointLightOldDef = 0x1E,
    Sound = 0x1F,
    SoundDef = 0x20,
    WorldTree = 0x21,
    Region = 0x22,
    ActiveGeoRegion = 0x23,
    SkyRegion = 0x24,
    DirectionalLightOld = 0x25,
    BlitSpriteDef = 0x26,
    BlitSprite = 0x27,
    PointLight = 0x28,
    Zone = 0x29,
    AmbientLight = 0x2A,
    DirectionalLight = 0x2B,
    DmSpriteDef = 0x2C,
    DmSprite = 0x2D,
    DmTrackDef = 0x2E,
    DmTrack = 0x2F,
    MaterialDef = 0x30,
    MaterialPalette = 0x31,
    DmRgbTrackDef = 0x32,
    DmRgbTrack = 0x33,
    ParticleCloudDef = 0x34,
    GlobalAmbientLightDef = 0x35,
    DmSpriteDef2 = 0x36,
    DmTrackDef2 = 0x37,
}

impl FragmentType {
    /// Every type code in ascending order.
    pub const ALL: [Self; 56] = [
        Self::Default,
        Self::DefaultPaletteFile,
        Self::UserData,
        Self::BmInfo,
        Self::SimpleSpriteDef,
        Self::SimpleSprite,
        Self::Sprite2DDef,
        Self::Sprite2D,
        Self::Sprite3DDef,
        Self::Sprite3D,
        Self::Sprite4DDef,
        Self::Sprite4D,
        Self::ParticleSpriteDef,
        Self::ParticleSprite,
        Self::CompositeSpriteDef,
        Self::CompositeSprite,
        Self::HierarchicalSpriteDef,
        Self::HierarchicalSprite,
        Self::TrackDef,
        Self::Track,
        Self::ActorDef,
        Self::Actor,
        Self::Sphere,
        Self::PolyhedronDef,
        Self::Polyhedron,
        Self::SphereListDef,
        Self::SphereList,
        Self::LightDef,
        Self::Light,
        Self::PointLightOld,
        Self::PointLightOldDef,
        Self::Sound,
        Self::SoundDef,
        Self::WorldTree,
        Self::Region,
        Self::ActiveGeoRegion,
        Self::SkyRegion,
        Self::DirectionalLightOld,
        Self::BlitSpriteDef,
        Self::BlitSprite,
        Self::PointLight,
        Self::Zone,
        Self::AmbientLight,
        Self::DirectionalLight,
        Self::DmSpriteDef,
        Self::DmSprite,
        Self::DmTrackDef,
        Self::DmTrack,
        Self::MaterialDef,
        Self::MaterialPalette,
        Self::DmRgbTrackDef,
        Self::DmRgbTrack,
        Self::ParticleCloudDef,
        Self::GlobalAmbientLightDef,
        Self::DmSpriteDef2,
        Self::DmTrackDef2,
    ];

    #[must_use]
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Human-readable name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::DefaultPaletteFile => "DefaultPaletteFile",
            Self::UserData => "UserData",
            Self::BmInfo => "BmInfo",
            Self::SimpleSpriteDef => "SimpleSpriteDef",
            Self::SimpleSprite => "SimpleSprite",
            Self::Sprite2DDef => "Sprite2DDef",
            Self::Sprite2D => "Sprite2D",
            Self::Sprite3DDef => "Sprite3DDef",
            Self::Sprite3D => "Sprite3D",
            Self::Sprite4DDef => "Sprite4DDef",
            Self::Sprite4D => "Sprite4D",
            Self::ParticleSpriteDef => "ParticleSpriteDef",
            Self::ParticleSprite => "ParticleSprite",
            Self::CompositeSpriteDef => "CompositeSpriteDef",
            Self::CompositeSprite => "CompositeSprite",
            Self::HierarchicalSpriteDef => "HierarchicalSpriteDef",
            Self::HierarchicalSprite => "HierarchicalSprite",
            Self::TrackDef => "TrackDef",
            Self::Track => "Track",
            Self::ActorDef => "ActorDef",
            Self::Actor => "Actor",
            Self::Sphere => "Sphere",
            Self::PolyhedronDef => "PolyhedronDef",
            Self::Polyhedron => "Polyhedron",
            Self::SphereListDef => "SphereListDef",
            Self::SphereList => "SphereList",
            Self::LightDef => "LightDef",
            Self::Light => "Light",
            Self::PointLightOld => "PointLightOld",
            Self::PointLightOldDef => "PointLightOldDef",
            Self::Sound => "Sound",
            Self::SoundDef => "SoundDef",
            Self::WorldTree => "WorldTree",
            Self::Region => "Region",
            Self::ActiveGeoRegion => "ActiveGeoRegion",
            Self::SkyRegion => "SkyRegion",
            Self::DirectionalLightOld => "DirectionalLightOld",
            Self::BlitSpriteDef => "BlitSpriteDef",
            Self::BlitSprite => "BlitSprite",
            Self::PointLight => "PointLight",
            Self::Zone => "Zone",
            Self::AmbientLight => "AmbientLight",
            Self::DirectionalLight => "DirectionalLight",
            Self::DmSpriteDef => "DmSpriteDef",
            Self::DmSprite => "DmSprite",
            Self::DmTrackDef => "DmTrackDef",
            Self::DmTrack => "DmTrack",
            Self::MaterialDef => "MaterialDef",
            Self::MaterialPalette => "MaterialPalette",
            Self::DmRgbTrackDef => "DmRgbTrackDef",
            Self::DmRgbTrack => "DmRgbTrack",
            Self::ParticleCloudDef => "ParticleCloudDef",
            Self::GlobalAmbientLightDef => "GlobalAmbientLightDef",
            Self::DmSpriteDef2 => "DmSpriteDef2",
            Self::DmTrackDef2 => "DmTrackDef2",
        }
    }
}

impl TryFrom<u32> for FragmentType {
    type Error = u32;

    fn try_from(code: u32) -> std::result::Result<Self, u32> {
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(code)
    }
}

impl fmt::Display for FragmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.name(), self.code())
    }
}

/// One decoded record.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Default(Opaque),
    DefaultPaletteFile(DefaultPaletteFile),
    UserData(Opaque),
    BmInfo(BmInfo),
    SimpleSpriteDef(SimpleSpriteDef),
    SimpleSprite(SimpleSprite),
    Sprite2DDef(Sprite2DDef),
    Sprite2D(InstanceRef),
    Sprite3DDef(Sprite3DDef),
    Sprite3D(InstanceRef),
    Sprite4DDef(Sprite4DDef),
    Sprite4D(InstanceRef),
    ParticleSpriteDef(ParticleSpriteDef),
    ParticleSprite(InstanceRef),
    CompositeSpriteDef(NamedFlags),
    CompositeSprite(InstanceRef),
    HierarchicalSpriteDef(HierarchicalSpriteDef),
    HierarchicalSprite(InstanceRef),
    TrackDef(TrackDef),
    Track(Track),
    ActorDef(ActorDef),
    Actor(Actor),
    Sphere(Sphere),
    PolyhedronDef(PolyhedronDef),
    Polyhedron(Polyhedron),
    SphereListDef(SphereListDef),
    SphereList(InstanceRef),
    LightDef(LightDef),
    Light(InstanceRef),
    PointLightOld(NamedFlags),
    PointLightOldDef(PointLightOldDef),
    Sound(NamedFlags),
    SoundDef(NamedFlags),
    WorldTree(WorldTree),
    Region(Region),
    ActiveGeoRegion(Opaque),
    SkyRegion(Opaque),
    DirectionalLightOld(Opaque),
    BlitSpriteDef(BlitSpriteDef),
    BlitSprite(Opaque),
    PointLight(PointLight),
    Zone(Zone),
    AmbientLight(AmbientLight),
    DirectionalLight(Opaque),
    DmSpriteDef(DmSpriteDef),
    DmSprite(InstanceRef),
    DmTrackDef(Opaque),
    DmTrack(InstanceRef),
    MaterialDef(MaterialDef),
    MaterialPalette(MaterialPalette),
    DmRgbTrackDef(DmRgbTrackDef),
    DmRgbTrack(InstanceRef),
    ParticleCloudDef(ParticleCloudDef),
    GlobalAmbientLightDef(GlobalAmbientLightDef),
    DmSpriteDef2(DmSpriteDef2),
    DmTrackDef2(DmTrackDef2),
}

impl Fragment {
    /// Decode one record payload.
    ///
    /// # Errors
    /// `UnknownFragmentType` for codes outside 0x00-0x37, otherwise any
    /// field-level error of the selected layout.
    pub fn decode(type_code: u32, payload: &[u8], ctx: &DecodeContext<'_>) -> Result<Self> {
        let kind = FragmentType::try_from(type_code).map_err(|code| Error::UnknownFragmentType {
            ordinal: ctx.ordinal,
            code: code as i32,
        })?;
        let r = &mut FragmentReader::new(payload, type_code, ctx);

        let fragment = match kind {
            FragmentType::Default => Self::Default(Opaque::decode(r)?),
            FragmentType::DefaultPaletteFile => Self::DefaultPaletteFile(DefaultPaletteFile::decode(r)?),
            FragmentType::UserData => Self::UserData(Opaque::decode(r)?),
            FragmentType::BmInfo => Self::BmInfo(BmInfo::decode(r)?),
            FragmentType::SimpleSpriteDef => Self::SimpleSpriteDef(SimpleSpriteDef::decode(r)?),
            FragmentType::SimpleSprite => Self::SimpleSprite(SimpleSprite::decode(r)?),
            FragmentType::Sprite2DDef => Self::Sprite2DDef(Sprite2DDef::decode(r)?),
            FragmentType::Sprite2D => Self::Sprite2D(InstanceRef::decode(r)?),
            FragmentType::Sprite3DDef => Self::Sprite3DDef(Sprite3DDef::decode(r)?),
            FragmentType::Sprite3D => Self::Sprite3D(InstanceRef::decode(r)?),
            FragmentType::Sprite4DDef => Self::Sprite4DDef(Sprite4DDef::decode(r)?),
            FragmentType::Sprite4D => Self::Sprite4D(InstanceRef::decode(r)?),
            FragmentType::ParticleSpriteDef => Self::ParticleSpriteDef(ParticleSpriteDef::decode(r)?),
            FragmentType::ParticleSprite => Self::ParticleSprite(InstanceRef::decode(r)?),
            FragmentType::CompositeSpriteDef => Self::CompositeSpriteDef(NamedFlags::decode(r)?),
            FragmentType::CompositeSprite => Self::CompositeSprite(InstanceRef::decode(r)?),
            FragmentType::HierarchicalSpriteDef => Self::HierarchicalSpriteDef(HierarchicalSpriteDef::decode(r)?),
            FragmentType::HierarchicalSprite => Self::HierarchicalSprite(InstanceRef::decode(r)?),
            FragmentType::TrackDef => Self::TrackDef(TrackDef::decode(r)?),
            FragmentType::Track => Self::Track(Track::decode(r)?),
            FragmentType::ActorDef => Self::ActorDef(ActorDef::decode(r)?),
            FragmentType::Actor => Self::Actor(Actor::decode(r)?),
            FragmentType::Sphere => Self::Sphere(Sphere::decode(r)?),
            FragmentType::PolyhedronDef => Self::PolyhedronDef(PolyhedronDef::decode(r)?),
            FragmentType::Polyhedron => Self::Polyhedron(Polyhedron::decode(r)?),
            FragmentType::SphereListDef => Self::SphereListDef(SphereListDef::decode(r)?),
            FragmentType::SphereList => Self::SphereList(InstanceRef::decode(r)?),
            FragmentType::LightDef => Self::LightDef(LightDef::decode(r)?),
            FragmentType::Light => Self::Light(InstanceRef::decode(r)?),
            FragmentType::PointLightOld => Self::PointLightOld(NamedFlags::decode(r)?),
            FragmentType::PointLightOldDef => Self::PointLightOldDef(PointLightOldDef::decode(r)?),
            FragmentType::Sound => Self::Sound(NamedFlags::decode(r)?),
            FragmentType::SoundDef => Self::SoundDef(NamedFlags::decode(r)?),
            FragmentType::WorldTree => Self::WorldTree(WorldTree::decode(r)?),
            FragmentType::Region => Self::Region(Region::decode(r)?),
            FragmentType::ActiveGeoRegion => Self::ActiveGeoRegion(Opaque::decode(r)?),
            FragmentType::SkyRegion => Self::SkyRegion(Opaque::decode(r)?),
            FragmentType::DirectionalLightOld => Self::DirectionalLightOld(Opaque::decode(r)?),
            FragmentType::BlitSpriteDef => Self::BlitSpriteDef(BlitSpriteDef::decode(r)?),
            FragmentType::BlitSprite => Self::BlitSprite(Opaque::decode(r)?),
            FragmentType::PointLight => Self::PointLight(PointLight::decode(r)?),
            FragmentType::Zone => Self::Zone(Zone::decode(r)?),
            FragmentType::AmbientLight => Self::AmbientLight(AmbientLight::decode(r)?),
            FragmentType::DirectionalLight => Self::DirectionalLight(Opaque::decode(r)?),
            FragmentType::DmSpriteDef => Self::DmSpriteDef(DmSpriteDef::decode(r)?),
            FragmentType::DmSprite => Self::DmSprite(InstanceRef::decode(r)?),
            FragmentType::DmTrackDef => Self::DmTrackDef(Opaque::decode(r)?),
            FragmentType::DmTrack => Self::DmTrack(InstanceRef::decode(r)?),
            FragmentType::MaterialDef => Self::MaterialDef(MaterialDef::decode(r)?),
            FragmentType::MaterialPalette => Self::MaterialPalette(MaterialPalette::decode(r)?),
            FragmentType::DmRgbTrackDef => Self::DmRgbTrackDef(DmRgbTrackDef::decode(r)?),
            FragmentType::DmRgbTrack => Self::DmRgbTrack(InstanceRef::decode(r)?),
            FragmentType::ParticleCloudDef => Self::ParticleCloudDef(ParticleCloudDef::decode(r)?),
            FragmentType::GlobalAmbientLightDef => Self::GlobalAmbientLightDef(GlobalAmbientLightDef::decode(r)?),
            FragmentType::DmSpriteDef2 => Self::DmSpriteDef2(DmSpriteDef2::decode(r)?),
            FragmentType::DmTrackDef2 => Self::DmTrackDef2(DmTrackDef2::decode(r)?),
        };
        if r.remaining() > 0 {
            tracing::trace!(
                "Fragment {} ({}): {} trailing bytes ignored",
                ctx.ordinal,
                kind,
                r.remaining()
            );
        }
        Ok(fragment)
    }

    /// Encode into `(type_code, payload)`.
    ///
    /// # Errors
    /// `MissingSection`, `CountMismatch` or `FieldOverflow` when the fields
    /// disagree with the flags or do not fit, `NameNotFound` when a name is
    /// missing from the output table.
    pub fn encode(&self, ctx: &EncodeContext<'_>) -> Result<(u32, Vec<u8>)> {
        let type_code = self.type_code();
        let mut w = FragmentWriter::new(type_code, ctx);
        self.layout().encode(&mut w)?;
        Ok((type_code, w.finish()))
    }

    #[must_use]
    pub fn fragment_type(&self) -> FragmentType {
        match self {
            Self::Default(_) => FragmentType::Default,
            Self::DefaultPaletteFile(_) => FragmentType::DefaultPaletteFile,
            Self::UserData(_) => FragmentType::UserData,
            Self::BmInfo(_) => FragmentType::BmInfo,
            Self::SimpleSpriteDef(_) => FragmentType::SimpleSpriteDef,
            Self::SimpleSprite(_) => FragmentType::SimpleSprite,
            Self::Sprite2DDef(_) => FragmentType::Sprite2DDef,
            Self::Sprite2D(_) => FragmentType::Sprite2D,
            Self::Sprite3DDef(_) => FragmentType::Sprite3DDef,
            Self::Sprite3D(_) => FragmentType::Sprite3D,
            Self::Sprite4DDef(_) => FragmentType::Sprite4DDef,
            Self::Sprite4D(_) => FragmentType::Sprite4D,
            Self::ParticleSpriteDef(_) => FragmentType::ParticleSpriteDef,
            Self::ParticleSprite(_) => FragmentType::ParticleSprite,
            Self::CompositeSpriteDef(_) => FragmentType::CompositeSpriteDef,
            Self::CompositeSprite(_) => FragmentType::CompositeSprite,
            Self::HierarchicalSpriteDef(_) => FragmentType::HierarchicalSpriteDef,
            Self::HierarchicalSprite(_) => FragmentType::HierarchicalSprite,
            Self::TrackDef(_) => FragmentType::TrackDef,
            Self::Track(_) => FragmentType::Track,
            Self::ActorDef(_) => FragmentType::ActorDef,
            Self::Actor(_) => FragmentType::Actor,
            Self::Sphere(_) => FragmentType::Sphere,
            Self::PolyhedronDef(_) => FragmentType::PolyhedronDef,
            Self::Polyhedron(_) => FragmentType::Polyhedron,
            Self::SphereListDef(_) => FragmentType::SphereListDef,
            Self::SphereList(_) => FragmentType::SphereList,
            Self::LightDef(_) => FragmentType::LightDef,
            Self::Light(_) => FragmentType::Light,
            Self::PointLightOld(_) => FragmentType::PointLightOld,
            Self::PointLightOldDef(_) => FragmentType::PointLightOldDef,
            Self::Sound(_) => FragmentType::Sound,
            Self::SoundDef(_) => FragmentType::SoundDef,
            Self::WorldTree(_) => FragmentType::WorldTree,
            Self::Region(_) => FragmentType::Region,
            Self::ActiveGeoRegion(_) => FragmentType::ActiveGeoRegion,
            Self::SkyRegion(_) => FragmentType::SkyRegion,
            Self::DirectionalLightOld(_) => FragmentType::DirectionalLightOld,
            Self::BlitSpriteDef(_) => FragmentType::BlitSpriteDef,
            Self::BlitSprite(_) => FragmentType::BlitSprite,
            Self::PointLight(_) => FragmentType::PointLight,
            Self::Zone(_) => FragmentType::Zone,
            Self::AmbientLight(_) => FragmentType::AmbientLight,
            Self::DirectionalLight(_) => FragmentType::DirectionalLight,
            Self::DmSpriteDef(_) => FragmentType::DmSpriteDef,
            Self::DmSprite(_) => FragmentType::DmSprite,
            Self::DmTrackDef(_) => FragmentType::DmTrackDef,
            Self::DmTrack(_) => FragmentType::DmTrack,
            Self::MaterialDef(_) => FragmentType::MaterialDef,
            Self::MaterialPalette(_) => FragmentType::MaterialPalette,
            Self::DmRgbTrackDef(_) => FragmentType::DmRgbTrackDef,
            Self::DmRgbTrack(_) => FragmentType::DmRgbTrack,
            Self::ParticleCloudDef(_) => FragmentType::ParticleCloudDef,
            Self::GlobalAmbientLightDef(_) => FragmentType::GlobalAmbientLightDef,
            Self::DmSpriteDef2(_) => FragmentType::DmSpriteDef2,
            Self::DmTrackDef2(_) => FragmentType::DmTrackDef2,
        }
    }

    #[must_use]
    pub fn type_code(&self) -> u32 {
        self.fragment_type().code()
    }

    fn layout(&self) -> &dyn FragmentLayout {
        match self {
            Self::Default(f)
            | Self::UserData(f)
            | Self::ActiveGeoRegion(f)
            | Self::SkyRegion(f)
            | Self::DirectionalLightOld(f)
            | Self::BlitSprite(f)
            | Self::DirectionalLight(f)
            | Self::DmTrackDef(f) => f,
            Self::Sprite2D(f)
            | Self::Sprite3D(f)
            | Self::Sprite4D(f)
            | Self::ParticleSprite(f)
            | Self::CompositeSprite(f)
            | Self::HierarchicalSprite(f)
            | Self::SphereList(f)
            | Self::Light(f)
            | Self::DmSprite(f)
            | Self::DmTrack(f)
            | Self::DmRgbTrack(f) => f,
            Self::CompositeSpriteDef(f) | Self::PointLightOld(f) | Self::Sound(f) | Self::SoundDef(f) => f,
            Self::DefaultPaletteFile(f) => f,
            Self::BmInfo(f) => f,
            Self::SimpleSpriteDef(f) => f,
            Self::SimpleSprite(f) => f,
            Self::Sprite2DDef(f) => f,
            Self::Sprite3DDef(f) => f,
            Self::Sprite4DDef(f) => f,
            Self::ParticleSpriteDef(f) => f,
            Self::HierarchicalSpriteDef(f) => f,
            Self::TrackDef(f) => f,
            Self::Track(f) => f,
            Self::ActorDef(f) => f,
            Self::Actor(f) => f,
            Self::Sphere(f) => f,
            Self::PolyhedronDef(f) => f,
            Self::Polyhedron(f) => f,
            Self::SphereListDef(f) => f,
            Self::LightDef(f) => f,
            Self::PointLightOldDef(f) => f,
            Self::WorldTree(f) => f,
            Self::Region(f) => f,
            Self::BlitSpriteDef(f) => f,
            Self::PointLight(f) => f,
            Self::Zone(f) => f,
            Self::AmbientLight(f) => f,
            Self::MaterialDef(f) => f,
            Self::MaterialPalette(f) => f,
            Self::DmRgbTrackDef(f) => f,
            Self::ParticleCloudDef(f) => f,
            Self::GlobalAmbientLightDef(f) => f,
            Self::DmSpriteDef(f) => f,
            Self::DmSpriteDef2(f) => f,
            Self::DmTrackDef2(f) => f,
        }
    }

    /// The fragment's own name.
    #[must_use]
    pub fn name_ref(&self) -> NameRef {
        self.layout().name_ref()
    }

    /// Call `visit` for every name slot, own name first.
    pub fn visit_names(&self, mut visit: impl FnMut(NameRef)) {
        let layout = self.layout();
        visit(layout.name_ref());
        let mut extra = Vec::new();
        layout.extra_names(&mut extra);
        extra.into_iter().for_each(visit);
    }

    /// Every name slot, own name first.
    #[must_use]
    pub fn name_refs(&self) -> Vec<NameRef> {
        let mut names = Vec::new();
        self.visit_names(|name| names.push(name));
        names
    }
}
