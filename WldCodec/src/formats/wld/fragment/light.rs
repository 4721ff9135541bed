//! Light sources and their placements

use super::FragmentLayout;
use super::render::gated;
use crate::error::Result;
use crate::formats::wld::io::{FragmentReader, FragmentWriter};
use crate::formats::wld::name_table::NameRef;

/// 0x1B - light source, optionally animated over several frames.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LightDef {
    pub name_ref: NameRef,
    pub flags: u32,
    pub frame_count: u32,
    /// 0x01
    pub current_frame: Option<u32>,
    /// 0x02
    pub sleep: Option<u32>,
    /// 0x04, `frame_count` entries.
    pub light_levels: Option<Vec<f32>>,
    /// 0x10, `frame_count` entries.
    pub colors: Option<Vec<[f32; 3]>>,
}

impl LightDef {
    pub const HAS_CURRENT_FRAME: u32 = 0x01;
    pub const HAS_SLEEP: u32 = 0x02;
    pub const HAS_LIGHT_LEVELS: u32 = 0x04;
    pub const HAS_COLORS: u32 = 0x10;
}

impl FragmentLayout for LightDef {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        let name_ref = r.name_ref("name_ref")?;
        let flags = r.u32("flags")?;
        let frame_count = r.u32("frame_count")?;
        let frames = frame_count as usize;
        let current_frame = gated(flags & Self::HAS_CURRENT_FRAME, || r.u32("current_frame"))?;
        let sleep = gated(flags & Self::HAS_SLEEP, || r.u32("sleep"))?;
        let light_levels = gated(flags & Self::HAS_LIGHT_LEVELS, || {
            r.array(frames, 4, "light_levels", |r| r.f32("light_levels"))
        })?;
        let colors = gated(flags & Self::HAS_COLORS, || r.vec3_array(frames, "colors"))?;
        Ok(Self {
            name_ref,
            flags,
            frame_count,
            current_frame,
            sleep,
            light_levels,
            colors,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.u32(self.flags)?;
        w.u32(self.frame_count)?;
        let frames = self.frame_count as usize;
        if self.flags & Self::HAS_CURRENT_FRAME != 0 {
            w.u32(*w.section(&self.current_frame, "current_frame")?)?;
        }
        if self.flags & Self::HAS_SLEEP != 0 {
            w.u32(*w.section(&self.sleep, "sleep")?)?;
        }
        if self.flags & Self::HAS_LIGHT_LEVELS != 0 {
            let levels = w.section(&self.light_levels, "light_levels")?;
            w.expect_len(levels.len(), frames, "light_levels")?;
            levels.iter().try_for_each(|&v| w.f32(v))?;
        }
        if self.flags & Self::HAS_COLORS != 0 {
            let colors = w.section(&self.colors, "colors")?;
            w.expect_len(colors.len(), frames, "colors")?;
            w.vec3_array(colors)?;
        }
        Ok(())
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}

/// 0x1E - legacy point light definition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointLightOldDef {
    pub name_ref: NameRef,
    pub reference: i32,
}

impl FragmentLayout for PointLightOldDef {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        Ok(Self {
            name_ref: r.name_ref("name_ref")?,
            reference: r.i32("reference")?,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.i32(self.reference)
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}

/// 0x28 - positioned point light.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointLight {
    pub name_ref: NameRef,
    /// Ordinal of a `Light`.
    pub light_ref: i32,
    pub flags: u32,
    pub location: [f32; 3],
    pub radius: f32,
}

impl FragmentLayout for PointLight {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        Ok(Self {
            name_ref: r.name_ref("name_ref")?,
            light_ref: r.i32("light_ref")?,
            flags: r.u32("flags")?,
            location: r.vec3("location")?,
            radius: r.f32("radius")?,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.i32(self.light_ref)?;
        w.u32(self.flags)?;
        w.vec3(self.location)?;
        w.f32(self.radius)
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}

/// 0x2A - ambient light applied to a set of regions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AmbientLight {
    pub name_ref: NameRef,
    pub light_ref: i32,
    pub flags: u32,
    /// Region indices.
    pub regions: Vec<u32>,
}

impl FragmentLayout for AmbientLight {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        let name_ref = r.name_ref("name_ref")?;
        let light_ref = r.i32("light_ref")?;
        let flags = r.u32("flags")?;
        let count = r.u32("region_count")? as usize;
        let regions = r.u32_array(count, "regions")?;
        Ok(Self {
            name_ref,
            light_ref,
            flags,
            regions,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.i32(self.light_ref)?;
        w.u32(self.flags)?;
        w.count_u32(self.regions.len(), "region_count")?;
        w.u32_array(&self.regions)
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}

/// 0x35 - marks a zone-wide ambient light. Holds only a name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GlobalAmbientLightDef {
    pub name_ref: NameRef,
}

impl FragmentLayout for GlobalAmbientLightDef {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        Ok(Self {
            name_ref: r.name_ref("name_ref")?,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::wld::fragment::tests::{encode_only, names, round_trip};
    use pretty_assertions::assert_eq;

    fn light_def(flags: u32) -> LightDef {
        let on = |bit: u32| flags & bit != 0;
        LightDef {
            name_ref: names::offset("TORCH_LDEF"),
            flags,
            frame_count: 2,
            current_frame: on(LightDef::HAS_CURRENT_FRAME).then_some(1),
            sleep: on(LightDef::HAS_SLEEP).then_some(200),
            light_levels: on(LightDef::HAS_LIGHT_LEVELS).then(|| vec![1.0, 0.5]),
            colors: on(LightDef::HAS_COLORS).then(|| vec![[1.0, 0.8, 0.6], [0.9, 0.7, 0.5]]),
        }
    }

    #[test]
    fn test_light_def_flag_combinations() {
        for flags in [0, 0x01, 0x02, 0x04, 0x10, 0x17] {
            let frag = light_def(flags);
            assert_eq!(round_trip(&frag, 0x1B).0, frag, "flags 0x{flags:02X}");
        }
    }

    #[test]
    fn test_light_def_frame_count_is_checked() {
        let mut frag = light_def(LightDef::HAS_COLORS);
        frag.frame_count = 3;
        assert!(matches!(
            encode_only(&frag, 0x1B),
            Err(crate::Error::CountMismatch { field: "colors", expected: 3, found: 2, .. })
        ));
    }

    #[test]
    fn test_light_placements() {
        let point = PointLight {
            name_ref: NameRef::None,
            light_ref: 4,
            flags: 0,
            location: [1.0, 2.0, 3.0],
            radius: 50.0,
        };
        let (decoded, bytes) = round_trip(&point, 0x28);
        assert_eq!(decoded, point);
        assert_eq!(bytes.len(), 28);

        let ambient = AmbientLight {
            name_ref: names::offset("TORCH_LDEF"),
            light_ref: 4,
            flags: 0,
            regions: vec![0, 1, 2],
        };
        assert_eq!(round_trip(&ambient, 0x2A).0, ambient);

        let global = GlobalAmbientLightDef {
            name_ref: names::offset("TORCH_LDEF"),
        };
        assert_eq!(round_trip(&global, 0x35).0, global);

        let old = PointLightOldDef {
            name_ref: NameRef::None,
            reference: 2,
        };
        assert_eq!(round_trip(&old, 0x1E).0, old);
    }
}
