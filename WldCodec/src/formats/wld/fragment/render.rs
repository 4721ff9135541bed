//! Render blocks shared by sprites and region walls

use crate::error::Result;
use crate::formats::wld::io::{FragmentReader, FragmentWriter};

/// Texture projection: origin plus U and V axes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UvInfo {
    pub origin: [f32; 3],
    pub u_axis: [f32; 3],
    pub v_axis: [f32; 3],
}

impl UvInfo {
    pub const SIZE: usize = 36;

    pub(crate) fn read(r: &mut FragmentReader<'_>) -> Result<Self> {
        Ok(Self {
            origin: r.vec3("uv_origin")?,
            u_axis: r.vec3("u_axis")?,
            v_axis: r.vec3("v_axis")?,
        })
    }

    pub(crate) fn write(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.vec3(self.origin)?;
        w.vec3(self.u_axis)?;
        w.vec3(self.v_axis)
    }
}

/// Entries of a render block's UV map.
#[derive(Debug, Clone, PartialEq)]
pub enum UvMap {
    /// Plain coordinate pairs.
    Points(Vec<[f32; 2]>),
    /// Full projections, one per entry (BSP nodes of `Sprite3DDef`).
    Projections(Vec<UvInfo>),
}

impl UvMap {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Points(points) => points.len(),
            Self::Projections(projections) => projections.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// How a render block stores its flags and UV map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RenderLayout {
    /// `u32` render flags, UV map of coordinate pairs.
    Wide,
    /// `u8` render flags, UV map of projections.
    Node,
}

/// Render method plus the sections its flag word gates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderInfo {
    pub method: u32,
    pub flags: u32,
    /// 0x01
    pub pen: Option<u32>,
    /// 0x02
    pub brightness: Option<f32>,
    /// 0x04
    pub scaled_ambient: Option<f32>,
    /// 0x08
    pub simple_sprite_ref: Option<u32>,
    /// 0x10
    pub uv_info: Option<UvInfo>,
    /// 0x20
    pub uv_map: Option<UvMap>,
}

impl RenderInfo {
    pub const HAS_PEN: u32 = 0x01;
    pub const HAS_BRIGHTNESS: u32 = 0x02;
    pub const HAS_SCALED_AMBIENT: u32 = 0x04;
    pub const HAS_SIMPLE_SPRITE: u32 = 0x08;
    pub const HAS_UV_INFO: u32 = 0x10;
    pub const HAS_UV_MAP: u32 = 0x20;

    pub(crate) fn read(r: &mut FragmentReader<'_>, layout: RenderLayout) -> Result<Self> {
        let method = r.u32("render_method")?;
        let flags = match layout {
            RenderLayout::Wide => r.u32("render_flags")?,
            RenderLayout::Node => u32::from(r.u8("render_flags")?),
        };

        let pen = gated(flags & Self::HAS_PEN, || r.u32("pen"))?;
        let brightness = gated(flags & Self::HAS_BRIGHTNESS, || r.f32("brightness"))?;
        let scaled_ambient = gated(flags & Self::HAS_SCALED_AMBIENT, || r.f32("scaled_ambient"))?;
        let simple_sprite_ref = gated(flags & Self::HAS_SIMPLE_SPRITE, || r.u32("simple_sprite_ref"))?;
        let uv_info = gated(flags & Self::HAS_UV_INFO, || UvInfo::read(r))?;
        let uv_map = if flags & Self::HAS_UV_MAP != 0 {
            let count = r.u32("uv_map_count")? as usize;
            Some(match layout {
                RenderLayout::Wide => UvMap::Points(r.array(count, 8, "uv_map", |r| r.vec2("uv_map"))?),
                RenderLayout::Node => {
                    UvMap::Projections(r.array(count, UvInfo::SIZE, "uv_map", UvInfo::read)?)
                }
            })
        } else {
            None
        };

        Ok(Self {
            method,
            flags,
            pen,
            brightness,
            scaled_ambient,
            simple_sprite_ref,
            uv_info,
            uv_map,
        })
    }

    pub(crate) fn write(&self, w: &mut FragmentWriter<'_>, layout: RenderLayout) -> Result<()> {
        w.u32(self.method)?;
        match layout {
            RenderLayout::Wide => w.u32(self.flags)?,
            RenderLayout::Node => {
                let flags = u8::try_from(self.flags)
                    .map_err(|_| w.overflow("render_flags", self.flags as usize))?;
                w.u8(flags)?;
            }
        }

        if self.flags & Self::HAS_PEN != 0 {
            w.u32(*w.section(&self.pen, "pen")?)?;
        }
        if self.flags & Self::HAS_BRIGHTNESS != 0 {
            w.f32(*w.section(&self.brightness, "brightness")?)?;
        }
        if self.flags & Self::HAS_SCALED_AMBIENT != 0 {
            w.f32(*w.section(&self.scaled_ambient, "scaled_ambient")?)?;
        }
        if self.flags & Self::HAS_SIMPLE_SPRITE != 0 {
            w.u32(*w.section(&self.simple_sprite_ref, "simple_sprite_ref")?)?;
        }
        if self.flags & Self::HAS_UV_INFO != 0 {
            w.section(&self.uv_info, "uv_info")?.write(w)?;
        }
        if self.flags & Self::HAS_UV_MAP != 0 {
            let uv_map = w.section(&self.uv_map, "uv_map")?;
            match (layout, uv_map) {
                (RenderLayout::Wide, UvMap::Points(points)) => {
                    w.count_u32(points.len(), "uv_map_count")?;
                    points.iter().try_for_each(|&p| w.vec2(p))?;
                }
                (RenderLayout::Node, UvMap::Projections(projections)) => {
                    w.count_u32(projections.len(), "uv_map_count")?;
                    projections.iter().try_for_each(|p| p.write(w))?;
                }
                _ => return Err(w.overflow("uv_map", uv_map.len())),
            }
        }
        Ok(())
    }
}

/// Render block whose sections are always present.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FullRenderInfo {
    pub method: u32,
    pub flags: u32,
    pub pen: u32,
    pub brightness: f32,
    pub scaled_ambient: f32,
    pub simple_sprite_ref: u32,
    pub uv_info: UvInfo,
    pub uv_map: Vec<[f32; 2]>,
}

impl FullRenderInfo {
    pub(crate) fn read(r: &mut FragmentReader<'_>) -> Result<Self> {
        let method = r.u32("render_method")?;
        let flags = r.u32("render_flags")?;
        let pen = r.u32("pen")?;
        let brightness = r.f32("brightness")?;
        let scaled_ambient = r.f32("scaled_ambient")?;
        let simple_sprite_ref = r.u32("simple_sprite_ref")?;
        let uv_info = UvInfo::read(r)?;
        let count = r.u32("uv_map_count")? as usize;
        let uv_map = r.array(count, 8, "uv_map", |r| r.vec2("uv_map"))?;
        Ok(Self {
            method,
            flags,
            pen,
            brightness,
            scaled_ambient,
            simple_sprite_ref,
            uv_info,
            uv_map,
        })
    }

    pub(crate) fn write(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.u32(self.method)?;
        w.u32(self.flags)?;
        w.u32(self.pen)?;
        w.f32(self.brightness)?;
        w.f32(self.scaled_ambient)?;
        w.u32(self.simple_sprite_ref)?;
        self.uv_info.write(w)?;
        w.count_u32(self.uv_map.len(), "uv_map_count")?;
        self.uv_map.iter().try_for_each(|&p| w.vec2(p))
    }
}

/// Read a value only when its flag bit is set.
pub(crate) fn gated<T>(bit: u32, read: impl FnOnce() -> Result<T>) -> Result<Option<T>> {
    if bit != 0 { read().map(Some) } else { Ok(None) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::wld::io::{DecodeContext, EncodeContext};
    use crate::formats::wld::name_table::{NameRemap, NameTable};
    use crate::formats::wld::version::WorldFormat;
    use pretty_assertions::assert_eq;

    fn round_trip(info: &RenderInfo, layout: RenderLayout) -> RenderInfo {
        let remap = NameRemap::identity();
        let ectx = EncodeContext::new(WorldFormat::Old, &remap);
        let mut w = FragmentWriter::new(0x06, &ectx);
        info.write(&mut w, layout).unwrap();
        let bytes = w.finish();

        let names = NameTable::default();
        let dctx = DecodeContext::new(WorldFormat::Old, &names);
        let mut r = FragmentReader::new(&bytes, 0x06, &dctx);
        let decoded = RenderInfo::read(&mut r, layout).unwrap();
        assert_eq!(r.remaining(), 0);
        decoded
    }

    #[test]
    fn test_render_info_each_flag() {
        let full = RenderInfo {
            method: 0x80000001,
            flags: 0,
            pen: Some(7),
            brightness: Some(0.5),
            scaled_ambient: Some(0.75),
            simple_sprite_ref: Some(3),
            uv_info: Some(UvInfo {
                origin: [1.0, 2.0, 3.0],
                u_axis: [1.0, 0.0, 0.0],
                v_axis: [0.0, 1.0, 0.0],
            }),
            uv_map: Some(UvMap::Points(vec![[0.0, 1.0], [1.0, 0.0]])),
        };

        for bit in 0..6 {
            let flags = 1u32 << bit;
            let info = RenderInfo {
                flags,
                pen: full.pen.filter(|_| flags & RenderInfo::HAS_PEN != 0),
                brightness: full.brightness.filter(|_| flags & RenderInfo::HAS_BRIGHTNESS != 0),
                scaled_ambient: full.scaled_ambient.filter(|_| flags & RenderInfo::HAS_SCALED_AMBIENT != 0),
                simple_sprite_ref: full.simple_sprite_ref.filter(|_| flags & RenderInfo::HAS_SIMPLE_SPRITE != 0),
                uv_info: full.uv_info.filter(|_| flags & RenderInfo::HAS_UV_INFO != 0),
                uv_map: full.uv_map.clone().filter(|_| flags & RenderInfo::HAS_UV_MAP != 0),
                ..full.clone()
            };
            assert_eq!(round_trip(&info, RenderLayout::Wide), info, "bit {bit}");
        }

        let all = RenderInfo { flags: 0x3F, ..full };
        assert_eq!(round_trip(&all, RenderLayout::Wide), all);
    }

    #[test]
    fn test_node_layout_uses_byte_flags_and_projections() {
        let info = RenderInfo {
            method: 1,
            flags: RenderInfo::HAS_UV_MAP,
            uv_map: Some(UvMap::Projections(vec![UvInfo::default(); 2])),
            ..Default::default()
        };
        assert_eq!(round_trip(&info, RenderLayout::Node), info);

        let wide = RenderInfo {
            flags: 0x100,
            ..Default::default()
        };
        let remap = NameRemap::identity();
        let ectx = EncodeContext::new(WorldFormat::Old, &remap);
        let mut w = FragmentWriter::new(0x08, &ectx);
        assert!(matches!(
            wide.write(&mut w, RenderLayout::Node),
            Err(crate::Error::FieldOverflow { field: "render_flags", .. })
        ));
    }
}
