//! Material chain fragments: bitmaps, sprites, materials and palettes
//!
//! A mesh reaches its texture files through
//! `MaterialPalette -> MaterialDef -> SimpleSprite -> SimpleSpriteDef -> BmInfo`.

use super::FragmentLayout;
use crate::error::Result;
use crate::formats::wld::hash::{decode_hashed_string, encode_hashed_string};
use crate::formats::wld::io::{FragmentReader, FragmentWriter};
use crate::formats::wld::name_table::NameRef;

/// 0x01 - palette file name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DefaultPaletteFile {
    pub name_ref: NameRef,
    pub file_name: String,
}

impl FragmentLayout for DefaultPaletteFile {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        let name_ref = r.name_ref("name_ref")?;
        let len = r.u16("name_length")? as usize;
        let raw = r.bytes(len, "file_name")?;
        Ok(Self {
            name_ref,
            file_name: String::from_utf8_lossy(&raw).into_owned(),
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.count_u16(self.file_name.len(), "name_length")?;
        w.bytes(self.file_name.as_bytes())
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}

/// 0x03 - list of bitmap file names (texture list).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BmInfo {
    pub name_ref: NameRef,
    pub file_names: Vec<String>,
}

impl FragmentLayout for BmInfo {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        let name_ref = r.name_ref("name_ref")?;
        // Stored as count - 1
        let count = r.i32("texture_count")?.saturating_add(1).max(0) as usize;
        let file_names = r.array(count, 2, "file_names", |r| {
            let len = r.u16("file_name_length")? as usize;
            let raw = r.bytes(len, "file_name")?;
            Ok(decode_hashed_string(&raw))
        })?;
        Ok(Self { name_ref, file_names })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        let count = i32::try_from(self.file_names.len())
            .map_err(|_| w.overflow("texture_count", self.file_names.len()))?;
        w.i32(count - 1)?;
        for name in &self.file_names {
            let hashed = encode_hashed_string(name);
            w.count_u16(hashed.len(), "file_name_length")?;
            w.bytes(&hashed)?;
        }
        w.pad_to_4()
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}

/// 0x04 - texture: one or more bitmaps, animated when more than one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimpleSpriteDef {
    pub name_ref: NameRef,
    pub flags: u32,
    /// Present when flag 0x20 is set.
    pub current_frame: Option<i32>,
    /// Present when flags 0x08 and 0x10 are both set.
    pub sleep: Option<u32>,
    /// Ordinals of `BmInfo` fragments.
    pub bitmap_refs: Vec<u32>,
}

impl SimpleSpriteDef {
    pub const HAS_CURRENT_FRAME: u32 = 0x20;
    pub const ANIMATED: u32 = 0x08;
    pub const HAS_SLEEP: u32 = 0x10;

    fn has_sleep(flags: u32) -> bool {
        flags & Self::ANIMATED != 0 && flags & Self::HAS_SLEEP != 0
    }
}

impl FragmentLayout for SimpleSpriteDef {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        let name_ref = r.name_ref("name_ref")?;
        let flags = r.u32("flags")?;
        let count = r.u32("bitmap_count")? as usize;
        let current_frame = if flags & Self::HAS_CURRENT_FRAME != 0 {
            Some(r.i32("current_frame")?)
        } else {
            None
        };
        let sleep = if Self::has_sleep(flags) {
            Some(r.u32("sleep")?)
        } else {
            None
        };
        let bitmap_refs = r.u32_array(count, "bitmap_refs")?;
        Ok(Self {
            name_ref,
            flags,
            current_frame,
            sleep,
            bitmap_refs,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.u32(self.flags)?;
        w.count_u32(self.bitmap_refs.len(), "bitmap_count")?;
        if self.flags & Self::HAS_CURRENT_FRAME != 0 {
            let frame = *w.section(&self.current_frame, "current_frame")?;
            w.i32(frame)?;
        }
        if Self::has_sleep(self.flags) {
            let sleep = *w.section(&self.sleep, "sleep")?;
            w.u32(sleep)?;
        }
        w.u32_array(&self.bitmap_refs)
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}

/// 0x05 - texture reference, points a material at a `SimpleSpriteDef`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimpleSprite {
    pub name_ref: NameRef,
    pub sprite_ref: i16,
    pub flags: u32,
}

impl FragmentLayout for SimpleSprite {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        Ok(Self {
            name_ref: r.name_ref("name_ref")?,
            sprite_ref: r.i16("sprite_ref")?,
            flags: r.u32("flags")?,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.i16(self.sprite_ref)?;
        w.u32(self.flags)?;
        w.pad_to_4()
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}

/// 0x26 - blit sprite definition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlitSpriteDef {
    pub name_ref: NameRef,
    pub flags: u32,
    pub sprite_instance_ref: u32,
    pub unknown: i32,
}

impl FragmentLayout for BlitSpriteDef {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        Ok(Self {
            name_ref: r.name_ref("name_ref")?,
            flags: r.u32("flags")?,
            sprite_instance_ref: r.u32("sprite_instance_ref")?,
            unknown: r.i32("unknown")?,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.u32(self.flags)?;
        w.u32(self.sprite_instance_ref)?;
        w.i32(self.unknown)
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}

/// 0x30 - material.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterialDef {
    pub name_ref: NameRef,
    pub flags: u32,
    pub render_method: u32,
    pub rgb_pen: [u8; 4],
    pub brightness: f32,
    pub scaled_ambient: f32,
    /// Ordinal of a `SimpleSprite`, 0 for an untextured material.
    pub simple_sprite_ref: u32,
    /// Present when flag 0x02 is set.
    pub pair: Option<(u32, f32)>,
}

impl MaterialDef {
    pub const HAS_PAIR: u32 = 0x02;
}

impl FragmentLayout for MaterialDef {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        let name_ref = r.name_ref("name_ref")?;
        let flags = r.u32("flags")?;
        let render_method = r.u32("render_method")?;
        let rgb_pen = [r.u8("rgb_pen")?, r.u8("rgb_pen")?, r.u8("rgb_pen")?, r.u8("rgb_pen")?];
        let brightness = r.f32("brightness")?;
        let scaled_ambient = r.f32("scaled_ambient")?;
        let simple_sprite_ref = r.u32("simple_sprite_ref")?;
        let pair = if flags & Self::HAS_PAIR != 0 {
            Some((r.u32("pair")?, r.f32("pair")?))
        } else {
            None
        };
        Ok(Self {
            name_ref,
            flags,
            render_method,
            rgb_pen,
            brightness,
            scaled_ambient,
            simple_sprite_ref,
            pair,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.u32(self.flags)?;
        w.u32(self.render_method)?;
        w.bytes(&self.rgb_pen)?;
        w.f32(self.brightness)?;
        w.f32(self.scaled_ambient)?;
        w.u32(self.simple_sprite_ref)?;
        if self.flags & Self::HAS_PAIR != 0 {
            let (first, second) = *w.section(&self.pair, "pair")?;
            w.u32(first)?;
            w.f32(second)?;
        }
        Ok(())
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}

/// 0x31 - material list used by a mesh.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterialPalette {
    pub name_ref: NameRef,
    pub flags: u32,
    /// Ordinals of `MaterialDef` fragments.
    pub material_refs: Vec<u32>,
}

impl FragmentLayout for MaterialPalette {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        let name_ref = r.name_ref("name_ref")?;
        let flags = r.u32("flags")?;
        let count = r.u32("material_count")? as usize;
        let material_refs = r.u32_array(count, "material_refs")?;
        Ok(Self {
            name_ref,
            flags,
            material_refs,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.u32(self.flags)?;
        w.count_u32(self.material_refs.len(), "material_count")?;
        w.u32_array(&self.material_refs)
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::wld::fragment::tests::{names, round_trip, round_trip_in};
    use crate::formats::wld::version::WorldFormat;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bm_info_round_trip() {
        let frag = BmInfo {
            name_ref: names::offset("SAND_SPRITE"),
            file_names: vec!["sand.bmp".into(), "sand01.bmp".into()],
        };
        let (decoded, bytes) = round_trip(&frag, 0x03);
        assert_eq!(decoded, frag);
        assert_eq!(bytes.len() % 4, 0);
        // count is stored minus one
        assert_eq!(&bytes[4..8], &1i32.to_le_bytes());
    }

    #[test]
    fn test_bm_info_names_are_hashed() {
        let frag = BmInfo {
            name_ref: NameRef::None,
            file_names: vec!["a.bmp".into()],
        };
        let (_, bytes) = round_trip(&frag, 0x03);
        assert!(!bytes.windows(5).any(|w| w == b"a.bmp"));
    }

    #[test]
    fn test_simple_sprite_def_flag_combinations() {
        let base = SimpleSpriteDef {
            name_ref: names::offset("SAND_SPRITE"),
            bitmap_refs: vec![1, 2],
            ..Default::default()
        };

        let cases = [
            (0, None, None),
            (SimpleSpriteDef::HAS_CURRENT_FRAME, Some(1), None),
            (SimpleSpriteDef::ANIMATED, None, None),
            (SimpleSpriteDef::HAS_SLEEP, None, None),
            (SimpleSpriteDef::ANIMATED | SimpleSpriteDef::HAS_SLEEP, None, Some(100)),
            (0x38, Some(-1), Some(250)),
        ];
        for (flags, current_frame, sleep) in cases {
            let frag = SimpleSpriteDef {
                flags,
                current_frame,
                sleep,
                ..base.clone()
            };
            let (decoded, _) = round_trip(&frag, 0x04);
            assert_eq!(decoded, frag, "flags 0x{flags:02X}");
        }
    }

    #[test]
    fn test_simple_sprite_is_padded() {
        let frag = SimpleSprite {
            name_ref: names::offset("SAND_SPRITE"),
            sprite_ref: 4,
            flags: 0x10,
        };
        let (decoded, bytes) = round_trip(&frag, 0x05);
        assert_eq!(decoded, frag);
        assert_eq!(bytes.len(), 12);
    }

    #[test]
    fn test_material_def_pair_section() {
        let mut frag = MaterialDef {
            name_ref: names::offset("SAND_MDF"),
            flags: 0,
            render_method: 0x80000001,
            rgb_pen: [0xB2, 0xB2, 0xB2, 0],
            brightness: 0.0,
            scaled_ambient: 0.75,
            simple_sprite_ref: 3,
            pair: None,
        };
        let (decoded, bytes) = round_trip(&frag, 0x30);
        assert_eq!(decoded, frag);
        assert_eq!(bytes.len(), 28);

        frag.flags = MaterialDef::HAS_PAIR;
        frag.pair = Some((0, 0.5));
        let (decoded, bytes) = round_trip_in(&frag, 0x30, WorldFormat::New);
        assert_eq!(decoded, frag);
        assert_eq!(bytes.len(), 36);
    }

    #[test]
    fn test_material_def_missing_section_is_an_error() {
        use crate::formats::wld::fragment::tests::encode_only;
        let frag = MaterialDef {
            flags: MaterialDef::HAS_PAIR,
            pair: None,
            ..Default::default()
        };
        assert!(matches!(
            encode_only(&frag, 0x30),
            Err(crate::Error::MissingSection { field: "pair", .. })
        ));
    }

    #[test]
    fn test_palette_and_palette_file_round_trip() {
        let palette = MaterialPalette {
            name_ref: names::offset("MESH_MP"),
            flags: 0x00014003,
            material_refs: vec![4, 8, 12],
        };
        assert_eq!(round_trip(&palette, 0x31).0, palette);

        let file = DefaultPaletteFile {
            name_ref: NameRef::None,
            file_name: "palette.bmp".into(),
        };
        assert_eq!(round_trip(&file, 0x01).0, file);

        let blit = BlitSpriteDef {
            name_ref: names::offset("SAND_SPRITE"),
            flags: 1,
            sprite_instance_ref: 2,
            unknown: -1,
        };
        assert_eq!(round_trip(&blit, 0x26).0, blit);
    }
}
