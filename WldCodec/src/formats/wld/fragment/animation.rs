//! Skeletal tracks, vertex animation and vertex colour tracks

use super::FragmentLayout;
use crate::error::Result;
use crate::formats::wld::io::{FragmentReader, FragmentWriter};
use crate::formats::wld::name_table::NameRef;

/// One keyframe of a bone track. Rotation is a quaternion scaled by
/// `rotate_denominator`, translation is scaled by `shift_denominator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackFrame {
    pub rotate_denominator: i16,
    pub rotate: [i16; 3],
    pub shift_denominator: i16,
    pub shift: [i16; 3],
}

/// 0x12 - bone transform keyframes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackDef {
    pub name_ref: NameRef,
    pub flags: u32,
    pub frames: Vec<TrackFrame>,
}

impl TrackDef {
    /// Frames are stored as `i8` instead of `i16`.
    pub const SMALL_FRAMES: u32 = 0x08;
}

impl FragmentLayout for TrackDef {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        let name_ref = r.name_ref("name_ref")?;
        let flags = r.u32("flags")?;
        let count = r.u32("frame_count")? as usize;

        let frames = if flags & Self::SMALL_FRAMES != 0 {
            r.array(count, 8, "frames", |r| {
                let mut v = [0i16; 8];
                for slot in &mut v {
                    *slot = i16::from(r.i8("frames")?);
                }
                Ok(TrackFrame {
                    rotate_denominator: v[0],
                    rotate: [v[1], v[2], v[3]],
                    shift_denominator: v[4],
                    shift: [v[5], v[6], v[7]],
                })
            })?
        } else {
            r.array(count, 16, "frames", |r| {
                let mut v = [0i16; 8];
                for slot in &mut v {
                    *slot = r.i16("frames")?;
                }
                Ok(TrackFrame {
                    shift_denominator: v[0],
                    shift: [v[1], v[2], v[3]],
                    rotate: [v[4], v[5], v[6]],
                    rotate_denominator: v[7],
                })
            })?
        };

        Ok(Self {
            name_ref,
            flags,
            frames,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.u32(self.flags)?;
        w.count_u32(self.frames.len(), "frame_count")?;

        for frame in &self.frames {
            if self.flags & Self::SMALL_FRAMES != 0 {
                let values = [
                    frame.rotate_denominator,
                    frame.rotate[0],
                    frame.rotate[1],
                    frame.rotate[2],
                    frame.shift_denominator,
                    frame.shift[0],
                    frame.shift[1],
                    frame.shift[2],
                ];
                for value in values {
                    let small = i8::try_from(value)
                        .map_err(|_| w.out_of_range("frames", i64::from(value)))?;
                    w.i8(small)?;
                }
            } else {
                let values = [
                    frame.shift_denominator,
                    frame.shift[0],
                    frame.shift[1],
                    frame.shift[2],
                    frame.rotate[0],
                    frame.rotate[1],
                    frame.rotate[2],
                    frame.rotate_denominator,
                ];
                values.iter().try_for_each(|&v| w.i16(v))?;
            }
        }
        Ok(())
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}

/// 0x13 - bone track instance.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Track {
    pub name_ref: NameRef,
    /// Ordinal of a `TrackDef`.
    pub track_def_ref: i32,
    pub flags: u32,
    /// 0x01
    pub sleep: Option<u32>,
}

impl Track {
    pub const HAS_SLEEP: u32 = 0x01;
}

impl FragmentLayout for Track {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        let name_ref = r.name_ref("name_ref")?;
        let track_def_ref = r.i32("track_def_ref")?;
        let flags = r.u32("flags")?;
        let sleep = if flags & Self::HAS_SLEEP != 0 {
            Some(r.u32("sleep")?)
        } else {
            None
        };
        Ok(Self {
            name_ref,
            track_def_ref,
            flags,
            sleep,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.i32(self.track_def_ref)?;
        w.u32(self.flags)?;
        if self.flags & Self::HAS_SLEEP != 0 {
            w.u32(*w.section(&self.sleep, "sleep")?)?;
        }
        Ok(())
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}

/// 0x32 - per-vertex colours of a mesh.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DmRgbTrackDef {
    pub name_ref: NameRef,
    pub data1: u32,
    pub data2: u32,
    pub data3: u32,
    pub data4: u32,
    pub colors: Vec<[u8; 4]>,
}

impl FragmentLayout for DmRgbTrackDef {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        let name_ref = r.name_ref("name_ref")?;
        let data1 = r.u32("data1")?;
        let count = r.u32("color_count")? as usize;
        let data2 = r.u32("data2")?;
        let data3 = r.u32("data3")?;
        let data4 = r.u32("data4")?;
        let colors = r.array(count, 4, "colors", |r| {
            Ok([r.u8("colors")?, r.u8("colors")?, r.u8("colors")?, r.u8("colors")?])
        })?;
        Ok(Self {
            name_ref,
            data1,
            data2,
            data3,
            data4,
            colors,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.u32(self.data1)?;
        w.count_u32(self.colors.len(), "color_count")?;
        w.u32(self.data2)?;
        w.u32(self.data3)?;
        w.u32(self.data4)?;
        self.colors.iter().try_for_each(|c| w.bytes(c))
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}

/// 0x37 - vertex animation frames for a mesh.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DmTrackDef2 {
    pub name_ref: NameRef,
    pub flags: u32,
    pub vertex_count: u16,
    pub param1: u16,
    pub param2: u16,
    pub scale: u16,
    /// `vertex_count` positions per frame.
    pub frames: Vec<Vec<[i16; 3]>>,
    pub size6: u16,
}

impl FragmentLayout for DmTrackDef2 {
    fn decode(r: &mut FragmentReader<'_>) -> Result<Self> {
        let name_ref = r.name_ref("name_ref")?;
        let flags = r.u32("flags")?;
        let vertex_count = r.u16("vertex_count")?;
        let frame_count = r.u16("frame_count")? as usize;
        let param1 = r.u16("param1")?;
        let param2 = r.u16("param2")?;
        let scale = r.u16("scale")?;
        let frame_size = usize::from(vertex_count) * 6;
        let frames = r.array(frame_count, frame_size, "frames", |r| {
            r.array(usize::from(vertex_count), 6, "frames", |r| {
                Ok([r.i16("frames")?, r.i16("frames")?, r.i16("frames")?])
            })
        })?;
        let size6 = r.u16("size6")?;
        Ok(Self {
            name_ref,
            flags,
            vertex_count,
            param1,
            param2,
            scale,
            frames,
            size6,
        })
    }

    fn encode(&self, w: &mut FragmentWriter<'_>) -> Result<()> {
        w.name_ref(self.name_ref)?;
        w.u32(self.flags)?;
        w.u16(self.vertex_count)?;
        w.count_u16(self.frames.len(), "frame_count")?;
        w.u16(self.param1)?;
        w.u16(self.param2)?;
        w.u16(self.scale)?;
        for frame in &self.frames {
            w.expect_len(frame.len(), usize::from(self.vertex_count), "frames")?;
            for position in frame {
                position.iter().try_for_each(|&v| w.i16(v))?;
            }
        }
        w.u16(self.size6)
    }

    fn name_ref(&self) -> NameRef {
        self.name_ref
    }
}
