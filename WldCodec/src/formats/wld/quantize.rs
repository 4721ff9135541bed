//! Fixed-point encoding of mesh vertex attributes
//!
//! Positions are stored relative to the mesh center in units of
//! `2^-scale_exponent`. Texture coordinates use a fixed multiplier of 256,
//! normals a multiplier of 128.

use glam::{Vec2, Vec3};

use super::fragment::DmSpriteDef2;
use super::version::UvWidth;
use crate::error::{Error, Result};

/// Largest scale exponent the codec will pick on its own.
pub const MAX_SCALE_EXPONENT: u16 = 15;

/// Texture coordinates are stored as `value * 2^8`.
const UV_SHIFT: u16 = 8;
const UV_SCALE: f32 = 256.0;
const NORMAL_SCALE: f32 = 128.0;

/// Position codec for one mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshQuantizer {
    center: Vec3,
    scale_exponent: u16,
}

impl MeshQuantizer {
    #[must_use]
    pub fn new(center: Vec3, scale_exponent: u16) -> Self {
        Self { center, scale_exponent }
    }

    /// Quantizer matching the header of a stored mesh.
    #[must_use]
    pub fn for_mesh(mesh: &DmSpriteDef2) -> Self {
        Self::new(Vec3::from_array(mesh.center), mesh.scale_exponent)
    }

    /// Quantizer for a fresh mesh, picking the finest exponent that still
    /// fits every position.
    #[must_use]
    pub fn fit(center: Vec3, positions: &[Vec3]) -> Self {
        Self::new(center, choose_scale_exponent(center, positions))
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        self.center
    }

    #[must_use]
    pub fn scale_exponent(&self) -> u16 {
        self.scale_exponent
    }

    /// Size of one quantization step.
    #[must_use]
    pub fn step(&self) -> f32 {
        2f32.powi(-i32::from(self.scale_exponent))
    }

    pub fn encode_position(&self, position: Vec3) -> Result<[i16; 3]> {
        let factor = 2f32.powi(i32::from(self.scale_exponent));
        let scaled = (position - self.center) * factor;
        let mut out = [0i16; 3];
        for (slot, (value, relative)) in out
            .iter_mut()
            .zip(scaled.to_array().into_iter().zip((position - self.center).to_array()))
        {
            *slot = quantize_i16(value).ok_or(Error::QuantizationOverflow {
                attribute: "position",
                value: relative,
                scale_exponent: self.scale_exponent,
            })?;
        }
        Ok(out)
    }

    #[must_use]
    pub fn decode_position(&self, stored: [i16; 3]) -> Vec3 {
        let [x, y, z] = stored;
        self.center + Vec3::new(f32::from(x), f32::from(y), f32::from(z)) * self.step()
    }
}

fn quantize_i16(value: f32) -> Option<i16> {
    let rounded = value.round();
    (rounded.is_finite() && rounded >= f32::from(i16::MIN) && rounded <= f32::from(i16::MAX))
        .then_some(rounded as i16)
}

/// Largest exponent (at most [`MAX_SCALE_EXPONENT`]) that keeps every
/// coordinate within `i16` range. Returns 0 when even that overflows.
#[must_use]
pub fn choose_scale_exponent(center: Vec3, positions: &[Vec3]) -> u16 {
    let extent = positions
        .iter()
        .map(|p| (*p - center).abs().max_element())
        .fold(0.0f32, f32::max);

    (0..=MAX_SCALE_EXPONENT)
        .rev()
        .find(|&s| (extent * 2f32.powi(i32::from(s))).round() <= f32::from(i16::MAX))
        .unwrap_or(0)
}

/// Store a texture coordinate at the given width.
pub fn encode_uv(uv: Vec2, width: UvWidth) -> Result<[i32; 2]> {
    let (min, max) = match width {
        UvWidth::I16 => (f64::from(i16::MIN), f64::from(i16::MAX)),
        UvWidth::I32 => (f64::from(i32::MIN), f64::from(i32::MAX)),
    };
    let mut out = [0i32; 2];
    for (slot, value) in out.iter_mut().zip(uv.to_array()) {
        let scaled = f64::from((value * UV_SCALE).round());
        if !scaled.is_finite() || scaled < min || scaled > max {
            return Err(Error::QuantizationOverflow {
                attribute: "uv",
                value,
                scale_exponent: UV_SHIFT,
            });
        }
        *slot = scaled as i32;
    }
    Ok(out)
}

#[must_use]
pub fn decode_uv(stored: [i32; 2]) -> Vec2 {
    Vec2::new(stored[0] as f32, stored[1] as f32) / UV_SCALE
}

/// Store a unit normal. Components saturate at the `i8` limits.
#[must_use]
pub fn encode_normal(normal: Vec3) -> [i8; 3] {
    let scaled = (normal * NORMAL_SCALE).round();
    scaled
        .to_array()
        .map(|v| v.clamp(f32::from(i8::MIN), f32::from(i8::MAX)) as i8)
}

#[must_use]
pub fn decode_normal(stored: [i8; 3]) -> Vec3 {
    let [x, y, z] = stored;
    Vec3::new(f32::from(x), f32::from(y), f32::from(z)) / NORMAL_SCALE
}

impl DmSpriteDef2 {
    #[must_use]
    pub fn quantizer(&self) -> MeshQuantizer {
        MeshQuantizer::for_mesh(self)
    }

    /// Decoded vertex positions.
    #[must_use]
    pub fn vertex_positions(&self) -> Vec<Vec3> {
        let q = self.quantizer();
        self.positions.iter().map(|&p| q.decode_position(p)).collect()
    }

    #[must_use]
    pub fn vertex_uvs(&self) -> Vec<Vec2> {
        self.uvs.iter().map(|&uv| decode_uv(uv)).collect()
    }

    #[must_use]
    pub fn vertex_normals(&self) -> Vec<Vec3> {
        self.normals.iter().map(|&n| decode_normal(n)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_position_error_within_one_step() {
        let center = Vec3::new(100.0, -20.0, 3.5);
        let points = [
            Vec3::new(100.0, -20.0, 3.5),
            Vec3::new(112.34, -7.01, 3.5),
            Vec3::new(87.9, -33.3, -1.25),
            Vec3::new(100.001, -19.999, 3.501),
        ];
        let q = MeshQuantizer::fit(center, &points);
        for p in points {
            let back = q.decode_position(q.encode_position(p).unwrap());
            assert!((back - p).abs().max_element() <= q.step(), "{p} -> {back}");
        }
    }

    #[test]
    fn test_exponent_is_capped_and_fits() {
        assert_eq!(choose_scale_exponent(Vec3::ZERO, &[]), MAX_SCALE_EXPONENT);
        assert_eq!(choose_scale_exponent(Vec3::ZERO, &[Vec3::splat(0.5)]), MAX_SCALE_EXPONENT);
        // 1000 * 2^5 = 32000 fits, 2^6 does not
        assert_eq!(choose_scale_exponent(Vec3::ZERO, &[Vec3::new(0.0, -1000.0, 0.0)]), 5);
        assert_eq!(choose_scale_exponent(Vec3::ZERO, &[Vec3::X * 1.0e6]), 0);
    }

    #[test]
    fn test_position_overflow() {
        let q = MeshQuantizer::new(Vec3::ZERO, 4);
        let err = q.encode_position(Vec3::new(0.0, 5000.0, 0.0)).unwrap_err();
        assert!(matches!(
            err,
            Error::QuantizationOverflow { attribute: "position", scale_exponent: 4, .. }
        ));
    }

    #[test]
    fn test_uv_width() {
        let uv = Vec2::new(0.5, -2.0);
        assert_eq!(encode_uv(uv, UvWidth::I16).unwrap(), [128, -512]);
        assert_eq!(decode_uv([128, -512]), uv);

        let wide = Vec2::new(200.0, 0.0);
        assert!(encode_uv(wide, UvWidth::I16).is_err());
        assert_eq!(encode_uv(wide, UvWidth::I32).unwrap(), [51200, 0]);
    }

    #[test]
    fn test_normals() {
        assert_eq!(encode_normal(Vec3::Z), [0, 0, 127]);
        assert_eq!(encode_normal(-Vec3::Y), [0, -128, 0]);
        assert_eq!(decode_normal([0, -128, 64]), Vec3::new(0.0, -1.0, 0.5));
    }
}
