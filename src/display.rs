//! Display mapping: HDR radiance to display-encoded color.

use glam::{Vec3, Vec4};

/// Display gamma used for both decoding authored colors and encoding output.
pub const GAMMA: f32 = 2.2;

/// Reinhard operator, `c / (c + 1)` per channel.
#[inline]
pub fn tone_map(color: Vec3) -> Vec3 {
    color / (color + Vec3::ONE)
}

/// Linear to display encoding.
#[inline]
pub fn gamma_encode(color: Vec3) -> Vec3 {
    color.powf(1.0 / GAMMA)
}

/// Display to linear decoding.
#[inline]
pub fn gamma_decode(color: Vec3) -> Vec3 {
    color.powf(GAMMA)
}

/// Tone maps and gamma encodes linear radiance. Alpha is always 1.
#[inline]
pub fn tone_map_and_encode(color: Vec3) -> Vec4 {
    gamma_encode(tone_map(color)).extend(1.0)
}

/// Quantizes a display color to 8 bits per channel.
pub fn to_rgba8(color: Vec4) -> [u8; 4] {
    let scaled = (color.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round();
    [
        scaled.x as u8,
        scaled.y as u8,
        scaled.z as u8,
        scaled.w as u8,
    ]
}
