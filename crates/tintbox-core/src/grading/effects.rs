//! Spatial finishing effects: vignette, film grain, chromatic aberration.
//!
//! All functions here are position-dependent and take normalized UVs
//! (`[0, 1]²`, origin top-left) or integer pixel coordinates. The GPU
//! `composite.wgsl` reimplements each one with identical constants.

use glam::Vec2;

/// UV displacement at the frame corner for `chromatic_aberration = 1`.
pub const CA_MAX_OFFSET: f32 = 0.01;

/// Narrowest smoothstep band, keeps the vignette well-defined at zero feather.
const MIN_FEATHER: f32 = 1e-4;

/// Brightness multiplier for the vignette at `uv`.
///
/// The distance from the frame center is normalized so the corners sit at 1.
/// Darkening starts at `midpoint` and reaches full `amount` over `feather`.
///
/// ```text
/// d = |uv − 0.5| × √2
/// factor = 1 − amount × smoothstep(midpoint, midpoint + feather, d)
/// ```
pub fn vignette_factor(uv: Vec2, amount: f32, midpoint: f32, feather: f32) -> f32 {
    if amount <= 0.0 {
        return 1.0;
    }
    let d = (uv - Vec2::splat(0.5)).length() * std::f32::consts::SQRT_2;
    let edge1 = midpoint + feather.max(MIN_FEATHER);
    1.0 - amount * smoothstep(midpoint, edge1, d)
}

/// Signed grain offset in `[-amount / 2, amount / 2)` for pixel `(x, y)`.
///
/// Noise is constant over `size × size` pixel cells and reseeded per frame.
pub fn grain_offset(x: u32, y: u32, size: f32, amount: f32, seed: u32) -> f32 {
    if amount <= 0.0 {
        return 0.0;
    }
    let cell = size.max(1.0);
    let cx = (x as f32 / cell).floor() as u32;
    let cy = (y as f32 / cell).floor() as u32;
    (unit_hash(cx, cy, seed) - 0.5) * amount
}

/// Red and blue sample positions for chromatic aberration at `uv`.
///
/// Red is pushed outward from the center, blue pulled inward; green stays
/// at `uv`.
pub fn aberration_uvs(uv: Vec2, amount: f32) -> (Vec2, Vec2) {
    let offset = (uv - Vec2::splat(0.5)) * (amount * CA_MAX_OFFSET * 2.0);
    (uv + offset, uv - offset)
}

/// Integer hash → `[0, 1)`. Bit-identical to `hash_unit` in the shader.
pub fn unit_hash(x: u32, y: u32, seed: u32) -> f32 {
    let mut h = x.wrapping_mul(0x8da6_b343)
        ^ y.wrapping_mul(0xd816_3841)
        ^ seed.wrapping_mul(0xcb1a_b31f);
    h ^= h >> 16;
    h = h.wrapping_mul(0x7feb_352d);
    h ^= h >> 15;
    h = h.wrapping_mul(0x846c_a68b);
    h ^= h >> 16;
    (h >> 8) as f32 / 16_777_216.0
}

#[inline]
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
