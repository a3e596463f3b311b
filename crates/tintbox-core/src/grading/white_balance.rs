//! White balance via chromaticity shift and Bradford adaptation.
//!
//! Temperature moves the target white point along the Planckian locus
//! tangent at D65 (blue-amber axis); tint moves it perpendicular to that
//! (green-magenta axis). The resulting 3×3 matrix is computed once per grade
//! and applied per pixel, so the GPU path only needs the matrix as a uniform.
//!
//! # Reference
//! - Hernández-Andrés et al. (1999), Planckian locus approximation
//! - Lindbloom, Bruce J., Bradford chromatic adaptation

/// Row-major 3×3 matrix applied to RGB column vectors.
pub type Mat3 = [[f32; 3]; 3];

pub const IDENTITY: Mat3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// Bradford cone response matrix.
const M: [[f64; 3]; 3] = [
    [0.8951, 0.2664, -0.1614],
    [-0.7502, 1.7135, 0.0367],
    [0.0389, -0.0685, 1.0296],
];
const M_INV: [[f64; 3]; 3] = [
    [0.9869929055, -0.1470542564, 0.1599626517],
    [0.4323052697, 0.5183602715, 0.0492912282],
    [-0.0085286646, 0.0400428217, 0.9684866958],
];

/// D65 reference white in CIE xy.
const REF_X: f64 = 0.3127;
const REF_Y: f64 = 0.3290;

/// Planckian locus tangent at D65.
const TANGENT: [f64; 2] = [0.3585, 0.1501];

/// xy shift per unit of temperature or tint.
const SHIFT_SCALE: f64 = 0.05;

/// Build the adaptation matrix for `temperature` and `tint`, both in `[-1, 1]`.
///
/// - positive temperature warms (less blue), negative cools
/// - positive tint pushes toward magenta, negative toward green
///
/// Both at 0.0 return [`IDENTITY`] exactly.
pub fn white_balance_matrix(temperature: f32, tint: f32) -> Mat3 {
    if temperature.abs() < 1e-7 && tint.abs() < 1e-7 {
        return IDENTITY;
    }
    if !temperature.is_finite() || !tint.is_finite() {
        return IDENTITY;
    }

    let perp = [TANGENT[1], -TANGENT[0]];
    let t = temperature as f64 * SHIFT_SCALE;
    let p = tint as f64 * SHIFT_SCALE;
    let dst_x = REF_X + TANGENT[0] * t + perp[0] * p;
    let dst_y = REF_Y + TANGENT[1] * t + perp[1] * p;

    // xy → XYZ with Y = 1
    let src_xyz = [REF_X / REF_Y, 1.0, (1.0 - REF_X - REF_Y) / REF_Y];
    let dst_xyz = [dst_x / dst_y, 1.0, (1.0 - dst_x - dst_y) / dst_y];

    let src_cone = mat3_vec3(M, src_xyz);
    let dst_cone = mat3_vec3(M, dst_xyz);
    let scale = [
        dst_cone[0] / src_cone[0],
        dst_cone[1] / src_cone[1],
        dst_cone[2] / src_cone[2],
    ];

    let adapt = compose_bradford(M_INV, scale, M);
    let mut out = IDENTITY;
    for (row_out, row) in out.iter_mut().zip(adapt) {
        for (o, v) in row_out.iter_mut().zip(row) {
            *o = v as f32;
        }
    }
    out
}

/// Apply a precomputed white-balance matrix to one pixel.
#[inline]
pub fn apply_white_balance(rgb: [f32; 3], m: &Mat3) -> [f32; 3] {
    [
        m[0][0] * rgb[0] + m[0][1] * rgb[1] + m[0][2] * rgb[2],
        m[1][0] * rgb[0] + m[1][1] * rgb[1] + m[1][2] * rgb[2],
        m[2][0] * rgb[0] + m[2][1] * rgb[1] + m[2][2] * rgb[2],
    ]
}

fn mat3_vec3(m: [[f64; 3]; 3], v: [f64; 3]) -> [f64; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

/// M_INV × diag(s) × M in a single pass.
fn compose_bradford(m_inv: [[f64; 3]; 3], s: [f64; 3], m: [[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let sm = [
        [s[0] * m[0][0], s[0] * m[0][1], s[0] * m[0][2]],
        [s[1] * m[1][0], s[1] * m[1][1], s[1] * m[1][2]],
        [s[2] * m[2][0], s[2] * m[2][1], s[2] * m[2][2]],
    ];
    let mut out = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            out[i][j] = m_inv[i][0] * sm[0][j] + m_inv[i][1] * sm[1][j] + m_inv[i][2] * sm[2][j];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn wb(rgb: [f32; 3], temperature: f32, tint: f32) -> [f32; 3] {
        apply_white_balance(rgb, &white_balance_matrix(temperature, tint))
    }

    #[test]
    fn test_white_balance_zero_is_identity() {
        assert_eq!(white_balance_matrix(0.0, 0.0), IDENTITY);
        let rgb = [0.5, 0.4, 0.3];
        assert_eq!(wb(rgb, 0.0, 0.0), rgb);
    }

    #[test]
    fn test_white_balance_warm_shifts_toward_amber() {
        let result = wb([0.5, 0.5, 0.5], 1.0, 0.0);
        assert!(result[2] < 0.5, "blue should decrease when warming");
        assert!(result[0] > 0.5, "red should increase when warming");
    }

    #[test]
    fn test_white_balance_cool_shifts_toward_blue() {
        let result = wb([0.5, 0.5, 0.5], -1.0, 0.0);
        assert!(result[2] > 0.5, "blue should increase when cooling");
    }

    #[test]
    fn test_positive_tint_is_magenta() {
        let result = wb([0.5, 0.5, 0.5], 0.0, 1.0);
        assert!(result[0] > result[1] && result[2] > result[1], "{result:?}");
    }

    #[test]
    fn test_white_balance_preserves_black() {
        let result = wb([0.0, 0.0, 0.0], 0.5, 0.5);
        for c in result {
            assert!(c.abs() < EPSILON);
        }
    }

    #[test]
    fn test_non_finite_input_is_identity() {
        assert_eq!(white_balance_matrix(f32::NAN, 0.0), IDENTITY);
    }
}
