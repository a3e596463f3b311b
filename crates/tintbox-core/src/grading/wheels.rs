//! Lift/Gamma/Gain three-way color correction.
//!
//! # Formula
//! For each channel `c` in `{R, G, B}`:
//! ```text
//!   out = clamp(pow(max(in + lift[c], 0), 1 / gamma[c]) × gain[c], 0, 1)
//! ```
//!
//! ```text
//!   Input → +Lift → max(0) → ^(1/Gamma) → ×Gain → clamp[0,1] → Output
//! ```

use crate::settings::{MIN_GAMMA, Rgb};

/// Apply lift/gamma/gain to one pixel.
///
/// Never produces NaN: the base is clamped to zero before the power, gamma
/// is floored at [`MIN_GAMMA`], and any non-finite intermediate collapses
/// to the nearest bound. Gain of zero always yields zero for that channel.
pub fn apply_lift_gamma_gain(rgb: [f32; 3], lift: &Rgb, gamma: &Rgb, gain: &Rgb) -> [f32; 3] {
    let lift = lift.to_array();
    let gamma = gamma.to_array();
    let gain = gain.to_array();

    let mut out = [0.0_f32; 3];
    for c in 0..3 {
        // NaN.max(0.0) is 0.0, so a NaN input is pulled to black here.
        let base = (rgb[c] + lift[c]).max(0.0);
        let g = if gamma[c] > MIN_GAMMA { gamma[c] } else { MIN_GAMMA };
        let powered = base.powf(1.0 / g);
        out[c] = clamp_unit(powered * gain[c].max(0.0));
    }
    out
}

/// Clamp to `[0, 1]`, sending NaN (e.g. `inf × 0`) to zero.
#[inline]
pub(crate) fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    #[test]
    fn test_identity_is_passthrough() {
        let rgb = [0.5, 0.3, 0.7];
        let result = apply_lift_gamma_gain(rgb, &Rgb::ZERO, &Rgb::ONE, &Rgb::ONE);
        for i in 0..3 {
            assert!(
                (result[i] - rgb[i]).abs() < EPSILON,
                "channel {i}: {:.8} vs {:.8}",
                result[i],
                rgb[i]
            );
        }
    }

    #[test]
    fn test_gain_zero_kills_channel() {
        let gain = Rgb::new(1.0, 0.0, 1.0);
        for rgb in [[0.0, 0.0, 0.0], [0.2, 0.9, 0.4], [1.0, 1.0, 1.0]] {
            let result = apply_lift_gamma_gain(rgb, &Rgb::ZERO, &Rgb::ONE, &gain);
            assert_eq!(result[1], 0.0);
        }
    }

    #[test]
    fn test_gain_zero_with_extreme_lift_is_not_nan() {
        let lift = Rgb::splat(f32::MAX);
        let gamma = Rgb::splat(MIN_GAMMA);
        let gain = Rgb::new(0.0, 1.0, 2.0);
        let result = apply_lift_gamma_gain([0.5; 3], &lift, &gamma, &gain);
        assert_eq!(result, [0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_extreme_negative_lift_clamps_to_black() {
        let result = apply_lift_gamma_gain([0.8; 3], &Rgb::splat(-1e9), &Rgb::ONE, &Rgb::ONE);
        assert_eq!(result, [0.0; 3]);
    }

    #[test]
    fn test_gamma_above_one_brightens_midtones() {
        let result = apply_lift_gamma_gain([0.25; 3], &Rgb::ZERO, &Rgb::splat(2.0), &Rgb::ONE);
        assert!((result[0] - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_lift_raises_black() {
        let result = apply_lift_gamma_gain([0.0; 3], &Rgb::splat(0.1), &Rgb::ONE, &Rgb::ONE);
        for c in result {
            assert!((c - 0.1).abs() < EPSILON);
        }
    }

    #[test]
    fn test_nan_input_maps_to_black() {
        let result = apply_lift_gamma_gain([f32::NAN, 0.5, 0.5], &Rgb::ZERO, &Rgb::ONE, &Rgb::ONE);
        assert_eq!(result[0], 0.0);
    }
}
