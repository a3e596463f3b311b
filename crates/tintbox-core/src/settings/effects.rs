//! Spatial finishing effects applied after the color grade.

use serde::{Deserialize, Serialize};

/// Vignette, grain and chromatic aberration parameters.
///
/// Ranges:
/// - `grain_amount`, `vignette_amount`, `chromatic_aberration`: `[0, 1]`, 0 = off
/// - `grain_size`: `[1, 8]` pixels per noise cell
/// - `vignette_midpoint`: `[0, 1]`, normalized radius where darkening starts
/// - `vignette_feather`: `[0, 1]`, width of the falloff band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSettings {
    pub grain_amount: f32,
    pub grain_size: f32,
    pub vignette_amount: f32,
    pub vignette_midpoint: f32,
    pub vignette_feather: f32,
    pub chromatic_aberration: f32,
}

impl EffectSettings {
    /// Every effect disabled.
    pub const NONE: Self = Self {
        grain_amount: 0.0,
        grain_size: 1.0,
        vignette_amount: 0.0,
        vignette_midpoint: 0.5,
        vignette_feather: 0.5,
        chromatic_aberration: 0.0,
    };

    /// Copy with every field pulled into its documented range.
    ///
    /// Non-finite values fall back to the [`EffectSettings::NONE`] value.
    pub fn clamped(&self) -> Self {
        let fix = |v: f32, lo: f32, hi: f32, fallback: f32| {
            if v.is_finite() { v.clamp(lo, hi) } else { fallback }
        };
        let none = Self::NONE;
        Self {
            grain_amount: fix(self.grain_amount, 0.0, 1.0, none.grain_amount),
            grain_size: fix(self.grain_size, 1.0, 8.0, none.grain_size),
            vignette_amount: fix(self.vignette_amount, 0.0, 1.0, none.vignette_amount),
            vignette_midpoint: fix(self.vignette_midpoint, 0.0, 1.0, none.vignette_midpoint),
            vignette_feather: fix(self.vignette_feather, 0.0, 1.0, none.vignette_feather),
            chromatic_aberration: fix(
                self.chromatic_aberration,
                0.0,
                1.0,
                none.chromatic_aberration,
            ),
        }
    }

    /// True when no effect contributes to the output.
    pub fn is_inactive(&self) -> bool {
        self.grain_amount <= 0.0 && self.vignette_amount <= 0.0 && self.chromatic_aberration <= 0.0
    }
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self::NONE
    }
}
