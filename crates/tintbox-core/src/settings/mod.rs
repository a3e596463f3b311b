//! Grade parameter types.
//!
//! `ColorSettings` is the single value every grading tool produces and the
//! compositor consumes. The LUT stack reducer folds a stack of looks into one
//! of these; the CPU reference and the GPU shader both read the full struct.

pub mod effects;

use serde::{Deserialize, Serialize};

pub use effects::EffectSettings;

/// Smallest gamma the pipeline will divide by.
pub const MIN_GAMMA: f32 = 1e-3;

/// Per-channel triple used by the lift/gamma/gain wheels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const ZERO: Self = Self::splat(0.0);
    pub const ONE: Self = Self::splat(1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Same value on all three channels.
    pub const fn splat(v: f32) -> Self {
        Self { r: v, g: v, b: v }
    }

    pub const fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub const fn from_array(v: [f32; 3]) -> Self {
        Self {
            r: v[0],
            g: v[1],
            b: v[2],
        }
    }

    /// Apply `f` to each channel.
    pub fn map(self, mut f: impl FnMut(f32) -> f32) -> Self {
        Self {
            r: f(self.r),
            g: f(self.g),
            b: f(self.b),
        }
    }

    /// Combine two triples channel by channel.
    pub fn zip_with(self, other: Self, mut f: impl FnMut(f32, f32) -> f32) -> Self {
        Self {
            r: f(self.r, other.r),
            g: f(self.g, other.g),
            b: f(self.b, other.b),
        }
    }

    fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }
}

/// Which [`ColorSettings`] field broke an invariant.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    #[error("{field} is not finite")]
    NotFinite { field: &'static str },
    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: f32 },
    #[error("gamma.{channel} must be strictly positive, got {value}")]
    NonPositiveGamma { channel: char, value: f32 },
}

/// The full primary grade: white balance, tonal sliders and the three wheels.
///
/// Value object. Edits go through the `with_*` builders, which hand back a
/// fresh instance and leave the original untouched.
///
/// Units:
/// - `temperature`, `tint`, `shadows`, `highlights`: `[-1, 1]`, 0 = neutral
/// - `contrast`, `saturation`: `[0, 2]`, 1 = neutral
/// - `lift`: `[-1, 1]`, `gamma`: `(0, 4]`, `gain`: `[0, 4]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorSettings {
    /// Contrast multiplier around mid-grey.
    pub contrast: f32,
    /// Chroma multiplier relative to Rec. 709 luma.
    pub saturation: f32,
    /// Blue (negative) to amber (positive) white-balance shift.
    pub temperature: f32,
    /// Green (negative) to magenta (positive) white-balance shift.
    pub tint: f32,
    /// Shadow lift/crush.
    pub shadows: f32,
    /// Highlight recovery/boost.
    pub highlights: f32,
    /// Shadow offset per channel. Default `0`.
    pub lift: Rgb,
    /// Midtone power per channel. Default `1`.
    pub gamma: Rgb,
    /// Highlight multiplier per channel. Default `1`.
    pub gain: Rgb,
}

impl ColorSettings {
    /// Identity grade. Every pixel passes through unchanged.
    pub const NEUTRAL: Self = Self {
        contrast: 1.0,
        saturation: 1.0,
        temperature: 0.0,
        tint: 0.0,
        shadows: 0.0,
        highlights: 0.0,
        lift: Rgb::ZERO,
        gamma: Rgb::ONE,
        gain: Rgb::ONE,
    };

    pub fn with_contrast(self, contrast: f32) -> Self {
        Self { contrast, ..self }
    }

    pub fn with_saturation(self, saturation: f32) -> Self {
        Self { saturation, ..self }
    }

    pub fn with_white_balance(self, temperature: f32, tint: f32) -> Self {
        Self {
            temperature,
            tint,
            ..self
        }
    }

    pub fn with_tones(self, shadows: f32, highlights: f32) -> Self {
        Self {
            shadows,
            highlights,
            ..self
        }
    }

    pub fn with_lift(self, lift: Rgb) -> Self {
        Self { lift, ..self }
    }

    pub fn with_gamma(self, gamma: Rgb) -> Self {
        Self { gamma, ..self }
    }

    pub fn with_gain(self, gain: Rgb) -> Self {
        Self { gain, ..self }
    }

    /// True when this grade leaves every pixel untouched.
    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }

    /// Check the invariants the shader relies on.
    ///
    /// Gamma is used as a divisor in the power term, so it has to be strictly
    /// positive. Gain of zero is allowed and simply kills that channel.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let scalars = [
            ("contrast", self.contrast),
            ("saturation", self.saturation),
            ("temperature", self.temperature),
            ("tint", self.tint),
            ("shadows", self.shadows),
            ("highlights", self.highlights),
        ];
        for (field, value) in scalars {
            if !value.is_finite() {
                return Err(SettingsError::NotFinite { field });
            }
        }
        for (field, value) in [("lift", self.lift), ("gamma", self.gamma), ("gain", self.gain)] {
            if !value.is_finite() {
                return Err(SettingsError::NotFinite { field });
            }
        }
        for (field, value) in [("contrast", self.contrast), ("saturation", self.saturation)] {
            if value < 0.0 {
                return Err(SettingsError::Negative { field, value });
            }
        }
        for (channel, value) in ['r', 'g', 'b'].into_iter().zip(self.gamma.to_array()) {
            if value <= 0.0 {
                return Err(SettingsError::NonPositiveGamma { channel, value });
            }
        }
        if let Some(&value) = self.gain.to_array().iter().find(|v| **v < 0.0) {
            return Err(SettingsError::Negative {
                field: "gain",
                value,
            });
        }
        Ok(())
    }
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_neutral() {
        assert!(ColorSettings::default().is_neutral());
        assert!(ColorSettings::NEUTRAL.validate().is_ok());
    }

    #[test]
    fn test_builders_leave_original_untouched() {
        let base = ColorSettings::NEUTRAL;
        let edited = base.with_contrast(1.4).with_gain(Rgb::new(1.1, 1.0, 0.9));
        assert!(base.is_neutral());
        assert_eq!(edited.contrast, 1.4);
        assert_eq!(edited.gain.b, 0.9);
        assert_eq!(edited.saturation, 1.0);
    }

    #[test]
    fn test_validate_rejects_zero_gamma() {
        let s = ColorSettings::NEUTRAL.with_gamma(Rgb::new(1.0, 0.0, 1.0));
        assert_eq!(
            s.validate(),
            Err(SettingsError::NonPositiveGamma {
                channel: 'g',
                value: 0.0
            })
        );
    }

    #[test]
    fn test_validate_allows_zero_gain_but_not_negative() {
        let zero = ColorSettings::NEUTRAL.with_gain(Rgb::new(0.0, 1.0, 1.0));
        assert!(zero.validate().is_ok());

        let negative = ColorSettings::NEUTRAL.with_gain(Rgb::new(1.0, -0.5, 1.0));
        assert!(matches!(
            negative.validate(),
            Err(SettingsError::Negative { field: "gain", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_nan() {
        let s = ColorSettings::NEUTRAL.with_white_balance(f32::NAN, 0.0);
        assert_eq!(
            s.validate(),
            Err(SettingsError::NotFinite {
                field: "temperature"
            })
        );
    }

    #[test]
    fn test_missing_fields_deserialize_to_neutral() {
        let s: ColorSettings = serde_json::from_str(r#"{"contrast": 1.2}"#).unwrap();
        assert_eq!(s.contrast, 1.2);
        assert_eq!(s.gamma, Rgb::ONE);
    }
}
