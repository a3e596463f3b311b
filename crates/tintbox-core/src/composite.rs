//! CPU reference compositor. The GPU `composite.wgsl` mirrors this exactly.
//!
//! Per pixel, in order:
//! 1. White balance (temperature/tint)
//! 2. Lift/gamma/gain, clamped to `[0, 1]`
//! 3. Contrast, then saturation
//! 4. Shadows/highlights
//! 5. Vignette
//! 6. Grain
//! 7. Chromatic aberration: red and blue take steps 1–6 evaluated at
//!    radially offset sample positions
//!
//! Split view then picks, per column, the graded result, the raw source, or
//! the divider color.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::frame::Frame;
use crate::grading::effects::{aberration_uvs, grain_offset, vignette_factor};
use crate::grading::sliders::{apply_contrast, apply_saturation, apply_shadows_highlights};
use crate::grading::wheels::{apply_lift_gamma_gain, clamp_unit};
use crate::grading::white_balance::{Mat3, apply_white_balance, white_balance_matrix};
use crate::settings::{ColorSettings, EffectSettings};
use crate::split::{SplitRegion, SplitView};

/// Split-view divider appearance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Divider {
    /// Width in output pixels. 0 disables the divider.
    pub width_px: f32,
    /// Straight RGBA color.
    pub color: [f32; 4],
}

impl Default for Divider {
    fn default() -> Self {
        Self {
            width_px: 2.0,
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

/// Everything the compositor needs for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CompositeParams {
    pub settings: ColorSettings,
    pub effects: EffectSettings,
    pub split: Option<SplitView>,
    pub divider: Divider,
    /// Seeds the grain so it animates between frames.
    pub frame_index: u32,
}

/// A grade prepared for per-pixel evaluation.
///
/// Building one computes the white-balance matrix and clamps effect ranges
/// once, so the per-pixel work is just arithmetic.
#[derive(Debug, Clone)]
pub struct GradeKernel {
    settings: ColorSettings,
    effects: EffectSettings,
    white_balance: Mat3,
    seed: u32,
}

impl GradeKernel {
    pub fn new(settings: &ColorSettings, effects: &EffectSettings, frame_index: u32) -> Self {
        Self {
            settings: *settings,
            effects: effects.clamped(),
            white_balance: white_balance_matrix(settings.temperature, settings.tint),
            seed: frame_index,
        }
    }

    pub fn settings(&self) -> &ColorSettings {
        &self.settings
    }

    /// Effect parameters after range clamping.
    pub fn effects(&self) -> &EffectSettings {
        &self.effects
    }

    /// Precomputed white-balance matrix, for uploading as a uniform.
    pub fn white_balance(&self) -> &Mat3 {
        &self.white_balance
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Position-independent stages 1–4. Output is always in `[0, 1]`.
    pub fn grade_color(&self, rgb: [f32; 3]) -> [f32; 3] {
        let s = &self.settings;
        let rgb = apply_white_balance(rgb, &self.white_balance);
        let rgb = apply_lift_gamma_gain(rgb, &s.lift, &s.gamma, &s.gain);
        let rgb = apply_contrast(rgb, s.contrast);
        let rgb = apply_saturation(rgb, s.saturation);
        let rgb = apply_shadows_highlights(rgb, s.shadows, s.highlights);
        rgb.map(clamp_unit)
    }

    /// Stages 1–6 for the source texel under `uv`.
    fn shade(&self, frame: &Frame, uv: Vec2) -> [f32; 3] {
        let (x, y) = frame.texel_at(uv);
        let src = frame.get(x, y);
        let fx = &self.effects;

        let graded = self.grade_color([src[0], src[1], src[2]]);
        let vignette = vignette_factor(
            uv,
            fx.vignette_amount,
            fx.vignette_midpoint,
            fx.vignette_feather,
        );
        let grain = grain_offset(x, y, fx.grain_size, fx.grain_amount, self.seed);
        graded.map(|c| clamp_unit(c * vignette + grain))
    }

    /// Fully graded RGBA for output pixel `(x, y)`, ignoring split view.
    pub fn render_pixel(&self, frame: &Frame, x: u32, y: u32) -> [f32; 4] {
        let uv = Vec2::new(
            (x as f32 + 0.5) / frame.width as f32,
            (y as f32 + 0.5) / frame.height as f32,
        );
        let alpha = frame.get(x, y)[3];
        let center = self.shade(frame, uv);
        if self.effects.chromatic_aberration <= 0.0 {
            return [center[0], center[1], center[2], alpha];
        }
        let (red_uv, blue_uv) = aberration_uvs(uv, self.effects.chromatic_aberration);
        let red = self.shade(frame, red_uv)[0];
        let blue = self.shade(frame, blue_uv)[2];
        [red, center[1], blue, alpha]
    }
}

/// Grade a single color with no spatial effects.
pub fn grade_pixel(rgb: [f32; 3], settings: &ColorSettings) -> [f32; 3] {
    GradeKernel::new(settings, &EffectSettings::NONE, 0).grade_color(rgb)
}

/// Render a whole frame on the CPU.
pub fn composite_frame(frame: &Frame, params: &CompositeParams) -> Frame {
    if frame.is_empty() {
        return frame.clone();
    }
    let kernel = GradeKernel::new(&params.settings, &params.effects, params.frame_index);
    let mut pixels = Vec::with_capacity(frame.pixel_count());
    for y in 0..frame.height {
        for x in 0..frame.width {
            let region = match params.split {
                Some(split) => split.region(x, frame.width, params.divider.width_px),
                None => SplitRegion::Graded,
            };
            pixels.push(match region {
                SplitRegion::Graded => kernel.render_pixel(frame, x, y),
                SplitRegion::Raw => frame.get(x, y),
                SplitRegion::Divider => params.divider.color,
            });
        }
    }
    Frame {
        width: frame.width,
        height: frame.height,
        pixels,
    }
}
