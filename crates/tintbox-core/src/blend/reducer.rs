//! Flattens a LUT stack into one [`ColorSettings`].
//!
//! # Per-field rules
//! Each participating layer is folded into the running result, bottom to top:
//!
//! ```text
//! blend-mode fields (contrast, saturation, lift/gamma/gain channels):
//!   n_b = normalize(running), n_s = normalize(layer)
//!   blended = denormalize(mode(n_b, n_s))         // Normal: blended = layer
//!   running = running × (1 − w) + blended × w      // w = opacity / 100
//!
//! additive fields (temperature, tint, shadows, highlights):
//!   running = running + layer × w                  // blend mode ignored
//! ```
//!
//! Additive fields intentionally ignore the blend mode. Looks that shift
//! white balance or tones stack by accumulation no matter how they are
//! composited.

use tracing::warn;

use crate::blend::{BlendMode, StackedLut, blend_channel};
use crate::lut::LutSource;
use crate::settings::{ColorSettings, MIN_GAMMA, Rgb};

/// Unit range a blend-mode field is normalized over before blending.
#[derive(Debug, Clone, Copy)]
struct FieldRange {
    min: f32,
    max: f32,
}

impl FieldRange {
    const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    fn normalize(self, v: f32) -> f32 {
        (v - self.min) / (self.max - self.min)
    }

    fn denormalize(self, n: f32) -> f32 {
        self.min + n * (self.max - self.min)
    }
}

const CONTRAST_RANGE: FieldRange = FieldRange::new(0.0, 2.0);
const SATURATION_RANGE: FieldRange = FieldRange::new(0.0, 2.0);
const LIFT_RANGE: FieldRange = FieldRange::new(-1.0, 1.0);
const GAMMA_RANGE: FieldRange = FieldRange::new(0.0, 4.0);
const GAIN_RANGE: FieldRange = FieldRange::new(0.0, 4.0);

/// Reduce an ordered stack to a single grade.
///
/// Entries that are disabled or at zero opacity are skipped outright, as are
/// entries whose look `source` cannot resolve. An empty or fully skipped
/// stack yields [`ColorSettings::NEUTRAL`] exactly.
///
/// Pure: the same entries in the same order always give bit-identical output.
pub fn blend<S: LutSource + ?Sized>(stack: &[StackedLut], source: &S) -> ColorSettings {
    let mut running = ColorSettings::NEUTRAL;
    for entry in stack.iter().filter(|e| e.participates()) {
        let Some(look) = source.resolve(&entry.lut) else {
            warn!("Skipping stack entry {}: unknown LUT '{}'", entry.id, entry.lut);
            continue;
        };
        running = apply_layer(&running, &look, entry.blend_mode, entry.weight());
    }
    running
}

/// Reduce the stack, then apply the manual slider grade on top.
///
/// Manual adjustments are relative to the stacked look: contrast, saturation,
/// gamma and gain multiply; lift and the additive fields add. A neutral
/// `manual` therefore leaves the stacked result untouched.
pub fn compose<S: LutSource + ?Sized>(
    stack: &[StackedLut],
    manual: &ColorSettings,
    source: &S,
) -> ColorSettings {
    let base = blend(stack, source);
    ColorSettings {
        contrast: base.contrast * manual.contrast,
        saturation: base.saturation * manual.saturation,
        temperature: base.temperature + manual.temperature,
        tint: base.tint + manual.tint,
        shadows: base.shadows + manual.shadows,
        highlights: base.highlights + manual.highlights,
        lift: base.lift.zip_with(manual.lift, |a, b| a + b),
        gamma: base
            .gamma
            .zip_with(manual.gamma, |a, b| (a * b).max(MIN_GAMMA)),
        gain: base.gain.zip_with(manual.gain, |a, b| a * b),
    }
}

/// Composite one look over the running result.
fn apply_layer(
    running: &ColorSettings,
    look: &ColorSettings,
    mode: BlendMode,
    weight: f32,
) -> ColorSettings {
    let field = |b: f32, s: f32, range: FieldRange| blend_field(b, s, mode, weight, range);
    let channels = |b: Rgb, s: Rgb, range: FieldRange| b.zip_with(s, |b, s| field(b, s, range));
    let additive = |b: f32, s: f32| b + s * weight;

    ColorSettings {
        contrast: field(running.contrast, look.contrast, CONTRAST_RANGE).max(0.0),
        saturation: field(running.saturation, look.saturation, SATURATION_RANGE).max(0.0),
        temperature: additive(running.temperature, look.temperature),
        tint: additive(running.tint, look.tint),
        shadows: additive(running.shadows, look.shadows),
        highlights: additive(running.highlights, look.highlights),
        lift: channels(running.lift, look.lift, LIFT_RANGE),
        gamma: channels(running.gamma, look.gamma, GAMMA_RANGE).map(|g| g.max(MIN_GAMMA)),
        gain: channels(running.gain, look.gain, GAIN_RANGE).map(|g| g.max(0.0)),
    }
}

fn blend_field(backdrop: f32, source: f32, mode: BlendMode, weight: f32, range: FieldRange) -> f32 {
    let blended = match mode {
        BlendMode::Normal => source,
        _ => range.denormalize(blend_channel(
            range.normalize(backdrop),
            range.normalize(source),
            mode,
        )),
    };
    // Written as a weighted sum so weight = 1 reproduces `blended` exactly.
    backdrop * (1.0 - weight) + blended * weight
}
