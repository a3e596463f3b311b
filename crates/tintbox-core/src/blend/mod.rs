//! LUT stacking: blend-mode math, the ordered stack and the reducer that
//! flattens a stack into a single [`ColorSettings`](crate::settings::ColorSettings).

pub mod reducer;
pub mod stack;

use serde::{Deserialize, Serialize};

pub use reducer::{blend, compose};
pub use stack::{LutStack, StackError, StackedLut};

/// Photographic compositing formula used to combine a look with the layers below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    /// Source replaces backdrop.
    #[default]
    Normal,
    /// Darken by multiplication.
    Multiply,
    /// Lighten (inverse multiply).
    Screen,
    /// Multiply or screen depending on the backdrop.
    Overlay,
    /// Gentle dodge/burn (W3C formula).
    SoftLight,
    /// Multiply or screen depending on the source.
    HardLight,
}

impl BlendMode {
    /// Label for menus and status text.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Multiply => "Multiply",
            Self::Screen => "Screen",
            Self::Overlay => "Overlay",
            Self::SoftLight => "Soft Light",
            Self::HardLight => "Hard Light",
        }
    }

    pub fn all() -> &'static [Self] {
        const ALL: [BlendMode; 6] = [
            BlendMode::Normal,
            BlendMode::Multiply,
            BlendMode::Screen,
            BlendMode::Overlay,
            BlendMode::SoftLight,
            BlendMode::HardLight,
        ];
        &ALL
    }
}

/// Blend one `[0, 1]`-normalized channel.
///
/// `backdrop` is the running result from the layers below, `source` the layer
/// being composited on top. Inputs outside `[0, 1]` are clamped first so the
/// square root in soft light stays real.
#[inline]
pub fn blend_channel(backdrop: f32, source: f32, mode: BlendMode) -> f32 {
    let b = backdrop.clamp(0.0, 1.0);
    let s = source.clamp(0.0, 1.0);
    match mode {
        BlendMode::Normal => s,
        BlendMode::Multiply => b * s,
        BlendMode::Screen => 1.0 - (1.0 - b) * (1.0 - s),
        BlendMode::Overlay => hard_light(s, b),
        BlendMode::HardLight => hard_light(b, s),
        BlendMode::SoftLight => {
            if s <= 0.5 {
                b - (1.0 - 2.0 * s) * b * (1.0 - b)
            } else {
                let d = if b <= 0.25 {
                    ((16.0 * b - 12.0) * b + 4.0) * b
                } else {
                    b.sqrt()
                };
                b + (2.0 * s - 1.0) * (d - b)
            }
        }
    }
}

/// Overlay is hard light with the layers swapped.
#[inline]
fn hard_light(b: f32, s: f32) -> f32 {
    if s <= 0.5 {
        b * 2.0 * s
    } else {
        1.0 - (1.0 - b) * (1.0 - (2.0 * s - 1.0))
    }
}
