//! Tintbox Core: domain layer for real-time color grading.
//!
//! Settings types, the LUT stack and its blend reducer, per-pixel grading
//! math, the CPU reference compositor, histogram, render cadence, and the
//! storage services around them. No GPU or framework dependencies.

pub mod blend;
pub mod composite;
pub mod config;
pub mod draft;
pub mod edit;
pub mod export;
pub mod frame;
pub mod grading;
pub mod lut;
pub mod preferences;
pub mod scopes;
pub mod settings;
pub mod source;
pub mod split;
pub mod timing;

// Re-exports for convenience.
pub use blend::{BlendMode, LutStack, StackError, StackedLut, blend, compose};
pub use composite::{CompositeParams, Divider, GradeKernel, composite_frame, grade_pixel};
pub use config::{ConfigError, StudioConfig};
pub use draft::{DraftError, DraftSnapshot, DraftStore};
pub use edit::{EditConfiguration, EditError};
pub use export::{Lut3D, LutError};
pub use frame::{Frame, FrameError};
pub use lut::{LutLibrary, LutRef, LutSource};
pub use preferences::{PreferencesError, SettingsService};
pub use scopes::HistogramData;
pub use settings::{ColorSettings, EffectSettings, Rgb, SettingsError};
pub use source::{FrameSequence, FrameSource};
pub use split::{GradedSide, SplitRegion, SplitView};
pub use timing::{HistogramSampler, RenderScheduler, SampleTicket};
