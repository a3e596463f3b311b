//! Bevy resources for the studio pipeline.

use bevy::prelude::*;
use tintbox_core::scopes::HistogramData;
use tintbox_core::{
    DraftStore, EditConfiguration, FrameSource, HistogramSampler, LutLibrary, RenderScheduler,
    SampleTicket, SettingsService, StudioConfig,
};
use tintbox_gpu::GpuCompositor;

/// The single source of truth for the edit within the ECS.
///
/// Only `handle_edit_commands` mutates `edit`; every change marks the
/// scheduler dirty so a paused frame re-renders once.
#[derive(Resource)]
pub struct EditState {
    pub edit: EditConfiguration,
    pub library: LutLibrary,
    pub scheduler: RenderScheduler,
}

impl Default for EditState {
    fn default() -> Self {
        Self {
            edit: EditConfiguration::default(),
            library: LutLibrary::builtin(),
            scheduler: RenderScheduler::new(),
        }
    }
}

/// Loaded studio configuration.
#[derive(Resource, Default, Clone)]
pub struct StudioSettings {
    pub config: StudioConfig,
}

/// The clip being graded. Hosts replace `source` to load a new clip.
#[derive(Resource, Default)]
pub struct SourceState {
    pub source: Option<Box<dyn FrameSource + Send + Sync>>,
}

impl SourceState {
    pub fn new(source: impl FrameSource + Send + Sync + 'static) -> Self {
        Self {
            source: Some(Box::new(source)),
        }
    }
}

/// Last displayed frame as RGBA8, ready for a texture upload.
#[derive(Resource, Default)]
pub struct ViewerData {
    pub pixel_bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub frame_index: usize,
}

impl ViewerData {
    pub fn is_empty(&self) -> bool {
        self.pixel_bytes.is_empty()
    }
}

/// Whether the viewer shows the graded composite or the raw clip.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewMode {
    #[default]
    Graded,
    /// The compositor is unavailable; frames are shown ungraded.
    PlainVideo,
}

/// Histogram cadence and the last accepted sample.
#[derive(Resource, Default)]
pub struct HistogramState {
    pub sampler: HistogramSampler,
    pub pending: Option<(SampleTicket, HistogramData)>,
    pub latest: Option<HistogramData>,
}

/// GPU compositor. Absent when no adapter could be created.
#[derive(Resource)]
pub struct GpuCompositorState {
    pub compositor: GpuCompositor,
}

/// Preferences and draft storage, rooted at the configured paths.
#[derive(Resource, Clone)]
pub struct StudioServices {
    pub preferences: SettingsService,
    pub drafts: DraftStore,
}

impl StudioServices {
    /// Open the services for `config`. Unreadable preferences fall back to
    /// fresh ones at the same path.
    pub fn open(config: &StudioConfig) -> Self {
        let preferences = SettingsService::load(&config.settings_path).unwrap_or_else(|e| {
            tracing::warn!("Starting with default preferences: {e}");
            SettingsService::new(&config.settings_path)
        });
        Self {
            preferences,
            drafts: DraftStore::new(&config.drafts_dir),
        }
    }
}
