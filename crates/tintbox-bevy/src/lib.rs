//! Tintbox Bevy plugin: drives the grading pipeline from Bevy's ECS.
//!
//! Provides [`TintboxPlugin`], which registers the resources, messages and
//! systems that turn `EditCommand`s into rendered viewer frames and
//! interval histogram samples.

pub mod events;
pub mod resources;
pub mod systems;

use bevy::prelude::*;
use tintbox_core::{HistogramSampler, StudioConfig};
use tintbox_gpu::GpuCompositor;

use events::{EditCommand, EditUpdatedEvent, FrameRenderedEvent, HistogramReadyEvent};
use resources::{
    EditState, GpuCompositorState, HistogramState, PreviewMode, SourceState, StudioServices,
    StudioSettings, ViewerData,
};
use systems::{
    advance_playback, handle_edit_commands, handle_storage_commands, publish_histogram,
    render_frame, sample_histogram, track_source_changes,
};

/// Main Bevy plugin for the Tintbox grading pipeline.
///
/// Per tick: apply edit commands, advance playback, composite if the render
/// scheduler asks for it, then sample the histogram of the frame on screen.
/// Without a GPU the viewer shows plain video.
pub struct TintboxPlugin {
    pub config: StudioConfig,
    /// Create the GPU compositor at startup.
    pub use_gpu: bool,
}

impl Default for TintboxPlugin {
    fn default() -> Self {
        Self {
            config: StudioConfig::default(),
            use_gpu: true,
        }
    }
}

impl TintboxPlugin {
    pub fn with_config(config: StudioConfig) -> Self {
        Self {
            config,
            use_gpu: true,
        }
    }

    /// No GPU compositor; frames are shown ungraded.
    pub fn headless(config: StudioConfig) -> Self {
        Self {
            config,
            use_gpu: false,
        }
    }
}

impl Plugin for TintboxPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<EditCommand>()
            .add_message::<EditUpdatedEvent>()
            .add_message::<FrameRenderedEvent>()
            .add_message::<HistogramReadyEvent>()
            .insert_resource(StudioSettings {
                config: self.config.clone(),
            })
            .insert_resource(StudioServices::open(&self.config))
            .insert_resource(HistogramState {
                sampler: HistogramSampler::new(self.config.histogram_interval()),
                ..Default::default()
            })
            .init_resource::<EditState>()
            .init_resource::<SourceState>()
            .init_resource::<ViewerData>()
            .add_systems(
                Update,
                (
                    handle_edit_commands,
                    handle_storage_commands.after(handle_edit_commands),
                    track_source_changes.after(handle_edit_commands),
                    advance_playback.after(track_source_changes),
                    render_frame.after(advance_playback),
                    sample_histogram.after(render_frame),
                    publish_histogram.after(sample_histogram),
                ),
            );

        if self.use_gpu {
            app.init_resource::<PreviewMode>()
                .add_systems(Startup, init_gpu_pipeline);
        } else {
            app.insert_resource(PreviewMode::PlainVideo);
        }
    }
}

/// Startup system: create the GPU compositor and insert it as a resource.
fn init_gpu_pipeline(mut commands: Commands, mut mode: ResMut<PreviewMode>) {
    match GpuCompositor::create_blocking() {
        Ok(compositor) => {
            tracing::info!("GPU compositor initialized");
            commands.insert_resource(GpuCompositorState { compositor });
            *mode = PreviewMode::Graded;
        }
        Err(e) => {
            tracing::error!("Failed to initialize GPU compositor: {e}");
            tracing::warn!("Preview will show plain video without grading");
            *mode = PreviewMode::PlainVideo;
        }
    }
}
