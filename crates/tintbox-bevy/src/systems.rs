//! Bevy systems for the studio pipeline.
//!
//! These systems are the ONLY place edit state changes. The host sends
//! `EditCommand` messages, Bevy applies them, and pushes new state back via
//! outbound messages and the viewer/histogram resources.

use bevy::prelude::*;

use tintbox_core::composite::CompositeParams;
use tintbox_core::scopes::histogram;
use tintbox_core::{EditConfiguration, EditError, Frame, Lut3D, export};
use tintbox_gpu::{GpuCompositor, GpuError};

use crate::events::{EditCommand, EditUpdatedEvent, FrameRenderedEvent, HistogramReadyEvent};
use crate::resources::{
    EditState, GpuCompositorState, HistogramState, PreviewMode, SourceState, StudioServices,
    StudioSettings, ViewerData,
};

/// Apply inbound edit and transport commands.
///
/// Any change to the edit marks the scheduler dirty and invalidates
/// outstanding histogram samples. Storage commands are handled separately
/// by [`handle_storage_commands`].
pub fn handle_edit_commands(
    mut commands: MessageReader<EditCommand>,
    mut state: ResMut<EditState>,
    mut source: ResMut<SourceState>,
    mut hist: ResMut<HistogramState>,
    settings: Res<StudioSettings>,
    mut edit_updated: MessageWriter<EditUpdatedEvent>,
) {
    let mut edit_changed = false;

    for cmd in commands.read() {
        match cmd {
            // Transport changes are handled here rather than by
            // `track_source_changes`, which reacts to a new clip only.
            EditCommand::Play | EditCommand::Pause => {
                let Some(src) = source.bypass_change_detection().source.as_mut() else {
                    warn!("{cmd:?}: no source loaded");
                    continue;
                };
                src.set_playing(matches!(cmd, EditCommand::Play));
                let playing = src.is_playing();
                state.scheduler.set_playing(playing);
            }
            EditCommand::Seek(index) => {
                let Some(src) = source.bypass_change_detection().source.as_mut() else {
                    warn!("Seek: no source loaded");
                    continue;
                };
                match src.seek(*index) {
                    Ok(()) => {
                        state.scheduler.mark_dirty();
                        hist.sampler.invalidate();
                    }
                    Err(e) => warn!("Seek: {e}"),
                }
            }
            EditCommand::SaveDraft
            | EditCommand::ExportCube(_)
            | EditCommand::ExportProject(_) => {}
            _ => match apply_edit(&mut state.edit, cmd, &settings) {
                Ok(true) => edit_changed = true,
                Ok(false) => {}
                Err(e) => warn!("{cmd:?}: {e}"),
            },
        }
    }

    if edit_changed {
        state.scheduler.mark_dirty();
        hist.sampler.invalidate();
        edit_updated.write(EditUpdatedEvent {
            edit: state.edit.clone(),
        });
    }
}

/// Apply one edit command. Returns whether the edit actually changed.
///
/// Manual grades that break a settings invariant are rejected whole.
fn apply_edit(
    edit: &mut EditConfiguration,
    cmd: &EditCommand,
    settings: &StudioSettings,
) -> Result<bool, EditError> {
    let before = edit.clone();
    match cmd {
        EditCommand::SetManual(manual) => {
            manual.validate()?;
            edit.manual = *manual;
        }
        EditCommand::SetEffects(effects) => edit.effects = effects.clamped(),
        EditCommand::SetSplit(split) => edit.split = *split,
        EditCommand::ShowSplit(show) => {
            edit.split = match (show, edit.split) {
                (true, Some(split)) => Some(split),
                (true, None) => Some(settings.config.default_split()),
                (false, _) => None,
            };
        }
        EditCommand::PushLut { lut, blend_mode } => {
            edit.stack.push(lut.clone(), *blend_mode);
        }
        EditCommand::RemoveLut { id } => {
            edit.stack.remove(*id)?;
        }
        EditCommand::MoveLut { id, index } => edit.stack.move_to(*id, *index)?,
        EditCommand::SetOpacity { id, opacity } => edit.stack.set_opacity(*id, *opacity)?,
        EditCommand::SetBlendMode { id, blend_mode } => {
            edit.stack.set_blend_mode(*id, *blend_mode)?
        }
        EditCommand::SetEnabled { id, enabled } => edit.stack.set_enabled(*id, *enabled)?,
        EditCommand::ClearStack => edit.stack.clear(),
        EditCommand::Restore(restored) => {
            restored.validate()?;
            *edit = restored.clone();
        }
        EditCommand::Play
        | EditCommand::Pause
        | EditCommand::Seek(_)
        | EditCommand::SaveDraft
        | EditCommand::ExportCube(_)
        | EditCommand::ExportProject(_) => {}
    }
    Ok(*edit != before)
}

/// Write drafts and exports. Runs after [`handle_edit_commands`] so it sees
/// the edit as of the end of this tick's commands.
pub fn handle_storage_commands(
    mut commands: MessageReader<EditCommand>,
    state: Res<EditState>,
    settings: Res<StudioSettings>,
    services: Res<StudioServices>,
) {
    for cmd in commands.read() {
        match cmd {
            EditCommand::SaveDraft => {
                let session = services.preferences.session_id();
                match services.drafts.save(session, &state.edit) {
                    Ok(snapshot) => info!("Saved draft for session {}", snapshot.session_id),
                    Err(e) => error!("Failed to save draft: {e}"),
                }
            }
            EditCommand::ExportCube(path) => {
                let grade = state.edit.resolve_grade(&state.library);
                let result = Lut3D::bake(&grade, settings.config.lut_bake_size)
                    .and_then(|lut| lut.save_cube(path, "tintbox grade"));
                match result {
                    Ok(()) => info!("Exported LUT to {}", path.display()),
                    Err(e) => error!("Failed to export LUT to {}: {e}", path.display()),
                }
            }
            EditCommand::ExportProject(path) => {
                match export::save_project_xml(path, &state.edit, &state.library) {
                    Ok(()) => info!("Exported project to {}", path.display()),
                    Err(e) => error!("Failed to export project to {}: {e}", path.display()),
                }
            }
            _ => {}
        }
    }
}

/// Invalidate cached output when the host swaps in a new clip.
pub fn track_source_changes(
    source: Res<SourceState>,
    mut state: ResMut<EditState>,
    mut hist: ResMut<HistogramState>,
) {
    if !source.is_changed() {
        return;
    }
    let playing = source.source.as_ref().is_some_and(|s| s.is_playing());
    state.scheduler.set_playing(playing);
    state.scheduler.mark_dirty();
    hist.sampler.invalidate();
}

/// Step the clip by this tick's delta.
pub fn advance_playback(
    time: Res<Time>,
    mut source: ResMut<SourceState>,
    mut state: ResMut<EditState>,
) {
    // Playback position is not a "change" for `track_source_changes`.
    let Some(src) = source.bypass_change_detection().source.as_mut() else {
        return;
    };
    if src.advance(time.delta()) {
        trace!("Advanced to frame {}", src.frame_index());
    }
    if state.scheduler.is_playing() != src.is_playing() {
        state.scheduler.set_playing(src.is_playing());
    }
}

/// Composite the current frame when the scheduler asks for it.
///
/// On GPU failure the viewer falls back to the raw frame and the preview
/// mode is switched to [`PreviewMode::PlainVideo`] for the rest of the
/// session.
pub fn render_frame(
    mut state: ResMut<EditState>,
    source: Res<SourceState>,
    settings: Res<StudioSettings>,
    mut mode: ResMut<PreviewMode>,
    mut viewer: ResMut<ViewerData>,
    mut rendered: MessageWriter<FrameRenderedEvent>,
    gpu: Option<ResMut<GpuCompositorState>>,
) {
    let Some(src) = source.source.as_deref() else {
        return;
    };
    let Some(frame) = src.current_frame() else {
        return;
    };
    if !state.scheduler.should_render() {
        return;
    }

    let frame_index = src.frame_index();
    let pixel_bytes = match (gpu, *mode) {
        (Some(mut gpu), PreviewMode::Graded) => {
            let params = state.edit.composite_params(
                &state.library,
                settings.config.divider(),
                frame_index as u32,
            );
            match render_graded(&mut gpu.compositor, frame, &params) {
                Ok(bytes) => bytes,
                Err(e) => {
                    error!("GPU composite failed: {e}");
                    warn!("Falling back to plain video");
                    *mode = PreviewMode::PlainVideo;
                    frame.to_rgba8()
                }
            }
        }
        _ => frame.to_rgba8(),
    };

    viewer.pixel_bytes = pixel_bytes;
    viewer.width = frame.width;
    viewer.height = frame.height;
    viewer.frame_index = frame_index;

    rendered.write(FrameRenderedEvent {
        frame_index,
        width: frame.width,
        height: frame.height,
        mode: *mode,
    });
}

fn render_graded(
    compositor: &mut GpuCompositor,
    frame: &Frame,
    params: &CompositeParams,
) -> Result<Vec<u8>, GpuError> {
    compositor.upload_frame(frame)?;
    compositor.render(params)?;
    compositor.download_rgba8()
}

/// Take a histogram of the displayed frame when the sampler is due.
///
/// Runs after [`render_frame`], so the sample describes this tick's output.
/// The result is parked with its ticket; [`publish_histogram`] drops it if
/// the ticket was invalidated before it is published.
pub fn sample_histogram(
    time: Res<Time>,
    viewer: Res<ViewerData>,
    mode: Res<PreviewMode>,
    mut hist: ResMut<HistogramState>,
    gpu: Option<ResMut<GpuCompositorState>>,
) {
    if viewer.is_empty() {
        return;
    }
    let Some(ticket) = hist.sampler.poll(time.elapsed()) else {
        return;
    };
    let data = match (gpu, *mode) {
        (Some(mut gpu), PreviewMode::Graded) if gpu.compositor.has_frame() => {
            gpu.compositor.histogram().unwrap_or_else(|e| {
                debug!("GPU histogram failed, using CPU: {e}");
                histogram::compute_rgba8(&viewer.pixel_bytes)
            })
        }
        _ => histogram::compute_rgba8(&viewer.pixel_bytes),
    };
    hist.pending = Some((ticket, data));
}

/// Accept the parked histogram sample if its ticket is still current.
pub fn publish_histogram(
    mut hist: ResMut<HistogramState>,
    mut ready: MessageWriter<HistogramReadyEvent>,
) {
    let Some((ticket, data)) = hist.pending.take() else {
        return;
    };
    if hist.sampler.is_current(ticket) {
        hist.latest = Some(data);
        ready.write(HistogramReadyEvent);
    } else {
        debug!("Discarding stale histogram sample");
    }
}
