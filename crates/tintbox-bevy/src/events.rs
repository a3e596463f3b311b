//! Bevy messages for cross-system communication in the studio pipeline.

use std::path::PathBuf;

use bevy::prelude::*;
use tintbox_core::blend::BlendMode;
use tintbox_core::{ColorSettings, EditConfiguration, EffectSettings, LutRef, SplitView};

use crate::resources::PreviewMode;

/// Inbound edits from the host UI. Applied in arrival order, so when several
/// land in one tick the last write wins.
#[derive(Message, Debug, Clone, PartialEq)]
pub enum EditCommand {
    /// Replace the manual slider settings.
    SetManual(ColorSettings),
    SetEffects(EffectSettings),
    SetSplit(Option<SplitView>),
    /// Turn the split on at the configured position, or off.
    ShowSplit(bool),
    /// Add a look on top of the stack.
    PushLut { lut: LutRef, blend_mode: BlendMode },
    RemoveLut { id: u64 },
    MoveLut { id: u64, index: usize },
    SetOpacity { id: u64, opacity: f32 },
    SetBlendMode { id: u64, blend_mode: BlendMode },
    SetEnabled { id: u64, enabled: bool },
    ClearStack,
    /// Swap in a whole edit, e.g. one restored from a draft.
    Restore(EditConfiguration),
    Play,
    Pause,
    Seek(usize),
    /// Snapshot the edit under the current session.
    SaveDraft,
    /// Bake the resolved grade into a `.cube` at the configured size.
    ExportCube(PathBuf),
    ExportProject(PathBuf),
}

/// Fired after the edit state changed in response to commands.
#[derive(Message)]
pub struct EditUpdatedEvent {
    pub edit: EditConfiguration,
}

/// Fired when `ViewerData` holds a freshly rendered frame.
#[derive(Message)]
pub struct FrameRenderedEvent {
    pub frame_index: usize,
    pub width: u32,
    pub height: u32,
    pub mode: PreviewMode,
}

/// Fired when a histogram sample has been accepted into `HistogramState`.
#[derive(Message)]
pub struct HistogramReadyEvent;
