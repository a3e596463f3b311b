//! The complete, serializable edit state of one clip.

use serde::{Deserialize, Serialize};

use crate::blend::{LutStack, StackError, compose};
use crate::composite::{CompositeParams, Divider};
use crate::lut::LutSource;
use crate::settings::{ColorSettings, EffectSettings, SettingsError};
use crate::split::SplitView;

/// Why an edit was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditError {
    #[error(transparent)]
    Stack(#[from] StackError),
    #[error("invalid manual settings: {0}")]
    Settings(#[from] SettingsError),
}

/// Everything the user has dialed in: the look stack, manual sliders,
/// finishing effects and the optional before/after split.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditConfiguration {
    pub stack: LutStack,
    pub manual: ColorSettings,
    pub effects: EffectSettings,
    pub split: Option<SplitView>,
}

impl EditConfiguration {
    /// Check the manual grade. Effects and split are normalized on use.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.manual.validate()
    }

    /// The single grade the compositor should apply.
    pub fn resolve_grade<S: LutSource + ?Sized>(&self, source: &S) -> ColorSettings {
        compose(self.stack.entries(), &self.manual, source)
    }

    /// Compositor parameters for one frame.
    pub fn composite_params<S: LutSource + ?Sized>(
        &self,
        source: &S,
        divider: Divider,
        frame_index: u32,
    ) -> CompositeParams {
        CompositeParams {
            settings: self.resolve_grade(source),
            effects: self.effects.clamped(),
            split: self.split,
            divider,
            frame_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blend::BlendMode;
    use crate::lut::{LutLibrary, LutRef};

    #[test]
    fn test_default_resolves_to_neutral() {
        let edit = EditConfiguration::default();
        assert_eq!(edit.resolve_grade(&LutLibrary::builtin()), ColorSettings::NEUTRAL);
    }

    #[test]
    fn test_manual_sliders_apply_over_stack() {
        let lib = LutLibrary::builtin();
        let mut edit = EditConfiguration::default();
        edit.stack.push(LutRef::from("bleach-bypass"), BlendMode::Normal);
        let stacked = edit.resolve_grade(&lib);

        edit.manual = ColorSettings::NEUTRAL.with_saturation(0.5);
        let adjusted = edit.resolve_grade(&lib);
        assert!((adjusted.saturation - stacked.saturation * 0.5).abs() < 1e-6);
        assert_eq!(adjusted.contrast, stacked.contrast);
    }

    #[test]
    fn test_json_round_trip() {
        let mut edit = EditConfiguration::default();
        edit.stack.push(LutRef::from("warm-film"), BlendMode::Overlay);
        edit.manual = ColorSettings::NEUTRAL.with_contrast(1.2);
        edit.split = Some(SplitView::new(0.3));
        let json = serde_json::to_string(&edit).unwrap();
        let back: EditConfiguration = serde_json::from_str(&json).unwrap();
        assert_eq!(back, edit);
    }

    #[test]
    fn test_missing_fields_default() {
        let edit: EditConfiguration = serde_json::from_str("{}").unwrap();
        assert_eq!(edit, EditConfiguration::default());
    }

    #[test]
    fn test_validate_checks_manual_grade() {
        let mut edit = EditConfiguration::default();
        assert!(edit.validate().is_ok());
        edit.manual.gain = crate::settings::Rgb::new(1.0, -0.5, 1.0);
        assert!(matches!(
            edit.validate(),
            Err(SettingsError::Negative { field: "gain", .. })
        ));
    }
}
