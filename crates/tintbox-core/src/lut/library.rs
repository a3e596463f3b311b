//! In-memory look catalog with the built-in looks.

use std::collections::BTreeMap;

use tracing::debug;

use crate::lut::{LutRef, LutSource};
use crate::settings::{ColorSettings, Rgb, SettingsError};

/// Named looks, each a full [`ColorSettings`].
#[derive(Debug, Clone, PartialEq)]
pub struct LutLibrary {
    looks: BTreeMap<LutRef, ColorSettings>,
}

impl LutLibrary {
    /// A catalog with no looks.
    pub fn empty() -> Self {
        Self {
            looks: BTreeMap::new(),
        }
    }

    /// The looks every install ships with.
    pub fn builtin() -> Self {
        let mut lib = Self::empty();
        lib.insert_builtin("neutral", ColorSettings::NEUTRAL);
        lib.insert_builtin(
            "warm-film",
            ColorSettings::NEUTRAL
                .with_white_balance(0.35, 0.05)
                .with_contrast(1.1)
                .with_saturation(0.9)
                .with_lift(Rgb::new(0.03, 0.02, 0.0))
                .with_gain(Rgb::new(1.05, 1.0, 0.92)),
        );
        lib.insert_builtin(
            "cool-shadows",
            ColorSettings::NEUTRAL
                .with_white_balance(-0.2, 0.0)
                .with_tones(-0.1, 0.0)
                .with_lift(Rgb::new(-0.02, 0.0, 0.05)),
        );
        lib.insert_builtin(
            "teal-orange",
            ColorSettings::NEUTRAL
                .with_contrast(1.15)
                .with_saturation(1.2)
                .with_lift(Rgb::new(-0.02, 0.02, 0.06))
                .with_gain(Rgb::new(1.1, 1.0, 0.85)),
        );
        lib.insert_builtin(
            "bleach-bypass",
            ColorSettings::NEUTRAL
                .with_contrast(1.4)
                .with_saturation(0.45)
                .with_tones(-0.05, 0.1),
        );
        lib.insert_builtin(
            "faded-matte",
            ColorSettings::NEUTRAL
                .with_contrast(0.8)
                .with_saturation(0.85)
                .with_lift(Rgb::splat(0.08))
                .with_gain(Rgb::splat(0.95)),
        );
        lib.insert_builtin(
            "high-contrast-mono",
            ColorSettings::NEUTRAL
                .with_contrast(1.6)
                .with_saturation(0.0)
                .with_gamma(Rgb::splat(0.9)),
        );
        lib
    }

    /// Add or replace a look. Settings that break a [`ColorSettings`]
    /// invariant are rejected and the catalog is left unchanged.
    pub fn register(
        &mut self,
        name: impl Into<LutRef>,
        settings: ColorSettings,
    ) -> Result<(), SettingsError> {
        settings.validate()?;
        let name = name.into();
        debug!("Registering look '{name}'");
        self.looks.insert(name, settings);
        Ok(())
    }

    fn insert_builtin(&mut self, name: &str, settings: ColorSettings) {
        self.looks.insert(LutRef::from(name), settings);
    }

    pub fn unregister(&mut self, name: &LutRef) -> Option<ColorSettings> {
        self.looks.remove(name)
    }

    pub fn contains(&self, name: &LutRef) -> bool {
        self.looks.contains_key(name)
    }

    /// Look names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &LutRef> {
        self.looks.keys()
    }

    pub fn len(&self) -> usize {
        self.looks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.looks.is_empty()
    }
}

impl Default for LutLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LutSource for LutLibrary {
    fn resolve(&self, lut: &LutRef) -> Option<ColorSettings> {
        self.looks.get(lut).copied()
    }
}
