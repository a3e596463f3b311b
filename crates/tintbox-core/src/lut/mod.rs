//! Look references and the catalogs that resolve them.

pub mod library;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::settings::ColorSettings;

pub use library::LutLibrary;

/// Identifier of a look in a [`LutSource`], e.g. `"warm-film"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LutRef(String);

impl LutRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LutRef {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl From<String> for LutRef {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for LutRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves a look reference to the grade it stands for.
///
/// `None` means the reference is unknown; the stack blender skips such
/// entries rather than failing.
pub trait LutSource {
    fn resolve(&self, lut: &LutRef) -> Option<ColorSettings>;
}

impl<S: LutSource + ?Sized> LutSource for &S {
    fn resolve(&self, lut: &LutRef) -> Option<ColorSettings> {
        (**self).resolve(lut)
    }
}
