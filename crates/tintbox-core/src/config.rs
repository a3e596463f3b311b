//! Studio configuration: JSON file plus `TINTBOX_*` environment overrides.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::composite::Divider;
use crate::export::cube::{MAX_LUT_SIZE, MIN_LUT_SIZE};
use crate::split::SplitView;

pub const ENV_HISTOGRAM_MS: &str = "TINTBOX_HISTOGRAM_MS";
pub const ENV_LUT_SIZE: &str = "TINTBOX_LUT_SIZE";
pub const ENV_DRAFTS_DIR: &str = "TINTBOX_DRAFTS_DIR";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid divider color '{0}', expected #rrggbb")]
    DividerColor(String),
}

/// Runtime configuration shared by the compositor, sampler and storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Histogram sampling period in milliseconds.
    pub histogram_interval_ms: u64,
    /// Grid size for exported `.cube` files.
    pub lut_bake_size: usize,
    pub divider_width_px: f32,
    /// Divider color as `#rrggbb`.
    pub divider_color: String,
    pub default_split_position: f32,
    pub drafts_dir: PathBuf,
    pub settings_path: PathBuf,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            histogram_interval_ms: 250,
            lut_bake_size: 33,
            divider_width_px: 2.0,
            divider_color: "#ffffff".into(),
            default_split_position: 0.5,
            drafts_dir: PathBuf::from("drafts"),
            settings_path: PathBuf::from("settings.json"),
        }
    }
}

impl StudioConfig {
    /// Read a JSON config. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config.sanitized())
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        let text = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, text).map_err(io_err)
    }

    /// Apply `TINTBOX_*` variables from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup. Unparseable values are
    /// logged and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = lookup(ENV_HISTOGRAM_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.histogram_interval_ms = ms,
                Err(e) => warn!("Ignoring {ENV_HISTOGRAM_MS}='{raw}': {e}"),
            }
        }
        if let Some(raw) = lookup(ENV_LUT_SIZE) {
            match raw.trim().parse::<usize>() {
                Ok(size) => self.lut_bake_size = size,
                Err(e) => warn!("Ignoring {ENV_LUT_SIZE}='{raw}': {e}"),
            }
        }
        if let Some(raw) = lookup(ENV_DRAFTS_DIR) {
            if raw.is_empty() {
                warn!("Ignoring empty {ENV_DRAFTS_DIR}");
            } else {
                self.drafts_dir = PathBuf::from(raw);
            }
        }
        *self = self.clone().sanitized();
    }

    pub fn histogram_interval(&self) -> Duration {
        Duration::from_millis(self.histogram_interval_ms)
    }

    /// Divider color as straight RGBA.
    pub fn divider_rgba(&self) -> Result<[f32; 4], ConfigError> {
        let srgb = palette::Srgb::<u8>::from_str(self.divider_color.trim())
            .map_err(|_| ConfigError::DividerColor(self.divider_color.clone()))?;
        let rgb: palette::Srgb<f32> = srgb.into_format();
        Ok([rgb.red, rgb.green, rgb.blue, 1.0])
    }

    /// Divider settings for the compositor, falling back to white on a bad color.
    pub fn divider(&self) -> Divider {
        let color = self.divider_rgba().unwrap_or_else(|e| {
            warn!("{e}; using white");
            [1.0; 4]
        });
        Divider {
            width_px: self.divider_width_px,
            color,
        }
    }

    /// Split view at the configured starting position, graded on the left.
    pub fn default_split(&self) -> SplitView {
        SplitView::new(self.default_split_position)
    }

    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.histogram_interval_ms == 0 {
            warn!("histogram_interval_ms must be positive, using default");
            self.histogram_interval_ms = defaults.histogram_interval_ms;
        }
        if !(MIN_LUT_SIZE..=MAX_LUT_SIZE).contains(&self.lut_bake_size) {
            warn!("lut_bake_size {} out of range, using default", self.lut_bake_size);
            self.lut_bake_size = defaults.lut_bake_size;
        }
        if !self.divider_width_px.is_finite() || self.divider_width_px < 0.0 {
            self.divider_width_px = defaults.divider_width_px;
        }
        if !self.default_split_position.is_finite() {
            self.default_split_position = defaults.default_split_position;
        }
        self.default_split_position = self.default_split_position.clamp(0.0, 1.0);
        self
    }
}
