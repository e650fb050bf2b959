//! Service configuration
//!
//! Loaded from a TOML file named by `SLIDEMARK_CONFIG` (falling back to
//! `slidemark.toml` in the working directory, then to built-in defaults).
//! Every field has a default so a partial file is fine.

use serde::Deserialize;
use slidemark_common::{Error, Result};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bind address for the HTTP surface
    pub bind: String,
    /// Base URL of the model server collaborator
    pub model_server_url: String,
    /// Base URL of the slide/dataset metadata collaborator
    pub slide_store_url: String,
    /// Event bus channel capacity
    pub event_capacity: usize,
    pub polling: PollingConfig,
    pub hit_testing: HitTestingConfig,
    pub heatmap: HeatmapConfig,
    pub view: ViewConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Delay between status polls, in milliseconds
    pub interval_ms: u64,
    /// Poll attempts before a job is declared timed out
    pub max_polls: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HitTestingConfig {
    /// Centroid proximity radius, in image units
    pub radius: f64,
    /// Every Nth nucleus is rendered when no samples pin others
    pub visible_stride: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HeatmapConfig {
    pub min_bin_size: f64,
    pub max_bin_size: f64,
    pub default_bin_size: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Zoom at or above which predictions render as markers instead of
    /// a heatmap
    pub zoom_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5810".to_string(),
            model_server_url: "http://127.0.0.1:5811".to_string(),
            slide_store_url: "http://127.0.0.1:5812".to_string(),
            event_capacity: 256,
            polling: PollingConfig::default(),
            hit_testing: HitTestingConfig::default(),
            heatmap: HeatmapConfig::default(),
            view: ViewConfig::default(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            max_polls: 150,
        }
    }
}

impl Default for HitTestingConfig {
    fn default() -> Self {
        Self {
            radius: 50.0,
            visible_stride: 1,
        }
    }
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            min_bin_size: 50.0,
            max_bin_size: 300.0,
            default_bin_size: 100.0,
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self { zoom_threshold: 4.0 }
    }
}

impl Config {
    /// Load from `SLIDEMARK_CONFIG`, else `slidemark.toml`, else defaults
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var("SLIDEMARK_CONFIG") {
            return Self::load_from(Path::new(&path));
        }
        let fallback = Path::new("slidemark.toml");
        if fallback.exists() {
            return Self::load_from(fallback);
        }
        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.polling.interval_ms == 0 {
            return Err(Error::Config("polling.interval_ms must be > 0".into()));
        }
        if self.polling.max_polls == 0 {
            return Err(Error::Config("polling.max_polls must be > 0".into()));
        }
        if self.hit_testing.radius <= 0.0 {
            return Err(Error::Config("hit_testing.radius must be > 0".into()));
        }
        if self.hit_testing.visible_stride == 0 {
            return Err(Error::Config("hit_testing.visible_stride must be >= 1".into()));
        }
        if self.heatmap.min_bin_size > self.heatmap.max_bin_size {
            return Err(Error::Config(
                "heatmap.min_bin_size must not exceed heatmap.max_bin_size".into(),
            ));
        }
        if self.heatmap.default_bin_size < self.heatmap.min_bin_size
            || self.heatmap.default_bin_size > self.heatmap.max_bin_size
        {
            return Err(Error::Config(
                "heatmap.default_bin_size must lie within [min_bin_size, max_bin_size]".into(),
            ));
        }
        Ok(())
    }

    /// Clamp a requested bin size into the configured bounds
    pub fn clamp_bin_size(&self, requested: f64) -> f64 {
        requested.clamp(self.heatmap.min_bin_size, self.heatmap.max_bin_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.polling.interval_ms, 2000);
        assert_eq!(config.polling.max_polls, 150);
        assert_eq!(config.hit_testing.radius, 50.0);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            bind = "0.0.0.0:8080"

            [polling]
            interval_ms = 500
            "#,
        )
        .unwrap();
        assert_eq!(config.bind, "0.0.0.0:8080");
        assert_eq!(config.polling.interval_ms, 500);
        assert_eq!(config.polling.max_polls, 150);
        assert_eq!(config.heatmap.default_bin_size, 100.0);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut config = Config::default();
        config.polling.interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_bin_bounds_are_rejected() {
        let mut config = Config::default();
        config.heatmap.min_bin_size = 400.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn bin_size_clamps_to_bounds() {
        let config = Config::default();
        assert_eq!(config.clamp_bin_size(10.0), 50.0);
        assert_eq!(config.clamp_bin_size(150.0), 150.0);
        assert_eq!(config.clamp_bin_size(1000.0), 300.0);
    }

    #[test]
    fn load_from_reads_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slidemark.toml");
        std::fs::write(&path, "[hit_testing]\nradius = 75.0\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.hit_testing.radius, 75.0);
    }
}
