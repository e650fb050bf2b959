//! Overlay view selection
//!
//! Which overlay is current is a single tagged enumeration driven by one
//! reducer over zoom level and prediction availability, rather than
//! independent booleans kept manually consistent. Exactly one mode is
//! active at any instant.

use serde::{Deserialize, Serialize};

/// The active overlay view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayMode {
    /// Per-nucleus detection overlay (no predictions yet, zoomed in)
    Nuclei,
    /// Per-nucleus prediction overlay (zoomed in)
    Predictions,
    /// Density heatmap (zoomed out)
    Heatmap,
}

/// Current view parameters for the session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewState {
    pub mode: OverlayMode,
    pub zoom: f64,
    /// Heatmap bin edge length in image units
    pub bin_size: f64,
}

impl ViewState {
    pub fn new(bin_size: f64) -> Self {
        Self {
            mode: OverlayMode::Nuclei,
            zoom: 1.0,
            bin_size,
        }
    }

    /// Recompute the active mode from the zoom level and prediction
    /// availability. Below the threshold the view is zoomed out.
    pub fn reduce(&mut self, zoom: f64, zoom_threshold: f64, predictions_available: bool) {
        self.zoom = zoom;
        self.mode = match (zoom < zoom_threshold, predictions_available) {
            (true, true) => OverlayMode::Heatmap,
            (false, true) => OverlayMode::Predictions,
            (_, false) => OverlayMode::Nuclei,
        };
    }
}
