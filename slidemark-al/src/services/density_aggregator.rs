//! Spatial density binning for the zoomed-out heatmap view
//!
//! Bins positive predictions into a uniform grid and maps normalized
//! density to a blue→red→yellow ramp. Bins are recomputed from scratch on
//! any change to the prediction set or the bin size; nothing here is
//! persisted or updated incrementally.

use crate::models::Prediction;
use serde::{Deserialize, Serialize};
use slidemark_common::Label;
use std::collections::HashMap;

/// One cell of the density grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatmapBin {
    /// Integer grid coordinates: floor(x / bin_size), floor(y / bin_size)
    pub gx: i64,
    pub gy: i64,
    /// Positive predictions falling in this cell
    pub count: usize,
    pub color: BinColor,
}

/// Render color for a bin, normalized against the densest bin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub opacity: f64,
}

/// Complete heatmap for the current prediction set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heatmap {
    pub bin_size: f64,
    pub max_count: usize,
    pub bins: Vec<HeatmapBin>,
}

/// Bin the positive predictions into a grid of `bin_size` cells.
///
/// Bins with zero contributing predictions are not emitted. Output order
/// is sorted by (gy, gx) so repeated aggregations of the same set are
/// byte-identical.
pub fn aggregate(predictions: &[Prediction], bin_size: f64) -> Heatmap {
    let mut counts: HashMap<(i64, i64), usize> = HashMap::new();

    for pred in predictions.iter().filter(|p| p.label == Label::Positive) {
        let gx = (pred.x / bin_size).floor() as i64;
        let gy = (pred.y / bin_size).floor() as i64;
        *counts.entry((gx, gy)).or_insert(0) += 1;
    }

    let max_count = counts.values().copied().max().unwrap_or(0);

    let mut bins: Vec<HeatmapBin> = counts
        .into_iter()
        .map(|((gx, gy), count)| HeatmapBin {
            gx,
            gy,
            count,
            color: color_for(count, max_count),
        })
        .collect();
    bins.sort_unstable_by_key(|b| (b.gy, b.gx));

    Heatmap {
        bin_size,
        max_count,
        bins,
    }
}

/// Density-to-color mapping.
///
/// `t = count / max_count`; below 0.5 interpolates blue→red, above
/// interpolates red→yellow. Opacity scales 0.3..0.8 with density.
pub fn color_for(count: usize, max_count: usize) -> BinColor {
    let t = if max_count > 0 {
        count as f64 / max_count as f64
    } else {
        0.0
    };

    let (r, g, b) = if t < 0.5 {
        (255.0 * 2.0 * t, 0.0, 255.0 * (1.0 - 2.0 * t))
    } else {
        (255.0, 255.0 * (2.0 * t - 1.0), 0.0)
    };

    BinColor {
        r: r.round() as u8,
        g: g.round() as u8,
        b: b.round() as u8,
        opacity: 0.3 + 0.5 * t,
    }
}
