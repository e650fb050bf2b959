//! Detected nuclei and per-nucleus classifier predictions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use slidemark_common::Label;
use uuid::Uuid;

/// Axis-aligned bounding box in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BoundingBox {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }
}

/// One detected cell nucleus on a slide
///
/// The index is the nucleus's position in the detection sequence and is the
/// stable identity used by samples, training batches, and predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nucleus {
    pub index: usize,
    /// Centroid x in image coordinates
    pub x: f64,
    /// Centroid y in image coordinates
    pub y: f64,
    pub bbox: BoundingBox,
}

impl Nucleus {
    /// Squared Euclidean distance from this nucleus's centroid to a point
    pub fn distance_sq(&self, x: f64, y: f64) -> f64 {
        let dx = self.x - x;
        let dy = self.y - y;
        dx * dx + dy * dy
    }
}

/// One classified nucleus after a job completes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "prediction")]
    pub label: Label,
    pub probability: f64,
}

/// The full prediction set for a slide, replaced wholesale on job completion
///
/// Tagged with the originating job and slide so the render layer can refuse
/// to draw a set that no longer matches the active slide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionSet {
    pub job_id: Uuid,
    pub slide_id: i64,
    pub predictions: Vec<Prediction>,
    pub positive_count: usize,
    pub negative_count: usize,
    pub fetched_at: DateTime<Utc>,
}

impl PredictionSet {
    pub fn total_count(&self) -> usize {
        self.predictions.len()
    }

    pub fn matches_slide(&self, slide_id: i64) -> bool {
        self.slide_id == slide_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_contains_is_inclusive() {
        let bbox = BoundingBox { x0: 10.0, y0: 10.0, x1: 20.0, y1: 20.0 };
        assert!(bbox.contains(10.0, 10.0));
        assert!(bbox.contains(20.0, 20.0));
        assert!(bbox.contains(15.0, 12.0));
        assert!(!bbox.contains(9.9, 15.0));
        assert!(!bbox.contains(15.0, 20.1));
    }

    #[test]
    fn distance_sq_is_euclidean() {
        let n = Nucleus {
            index: 0,
            x: 3.0,
            y: 4.0,
            bbox: BoundingBox { x0: 0.0, y0: 0.0, x1: 6.0, y1: 8.0 },
        };
        assert_eq!(n.distance_sq(0.0, 0.0), 25.0);
    }
}
