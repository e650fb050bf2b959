//! Per-slide nucleus index and click hit-testing
//!
//! Holds the ordered detection list for the active slide and answers
//! "which nucleus is nearest this click" queries. Only the visible subset
//! is considered: a fixed-stride sample of all detections plus every
//! nucleus pinned by the working sample set. This keeps target density
//! and per-click cost bounded on slides with hundreds of thousands of
//! detections; the scan is linear over the visible subset.

use crate::models::Nucleus;

/// Index over a slide's detected nuclei
#[derive(Debug, Clone)]
pub struct NucleusIndex {
    nuclei: Vec<Nucleus>,
    /// Indices into `nuclei`, ascending. Rebuilt whenever the stride or
    /// the pinned set changes.
    visible: Vec<usize>,
    hit_radius: f64,
}

impl NucleusIndex {
    /// Build an index from the detection sequence.
    ///
    /// The nucleus at position `i` must carry `index == i`; detection
    /// order is the stable identity used everywhere downstream.
    pub fn new(nuclei: Vec<Nucleus>, hit_radius: f64) -> Self {
        let visible = (0..nuclei.len()).collect();
        Self {
            nuclei,
            visible,
            hit_radius,
        }
    }

    pub fn len(&self) -> usize {
        self.nuclei.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nuclei.is_empty()
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn get(&self, index: usize) -> Option<&Nucleus> {
        self.nuclei.get(index)
    }

    /// Restrict the visible subset to every `stride`-th detection plus the
    /// pinned indices (typically the current working sample set).
    ///
    /// A stride of 1 makes every nucleus visible. Pinned indices outside
    /// the detection range are ignored. The resulting order is ascending
    /// detection order, so hit-test tie-breaking stays deterministic.
    pub fn set_visible(&mut self, stride: usize, pinned: &[usize]) {
        let stride = stride.max(1);
        self.visible = (0..self.nuclei.len())
            .filter(|i| i % stride == 0 || pinned.contains(i))
            .collect();
    }

    /// Return the single nearest eligible nucleus to a query point, or None.
    ///
    /// A nucleus qualifies if the point lies inside its bounding box or
    /// within `hit_radius` of its centroid. Among qualifiers the minimum
    /// centroid distance wins; ties go to the first-encountered nucleus in
    /// visible order.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<&Nucleus> {
        let radius_sq = self.hit_radius * self.hit_radius;
        let mut best: Option<(&Nucleus, f64)> = None;

        for &i in &self.visible {
            let nucleus = &self.nuclei[i];
            let dist_sq = nucleus.distance_sq(x, y);

            if !nucleus.bbox.contains(x, y) && dist_sq > radius_sq {
                continue;
            }

            match best {
                Some((_, best_dist)) if dist_sq >= best_dist => {}
                _ => best = Some((nucleus, dist_sq)),
            }
        }

        best.map(|(nucleus, _)| nucleus)
    }
}
