//! Iteration-aware accumulation of human-labeled exemplars
//!
//! Maintains the working set for the current iteration, enforces the
//! 4-positive/4-negative submission contract, and carries the accumulated
//! history across iterations. Submission is split into three phases so a
//! rejected remote request never loses the expert's selections:
//! `validate` → `pending_batch` (payload, no mutation) → `commit_submitted`
//! (called only once the model server has accepted the job).

use crate::models::{Nucleus, Sample, TrainingBatch};
use slidemark_common::Label;
use thiserror::Error;

/// Samples of each label required per iteration
pub const LABEL_QUOTA: usize = 4;

/// Total samples per iteration (4 positive + 4 negative)
pub const BATCH_SIZE: usize = 2 * LABEL_QUOTA;

/// Validation errors detected locally, before any remote call
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SampleError {
    /// A fifth sample of one label was toggled on
    #[error(
        "already have {LABEL_QUOTA} {label} samples; remove one or select a {} sample",
        .label.opposite()
    )]
    QuotaExceeded { label: Label },

    /// Submission attempted without exactly 4 positive and 4 negative
    #[error(
        "batch needs exactly {LABEL_QUOTA} positive and {LABEL_QUOTA} negative samples, \
         have {positive} positive and {negative} negative"
    )]
    InvalidBatch { positive: usize, negative: usize },

    /// Every sample in the new batch was already trained on
    #[error(
        "iteration {iteration}: all {BATCH_SIZE} samples were already submitted; \
         add at least one new nucleus before retraining"
    )]
    DuplicateBatch { iteration: u32 },
}

/// Result of a toggle call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
}

/// Working set plus cross-iteration history for one (dataset, slide) pair
#[derive(Debug, Default)]
pub struct SampleAccumulator {
    working: Vec<Sample>,
    history: Vec<Sample>,
    iteration: u32,
}

impl SampleAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed iterations so far
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn working_set(&self) -> &[Sample] {
        &self.working
    }

    pub fn history(&self) -> &[Sample] {
        &self.history
    }

    /// (positive, negative) counts of the working set
    pub fn counts(&self) -> (usize, usize) {
        let positive = self
            .working
            .iter()
            .filter(|s| s.label == Label::Positive)
            .count();
        (positive, self.working.len() - positive)
    }

    /// Nucleus indices of the working set, used to pin hidden nuclei
    /// back into the visible subset
    pub fn working_indices(&self) -> Vec<usize> {
        self.working.iter().map(|s| s.nucleus_index).collect()
    }

    /// Add the nucleus to the working set, or remove it if already present.
    ///
    /// The label is passed explicitly by the caller rather than read from
    /// session-wide state. Adding a fifth sample of one label is rejected
    /// with `QuotaExceeded`; removal is always allowed and ignores the
    /// label argument.
    pub fn toggle(&mut self, nucleus: &Nucleus, label: Label) -> Result<ToggleOutcome, SampleError> {
        if let Some(pos) = self
            .working
            .iter()
            .position(|s| s.nucleus_index == nucleus.index)
        {
            self.working.remove(pos);
            return Ok(ToggleOutcome::Removed);
        }

        let with_label = self.working.iter().filter(|s| s.label == label).count();
        if with_label >= LABEL_QUOTA {
            return Err(SampleError::QuotaExceeded { label });
        }

        self.working.push(Sample {
            nucleus_index: nucleus.index,
            x: nucleus.x,
            y: nucleus.y,
            label,
        });
        Ok(ToggleOutcome::Added)
    }

    /// True iff the working set holds exactly 4 positive and 4 negative
    pub fn can_submit(&self) -> bool {
        self.counts() == (LABEL_QUOTA, LABEL_QUOTA)
    }

    /// Check the submission contract without mutating anything.
    ///
    /// On the second and later iteration, a batch whose every nucleus
    /// index already appears in history carries no new information and is
    /// rejected with `DuplicateBatch`.
    pub fn validate(&self) -> Result<(), SampleError> {
        let (positive, negative) = self.counts();
        if (positive, negative) != (LABEL_QUOTA, LABEL_QUOTA) {
            return Err(SampleError::InvalidBatch { positive, negative });
        }

        if self.iteration >= 1 {
            let all_seen = self
                .working
                .iter()
                .all(|s| self.history.iter().any(|h| h.nucleus_index == s.nucleus_index));
            if all_seen {
                return Err(SampleError::DuplicateBatch {
                    iteration: self.iteration + 1,
                });
            }
        }

        Ok(())
    }

    /// The payload a successful submission would carry: the full
    /// accumulated history plus the current working set. Does not mutate;
    /// call `commit_submitted` once the job has been accepted.
    pub fn pending_batch(&self) -> TrainingBatch {
        let mut samples = self.history.clone();
        samples.extend(self.working.iter().cloned());
        TrainingBatch {
            samples,
            iteration: self.iteration + 1,
        }
    }

    /// Fold the working set into history and start the next iteration.
    ///
    /// Only called after the model server accepted the submission, so a
    /// failed request leaves the working set untouched.
    pub fn commit_submitted(&mut self) {
        self.history.append(&mut self.working);
        self.iteration += 1;
    }

    /// Discard everything. Only on slide change, never on failed submission.
    pub fn reset(&mut self) {
        self.working.clear();
        self.history.clear();
        self.iteration = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BoundingBox;

    fn nucleus(index: usize) -> Nucleus {
        let x = index as f64 * 100.0;
        Nucleus {
            index,
            x,
            y: 50.0,
            bbox: BoundingBox {
                x0: x - 5.0,
                y0: 45.0,
                x1: x + 5.0,
                y1: 55.0,
            },
        }
    }

    fn fill_batch(acc: &mut SampleAccumulator, start: usize) {
        for i in 0..LABEL_QUOTA {
            acc.toggle(&nucleus(start + i), Label::Positive).unwrap();
        }
        for i in LABEL_QUOTA..BATCH_SIZE {
            acc.toggle(&nucleus(start + i), Label::Negative).unwrap();
        }
    }

    #[test]
    fn toggle_twice_returns_to_empty() {
        let mut acc = SampleAccumulator::new();
        assert_eq!(acc.toggle(&nucleus(7), Label::Positive).unwrap(), ToggleOutcome::Added);
        assert_eq!(acc.toggle(&nucleus(7), Label::Positive).unwrap(), ToggleOutcome::Removed);
        assert!(acc.working_set().is_empty());
    }

    #[test]
    fn toggle_off_ignores_label_argument() {
        let mut acc = SampleAccumulator::new();
        acc.toggle(&nucleus(7), Label::Positive).unwrap();
        // Same nucleus clicked again while the negative label is armed
        assert_eq!(acc.toggle(&nucleus(7), Label::Negative).unwrap(), ToggleOutcome::Removed);
        assert!(acc.working_set().is_empty());
    }

    #[test]
    fn no_duplicate_nucleus_in_working_set() {
        let mut acc = SampleAccumulator::new();
        acc.toggle(&nucleus(1), Label::Positive).unwrap();
        acc.toggle(&nucleus(2), Label::Positive).unwrap();
        acc.toggle(&nucleus(1), Label::Positive).unwrap(); // removes 1
        acc.toggle(&nucleus(1), Label::Positive).unwrap(); // re-adds 1
        let indices = acc.working_indices();
        let mut deduped = indices.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(indices.len(), deduped.len());
    }

    #[test]
    fn fifth_sample_of_a_label_is_rejected() {
        let mut acc = SampleAccumulator::new();
        for i in 0..LABEL_QUOTA {
            acc.toggle(&nucleus(i), Label::Positive).unwrap();
        }
        let err = acc.toggle(&nucleus(99), Label::Positive).unwrap_err();
        assert_eq!(err, SampleError::QuotaExceeded { label: Label::Positive });
        // The other label still has room
        acc.toggle(&nucleus(99), Label::Negative).unwrap();
    }

    #[test]
    fn can_submit_only_at_exactly_four_and_four() {
        let mut acc = SampleAccumulator::new();
        for i in 0..LABEL_QUOTA {
            acc.toggle(&nucleus(i), Label::Positive).unwrap();
        }
        for i in LABEL_QUOTA..BATCH_SIZE - 1 {
            acc.toggle(&nucleus(i), Label::Negative).unwrap();
        }
        assert!(!acc.can_submit());
        assert!(matches!(
            acc.validate(),
            Err(SampleError::InvalidBatch { positive: 4, negative: 3 })
        ));

        acc.toggle(&nucleus(BATCH_SIZE - 1), Label::Negative).unwrap();
        assert!(acc.can_submit());
        assert!(acc.validate().is_ok());
    }

    #[test]
    fn first_submission_accumulates_and_clears() {
        let mut acc = SampleAccumulator::new();
        fill_batch(&mut acc, 0);

        acc.validate().unwrap();
        let batch = acc.pending_batch();
        assert_eq!(batch.len(), BATCH_SIZE);
        assert_eq!(batch.iteration, 1);

        acc.commit_submitted();
        assert_eq!(acc.history().len(), BATCH_SIZE);
        assert!(acc.working_set().is_empty());
        assert_eq!(acc.iteration(), 1);
    }

    #[test]
    fn second_iteration_trains_on_sixteen() {
        let mut acc = SampleAccumulator::new();
        fill_batch(&mut acc, 0);
        acc.commit_submitted();

        fill_batch(&mut acc, BATCH_SIZE);
        acc.validate().unwrap();
        let batch = acc.pending_batch();
        assert_eq!(batch.len(), 2 * BATCH_SIZE);
        assert_eq!(batch.iteration, 2);

        acc.commit_submitted();
        assert_eq!(acc.history().len(), 2 * BATCH_SIZE);
    }

    #[test]
    fn resubmitting_identical_set_is_a_duplicate() {
        let mut acc = SampleAccumulator::new();
        fill_batch(&mut acc, 0);
        acc.commit_submitted();

        // Re-select the exact same nuclei
        fill_batch(&mut acc, 0);
        assert_eq!(
            acc.validate().unwrap_err(),
            SampleError::DuplicateBatch { iteration: 2 }
        );
        // History untouched by the failed validation
        assert_eq!(acc.history().len(), BATCH_SIZE);
        assert_eq!(acc.iteration(), 1);
    }

    #[test]
    fn one_new_nucleus_defeats_the_duplicate_check() {
        let mut acc = SampleAccumulator::new();
        fill_batch(&mut acc, 0);
        acc.commit_submitted();

        // Seven repeats plus one brand-new nucleus
        for i in 0..LABEL_QUOTA {
            acc.toggle(&nucleus(i), Label::Positive).unwrap();
        }
        for i in LABEL_QUOTA..BATCH_SIZE - 1 {
            acc.toggle(&nucleus(i), Label::Negative).unwrap();
        }
        acc.toggle(&nucleus(1000), Label::Negative).unwrap();
        assert!(acc.validate().is_ok());
    }

    #[test]
    fn failed_submission_preserves_working_set() {
        let mut acc = SampleAccumulator::new();
        fill_batch(&mut acc, 0);
        acc.validate().unwrap();
        let _payload = acc.pending_batch();
        // Model server rejected the request: commit_submitted is never
        // called and nothing was lost
        assert_eq!(acc.working_set().len(), BATCH_SIZE);
        assert_eq!(acc.iteration(), 0);
    }

    #[test]
    fn reset_clears_history_and_iteration() {
        let mut acc = SampleAccumulator::new();
        fill_batch(&mut acc, 0);
        acc.commit_submitted();
        acc.reset();
        assert!(acc.history().is_empty());
        assert!(acc.working_set().is_empty());
        assert_eq!(acc.iteration(), 0);
    }
}
