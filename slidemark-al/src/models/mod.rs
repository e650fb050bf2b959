//! Domain model types for the active-learning session

pub mod artifact;
pub mod job;
pub mod nucleus;
pub mod sample;
pub mod view_state;

pub use artifact::ModelArtifact;
pub use job::{JobResults, JobStatus, JobStatusReport};
pub use nucleus::{BoundingBox, Nucleus, Prediction, PredictionSet};
pub use sample::{Sample, TrainingBatch};
pub use view_state::{OverlayMode, ViewState};
