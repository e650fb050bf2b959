//! Service modules for the active-learning session

pub mod density_aggregator;
pub mod job_orchestrator;
pub mod model_registry;
pub mod model_server_client;
pub mod nucleus_index;
pub mod sample_accumulator;
pub mod slide_store_client;

pub use density_aggregator::{aggregate, BinColor, Heatmap, HeatmapBin};
pub use job_orchestrator::{JobOrchestrator, JobOutcome};
pub use model_registry::{ModelRegistry, RegistryError, TransferSelection};
pub use model_server_client::{HttpModelServer, ModelServerApi, ModelServerError};
pub use nucleus_index::NucleusIndex;
pub use sample_accumulator::{
    SampleAccumulator, SampleError, ToggleOutcome, BATCH_SIZE, LABEL_QUOTA,
};
pub use slide_store_client::{
    DatasetInfo, HttpSlideStore, SlideInfo, SlideStore, SlideStoreError,
};
