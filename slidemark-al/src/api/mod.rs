//! HTTP API handlers for slidemark-al

pub mod datasets;
pub mod health;
pub mod models;
pub mod session;
pub mod sse;
pub mod view;

pub use datasets::dataset_routes;
pub use health::health_routes;
pub use models::model_routes;
pub use session::session_routes;
pub use sse::session_event_stream;
pub use view::view_routes;
