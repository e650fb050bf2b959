//! # Slidemark Common Library
//!
//! Shared code for the slidemark services including:
//! - Error type used across crate boundaries
//! - Event types (SessionEvent enum) and the EventBus
//! - Domain primitives shared by events and API payloads

pub mod error;
pub mod events;
pub mod types;

pub use error::{Error, Result};
pub use types::Label;
