//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the risk assessment use case.

mod gateway;
mod inference;

pub use gateway::{ModelGateway, ModelSource};
pub use inference::InferenceService;
