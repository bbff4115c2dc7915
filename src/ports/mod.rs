//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the application and the serialized model artifact.

mod model;

pub use model::{ModelCapability, ModelError, RiskModel};
