//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external formats:
//! - `artifact`: exported JSON model artifacts
//! - `sanitize`: clinical value and secret filtering for logs

pub mod artifact;
pub mod sanitize;

pub use artifact::ArtifactError;
