//! Type definitions for manifests and generated documents

pub mod manifest;
pub mod secret;

pub use manifest::*;
pub use secret::*;
