//! # extsecret-core
//!
//! Core library for extsecret providing:
//! - ExternalSecret manifest parsing
//! - Selector validation (exactly one value source, exactly one provider)
//! - The generated Kubernetes Secret document
//! - The error taxonomy shared by the resolver and the CLI

pub mod config;
pub mod error;
pub mod types;
pub mod validate;

pub use config::ManifestLoader;
pub use error::{Error, Result};
pub use types::{ExternalSecret, Secret};
pub use validate::validate;
