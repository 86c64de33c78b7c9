//! Manifest loading

pub mod loader;

pub use loader::ManifestLoader;
