// src/config/mod.rs

//! Manifest loading and validation.
//!
//! - [`model`] defines the serde-backed manifest (`RawManifest`) and its
//!   validated form (`Manifest`).
//! - [`loader`] reads JSON / TOML / `package.json` manifests from disk.
//! - [`validate`] turns a `RawManifest` into a `Manifest` or a fatal
//!   configuration error.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, parse_manifest};
pub use model::{
    BundleDef, BundleSection, BundlerConfig, FaviconOptions, ListingConfig, Manifest,
    RawManifest, ServerConfig,
};
