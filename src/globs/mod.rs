// src/globs/mod.rs

//! Glob sets and their derivation from the manifest.
//!
//! - [`pattern`] holds the include/exclude list type, its compiled matcher
//!   and the directory walker used by every stage.
//! - [`derive`] turns a `Manifest` into per-category source and output sets.
//! - [`owner`] decides which category an existing output file belongs to
//!   where output sets overlap.

pub mod derive;
pub mod owner;
pub mod pattern;

pub use derive::{CLAIM_ORDER, DerivedGlobs, FAVICON_DIR, css_output_glob, derive_globs};
pub use owner::OutputOwners;
pub use pattern::{
    GlobList, GlobMatcher, GlobPattern, collect_matching_files, compile_glob, rel_string,
};
