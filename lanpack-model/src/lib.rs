//! Data model for portable game-library packages.
//!
//! This crate defines the persisted entity rows, the root graphs they form,
//! the portable (manifest-shape) records, and manifest YAML I/O. It has no
//! database dependency; `lanpack-db` persists these types and `lanpack-sync`
//! moves them in and out of package archives.

pub mod descriptor;
pub mod kind;
pub mod manifest;
pub mod types;
pub mod yaml;

pub use descriptor::DescriptorInfo;
pub use kind::{EntityKind, RecordKind, RootKind};
pub use manifest::Manifest;
pub use types::*;
pub use yaml::{MANIFEST_ENTRY, MANIFEST_VERSION, ManifestError, read_manifest, write_manifest};
