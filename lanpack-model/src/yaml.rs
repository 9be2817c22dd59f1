//! Manifest YAML I/O and root-kind detection.

use serde::Serialize;
use thiserror::Error;

use crate::kind::RootKind;
use crate::manifest::{
    GameManifest, Manifest, RedistributableManifest, ServerManifest, ToolManifest,
};

/// Archive entry name of the manifest.
pub const MANIFEST_ENTRY: &str = "_manifest.yml";

/// Version stamped into every manifest this build writes.
pub const MANIFEST_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Manifest does not match any known root shape ({0})")]
    UnknownKind(String),
    #[error("YAML serialize error for {kind} manifest: {source}")]
    Serialize {
        kind: RootKind,
        source: serde_yml::Error,
    },
}

/// Parse a manifest, detecting its root kind from its shape.
///
/// Shapes are tried in [`RootKind::ALL`] order and the first one that
/// deserializes cleanly wins. Because every shape denies unknown fields and
/// requires fields the others lack, at most one can succeed.
pub fn read_manifest(text: &str) -> Result<Manifest, ManifestError> {
    let mut rejections = Vec::with_capacity(RootKind::ALL.len());

    for kind in RootKind::ALL {
        let attempt = match kind {
            RootKind::Game => serde_yml::from_str::<GameManifest>(text).map(Manifest::Game),
            RootKind::Redistributable => {
                serde_yml::from_str::<RedistributableManifest>(text).map(Manifest::Redistributable)
            }
            RootKind::Server => serde_yml::from_str::<ServerManifest>(text).map(Manifest::Server),
            RootKind::Tool => serde_yml::from_str::<ToolManifest>(text).map(Manifest::Tool),
        };
        match attempt {
            Ok(manifest) => return Ok(manifest),
            Err(e) => rejections.push(format!("{kind}: {e}")),
        }
    }

    Err(ManifestError::UnknownKind(rejections.join("; ")))
}

/// Serialize a manifest to YAML.
pub fn write_manifest(manifest: &Manifest) -> Result<String, ManifestError> {
    match manifest {
        Manifest::Game(m) => to_yaml(RootKind::Game, m),
        Manifest::Redistributable(m) => to_yaml(RootKind::Redistributable, m),
        Manifest::Server(m) => to_yaml(RootKind::Server, m),
        Manifest::Tool(m) => to_yaml(RootKind::Tool, m),
    }
}

fn to_yaml<T: Serialize>(kind: RootKind, value: &T) -> Result<String, ManifestError> {
    serde_yml::to_string(value).map_err(|source| ManifestError::Serialize { kind, source })
}
