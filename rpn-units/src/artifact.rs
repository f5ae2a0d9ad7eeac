//! Versioned on-disk form of a built unit system
//!
//! The artifact holds the dimension table, the catalog (with aliases) and
//! every direct factor. Nonlinear conversions are code, so they are
//! reattached from the seed declarations on load.

use crate::graph::EdgeMap;
use crate::{seed, ConversionFactor, ConversionGraph, DimensionRegistry, UnitCatalog, UnitSystem};
use rpn_core::{write_atomic, RpnError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{info, warn};

/// Bumped whenever the seed tables or the layout change
pub const FORMAT_VERSION: &str = "rpn-units-1";

#[derive(Serialize, Deserialize)]
struct FactorEntry {
    from: String,
    to: String,
    factor: ConversionFactor,
}

#[derive(Serialize, Deserialize)]
struct UnitArtifact {
    version: String,
    dimensions: DimensionRegistry,
    catalog: UnitCatalog,
    factors: Vec<FactorEntry>,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: String,
}

fn decode(bytes: &[u8]) -> Result<UnitArtifact, RpnError> {
    serde_json::from_slice(bytes)
        .map_err(|e| RpnError::Artifact(format!("cannot decode unit artifact: {}", e)))
}

impl UnitArtifact {
    fn into_system(self) -> UnitSystem {
        let direct: EdgeMap = self.factors.into_iter()
            .map(|entry| ((entry.from, entry.to), entry.factor))
            .collect();
        let nonlinear: BTreeMap<_, _> = seed::standard_nonlinear().into_iter()
            .filter(|(from, to, _)| self.catalog.contains(from) && self.catalog.contains(to))
            .map(|(from, to, convert)| ((from.to_string(), to.to_string()), convert))
            .collect();
        UnitSystem::from_parts(self.dimensions, self.catalog, ConversionGraph::new(direct, nonlinear))
    }
}

impl UnitSystem {
    /// Write the artifact atomically (temp file + rename)
    pub fn save(&self, path: &Path) -> Result<(), RpnError> {
        let artifact = UnitArtifact {
            version: FORMAT_VERSION.to_string(),
            dimensions: self.dimensions().clone(),
            catalog: self.catalog().clone(),
            factors: self.graph().edges()
                .map(|(from, to, factor)| FactorEntry {
                    from: from.to_string(),
                    to: to.to_string(),
                    factor: factor.clone(),
                })
                .collect(),
        };
        let bytes = serde_json::to_vec(&artifact)
            .map_err(|e| RpnError::Artifact(format!("cannot encode unit artifact: {}", e)))?;
        write_atomic(path, &bytes)?;
        info!(path = %path.display(), edges = artifact.factors.len(), "unit artifact saved");
        Ok(())
    }

    /// Load an artifact; a different format version is an error
    pub fn load(path: &Path) -> Result<Self, RpnError> {
        let bytes = fs::read(path)
            .map_err(|e| RpnError::Artifact(format!("cannot read '{}': {}", path.display(), e)))?;
        let probe: VersionProbe = serde_json::from_slice(&bytes)
            .map_err(|e| RpnError::Artifact(format!("cannot decode unit artifact: {}", e)))?;
        if probe.version != FORMAT_VERSION {
            return Err(RpnError::Artifact(format!(
                "unit artifact version '{}' does not match '{}'", probe.version, FORMAT_VERSION
            )));
        }
        let system = decode(&bytes)?.into_system();
        info!(path = %path.display(), units = system.catalog().len(), "unit artifact loaded");
        Ok(system)
    }

    /// Load the artifact when its version matches; otherwise build from
    /// the seed tables and save a fresh artifact. Failing to save is only
    /// a warning.
    pub fn load_or_build(path: &Path) -> Result<Self, RpnError> {
        match fs::read(path) {
            Ok(bytes) => match serde_json::from_slice::<VersionProbe>(&bytes) {
                Ok(probe) if probe.version == FORMAT_VERSION => match decode(&bytes) {
                    Ok(artifact) => {
                        let system = artifact.into_system();
                        info!(path = %path.display(), units = system.catalog().len(), "unit artifact loaded");
                        return Ok(system);
                    }
                    Err(e) => warn!(path = %path.display(), error = %e, "corrupt unit artifact, rebuilding"),
                },
                Ok(probe) => warn!(
                    path = %path.display(),
                    found = %probe.version,
                    expected = FORMAT_VERSION,
                    "unit artifact version mismatch, rebuilding"
                ),
                Err(e) => warn!(path = %path.display(), error = %e, "unreadable unit artifact, rebuilding"),
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "no unit artifact, building");
            }
            Err(e) => warn!(path = %path.display(), error = %e, "cannot read unit artifact, rebuilding"),
        }

        let system = Self::standard()?;
        if let Err(e) = system.save(path) {
            warn!(path = %path.display(), error = %e, "unit artifact not saved");
        }
        Ok(system)
    }
}
