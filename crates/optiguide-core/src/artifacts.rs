use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregate::ParameterMappings;
use crate::error::{PrepError, Result};
use crate::loader::SourceFingerprint;
use crate::sets::OptimizationSets;

pub const FORMAT_VERSION: u32 = 1;
pub const SETS_FILE_NAME: &str = "optimization_sets.json";
pub const PARAMETERS_FILE_NAME: &str = "parameter_dicts.json";
pub const SETS_KIND: &str = "optimization_sets";
pub const PARAMETERS_KIND: &str = "parameter_dicts";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetsArtifact {
    pub format_version: u32,
    pub kind: String,
    pub generated_at: DateTime<Utc>,
    pub sources: Vec<SourceFingerprint>,
    pub sets: OptimizationSets,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParametersArtifact {
    pub format_version: u32,
    pub kind: String,
    pub generated_at: DateTime<Utc>,
    pub sources: Vec<SourceFingerprint>,
    pub parameters: ParameterMappings,
}

/// Locations of the two files produced by [`write_artifacts`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactPaths {
    pub sets: PathBuf,
    pub parameters: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            sets: dir.join(SETS_FILE_NAME),
            parameters: dir.join(PARAMETERS_FILE_NAME),
        }
    }
}

/// Writes the sets and parameter artifacts into `output_dir`, creating it if
/// needed. Both files are staged beside their targets before either is
/// renamed into place.
pub fn write_artifacts(
    output_dir: &Path,
    sets: &OptimizationSets,
    parameters: &ParameterMappings,
    sources: &[SourceFingerprint],
) -> Result<ArtifactPaths> {
    fs::create_dir_all(output_dir)?;
    let paths = ArtifactPaths::in_dir(output_dir);
    let generated_at = Utc::now();

    let sets_artifact = SetsArtifact {
        format_version: FORMAT_VERSION,
        kind: SETS_KIND.to_string(),
        generated_at,
        sources: sources.to_vec(),
        sets: sets.clone(),
    };
    let parameters_artifact = ParametersArtifact {
        format_version: FORMAT_VERSION,
        kind: PARAMETERS_KIND.to_string(),
        generated_at,
        sources: sources.to_vec(),
        parameters: parameters.clone(),
    };

    // Both payloads are encoded before either file is replaced.
    let sets_bytes = serde_json::to_vec_pretty(&sets_artifact)?;
    let parameters_bytes = serde_json::to_vec_pretty(&parameters_artifact)?;

    let staged_sets = stage_file(&paths.sets, &sets_bytes)?;
    let staged_parameters = match stage_file(&paths.parameters, &parameters_bytes) {
        Ok(staged) => staged,
        Err(err) => {
            let _ = fs::remove_file(&staged_sets);
            return Err(err);
        }
    };

    if let Err(err) = commit_file(&staged_sets, &paths.sets) {
        let _ = fs::remove_file(&staged_parameters);
        return Err(err);
    }
    info!(path = %paths.sets.display(), "saved sets");
    commit_file(&staged_parameters, &paths.parameters)?;
    info!(path = %paths.parameters.display(), "saved parameters");

    Ok(paths)
}

pub fn read_artifacts(output_dir: &Path) -> Result<(SetsArtifact, ParametersArtifact)> {
    let paths = ArtifactPaths::in_dir(output_dir);
    let sets: SetsArtifact = read_json(&paths.sets)?;
    check_header(&paths.sets, SETS_KIND, &sets.kind, sets.format_version)?;
    let parameters: ParametersArtifact = read_json(&paths.parameters)?;
    check_header(
        &paths.parameters,
        PARAMETERS_KIND,
        &parameters.kind,
        parameters.format_version,
    )?;
    Ok((sets, parameters))
}

fn staging_path(path: &Path) -> PathBuf {
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    PathBuf::from(staging)
}

fn stage_file(path: &Path, bytes: &[u8]) -> Result<PathBuf> {
    let staging = staging_path(path);
    if let Err(err) = fs::write(&staging, bytes) {
        let _ = fs::remove_file(&staging);
        return Err(err.into());
    }
    Ok(staging)
}

fn commit_file(staging: &Path, path: &Path) -> Result<()> {
    if let Err(err) = fs::rename(staging, path) {
        let _ = fs::remove_file(staging);
        return Err(err.into());
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn check_header(path: &Path, expected: &'static str, kind: &str, version: u32) -> Result<()> {
    if kind != expected {
        return Err(PrepError::UnsupportedArtifact {
            path: path.to_path_buf(),
            expected,
            reason: format!("kind is '{kind}'"),
        });
    }
    if version != FORMAT_VERSION {
        return Err(PrepError::UnsupportedArtifact {
            path: path.to_path_buf(),
            expected,
            reason: format!("format_version {version} (supported: {FORMAT_VERSION})"),
        });
    }
    Ok(())
}
