use std::fmt;
use std::path::{Path, PathBuf};

use log::{error, info, warn};
use sha2::{Digest, Sha256};

use super::artifact::{Artifact, ArtifactError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStrategy {
    /// UTF-8 JSON export.
    Primary,
    /// Bytes read as Latin-1 and parsed as YAML, for exports made before the
    /// JSON format.
    LegacyLatin1,
}

impl fmt::Display for LoadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStrategy::Primary => write!(f, "primary"),
            LoadStrategy::LegacyLatin1 => write!(f, "legacy-latin1"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub artifact: T,
    pub path: PathBuf,
    pub strategy: LoadStrategy,
    pub sha256: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Model file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to load model {}: {fallback}", .path.display())]
    Failed {
        path: PathBuf,
        primary: String,
        fallback: String,
    },
    #[error("Invalid artifact {}: {source}", .path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: ArtifactError,
    },
}

pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Every byte becomes the code point of the same value, so this cannot fail.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Reads and validates one artifact. Failures are returned, never raised, and
/// each tier leaves its own diagnostic in the log.
pub fn load_artifact<T: Artifact>(path: &Path) -> Result<Loaded<T>, LoadError> {
    if !path.is_file() {
        error!("Model file not found: {}", path.display());
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let bytes = std::fs::read(path).map_err(|source| {
        error!("Failed to read {}: {}", path.display(), source);
        LoadError::Read {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let (artifact, strategy) = match serde_json::from_slice::<T>(&bytes) {
        Ok(artifact) => (artifact, LoadStrategy::Primary),
        Err(primary) => {
            warn!(
                "JSON load failed for {}: {}. Trying legacy Latin-1 decoding...",
                path.display(),
                primary
            );
            match serde_yaml::from_str::<T>(&decode_latin1(&bytes)) {
                Ok(artifact) => (artifact, LoadStrategy::LegacyLatin1),
                Err(fallback) => {
                    error!("Failed to load model {}: {}", path.display(), fallback);
                    return Err(LoadError::Failed {
                        path: path.to_path_buf(),
                        primary: primary.to_string(),
                        fallback: fallback.to_string(),
                    });
                }
            }
        }
    };

    artifact.validate().map_err(|source| {
        error!("Invalid artifact {}: {}", path.display(), source);
        LoadError::Invalid {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let sha256 = fingerprint(&bytes);
    info!(
        "Loaded {} ({}, {} features) via {} loader, sha256 {}",
        path.display(),
        artifact.kind(),
        artifact.n_features(),
        strategy,
        sha256
    );

    Ok(Loaded {
        artifact,
        path: path.to_path_buf(),
        strategy,
        sha256,
    })
}
