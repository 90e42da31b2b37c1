use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/predictor.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub artifacts: ArtifactConfig,
    pub frontend: FrontendConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Relative artifact paths are resolved against this directory.
    pub dir: PathBuf,
    pub maths_model: PathBuf,
    pub science_model: PathBuf,
    pub science_scaler: PathBuf,
    /// Refuse science predictions when the scaler failed to load instead of
    /// predicting on unscaled features.
    pub require_science_scaler: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendConfig {
    pub dist_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8081,
        }
    }
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("artifacts"),
            maths_model: PathBuf::from("maths_model.json"),
            science_model: PathBuf::from("science_model.json"),
            science_scaler: PathBuf::from("science_scaler.json"),
            require_science_scaler: false,
        }
    }
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            dist_dir: PathBuf::from("frontend/dist"),
        }
    }
}

impl ArtifactConfig {
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.dir.join(path)
        }
    }

    pub fn maths_model_path(&self) -> PathBuf {
        self.resolve(&self.maths_model)
    }

    pub fn science_model_path(&self) -> PathBuf {
        self.resolve(&self.science_model)
    }

    pub fn science_scaler_path(&self) -> PathBuf {
        self.resolve(&self.science_scaler)
    }
}

fn parse_bool(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue { key, value }),
    }
}

impl AppConfig {
    pub fn from_yaml_str(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(path, &contents)
    }

    /// File named by `PREDICTOR_CONFIG` (must exist), else the default path
    /// when present, else built-in defaults. Environment variables win over
    /// the file.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("PREDICTOR_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.is_file() {
                    Self::from_file(default)?
                } else {
                    log::info!("No {} found, using built-in defaults", DEFAULT_CONFIG_PATH);
                    Self::default()
                }
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("BIND_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key: "PORT", value: port })?;
        }
        if let Some(dir) = lookup("ARTIFACT_DIR") {
            self.artifacts.dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("MATHS_MODEL_PATH") {
            self.artifacts.maths_model = PathBuf::from(path);
        }
        if let Some(path) = lookup("SCIENCE_MODEL_PATH") {
            self.artifacts.science_model = PathBuf::from(path);
        }
        if let Some(path) = lookup("SCIENCE_SCALER_PATH") {
            self.artifacts.science_scaler = PathBuf::from(path);
        }
        if let Some(value) = lookup("SCIENCE_REQUIRE_SCALER") {
            self.artifacts.require_science_scaler = parse_bool("SCIENCE_REQUIRE_SCALER", value)?;
        }
        if let Some(dir) = lookup("FRONTEND_DIR") {
            self.frontend.dist_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
