use std::path::{Path, PathBuf};

use log::{info, warn};
use shared::{ArtifactStatus, ErrorKind, InputError, PredictionRequest, Subject};

use super::artifact::{Artifact, ArtifactError, ModelArtifact, Predictor, StandardScaler};
use super::assembler::{AssemblyError, InputRecord, assemble};
use super::loader::{LoadError, Loaded, load_artifact};
use crate::config::ArtifactConfig;

pub const UNSCALED_WARNING: &str =
    "Science scaler unavailable; prediction used unscaled features";

#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("{subject} model unavailable: {reason}")]
    ModelUnavailable { subject: Subject, reason: String },
    #[error("Science scaler unavailable: {0}")]
    ScalerUnavailable(String),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
    #[error("scaling failed: {0}")]
    Scaling(#[source] ArtifactError),
    #[error("prediction failed: {0}")]
    Inference(#[source] ArtifactError),
}

impl PredictionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PredictionError::ModelUnavailable { .. } => ErrorKind::ModelUnavailable,
            PredictionError::ScalerUnavailable(_) => ErrorKind::ScalerUnavailable,
            PredictionError::Input(_) => ErrorKind::InvalidInput,
            PredictionError::Assembly(AssemblyError::UnknownLabel(_)) => ErrorKind::UnknownLabel,
            PredictionError::Assembly(_) => ErrorKind::InvalidInput,
            PredictionError::Scaling(_) | PredictionError::Inference(_) => {
                ErrorKind::PredictionFailed
            }
        }
    }
}

/// One artifact and how its load went. A failed slot stays failed for the
/// life of the process.
#[derive(Debug)]
pub struct Slot<T> {
    name: &'static str,
    path: PathBuf,
    state: Result<Loaded<T>, LoadError>,
}

impl<T: Artifact> Slot<T> {
    pub fn load(name: &'static str, path: &Path, subject: Subject) -> Self {
        let state = load_artifact::<T>(path).and_then(|loaded| {
            loaded
                .artifact
                .check_schema(subject.schema())
                .map_err(|source| {
                    warn!("{} does not match the {} schema: {}", name, subject, source);
                    LoadError::Invalid {
                        path: path.to_path_buf(),
                        source,
                    }
                })?;
            Ok(loaded)
        });
        Self {
            name,
            path: path.to_path_buf(),
            state,
        }
    }

    pub fn from_state(name: &'static str, path: PathBuf, state: Result<Loaded<T>, LoadError>) -> Self {
        Self { name, path, state }
    }

    pub fn artifact(&self) -> Option<&T> {
        self.state.as_ref().ok().map(|loaded| &loaded.artifact)
    }

    fn unavailable_reason(&self) -> String {
        match &self.state {
            Ok(_) => String::new(),
            Err(err) => err.to_string(),
        }
    }

    pub fn status(&self) -> ArtifactStatus {
        let (loaded, kind, strategy, sha256, error) = match &self.state {
            Ok(loaded) => (
                true,
                Some(loaded.artifact.kind().to_string()),
                Some(loaded.strategy.to_string()),
                Some(loaded.sha256.clone()),
                None,
            ),
            Err(err) => (false, None, None, None, Some(err.to_string())),
        };
        ArtifactStatus {
            name: self.name.to_string(),
            path: self.path.display().to_string(),
            loaded,
            kind,
            strategy,
            sha256,
            error,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub subject: Subject,
    pub estimate: f64,
    pub scaled: bool,
    pub warnings: Vec<String>,
    pub record: InputRecord,
}

/// Everything loaded at startup. Read-only afterwards, so workers share it
/// without locking.
#[derive(Debug)]
pub struct ModelRegistry {
    maths: Slot<ModelArtifact>,
    science: Slot<ModelArtifact>,
    science_scaler: Slot<StandardScaler>,
    require_science_scaler: bool,
}

impl ModelRegistry {
    pub fn load(config: &ArtifactConfig) -> Self {
        let registry = Self {
            maths: Slot::load("maths_model", &config.maths_model_path(), Subject::Maths),
            science: Slot::load("science_model", &config.science_model_path(), Subject::Science),
            science_scaler: Slot::load(
                "science_scaler",
                &config.science_scaler_path(),
                Subject::Science,
            ),
            require_science_scaler: config.require_science_scaler,
        };
        for status in registry.status() {
            if status.loaded {
                info!("{} ready ({})", status.name, status.path);
            } else {
                warn!(
                    "{} unavailable, its predictions are disabled: {}",
                    status.name,
                    status.error.unwrap_or_default()
                );
            }
        }
        registry
    }

    pub fn from_slots(
        maths: Slot<ModelArtifact>,
        science: Slot<ModelArtifact>,
        science_scaler: Slot<StandardScaler>,
        require_science_scaler: bool,
    ) -> Self {
        Self {
            maths,
            science,
            science_scaler,
            require_science_scaler,
        }
    }

    pub fn status(&self) -> Vec<ArtifactStatus> {
        vec![
            self.maths.status(),
            self.science.status(),
            self.science_scaler.status(),
        ]
    }

    fn model_slot(&self, subject: Subject) -> &Slot<ModelArtifact> {
        match subject {
            Subject::Maths => &self.maths,
            Subject::Science => &self.science,
        }
    }

    /// Assemble, optionally scale, predict. One shot: nothing is kept
    /// between calls.
    pub fn predict<R: PredictionRequest>(&self, request: &R) -> Result<Prediction, PredictionError> {
        let subject = R::SUBJECT;
        let slot = self.model_slot(subject);
        let model = slot
            .artifact()
            .ok_or_else(|| PredictionError::ModelUnavailable {
                subject,
                reason: slot.unavailable_reason(),
            })?;

        let record = assemble(request)?;
        let mut warnings = Vec::new();

        let (estimate, scaled) = match subject {
            Subject::Maths => (
                model
                    .predict_row(record.values())
                    .map_err(PredictionError::Inference)?,
                false,
            ),
            Subject::Science => match self.science_scaler.artifact() {
                Some(scaler) => {
                    let scaled = scaler
                        .transform(record.values())
                        .map_err(PredictionError::Scaling)?;
                    (
                        model
                            .predict_row(scaled.view())
                            .map_err(PredictionError::Inference)?,
                        true,
                    )
                }
                None if self.require_science_scaler => {
                    return Err(PredictionError::ScalerUnavailable(
                        self.science_scaler.unavailable_reason(),
                    ));
                }
                None => {
                    warn!("{}", UNSCALED_WARNING);
                    warnings.push(UNSCALED_WARNING.to_string());
                    (
                        model
                            .predict_row(record.values())
                            .map_err(PredictionError::Inference)?,
                        false,
                    )
                }
            },
        };

        Ok(Prediction {
            subject,
            estimate,
            scaled,
            warnings,
            record,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::inference::artifact::tests::maths_model;
    use crate::inference::artifact::LinearRegressor;
    use crate::inference::loader::LoadStrategy;
    use shared::{
        Feature, MathsPredictionRequest, SCIENCE_SCHEMA, SciencePredictionRequest,
    };

    fn loaded<T>(artifact: T) -> Result<Loaded<T>, LoadError> {
        Ok(Loaded {
            artifact,
            path: PathBuf::from("memory"),
            strategy: LoadStrategy::Primary,
            sha256: "0".repeat(64),
        })
    }

    fn missing<T>(name: &str) -> Result<Loaded<T>, LoadError> {
        Err(LoadError::NotFound(PathBuf::from(name)))
    }

    /// Science model reading only the first term score.
    fn science_model() -> ModelArtifact {
        let mut coef = vec![0.0; SCIENCE_SCHEMA.len()];
        coef[0] = 10.0;
        ModelArtifact::Linear(LinearRegressor {
            feature_names: None,
            intercept: 50.0,
            coef,
        })
    }

    fn science_scaler() -> StandardScaler {
        StandardScaler {
            feature_names: None,
            mean: vec![60.0; SCIENCE_SCHEMA.len()],
            scale: vec![20.0; SCIENCE_SCHEMA.len()],
        }
    }

    pub(crate) fn registry(with_scaler: bool, require_scaler: bool) -> ModelRegistry {
        let scaler = if with_scaler {
            loaded(science_scaler())
        } else {
            missing("gbr_science_scaler.json")
        };
        ModelRegistry::from_slots(
            Slot::from_state("maths_model", "maths.json".into(), loaded(maths_model())),
            Slot::from_state("science_model", "science.json".into(), loaded(science_model())),
            Slot::from_state("science_scaler", "gbr_science_scaler.json".into(), scaler),
            require_scaler,
        )
    }

    fn science_request() -> SciencePredictionRequest {
        SciencePredictionRequest {
            term1: 70.0,
            term2: 65.0,
            ..Default::default()
        }
    }

    #[test]
    fn maths_prediction_uses_the_assembled_record() {
        let request = MathsPredictionRequest {
            term1: 75.0,
            term2: 80.0,
            study_hours: 2.0,
            ..Default::default()
        };
        let prediction = registry(true, false).predict(&request).unwrap();
        assert_eq!(prediction.subject, Subject::Maths);
        assert_eq!(prediction.estimate, 68.0);
        assert!(!prediction.scaled);
        assert!(prediction.warnings.is_empty());
        assert_eq!(prediction.record.get(Feature::StudyHours), Some(2.0));
    }

    #[test]
    fn science_prediction_applies_the_scaler() {
        let prediction = registry(true, false).predict(&science_request()).unwrap();
        // (70 - 60) / 20 = 0.5 -> 50 + 10 * 0.5
        assert_eq!(prediction.estimate, 55.0);
        assert!(prediction.scaled);
        assert!(prediction.warnings.is_empty());
        // The record itself stays unscaled.
        assert_eq!(prediction.record.get(Feature::ScienceTerm1), Some(70.0));
    }

    #[test]
    fn missing_scaler_degrades_visibly() {
        let prediction = registry(false, false).predict(&science_request()).unwrap();
        assert_eq!(prediction.estimate, 750.0);
        assert!(!prediction.scaled);
        assert_eq!(prediction.warnings, vec![UNSCALED_WARNING.to_string()]);
    }

    #[test]
    fn missing_scaler_can_be_made_fatal() {
        let err = registry(false, true).predict(&science_request()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ScalerUnavailable);
        assert!(err.to_string().contains("gbr_science_scaler.json"));
    }

    #[test]
    fn unavailable_model_is_never_invoked() {
        let registry = ModelRegistry::from_slots(
            Slot::from_state("maths_model", "maths.json".into(), missing("maths.json")),
            Slot::from_state("science_model", "science.json".into(), loaded(science_model())),
            Slot::from_state("science_scaler", "scaler.json".into(), loaded(science_scaler())),
            false,
        );
        let err = registry
            .predict(&MathsPredictionRequest::default())
            .unwrap_err();
        assert!(matches!(
            err,
            PredictionError::ModelUnavailable {
                subject: Subject::Maths,
                ..
            }
        ));
        assert_eq!(err.kind(), ErrorKind::ModelUnavailable);
        // The other subject keeps working.
        assert!(registry.predict(&science_request()).is_ok());
    }

    #[test]
    fn unknown_label_maps_to_its_own_kind() {
        let request = SciencePredictionRequest {
            transport: "Helicopter".into(),
            ..science_request()
        };
        let err = registry(true, false).predict(&request).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownLabel);
    }

    #[test]
    fn status_reports_each_artifact() {
        let status = registry(false, false).status();
        assert_eq!(status.len(), 3);
        assert!(status[0].loaded);
        assert_eq!(status[0].strategy.as_deref(), Some("primary"));
        assert_eq!(status[0].kind.as_deref(), Some("gradient_boosting"));
        assert!(!status[2].loaded);
        assert!(status[2].error.as_deref().unwrap().contains("not found"));
    }

    #[test]
    fn slot_load_rejects_artifacts_for_the_wrong_schema() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("maths.json");
        let body = serde_json::to_vec(&science_model()).unwrap();
        std::fs::write(&path, body).unwrap();

        let slot = Slot::<ModelArtifact>::load("maths_model", &path, Subject::Maths);
        assert!(slot.artifact().is_none());
        assert!(slot.status().error.unwrap().contains("expected 14 features"));

        let slot = Slot::<ModelArtifact>::load("science_model", &path, Subject::Science);
        assert!(slot.artifact().is_some());
    }

    #[test]
    fn bundled_artifacts_load_and_predict() {
        let config = ArtifactConfig {
            dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../artifacts"),
            ..ArtifactConfig::default()
        };
        let registry = ModelRegistry::load(&config);
        assert!(registry.status().iter().all(|status| status.loaded));

        let maths = registry.predict(&MathsPredictionRequest::default()).unwrap();
        assert!(maths.estimate.is_finite());
        let science = registry.predict(&science_request()).unwrap();
        assert!(science.scaled);
        assert!(science.warnings.is_empty());
    }
}
