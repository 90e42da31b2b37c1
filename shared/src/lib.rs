pub mod api;
pub mod mapping;
pub mod schema;

pub use api::{
    ArtifactStatus, ErrorKind, ErrorResponse, FormOptions, HealthResponse, InputError,
    MathsPredictionRequest, PredictionRequest, PredictionResponse, SciencePredictionRequest,
    round_mark,
};
pub use mapping::{Category, CategoryMapping, Code, MappingError};
pub use schema::{Feature, FeatureKind, FeatureSchema, MATHS_SCHEMA, SCIENCE_SCHEMA, Subject};
