use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::mapping::Category;
use crate::schema::{Feature, FeatureKind, Subject};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("{} must be a finite number", .feature.title())]
    NotFinite { feature: Feature },
    #[error("{} must be between {min} and {max}, got {value}", .feature.title())]
    OutOfRange {
        feature: Feature,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// A form submission for one subject: numeric answers plus the display
/// labels the user picked.
pub trait PredictionRequest {
    const SUBJECT: Subject;

    fn numeric_inputs(&self) -> Vec<(Feature, f64)>;

    fn label_inputs(&self) -> Vec<(Feature, &str)>;

    /// Returns false when the feature is not part of this form.
    fn set_numeric(&mut self, feature: Feature, value: f64) -> bool;

    fn set_label(&mut self, feature: Feature, label: String) -> bool;

    /// Stores what the user typed. Text that is not a number is kept as NaN
    /// so `validate` refuses it instead of the previous value going out.
    fn set_numeric_text(&mut self, feature: Feature, text: &str) -> bool {
        let value = text.trim().parse::<f64>().unwrap_or(f64::NAN);
        self.set_numeric(feature, value)
    }

    /// Bounds check done when input is collected. Assembly does not repeat it.
    fn validate(&self) -> Result<(), InputError> {
        for (feature, value) in self.numeric_inputs() {
            if !value.is_finite() {
                return Err(InputError::NotFinite { feature });
            }
            if let FeatureKind::Numeric(bounds) = feature.kind() {
                if !bounds.contains(value) {
                    return Err(InputError::OutOfRange {
                        feature,
                        value,
                        min: bounds.min,
                        max: bounds.max,
                    });
                }
            }
        }
        Ok(())
    }
}

fn default_label(category: Category) -> String {
    category.mapping().default_label().to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MathsPredictionRequest {
    pub term1: f64,
    pub term2: f64,
    pub study_hours: f64,
    pub family_income: String,
    pub mother_education: String,
    pub father_education: String,
    pub extra_classes: String,
    pub food: String,
    pub transport: String,
    pub family_relationship: String,
    pub nursery: String,
    pub internet: String,
    pub gender: String,
    pub higher_education: String,
}

impl Default for MathsPredictionRequest {
    fn default() -> Self {
        Self {
            term1: 0.0,
            term2: 0.0,
            study_hours: 1.0,
            family_income: default_label(Category::FamilyIncome),
            mother_education: default_label(Category::Education),
            father_education: default_label(Category::Education),
            extra_classes: default_label(Category::ExtraClasses),
            food: default_label(Category::Food),
            transport: default_label(Category::Transport),
            family_relationship: default_label(Category::FamilyRelationship),
            nursery: default_label(Category::Nursery),
            internet: default_label(Category::Internet),
            gender: default_label(Category::Gender),
            higher_education: default_label(Category::HigherEducation),
        }
    }
}

impl PredictionRequest for MathsPredictionRequest {
    const SUBJECT: Subject = Subject::Maths;

    fn numeric_inputs(&self) -> Vec<(Feature, f64)> {
        vec![
            (Feature::MathsTerm1, self.term1),
            (Feature::MathsTerm2, self.term2),
            (Feature::StudyHours, self.study_hours),
        ]
    }

    fn label_inputs(&self) -> Vec<(Feature, &str)> {
        vec![
            (Feature::FamilyIncome, self.family_income.as_str()),
            (Feature::MotherEducation, self.mother_education.as_str()),
            (Feature::FatherEducation, self.father_education.as_str()),
            (Feature::ExtraClasses, self.extra_classes.as_str()),
            (Feature::Food, self.food.as_str()),
            (Feature::Transport, self.transport.as_str()),
            (Feature::FamilyRelationship, self.family_relationship.as_str()),
            (Feature::Nursery, self.nursery.as_str()),
            (Feature::Internet, self.internet.as_str()),
            (Feature::Gender, self.gender.as_str()),
            (Feature::HigherEducation, self.higher_education.as_str()),
        ]
    }

    fn set_numeric(&mut self, feature: Feature, value: f64) -> bool {
        let slot = match feature {
            Feature::MathsTerm1 => &mut self.term1,
            Feature::MathsTerm2 => &mut self.term2,
            Feature::StudyHours => &mut self.study_hours,
            _ => return false,
        };
        *slot = value;
        true
    }

    fn set_label(&mut self, feature: Feature, label: String) -> bool {
        let slot = match feature {
            Feature::FamilyIncome => &mut self.family_income,
            Feature::MotherEducation => &mut self.mother_education,
            Feature::FatherEducation => &mut self.father_education,
            Feature::ExtraClasses => &mut self.extra_classes,
            Feature::Food => &mut self.food,
            Feature::Transport => &mut self.transport,
            Feature::FamilyRelationship => &mut self.family_relationship,
            Feature::Nursery => &mut self.nursery,
            Feature::Internet => &mut self.internet,
            Feature::Gender => &mut self.gender,
            Feature::HigherEducation => &mut self.higher_education,
            _ => return false,
        };
        *slot = label;
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SciencePredictionRequest {
    pub term1: f64,
    pub term2: f64,
    pub mother_education: String,
    pub father_education: String,
    pub extra_classes: String,
    pub food: String,
    pub transport: String,
    pub family_relationship: String,
    pub family_income: String,
    pub gender: String,
}

impl Default for SciencePredictionRequest {
    fn default() -> Self {
        Self {
            term1: 0.0,
            term2: 0.0,
            mother_education: default_label(Category::Education),
            father_education: default_label(Category::Education),
            extra_classes: default_label(Category::ExtraClasses),
            food: default_label(Category::Food),
            transport: default_label(Category::Transport),
            family_relationship: default_label(Category::FamilyRelationship),
            family_income: default_label(Category::FamilyIncome),
            gender: default_label(Category::Gender),
        }
    }
}

impl PredictionRequest for SciencePredictionRequest {
    const SUBJECT: Subject = Subject::Science;

    fn numeric_inputs(&self) -> Vec<(Feature, f64)> {
        vec![
            (Feature::ScienceTerm1, self.term1),
            (Feature::ScienceTerm2, self.term2),
        ]
    }

    fn label_inputs(&self) -> Vec<(Feature, &str)> {
        vec![
            (Feature::MotherEducation, self.mother_education.as_str()),
            (Feature::FatherEducation, self.father_education.as_str()),
            (Feature::ExtraClasses, self.extra_classes.as_str()),
            (Feature::Food, self.food.as_str()),
            (Feature::Transport, self.transport.as_str()),
            (Feature::FamilyRelationship, self.family_relationship.as_str()),
            (Feature::FamilyIncome, self.family_income.as_str()),
            (Feature::Gender, self.gender.as_str()),
        ]
    }

    fn set_numeric(&mut self, feature: Feature, value: f64) -> bool {
        let slot = match feature {
            Feature::ScienceTerm1 => &mut self.term1,
            Feature::ScienceTerm2 => &mut self.term2,
            _ => return false,
        };
        *slot = value;
        true
    }

    fn set_label(&mut self, feature: Feature, label: String) -> bool {
        let slot = match feature {
            Feature::MotherEducation => &mut self.mother_education,
            Feature::FatherEducation => &mut self.father_education,
            Feature::ExtraClasses => &mut self.extra_classes,
            Feature::Food => &mut self.food,
            Feature::Transport => &mut self.transport,
            Feature::FamilyRelationship => &mut self.family_relationship,
            Feature::FamilyIncome => &mut self.family_income,
            Feature::Gender => &mut self.gender,
            _ => return false,
        };
        *slot = label;
        true
    }
}

/// Marks are shown with two decimals.
pub fn round_mark(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub request_id: String,
    pub subject: Subject,
    pub predicted_mark: f64,
    pub raw_estimate: f64,
    /// False when a science prediction ran without its fitted scaler.
    pub scaled: bool,
    #[serde(default)]
    pub warnings: Vec<String>,
    pub predicted_at: String,
}

impl PredictionResponse {
    pub fn display_mark(&self) -> String {
        format!("{:.2}", self.raw_estimate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    UnknownLabel,
    ModelUnavailable,
    ScalerUnavailable,
    PredictionFailed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactStatus {
    pub name: String,
    pub path: String,
    pub loaded: bool,
    pub kind: Option<String>,
    pub strategy: Option<String>,
    pub sha256: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaInfo {
    pub subject: Subject,
    pub version: u32,
    pub features: Vec<Feature>,
}

impl SchemaInfo {
    pub fn of(subject: Subject) -> Self {
        let schema = subject.schema();
        Self {
            subject,
            version: schema.version,
            features: schema.features().to_vec(),
        }
    }

    pub fn all() -> Vec<Self> {
        Subject::iter().map(Self::of).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub artifacts: Vec<ArtifactStatus>,
    pub schemas: Vec<SchemaInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryOptions {
    pub category: Category,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericField {
    pub feature: Feature,
    pub title: String,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormOptions {
    pub categories: Vec<CategoryOptions>,
    pub numeric: Vec<NumericField>,
    pub schemas: Vec<SchemaInfo>,
}

impl FormOptions {
    pub fn current() -> Self {
        let categories = Category::iter()
            .map(|category| CategoryOptions {
                category,
                labels: category.mapping().labels().map(String::from).collect(),
            })
            .collect();
        let numeric = Feature::iter()
            .filter_map(|feature| match feature.kind() {
                FeatureKind::Numeric(bounds) => Some(NumericField {
                    feature,
                    title: feature.title().to_string(),
                    min: bounds.min,
                    max: bounds.max,
                }),
                FeatureKind::Categorical(_) => None,
            })
            .collect();
        Self {
            categories,
            numeric,
            schemas: SchemaInfo::all(),
        }
    }
}
