//! On-disk formats of the pre-trained predictors and the science scaler.
//!
//! Artifacts are exported from the training notebooks as JSON documents with
//! a `kind` tag. Older exports were written as YAML with Latin-1 bytes in the
//! column names; the loader handles both.
//!
//! Tree layout follows the flat arrays of a fitted regression tree: node `i`
//! is a leaf when `children_left[i] == -1`, otherwise a row goes left when
//! `row[feature[i]] <= threshold[i]`.

use ndarray::{Array1, ArrayView1};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared::FeatureSchema;

const LEAF: i32 = -1;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArtifactError {
    #[error("model has no estimators")]
    Empty,
    #[error("tree {tree}: {detail}")]
    TreeShape { tree: usize, detail: String },
    #[error("tree {tree}: node {node} points at child {child}")]
    ChildOutOfBounds { tree: usize, node: usize, child: i32 },
    #[error("tree {tree}: node {node} splits on feature {feature} of {n_features}")]
    FeatureOutOfBounds {
        tree: usize,
        node: usize,
        feature: i32,
        n_features: usize,
    },
    #[error("expected {expected} features, found {found}")]
    WidthMismatch { expected: usize, found: usize },
    #[error("feature names do not match the {subject} schema v{version}")]
    ColumnMismatch { subject: String, version: u32 },
    #[error("non-finite parameter in {0}")]
    NonFinite(&'static str),
}

/// Common behaviour of anything the loader can produce.
pub trait Artifact: DeserializeOwned {
    fn kind(&self) -> &'static str;

    fn validate(&self) -> Result<(), ArtifactError>;

    fn n_features(&self) -> usize;

    fn feature_names(&self) -> Option<&[String]>;

    /// Width always has to agree; names are compared when the export kept them.
    fn check_schema(&self, schema: &FeatureSchema) -> Result<(), ArtifactError> {
        if self.n_features() != schema.len() {
            return Err(ArtifactError::WidthMismatch {
                expected: schema.len(),
                found: self.n_features(),
            });
        }
        match self.feature_names() {
            Some(names) if !schema.matches_columns(names) => Err(ArtifactError::ColumnMismatch {
                subject: schema.subject.to_string(),
                version: schema.version,
            }),
            _ => Ok(()),
        }
    }
}

/// Scalar regression over one feature row.
pub trait Predictor {
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> Result<f64, ArtifactError>;
}

fn check_width(expected: usize, row: &ArrayView1<'_, f64>) -> Result<(), ArtifactError> {
    if row.len() != expected {
        return Err(ArtifactError::WidthMismatch {
            expected,
            found: row.len(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub children_left: Vec<i32>,
    pub children_right: Vec<i32>,
    pub feature: Vec<i32>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

impl RegressionTree {
    pub fn n_nodes(&self) -> usize {
        self.value.len()
    }

    fn validate(&self, tree: usize, n_features: usize) -> Result<(), ArtifactError> {
        let n_nodes = self.n_nodes();
        if n_nodes == 0 {
            return Err(ArtifactError::TreeShape {
                tree,
                detail: "no nodes".into(),
            });
        }
        let lengths = [
            self.children_left.len(),
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
        ];
        if lengths.iter().any(|&len| len != n_nodes) {
            return Err(ArtifactError::TreeShape {
                tree,
                detail: format!("array lengths {:?} do not match {} values", lengths, n_nodes),
            });
        }

        for node in 0..n_nodes {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == LEAF {
                if right != LEAF {
                    return Err(ArtifactError::TreeShape {
                        tree,
                        detail: format!("node {} has only a right child", node),
                    });
                }
                if !self.value[node].is_finite() {
                    return Err(ArtifactError::NonFinite("leaf value"));
                }
                continue;
            }
            // Children always come after their parent, which also rules out cycles.
            for child in [left, right] {
                if child <= node as i32 || child as usize >= n_nodes {
                    return Err(ArtifactError::ChildOutOfBounds { tree, node, child });
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature as usize >= n_features {
                return Err(ArtifactError::FeatureOutOfBounds {
                    tree,
                    node,
                    feature,
                    n_features,
                });
            }
            if self.threshold[node].is_nan() {
                return Err(ArtifactError::NonFinite("split threshold"));
            }
        }
        Ok(())
    }

    /// Assumes a validated tree.
    fn leaf_value(&self, row: &ArrayView1<'_, f64>) -> f64 {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            let feature = self.feature[node] as usize;
            node = if row[feature] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        self.value[node]
    }
}

/// Additive tree ensemble: `init + learning_rate * sum(tree(x))`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    pub n_features: usize,
    pub init: f64,
    pub learning_rate: f64,
    pub trees: Vec<RegressionTree>,
}

impl GradientBoostingRegressor {
    fn validate(&self) -> Result<(), ArtifactError> {
        if self.trees.is_empty() {
            return Err(ArtifactError::Empty);
        }
        if !self.init.is_finite() || !self.learning_rate.is_finite() {
            return Err(ArtifactError::NonFinite("ensemble parameters"));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(i, self.n_features)?;
        }
        Ok(())
    }
}

impl Predictor for GradientBoostingRegressor {
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> Result<f64, ArtifactError> {
        check_width(self.n_features, &row)?;
        let sum: f64 = self.trees.iter().map(|tree| tree.leaf_value(&row)).sum();
        Ok(self.init + self.learning_rate * sum)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressor {
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    pub intercept: f64,
    pub coef: Vec<f64>,
}

impl Predictor for LinearRegressor {
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> Result<f64, ArtifactError> {
        check_width(self.coef.len(), &row)?;
        Ok(self.intercept + row.dot(&ArrayView1::from(&self.coef[..])))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    GradientBoosting(GradientBoostingRegressor),
    Linear(LinearRegressor),
}

impl Artifact for ModelArtifact {
    fn kind(&self) -> &'static str {
        match self {
            ModelArtifact::GradientBoosting(_) => "gradient_boosting",
            ModelArtifact::Linear(_) => "linear",
        }
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        match self {
            ModelArtifact::GradientBoosting(model) => model.validate(),
            ModelArtifact::Linear(model) => {
                if model.coef.is_empty() {
                    return Err(ArtifactError::Empty);
                }
                if !model.intercept.is_finite() || model.coef.iter().any(|c| !c.is_finite()) {
                    return Err(ArtifactError::NonFinite("coefficients"));
                }
                Ok(())
            }
        }
    }

    fn n_features(&self) -> usize {
        match self {
            ModelArtifact::GradientBoosting(model) => model.n_features,
            ModelArtifact::Linear(model) => model.coef.len(),
        }
    }

    fn feature_names(&self) -> Option<&[String]> {
        match self {
            ModelArtifact::GradientBoosting(model) => model.feature_names.as_deref(),
            ModelArtifact::Linear(model) => model.feature_names.as_deref(),
        }
    }
}

impl Predictor for ModelArtifact {
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> Result<f64, ArtifactError> {
        match self {
            ModelArtifact::GradientBoosting(model) => model.predict_row(row),
            ModelArtifact::Linear(model) => model.predict_row(row),
        }
    }
}

/// Fitted standardization: `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn transform(&self, row: ArrayView1<'_, f64>) -> Result<Array1<f64>, ArtifactError> {
        check_width(self.mean.len(), &row)?;
        // Constant training columns were fitted with a zero scale; leave them unscaled.
        let scale: Array1<f64> = self
            .scale
            .iter()
            .map(|&s| if s == 0.0 { 1.0 } else { s })
            .collect();
        Ok((&row - &ArrayView1::from(&self.mean[..])) / &scale)
    }
}

impl Artifact for StandardScaler {
    fn kind(&self) -> &'static str {
        "standard_scaler"
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        if self.mean.is_empty() {
            return Err(ArtifactError::Empty);
        }
        if self.mean.len() != self.scale.len() {
            return Err(ArtifactError::WidthMismatch {
                expected: self.mean.len(),
                found: self.scale.len(),
            });
        }
        if self.mean.iter().chain(&self.scale).any(|v| !v.is_finite()) {
            return Err(ArtifactError::NonFinite("scaler"));
        }
        Ok(())
    }

    fn n_features(&self) -> usize {
        self.mean.len()
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ndarray::array;
    use shared::{MATHS_SCHEMA, SCIENCE_SCHEMA};

    /// Depth-one tree splitting on `feature` at `threshold`.
    pub(crate) fn stump(feature: i32, threshold: f64, left: f64, right: f64) -> RegressionTree {
        RegressionTree {
            children_left: vec![1, -1, -1],
            children_right: vec![2, -1, -1],
            feature: vec![feature, -2, -2],
            threshold: vec![threshold, -2.0, -2.0],
            value: vec![0.0, left, right],
        }
    }

    pub(crate) fn maths_model() -> ModelArtifact {
        ModelArtifact::GradientBoosting(GradientBoostingRegressor {
            feature_names: Some(MATHS_SCHEMA.column_names().into_iter().map(String::from).collect()),
            n_features: 14,
            init: 60.0,
            learning_rate: 0.5,
            trees: vec![stump(0, 50.0, -10.0, 10.0), stump(7, 1.5, -4.0, 6.0)],
        })
    }

    #[test]
    fn boosting_sums_leaves_from_init() {
        let model = maths_model();
        let mut row = Array1::<f64>::zeros(14);
        row[0] = 75.0;
        row[7] = 2.0;
        // 60 + 0.5 * (10 + 6)
        assert_eq!(model.predict_row(row.view()).unwrap(), 68.0);
        row[0] = 50.0;
        row[7] = 1.5;
        // Threshold ties go left.
        assert_eq!(model.predict_row(row.view()).unwrap(), 53.0);
    }

    #[test]
    fn deeper_tree_walks_to_the_right_leaf() {
        let tree = RegressionTree {
            children_left: vec![1, 3, -1, -1, -1],
            children_right: vec![2, 4, -1, -1, -1],
            feature: vec![0, 1, -2, -2, -2],
            threshold: vec![10.0, 5.0, -2.0, -2.0, -2.0],
            value: vec![0.0, 0.0, 30.0, 10.0, 20.0],
        };
        assert_eq!(tree.validate(0, 2), Ok(()));
        assert_eq!(tree.leaf_value(&array![3.0, 4.0].view()), 10.0);
        assert_eq!(tree.leaf_value(&array![3.0, 6.0].view()), 20.0);
        assert_eq!(tree.leaf_value(&array![11.0, 0.0].view()), 30.0);
    }

    #[test]
    fn malformed_trees_are_rejected() {
        let mut tree = stump(0, 1.0, 0.0, 1.0);
        tree.children_left[0] = 0;
        assert_eq!(
            tree.validate(3, 1),
            Err(ArtifactError::ChildOutOfBounds {
                tree: 3,
                node: 0,
                child: 0
            })
        );

        let tree = stump(5, 1.0, 0.0, 1.0);
        assert!(matches!(
            tree.validate(0, 2),
            Err(ArtifactError::FeatureOutOfBounds { feature: 5, .. })
        ));

        let mut tree = stump(0, 1.0, 0.0, 1.0);
        tree.threshold.pop();
        assert!(matches!(tree.validate(0, 1), Err(ArtifactError::TreeShape { .. })));
    }

    #[test]
    fn linear_model_is_a_dot_product() {
        let model = LinearRegressor {
            feature_names: None,
            intercept: 1.0,
            coef: vec![0.5, 2.0],
        };
        assert_eq!(model.predict_row(array![4.0, 1.0].view()).unwrap(), 5.0);
        assert_eq!(
            model.predict_row(array![4.0].view()),
            Err(ArtifactError::WidthMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn scaler_standardizes_and_tolerates_zero_scale() {
        let scaler = StandardScaler {
            feature_names: None,
            mean: vec![10.0, 2.0, 1.0],
            scale: vec![5.0, 0.0, 0.5],
        };
        assert_eq!(scaler.validate(), Ok(()));
        let scaled = scaler.transform(array![20.0, 3.0, 0.0].view()).unwrap();
        assert_eq!(scaled, array![2.0, 1.0, -2.0]);
    }

    #[test]
    fn schema_check_compares_width_and_names() {
        let model = maths_model();
        assert_eq!(model.check_schema(&MATHS_SCHEMA), Ok(()));
        assert_eq!(
            model.check_schema(&SCIENCE_SCHEMA),
            Err(ArtifactError::WidthMismatch {
                expected: 10,
                found: 14
            })
        );

        let mut names: Vec<String> =
            MATHS_SCHEMA.column_names().into_iter().map(String::from).collect();
        names.swap(2, 3);
        let reordered = ModelArtifact::Linear(LinearRegressor {
            feature_names: Some(names),
            intercept: 0.0,
            coef: vec![1.0; 14],
        });
        assert_eq!(
            reordered.check_schema(&MATHS_SCHEMA),
            Err(ArtifactError::ColumnMismatch {
                subject: "Maths".into(),
                version: 1
            })
        );
    }

    #[test]
    fn artifacts_deserialize_from_tagged_json() {
        let json = r#"{"kind": "linear", "intercept": 2, "coef": [1, 0.5]}"#;
        let model: ModelArtifact = serde_json::from_str(json).unwrap();
        assert_eq!(model.kind(), "linear");
        assert_eq!(model.n_features(), 2);
        assert_eq!(model.feature_names(), None);
    }
}
