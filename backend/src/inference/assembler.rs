use ndarray::{Array1, ArrayView1};
use shared::{Feature, FeatureSchema, MappingError, PredictionRequest, Subject};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssemblyError {
    #[error(transparent)]
    UnknownLabel(#[from] MappingError),
    #[error("{0} is not a categorical feature")]
    NotCategorical(Feature),
    #[error("{subject} record is missing {feature}")]
    MissingFeature { subject: Subject, feature: Feature },
    #[error("{feature} is not part of the {subject} schema")]
    UnexpectedFeature { subject: Subject, feature: Feature },
    #[error("{0} was supplied more than once")]
    DuplicateFeature(Feature),
}

/// One row of model input, stored in the schema's column order.
#[derive(Debug, Clone, PartialEq)]
pub struct InputRecord {
    schema: &'static FeatureSchema,
    values: Array1<f64>,
}

impl InputRecord {
    pub fn schema(&self) -> &'static FeatureSchema {
        self.schema
    }

    pub fn values(&self) -> ArrayView1<'_, f64> {
        self.values.view()
    }

    pub fn get(&self, feature: Feature) -> Option<f64> {
        self.schema.position(feature).map(|i| self.values[i])
    }

    pub fn fields(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        self.schema.features().iter().copied().zip(self.values.iter().copied())
    }
}

/// Collects fields in any order and reindexes them into schema order.
pub struct FeatureAssembler {
    schema: &'static FeatureSchema,
    fields: Vec<(Feature, f64)>,
}

impl FeatureAssembler {
    pub fn new(schema: &'static FeatureSchema) -> Self {
        Self {
            schema,
            fields: Vec::with_capacity(schema.len()),
        }
    }

    /// Numeric answers pass through untouched; bounds were checked on input.
    pub fn numeric(&mut self, feature: Feature, value: f64) -> &mut Self {
        self.fields.push((feature, value));
        self
    }

    pub fn label(&mut self, feature: Feature, label: &str) -> Result<&mut Self, AssemblyError> {
        let category = feature
            .category()
            .ok_or(AssemblyError::NotCategorical(feature))?;
        let code = category.mapping().resolve(label)?;
        self.fields.push((feature, code as f64));
        Ok(self)
    }

    pub fn finish(self) -> Result<InputRecord, AssemblyError> {
        let subject = self.schema.subject;
        let mut slots: Vec<Option<f64>> = vec![None; self.schema.len()];

        for (feature, value) in self.fields {
            let index = self
                .schema
                .position(feature)
                .ok_or(AssemblyError::UnexpectedFeature { subject, feature })?;
            if slots[index].replace(value).is_some() {
                return Err(AssemblyError::DuplicateFeature(feature));
            }
        }

        let values = slots
            .into_iter()
            .zip(self.schema.features())
            .map(|(slot, &feature)| slot.ok_or(AssemblyError::MissingFeature { subject, feature }))
            .collect::<Result<Vec<f64>, _>>()?;

        Ok(InputRecord {
            schema: self.schema,
            values: Array1::from(values),
        })
    }
}

pub fn assemble<R: PredictionRequest>(request: &R) -> Result<InputRecord, AssemblyError> {
    let mut assembler = FeatureAssembler::new(R::SUBJECT.schema());
    for (feature, value) in request.numeric_inputs() {
        assembler.numeric(feature, value);
    }
    for (feature, label) in request.label_inputs() {
        assembler.label(feature, label)?;
    }
    assembler.finish()
}
