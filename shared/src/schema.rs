use derive_more::Display;
use serde::{Deserialize, Serialize};
use strum_macros::{EnumIter, EnumString};

use crate::mapping::Category;

/// Inclusive range a numeric input must fall in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }
}

pub const TERM_MARK_BOUNDS: Bounds = Bounds::new(0.0, 200.0);
pub const STUDY_HOURS_BOUNDS: Bounds = Bounds::new(0.0, 24.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    #[display(fmt = "Maths")]
    Maths,
    #[display(fmt = "Science")]
    Science,
}

impl Subject {
    pub fn schema(self) -> &'static FeatureSchema {
        match self {
            Subject::Maths => &MATHS_SCHEMA,
            Subject::Science => &SCIENCE_SCHEMA,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureKind {
    Numeric(Bounds),
    Categorical(Category),
}

/// A single model input. Each feature owns the column name it had in the
/// training table; those names are part of the artifact contract.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Feature {
    MathsTerm1,
    MathsTerm2,
    ScienceTerm1,
    ScienceTerm2,
    StudyHours,
    FamilyIncome,
    MotherEducation,
    FatherEducation,
    FamilyRelationship,
    Food,
    Internet,
    Nursery,
    HigherEducation,
    Transport,
    ExtraClasses,
    Gender,
}

impl Feature {
    pub fn kind(self) -> FeatureKind {
        match self {
            Feature::MathsTerm1
            | Feature::MathsTerm2
            | Feature::ScienceTerm1
            | Feature::ScienceTerm2 => FeatureKind::Numeric(TERM_MARK_BOUNDS),
            Feature::StudyHours => FeatureKind::Numeric(STUDY_HOURS_BOUNDS),
            Feature::FamilyIncome => FeatureKind::Categorical(Category::FamilyIncome),
            Feature::MotherEducation | Feature::FatherEducation => {
                FeatureKind::Categorical(Category::Education)
            }
            Feature::FamilyRelationship => FeatureKind::Categorical(Category::FamilyRelationship),
            Feature::Food => FeatureKind::Categorical(Category::Food),
            Feature::Internet => FeatureKind::Categorical(Category::Internet),
            Feature::Nursery => FeatureKind::Categorical(Category::Nursery),
            Feature::HigherEducation => FeatureKind::Categorical(Category::HigherEducation),
            Feature::Transport => FeatureKind::Categorical(Category::Transport),
            Feature::ExtraClasses => FeatureKind::Categorical(Category::ExtraClasses),
            Feature::Gender => FeatureKind::Categorical(Category::Gender),
        }
    }

    pub fn category(self) -> Option<Category> {
        match self.kind() {
            FeatureKind::Categorical(category) => Some(category),
            FeatureKind::Numeric(_) => None,
        }
    }

    /// Form label.
    pub fn title(self) -> &'static str {
        match self {
            Feature::MathsTerm1 => "1st Term Maths",
            Feature::MathsTerm2 => "2nd Term Maths",
            Feature::ScienceTerm1 => "1st Term Science",
            Feature::ScienceTerm2 => "2nd Term Science",
            Feature::StudyHours => "Study hours/day",
            Feature::FamilyIncome => "Family income",
            Feature::MotherEducation => "Mother's education",
            Feature::FatherEducation => "Father's education",
            Feature::FamilyRelationship => "Family relationship",
            Feature::Food => "Food habits",
            Feature::Internet => "Internet at home",
            Feature::Nursery => "Nursery school",
            Feature::HigherEducation => "Interest in higher education",
            Feature::Transport => "Transport mode",
            Feature::ExtraClasses => "Extra classes",
            Feature::Gender => "Gender",
        }
    }

    /// Column header of the survey table the models were fitted on.
    pub fn column_name(self) -> &'static str {
        match self {
            Feature::MathsTerm1 => "පළවන වාරයේ ගණිතය ලකුණු",
            Feature::MathsTerm2 => "දෙවන වාරයේ ගණිතය ලකුණු ",
            Feature::ScienceTerm1 => "පළවන වාරයේ විද්\u{200d}යා ලකුණු",
            Feature::ScienceTerm2 => "දෙවන වාරයේ විද්\u{200d}යා ලකුණු",
            Feature::MotherEducation => "6. මවගේ \u{200d} ඉහලම අධ්\u{200d}යාපන සුදුසුකම?",
            Feature::ExtraClasses => "13.ඔබ අමතර පන්ති වලට සහභාගී වෙන වද?",
            Feature::FatherEducation => "5.පියාගේ ඉහලම  අධ්\u{200d}යාපන සුදුසුකම?",
            Feature::FamilyIncome => "3.සාමාන්\u{200d}ය පවුලේ ආදායම",
            Feature::Food => "27.ඔබ නිතර ගන්නා ආහාර...?",
            Feature::StudyHours => "8. දිනකට  නිවසේදී පාඩම් කිරීම සඳහා වැය කරන පැය සංඛ්\u{200d}යාව",
            Feature::Transport => "22. පාසලට   ඔබ පැමිණෙන්නේ කෙසේද?_පුද්ගලික වාහන භාවිතයෙන්(බයිසිකලය,මෝටර් සයිකලය,ත්\u{200d}රීරෝද රථය,වෑන් රථයක........)",
            Feature::FamilyRelationship => "16.පවුලේ සබඳතා තත්ත්වය?",
            Feature::Nursery => "15.ඔබ  පෙර පාසල් ගොස් තිබේද?",
            Feature::Internet => "14.ගෙදර අන්තර්ජාල පහසුකම් තිබේද?",
            Feature::Gender => "2.ස්ත්\u{200d}රී පුරුෂ භාවය_ස්ත්\u{200d}රී",
            Feature::HigherEducation => "17.ඔබ උසස් අධ්\u{200d}යාපනය ලබා ගැනීමට කැමතිද?",
        }
    }
}

/// Ordered feature list a model was trained with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSchema {
    pub subject: Subject,
    pub version: u32,
    features: &'static [Feature],
}

impl FeatureSchema {
    pub const fn new(subject: Subject, version: u32, features: &'static [Feature]) -> Self {
        Self {
            subject,
            version,
            features,
        }
    }

    pub fn features(&self) -> &'static [Feature] {
        self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn position(&self, feature: Feature) -> Option<usize> {
        self.features.iter().position(|f| *f == feature)
    }

    pub fn contains(&self, feature: Feature) -> bool {
        self.position(feature).is_some()
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.features.iter().map(|f| f.column_name()).collect()
    }

    /// True when `names` is exactly this schema's column list, in order.
    pub fn matches_columns<S: AsRef<str>>(&self, names: &[S]) -> bool {
        names.len() == self.features.len()
            && names
                .iter()
                .zip(self.features)
                .all(|(name, feature)| name.as_ref() == feature.column_name())
    }
}

pub static MATHS_SCHEMA: FeatureSchema = FeatureSchema::new(
    Subject::Maths,
    1,
    &[
        Feature::MathsTerm1,
        Feature::MathsTerm2,
        Feature::MotherEducation,
        Feature::ExtraClasses,
        Feature::FatherEducation,
        Feature::FamilyIncome,
        Feature::Food,
        Feature::StudyHours,
        Feature::Transport,
        Feature::FamilyRelationship,
        Feature::Nursery,
        Feature::Internet,
        Feature::Gender,
        Feature::HigherEducation,
    ],
);

pub static SCIENCE_SCHEMA: FeatureSchema = FeatureSchema::new(
    Subject::Science,
    1,
    &[
        Feature::ScienceTerm1,
        Feature::ScienceTerm2,
        Feature::MotherEducation,
        Feature::ExtraClasses,
        Feature::Food,
        Feature::Transport,
        Feature::FamilyIncome,
        Feature::FatherEducation,
        Feature::FamilyRelationship,
        Feature::Gender,
    ],
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use strum::IntoEnumIterator;

    #[test]
    fn schemas_have_the_trained_widths() {
        assert_eq!(MATHS_SCHEMA.len(), 14);
        assert_eq!(SCIENCE_SCHEMA.len(), 10);
        assert_eq!(Subject::Maths.schema(), &MATHS_SCHEMA);
        assert_eq!(Subject::Science.schema(), &SCIENCE_SCHEMA);
    }

    #[test]
    fn schemas_list_each_feature_once() {
        for subject in Subject::iter() {
            let schema = subject.schema();
            let unique: HashSet<_> = schema.features().iter().collect();
            assert_eq!(unique.len(), schema.len(), "{subject}");
        }
    }

    #[test]
    fn column_names_are_unique_across_features() {
        let names: HashSet<_> = Feature::iter().map(Feature::column_name).collect();
        assert_eq!(names.len(), Feature::iter().count());
    }

    #[test]
    fn column_names_keep_training_whitespace() {
        assert!(Feature::MathsTerm2.column_name().ends_with(' '));
        assert!(Feature::MotherEducation.column_name().contains('\u{200d}'));
    }

    #[test]
    fn science_schema_uses_science_terms_only() {
        assert_eq!(SCIENCE_SCHEMA.position(Feature::ScienceTerm1), Some(0));
        assert!(!SCIENCE_SCHEMA.contains(Feature::MathsTerm1));
        assert!(!SCIENCE_SCHEMA.contains(Feature::StudyHours));
        assert!(!SCIENCE_SCHEMA.contains(Feature::Internet));
    }

    #[test]
    fn matches_columns_is_order_sensitive() {
        let mut names = MATHS_SCHEMA.column_names();
        assert!(MATHS_SCHEMA.matches_columns(&names));
        names.swap(0, 1);
        assert!(!MATHS_SCHEMA.matches_columns(&names));
        assert!(!MATHS_SCHEMA.matches_columns(&SCIENCE_SCHEMA.column_names()));
    }

    #[test]
    fn bounds_are_inclusive_and_reject_nan() {
        assert!(TERM_MARK_BOUNDS.contains(0.0));
        assert!(TERM_MARK_BOUNDS.contains(200.0));
        assert!(!TERM_MARK_BOUNDS.contains(200.01));
        assert!(STUDY_HOURS_BOUNDS.contains(24.0));
        assert!(!STUDY_HOURS_BOUNDS.contains(-0.5));
        assert!(!STUDY_HOURS_BOUNDS.contains(f64::NAN));
    }

    #[test]
    fn categorical_features_point_at_their_tables() {
        assert_eq!(Feature::FatherEducation.category(), Some(Category::Education));
        assert_eq!(Feature::StudyHours.category(), None);
        assert_eq!(
            Feature::StudyHours.kind(),
            FeatureKind::Numeric(STUDY_HOURS_BOUNDS)
        );
    }
}
