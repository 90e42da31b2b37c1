use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Integer value a category took in the training data.
pub type Code = i64;

/// One categorical survey question. Several features may share a category
/// (mother's and father's education use the same table).
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
    Display,
    EnumIter,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    FamilyIncome,
    Education,
    FamilyRelationship,
    Food,
    Internet,
    Nursery,
    HigherEducation,
    Transport,
    ExtraClasses,
    Gender,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MappingError {
    #[error("Unknown label {label:?} for {category}")]
    UnknownLabel { category: Category, label: String },
    #[error("Code {code} appears more than once in {category}")]
    DuplicateCode { category: Category, code: Code },
    #[error("Label {label:?} appears more than once in {category}")]
    DuplicateLabel { category: Category, label: String },
}

/// Bidirectional code/label table. Both directions read the same entry list,
/// so `label(code(l)) == l` holds for every label in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryMapping {
    category: Category,
    entries: &'static [(Code, &'static str)],
}

impl CategoryMapping {
    pub const fn new(category: Category, entries: &'static [(Code, &'static str)]) -> Self {
        Self { category, entries }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Entries in display order.
    pub fn entries(&self) -> &'static [(Code, &'static str)] {
        self.entries
    }

    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(_, label)| *label)
    }

    /// The option a form preselects.
    pub fn default_label(&self) -> &'static str {
        self.entries.first().map(|(_, label)| *label).unwrap_or_default()
    }

    pub fn label(&self, code: Code) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, label)| *label)
    }

    pub fn code(&self, label: &str) -> Option<Code> {
        self.entries
            .iter()
            .find(|(_, l)| *l == label)
            .map(|(code, _)| *code)
    }

    /// Reverse lookup that refuses to guess.
    pub fn resolve(&self, label: &str) -> Result<Code, MappingError> {
        self.code(label).ok_or_else(|| MappingError::UnknownLabel {
            category: self.category,
            label: label.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), MappingError> {
        for (i, (code, label)) in self.entries.iter().enumerate() {
            let rest = &self.entries[i + 1..];
            if rest.iter().any(|(c, _)| c == code) {
                return Err(MappingError::DuplicateCode {
                    category: self.category,
                    code: *code,
                });
            }
            if rest.iter().any(|(_, l)| l == label) {
                return Err(MappingError::DuplicateLabel {
                    category: self.category,
                    label: label.to_string(),
                });
            }
        }
        Ok(())
    }
}

pub static FAMILY_INCOME: CategoryMapping = CategoryMapping::new(
    Category::FamilyIncome,
    &[
        (1, "Below 25,000"),
        (2, "25,000 - 50,000"),
        (3, "50,000 - 75,000"),
        (4, "75,000 - 100,000"),
        (5, "Above 100,000"),
    ],
);

pub static EDUCATION: CategoryMapping = CategoryMapping::new(
    Category::Education,
    &[
        (0, "Don't go to school"),
        (1, "Grade (1-5)"),
        (2, "Grade (6-11)"),
        (3, "Pass (O/L)"),
        (4, "Diploma"),
        (5, "Pass (A/L)"),
        (6, "Degree holder"),
    ],
);

pub static FAMILY_RELATIONSHIP: CategoryMapping = CategoryMapping::new(
    Category::FamilyRelationship,
    &[
        (0, "Very bad / Bad"),
        (1, "Average"),
        (2, "Good"),
        (3, "Very good"),
    ],
);

pub static FOOD: CategoryMapping = CategoryMapping::new(
    Category::Food,
    &[
        (1, "Very sweet / Very salty / Junk food"),
        (2, "Healthy food"),
    ],
);

pub static INTERNET: CategoryMapping =
    CategoryMapping::new(Category::Internet, &[(2, "Have"), (1, "No")]);

pub static NURSERY: CategoryMapping =
    CategoryMapping::new(Category::Nursery, &[(1, "Yes"), (0, "No")]);

pub static HIGHER_EDUCATION: CategoryMapping =
    CategoryMapping::new(Category::HigherEducation, &[(1, "Yes"), (0, "No")]);

pub static TRANSPORT: CategoryMapping = CategoryMapping::new(
    Category::Transport,
    &[(1, "Personal vehicle"), (0, "Other")],
);

pub static EXTRA_CLASSES: CategoryMapping =
    CategoryMapping::new(Category::ExtraClasses, &[(2, "Yes"), (1, "No")]);

pub static GENDER: CategoryMapping =
    CategoryMapping::new(Category::Gender, &[(1, "Female"), (0, "Male")]);

impl Category {
    pub fn mapping(self) -> &'static CategoryMapping {
        match self {
            Category::FamilyIncome => &FAMILY_INCOME,
            Category::Education => &EDUCATION,
            Category::FamilyRelationship => &FAMILY_RELATIONSHIP,
            Category::Food => &FOOD,
            Category::Internet => &INTERNET,
            Category::Nursery => &NURSERY,
            Category::HigherEducation => &HIGHER_EDUCATION,
            Category::Transport => &TRANSPORT,
            Category::ExtraClasses => &EXTRA_CLASSES,
            Category::Gender => &GENDER,
        }
    }
}
