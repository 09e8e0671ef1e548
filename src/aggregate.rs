//! Per-attribute category counts for the dashboard charts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{ProfileField, Record};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

pub type Aggregates = BTreeMap<ProfileField, Vec<CategoryCount>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    Exact,
    ContainsIgnoreCase,
}

#[derive(Debug, Clone, Copy)]
struct Category {
    label: &'static str,
    rule: Rule,
}

const fn exact(label: &'static str) -> Category {
    Category {
        label,
        rule: Rule::Exact,
    }
}

struct Vocabulary {
    categories: &'static [Category],
    keep_empty: bool,
}

const PET_TYPES: &[Category] = &[exact("Dog"), exact("Cat"), exact("Other")];

const STRESS_LEVELS: &[Category] = &[
    exact("Very Low"),
    exact("Low"),
    exact("Moderate"),
    exact("High"),
    exact("Very High"),
    exact("Extreme"),
];

const DRUG_USAGE: &[Category] = &[
    exact("None"),
    Category {
        label: "Allergies",
        rule: Rule::ContainsIgnoreCase,
    },
    exact("Anxiety Medication"),
    exact("Pain Relief"),
    exact("Antibiotics"),
    exact("Heart Medication"),
    exact("Seizure Medication"),
    exact("Supplements"),
];

const PET_AGES: &[Category] = &[exact("1-6"), exact("7-12"), exact("13-20")];

const PET_WEIGHTS: &[Category] = &[
    exact("0-10 lbs"),
    exact("11-25 lbs"),
    exact("26-50 lbs"),
    exact("51-100 lbs"),
    exact("100+ lbs"),
];

fn vocabulary(field: ProfileField) -> Vocabulary {
    match field {
        ProfileField::PetType => Vocabulary {
            categories: PET_TYPES,
            keep_empty: true,
        },
        ProfileField::StressLevel => Vocabulary {
            categories: STRESS_LEVELS,
            keep_empty: false,
        },
        ProfileField::DrugUsage => Vocabulary {
            categories: DRUG_USAGE,
            keep_empty: false,
        },
        ProfileField::PetAge => Vocabulary {
            categories: PET_AGES,
            keep_empty: true,
        },
        ProfileField::PetWeight => Vocabulary {
            categories: PET_WEIGHTS,
            keep_empty: true,
        },
    }
}

impl Category {
    fn matches(&self, value: &str) -> bool {
        match self.rule {
            Rule::Exact => value == self.label,
            Rule::ContainsIgnoreCase => value
                .to_lowercase()
                .contains(&self.label.to_lowercase()),
        }
    }
}

/// Category the value falls into, first match in vocabulary order.
pub fn categorize(field: ProfileField, value: &str) -> Option<&'static str> {
    if value.is_empty() {
        return None;
    }
    vocabulary(field)
        .categories
        .iter()
        .find(|c| c.matches(value))
        .map(|c| c.label)
}

/// Count records per category for every profile attribute. Values outside the
/// fixed vocabulary are left out rather than lumped into an "other" bucket.
pub fn aggregate(records: &[Record]) -> Aggregates {
    ProfileField::ALL
        .into_iter()
        .map(|field| (field, aggregate_field(records, field)))
        .collect()
}

pub fn aggregate_field(records: &[Record], field: ProfileField) -> Vec<CategoryCount> {
    let vocab = vocabulary(field);
    let mut counts = vec![0usize; vocab.categories.len()];
    for record in records {
        let Some(label) = categorize(field, record.profile.get(field)) else {
            continue;
        };
        if let Some(idx) = vocab.categories.iter().position(|c| c.label == label) {
            counts[idx] += 1;
        }
    }

    vocab
        .categories
        .iter()
        .zip(counts)
        .filter(|(_, count)| vocab.keep_empty || *count > 0)
        .map(|(c, count)| CategoryCount {
            category: c.label.to_string(),
            count,
        })
        .collect()
}
