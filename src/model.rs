use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The five pet profile attributes stored as customer metafields.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    PetType,
    StressLevel,
    DrugUsage,
    PetAge,
    PetWeight,
}

impl ProfileField {
    pub const ALL: [ProfileField; 5] = [
        ProfileField::PetType,
        ProfileField::StressLevel,
        ProfileField::DrugUsage,
        ProfileField::PetAge,
        ProfileField::PetWeight,
    ];

    /// Metafield key, also used as the GraphQL alias of the metafield lookup.
    pub fn key(&self) -> &'static str {
        match self {
            ProfileField::PetType => "pet_type",
            ProfileField::StressLevel => "stress_level",
            ProfileField::DrugUsage => "drug_usage",
            ProfileField::PetAge => "pet_age",
            ProfileField::PetWeight => "pet_weight",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProfileField::PetType => "Pet type",
            ProfileField::StressLevel => "Stress level",
            ProfileField::DrugUsage => "Drug usage",
            ProfileField::PetAge => "Pet age",
            ProfileField::PetWeight => "Pet weight",
        }
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Sanitized profile attributes. Every field is either a trimmed non-empty
/// string or `""`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub pet_type: String,
    pub stress_level: String,
    pub drug_usage: String,
    pub pet_age: String,
    pub pet_weight: String,
}

impl Profile {
    pub fn get(&self, field: ProfileField) -> &str {
        match field {
            ProfileField::PetType => &self.pet_type,
            ProfileField::StressLevel => &self.stress_level,
            ProfileField::DrugUsage => &self.drug_usage,
            ProfileField::PetAge => &self.pet_age,
            ProfileField::PetWeight => &self.pet_weight,
        }
    }

    pub(crate) fn slot_mut(&mut self, field: ProfileField) -> &mut String {
        match field {
            ProfileField::PetType => &mut self.pet_type,
            ProfileField::StressLevel => &mut self.stress_level,
            ProfileField::DrugUsage => &mut self.drug_usage,
            ProfileField::PetAge => &mut self.pet_age,
            ProfileField::PetWeight => &mut self.pet_weight,
        }
    }
}

/// One customer's profile snapshot as shown on the dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    pub id: String,
    pub display_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub verified: bool,
    pub order_count: u64,
    #[serde(flatten)]
    pub profile: Profile,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationInfo {
    pub has_more: bool,
    pub total_fetched: usize,
    pub cap: Option<usize>,
}

/// Output of one collection run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionResult {
    pub records: Vec<Record>,
    pub total_count: usize,
    pub error: Option<String>,
    pub pagination_info: PaginationInfo,
}

impl CollectionResult {
    pub fn failed(message: String, cap: Option<usize>) -> Self {
        Self {
            records: Vec::new(),
            total_count: 0,
            error: Some(message),
            pagination_info: PaginationInfo {
                has_more: false,
                total_fetched: 0,
                cap,
            },
        }
    }
}
