//! Writing a customer's pet profile back as metafields.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::model::{Profile, ProfileField};
use crate::sanitize::sanitize_str;

pub const METAFIELD_TYPE: &str = "single_line_text_field";

/// Profile values as submitted by the shopper.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub pet_type: Option<String>,
    pub stress_level: Option<String>,
    pub drug_usage: Option<String>,
    pub pet_age: Option<String>,
    pub pet_weight: Option<String>,
}

impl ProfileUpdate {
    fn raw(&self, field: ProfileField) -> Option<&str> {
        match field {
            ProfileField::PetType => self.pet_type.as_deref(),
            ProfileField::StressLevel => self.stress_level.as_deref(),
            ProfileField::DrugUsage => self.drug_usage.as_deref(),
            ProfileField::PetAge => self.pet_age.as_deref(),
            ProfileField::PetWeight => self.pet_weight.as_deref(),
        }
    }

    /// Sanitized copy of the submitted values.
    pub fn sanitized(&self) -> Profile {
        let mut profile = Profile::default();
        for field in ProfileField::ALL {
            *profile.slot_mut(field) = sanitize_str(self.raw(field));
        }
        profile
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub customer_id: String,
    pub written: Vec<ProfileField>,
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("failed to submit profile: {0:#}")]
    Transport(#[from] anyhow::Error),
    #[error("{field}: {message}")]
    Rejected { field: String, message: String },
}

/// Owner id for the metafields; plain numeric ids become customer global ids.
pub fn customer_gid(customer_id: &str) -> String {
    let id = customer_id.trim();
    if id.starts_with("gid://") {
        id.to_string()
    } else {
        format!("gid://shopify/Customer/{}", id)
    }
}

/// Fields with a non-blank value, in checklist order.
pub fn fields_to_write(profile: &Profile) -> Vec<ProfileField> {
    ProfileField::ALL
        .into_iter()
        .filter(|f| !profile.get(*f).is_empty())
        .collect()
}

/// Variables for the `metafieldsSet` mutation. Blank values are left out since
/// the Admin API rejects empty metafield values.
pub fn build_metafields_set_variables(namespace: &str, customer_id: &str, profile: &Profile) -> Value {
    let owner_id = customer_gid(customer_id);
    let metafields: Vec<Value> = fields_to_write(profile)
        .into_iter()
        .map(|field| {
            json!({
                "ownerId": owner_id,
                "namespace": namespace,
                "key": field.key(),
                "type": METAFIELD_TYPE,
                "value": profile.get(field),
            })
        })
        .collect();
    json!({ "metafields": metafields })
}
