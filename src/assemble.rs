//! Mapping of raw page entries into dashboard [`Record`]s.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::model::{Profile, ProfileField, Record};
use crate::sanitize::{sanitize, sanitize_str};

static GLOBAL_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^gid://[^/]+/[^/]+/([^/?#]+)(?:\?.*)?$").expect("valid gid regex"));

/// One entry of a remote page. Covers both the `customers` node shape and the
/// `customerSegmentMembers` node shape; every field may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawEntry {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub default_email_address: Option<RawEmailAddress>,
    pub verified_email: Option<bool>,
    pub number_of_orders: Option<Value>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    #[serde(rename = "pet_type")]
    pub pet_type: Option<RawMetafield>,
    #[serde(rename = "stress_level")]
    pub stress_level: Option<RawMetafield>,
    #[serde(rename = "drug_usage")]
    pub drug_usage: Option<RawMetafield>,
    #[serde(rename = "pet_age")]
    pub pet_age: Option<RawMetafield>,
    #[serde(rename = "pet_weight")]
    pub pet_weight: Option<RawMetafield>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawEmailAddress {
    pub email_address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawMetafield {
    pub value: Option<Value>,
}

impl RawEntry {
    /// Raw metafield value for `field`, `None` when the metafield or its value is absent.
    pub fn attribute(&self, field: ProfileField) -> Option<&Value> {
        let slot = match field {
            ProfileField::PetType => &self.pet_type,
            ProfileField::StressLevel => &self.stress_level,
            ProfileField::DrugUsage => &self.drug_usage,
            ProfileField::PetAge => &self.pet_age,
            ProfileField::PetWeight => &self.pet_weight,
        };
        slot.as_ref().and_then(|m| m.value.as_ref())
    }

    fn raw_email(&self) -> Option<&str> {
        self.email.as_deref().or_else(|| {
            self.default_email_address
                .as_ref()
                .and_then(|e| e.email_address.as_deref())
        })
    }
}

/// Strip a Shopify global id (`gid://shopify/Customer/123`) down to its suffix.
/// Identifiers that are not global ids are returned unchanged.
pub fn local_id(raw: &str) -> String {
    GLOBAL_ID
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| raw.to_string())
}

pub fn assemble(entry: &RawEntry) -> Record {
    let mut profile = Profile::default();
    for field in ProfileField::ALL {
        *profile.slot_mut(field) = sanitize(entry.attribute(field));
    }

    let record = Record {
        id: entry.id.as_deref().map(local_id).unwrap_or_default(),
        display_name: sanitize_str(entry.display_name.as_deref()),
        first_name: sanitize_str(entry.first_name.as_deref()),
        last_name: sanitize_str(entry.last_name.as_deref()),
        email: sanitize_str(entry.raw_email()),
        verified: entry.verified_email.unwrap_or(false),
        order_count: order_count(entry.number_of_orders.as_ref()),
        profile,
        created_at: parse_timestamp(entry.created_at.as_deref()),
        updated_at: parse_timestamp(entry.updated_at.as_deref()),
    };

    for violation in validate(entry) {
        warn!(id = %record.id, %violation, "malformed customer record");
    }
    record
}

/// Rule violations for one raw entry, in rule order. Empty means valid.
pub fn validate(entry: &RawEntry) -> Vec<String> {
    let mut violations = Vec::new();
    if entry.raw_email().map_or(true, |e| e.trim().is_empty()) {
        violations.push("missing email".to_string());
    }
    if entry.id.as_deref().map_or(true, |id| id.trim().is_empty()) {
        violations.push("missing id".to_string());
    }
    for field in ProfileField::ALL {
        match entry.attribute(field) {
            None | Some(Value::Null) | Some(Value::String(_)) => {}
            Some(other) => violations.push(format!(
                "{} must be a string, got {}",
                field.key(),
                json_type(other)
            )),
        }
    }
    violations
}

// Shopify serializes UnsignedInt64 as a string.
fn order_count(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|v| DateTime::parse_from_rfc3339(v.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
