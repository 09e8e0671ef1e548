//! Profile completeness: per-record scores and the complete/incomplete tally.

use serde::{Deserialize, Serialize};

use crate::model::{ProfileField, Record};

/// Percentage (0..=100) of the five profile attributes that are filled in.
pub fn score(record: &Record) -> u8 {
    let total = ProfileField::ALL.len() as u32;
    let filled = ProfileField::ALL
        .iter()
        .filter(|field| !record.profile.get(**field).trim().is_empty())
        .count() as u32;
    // round half up
    ((filled * 200 + total) / (2 * total)) as u8
}

pub fn is_complete(record: &Record) -> bool {
    score(record) == 100
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletenessSummary {
    pub total: usize,
    pub complete: usize,
    pub incomplete: usize,
}

pub fn summarize(records: &[Record]) -> CompletenessSummary {
    let complete = records.iter().filter(|r| is_complete(r)).count();
    CompletenessSummary {
        total: records.len(),
        complete,
        incomplete: records.len() - complete,
    }
}
