//! Dashboard data: one collection run, scored and aggregated, filtered by the
//! merchant's display settings.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::instrument;

use crate::aggregate::{aggregate, Aggregates};
use crate::collector::{collect, CollectorSettings, PageSource};
use crate::completeness::{is_complete, score, summarize, CompletenessSummary};
use crate::config::Dashboard;
use crate::model::{PaginationInfo, ProfileField, Record};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub order_count: u64,
    pub pet_type: String,
    pub stress_level: String,
    pub drug_usage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pet_age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pet_weight: Option<String>,
    pub score: u8,
    pub complete: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardReport {
    pub heading: String,
    pub rows: Vec<ReportRow>,
    pub summary: CompletenessSummary,
    pub charts: Aggregates,
    pub pagination_info: PaginationInfo,
    pub error: Option<String>,
}

/// Fields the merchant chose to display, in checklist order.
pub fn visible_fields(display: &Dashboard) -> Vec<ProfileField> {
    ProfileField::ALL
        .into_iter()
        .filter(|f| match f {
            ProfileField::PetAge => display.show_pet_age,
            ProfileField::PetWeight => display.show_pet_weight,
            _ => true,
        })
        .collect()
}

fn display_name(record: &Record) -> String {
    if !record.display_name.is_empty() {
        return record.display_name.clone();
    }
    format!("{} {}", record.first_name, record.last_name)
        .trim()
        .to_string()
}

pub fn row(record: &Record, display: &Dashboard) -> ReportRow {
    let p = &record.profile;
    ReportRow {
        id: record.id.clone(),
        name: display_name(record),
        email: record.email.clone(),
        order_count: record.order_count,
        pet_type: p.pet_type.clone(),
        stress_level: p.stress_level.clone(),
        drug_usage: p.drug_usage.clone(),
        pet_age: display.show_pet_age.then(|| p.pet_age.clone()),
        pet_weight: display.show_pet_weight.then(|| p.pet_weight.clone()),
        score: score(record),
        complete: is_complete(record),
    }
}

/// Run one collection and shape it for the dashboard. Never fails: a
/// collection error is carried in [`DashboardReport::error`].
#[instrument(skip_all)]
pub async fn build_report<S>(
    source: &S,
    settings: &CollectorSettings,
    display: &Dashboard,
) -> DashboardReport
where
    S: PageSource + ?Sized,
{
    let result = collect(source, settings).await;
    let visible = visible_fields(display);

    let mut charts = aggregate(&result.records);
    charts.retain(|field, _| visible.contains(field));

    DashboardReport {
        heading: display.heading.clone(),
        rows: result.records.iter().map(|r| row(r, display)).collect(),
        summary: summarize(&result.records),
        charts,
        pagination_info: result.pagination_info,
        error: result.error,
    }
}

/// Plain-text rendering for terminals.
impl fmt::Display for DashboardReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.heading)?;
        if let Some(err) = &self.error {
            return writeln!(f, "error: {}", err);
        }
        writeln!(
            f,
            "{} customers, {} complete, {} incomplete{}",
            self.summary.total,
            self.summary.complete,
            self.summary.incomplete,
            if self.pagination_info.has_more {
                " (more available)"
            } else {
                ""
            }
        )?;
        writeln!(f)?;

        for r in &self.rows {
            let mut cols = vec![
                r.id.clone(),
                r.name.clone(),
                r.email.clone(),
                r.pet_type.clone(),
                r.stress_level.clone(),
                r.drug_usage.clone(),
            ];
            cols.extend(r.pet_age.clone());
            cols.extend(r.pet_weight.clone());
            cols.push(format!("{}%", r.score));
            writeln!(f, "{}", cols.join(" | "))?;
        }

        for (field, counts) in &self.charts {
            writeln!(f)?;
            writeln!(f, "{}", field.label())?;
            for c in counts {
                writeln!(f, "  {:<20} {}", c.category, c.count)?;
            }
        }
        Ok(())
    }
}

pub fn render_text(report: &DashboardReport) -> String {
    report.to_string()
}
