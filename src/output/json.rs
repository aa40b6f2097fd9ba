// JSON export of a full report.

use std::path::Path;

use anyhow::{Context, Result};

use crate::pipeline::AnalyticsReport;

/// Pretty JSON. Field and element order is fixed, so the same report always
/// serializes to the same bytes.
pub fn to_json(report: &AnalyticsReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize report")
}

pub fn write_report(report: &AnalyticsReport, path: &Path) -> Result<()> {
    let json = to_json(report)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
