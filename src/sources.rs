//! `hips sources`: where each feed resolves to and whether it loads.

use anyhow::Result;
use std::time::Duration;

use crate::config::Config;
use crate::loader::{LoadReport, Loader, SourcePlan, SourceStatus};

pub async fn list_sources(config: &Config) -> Result<()> {
    let plan = SourcePlan::from_config(&config.sources)?;
    let loader = Loader::http(Duration::from_secs(config.sources.timeout_secs))?;
    let loaded = loader.load_all(&plan).await;

    for line in report_lines(&loaded.report) {
        println!("{}", line);
    }
    Ok(())
}

/// Table rows for a load report, header first.
pub fn report_lines(report: &LoadReport) -> Vec<String> {
    let mut lines = vec![format!("{:<12} {:<12} {:<8} DETAIL", "SOURCE", "STATUS", "ITEMS")];
    for (name, status) in [("published", &report.published), ("drafts", &report.drafts)] {
        let line = match status {
            SourceStatus::Loaded { location, count } => {
                format!("{:<12} {:<12} {:<8} {}", name, "OK", count, location)
            }
            SourceStatus::Unavailable { reason } => {
                format!("{:<12} {:<12} {:<8} {}", name, "UNAVAILABLE", "-", reason)
            }
        };
        lines.push(line);
    }
    lines
}
