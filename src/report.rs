// 🧾 Analysis Report - One document per analysis call
// Identity (UUID) and content fingerprint are separate: the id is new every
// run, the fingerprint only changes when the analysis content does.

use crate::chart::{Chart, Pillar};
use crate::config::EngineConfig;
use crate::inference::{infer, InferenceResult};
use crate::summary::{summarize, StructuralSummary};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// UUID for this report
    pub id: String,

    pub generated_at: DateTime<Utc>,

    pub chart: Chart,

    /// Cycle labels exactly as supplied, including ones that are not pillars
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interim_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_label: Option<String>,

    pub summary: StructuralSummary,
    pub results: Vec<InferenceResult>,

    /// SHA-256 over chart, cycle labels, summary and results
    pub fingerprint: String,
}

impl AnalysisReport {
    /// Compute content fingerprint
    /// NOTE: identity is `id`; the fingerprint is for comparing analyses
    pub fn compute_fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        let content = serde_json::json!({
            "chart": self.chart,
            "interim": self.interim_label,
            "annual": self.annual_label,
            "summary": self.summary,
            "results": self.results,
        });
        hasher.update(content.to_string());
        format!("{:x}", hasher.finalize())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize analysis report")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse analysis report JSON")
    }
}

fn clean_label(label: Option<&str>) -> Option<String> {
    label
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Full pipeline: summarize, infer, wrap in a report
///
/// Cycle labels that parse as pillars are attached to the chart so their
/// branches reach relation detection; anything else stays an opaque label.
pub fn analyze(
    chart: &Chart,
    config: &EngineConfig,
    interim: Option<&str>,
    annual: Option<&str>,
) -> AnalysisReport {
    let interim_label = clean_label(interim);
    let annual_label = clean_label(annual);

    let mut chart = chart.clone();
    if let Some(pillar) = interim_label.as_deref().and_then(|l| Pillar::parse(l).ok()) {
        chart = chart.with_interim_cycle(pillar);
    }
    if let Some(pillar) = annual_label.as_deref().and_then(|l| Pillar::parse(l).ok()) {
        chart = chart.with_annual_cycle(pillar);
    }

    let summary = summarize(&chart, config);
    let results = infer(&summary, interim_label.as_deref(), annual_label.as_deref());

    let mut report = AnalysisReport {
        id: uuid::Uuid::new_v4().to_string(),
        generated_at: Utc::now(),
        chart,
        interim_label,
        annual_label,
        summary,
        results,
        fingerprint: String::new(),
    };
    report.fingerprint = report.compute_fingerprint();

    info!(
        report = %report.id,
        archetype = report.summary.archetype.as_str(),
        results = report.results.len(),
        "analysis complete"
    );
    report
}
