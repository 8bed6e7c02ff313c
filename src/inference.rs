// 🔮 Explainable Inference - Fixed pipeline of domain interpreters
// marriage → career → wealth → health → cycle-note → general fallback
//
// Each interpreter appends at most one result, and every principle text
// restates the labels or archetype that licensed it.

use crate::archetype::Archetype;
use crate::chart::Pillar;
use crate::error::{ChartError, ChartResult};
use crate::summary::{Focus, StructuralSummary};
use crate::symbols::Branch;
use crate::tables::{self, CLASH_PAIRS};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

// ============================================================================
// RESULT TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Marriage,
    Career,
    Wealth,
    Health,
    Cycle,
    General,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Marriage => "marriage",
            Domain::Career => "career",
            Domain::Wealth => "wealth",
            Domain::Health => "health",
            Domain::Cycle => "cycle",
            Domain::General => "general",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What licensed a conclusion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum Evidence {
    Relations(Vec<String>),
    Archetype(String),
    Focus(Vec<String>),
    Cycles {
        interim: Option<String>,
        annual: Option<String>,
    },
}

impl Evidence {
    /// Text tokens the principle must mention
    pub fn tokens(&self) -> Vec<&str> {
        match self {
            Evidence::Relations(labels) | Evidence::Focus(labels) => {
                labels.iter().map(String::as_str).collect()
            }
            Evidence::Archetype(name) => vec![name.as_str()],
            Evidence::Cycles { interim, annual } => interim
                .iter()
                .chain(annual.iter())
                .map(String::as_str)
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceResult {
    pub category: Domain,
    pub conclusion: String,
    pub principle: String,
    pub evidence: Evidence,
}

impl InferenceResult {
    fn new(category: Domain, conclusion: &str, principle: String, evidence: Evidence) -> Self {
        InferenceResult {
            category,
            conclusion: conclusion.to_string(),
            principle,
            evidence,
        }
    }

    /// Principle restates at least one evidence token
    pub fn is_explained(&self) -> bool {
        self.evidence
            .tokens()
            .iter()
            .any(|token| self.principle.contains(token))
    }
}

// ============================================================================
// INTERPRETERS
// ============================================================================

type Interpreter = fn(&StructuralSummary) -> Option<InferenceResult>;

/// Substantive interpreters in firing order; the fallback only looks at these
const INTERPRETERS: [(&str, Interpreter); 4] = [
    ("marriage", interpret_marriage),
    ("career", interpret_career),
    ("wealth", interpret_wealth),
    ("health", interpret_health),
];

/// Labels of defined relations passing `keep`; unknown kinds are skipped
fn labels_where(summary: &StructuralSummary, keep: impl Fn(&str) -> bool) -> Vec<String> {
    summary
        .relations
        .iter()
        .filter(|r| r.kind.is_known())
        .map(|r| r.label.as_str())
        .filter(|label| keep(label))
        .map(str::to_string)
        .collect()
}

/// 破 or 合去 in the spouse palace
fn interpret_marriage(summary: &StructuralSummary) -> Option<InferenceResult> {
    let triggers = labels_where(summary, |l| l.contains('破') || l.contains("合去"));
    if triggers.is_empty() {
        return None;
    }

    // A combination alongside the breakage may bring a new bond in
    let mut cited = triggers.clone();
    cited.extend(labels_where(summary, |l| {
        l.contains('合') && !l.contains("合去") && !triggers.iter().any(|t| t == l)
    }));

    let principle = format!(
        "{} damages or dissolves the spouse palace, so the existing bond tends to break. \
         A combination flowing in afterwards can turn this into remarriage.",
        triggers.join(", ")
    );
    Some(InferenceResult::new(
        Domain::Marriage,
        "relationship rupture, remarriage possible",
        principle,
        Evidence::Relations(cited),
    ))
}

fn interpret_career(summary: &StructuralSummary) -> Option<InferenceResult> {
    let archetype = summary.archetype;
    if !matches!(
        archetype,
        Archetype::AuthoritySupportive | Archetype::OutputWealth
    ) {
        return None;
    }

    let principle = format!(
        "The {} ({}) structure lets the body feed its use: the seal supports authority \
         or output generates wealth, which backs social and professional achievement.",
        archetype.traditional_name(),
        archetype.as_str()
    );
    Some(InferenceResult::new(
        Domain::Career,
        "honour and office, or creative work",
        principle,
        Evidence::Archetype(archetype.as_str().to_string()),
    ))
}

fn interpret_wealth(summary: &StructuralSummary) -> Option<InferenceResult> {
    let labels = labels_where(summary, |l| l.contains('財'));
    let focus: Vec<String> = summary
        .focus
        .iter()
        .filter(|f| f.concerns_wealth())
        .map(|f| f.traditional_name().to_string())
        .collect();

    let evidence = if !labels.is_empty() {
        Evidence::Relations(labels)
    } else if !focus.is_empty() {
        Evidence::Focus(focus)
    } else {
        return None;
    };

    let principle = format!(
        "{} shows the wealth star active: an open wealth storage releases tangible gain \
         and wealth steering authority raises the ability to manage resources.",
        evidence.tokens().join(", ")
    );
    Some(InferenceResult::new(
        Domain::Wealth,
        "rising material fortune",
        principle,
        evidence,
    ))
}

fn interpret_health(summary: &StructuralSummary) -> Option<InferenceResult> {
    let focus = Focus::ProtectiveSymbolCompromised;
    if !summary.has_focus(focus) {
        return None;
    }

    let damaging = damaging_labels(summary);
    let struck_by = if damaging.is_empty() {
        String::new()
    } else {
        format!(" by {}", damaging.join(", "))
    };
    let principle = format!(
        "{} ({}): the seal that shields the day master is struck{}, so mental fatigue \
         and weak digestion or immunity are likely. Cycle clashes on top call for extra care.",
        focus.traditional_name(),
        focus.as_str(),
        struck_by
    );
    Some(InferenceResult::new(
        Domain::Health,
        "mental fatigue, weakened digestion",
        principle,
        Evidence::Focus(vec![focus.traditional_name().to_string()]),
    ))
}

/// Fires on any non-empty cycle label; parseable labels are checked against the day branch
fn interpret_cycles(
    summary: &StructuralSummary,
    interim: Option<&str>,
    annual: Option<&str>,
) -> Option<InferenceResult> {
    let present = |label: Option<&str>| {
        label
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let interim = present(interim);
    let annual = present(annual);
    if interim.is_none() && annual.is_none() {
        return None;
    }

    let mut principle = String::new();
    for (slot, label) in [("interim", &interim), ("annual", &annual)] {
        if let Some(label) = label {
            principle.push_str(&format!("The {} cycle {} is read as a supporting indicator.", slot, label));
            if let Some(contact) = summary
                .day_branch
                .and_then(|day| day_branch_contact(label, day))
            {
                principle.push_str(&format!(" It meets the spouse palace as {}.", contact));
            }
            principle.push(' ');
        }
    }
    principle.push_str("Re-check clashes and combinations to time the structural reading.");

    Some(InferenceResult::new(
        Domain::Cycle,
        "interim and annual cycle influence noted",
        principle,
        Evidence::Cycles { interim, annual },
    ))
}

/// Clash or combination label between a cycle pillar's branch and the day branch
fn day_branch_contact(label: &str, day: Branch) -> Option<String> {
    let branch = Pillar::parse(label).ok()?.branch;
    if let Some((x, y)) = tables::find_pair(&CLASH_PAIRS, branch, day) {
        return Some(format!("{}{}沖", x, y));
    }
    tables::find_combination(branch, day).map(|(x, y, _)| format!("{}{}合", x, y))
}

fn general_fallback(summary: &StructuralSummary) -> InferenceResult {
    let archetype = summary.archetype;
    let principle = format!(
        "No decisive combination, clash, punishment or breakage acts on the {} ({}) chart, \
         so the flow is judged calm.",
        archetype.traditional_name(),
        archetype.as_str()
    );
    InferenceResult::new(
        Domain::General,
        "stable flow",
        principle,
        Evidence::Archetype(archetype.as_str().to_string()),
    )
}

// ============================================================================
// ENGINE
// ============================================================================

/// Run every interpreter over a structural summary
pub fn infer(
    summary: &StructuralSummary,
    interim: Option<&str>,
    annual: Option<&str>,
) -> Vec<InferenceResult> {
    let mut results = Vec::new();

    for (name, interpreter) in INTERPRETERS {
        if let Some(result) = interpreter(summary) {
            debug!(interpreter = name, "interpreter fired");
            results.push(result);
        }
    }
    let substantive = results.len();

    if let Some(note) = interpret_cycles(summary, interim, annual) {
        results.push(note);
    }

    if substantive == 0 {
        results.push(general_fallback(summary));
    }

    results
}

/// Validate a serialized summary, then infer
pub fn infer_document(
    document: &serde_json::Value,
    interim: Option<&str>,
    annual: Option<&str>,
) -> ChartResult<Vec<InferenceResult>> {
    let summary: StructuralSummary =
        serde_json::from_value(document.clone()).map_err(|e| ChartError::MalformedSummary {
            message: e.to_string(),
        })?;
    Ok(infer(&summary, interim, annual))
}

/// Damaging relations (clash or breakage) in a summary
pub fn damaging_labels(summary: &StructuralSummary) -> Vec<&str> {
    summary
        .relations
        .iter()
        .filter(|r| r.kind.is_damaging())
        .map(|r| r.label.as_str())
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{Chart, Gender, PillarOrder};
    use crate::config::EngineConfig;
    use crate::summary::summarize;

    fn summary_of(stems: &str, branches: &str) -> StructuralSummary {
        let chart =
            Chart::parse_split(stems, branches, PillarOrder::TimeFirst, Gender::Female).unwrap();
        summarize(&chart, &EngineConfig::default())
    }

    fn empty_summary() -> StructuralSummary {
        StructuralSummary {
            relations: Vec::new(),
            archetype: Archetype::Balanced,
            focus: Vec::new(),
            day_branch: None,
        }
    }

    fn categories(results: &[InferenceResult]) -> Vec<Domain> {
        results.iter().map(|r| r.category).collect()
    }

    #[test]
    fn test_sample_chart_fires_marriage_without_fallback() {
        let summary = summary_of("丁 戊 辛 辛", "午 卯 亥 子");
        let results = infer(&summary, None, None);

        let marriage = results
            .iter()
            .find(|r| r.category == Domain::Marriage)
            .unwrap();
        assert!(marriage.principle.contains("午卯破"));
        match &marriage.evidence {
            Evidence::Relations(labels) => assert!(labels.contains(&"午卯破".to_string())),
            other => panic!("unexpected evidence: {:?}", other),
        }

        assert!(!categories(&results).contains(&Domain::General));
    }

    #[test]
    fn test_fixed_interpreter_order() {
        let summary = summary_of("丁 戊 辛 辛", "午 卯 亥 子");
        let results = infer(&summary, Some("甲午"), None);
        assert_eq!(
            categories(&results),
            vec![Domain::Marriage, Domain::Career, Domain::Health, Domain::Cycle]
        );
    }

    #[test]
    fn test_fallback_on_quiet_chart() {
        let results = infer(&summary_of("乙 乙 甲 甲", "寅 巳 申 亥"), None, None);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].category, Domain::General);
    }

    #[test]
    fn test_cycle_note_does_not_suppress_fallback() {
        let results = infer(&empty_summary(), Some("甲子"), Some(""));
        assert_eq!(categories(&results), vec![Domain::Cycle, Domain::General]);
        assert_eq!(
            results[0].evidence,
            Evidence::Cycles {
                interim: Some("甲子".to_string()),
                annual: None,
            }
        );
    }

    #[test]
    fn test_cycle_note_reads_day_branch() {
        let mut summary = empty_summary();
        summary.day_branch = Some(Branch::Mao);

        let results = infer(&summary, Some("乙酉"), Some("癸亥"));
        let note = &results[0];
        assert!(note.principle.contains("卯酉沖"));
        assert!(note.principle.contains("卯亥合"));

        // opaque labels are kept as-is without a contact note
        let results = infer(&summary, Some("big luck"), None);
        assert!(results[0].principle.contains("big luck"));
        assert!(!results[0].principle.contains("spouse palace"));
    }

    #[test]
    fn test_wealth_from_storage_and_focus() {
        let results = infer(&summary_of("庚 庚 庚 庚", "辰 申 申 申"), None, None);
        let wealth = results
            .iter()
            .find(|r| r.category == Domain::Wealth)
            .unwrap();
        assert_eq!(wealth.evidence, Evidence::Relations(vec!["財庫開".to_string()]));

        let mut summary = empty_summary();
        summary.focus.push(Focus::OutputGeneratesWealth);
        let results = infer(&summary, None, None);
        assert_eq!(
            results[0].evidence,
            Evidence::Focus(vec!["食神生財".to_string()])
        );
    }

    #[test]
    fn test_every_result_is_explained() {
        let charts = [
            ("丁 戊 辛 辛", "午 卯 亥 子"),
            ("庚 庚 庚 庚", "辰 申 申 申"),
            ("戊 丙 甲 甲", "申 寅 寅 寅"),
            ("丙 甲 乙 甲", "卯 寅 亥 寅"),
        ];
        for (stems, branches) in charts {
            let results = infer(&summary_of(stems, branches), Some("甲午"), Some("乙未"));
            for result in results.iter().filter(|r| r.category != Domain::General) {
                assert!(result.is_explained(), "unexplained: {:?}", result);
            }
        }
    }

    #[test]
    fn test_infer_document_validates_shape() {
        let summary = summary_of("丁 戊 辛 辛", "午 卯 亥 子");
        let document = serde_json::to_value(&summary).unwrap();
        assert_eq!(
            infer_document(&document, None, None).unwrap(),
            infer(&summary, None, None)
        );

        let missing = serde_json::json!({ "relations": [], "focus": [] });
        assert!(matches!(
            infer_document(&missing, None, None),
            Err(ChartError::MalformedSummary { .. })
        ));

        let wrong = serde_json::json!({ "relations": "午卯破", "archetype": "balanced", "focus": [] });
        assert!(infer_document(&wrong, None, None).is_err());
    }

    #[test]
    fn test_undefined_kinds_and_focus_are_ignored() {
        let document = serde_json::json!({
            "relations": [
                { "members": ["午", "卯"], "kind": "breakage", "label": "午卯破" },
                { "members": ["子", "未"], "kind": "harm", "label": "子未穿" },
                { "members": ["辰"], "kind": "vault", "label": "財破" }
            ],
            "archetype": "balanced",
            "focus": ["印護身", "mystery"]
        });

        let results = infer_document(&document, None, None).unwrap();
        assert_eq!(categories(&results), vec![Domain::Marriage]);
        assert_eq!(
            results[0].evidence,
            Evidence::Relations(vec!["午卯破".to_string()])
        );
        assert!(!results[0].principle.contains("子未穿"));
        assert!(!results[0].principle.contains("財破"));
    }

    #[test]
    fn test_only_unknown_entries_fall_back() {
        let document = serde_json::json!({
            "relations": [{ "members": ["子", "未"], "kind": "harm", "label": "子未穿" }],
            "archetype": "balanced",
            "focus": ["印護身"]
        });

        let results = infer_document(&document, None, None).unwrap();
        assert_eq!(categories(&results), vec![Domain::General]);
    }

    #[test]
    fn test_health_without_damaging_relations() {
        let mut summary = empty_summary();
        summary.focus.push(Focus::ProtectiveSymbolCompromised);

        let results = infer(&summary, None, None);
        let health = &results[0];
        assert_eq!(health.category, Domain::Health);
        assert!(health.principle.contains("印護身"));
        assert!(health.principle.contains("is struck, so"));
        assert!(!health.principle.contains("by ,"));
    }

    #[test]
    fn test_results_round_trip_through_json() {
        let results = infer(&summary_of("丁 戊 辛 辛", "午 卯 亥 子"), Some("甲午"), None);
        let json = serde_json::to_string(&results).unwrap();
        let back: Vec<InferenceResult> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, results);
    }

    #[test]
    fn test_damaging_labels() {
        let summary = summary_of("丁 戊 辛 辛", "午 卯 亥 子");
        assert_eq!(damaging_labels(&summary), vec!["午卯破", "子午沖"]);
    }
}
