// 🧭 Structural Summary - Relations + archetype + focus for one chart
// This is the shape the inference engine consumes.

use crate::archetype::{classify, Archetype};
use crate::chart::Chart;
use crate::config::EngineConfig;
use crate::relations::{detect_stem_combinations, RelationDetector, RelationRecord};
use crate::symbols::{Branch, Symbol};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

// ============================================================================
// FOCUS
// ============================================================================

/// Named emphasis derived from the relation set and archetype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Focus {
    /// 財統官
    WealthControlsAuthority,
    /// 印護身 under clash or breakage
    ProtectiveSymbolCompromised,
    /// 官印相生
    AuthoritySealFlow,
    /// 食神生財
    OutputGeneratesWealth,
    /// Any emphasis this engine does not define; never matches an interpreter
    #[serde(other)]
    Unknown,
}

impl Focus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Focus::WealthControlsAuthority => "wealth-controls-authority",
            Focus::ProtectiveSymbolCompromised => "protective-symbol-compromised",
            Focus::AuthoritySealFlow => "authority-seal-flow",
            Focus::OutputGeneratesWealth => "output-generates-wealth",
            Focus::Unknown => "unknown",
        }
    }

    pub fn traditional_name(&self) -> &'static str {
        match self {
            Focus::WealthControlsAuthority => "財統官",
            Focus::ProtectiveSymbolCompromised => "印護身",
            Focus::AuthoritySealFlow => "官印相生",
            Focus::OutputGeneratesWealth => "食神生財",
            Focus::Unknown => "",
        }
    }

    /// Emphases that speak about wealth (財)
    pub fn concerns_wealth(&self) -> bool {
        self.traditional_name().contains('財')
    }

    pub fn is_known(&self) -> bool {
        *self != Focus::Unknown
    }
}

impl fmt::Display for Focus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// STRUCTURAL SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralSummary {
    pub relations: Vec<RelationRecord>,
    pub archetype: Archetype,
    pub focus: Vec<Focus>,

    /// Spouse-palace branch, used to read cycle contacts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_branch: Option<Branch>,
}

impl StructuralSummary {
    pub fn relation_labels(&self) -> Vec<&str> {
        self.relations.iter().map(|r| r.label.as_str()).collect()
    }

    pub fn has_focus(&self, focus: Focus) -> bool {
        self.focus.contains(&focus)
    }

    /// (a, b, label) triples for graph rendering
    pub fn edges(&self) -> Vec<(Symbol, Symbol, String)> {
        self.relations.iter().flat_map(|r| r.edges()).collect()
    }
}

/// Build the structural summary of a chart
pub fn summarize(chart: &Chart, config: &EngineConfig) -> StructuralSummary {
    let detector = RelationDetector::from_config(config);

    let natal = detector.detect(&chart.branches());
    let has_cycles = chart.interim_cycle.is_some() || chart.annual_cycle.is_some();
    let mut relations = if config.include_cycle_branches && has_cycles {
        detector.detect(&chart.branches_with_cycles())
    } else {
        natal.clone()
    };
    relations.extend(detect_stem_combinations(&chart.stems()));

    // Archetype is a property of the natal chart alone
    let archetype = classify(&chart.pillars, &natal);
    let focus = derive_focus(chart, &relations, archetype);

    debug!(
        relations = relations.len(),
        archetype = archetype.as_str(),
        focus = focus.len(),
        "structural summary built"
    );

    StructuralSummary {
        relations,
        archetype,
        focus,
        day_branch: Some(chart.day().branch),
    }
}

fn derive_focus(chart: &Chart, relations: &[RelationRecord], archetype: Archetype) -> Vec<Focus> {
    let mut focus = Vec::new();

    if relations.iter().any(|r| r.label.contains('財')) {
        focus.push(Focus::WealthControlsAuthority);
    }

    // The seal element feeds the day master
    let seal = chart.day_master().element().generated_by();
    let seal_damaged = relations.iter().any(|r| {
        r.kind.is_damaging()
            && r.members
                .iter()
                .any(|m| m.as_branch().map(|b| b.element()) == Some(seal))
    });
    if seal_damaged {
        focus.push(Focus::ProtectiveSymbolCompromised);
    }

    match archetype {
        Archetype::AuthoritySupportive => focus.push(Focus::AuthoritySealFlow),
        Archetype::OutputWealth => focus.push(Focus::OutputGeneratesWealth),
        _ => {}
    }

    focus
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{Gender, Pillar, PillarOrder};

    fn chart(stems: &str, branches: &str) -> Chart {
        Chart::parse_split(stems, branches, PillarOrder::TimeFirst, Gender::Female).unwrap()
    }

    #[test]
    fn test_summary_of_sample_chart() {
        let summary = summarize(&chart("丁 戊 辛 辛", "午 卯 亥 子"), &EngineConfig::default());

        assert!(summary.relation_labels().contains(&"午卯破"));
        assert!(summary.relation_labels().contains(&"卯亥合"));
        assert_eq!(summary.archetype, Archetype::AuthoritySupportive);
        // 戊 is earth, fire (午) is its seal and 午 is both broken and clashed
        assert!(summary.has_focus(Focus::ProtectiveSymbolCompromised));
        assert!(summary.has_focus(Focus::AuthoritySealFlow));
        assert!(!summary.has_focus(Focus::WealthControlsAuthority));
        assert_eq!(summary.day_branch, Some(Branch::Mao));
    }

    #[test]
    fn test_wealth_focus_from_storage() {
        let summary = summarize(&chart("庚 庚 庚 庚", "辰 申 申 申"), &EngineConfig::default());
        assert!(summary.has_focus(Focus::WealthControlsAuthority));
        assert_eq!(summary.archetype, Archetype::WealthGuarded);
    }

    #[test]
    fn test_cycle_branches_feed_relations() {
        let base = chart("乙 乙 甲 甲", "寅 巳 申 亥");
        let with_cycle = base.clone().with_annual_cycle(Pillar::parse("甲子").unwrap());

        let config = EngineConfig::default();
        let summary = summarize(&with_cycle, &config);
        // 子 from the annual cycle joins 申 in a partial water group
        assert!(summary.relation_labels().contains(&"申子半合"));
        // natal archetype is unaffected by the cycle
        assert_eq!(summary.archetype, summarize(&base, &config).archetype);

        let no_cycles = EngineConfig {
            include_cycle_branches: false,
            ..EngineConfig::default()
        };
        let summary = summarize(&with_cycle, &no_cycles);
        assert!(!summary.relation_labels().contains(&"申子半合"));
    }

    #[test]
    fn test_stem_combinations_included() {
        let summary = summarize(&chart("丙 辛 甲 甲", "寅 巳 申 亥"), &EngineConfig::default());
        assert!(summary.relation_labels().contains(&"丙辛合"));
    }

    #[test]
    fn test_edges_skip_single_symbol_relations() {
        let summary = summarize(&chart("庚 庚 庚 庚", "辰 申 申 申"), &EngineConfig::default());
        assert!(summary.edges().iter().all(|(_, _, label)| label != "財庫開"));
    }

    #[test]
    fn test_focus_wealth_names() {
        assert!(Focus::WealthControlsAuthority.concerns_wealth());
        assert!(Focus::OutputGeneratesWealth.concerns_wealth());
        assert!(!Focus::AuthoritySealFlow.concerns_wealth());
    }

    #[test]
    fn test_undefined_focus_reads_as_unknown() {
        let focus: Vec<Focus> =
            serde_json::from_value(serde_json::json!(["印護身", "authority-seal-flow"])).unwrap();
        assert_eq!(focus, vec![Focus::Unknown, Focus::AuthoritySealFlow]);
        assert!(!Focus::Unknown.is_known());
        assert!(!Focus::Unknown.concerns_wealth());
    }
}
