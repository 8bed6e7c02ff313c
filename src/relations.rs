// 🔗 Relation Detector - Pairwise and three-way symbol interactions
// Scans branch positions against the fixed tables in `tables`.
//
// Labels follow table order, so swapping two input positions never changes
// the detected set; only the list order (ascending position) moves.

use crate::config::{EngineConfig, HiddenCombinationMode};
use crate::symbols::{Branch, Element, Stem, Symbol};
use crate::tables::{
    self, AUTHORITY_STORAGE, BREAKAGE_PAIRS, CLASH_PAIRS, GROUP_COMBINATIONS, PUNISHMENT_PAIRS,
    WEALTH_STORAGE,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

// ============================================================================
// RELATION KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationKind {
    Combination,
    /// Three-way combination, complete (3 members) or partial (2 members)
    GroupCombination,
    Clash,
    Punishment,
    Breakage,
    HiddenCombination,
    StorageOpened,
    /// Any kind this engine does not define; never matches an interpreter
    #[serde(other)]
    Unknown,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Combination => "combination",
            RelationKind::GroupCombination => "group-combination",
            RelationKind::Clash => "clash",
            RelationKind::Punishment => "punishment",
            RelationKind::Breakage => "breakage",
            RelationKind::HiddenCombination => "hidden-combination",
            RelationKind::StorageOpened => "storage-opened",
            RelationKind::Unknown => "unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        *self != RelationKind::Unknown
    }

    /// Clash and breakage damage the symbols they touch
    pub fn is_damaging(&self) -> bool {
        matches!(self, RelationKind::Clash | RelationKind::Breakage)
    }
}

// ============================================================================
// RELATION RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationRecord {
    /// One to three symbols, in table order
    pub members: Vec<Symbol>,

    pub kind: RelationKind,

    /// Display label such as "午卯破" or "亥卯半合"
    pub label: String,

    /// Element formed by a combination
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<Element>,
}

impl RelationRecord {
    fn pair(a: Symbol, b: Symbol, kind: RelationKind, suffix: &str) -> Self {
        RelationRecord {
            members: vec![a, b],
            kind,
            label: format!("{}{}{}", a, b, suffix),
            element: None,
        }
    }

    fn with_element(mut self, element: Element) -> Self {
        self.element = Some(element);
        self
    }

    pub fn symbol_a(&self) -> Symbol {
        self.members[0]
    }

    pub fn symbol_b(&self) -> Option<Symbol> {
        self.members.get(1).copied()
    }

    /// Three-member group combination
    pub fn is_complete(&self) -> bool {
        self.members.len() == 3
    }

    /// Labeled edges for graph rendering; single-symbol relations have none
    pub fn edges(&self) -> Vec<(Symbol, Symbol, String)> {
        self.members
            .windows(2)
            .map(|w| (w[0], w[1], self.label.clone()))
            .collect()
    }
}

// ============================================================================
// RELATION DETECTOR
// ============================================================================

pub struct RelationDetector {
    mode: HiddenCombinationMode,
}

impl RelationDetector {
    pub fn new(mode: HiddenCombinationMode) -> Self {
        RelationDetector { mode }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.hidden_combination_mode)
    }

    pub fn mode(&self) -> HiddenCombinationMode {
        self.mode
    }

    /// Detect branch relations among the given positions (4 core + up to 2 cycle)
    pub fn detect(&self, branches: &[Branch]) -> Vec<RelationRecord> {
        let mut out = RelationSet::default();
        if branches.len() < 2 {
            return out.into_vec();
        }

        for i in 0..branches.len() {
            for j in (i + 1)..branches.len() {
                let (a, b) = (branches[i], branches[j]);
                if a == b {
                    continue;
                }
                self.detect_pair(a, b, &mut out);
            }
        }

        detect_groups(branches, &mut out);
        detect_storage(branches, &mut out);

        let relations = out.into_vec();
        debug!(
            branches = branches.len(),
            relations = relations.len(),
            mode = ?self.mode,
            "branch relations detected"
        );
        relations
    }

    fn detect_pair(&self, a: Branch, b: Branch, out: &mut RelationSet) {
        if let Some((x, y, element)) = tables::find_combination(a, b) {
            out.push(
                RelationRecord::pair(x.into(), y.into(), RelationKind::Combination, "合")
                    .with_element(element),
            );
        }
        if let Some((x, y)) = tables::find_pair(&CLASH_PAIRS, a, b) {
            out.push(RelationRecord::pair(x.into(), y.into(), RelationKind::Clash, "沖"));
        }
        if let Some((x, y)) = tables::find_pair(&PUNISHMENT_PAIRS, a, b) {
            out.push(RelationRecord::pair(x.into(), y.into(), RelationKind::Punishment, "刑"));
        }
        if let Some((x, y)) = tables::find_pair(&BREAKAGE_PAIRS, a, b) {
            out.push(RelationRecord::pair(x.into(), y.into(), RelationKind::Breakage, "破"));
        }
        self.detect_hidden(a, b, out);
    }

    /// One record per hidden-stem pair that forms a stem combination
    fn detect_hidden(&self, a: Branch, b: Branch, out: &mut RelationSet) {
        let (x, y) = if a <= b { (a, b) } else { (b, a) };
        let (x_stems, y_stems) = match self.mode {
            HiddenCombinationMode::Strict => (&x.hidden_stems()[..1], &y.hidden_stems()[..1]),
            HiddenCombinationMode::Loose => (x.hidden_stems(), y.hidden_stems()),
        };

        for &sx in x_stems {
            for &sy in y_stems {
                if let Some((_, _, element)) = tables::find_stem_combination(sx, sy) {
                    out.push(RelationRecord {
                        members: vec![x.into(), y.into()],
                        kind: RelationKind::HiddenCombination,
                        label: format!("{}{}暗合({}{})", x, y, sx, sy),
                        element: Some(element),
                    });
                }
            }
        }
    }
}

impl Default for RelationDetector {
    fn default() -> Self {
        Self::new(HiddenCombinationMode::default())
    }
}

/// Group combinations: 3 members present is complete, 2 is partial
fn detect_groups(branches: &[Branch], out: &mut RelationSet) {
    for (members, element) in GROUP_COMBINATIONS {
        let present: Vec<Branch> = members
            .iter()
            .copied()
            .filter(|m| branches.contains(m))
            .collect();

        let suffix = match present.len() {
            3 => "三合",
            2 => "半合",
            _ => continue,
        };

        let label = present.iter().map(|b| b.as_char()).collect::<String>() + suffix;
        out.push(RelationRecord {
            members: present.into_iter().map(Symbol::from).collect(),
            kind: RelationKind::GroupCombination,
            label,
            element: Some(element),
        });
    }
}

/// A storage branch whose opposite is absent counts as opened
fn detect_storage(branches: &[Branch], out: &mut RelationSet) {
    let has_wealth = branches.contains(&WEALTH_STORAGE);
    let has_authority = branches.contains(&AUTHORITY_STORAGE);

    if has_wealth && !has_authority {
        out.push(RelationRecord {
            members: vec![WEALTH_STORAGE.into()],
            kind: RelationKind::StorageOpened,
            label: "財庫開".to_string(),
            element: None,
        });
    }
    if has_authority && !has_wealth {
        out.push(RelationRecord {
            members: vec![AUTHORITY_STORAGE.into()],
            kind: RelationKind::StorageOpened,
            label: "官庫開".to_string(),
            element: None,
        });
    }
}

/// Stem pairs among the chart stems that form one of the five combinations
pub fn detect_stem_combinations(stems: &[Stem]) -> Vec<RelationRecord> {
    let mut out = RelationSet::default();
    for i in 0..stems.len() {
        for j in (i + 1)..stems.len() {
            if let Some((x, y, element)) = tables::find_stem_combination(stems[i], stems[j]) {
                out.push(
                    RelationRecord::pair(x.into(), y.into(), RelationKind::Combination, "合")
                        .with_element(element),
                );
            }
        }
    }
    out.into_vec()
}

/// Convenience entry point over branches
pub fn detect_relations(branches: &[Branch], mode: HiddenCombinationMode) -> Vec<RelationRecord> {
    RelationDetector::new(mode).detect(branches)
}

/// Insertion-ordered list that drops repeated labels
#[derive(Default)]
struct RelationSet {
    seen: HashSet<String>,
    records: Vec<RelationRecord>,
}

impl RelationSet {
    fn push(&mut self, record: RelationRecord) {
        if self.seen.insert(record.label.clone()) {
            self.records.push(record);
        }
    }

    fn into_vec(self) -> Vec<RelationRecord> {
        self.records
    }
}

// ============================================================================
// TESTS
// ============================================================================
