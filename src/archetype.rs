// 🏗️ Archetype Classifier - Ordered decision list over the day master
// First matching predicate wins; `Balanced` is the fallback. No scoring.

use crate::chart::{Pillar, DAY};
use crate::relations::{RelationKind, RelationRecord};
use crate::symbols::Element;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// ============================================================================
// ARCHETYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Archetype {
    /// 官印相生格
    AuthoritySupportive,
    /// 食神生財格
    OutputWealth,
    /// 木火通明格
    WoodFireBrilliance,
    /// 財星護身格
    WealthGuarded,
    /// 平格
    Balanced,
}

impl Archetype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Archetype::AuthoritySupportive => "authority-supportive",
            Archetype::OutputWealth => "output-wealth",
            Archetype::WoodFireBrilliance => "wood-fire-brilliance",
            Archetype::WealthGuarded => "wealth-guarded",
            Archetype::Balanced => "balanced",
        }
    }

    /// Traditional name of the structure
    pub fn traditional_name(&self) -> &'static str {
        match self {
            Archetype::AuthoritySupportive => "官印相生格",
            Archetype::OutputWealth => "食神生財格",
            Archetype::WoodFireBrilliance => "木火通明格",
            Archetype::WealthGuarded => "財星護身格",
            Archetype::Balanced => "平格",
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// CLASSIFIER
// ============================================================================

/// Facts the predicates look at
struct Evidence<'a> {
    day_element: Element,
    /// Elements of the other three stems and of the other three branches' primary hidden stems
    support: HashSet<Element>,
    relations: &'a [RelationRecord],
}

impl Evidence<'_> {
    fn has(&self, element: Element) -> bool {
        self.support.contains(&element)
    }

    fn has_label(&self, label: &str) -> bool {
        self.relations.iter().any(|r| r.label == label)
    }

    fn has_wood_combination(&self) -> bool {
        self.relations.iter().any(|r| {
            matches!(
                r.kind,
                RelationKind::Combination | RelationKind::GroupCombination
            ) && r.element == Some(Element::Wood)
                && r.members.iter().all(|m| m.as_branch().is_some())
        })
    }
}

fn earth_with_metal_and_water(e: &Evidence) -> bool {
    e.day_element == Element::Earth && e.has(Element::Metal) && e.has(Element::Water)
}

fn fire_with_earth_and_metal(e: &Evidence) -> bool {
    e.day_element == Element::Fire && e.has(Element::Earth) && e.has(Element::Metal)
}

fn wood_combination_with_fire(e: &Evidence) -> bool {
    e.has_wood_combination() && e.has(Element::Fire)
}

fn metal_with_open_wealth_storage(e: &Evidence) -> bool {
    e.day_element == Element::Metal && e.has_label("財庫開")
}

type Predicate = fn(&Evidence) -> bool;

/// Decision list; order is the tie-break
const DECISION_LIST: [(Predicate, Archetype); 4] = [
    (earth_with_metal_and_water, Archetype::AuthoritySupportive),
    (fire_with_earth_and_metal, Archetype::OutputWealth),
    (wood_combination_with_fire, Archetype::WoodFireBrilliance),
    (metal_with_open_wealth_storage, Archetype::WealthGuarded),
];

/// Classify a chart's structure from its core pillars and detected relations
pub fn classify(pillars: &[Pillar; 4], relations: &[RelationRecord]) -> Archetype {
    let day_element = pillars[DAY].stem.element();
    let support: HashSet<Element> = pillars
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != DAY)
        .flat_map(|(_, p)| [p.stem.element(), p.branch.primary_hidden_stem().element()])
        .collect();

    let evidence = Evidence {
        day_element,
        support,
        relations,
    };

    DECISION_LIST
        .iter()
        .find(|(predicate, _)| predicate(&evidence))
        .map(|&(_, archetype)| archetype)
        .unwrap_or(Archetype::Balanced)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{Chart, Gender, PillarOrder};
    use crate::config::HiddenCombinationMode;
    use crate::relations::detect_relations;

    fn classify_chart(stems: &str, branches: &str) -> Archetype {
        let chart =
            Chart::parse_split(stems, branches, PillarOrder::TimeFirst, Gender::Female).unwrap();
        let relations = detect_relations(&chart.branches(), HiddenCombinationMode::Strict);
        classify(&chart.pillars, &relations)
    }

    #[test]
    fn test_authority_supportive() {
        // 戊 day master, metal from 辛, water from 亥/子
        assert_eq!(
            classify_chart("丁 戊 辛 辛", "午 卯 亥 子"),
            Archetype::AuthoritySupportive
        );
    }

    #[test]
    fn test_output_wealth() {
        // 丙 day master, earth from 戊, metal from 申
        assert_eq!(
            classify_chart("戊 丙 甲 甲", "申 寅 寅 寅"),
            Archetype::OutputWealth
        );
    }

    #[test]
    fn test_wood_fire_brilliance() {
        // 甲 day master with 卯亥合 and fire from 丙
        assert_eq!(
            classify_chart("丙 甲 乙 甲", "卯 寅 亥 寅"),
            Archetype::WoodFireBrilliance
        );
    }

    #[test]
    fn test_wealth_guarded() {
        // 庚 day master, 辰 without 戌 opens the wealth storage
        assert_eq!(
            classify_chart("庚 庚 庚 庚", "辰 申 申 申"),
            Archetype::WealthGuarded
        );
    }

    #[test]
    fn test_balanced_fallback() {
        assert_eq!(
            classify_chart("乙 乙 甲 甲", "寅 巳 申 亥"),
            Archetype::Balanced
        );
    }

    #[test]
    fn test_day_pillar_is_excluded_from_support() {
        // Water only in the day branch (子) does not count
        assert_eq!(
            classify_chart("庚 戊 戊 戊", "午 子 午 午"),
            Archetype::Balanced
        );
    }

    #[test]
    fn test_classify_is_deterministic() {
        let chart =
            Chart::parse_split("丁 戊 辛 辛", "午 卯 亥 子", PillarOrder::TimeFirst, Gender::Male)
                .unwrap();
        let relations = detect_relations(&chart.branches(), HiddenCombinationMode::Loose);
        let first = classify(&chart.pillars, &relations);
        let second = classify(&chart.pillars, &relations);
        assert_eq!(first, second);
    }

    #[test]
    fn test_archetype_serde_name() {
        let json = serde_json::to_string(&Archetype::AuthoritySupportive).unwrap();
        assert_eq!(json, "\"authority-supportive\"");
        assert_eq!(Archetype::OutputWealth.traditional_name(), "食神生財格");
    }
}
