// 🏛️ Chart Model - Four pillars plus optional cycle pillars
// Stored in time → day → month → year order regardless of input order.

use crate::error::{ChartError, ChartResult};
use crate::symbols::{Branch, Stem};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// PILLAR
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pillar {
    pub stem: Stem,
    pub branch: Branch,
}

impl Pillar {
    pub fn new(stem: Stem, branch: Branch) -> Self {
        Pillar { stem, branch }
    }

    /// Parse two-character pillar text such as "甲午"
    pub fn parse(text: &str) -> ChartResult<Pillar> {
        let trimmed = text.trim();
        let chars: Vec<char> = trimmed.chars().collect();
        if chars.len() != 2 {
            return Err(ChartError::MalformedPillar {
                value: trimmed.to_string(),
            });
        }

        let stem = Stem::from_char(chars[0]).ok_or_else(|| ChartError::InvalidStem {
            value: chars[0].to_string(),
        })?;
        let branch = Branch::from_char(chars[1]).ok_or_else(|| ChartError::InvalidBranch {
            value: chars[1].to_string(),
        })?;

        Ok(Pillar { stem, branch })
    }

    /// Stem and branch share an element (the pillar is rooted in itself)
    pub fn is_rooted(&self) -> bool {
        self.stem.element() == self.branch.element()
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.stem, self.branch)
    }
}

// ============================================================================
// GENDER & INPUT ORDER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// 乾
    Male,
    /// 坤
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    /// Accepts English, 乾/坤 and 남/여 tags, including forms like "坤(여)"
    pub fn parse(text: &str) -> ChartResult<Gender> {
        let lower = text.trim().to_lowercase();
        match lower.as_str() {
            "male" | "m" | "乾" | "남" | "乾(남)" => Ok(Gender::Male),
            "female" | "f" | "坤" | "여" | "坤(여)" => Ok(Gender::Female),
            _ => Err(ChartError::InvalidGender {
                value: text.trim().to_string(),
            }),
        }
    }
}

/// Order in which the caller lists the four pillars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PillarOrder {
    /// time, day, month, year
    #[default]
    TimeFirst,
    /// year, month, day, time
    YearFirst,
}

// ============================================================================
// CHART
// ============================================================================

pub const TIME: usize = 0;
pub const DAY: usize = 1;
pub const MONTH: usize = 2;
pub const YEAR: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chart {
    /// Core pillars in time, day, month, year order
    pub pillars: [Pillar; 4],

    pub gender: Gender,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interim_cycle: Option<Pillar>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_cycle: Option<Pillar>,
}

impl Chart {
    /// Build a chart from pillars listed in `order`
    pub fn new(pillars: [Pillar; 4], order: PillarOrder, gender: Gender) -> Self {
        let mut pillars = pillars;
        if order == PillarOrder::YearFirst {
            pillars.reverse();
        }

        Chart {
            pillars,
            gender,
            interim_cycle: None,
            annual_cycle: None,
        }
    }

    /// Build from a slice; anything other than four pillars is rejected
    pub fn from_slice(pillars: &[Pillar], order: PillarOrder, gender: Gender) -> ChartResult<Self> {
        let array: [Pillar; 4] = pillars.try_into().map_err(|_| ChartError::PillarCount {
            what: "pillars",
            expected: 4,
            actual: pillars.len(),
        })?;
        Ok(Chart::new(array, order, gender))
    }

    /// Parse whitespace-separated stems and branches ("丁 戊 辛 辛", "午 卯 亥 子")
    pub fn parse_split(
        stems: &str,
        branches: &str,
        order: PillarOrder,
        gender: Gender,
    ) -> ChartResult<Self> {
        let stems: Vec<Stem> = stems
            .split_whitespace()
            .map(Stem::parse)
            .collect::<ChartResult<_>>()?;
        let branches: Vec<Branch> = branches
            .split_whitespace()
            .map(Branch::parse)
            .collect::<ChartResult<_>>()?;

        if stems.len() != 4 {
            return Err(ChartError::PillarCount {
                what: "stems",
                expected: 4,
                actual: stems.len(),
            });
        }
        if branches.len() != 4 {
            return Err(ChartError::PillarCount {
                what: "branches",
                expected: 4,
                actual: branches.len(),
            });
        }

        let pillars: Vec<Pillar> = stems
            .into_iter()
            .zip(branches)
            .map(|(stem, branch)| Pillar::new(stem, branch))
            .collect();
        Chart::from_slice(&pillars, order, gender)
    }

    /// Parse whitespace-separated pillar pairs ("丁午 戊卯 辛亥 辛子")
    pub fn parse_pillars(text: &str, order: PillarOrder, gender: Gender) -> ChartResult<Self> {
        let pillars: Vec<Pillar> = text
            .split_whitespace()
            .map(Pillar::parse)
            .collect::<ChartResult<_>>()?;
        Chart::from_slice(&pillars, order, gender)
    }

    /// Builder: attach the interim (decade) cycle pillar
    pub fn with_interim_cycle(mut self, pillar: Pillar) -> Self {
        self.interim_cycle = Some(pillar);
        self
    }

    /// Builder: attach the annual cycle pillar
    pub fn with_annual_cycle(mut self, pillar: Pillar) -> Self {
        self.annual_cycle = Some(pillar);
        self
    }

    pub fn time(&self) -> Pillar {
        self.pillars[TIME]
    }

    pub fn day(&self) -> Pillar {
        self.pillars[DAY]
    }

    pub fn month(&self) -> Pillar {
        self.pillars[MONTH]
    }

    pub fn year(&self) -> Pillar {
        self.pillars[YEAR]
    }

    pub fn day_master(&self) -> Stem {
        self.pillars[DAY].stem
    }

    pub fn stems(&self) -> [Stem; 4] {
        self.pillars.map(|p| p.stem)
    }

    pub fn branches(&self) -> [Branch; 4] {
        self.pillars.map(|p| p.branch)
    }

    /// Core branches followed by interim and annual cycle branches when present
    pub fn branches_with_cycles(&self) -> Vec<Branch> {
        let mut branches = self.branches().to_vec();
        branches.extend(self.interim_cycle.map(|p| p.branch));
        branches.extend(self.annual_cycle.map(|p| p.branch));
        branches
    }

    /// Pillar text in time, day, month, year order
    pub fn pillar_labels(&self) -> Vec<String> {
        self.pillars.iter().map(|p| p.to_string()).collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_chart() -> Chart {
        Chart::parse_split("丁 戊 辛 辛", "午 卯 亥 子", PillarOrder::TimeFirst, Gender::Female)
            .unwrap()
    }

    #[test]
    fn test_parse_split_positions() {
        let chart = sample_chart();

        assert_eq!(chart.time().to_string(), "丁午");
        assert_eq!(chart.day().to_string(), "戊卯");
        assert_eq!(chart.month().to_string(), "辛亥");
        assert_eq!(chart.year().to_string(), "辛子");
        assert_eq!(chart.day_master(), Stem::Wu);
    }

    #[test]
    fn test_year_first_is_normalized() {
        let year_first =
            Chart::parse_pillars("辛子 辛亥 戊卯 丁午", PillarOrder::YearFirst, Gender::Female)
                .unwrap();
        assert_eq!(year_first, sample_chart());
    }

    #[test]
    fn test_invalid_symbols_are_rejected() {
        let err = Chart::parse_split("丁 戊 辛 X", "午 卯 亥 子", PillarOrder::TimeFirst, Gender::Male)
            .unwrap_err();
        assert_eq!(
            err,
            ChartError::InvalidStem {
                value: "X".to_string()
            }
        );

        let err = Chart::parse_pillars("丁午 戊卯 辛亥 辛甲", PillarOrder::TimeFirst, Gender::Male)
            .unwrap_err();
        assert_eq!(
            err,
            ChartError::InvalidBranch {
                value: "甲".to_string()
            }
        );
    }

    #[test]
    fn test_wrong_pillar_count_is_rejected() {
        let err = Chart::parse_split("丁 戊 辛", "午 卯 亥", PillarOrder::TimeFirst, Gender::Male)
            .unwrap_err();
        assert!(matches!(
            err,
            ChartError::PillarCount {
                expected: 4,
                actual: 3,
                ..
            }
        ));

        let err = Chart::parse_pillars("丁午 戊卯 辛亥 辛子 甲午", PillarOrder::TimeFirst, Gender::Male)
            .unwrap_err();
        assert!(matches!(err, ChartError::PillarCount { actual: 5, .. }));
    }

    #[test]
    fn test_malformed_pillar() {
        assert!(matches!(
            Pillar::parse("甲"),
            Err(ChartError::MalformedPillar { .. })
        ));
        assert!(matches!(
            Pillar::parse("甲午午"),
            Err(ChartError::MalformedPillar { .. })
        ));
    }

    #[test]
    fn test_cycle_branches_appended() {
        let chart = sample_chart()
            .with_interim_cycle(Pillar::parse("甲午").unwrap())
            .with_annual_cycle(Pillar::parse("乙亥").unwrap());

        let branches = chart.branches_with_cycles();
        assert_eq!(branches.len(), 6);
        assert_eq!(branches[4], Branch::Wu);
        assert_eq!(branches[5], Branch::Hai);
    }

    #[test]
    fn test_gender_parse() {
        assert_eq!(Gender::parse("坤(여)").unwrap(), Gender::Female);
        assert_eq!(Gender::parse("乾").unwrap(), Gender::Male);
        assert_eq!(Gender::parse("Female").unwrap(), Gender::Female);
        assert!(Gender::parse("unknown").is_err());
    }

    #[test]
    fn test_rooted_pillar() {
        assert!(Pillar::parse("丁午").unwrap().is_rooted());
        assert!(!Pillar::parse("戊卯").unwrap().is_rooted());
    }

    #[test]
    fn test_chart_serde_round_trip() {
        let chart = sample_chart().with_annual_cycle(Pillar::parse("乙亥").unwrap());
        let json = serde_json::to_string(&chart).unwrap();
        let back: Chart = serde_json::from_str(&json).unwrap();
        assert_eq!(back, chart);
    }
}
