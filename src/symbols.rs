// 🀄 Symbol Tables - Stems, branches, elements
// Closed enumerations with const lookup tables. Nothing here is mutable.

use crate::error::{ChartError, ChartResult};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ELEMENT & POLARITY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Wood,
    Fire,
    Earth,
    Metal,
    Water,
}

impl Element {
    pub const ALL: [Element; 5] = [
        Element::Wood,
        Element::Fire,
        Element::Earth,
        Element::Metal,
        Element::Water,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Element::Wood => "wood",
            Element::Fire => "fire",
            Element::Earth => "earth",
            Element::Metal => "metal",
            Element::Water => "water",
        }
    }

    /// The element this one feeds (wood → fire → earth → metal → water → wood)
    pub fn generates(&self) -> Element {
        match self {
            Element::Wood => Element::Fire,
            Element::Fire => Element::Earth,
            Element::Earth => Element::Metal,
            Element::Metal => Element::Water,
            Element::Water => Element::Wood,
        }
    }

    /// The element that feeds this one
    pub fn generated_by(&self) -> Element {
        match self {
            Element::Wood => Element::Water,
            Element::Fire => Element::Wood,
            Element::Earth => Element::Fire,
            Element::Metal => Element::Earth,
            Element::Water => Element::Metal,
        }
    }

    /// The element this one restrains (wood → earth → water → fire → metal → wood)
    pub fn controls(&self) -> Element {
        match self {
            Element::Wood => Element::Earth,
            Element::Earth => Element::Water,
            Element::Water => Element::Fire,
            Element::Fire => Element::Metal,
            Element::Metal => Element::Wood,
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Yang,
    Yin,
}

impl Polarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Polarity::Yang => "yang",
            Polarity::Yin => "yin",
        }
    }
}

// ============================================================================
// STEMS
// ============================================================================

/// One of the ten stems. Serialized as its character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Stem {
    Jia,
    Yi,
    Bing,
    Ding,
    Wu,
    Ji,
    Geng,
    Xin,
    Ren,
    Gui,
}

const STEM_CHARS: [char; 10] = ['甲', '乙', '丙', '丁', '戊', '己', '庚', '辛', '壬', '癸'];

impl Stem {
    pub const ALL: [Stem; 10] = [
        Stem::Jia,
        Stem::Yi,
        Stem::Bing,
        Stem::Ding,
        Stem::Wu,
        Stem::Ji,
        Stem::Geng,
        Stem::Xin,
        Stem::Ren,
        Stem::Gui,
    ];

    fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_char(&self) -> char {
        STEM_CHARS[self.index()]
    }

    /// Stems pair up per element: 甲乙 wood, 丙丁 fire, ...
    pub fn element(&self) -> Element {
        Element::ALL[self.index() / 2]
    }

    pub fn polarity(&self) -> Polarity {
        if self.index() % 2 == 0 {
            Polarity::Yang
        } else {
            Polarity::Yin
        }
    }

    pub fn from_char(c: char) -> Option<Stem> {
        STEM_CHARS
            .iter()
            .position(|&s| s == c)
            .map(|idx| Stem::ALL[idx])
    }

    /// Parse a single-symbol string; surrounding whitespace is ignored.
    pub fn parse(text: &str) -> ChartResult<Stem> {
        let trimmed = text.trim();
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Stem::from_char(c).ok_or_else(|| ChartError::InvalidStem {
                value: trimmed.to_string(),
            }),
            _ => Err(ChartError::InvalidStem {
                value: trimmed.to_string(),
            }),
        }
    }
}

impl fmt::Display for Stem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl TryFrom<String> for Stem {
    type Error = ChartError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Stem::parse(&value)
    }
}

impl From<Stem> for String {
    fn from(stem: Stem) -> String {
        stem.as_char().to_string()
    }
}

// ============================================================================
// BRANCHES
// ============================================================================

/// One of the twelve branches. Serialized as its character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Branch {
    Zi,
    Chou,
    Yin,
    Mao,
    Chen,
    Si,
    Wu,
    Wei,
    Shen,
    You,
    Xu,
    Hai,
}

const BRANCH_CHARS: [char; 12] = [
    '子', '丑', '寅', '卯', '辰', '巳', '午', '未', '申', '酉', '戌', '亥',
];

const BRANCH_ELEMENTS: [Element; 12] = [
    Element::Water, // 子
    Element::Earth, // 丑
    Element::Wood,  // 寅
    Element::Wood,  // 卯
    Element::Earth, // 辰
    Element::Fire,  // 巳
    Element::Fire,  // 午
    Element::Earth, // 未
    Element::Metal, // 申
    Element::Metal, // 酉
    Element::Earth, // 戌
    Element::Water, // 亥
];

/// Hidden stems per branch, primary stem first.
const HIDDEN_STEMS: [&[Stem]; 12] = [
    &[Stem::Gui],                       // 子
    &[Stem::Ji, Stem::Gui, Stem::Xin],  // 丑
    &[Stem::Jia, Stem::Bing, Stem::Wu], // 寅
    &[Stem::Yi],                        // 卯
    &[Stem::Wu, Stem::Yi, Stem::Gui],   // 辰
    &[Stem::Bing, Stem::Geng, Stem::Wu], // 巳
    &[Stem::Ding, Stem::Ji],            // 午
    &[Stem::Ji, Stem::Ding, Stem::Yi],  // 未
    &[Stem::Geng, Stem::Ren, Stem::Wu], // 申
    &[Stem::Xin],                       // 酉
    &[Stem::Wu, Stem::Xin, Stem::Ding], // 戌
    &[Stem::Ren, Stem::Jia],            // 亥
];

impl Branch {
    pub const ALL: [Branch; 12] = [
        Branch::Zi,
        Branch::Chou,
        Branch::Yin,
        Branch::Mao,
        Branch::Chen,
        Branch::Si,
        Branch::Wu,
        Branch::Wei,
        Branch::Shen,
        Branch::You,
        Branch::Xu,
        Branch::Hai,
    ];

    fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_char(&self) -> char {
        BRANCH_CHARS[self.index()]
    }

    pub fn element(&self) -> Element {
        BRANCH_ELEMENTS[self.index()]
    }

    pub fn polarity(&self) -> Polarity {
        if self.index() % 2 == 0 {
            Polarity::Yang
        } else {
            Polarity::Yin
        }
    }

    /// Concealed stems, primary first (1 to 3 entries)
    pub fn hidden_stems(&self) -> &'static [Stem] {
        HIDDEN_STEMS[self.index()]
    }

    pub fn primary_hidden_stem(&self) -> Stem {
        HIDDEN_STEMS[self.index()][0]
    }

    pub fn from_char(c: char) -> Option<Branch> {
        BRANCH_CHARS
            .iter()
            .position(|&b| b == c)
            .map(|idx| Branch::ALL[idx])
    }

    pub fn parse(text: &str) -> ChartResult<Branch> {
        let trimmed = text.trim();
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Branch::from_char(c).ok_or_else(|| ChartError::InvalidBranch {
                value: trimmed.to_string(),
            }),
            _ => Err(ChartError::InvalidBranch {
                value: trimmed.to_string(),
            }),
        }
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl TryFrom<String> for Branch {
    type Error = ChartError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Branch::parse(&value)
    }
}

impl From<Branch> for String {
    fn from(branch: Branch) -> String {
        branch.as_char().to_string()
    }
}

// ============================================================================
// SYMBOL (stem or branch)
// ============================================================================

/// Either kind of symbol; relations can join stems as well as branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Symbol {
    Stem(Stem),
    Branch(Branch),
}

impl Symbol {
    pub fn as_char(&self) -> char {
        match self {
            Symbol::Stem(s) => s.as_char(),
            Symbol::Branch(b) => b.as_char(),
        }
    }

    pub fn element(&self) -> Element {
        match self {
            Symbol::Stem(s) => s.element(),
            Symbol::Branch(b) => b.element(),
        }
    }

    pub fn as_branch(&self) -> Option<Branch> {
        match self {
            Symbol::Branch(b) => Some(*b),
            Symbol::Stem(_) => None,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl From<Stem> for Symbol {
    fn from(stem: Stem) -> Self {
        Symbol::Stem(stem)
    }
}

impl From<Branch> for Symbol {
    fn from(branch: Branch) -> Self {
        Symbol::Branch(branch)
    }
}

impl TryFrom<String> for Symbol {
    type Error = ChartError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if let Ok(stem) = Stem::parse(&value) {
            return Ok(Symbol::Stem(stem));
        }
        Branch::parse(&value)
            .map(Symbol::Branch)
            .map_err(|_| ChartError::InvalidBranch { value })
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> String {
        symbol.as_char().to_string()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stem_elements_and_polarity() {
        assert_eq!(Stem::Jia.element(), Element::Wood);
        assert_eq!(Stem::Ding.element(), Element::Fire);
        assert_eq!(Stem::Wu.element(), Element::Earth);
        assert_eq!(Stem::Xin.element(), Element::Metal);
        assert_eq!(Stem::Gui.element(), Element::Water);

        assert_eq!(Stem::Jia.polarity(), Polarity::Yang);
        assert_eq!(Stem::Yi.polarity(), Polarity::Yin);
        assert_eq!(Stem::Ren.polarity(), Polarity::Yang);
    }

    #[test]
    fn test_branch_tables() {
        assert_eq!(Branch::Zi.element(), Element::Water);
        assert_eq!(Branch::Wu.element(), Element::Fire);
        assert_eq!(Branch::Xu.element(), Element::Earth);
        assert_eq!(Branch::Hai.polarity(), Polarity::Yin);

        for branch in Branch::ALL {
            let hidden = branch.hidden_stems();
            assert!(!hidden.is_empty() && hidden.len() <= 3, "{} hidden stems", branch);
        }

        // Primary hidden stem shares the branch element
        for branch in Branch::ALL {
            assert_eq!(branch.primary_hidden_stem().element(), branch.element());
        }
    }

    #[test]
    fn test_parse_round_trip_chars() {
        for stem in Stem::ALL {
            assert_eq!(Stem::parse(&stem.to_string()).unwrap(), stem);
        }
        for branch in Branch::ALL {
            assert_eq!(Branch::parse(&branch.to_string()).unwrap(), branch);
        }
    }

    #[test]
    fn test_parse_rejects_unknown_symbols() {
        assert_eq!(
            Stem::parse("子"),
            Err(ChartError::InvalidStem {
                value: "子".to_string()
            })
        );
        assert!(Branch::parse("甲").is_err());
        assert!(Branch::parse("子丑").is_err());
        assert!(Stem::parse("").is_err());
    }

    #[test]
    fn test_element_cycles() {
        for element in Element::ALL {
            assert_eq!(element.generates().generated_by(), element);
        }
        assert_eq!(Element::Fire.generated_by(), Element::Wood);
        assert_eq!(Element::Water.controls(), Element::Fire);
    }

    #[test]
    fn test_symbol_serde_as_char() {
        let json = serde_json::to_string(&Symbol::Branch(Branch::Mao)).unwrap();
        assert_eq!(json, "\"卯\"");

        let symbol: Symbol = serde_json::from_str("\"辛\"").unwrap();
        assert_eq!(symbol, Symbol::Stem(Stem::Xin));

        assert!(serde_json::from_str::<Stem>("\"Q\"").is_err());
    }
}
