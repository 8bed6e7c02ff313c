// 📜 Relation Tables - Fixed combinatorial vocabulary
// Unordered pairs and triples. The single authoritative copy; see DESIGN.md
// for the punishment table choice. Entry order fixes label order (午卯破).

use crate::symbols::{Branch, Element, Stem};
use Branch::*;

/// Branch pairs that combine (合) and the element each forms
pub const COMBINATION_PAIRS: [(Branch, Branch, Element); 5] = [
    (Zi, Chou, Element::Earth),
    (Mao, Xu, Element::Fire),
    (Chen, You, Element::Metal),
    (Wu, Wei, Element::Fire),
    (Mao, Hai, Element::Wood),
];

/// Branch pairs that clash (沖)
pub const CLASH_PAIRS: [(Branch, Branch); 4] = [(Zi, Wu), (Chou, Wei), (Mao, You), (Chen, Xu)];

/// Branch pairs that punish (刑)
pub const PUNISHMENT_PAIRS: [(Branch, Branch); 4] =
    [(Zi, Wei), (Chou, Wu), (Yin, Si), (Shen, Hai)];

/// Branch pairs that break (破)
pub const BREAKAGE_PAIRS: [(Branch, Branch); 4] =
    [(Zi, You), (Wu, Mao), (Chen, Chou), (Wei, Xu)];

/// Three-way group combinations (三合) and the element each forms
pub const GROUP_COMBINATIONS: [([Branch; 3], Element); 4] = [
    ([Shen, Zi, Chen], Element::Water),
    ([Hai, Mao, Wei], Element::Wood),
    ([Yin, Wu, Xu], Element::Fire),
    ([Si, You, Chou], Element::Metal),
];

/// The five canonical stem combinations and their resulting element
pub const STEM_COMBINATIONS: [(Stem, Stem, Element); 5] = [
    (Stem::Jia, Stem::Ji, Element::Earth),
    (Stem::Yi, Stem::Geng, Element::Metal),
    (Stem::Bing, Stem::Xin, Element::Water),
    (Stem::Ding, Stem::Ren, Element::Wood),
    (Stem::Wu, Stem::Gui, Element::Fire),
];

/// Wealth storage (財庫) and authority storage (官庫)
pub const WEALTH_STORAGE: Branch = Chen;
pub const AUTHORITY_STORAGE: Branch = Xu;

/// Table entry for {a, b} in table order, if any
pub fn find_pair<T: PartialEq + Copy>(table: &[(T, T)], a: T, b: T) -> Option<(T, T)> {
    table
        .iter()
        .copied()
        .find(|&(x, y)| (x == a && y == b) || (x == b && y == a))
}

pub fn pair_in<T: PartialEq + Copy>(table: &[(T, T)], a: T, b: T) -> bool {
    find_pair(table, a, b).is_some()
}

/// Combination entry for {a, b} in table order, with its element
pub fn find_combination(a: Branch, b: Branch) -> Option<(Branch, Branch, Element)> {
    COMBINATION_PAIRS
        .iter()
        .copied()
        .find(|&(x, y, _)| (x == a && y == b) || (x == b && y == a))
}

/// Stem combination entry for {a, b} in table order, with its element
pub fn find_stem_combination(a: Stem, b: Stem) -> Option<(Stem, Stem, Element)> {
    STEM_COMBINATIONS
        .iter()
        .copied()
        .find(|&(x, y, _)| (x == a && y == b) || (x == b && y == a))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_lookup_is_unordered() {
        assert!(pair_in(&CLASH_PAIRS, Zi, Wu));
        assert!(pair_in(&CLASH_PAIRS, Wu, Zi));
        assert_eq!(find_pair(&BREAKAGE_PAIRS, Mao, Wu), Some((Wu, Mao)));
        assert!(!pair_in(&CLASH_PAIRS, Zi, Chou));
    }

    #[test]
    fn test_combination_lookup() {
        assert_eq!(find_combination(Hai, Mao), Some((Mao, Hai, Element::Wood)));
        assert_eq!(
            find_stem_combination(Stem::Ren, Stem::Ding),
            Some((Stem::Ding, Stem::Ren, Element::Wood))
        );
        assert_eq!(find_stem_combination(Stem::Jia, Stem::Yi), None);
    }

    #[test]
    fn test_growth_branches_only_punish() {
        // 寅巳申亥 interact through the punishment table alone
        let growth = [Yin, Si, Shen, Hai];
        for (i, &a) in growth.iter().enumerate() {
            for &b in &growth[i + 1..] {
                assert!(find_combination(a, b).is_none());
                assert!(!pair_in(&CLASH_PAIRS, a, b));
                assert!(!pair_in(&BREAKAGE_PAIRS, a, b));
            }
        }
        assert!(pair_in(&PUNISHMENT_PAIRS, Yin, Si));
        assert!(pair_in(&PUNISHMENT_PAIRS, Shen, Hai));
        assert!(!pair_in(&PUNISHMENT_PAIRS, Yin, Shen));
    }
}
