//! Cross-sell ranking over co-occurrence pairs.
//!
//! A pair is undirected: a lookup for SKU X matches X in either slot and
//! suggests the other member. Ties on pair count break on the suggested
//! SKU's identifier so a snapshot always ranks the same way.

use crate::domain::crosssell::{CrossSellPair, CrossSellSuggestion};
use crate::domain::sku::Sku;

/// Ranks the complementary SKUs for `sku`, descending by co-occurrence
/// count, truncated to `limit`. Duplicate pairs for the same partner (e.g.
/// both slot orderings present in a snapshot) have their counts summed.
/// An empty result is valid "no cross-sell data", not an error.
pub fn rank_pairs(sku: &Sku, pairs: &[CrossSellPair], limit: usize) -> Vec<CrossSellSuggestion> {
    let mut counts: std::collections::BTreeMap<Sku, i64> = std::collections::BTreeMap::new();
    for pair in pairs {
        if let Some(other) = pair.other(sku) {
            *counts.entry(other.clone()).or_insert(0) += pair.pair_count;
        }
    }

    let mut suggestions: Vec<CrossSellSuggestion> = counts
        .into_iter()
        .map(|(sku, pair_count)| CrossSellSuggestion { sku, pair_count })
        .collect();
    suggestions.sort_by(|a, b| {
        b.pair_count.cmp(&a.pair_count).then_with(|| a.sku.cmp(&b.sku))
    });
    suggestions.truncate(limit);
    suggestions
}

#[cfg(test)]
mod tests {
    use super::rank_pairs;
    use crate::domain::crosssell::CrossSellPair;
    use crate::domain::sku::Sku;

    fn sku(value: &str) -> Sku {
        Sku(value.to_string())
    }

    fn pair(a: &str, b: &str, count: i64) -> CrossSellPair {
        CrossSellPair { sku_a: sku(a), sku_b: sku(b), pair_count: count }
    }

    #[test]
    fn ranks_by_count_with_stable_tie_break() {
        let pairs = vec![pair("A", "B", 10), pair("C", "A", 7), pair("A", "D", 7)];

        let first = rank_pairs(&sku("A"), &pairs, 3);
        let second = rank_pairs(&sku("A"), &pairs, 3);

        assert_eq!(first, second, "ranking must be stable across calls");
        assert_eq!(first[0].sku, sku("B"));
        assert_eq!(first[0].pair_count, 10);
        // C and D tie at 7; identifier order decides.
        assert_eq!(first[1].sku, sku("C"));
        assert_eq!(first[2].sku, sku("D"));
    }

    #[test]
    fn matches_either_slot() {
        let pairs = vec![pair("B", "A", 3)];
        let suggestions = rank_pairs(&sku("A"), &pairs, 3);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].sku, sku("B"));
    }

    #[test]
    fn truncates_to_the_requested_limit() {
        let pairs = vec![pair("A", "B", 5), pair("A", "C", 4), pair("A", "D", 3), pair("A", "E", 2)];
        let suggestions = rank_pairs(&sku("A"), &pairs, 3);
        assert_eq!(suggestions.len(), 3);
        assert_eq!(suggestions.last().expect("suggestions").sku, sku("D"));
    }

    #[test]
    fn unknown_sku_yields_empty_result() {
        let pairs = vec![pair("A", "B", 5)];
        assert!(rank_pairs(&sku("Z"), &pairs, 3).is_empty());
    }

    #[test]
    fn duplicate_slot_orderings_sum_their_counts() {
        let pairs = vec![pair("A", "B", 4), pair("B", "A", 3)];
        let suggestions = rank_pairs(&sku("A"), &pairs, 3);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].pair_count, 7);
    }
}
