use serde::{Deserialize, Serialize};

use crate::domain::sku::Sku;

/// Undirected co-occurrence of two SKUs in transactions. Stored once per
/// pair with `sku_a < sku_b`; a lookup must match either slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossSellPair {
    pub sku_a: Sku,
    pub sku_b: Sku,
    pub pair_count: i64,
}

impl CrossSellPair {
    /// Builds a pair in canonical slot order.
    pub fn canonical(first: Sku, second: Sku, pair_count: i64) -> Self {
        if first <= second {
            Self { sku_a: first, sku_b: second, pair_count }
        } else {
            Self { sku_a: second, sku_b: first, pair_count }
        }
    }

    pub fn involves(&self, sku: &Sku) -> bool {
        &self.sku_a == sku || &self.sku_b == sku
    }

    /// The member that is not `sku`, if `sku` occupies either slot.
    pub fn other(&self, sku: &Sku) -> Option<&Sku> {
        if &self.sku_a == sku {
            Some(&self.sku_b)
        } else if &self.sku_b == sku {
            Some(&self.sku_a)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossSellSuggestion {
    pub sku: Sku,
    pub pair_count: i64,
}

#[cfg(test)]
mod tests {
    use super::CrossSellPair;
    use crate::domain::sku::Sku;

    #[test]
    fn canonical_orders_slots() {
        let pair = CrossSellPair::canonical(
            Sku("ZULU".to_string()),
            Sku("ALPHA".to_string()),
            4,
        );
        assert_eq!(pair.sku_a.as_str(), "ALPHA");
        assert_eq!(pair.sku_b.as_str(), "ZULU");
    }

    #[test]
    fn other_matches_either_slot() {
        let pair = CrossSellPair::canonical(Sku("A".to_string()), Sku("B".to_string()), 1);
        assert_eq!(pair.other(&Sku("A".to_string())).map(Sku::as_str), Some("B"));
        assert_eq!(pair.other(&Sku("B".to_string())).map(Sku::as_str), Some("A"));
        assert_eq!(pair.other(&Sku("C".to_string())), None);
    }
}
