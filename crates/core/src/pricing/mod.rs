//! Deterministic price recommendation.
//!
//! A pure scoring formula over windowed sales aggregates: demand pressure is
//! the sold/stock ratio mapped into [0.5, 1.5], and the price adjustment is
//! piecewise on that score. No state, no I/O.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::pricing::{PriceRecommendation, SalesAggregate};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PriceInputs {
    pub unit_price: Decimal,
    pub units_sold: Decimal,
    pub stock_level: Decimal,
}

/// Demand pressure score. Zero stock means everything sold through, which
/// pins the score at the 1.5 ceiling. Negative units (net returns) can pull
/// the score below neutral.
pub fn demand_score(units_sold: Decimal, stock_level: Decimal) -> Decimal {
    let ceiling = Decimal::new(15, 1);
    if stock_level.is_zero() {
        return ceiling;
    }
    let ratio = units_sold / stock_level;
    (Decimal::ONE + Decimal::new(5, 1) * ratio).clamp(Decimal::new(5, 1), ceiling)
}

/// Applies the piecewise adjustment for a demand score and rounds to cents.
pub fn adjust_price(unit_price: Decimal, score: Decimal) -> Decimal {
    let one = Decimal::ONE;
    let adjusted = if score > Decimal::new(12, 1) {
        unit_price * (one + Decimal::new(5, 2) * (score - one))
    } else if score < Decimal::new(8, 1) {
        unit_price * (one - Decimal::new(5, 2) * (one - score))
    } else {
        unit_price * (one + Decimal::new(2, 2) * (score - one))
    };
    adjusted.round_dp(2)
}

/// Confidence grows with distance from the neutral score of 1.0.
pub fn confidence(score: Decimal) -> Decimal {
    (Decimal::new(75, 2) + (score - Decimal::ONE).abs() * Decimal::new(25, 2)).round_dp(2)
}

/// Full recommendation for one input triple: `(price, confidence)`.
pub fn recommend_price(inputs: &PriceInputs) -> (Decimal, Decimal) {
    let score = demand_score(inputs.units_sold, inputs.stock_level);
    (adjust_price(inputs.unit_price, score), confidence(score))
}

pub trait PriceEngine: Send + Sync {
    fn recommend(&self, aggregate: &SalesAggregate, as_of: DateTime<Utc>) -> PriceRecommendation;
}

#[derive(Default)]
pub struct DeterministicPriceEngine;

impl PriceEngine for DeterministicPriceEngine {
    fn recommend(&self, aggregate: &SalesAggregate, as_of: DateTime<Utc>) -> PriceRecommendation {
        let score = demand_score(aggregate.avg_units_sold, aggregate.avg_stock_level);
        let recommended_price = adjust_price(aggregate.avg_unit_price, score);
        PriceRecommendation {
            product_id: aggregate.product_id.clone(),
            recommended_price,
            confidence_score: confidence(score),
            last_updated: as_of,
            reason: format!(
                "demand score {}, adjusted from {}",
                score.round_dp(2),
                aggregate.avg_unit_price.round_dp(2)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::{
        adjust_price, confidence, demand_score, recommend_price, DeterministicPriceEngine,
        PriceEngine, PriceInputs,
    };
    use crate::domain::pricing::{ProductId, SalesAggregate};

    fn dec(value: &str) -> Decimal {
        value.parse().expect("valid decimal literal")
    }

    fn inputs(unit_price: &str, units_sold: &str, stock_level: &str) -> PriceInputs {
        PriceInputs {
            unit_price: dec(unit_price),
            units_sold: dec(units_sold),
            stock_level: dec(stock_level),
        }
    }

    #[test]
    fn zero_stock_pins_score_and_takes_high_branch() {
        let (price, conf) = recommend_price(&inputs("100.00", "0", "0"));
        // Score 1.5: 100 * (1 + 0.05 * 0.5) = 102.5, confidence 0.875.
        assert_eq!(price, dec("102.50"));
        assert_eq!(conf, dec("0.88"));
    }

    #[test]
    fn mild_demand_takes_middle_branch() {
        let (price, conf) = recommend_price(&inputs("100.00", "10", "100"));
        // Ratio 0.1 gives score 1.05: 100 * (1 + 0.02 * 0.05) = 100.1.
        assert_eq!(price, dec("100.10"));
        assert_eq!(conf, dec("0.76"));
    }

    #[test]
    fn net_returns_take_the_markdown_branch() {
        let score = demand_score(dec("-60"), dec("100"));
        assert_eq!(score, dec("0.7"));

        let price = adjust_price(dec("100.00"), score);
        // 100 * (1 - 0.05 * 0.3) = 98.5
        assert_eq!(price, dec("98.50"));
        assert_eq!(confidence(score), dec("0.82"));
    }

    #[test]
    fn score_clamps_to_its_bounds() {
        assert_eq!(demand_score(dec("300"), dec("100")), dec("1.5"));
        assert_eq!(demand_score(dec("-400"), dec("100")), dec("0.5"));
    }

    #[test]
    fn neutral_score_leaves_price_unchanged() {
        let score = demand_score(dec("0"), dec("100"));
        assert_eq!(score, Decimal::ONE);
        assert_eq!(adjust_price(dec("79.99"), score), dec("79.99"));
        assert_eq!(confidence(score), dec("0.75"));
    }

    #[test]
    fn engine_builds_a_full_recommendation_row() {
        let aggregate = SalesAggregate {
            product_id: ProductId("P-100".to_string()),
            avg_unit_price: dec("100.00"),
            avg_units_sold: dec("10"),
            avg_stock_level: dec("100"),
            category: Some("tools".to_string()),
        };

        let now = Utc::now();
        let recommendation = DeterministicPriceEngine.recommend(&aggregate, now);

        assert_eq!(recommendation.product_id, ProductId("P-100".to_string()));
        assert_eq!(recommendation.recommended_price, dec("100.10"));
        assert_eq!(recommendation.confidence_score, dec("0.76"));
        assert_eq!(recommendation.last_updated, now);
        assert!(recommendation.reason.contains("1.05"));
        assert!(recommendation.reason.contains("100.00"));
    }
}
