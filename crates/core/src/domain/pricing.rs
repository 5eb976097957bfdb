use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product identifier used by the pricing tables. The sales feed keys on
/// product ids rather than warehouse SKUs.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

/// Windowed averages over `sales_history` for one product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesAggregate {
    pub product_id: ProductId,
    pub avg_unit_price: Decimal,
    pub avg_units_sold: Decimal,
    pub avg_stock_level: Decimal,
    pub category: Option<String>,
}

/// One pricing-run output row. Appended per run; readers wanting the latest
/// recommendation per product must order by `last_updated`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecommendation {
    pub product_id: ProductId,
    pub recommended_price: Decimal,
    pub confidence_score: Decimal,
    pub last_updated: DateTime<Utc>,
    pub reason: String,
}
