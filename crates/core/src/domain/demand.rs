use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::sku::Sku;

/// One day of observed picks for a SKU. Immutable historical fact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandObservation {
    pub date: NaiveDate,
    pub sku: Sku,
    pub picks: i64,
}

/// One projected day of demand for a SKU. The forecast table is fully
/// replaced on each refresh, so a record is only meaningful together with
/// the rest of its run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub date: NaiveDate,
    pub sku: Sku,
    pub predicted_demand: f64,
}
