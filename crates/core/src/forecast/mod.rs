//! Per-SKU demand forecasting.
//!
//! Each SKU's daily pick history is aggregated and fit with a univariate
//! least-squares trend; projections carry a 95% interval derived from the
//! residual deviation. Only the point estimate is persisted. All arithmetic
//! is deterministic so a refresh is reproducible from the same history.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};

use crate::domain::demand::{DemandObservation, ForecastRecord};
use crate::domain::sku::Sku;

/// Two-sided z value for the 95% interval.
const Z_95: f64 = 1.96;

/// One projected day with its uncertainty band. The band is available to
/// callers but is not part of the persisted forecast record.
#[derive(Clone, Debug, PartialEq)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Least-squares linear trend over day offsets. Degenerate series (a single
/// observation, or all observations on one day) degrade to a flat
/// projection at the observed level.
#[derive(Clone, Debug, PartialEq)]
pub struct TrendModel {
    intercept: f64,
    slope: f64,
    sigma: f64,
    observations: usize,
    last_date: NaiveDate,
    last_offset: i64,
}

impl TrendModel {
    /// Fits the model over `(date, picks)` points. Points are aggregated per
    /// date before fitting; an empty series has no model.
    pub fn fit(series: &[(NaiveDate, i64)]) -> Option<Self> {
        if series.is_empty() {
            return None;
        }

        let mut by_date: BTreeMap<NaiveDate, i64> = BTreeMap::new();
        for (date, picks) in series {
            *by_date.entry(*date).or_insert(0) += picks;
        }

        let first_date = *by_date.keys().next().expect("non-empty series");
        let last_date = *by_date.keys().next_back().expect("non-empty series");
        let points: Vec<(f64, f64)> = by_date
            .iter()
            .map(|(date, picks)| {
                ((*date - first_date).num_days() as f64, *picks as f64)
            })
            .collect();

        let n = points.len() as f64;
        let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
        let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

        let var_x = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum::<f64>();
        let slope = if var_x == 0.0 {
            0.0
        } else {
            points.iter().map(|(x, y)| (x - mean_x) * (y - mean_y)).sum::<f64>() / var_x
        };
        let intercept = mean_y - slope * mean_x;

        let sse: f64 = points
            .iter()
            .map(|(x, y)| {
                let fitted = intercept + slope * x;
                (y - fitted).powi(2)
            })
            .sum();
        let sigma = if points.len() > 2 { (sse / (n - 2.0)).sqrt() } else { 0.0 };

        Some(Self {
            intercept,
            slope,
            sigma,
            observations: by_date.len(),
            last_date,
            last_offset: (last_date - first_date).num_days(),
        })
    }

    pub fn observations(&self) -> usize {
        self.observations
    }

    /// Projects `horizon_days` days past the last observed date. Demand
    /// cannot go negative, so both the point estimate and the band floor
    /// are clamped at zero.
    pub fn project(&self, horizon_days: u32) -> Vec<ForecastPoint> {
        (1..=i64::from(horizon_days))
            .filter_map(|step| {
                let date = self.last_date.checked_add_days(Days::new(step as u64))?;
                let raw = self.intercept + self.slope * (self.last_offset + step) as f64;
                let predicted = raw.max(0.0);
                let spread = Z_95 * self.sigma;
                Some(ForecastPoint {
                    date,
                    predicted,
                    lower: (raw - spread).max(0.0),
                    upper: predicted + spread,
                })
            })
            .collect()
    }
}

/// Produces the full forecast output for one refresh: every SKU present in
/// `history` gets `horizon_days` records starting the day after its last
/// observation. The caller must replace the entire forecast table with this
/// output; partial updates would mix forecast vintages.
///
/// Empty history yields an empty output, which is a valid "no forecasts"
/// outcome rather than an error.
pub fn refresh_forecasts(
    history: &[DemandObservation],
    horizon_days: u32,
) -> Vec<ForecastRecord> {
    let mut per_sku: BTreeMap<Sku, Vec<(NaiveDate, i64)>> = BTreeMap::new();
    for observation in history {
        per_sku
            .entry(observation.sku.clone())
            .or_default()
            .push((observation.date, observation.picks));
    }

    let mut records = Vec::new();
    for (sku, series) in per_sku {
        let Some(model) = TrendModel::fit(&series) else {
            continue;
        };
        for point in model.project(horizon_days) {
            records.push(ForecastRecord {
                date: point.date,
                sku: sku.clone(),
                predicted_demand: point.predicted,
            });
        }
    }
    records
}
