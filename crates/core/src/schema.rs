//! Schema negotiation for the forecast table.
//!
//! The forecast value column has drifted across loader versions
//! (`predicted_demand` today, `yhat` from older runs). Rather than guessing
//! inside the query builder, lookups resolve the column against the actual
//! table schema first and fail loudly when nothing matches.

/// Candidate names for the forecast value column, in priority order.
pub const FORECAST_VALUE_COLUMNS: [&str; 5] =
    ["predicted_demand", "forecast", "yhat", "demand", "prediction"];

/// Picks the first candidate present in `available`, case-insensitively.
/// Returns `None` when no candidate matches; the caller decides how to
/// surface that (for lookups it is a schema-mismatch failure, never a
/// silent wrong-column read).
pub fn resolve_column<'a>(available: &[String], candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .find(|candidate| {
            available.iter().any(|column| column.eq_ignore_ascii_case(candidate))
        })
        .copied()
}
