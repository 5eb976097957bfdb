use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Days, Utc};
use serde_json::Value;

use stocky_core::domain::restock::{DecisionStatus, RestockRequest};
use stocky_core::domain::sku::Sku;
use stocky_core::errors::{ApplicationError, DomainError};
use stocky_core::gate::RestockGate;
use stocky_core::pricing::PriceEngine;
use stocky_db::repositories::{CrossSellRepository, ForecastRepository, SalesHistoryRepository};

/// A capability callable by the dispatcher: single string in, short text
/// out, so selection stays generic across tools.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    async fn execute(&self, input: Value) -> Result<Value>;
}

/// The only coupling point between the reasoning collaborator and the
/// core operations. Iteration order is the catalog order shown to the
/// model, so it must be deterministic.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|tool| &**tool)
    }

    pub fn catalog(&self) -> String {
        self.tools
            .values()
            .map(|tool| format!("- {}: {}", tool.name(), tool.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

fn input_text(input: &Value) -> String {
    match input {
        Value::String(text) => text.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn app_error(error: impl Into<ApplicationError>) -> anyhow::Error {
    anyhow::Error::new(error.into())
}

/// Total forecast over the next seven days for every SKU.
pub struct ForecastSummaryTool {
    forecasts: Arc<dyn ForecastRepository>,
}

impl ForecastSummaryTool {
    pub fn new(forecasts: Arc<dyn ForecastRepository>) -> Self {
        Self { forecasts }
    }
}

#[async_trait]
impl Tool for ForecastSummaryTool {
    fn name(&self) -> &'static str {
        "forecast_summary"
    }

    fn description(&self) -> &'static str {
        "Get the total 7-day demand forecast across all SKUs (no input required)."
    }

    async fn execute(&self, _input: Value) -> Result<Value> {
        let totals = self.forecasts.totals_next_days(7, 10).await.map_err(app_error)?;
        if totals.is_empty() {
            return Ok(Value::String("No forecast data found for the next 7 days.".to_string()));
        }

        let lines: Vec<String> = totals
            .iter()
            .map(|total| {
                // Fractional forecasts render as whole units for humans.
                format!("SKU {}: {} units expected", total.sku, total.total_forecast.trunc() as i64)
            })
            .collect();
        Ok(Value::String(format!("7-day demand forecast:\n{}", lines.join("\n"))))
    }
}

/// Day-by-day forecast for one SKU.
pub struct ForecastLookupTool {
    forecasts: Arc<dyn ForecastRepository>,
}

impl ForecastLookupTool {
    pub fn new(forecasts: Arc<dyn ForecastRepository>) -> Self {
        Self { forecasts }
    }
}

#[async_trait]
impl Tool for ForecastLookupTool {
    fn name(&self) -> &'static str {
        "forecast_lookup"
    }

    fn description(&self) -> &'static str {
        "Get the next 7-day demand forecast for one SKU (input: SKU id)."
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let sku = Sku::parse(&input_text(&input)).map_err(app_error)?;
        let series = self.forecasts.series_for_sku(&sku, 7).await.map_err(app_error)?;
        if series.is_empty() {
            return Ok(Value::String(format!("No forecast available for {sku}.")));
        }

        let points: Vec<String> = series
            .iter()
            .map(|record| format!("{}: {}", record.date, record.predicted_demand.trunc() as i64))
            .collect();
        Ok(Value::String(format!("Forecast for {sku}: {}", points.join(" | "))))
    }
}

/// Restock submission through the approval gate.
pub struct RestockOrderTool {
    gate: Arc<RestockGate>,
}

impl RestockOrderTool {
    pub fn new(gate: Arc<RestockGate>) -> Self {
        Self { gate }
    }

    fn parse_payload(payload: &str) -> Result<(String, i64), ApplicationError> {
        let tokens: Vec<&str> = payload.split_whitespace().collect();
        let usage = || {
            ApplicationError::Domain(DomainError::InvalidRequest(
                "usage: restock <sku> <amount>".to_string(),
            ))
        };

        match tokens.as_slice() {
            [sku, amount] => {
                let amount = amount.parse::<i64>().map_err(|_| usage())?;
                Ok(((*sku).to_string(), amount))
            }
            _ => Err(usage()),
        }
    }
}

#[async_trait]
impl Tool for RestockOrderTool {
    fn name(&self) -> &'static str {
        "restock_order"
    }

    fn description(&self) -> &'static str {
        "Place a restock order, input `<sku> <amount>` (auto-executes at or below the approval threshold, otherwise queued for approval)."
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let (sku, amount) = Self::parse_payload(&input_text(&input)).map_err(app_error)?;
        let request = RestockRequest::parse(&sku, amount).map_err(app_error)?;
        let decision = self.gate.submit(request).await.map_err(app_error)?;

        let text = match decision.status {
            DecisionStatus::AutoApproved => {
                format!("Auto-approved restock for {}, quantity {}.", decision.sku, decision.amount)
            }
            DecisionStatus::PendingApproval => format!(
                "Restock for {} ({}) is pending approval (request {}).",
                decision.sku, decision.amount, decision.request_id.0
            ),
        };
        Ok(Value::String(text))
    }
}

/// Complementary SKU suggestions from the co-occurrence table.
pub struct CrossSellTool {
    pairs: Arc<dyn CrossSellRepository>,
    limit: u32,
}

impl CrossSellTool {
    pub fn new(pairs: Arc<dyn CrossSellRepository>, limit: u32) -> Self {
        Self { pairs, limit: limit.max(1) }
    }
}

#[async_trait]
impl Tool for CrossSellTool {
    fn name(&self) -> &'static str {
        "cross_sell"
    }

    fn description(&self) -> &'static str {
        "Suggest complementary SKUs for a SKU (input: SKU id)."
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let sku = Sku::parse(&input_text(&input)).map_err(app_error)?;
        let suggestions = self.pairs.top_for_sku(&sku, self.limit).await.map_err(app_error)?;
        if suggestions.is_empty() {
            return Ok(Value::String(format!("No cross-sell items found for {sku}.")));
        }

        let listed: Vec<String> = suggestions
            .iter()
            .map(|suggestion| format!("{} ({})", suggestion.sku, suggestion.pair_count))
            .collect();
        Ok(Value::String(format!("Cross-sell for {sku}: {}", listed.join(", "))))
    }
}

/// On-demand price recommendation from recent sales aggregates.
pub struct PriceCheckTool {
    sales: Arc<dyn SalesHistoryRepository>,
    engine: Arc<dyn PriceEngine>,
    window_days: u32,
}

impl PriceCheckTool {
    pub fn new(
        sales: Arc<dyn SalesHistoryRepository>,
        engine: Arc<dyn PriceEngine>,
        window_days: u32,
    ) -> Self {
        Self { sales, engine, window_days: window_days.max(1) }
    }
}

#[async_trait]
impl Tool for PriceCheckTool {
    fn name(&self) -> &'static str {
        "price_check"
    }

    fn description(&self) -> &'static str {
        "Recommend a price for a product from recent sales (input: product id)."
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let product_id = input_text(&input);
        if product_id.is_empty() {
            return Err(app_error(DomainError::InvalidRequest(
                "product id must not be empty".to_string(),
            )));
        }

        let cutoff = Utc::now().date_naive() - Days::new(u64::from(self.window_days));
        let aggregate = self
            .sales
            .aggregate_for_product(&product_id, cutoff)
            .await
            .map_err(app_error)?;

        let Some(aggregate) = aggregate else {
            return Ok(Value::String(format!(
                "No sales history for {product_id} in the last {} days.",
                self.window_days
            )));
        };

        let recommendation = self.engine.recommend(&aggregate, Utc::now());
        Ok(Value::String(format!(
            "Recommended price for {product_id}: {} (confidence {}). Reason: {}.",
            recommendation.recommended_price,
            recommendation.confidence_score,
            recommendation.reason
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::Value;

    use stocky_db::repositories::InMemoryForecastRepository;

    use super::{ForecastSummaryTool, Tool, ToolRegistry};

    #[tokio::test]
    async fn registry_catalog_lists_tools_in_name_order() {
        let forecasts = Arc::new(InMemoryForecastRepository::default());
        let mut registry = ToolRegistry::default();
        registry.register(super::ForecastLookupTool::new(forecasts.clone()));
        registry.register(ForecastSummaryTool::new(forecasts));

        let catalog = registry.catalog();
        let lookup_at = catalog.find("forecast_lookup").expect("lookup listed");
        let summary_at = catalog.find("forecast_summary").expect("summary listed");
        assert!(lookup_at < summary_at);
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn empty_forecast_table_is_reported_not_errored() {
        let tool = ForecastSummaryTool::new(Arc::new(InMemoryForecastRepository::default()));
        let output = tool.execute(Value::Null).await.expect("execute");
        assert_eq!(
            output,
            Value::String("No forecast data found for the next 7 days.".to_string())
        );
    }
}
