pub mod audit;
pub mod config;
pub mod crosssell;
pub mod domain;
pub mod errors;
pub mod forecast;
pub mod gate;
pub mod pricing;
pub mod schema;

pub use audit::{
    AuditCategory, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink, TracingAuditSink,
};
pub use crosssell::rank_pairs;
pub use domain::crosssell::{CrossSellPair, CrossSellSuggestion};
pub use domain::demand::{DemandObservation, ForecastRecord};
pub use domain::pricing::{PriceRecommendation, ProductId, SalesAggregate};
pub use domain::restock::{
    ActionType, Decision, DecisionStatus, PendingAction, PendingStatus, RequestId, RestockRequest,
};
pub use domain::sku::Sku;
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use forecast::{refresh_forecasts, ForecastPoint, TrendModel};
pub use gate::{GatePolicy, PendingActionLedger, RestockGate};
pub use pricing::{DeterministicPriceEngine, PriceEngine, PriceInputs};
pub use schema::{resolve_column, FORECAST_VALUE_COLUMNS};
