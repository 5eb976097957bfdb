use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use stocky_agent::runtime::AgentRuntime;

#[derive(Clone)]
pub struct AskState {
    runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Deserialize)]
pub struct AskParams {
    #[serde(default)]
    prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct AskBody {
    #[serde(default)]
    prompt: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct AskResponse {
    pub response: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct AskError {
    pub error: String,
}

pub fn router(runtime: Arc<AgentRuntime>) -> Router {
    Router::new()
        .route("/ask", get(ask_get))
        .route("/ask", post(ask_post))
        .with_state(AskState { runtime })
}

pub async fn ask_get(
    State(state): State<AskState>,
    Query(params): Query<AskParams>,
) -> Result<Json<AskResponse>, (StatusCode, Json<AskError>)> {
    ask(&state, &params.prompt).await
}

pub async fn ask_post(
    State(state): State<AskState>,
    Json(body): Json<AskBody>,
) -> Result<Json<AskResponse>, (StatusCode, Json<AskError>)> {
    ask(&state, &body.prompt).await
}

async fn ask(
    state: &AskState,
    prompt: &str,
) -> Result<Json<AskResponse>, (StatusCode, Json<AskError>)> {
    if prompt.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(AskError { error: "prompt must not be empty".to_string() }),
        ));
    }

    let correlation_id = Uuid::new_v4().to_string();
    info!(
        event_name = "http.ask.received",
        correlation_id = %correlation_id,
        prompt_chars = prompt.len(),
        "ask request accepted"
    );

    let response = state.runtime.handle_prompt(prompt, &correlation_id).await;
    Ok(Json(AskResponse { response }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::Json;

    use stocky_core::audit::InMemoryAuditSink;
    use stocky_core::gate::{GatePolicy, RestockGate};
    use stocky_db::repositories::{InMemoryForecastRepository, InMemoryPendingActionLedger};

    use stocky_agent::runtime::AgentRuntime;
    use stocky_agent::tools::{ForecastSummaryTool, RestockOrderTool, ToolRegistry};

    use super::{ask_get, ask_post, AskBody, AskParams, AskState};

    fn state() -> AskState {
        let ledger = Arc::new(InMemoryPendingActionLedger::default());
        let gate = Arc::new(RestockGate::new(
            GatePolicy::new(100),
            ledger,
            Arc::new(InMemoryAuditSink::default()),
        ));

        let mut registry = ToolRegistry::default();
        registry.register(RestockOrderTool::new(gate));
        registry.register(ForecastSummaryTool::new(Arc::new(
            InMemoryForecastRepository::default(),
        )));

        AskState { runtime: Arc::new(AgentRuntime::new(registry, None)) }
    }

    #[tokio::test]
    async fn get_ask_answers_a_directive() {
        let response = ask_get(
            State(state()),
            Query(AskParams { prompt: "restock SKU1 40".to_string() }),
        )
        .await
        .expect("ask should succeed");

        assert!(response.0.response.contains("Auto-approved"));
    }

    #[tokio::test]
    async fn post_ask_answers_a_directive() {
        let response =
            ask_post(State(state()), Json(AskBody { prompt: "forecast".to_string() }))
                .await
                .expect("ask should succeed");

        assert!(response.0.response.contains("No forecast data"));
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected_with_bad_request() {
        let error = ask_get(State(state()), Query(AskParams { prompt: "   ".to_string() }))
            .await
            .expect_err("blank prompt should fail");

        assert_eq!(error.0, StatusCode::BAD_REQUEST);
        assert_eq!(error.1 .0.error, "prompt must not be empty");
    }
}
