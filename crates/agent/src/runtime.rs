use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use stocky_core::errors::ApplicationError;

use crate::directives::parse_directive;
use crate::llm::LlmClient;
use crate::tools::ToolRegistry;

/// The model's reply contract on the selection path.
#[derive(Debug, Deserialize)]
struct ToolSelection {
    tool: String,
    #[serde(default)]
    input: String,
}

pub struct AgentRuntime {
    registry: ToolRegistry,
    llm: Option<Arc<dyn LlmClient>>,
}

impl AgentRuntime {
    pub fn new(registry: ToolRegistry, llm: Option<Arc<dyn LlmClient>>) -> Self {
        Self { registry, llm }
    }

    /// Routes one free-text prompt to a capability and returns the textual
    /// response. Explicit directives resolve without the model; everything
    /// else goes through one selection round-trip. Failures come back as
    /// short messages, never stack traces.
    pub async fn handle_prompt(&self, prompt: &str, correlation_id: &str) -> String {
        let trimmed = prompt.trim();
        if trimmed.is_empty() {
            return self.capabilities_message("Tell me what you need.");
        }

        if let Some(matched) = parse_directive(trimmed) {
            info!(
                event_name = "agent.directive_matched",
                correlation_id,
                tool = matched.tool,
                "explicit directive resolved without model selection"
            );
            return self.execute(matched.tool, &matched.input, correlation_id).await;
        }

        let Some(llm) = &self.llm else {
            return self.capabilities_message(
                "I could not match that request to a warehouse capability.",
            );
        };

        let selection_prompt = format!(
            "You route warehouse questions to exactly one capability.\n\
             Capabilities:\n{}\n\
             Reply with JSON only: {{\"tool\": \"<name>\", \"input\": \"<argument string>\"}}\n\
             Request: {trimmed}",
            self.registry.catalog()
        );

        let reply = match llm.complete(&selection_prompt).await {
            Ok(reply) => reply,
            Err(error) => {
                warn!(
                    event_name = "agent.llm_unavailable",
                    correlation_id,
                    error = %error,
                    "capability selection failed, degrading to catalog help"
                );
                return self.capabilities_message(
                    "The reasoning service is unavailable right now; explicit commands still work.",
                );
            }
        };

        match extract_selection(&reply) {
            Some(selection) => {
                info!(
                    event_name = "agent.tool_selected",
                    correlation_id,
                    tool = %selection.tool,
                    "model selected a capability"
                );
                self.execute(&selection.tool, &selection.input, correlation_id).await
            }
            None => {
                warn!(
                    event_name = "agent.selection_unparseable",
                    correlation_id,
                    "model reply did not contain a tool selection"
                );
                self.capabilities_message("I could not determine which capability fits that request.")
            }
        }
    }

    async fn execute(&self, tool_name: &str, input: &str, correlation_id: &str) -> String {
        let Some(tool) = self.registry.get(tool_name) else {
            return self.capabilities_message(&format!("`{tool_name}` is not a known capability."));
        };

        match tool.execute(Value::String(input.to_string())).await {
            Ok(Value::String(text)) => text,
            Ok(other) => other.to_string(),
            Err(error) => render_error(error, correlation_id),
        }
    }

    fn capabilities_message(&self, lead: &str) -> String {
        format!("{lead}\nAvailable capabilities:\n{}", self.registry.catalog())
    }
}

/// Pulls the first JSON object out of a model reply; models occasionally
/// wrap the object in prose or code fences.
fn extract_selection(reply: &str) -> Option<ToolSelection> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<ToolSelection>(&reply[start..=end]).ok()
}

/// Invalid-request reasons are safe to echo; everything else collapses to
/// the short user message with the detail kept in logs.
fn render_error(error: anyhow::Error, correlation_id: &str) -> String {
    match error.downcast::<ApplicationError>() {
        Ok(ApplicationError::Domain(domain)) => domain.to_string(),
        Ok(application) => {
            warn!(
                event_name = "agent.tool_failed",
                correlation_id,
                error = %application,
                "capability execution failed"
            );
            application.into_interface(correlation_id).user_message().to_string()
        }
        Err(other) => {
            warn!(
                event_name = "agent.tool_failed",
                correlation_id,
                error = %other,
                "capability execution failed with untyped error"
            );
            "An unexpected internal error occurred.".to_string()
        }
    }
}
