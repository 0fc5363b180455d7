use async_trait::async_trait;
use serde_json::{json, Value};

use super::System;
use crate::errors::{AgentError, AgentResult};
use crate::models::tool::Tool;

/// Name of the tool the model calls to end the run
pub const TERMINATE_TOOL_NAME: &str = "terminate";

/// Provides the `terminate` tool, the sanctioned way for the model to stop early
pub struct TerminateSystem {
    tools: Vec<Tool>,
}

impl Default for TerminateSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminateSystem {
    pub fn new() -> Self {
        Self {
            tools: vec![Tool::new(
                TERMINATE_TOOL_NAME,
                "Terminate the interaction when the request is met OR if the assistant \
                 cannot proceed further with the task. When you have finished all the \
                 tasks, call this tool to end the work.",
                json!({
                    "type": "object",
                    "properties": {
                        "reason": {
                            "type": "string",
                            "description": "A short summary of why the interaction ends"
                        }
                    }
                }),
            )],
        }
    }
}

#[async_trait]
impl System for TerminateSystem {
    fn name(&self) -> &str {
        "lifecycle"
    }

    fn description(&self) -> &str {
        "Controls the lifecycle of the current task"
    }

    fn instructions(&self) -> &str {
        "If you want to stop the interaction at any point, use the `terminate` tool."
    }

    fn tools(&self) -> &[Tool] {
        &self.tools
    }

    async fn call(&self, tool_name: &str, arguments: Value) -> AgentResult<String> {
        if tool_name != TERMINATE_TOOL_NAME {
            return Err(AgentError::ToolNotFound(tool_name.to_string()));
        }
        let reason = arguments
            .get("reason")
            .and_then(|v| v.as_str())
            .filter(|reason| !reason.trim().is_empty());
        Ok(match reason {
            Some(reason) => format!("The interaction has been completed: {}", reason),
            None => "The interaction has been completed".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_terminate_without_reason() {
        let system = TerminateSystem::new();
        let result = system.call("terminate", json!({})).await.unwrap();
        assert_eq!(result, "The interaction has been completed");
    }

    #[test]
    fn test_terminate_with_reason() -> AgentResult<()> {
        let system = TerminateSystem::new();
        let result = tokio_test::block_on(
            system.call("terminate", json!({"reason": "report written"})),
        )?;
        assert_eq!(result, "The interaction has been completed: report written");
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let system = TerminateSystem::new();
        let error = system.call("unknown", json!({})).await.unwrap_err();
        assert!(matches!(error, AgentError::ToolNotFound(_)));
    }

    #[test]
    fn test_exposes_single_tool() {
        let system = TerminateSystem::new();
        assert_eq!(system.tools().len(), 1);
        assert_eq!(system.tools()[0].name, TERMINATE_TOOL_NAME);
    }
}
