use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::context::ConversationContext;
use crate::errors::{AgentError, AgentResult};
use crate::models::message::{AssistantMessage, Message};
use crate::models::tool::{Tool, ToolCallRequest};
use crate::systems::System;

/// Executes the tool calls of an assistant response and folds the results into the history.
///
/// Implementations return the complete updated history: the given context, then the
/// assistant message, then one tool result per call in call order. On failure nothing is
/// returned, so the caller's context never holds calls without their results.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Descriptors of every tool this executor can dispatch
    fn tools(&self) -> Vec<Tool>;

    async fn execute(
        &self,
        pending: &AssistantMessage,
        context: &ConversationContext,
    ) -> AgentResult<Vec<Message>>;
}

#[derive(Clone, Debug, Serialize)]
pub struct SystemInfo {
    pub name: String,
    pub description: String,
    pub instructions: String,
}

impl SystemInfo {
    fn new(name: &str, description: &str, instructions: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            instructions: instructions.to_string(),
        }
    }
}

/// A ToolExecutor backed by a registry of systems
#[derive(Default)]
pub struct SystemToolExecutor {
    systems: Vec<Box<dyn System>>,
    timeout: Option<Duration>,
}

impl SystemToolExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound every tool call. A call that runs longer degrades to a result saying so
    /// instead of failing the step.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Add a system to the registry. Tool names must be unique across systems.
    pub fn add_system(&mut self, system: Box<dyn System>) -> AgentResult<()> {
        for tool in system.tools() {
            if self.system_for_tool(&tool.name).is_some() {
                return Err(AgentError::InvalidConfig(format!(
                    "Duplicate tool name: {}",
                    tool.name
                )));
            }
        }
        self.systems.push(system);
        Ok(())
    }

    pub fn system_info(&self) -> Vec<SystemInfo> {
        self.systems
            .iter()
            .map(|system| {
                SystemInfo::new(system.name(), system.description(), system.instructions())
            })
            .collect()
    }

    fn system_for_tool(&self, tool_name: &str) -> Option<&dyn System> {
        self.systems
            .iter()
            .find(|system| system.tools().iter().any(|tool| tool.name == tool_name))
            .map(|v| &**v)
    }

    /// Resolve the system and arguments of a call without running it
    fn prepare<'a>(&'a self, call: &ToolCallRequest) -> AgentResult<(&'a dyn System, Value)> {
        let system = self
            .system_for_tool(&call.name)
            .ok_or_else(|| AgentError::ToolNotFound(call.name.clone()))?;
        let arguments = call.parse_arguments()?;
        Ok((system, arguments))
    }

    async fn dispatch(&self, system: &dyn System, call: &ToolCallRequest, arguments: Value) -> String {
        debug!(tool = %call.name, id = %call.id, "dispatching tool call");
        let future = system.call(&call.name, arguments);
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, future).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(tool = %call.name, seconds = limit.as_secs(), "tool call timed out");
                    return format!(
                        "Tool '{}' timed out after {}s; returning without a result",
                        call.name,
                        limit.as_secs()
                    );
                }
            },
            None => future.await,
        };

        match result {
            Ok(payload) => payload,
            // A tool error is shown as output so the model can interpret it
            Err(e) => {
                warn!(tool = %call.name, error = %e, "tool call returned an error");
                format!("Error: {}", e)
            }
        }
    }
}

#[async_trait]
impl ToolExecutor for SystemToolExecutor {
    fn tools(&self) -> Vec<Tool> {
        self.systems
            .iter()
            .flat_map(|system| system.tools().iter().cloned())
            .collect()
    }

    async fn execute(
        &self,
        pending: &AssistantMessage,
        context: &ConversationContext,
    ) -> AgentResult<Vec<Message>> {
        let prepared = pending
            .tool_calls
            .iter()
            .map(|call| self.prepare(call).map(|(system, args)| (call, system, args)))
            .collect::<AgentResult<Vec<_>>>()
            .map_err(|e| AgentError::ToolExecution(e.to_string()))?;

        // Dispatch in parallel but wait until all are finished
        let outputs = futures::future::join_all(
            prepared
                .into_iter()
                .map(|(call, system, args)| self.dispatch(system, call, args)),
        )
        .await;

        let mut history = context.snapshot();
        history.push(Message::Assistant(pending.clone()));
        for (call, payload) in pending.tool_calls.iter().zip(outputs) {
            history.push(Message::tool_result(&call.id, &call.name, payload));
        }
        Ok(history)
    }
}
