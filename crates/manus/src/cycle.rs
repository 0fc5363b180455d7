use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::AgentConfig;
use crate::context::ConversationContext;
use crate::errors::{AgentError, AgentResult};
use crate::models::message::{AssistantMessage, Message};
use crate::providers::base::Provider;
use crate::systems::TERMINATE_TOOL_NAME;
use crate::tool_executor::ToolExecutor;

pub const NO_ACTION_SUMMARY: &str = "Thinking complete - no action needed";
pub const NO_TOOL_CALL: &str = "No tool call";

/// What the think phase decided. Holds the model response when it asked for tools.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Thought {
    pending: Option<AssistantMessage>,
}

impl Thought {
    /// Nothing left to execute this step
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn pending(response: AssistantMessage) -> Self {
        Self {
            pending: Some(response),
        }
    }

    pub fn needs_action(&self) -> bool {
        self.pending.is_some()
    }

    pub fn into_response(self) -> Option<AssistantMessage> {
        self.pending
    }
}

/// The outcome of one step
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub summary: String,
    /// Set once the model has asked to stop
    pub finished: bool,
}

impl Action {
    pub fn new<S: Into<String>>(summary: S) -> Self {
        Self {
            summary: summary.into(),
            finished: false,
        }
    }

    pub fn finished<S: Into<String>>(summary: S) -> Self {
        Self {
            summary: summary.into(),
            finished: true,
        }
    }
}

/// One think then act iteration over a conversation
#[async_trait]
pub trait Cycle: Send + Sync {
    /// Consult the model. Never fails: problems are recorded in the context instead.
    async fn think(&self, context: &mut ConversationContext) -> Thought;

    /// Carry out what the thought asked for
    async fn act(&self, thought: Thought, context: &mut ConversationContext)
        -> AgentResult<Action>;

    async fn step(&self, context: &mut ConversationContext) -> AgentResult<Action> {
        let thought = self.think(context).await;
        if !thought.needs_action() {
            return Ok(Action::new(NO_ACTION_SUMMARY));
        }
        self.act(thought, context).await
    }

    /// Called once after every accepted run
    async fn cleanup(&self) {}
}

/// A cycle where the model selects tools and an executor runs them
pub struct ToolCallCycle {
    provider: Arc<dyn Provider>,
    executor: Arc<dyn ToolExecutor>,
    system_prompt: String,
    next_step_prompt: String,
    terminal_tool: String,
}

impl ToolCallCycle {
    pub fn new(
        provider: Arc<dyn Provider>,
        executor: Arc<dyn ToolExecutor>,
        config: &AgentConfig,
    ) -> Self {
        Self {
            provider,
            executor,
            system_prompt: config.system_prompt.clone(),
            next_step_prompt: config.next_step_prompt.clone(),
            terminal_tool: TERMINATE_TOOL_NAME.to_string(),
        }
    }

    /// Use a different tool name as the signal that the task is over
    pub fn with_terminal_tool<S: Into<String>>(mut self, name: S) -> Self {
        self.terminal_tool = name.into();
        self
    }
}

#[async_trait]
impl Cycle for ToolCallCycle {
    async fn think(&self, context: &mut ConversationContext) -> Thought {
        if !self.next_step_prompt.trim().is_empty() {
            context.append(Message::user(&self.next_step_prompt));
        }

        let tools = self.executor.tools();
        let response = self
            .provider
            .complete(&self.system_prompt, context.messages(), &tools)
            .await
            .map_err(|e| AgentError::ModelInvocation(e.to_string()));

        match response {
            Ok((response, usage)) => {
                info!(text = %response.text, "model replied");
                debug!(
                    input_tokens = ?usage.input_tokens,
                    output_tokens = ?usage.output_tokens,
                    "usage"
                );

                if !response.has_tool_calls() {
                    context.append(response.into());
                    return Thought::idle();
                }

                let names: Vec<&str> = response
                    .tool_calls
                    .iter()
                    .map(|call| call.name.as_str())
                    .collect();
                info!(count = names.len(), tools = ?names, "model selected tools");
                for call in &response.tool_calls {
                    debug!(tool = %call.name, arguments = %call.arguments, "tool arguments");
                }
                Thought::pending(response)
            }
            Err(e) => {
                warn!(error = %e, "thinking failed");
                context.append(Message::assistant(format!(
                    "Error encountered while processing: {}",
                    e
                )));
                Thought::idle()
            }
        }
    }

    /// Run the pending tool calls and install the resulting history.
    ///
    /// A failed execution is returned as is and leaves the context untouched: no error
    /// message is added, and the pending tool call is dropped along with its results.
    /// A history that still holds unanswered tool calls is refused the same way.
    async fn act(
        &self,
        thought: Thought,
        context: &mut ConversationContext,
    ) -> AgentResult<Action> {
        let Some(pending) = thought.into_response() else {
            return Ok(Action::new(NO_TOOL_CALL));
        };

        let history = self.executor.execute(&pending, context).await?;
        let unanswered = ConversationContext::from(history.clone()).unanswered_tool_calls();
        if !unanswered.is_empty() {
            warn!(ids = ?unanswered, "executor left tool calls unanswered");
            return Err(AgentError::ToolExecution(format!(
                "unanswered tool calls: {}",
                unanswered.join(", ")
            )));
        }
        context.replace(history);

        // The results sit at the end of the history, in call order
        let messages = context.messages();
        let start = messages.len().saturating_sub(pending.tool_calls.len());
        let summary = messages[start..]
            .iter()
            .filter_map(Message::as_tool_result)
            .map(|result| {
                info!(tool = %result.tool_name, "tool completed");
                format!(
                    "{} completed its task! Result: {}",
                    result.tool_name, result.payload
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let finished = pending
            .tool_calls
            .iter()
            .any(|call| call.name == self.terminal_tool);

        Ok(if finished {
            Action::finished(summary)
        } else {
            Action::new(summary)
        })
    }
}
