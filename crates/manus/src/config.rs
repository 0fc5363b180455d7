use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;

use crate::errors::{AgentError, AgentResult};
use crate::prompt_template::{
    load_prompt, load_prompt_file, NEXT_STEP_PROMPT_TEMPLATE, SYSTEM_PROMPT_TEMPLATE,
};
use crate::systems::TERMINATE_TOOL_NAME;
use crate::tool_executor::SystemInfo;

pub const DEFAULT_MAX_STEPS: usize = 10;
pub const MANUS_MAX_STEPS: usize = 20;

/// Run-scoped settings consumed by the agent loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default)]
    pub system_prompt: String,
    /// Guidance added as a user message before every think phase; empty disables it
    #[serde(default)]
    pub next_step_prompt: String,
}

fn default_max_steps() -> usize {
    DEFAULT_MAX_STEPS
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new("agent")
    }
}

impl AgentConfig {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            max_steps: DEFAULT_MAX_STEPS,
            system_prompt: String::new(),
            next_step_prompt: String::new(),
        }
    }

    /// The general purpose agent: built-in prompts describing the given systems and a
    /// larger step budget.
    pub fn manus(systems: &[SystemInfo]) -> AgentResult<Self> {
        let name = "manus";
        let system_prompt = load_prompt(
            SYSTEM_PROMPT_TEMPLATE,
            &json!({ "name": name, "systems": systems }),
        )
        .map_err(|e| AgentError::Internal(e.to_string()))?;
        let next_step_prompt = load_prompt(
            NEXT_STEP_PROMPT_TEMPLATE,
            &json!({ "terminate": TERMINATE_TOOL_NAME }),
        )
        .map_err(|e| AgentError::Internal(e.to_string()))?;

        Ok(Self {
            name: name.to_string(),
            max_steps: MANUS_MAX_STEPS,
            system_prompt,
            next_step_prompt,
        })
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_next_step_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.next_step_prompt = prompt.into();
        self
    }

    /// Use a template file as the system prompt. It sees the same `name` and `systems`
    /// as the built-in one.
    pub fn with_system_prompt_file(
        mut self,
        path: &Path,
        systems: &[SystemInfo],
    ) -> AgentResult<Self> {
        self.system_prompt = load_prompt_file(
            path,
            &json!({ "name": self.name, "systems": systems }),
        )
        .map_err(|e| AgentError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Ok(self)
    }

    pub fn validate(&self) -> AgentResult<()> {
        if self.max_steps == 0 {
            return Err(AgentError::InvalidConfig(
                "max_steps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
