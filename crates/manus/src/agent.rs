use std::fmt;
use tracing::{error, info, warn};

use crate::config::AgentConfig;
use crate::context::ConversationContext;
use crate::cycle::Cycle;
use crate::errors::{AgentError, AgentResult};
use crate::models::message::Message;
use crate::models::state::AgentState;

/// The narrative of one executed step
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    pub step_number: usize,
    pub narrative: String,
}

impl StepRecord {
    pub fn new<S: Into<String>>(step_number: usize, narrative: S) -> Self {
        Self {
            step_number,
            narrative: narrative.into(),
        }
    }
}

impl fmt::Display for StepRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step {}: {}", self.step_number, self.narrative)
    }
}

/// Drives a cycle step by step toward a goal, within a step budget
pub struct AgentRunner<C: Cycle> {
    config: AgentConfig,
    cycle: C,
    context: ConversationContext,
    state: AgentState,
    current_step: usize,
}

impl<C: Cycle> AgentRunner<C> {
    pub fn new(config: AgentConfig, cycle: C) -> AgentResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cycle,
            context: ConversationContext::new(),
            state: AgentState::Idle,
            current_step: 0,
        })
    }

    /// Continue from an earlier conversation instead of an empty one
    pub fn with_context(mut self, context: ConversationContext) -> Self {
        self.context = context;
        self
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn max_steps(&self) -> usize {
        self.config.max_steps
    }

    pub fn cycle(&self) -> &C {
        &self.cycle
    }

    /// Back to idle with an empty conversation
    pub fn reset(&mut self) {
        self.state = AgentState::Idle;
        self.context.clear();
        self.current_step = 0;
    }

    /// Work on the goal until the cycle reports completion, a step fails, or the step budget
    /// runs out.
    ///
    /// Returns one line per executed step, plus a closing line when the run was cut short.
    /// A failed step ends the run in [`AgentState::Error`] but is still reported through
    /// `Ok`; only calls that are refused before starting return `Err`.
    pub async fn run(&mut self, goal: &str) -> AgentResult<String> {
        if self.state != AgentState::Idle {
            return Err(AgentError::InvalidState(self.state));
        }
        if goal.trim().is_empty() {
            return Err(AgentError::InvalidInput("goal must not be empty".to_string()));
        }

        self.state = AgentState::Running;
        self.context.append(Message::user(goal));
        info!(agent = %self.config.name, max_steps = self.config.max_steps, "starting run");

        let max_steps = self.config.max_steps;
        let mut lines = Vec::new();
        let mut completed = false;

        for i in 0..max_steps {
            let step = i + 1;
            self.current_step = step;
            info!(step, max_steps, "executing step");

            match self.cycle.step(&mut self.context).await {
                Ok(action) => {
                    lines.push(StepRecord::new(step, action.summary).to_string());
                    if action.finished {
                        completed = true;
                        break;
                    }
                }
                Err(e) => {
                    error!(step, error = %e, "step failed");
                    lines.push(StepRecord::new(step, format!("Failed: {}", e)).to_string());
                    lines.push(format!("Terminated: {}", e));
                    self.state = AgentState::Error;
                    break;
                }
            }
        }

        if self.state == AgentState::Running {
            if !completed {
                warn!(max_steps, "step budget exhausted");
                lines.push(format!("Terminated: Reached max steps ({})", max_steps));
            }
            self.state = AgentState::Finished;
        }

        self.cycle.cleanup().await;
        info!(agent = %self.config.name, state = %self.state, "run ended");

        Ok(lines.join("\n"))
    }
}
