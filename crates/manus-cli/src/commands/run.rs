use anyhow::{bail, Context, Result};
use cliclack::spinner;
use console::style;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use manus::agent::AgentRunner;
use manus::context::ConversationContext;
use manus::cycle::ToolCallCycle;
use manus::models::state::AgentState;
use manus::providers::openai::OpenAiProvider;
use manus::systems::TerminateSystem;
use manus::tool_executor::SystemToolExecutor;

use crate::configuration::Settings;
use crate::session::session_file::{persist_messages, read_messages};

pub struct RunOptions {
    pub goal: String,
    pub max_steps: Option<usize>,
    pub config: Option<PathBuf>,
    pub transcript: Option<PathBuf>,
    pub resume: Option<PathBuf>,
}

pub async fn execute(options: RunOptions) -> Result<()> {
    let settings =
        Settings::new(options.config.as_deref()).context("Failed to load configuration")?;

    let mut executor = SystemToolExecutor::new();
    if let Some(timeout) = settings.tools.timeout() {
        executor = executor.with_timeout(timeout);
    }
    executor.add_system(Box::new(TerminateSystem::new()))?;

    let mut config = settings.agent.into_config(&executor.system_info())?;
    if let Some(max_steps) = options.max_steps {
        config = config.with_max_steps(max_steps);
    }

    let provider = OpenAiProvider::new(settings.provider.into_config())?;
    let cycle = ToolCallCycle::new(Arc::new(provider), Arc::new(executor), &config);
    let mut agent = AgentRunner::new(config, cycle)?;

    if let Some(path) = &options.resume {
        let context = resume_context(path)?;
        tracing::info!(messages = context.len(), "resuming conversation");
        agent = agent.with_context(context);
    }

    let spin = spinner();
    spin.start(format!("{} is working on it", agent.name()));
    let result = agent.run(&options.goal).await;
    spin.stop("");
    let report = result?;

    println!("{}", report);

    if let Some(path) = &options.transcript {
        persist_messages(path, agent.context().messages())?;
        println!(
            "{}",
            style(format!("Transcript written to {}", path.display())).dim()
        );
    }

    match agent.state() {
        AgentState::Error => bail!("Run ended with an error after {} steps", agent.current_step()),
        state => {
            println!("{}", style(state).green().bold());
            Ok(())
        }
    }
}

/// Load a transcript to continue from. Every tool call in it must already have its result.
fn resume_context(path: &Path) -> Result<ConversationContext> {
    let context = ConversationContext::from(read_messages(path)?);
    let unanswered = context.unanswered_tool_calls();
    if !unanswered.is_empty() {
        bail!(
            "Transcript {} has tool calls without results: {}",
            path.display(),
            unanswered.join(", ")
        );
    }
    Ok(context)
}
