use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod configuration;
mod error;
mod session;

use commands::run::RunOptions;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Work on a goal until it is done or the step budget runs out
    Run {
        /// What the agent should achieve
        goal: String,

        /// Override the configured step budget
        #[arg(long)]
        max_steps: Option<usize>,

        /// Config file (defaults to ~/.config/manus/config.toml)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Write the conversation to this file as JSON lines
        #[arg(long, value_name = "FILE")]
        transcript: Option<PathBuf>,

        /// Continue the conversation stored in a transcript
        #[arg(long, value_name = "FILE")]
        resume: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            goal,
            max_steps,
            config,
            transcript,
            resume,
        } => {
            commands::run::execute(RunOptions {
                goal,
                max_steps,
                config,
                transcript,
                resume,
            })
            .await
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("manus=info,manus_cli=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::parse_from([
            "manus",
            "run",
            "summarize the news",
            "--max-steps",
            "3",
            "--transcript",
            "run.jsonl",
        ]);
        let Command::Run {
            goal,
            max_steps,
            config,
            transcript,
            resume,
        } = cli.command;
        assert_eq!(goal, "summarize the news");
        assert_eq!(max_steps, Some(3));
        assert!(config.is_none());
        assert_eq!(transcript, Some(PathBuf::from("run.jsonl")));
        assert!(resume.is_none());
    }
}
