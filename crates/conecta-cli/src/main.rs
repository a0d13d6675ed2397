//! Operator CLI for the Conecta AI dispatch core.

use anyhow::Context;
use clap::{Parser, Subcommand};

use conecta_ai::{AiOrchestrator, CallOverrides, ChatOptions, Message};

#[derive(Parser)]
#[command(name = "conecta", version, about = "Operator tooling for the Conecta AI dispatch core")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the provider fleet status
    Status,

    /// Enable or disable a provider
    Toggle {
        /// Provider name (groq, gemini, openai, claude)
        provider: String,

        /// "on" or "off"
        state: String,
    },

    /// Send one message through the dispatcher
    Chat {
        /// The message text
        message: String,

        /// Attempt this provider first
        #[arg(short, long)]
        provider: Option<String>,

        /// Override the provider's configured model
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Run one health probe pass over every enabled provider
    Probe,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let orchestrator =
        AiOrchestrator::from_env().context("no AI provider API keys found in environment")?;

    match cli.command {
        Commands::Status => {
            print_snapshot(&orchestrator)?;
        }
        Commands::Toggle { provider, state } => {
            let enabled = match state.as_str() {
                "on" => true,
                "off" => false,
                other => anyhow::bail!("expected 'on' or 'off', got '{other}'"),
            };
            orchestrator
                .registry()
                .set_enabled(&provider, enabled)
                .with_context(|| format!("toggling provider '{provider}'"))?;
            print_snapshot(&orchestrator)?;
        }
        Commands::Chat {
            message,
            provider,
            model,
        } => {
            let options = ChatOptions {
                preferred_provider: provider,
                overrides: model.map(|m| CallOverrides {
                    model: Some(m),
                    ..Default::default()
                }),
                ..Default::default()
            };
            match orchestrator.chat(&[Message::user(message)], &options).await {
                Ok(reply) => {
                    println!("{}", serde_json::to_string_pretty(&reply)?);
                }
                Err(err) => {
                    tracing::error!(error = %err, "dispatch failed");
                    anyhow::bail!("{}", err.user_message());
                }
            }
        }
        Commands::Probe => {
            conecta_ai::probe_all(orchestrator.registry()).await;
            print_snapshot(&orchestrator)?;
        }
    }

    Ok(())
}

fn print_snapshot(orchestrator: &AiOrchestrator) -> anyhow::Result<()> {
    let snapshot = orchestrator.registry().snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
