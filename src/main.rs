//! # FAQ Relay CLI (`faq-relay`)
//!
//! ## Usage
//!
//! ```bash
//! faq-relay --config ./config/relay.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `faq-relay run` | Build the index and answer questions in the target channel |
//! | `faq-relay ask "<question>"` | Answer one question from the terminal |
//! | `faq-relay passages` | Split the corpus and print the passages (no network) |
//!
//! ## Environment
//!
//! `BOT_TOKEN` (or `DISCORD_TOKEN`) is required by `run`; `OPENAI_API_KEY`
//! is required by the OpenAI backends. A `.env` file is loaded if present.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use faq_relay::{app, config, corpus, discord, logging};

/// FAQ Relay: answers questions in one Discord channel from a fixed
/// knowledge corpus.
#[derive(Parser)]
#[command(
    name = "faq-relay",
    about = "FAQ Relay: retrieval-augmented answers for a Discord channel",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/relay.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Discord and answer questions in the target channel.
    ///
    /// Loads and embeds the corpus first; the gateway connection is opened
    /// only once the index is ready.
    Run,

    /// Answer a single question and print the result.
    ///
    /// Runs the same retrieve, compose, and generate pipeline as `run`,
    /// without connecting to Discord.
    Ask {
        /// The question to answer.
        question: String,
    },

    /// Split the corpus and print the resulting passages.
    Passages {
        /// Print passages as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    logging::init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Run => {
            let token = config::bot_token()?;
            let relay = Arc::new(app::build_relay(&cfg).await?);
            info!(
                target_channel_id = cfg.discord.target_channel_id,
                "starting gateway client"
            );
            discord::run(relay, &token)
                .await
                .with_context(|| "Discord client stopped")?;
        }
        Commands::Ask { question } => {
            let relay = app::build_relay(&cfg).await?;
            let answer = relay.answer(&question).await?;
            println!("{}", answer);
        }
        Commands::Passages { json } => {
            let corpus = corpus::load_corpus(&cfg.corpus.path)?;
            let passages = corpus.passages(&cfg.corpus.split_options());
            if json {
                println!("{}", serde_json::to_string_pretty(&passages)?);
            } else {
                for (i, p) in passages.iter().enumerate() {
                    println!(
                        "── passage {} (offset {}, {} chars) ──",
                        i,
                        p.source_offset,
                        p.content.chars().count()
                    );
                    println!("{}\n", p.content);
                }
                println!("{} passages, corpus sha256 {}", passages.len(), corpus.fingerprint);
            }
        }
    }

    Ok(())
}
