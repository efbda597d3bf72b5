mod config;
use clap::{Parser, Subcommand};
use config::VoiceAgentConfig;
use contoso_core::audio::{BackgroundAudio, CommandCuePlayer};
use contoso_core::search::TavilyClient;
use contoso_core::session::{parse_tool_calls_from_chat, ToolCallRequest, ToolTurn};
use contoso_core::telemetry::{init_logging, DEFAULT_LOG_FILTER};
use contoso_core::tools::native::{WebSearchTool, WEB_SEARCH_TOOL_NAME};
use contoso_core::tools::ToolRegistry;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn, Instrument, Span};

#[derive(Parser, Debug)]
#[command(name = "voice_agent", version, about = "Contoso voice agent")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate configuration and print the session plan
    Check,
    /// Print the tool descriptors advertised to the model
    Tools,
    /// Run one web search tool turn with the thinking cue
    Search {
        query: String,
        /// Do not play the thinking cue
        #[arg(long)]
        no_cue: bool,
    },
    /// Execute the tool calls found in a saved Chat Completions response
    Replay {
        /// JSON file holding the model response
        path: PathBuf,
        /// Do not play the thinking cue
        #[arg(long)]
        no_cue: bool,
    },
}

#[tokio::main]
async fn main() -> contoso_core::Result<()> {
    // Credentials live in .env.local during development
    let _ = dotenvy::from_filename(".env.local");
    init_logging(DEFAULT_LOG_FILTER);

    let cli = Cli::parse();

    // Load configuration (defaults + env + optional TOML overlay)
    let cfg = VoiceAgentConfig::load()?;

    // Register tools explicitly; a missing search key stops startup here
    let registry = ToolRegistry::new();
    let search = TavilyClient::new(&cfg.search)?;
    registry.register(Arc::new(WebSearchTool::new(Arc::new(search), &cfg.search)));

    let plan = cfg.session_plan(&registry);
    let span = plan.log_span();

    match cli.command {
        Command::Check => {
            if let Err(e) = plan.validate() {
                error!(target: "voice_agent", error = %e, "Session configuration incomplete");
                return Err(e.into());
            }
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Command::Tools => {
            let tools: Vec<Value> = registry
                .descriptors()
                .iter()
                .map(|d| d.to_openai_function())
                .collect();
            println!("{}", serde_json::to_string_pretty(&tools)?);
        }
        Command::Search { query, no_cue } => {
            info!(target: "voice_agent", query = %query, "➡️  Running search turn");
            let call = ToolCallRequest {
                id: Some("call_cli".to_string()),
                name: WEB_SEARCH_TOOL_NAME.to_string(),
                arguments: json!({ "query": query }),
            };
            run_turn(&cfg, &registry, vec![call], no_cue, span).await?;
        }
        Command::Replay { path, no_cue } => {
            let raw = tokio::fs::read_to_string(&path).await?;
            let chat: Value = serde_json::from_str(&raw)?;
            let calls = parse_tool_calls_from_chat(&chat);
            if calls.is_empty() {
                warn!(target: "voice_agent", path = %path.display(), "No tool calls in model response");
                return Ok(());
            }
            info!(target: "voice_agent", count = calls.len(), "➡️  Replaying tool calls");
            run_turn(&cfg, &registry, calls, no_cue, span).await?;
        }
    }

    Ok(())
}

/// Run one tool turn, printing each outcome as a `tool` message
async fn run_turn(
    cfg: &VoiceAgentConfig,
    registry: &ToolRegistry,
    calls: Vec<ToolCallRequest>,
    no_cue: bool,
    span: Span,
) -> contoso_core::Result<()> {
    let mut turn = ToolTurn::new(registry.clone());
    if cfg.cue_player.enabled && !no_cue {
        let player = Arc::new(CommandCuePlayer::new(&cfg.cue_player));
        let audio = Arc::new(BackgroundAudio::new(player, cfg.background_audio.clone()));
        if let Err(e) = audio.start_ambient() {
            warn!(target: "voice_agent", error = %e, "Ambient sound unavailable");
        }
        turn = turn.with_background_audio(audio);
    }

    // Ctrl+C drops the turn, which also silences the cue
    tokio::select! {
        outcomes = turn.run(calls).instrument(span) => {
            for outcome in outcomes {
                if let Err(e) = &outcome.result {
                    error!(target: "voice_agent", tool = %outcome.name, error = %e, "Tool call failed");
                }
                println!("{}", serde_json::to_string_pretty(&outcome.to_tool_message())?);
            }
        }
        _ = signal::ctrl_c() => {
            info!(target: "voice_agent", "Shutting down...");
        }
    }

    Ok(())
}
