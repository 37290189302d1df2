//! Tether CLI: chat with a model that can call tools on remote MCP servers.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;
use tether_api::AnthropicBackend;
use tether_config::{CliOverrides, TetherConfig};
use tether_core::{AgentEvent, Orchestrator};
use tether_mcp::ToolRegistry;
use tether_types::{TetherError, preview};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "tether", version, about = "Chat with a model that can call MCP tools")]
struct Cli {
    /// Send a single prompt and print the answer (non-interactive)
    #[arg(short, long)]
    print: Option<String>,

    /// Model to use (overrides config and TETHER_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Maximum tokens per model response
    #[arg(long)]
    max_tokens: Option<u32>,

    /// API key (overrides config and ANTHROPIC_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Maximum model calls per exchange
    #[arg(long)]
    max_turns: Option<usize>,

    /// Connect to the configured tool servers, print their tools and exit
    #[arg(long)]
    list_tools: bool,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let config = TetherConfig::load(CliOverrides {
        api_key: cli.api_key,
        model: cli.model,
        max_tokens: cli.max_tokens,
        max_turns: cli.max_turns,
    })
    .context("Failed to load configuration")?;

    let registry = ToolRegistry::connect(&config.mcp)
        .await
        .context("Failed to connect to tool servers")?;
    tracing::debug!(
        groups = config.mcp.groups.len(),
        tools = registry.tool_count(),
        "Tool registry ready"
    );

    if cli.list_tools {
        print_tools(&registry, &config);
        return Ok(());
    }

    let orchestrator = create_orchestrator(&config, Arc::new(registry))?;

    if let Some(prompt) = cli.print {
        let answer = run_exchange(&orchestrator, &prompt).await?;
        println!("{answer}");
        return Ok(());
    }

    repl(&orchestrator, &config).await
}

fn create_orchestrator(config: &TetherConfig, registry: Arc<ToolRegistry>) -> Result<Orchestrator> {
    let backend = AnthropicBackend::with_timeout(
        &config.api_key,
        &config.api_base_url,
        &config.model,
        config.max_tokens,
        Duration::from_millis(config.api_timeout_ms),
    )
    .context("Failed to create model backend")?;

    let mut orchestrator = Orchestrator::new(Arc::new(backend), registry);
    orchestrator.set_max_turns(config.max_turns);
    if let Some(instruction) = &config.instruction {
        orchestrator.set_instruction(instruction.clone());
    }
    Ok(orchestrator)
}

/// Every input line is an independent exchange.
async fn repl(orchestrator: &Orchestrator, config: &TetherConfig) -> Result<()> {
    let stdin = io::stdin();

    eprintln!(
        "tether v{} (model: {}, tools: {})",
        env!("CARGO_PKG_VERSION"),
        config.model,
        orchestrator.registry().tool_count()
    );
    eprintln!("Type your message. Press Ctrl+C to cancel a reply, Ctrl+D to exit.\n");

    loop {
        eprint!("> ");
        io::stderr().flush()?;

        let mut input = String::new();
        let bytes_read = stdin.lock().read_line(&mut input)?;
        if bytes_read == 0 {
            eprintln!();
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "/quit" | "/exit" => break,
            "/help" => {
                print_help();
                continue;
            }
            "/tools" => {
                print_tools(orchestrator.registry(), config);
                continue;
            }
            _ => {}
        }

        match run_exchange(orchestrator, input).await {
            Ok(answer) => println!("{answer}\n"),
            Err(e) => match e.downcast_ref::<TetherError>() {
                Some(TetherError::Cancelled) => eprintln!("\n[cancelled]\n"),
                _ => eprintln!("\nError: {e:#}\n"),
            },
        }
    }

    Ok(())
}

/// Run one exchange, cancelling it on Ctrl+C.
async fn run_exchange(orchestrator: &Orchestrator, prompt: &str) -> Result<String> {
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let stderr = io::stderr();
    let result = orchestrator
        .invoke_with_events(prompt, cancel, |event| {
            let mut err = stderr.lock();
            match event {
                AgentEvent::ToolStart { name, input } => {
                    let _ = writeln!(err, "  [tool: {name} {}]", preview(&input, 120));
                }
                AgentEvent::ToolEnd {
                    name,
                    output,
                    is_error,
                } => {
                    let status = if is_error { "error" } else { "done" };
                    let _ = writeln!(err, "  [tool {name} {status}: {output}]");
                }
                AgentEvent::Done | AgentEvent::Cancelled => {}
            }
        })
        .await;

    watcher.abort();
    Ok(result?)
}

fn print_tools(registry: &ToolRegistry, config: &TetherConfig) {
    let catalogue = registry.catalogue();
    let mut tools = catalogue.iter();
    for (group, count) in registry.group_summary() {
        println!("{group} ({count} tools)");
        for tool in tools.by_ref().take(count) {
            let description = tool.description.lines().next().unwrap_or("");
            println!("  {:<24} {}", tool.name, preview(description, 80));
        }
    }
    if catalogue.is_empty() {
        println!(
            "No tools configured. Add [[mcp.groups]] to {}.",
            config.settings_path().display()
        );
    }
}

fn print_help() {
    eprintln!("Available commands:");
    eprintln!("  /help   Show this help");
    eprintln!("  /tools  List available tools");
    eprintln!("  /quit   Exit");
    eprintln!();
    eprintln!("Every message starts a fresh exchange; earlier replies are not remembered.");
}
