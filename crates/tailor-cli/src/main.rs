use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tailor_core::budget::{default_config_path, prepare_context};
use tailor_core::{Message, StrategyKind, TailorConfig, TokenBudget};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "tailor")]
#[command(about = "Fit chat conversations into a model's context window")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.context-tailor/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true, default_value = "false")]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tailor a conversation and print the kept messages as JSON
    Trim {
        /// JSON file with a message array or {"messages": [...]}
        input: PathBuf,

        /// Model whose context window sets the budget
        #[arg(long, default_value = "default")]
        model: String,

        /// head_out, tail_out or middle_out (overrides config)
        #[arg(long)]
        strategy: Option<StrategyKind>,

        /// Explicit input token budget (skips the model lookup)
        #[arg(long)]
        budget: Option<u32>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Print per-message token estimates
    Count {
        input: PathBuf,
    },
    /// Print the context window and input budget for a model
    Window {
        model: String,
    },
}

/// Accepted input shapes.
#[derive(Deserialize)]
#[serde(untagged)]
enum Conversation {
    Messages(Vec<Message>),
    Wrapped { messages: Vec<Message> },
}

impl Conversation {
    fn into_messages(self) -> Vec<Message> {
        match self {
            Self::Messages(messages) | Self::Wrapped { messages } => messages,
        }
    }
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_line_number(debug),
        )
        .init();
}

fn read_conversation(path: &Path) -> Result<Vec<Message>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let conversation: Conversation = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a valid conversation", path.display()))?;
    Ok(conversation.into_messages())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = TailorConfig::load(&config_path)
        .await
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;

    match cli.command {
        Commands::Trim {
            input,
            model,
            strategy,
            budget,
            pretty,
        } => trim(&config, &input, &model, strategy, budget, pretty),
        Commands::Count { input } => count(&config, &input),
        Commands::Window { model } => window(&config, &model),
    }
}

fn trim(
    config: &TailorConfig,
    input: &Path,
    model: &str,
    strategy: Option<StrategyKind>,
    budget: Option<u32>,
    pretty: bool,
) -> Result<()> {
    let messages = read_conversation(input)?;
    let counter = config.build_counter();
    let strategy = strategy.unwrap_or(config.strategy).build(counter.clone());

    // An explicit budget is used as-is: no completion reserve or margin.
    let budget = match budget {
        Some(tokens) => TokenBudget::with_safety_margin(tokens, 0, 0),
        None => config.budget_for(&config.build_registry(), model),
    };

    tracing::debug!(
        "Tailoring {} messages with {} into {} tokens",
        messages.len(),
        strategy.name(),
        budget.available_input_tokens()
    );
    let prepared = prepare_context(&messages, &budget, strategy.as_ref(), counter.as_ref())?;

    let output = if pretty {
        serde_json::to_string_pretty(&prepared.messages)?
    } else {
        serde_json::to_string(&prepared.messages)?
    };
    println!("{}", output);

    let summary = format!(
        "{} kept {} of {} messages, {}",
        strategy.name(),
        prepared.messages.len(),
        messages.len(),
        prepared.token_usage.to_log_string()
    );
    if prepared.over_budget {
        eprintln!("{} {}", "over budget:".red().bold(), summary);
    } else if prepared.truncation_occurred {
        eprintln!("{} {}", "trimmed:".yellow().bold(), summary);
    } else {
        eprintln!("{} {}", "unchanged:".green().bold(), summary);
    }
    Ok(())
}

fn count(config: &TailorConfig, input: &Path) -> Result<()> {
    let messages = read_conversation(input)?;
    let counter = config.build_counter();

    let mut total = 0u32;
    for (index, message) in messages.iter().enumerate() {
        let tokens = counter
            .count_tokens(message)
            .with_context(|| format!("Failed to count message {}", index))?;
        total = total.saturating_add(tokens);
        println!(
            "{:>4}  {:<9}  {:>7}",
            index,
            format!("{:?}", message.role).to_lowercase(),
            tokens
        );
    }
    println!("{}  {:>18}", "total".bold(), total);
    Ok(())
}

fn window(config: &TailorConfig, model: &str) -> Result<()> {
    let registry = config.build_registry();
    let budget = config.budget_for(&registry, model);
    println!("model:          {}", model.cyan());
    println!("context window: {}", budget.max_context_tokens);
    println!("completion:     {}", budget.max_output_tokens);
    println!("safety margin:  {}", budget.safety_margin);
    println!(
        "input budget:   {}",
        budget.available_input_tokens().to_string().bold()
    );
    Ok(())
}
