//! bedrock-llm-shim: run one LLM hook invocation from a JSON event.

use anyhow::Context;
use bedrock_llm_shim::{ErrorResponse, LlmAdapter};
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bedrock-llm-shim", version, about = "Run an LLM hook invocation against Bedrock")]
struct Cli {
    /// Invocation event file (reads stdin when omitted).
    #[arg(short, long)]
    event: Option<PathBuf>,

    /// Pretty-print the JSON result.
    #[arg(long)]
    pretty: bool,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

fn read_event(path: Option<&PathBuf>) -> anyhow::Result<serde_json::Value> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read event file {}", path.display()))?,
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("failed to read event from stdin")?;
            raw
        }
    };
    serde_json::from_str(&raw).context("event is not valid JSON")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "bedrock_llm_shim=debug"
    } else {
        "bedrock_llm_shim=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let event = read_event(cli.event.as_ref())?;
    let adapter = LlmAdapter::from_env().context("failed to configure adapter")?;

    let (output, failed) = match adapter.handle_value(event).await {
        Ok(output) => (output, false),
        Err(err) => {
            tracing::error!("invocation failed: {err}");
            (serde_json::to_value(ErrorResponse::from(&err))?, true)
        }
    };

    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{rendered}");

    if failed {
        std::process::exit(1);
    }
    Ok(())
}
