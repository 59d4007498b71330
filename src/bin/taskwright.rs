use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use taskwright::config::{AppConfig, StoreConfig, default_key_prefix, load_config};
use taskwright::ids::PromptDigestIds;
use taskwright::llm::{NullGenerator, OpenAiGenerator};
use taskwright::pipeline::{CodeModernizer, StructuralValidator};
use taskwright::service::{GenerateRequest, WorkflowService};
use taskwright::store::open_store;
use taskwright::{Orchestrator, WorkflowGraph};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a workflow from a natural-language request
    Generate {
        /// What the workflow should do
        prompt: String,

        /// Path to the YAML config file
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Record the result in Redis instead of memory
        #[arg(long)]
        redis: Option<String>,

        /// Write the workflow JSON here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Validate and normalize an existing workflow JSON file offline
    Validate {
        /// Path to the workflow JSON file
        file: PathBuf,

        /// Prompt used to derive the workflow id when the file has none
        #[arg(long, default_value = "")]
        prompt: String,

        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// List recorded workflows, newest first
    List {
        #[arg(long, short)]
        config: Option<PathBuf>,

        #[arg(long)]
        redis: Option<String>,

        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

fn resolve_config(path: Option<&Path>, redis: Option<String>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(url) = redis {
        config.store = StoreConfig::Redis {
            url,
            key_prefix: default_key_prefix(),
        };
    }
    Ok(config.apply_env())
}

fn write_graph(graph: &WorkflowGraph, output: Option<&Path>) -> Result<()> {
    let rendered = serde_json::to_string_pretty(graph)?;
    match output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write workflow to {}", path.display()))?;
            info!("Workflow written to {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            prompt,
            config,
            redis,
            output,
        } => {
            let config = resolve_config(config.as_deref(), redis)?;
            let store = open_store(&config.store)?;
            let generator = Arc::new(OpenAiGenerator::new(config.llm));
            let orchestrator = Arc::new(Orchestrator::with_generator(generator));
            let service = WorkflowService::new(orchestrator, store);

            let graph = service
                .generate(GenerateRequest { prompt })
                .await
                .map_err(|envelope| anyhow!(envelope.detail))?;
            write_graph(&graph, output.as_deref())?;
        }

        Commands::Validate {
            file,
            prompt,
            output,
        } => {
            let raw = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read workflow file from {}", file.display()))?;
            let json: serde_json::Value = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse workflow JSON from {}", file.display()))?;

            let generator = Arc::new(NullGenerator);
            let validator = StructuralValidator::new(generator.clone(), Arc::new(PromptDigestIds));
            let graph = validator.validate(&json, &prompt).await?;
            let graph = CodeModernizer::new(generator).modernize(graph, &prompt).await;
            write_graph(&graph, output.as_deref())?;
        }

        Commands::List {
            config,
            redis,
            limit,
        } => {
            let config = resolve_config(config.as_deref(), redis)?;
            let store = open_store(&config.store)?;
            for record in store.list(limit).await? {
                println!(
                    "{}  {}  {}  {}",
                    record.id, record.created_at, record.name, record.prompt
                );
            }
        }
    }

    Ok(())
}
