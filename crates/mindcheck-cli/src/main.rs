mod batch;
mod display;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use mindcheck_core::{DeploymentKind, extract_marker};
use mindcheck_narrative::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS, NarrativeClient, NarrativeConfig,
};
use mindcheck_pipeline::{Assessor, Deployment};
use serde_json::{Value, json};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "mindcheck", version, about = "Fused classifier and narrative assessments")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assess one JSON request
    Assess {
        #[command(flatten)]
        target: Target,
        /// Request file, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: PathBuf,
        /// Print the result as JSON instead of a card
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        narrative: NarrativeArgs,
    },
    /// Assess a JSON-lines file and export the results to Parquet
    Batch {
        #[command(flatten)]
        target: Target,
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Requests in flight at once
        #[arg(short, long, default_value_t = 4)]
        concurrency: usize,
        #[command(flatten)]
        narrative: NarrativeArgs,
    },
    /// Render the narrative prompt for a request without sending it
    Prompt {
        #[command(flatten)]
        target: Target,
        #[arg(short, long, default_value = "-")]
        input: PathBuf,
        /// Model name written into the rendered request
        #[arg(long, env = "MINDCHECK_NARRATIVE_MODEL", default_value = DEFAULT_MODEL)]
        narrative_model: String,
    },
    /// Run the marker extractor over a text file
    Extract {
        /// Marker label, e.g. "Depression Probability"
        #[arg(short, long)]
        label: String,
        /// Text file, or `-` for stdin
        #[arg(default_value = "-")]
        file: PathBuf,
    },
    /// Show results from an exported Parquet file
    Show {
        path: PathBuf,
        /// Print a table instead of cards
        #[arg(long)]
        table: bool,
    },
}

#[derive(Args)]
struct Target {
    /// academic, essay or music
    #[arg(short, long)]
    deployment: DeploymentKind,
    /// Classifier artifact (.json, or .onnx with the `onnx` feature)
    #[arg(short, long, env = "MINDCHECK_MODEL")]
    model: Option<PathBuf>,
}

#[derive(Args)]
struct NarrativeArgs {
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, env = "MINDCHECK_NARRATIVE_URL", default_value = DEFAULT_BASE_URL)]
    narrative_url: String,
    #[arg(long, env = "MINDCHECK_NARRATIVE_MODEL", default_value = DEFAULT_MODEL)]
    narrative_model: String,
    /// Seconds
    #[arg(long, env = "MINDCHECK_NARRATIVE_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    narrative_timeout: u64,
}

impl NarrativeArgs {
    fn config(&self) -> NarrativeConfig {
        NarrativeConfig {
            base_url: self.narrative_url.clone(),
            api_key: self.api_key.clone(),
            model: self.narrative_model.clone(),
            timeout: Duration::from_secs(self.narrative_timeout),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Assess {
            target,
            input,
            json,
            narrative,
        } => {
            let assessor = build_assessor(&target, &narrative)?;
            let raw = read_request(&input)?;
            match assessor.assess(&raw).await {
                Ok(result) if json => println!("{}", serde_json::to_string_pretty(&result)?),
                Ok(result) => display::print_result_card(&result),
                Err(e) => {
                    println!("{}", json!({ "error": e.to_string() }));
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::Batch {
            target,
            input,
            output,
            concurrency,
            narrative,
        } => {
            let assessor = build_assessor(&target, &narrative)?;
            let stats = batch::run_batch_file(&assessor, &input, &output, concurrency).await?;
            if stats.assessed == 0 && stats.total > 0 {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Prompt {
            target,
            input,
            narrative_model,
        } => {
            let deployment = Deployment::for_kind(target.deployment);
            let estimator = deployment.estimator(load_model(deployment, target.model.as_deref())?)?;
            // Never called: preview stops before the narrative request.
            let client = NarrativeClient::new(&NarrativeConfig::default())?;
            let assessor = Assessor::new(deployment, estimator, Arc::new(client), narrative_model);

            let raw = read_request(&input)?;
            match assessor.prepare(&raw) {
                Ok(prepared) => {
                    if let Some(system) = prepared.request.system() {
                        println!("[system]\n{system}\n");
                    }
                    println!("[user]\n{}", prepared.request.prompt());
                    println!(
                        "\n[request] model={} max_tokens={} temperature={}",
                        prepared.request.model,
                        prepared.request.max_tokens,
                        prepared
                            .request
                            .temperature
                            .map_or_else(|| "default".to_string(), |t| t.to_string())
                    );
                }
                Err(e) => {
                    println!("{}", json!({ "error": e.to_string() }));
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::Extract { label, file } => {
            let text = read_text(&file)?;
            match extract_marker(&text, &label) {
                Some(value) => println!("{value}"),
                None => {
                    eprintln!("no '{label}: X%' marker found");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::Show { path, table } => {
            if table {
                let batches = mindcheck_store::read_parquet(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                println!("{}", arrow::util::pretty::pretty_format_batches(&batches)?);
            } else {
                let results = mindcheck_store::read_results(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                if results.is_empty() {
                    println!("(no results)");
                }
                for result in &results {
                    display::print_result_card(result);
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn build_assessor(target: &Target, narrative: &NarrativeArgs) -> anyhow::Result<Assessor> {
    let deployment = Deployment::for_kind(target.deployment);
    let estimator = deployment.estimator(load_model(deployment, target.model.as_deref())?)?;

    let config = narrative.config();
    if config.api_key.is_none() {
        warn!("OPENROUTER_API_KEY not set; narratives will use the fallback text");
    }
    let client = NarrativeClient::new(&config).context("building narrative client")?;
    info!(
        deployment = %deployment.kind,
        endpoint = client.endpoint(),
        model = %config.model,
        "assessor ready"
    );
    Ok(Assessor::new(deployment, estimator, Arc::new(client), config.model))
}

fn load_model(
    deployment: &Deployment,
    path: Option<&Path>,
) -> anyhow::Result<Option<Arc<dyn mindcheck_ai::Classifier>>> {
    match path {
        Some(path) if deployment.needs_classifier() => {
            Ok(Some(mindcheck_ai::load_classifier(path)?))
        }
        Some(path) => {
            warn!(
                deployment = %deployment.kind,
                model = %path.display(),
                "deployment has no classifier, ignoring model"
            );
            Ok(None)
        }
        None => Ok(None),
    }
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn read_request(path: &Path) -> anyhow::Result<Value> {
    let text = read_text(path)?;
    serde_json::from_str(&text).with_context(|| format!("parsing {} as JSON", path.display()))
}
