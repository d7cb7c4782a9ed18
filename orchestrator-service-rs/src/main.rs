// orchestrator-service-rs/src/main.rs
// Answer one observability question from the command line and print the
// AgentResponse as JSON.
//
// Backends, the reasoning engine and orchestration limits are configured
// through the environment (or a .env file); see config-rs, tool-sdk and
// llm-service-rs for the variables each reads.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use config_rs::OrchestratorConfig;
use llm_service::{HttpReasoningClient, LlmConfig};
use orchestrator::Orchestrator;
use shared_types::Question;
use tool_sdk::{AdapterRegistry, BackendsConfig};

#[derive(Parser)]
#[command(name = "orchestrator-service")]
#[command(about = "Ask the cluster observability agent a question", long_about = None)]
#[command(version)]
struct Cli {
    /// Free-text question, e.g. "Why is my app pod restarting?"
    #[arg(required = true)]
    question: Vec<String>,

    /// Kubernetes namespace to scope the evidence to
    #[arg(short, long)]
    namespace: Option<String>,

    /// Service / workload name (pod name prefix)
    #[arg(short, long)]
    service: Option<String>,

    /// Look-back window in minutes
    #[arg(short, long)]
    window: Option<u32>,

    /// Always include recent logs
    #[arg(short, long)]
    logs: bool,

    /// Print compact JSON instead of pretty JSON
    #[arg(long)]
    compact: bool,
}

async fn run(cli: Cli) -> Result<String, Box<dyn std::error::Error>> {
    let config = OrchestratorConfig::from_env();
    config.validate()?;

    let backends = BackendsConfig::from_env()?;
    let registry = Arc::new(AdapterRegistry::from_backends(&backends)?);
    log::info!("Registered adapters: {:?}", registry.ids());

    let reasoner = Arc::new(HttpReasoningClient::new(LlmConfig::from_env())?);
    let orchestrator = Orchestrator::new(config, registry, reasoner);

    let mut question = Question::new(cli.question.join(" ")).with_logs(cli.logs);
    if let Some(ns) = cli.namespace {
        question = question.with_namespace(ns);
    }
    if let Some(svc) = cli.service {
        question = question.with_service(svc);
    }
    if let Some(minutes) = cli.window {
        question = question.with_time_window(minutes);
    }

    let response = orchestrator.handle(&question).await?;
    let json = if cli.compact {
        serde_json::to_string(&response)?
    } else {
        serde_json::to_string_pretty(&response)?
    };
    Ok(json)
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Request failed: {}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
