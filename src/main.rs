//! `refcheck` command-line entrypoint.
//!
//! ```text
//! refcheck index <documents.json>     index reference documents
//! refcheck validate <topics.json>     match and validate topics, print results as JSON
//! refcheck suggest <topics.json>      keyword and definition proposals as JSON
//! refcheck reset                      drop the reference collection
//! refcheck --health-check             exit 0 if the vector store answers
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, bail};
use mimalloc::MiMalloc;
use serde::Serialize;
use serde::de::DeserializeOwned;

use refcheck::config::Config;
use refcheck::model::{ReferenceDocument, Topic};
use refcheck::pipeline::Pipeline;
use refcheck::vectordb::QdrantStore;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(2);
const SUGGESTED_KEYWORDS: usize = 5;

#[derive(Serialize)]
struct Proposal {
    topic_id: String,
    keywords: refcheck::llm::KeywordSuggestions,
    definition: refcheck::llm::DefinitionDraft,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check().await);
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        bail!("usage: refcheck <index|validate|suggest|reset> [file.json]");
    };

    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!(
        qdrant_url = %config.vector_store.url,
        collection = %config.vector_store.collection,
        llm_model = %config.llm_model.as_str(),
        "refcheck starting"
    );

    let pipeline = Pipeline::from_config(config)?;

    match command.as_str() {
        "index" => {
            let documents: Vec<ReferenceDocument> = read_json(input_path(&args)?)?;
            let written = pipeline.index_references(&documents).await?;
            tracing::info!(documents = documents.len(), records = written, "Indexing complete");
            println!("{}", written);
        }
        "validate" => {
            let topics: Vec<Topic> = read_json(input_path(&args)?)?;
            let results = pipeline.check_topics(&topics).await;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        "suggest" => {
            let topics: Vec<Topic> = read_json(input_path(&args)?)?;
            let mut proposals = Vec::with_capacity(topics.len());
            for topic in &topics {
                let matches = pipeline.find_references(topic, None, None).await;
                proposals.push(Proposal {
                    topic_id: topic.id.clone(),
                    keywords: pipeline.suggest_keywords(topic, SUGGESTED_KEYWORDS).await,
                    definition: pipeline.draft_definition(topic, &matches).await,
                });
            }
            println!("{}", serde_json::to_string_pretty(&proposals)?);
        }
        "reset" => {
            let existed = pipeline.reset_index().await?;
            tracing::info!(existed, "Reference collection dropped");
        }
        other => bail!("unknown command: {}", other),
    }

    for breaker in pipeline.breaker_snapshot() {
        tracing::debug!(
            service = %breaker.name,
            state = %breaker.state,
            failures = breaker.failure_count,
            "Breaker state at exit"
        );
    }

    Ok(())
}

fn input_path(args: &[String]) -> anyhow::Result<&Path> {
    args.get(1)
        .map(Path::new)
        .context("missing input file argument")
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

async fn run_health_check() -> i32 {
    let url = Config::from_env()
        .map(|c| c.vector_store.url)
        .unwrap_or_else(|_| refcheck::config::DEFAULT_QDRANT_URL.to_string());

    let Ok(store) = QdrantStore::new(&url) else {
        return 1;
    };

    match tokio::time::timeout(HEALTH_CHECK_TIMEOUT, store.health_check()).await {
        Ok(Ok(())) => 0,
        _ => 1,
    }
}
