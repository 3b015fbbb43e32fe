//! Pipeline harness over the in-memory store, stub embedder and scripted LLM.

use std::sync::Arc;

use refcheck::config::Config;
use refcheck::embedding::StubEmbedder;
use refcheck::llm::ScriptedLlm;
use refcheck::pipeline::Pipeline;
use refcheck::retry::RetryPolicy;
use refcheck::vectordb::MockVectorStore;

pub const TEST_DIM: usize = 64;

pub struct TestPipeline {
    pub store: Arc<MockVectorStore>,
    pub llm: Arc<ScriptedLlm>,
    pub pipeline: Pipeline<MockVectorStore>,
}

/// Matching thresholds at zero so tests control relevance through the domain filter.
pub fn permissive_config() -> Config {
    let mut config = Config::default();
    config.embedding.dimension = TEST_DIM;
    config.matcher.book_threshold = 0.0;
    config.matcher.markdown_threshold = 0.0;
    config
}

pub fn spawn(config: Config, llm: ScriptedLlm) -> TestPipeline {
    spawn_with_retry(config, llm, RetryPolicy::none())
}

pub fn spawn_with_retry(config: Config, llm: ScriptedLlm, retry: RetryPolicy) -> TestPipeline {
    let store = Arc::new(MockVectorStore::new());
    let llm = Arc::new(llm);
    let pipeline = Pipeline::new(
        config,
        Arc::clone(&store),
        Arc::new(StubEmbedder::new(TEST_DIM)),
        llm.clone(),
    )
    .with_retry(retry);

    TestPipeline {
        store,
        llm,
        pipeline,
    }
}

pub fn spawn_default() -> TestPipeline {
    spawn(permissive_config(), ScriptedLlm::always("[]"))
}
