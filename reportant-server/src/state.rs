//! Shared application state for the HTTP surface.

use reportant_core::config::ReportantConfig;
use reportant_core::generator::{GeneratorConfig, GroundedContentGenerator};
use reportant_core::orchestrator::ReportOrchestrator;
use reportant_core::outline::OutlineSynthesizer;
use reportant_core::question::SectionQuestionRewriter;
use reportant_core::retrieval::{HttpRetriever, InMemoryTable, RetrievalProvider, TabularProvider};
use reportant_core::{LlmProvider, ReportantError};
use std::sync::Arc;
use tracing::info;

/// Immutable shared state: the configured providers and the pipeline stages
/// built over them. Report runs hold no state here; every generation request
/// is an isolated execution.
#[derive(Clone)]
pub struct AppState {
    pub synthesizer: Arc<OutlineSynthesizer>,
    pub orchestrator: Arc<ReportOrchestrator>,
}

impl AppState {
    /// Wire the pipeline from configuration.
    pub fn from_config(config: &ReportantConfig) -> Result<Self, ReportantError> {
        let llm = reportant_core::providers::create_provider(&config.llm)?;
        Self::with_providers(config, llm)
    }

    /// Wire the pipeline around an explicit LLM provider (used by tests).
    pub fn with_providers(
        config: &ReportantConfig,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Self, ReportantError> {
        let generator_config = GeneratorConfig {
            top_k: config.retrieval.top_k,
            max_context_tokens: config.generation.max_context_tokens,
            temperature: config.generation.temperature,
            max_tokens: Some(config.generation.max_tokens),
        };

        let mut generator = GroundedContentGenerator::new(llm.clone(), generator_config);
        if let Some(endpoint) = &config.retrieval.endpoint {
            let retriever: Arc<dyn RetrievalProvider> =
                Arc::new(HttpRetriever::new(endpoint, config.retrieval.timeout_secs));
            generator = generator.with_retriever(retriever);
            info!(endpoint = %endpoint, "snippet retrieval enabled");
        } else {
            info!("no retrieval endpoint configured, generation runs ungrounded");
        }
        if let Some(path) = &config.retrieval.tabular_data_path {
            let table: Arc<dyn TabularProvider> = Arc::new(InMemoryTable::from_json_file(path)?);
            generator = generator.with_tabular(table);
            info!(path = %path.display(), "tabular grounding enabled");
        }

        let rewriter = SectionQuestionRewriter::new(llm.clone());
        Ok(Self {
            synthesizer: Arc::new(OutlineSynthesizer::new(llm)),
            orchestrator: Arc::new(ReportOrchestrator::new(rewriter, generator)),
        })
    }
}
