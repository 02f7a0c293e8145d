//! Grounded content generation.
//!
//! Answers one rewritten section question by combining retrieved snippets
//! and a tabular summary into a grounding prompt, then streaming the model's
//! answer. Fragments are forwarded as they arrive; nothing buffers the full
//! section. Retrieval failures degrade to ungrounded generation; only a
//! failure of the generation stream itself is fatal, and then only for the
//! section being generated.

use crate::brain::LlmProvider;
use crate::error::LlmError;
use crate::retrieval::{ContextAssembler, RetrievalProvider, TabularProvider, TabularQuery};
use crate::types::{CompletionRequest, StreamEvent, Topic};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str =
    "당신은 데이터 분석 결과와 참고 문서를 바탕으로 전문적인 보고서의 한 섹션을 작성하는 AI입니다.";

/// Event channel depth for one section's token stream.
const STREAM_BUFFER: usize = 64;

/// Configuration for the content generator.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub top_k: usize,
    pub max_context_tokens: usize,
    pub temperature: f32,
    pub max_tokens: Option<usize>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            max_context_tokens: 2_000,
            temperature: 0.7,
            max_tokens: Some(1_024),
        }
    }
}

/// A section's in-flight token stream: the receiver yields incremental
/// fragments; the handle resolves to the streaming call's final result.
/// Finite and consumed exactly once.
pub struct SectionStream {
    pub events: mpsc::Receiver<StreamEvent>,
    pub handle: JoinHandle<Result<(), LlmError>>,
}

/// Generates grounded section bodies as lazy fragment streams.
pub struct GroundedContentGenerator {
    llm: Arc<dyn LlmProvider>,
    retriever: Option<Arc<dyn RetrievalProvider>>,
    tabular: Option<Arc<dyn TabularProvider>>,
    config: GeneratorConfig,
}

impl GroundedContentGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>, config: GeneratorConfig) -> Self {
        Self {
            llm,
            retriever: None,
            tabular: None,
            config,
        }
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn RetrievalProvider>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn with_tabular(mut self, tabular: Arc<dyn TabularProvider>) -> Self {
        self.tabular = Some(tabular);
        self
    }

    /// Start generating the answer to `question`, returning its token
    /// stream. Suspends for retrieval and tabular lookups before the
    /// streaming call begins; both degrade gracefully on failure.
    pub async fn generate(&self, question: &str, topic: &Topic) -> SectionStream {
        let prompt = self.grounding_prompt(question, topic).await;
        let request = CompletionRequest::from_prompt(SYSTEM_PROMPT, prompt)
            .with_temperature(self.config.temperature);
        let request = match self.config.max_tokens {
            Some(max) => request.with_max_tokens(max),
            None => request,
        };

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let llm = Arc::clone(&self.llm);
        let handle = tokio::spawn(async move { llm.complete_streaming(request, tx).await });

        SectionStream { events: rx, handle }
    }

    /// Compose the grounding prompt: question + tabular summary + snippet
    /// context.
    async fn grounding_prompt(&self, question: &str, topic: &Topic) -> String {
        let context = self.retrieve_context(question).await;
        let tabular = self.tabular_summary(question, topic).await;

        format!(
            r#"보고서 주제: '{topic}'

다음 질문에 대한 보고서 본문 내용을 서술형으로 작성해주세요: '{question}'

- 딱딱하고 전문적인 톤을 유지하세요.
- "분석 결과에 따르면"과 같은 서두 대신, 자연스럽게 본문을 시작하세요.
- 숫자나 핵심적인 사실을 문장에 포함하여 신뢰도를 높이세요.
- 최종 결과물은 다른 설명 없이, 보고서 본문 내용만 포함해야 합니다.

[분석 결과 요약]:
{tabular}

[관련 문서 정보]:
{context}"#,
            topic = topic,
            question = question,
            tabular = tabular.as_deref().unwrap_or("(해당 없음)"),
            context = context
                .as_deref()
                .unwrap_or("(관련 문서를 찾지 못했습니다. 일반적인 지식을 바탕으로 작성하세요.)"),
        )
    }

    async fn retrieve_context(&self, question: &str) -> Option<String> {
        let retriever = self.retriever.as_ref()?;
        match retriever.retrieve(question, self.config.top_k).await {
            Ok(chunks) if chunks.is_empty() => None,
            Ok(chunks) => {
                let assembled =
                    ContextAssembler::new(self.config.max_context_tokens).assemble(&chunks);
                debug!(
                    chunks = assembled.chunks_used.len(),
                    truncated = assembled.truncated,
                    "grounding context assembled"
                );
                (!assembled.is_empty()).then_some(assembled.context_text)
            }
            Err(e) => {
                // Non-fatal: generation proceeds without grounding.
                warn!(error = %e, question = %question, "retrieval failed, generating ungrounded");
                None
            }
        }
    }

    async fn tabular_summary(&self, question: &str, topic: &Topic) -> Option<String> {
        let tabular = self.tabular.as_ref()?;
        let query = TabularQuery::from_question(question, topic.as_str());
        match tabular.summarize(&query).await {
            Ok(summary) => summary.map(|s| s.to_string()),
            Err(e) => {
                warn!(error = %e, "tabular summarization failed, omitting");
                None
            }
        }
    }
}
