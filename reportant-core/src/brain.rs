//! LLM provider abstraction.
//!
//! Defines the `LlmProvider` trait for model-agnostic LLM interactions with
//! both full and streaming completions, and a mock implementation for tests.

use crate::error::LlmError;
use crate::types::{CompletionRequest, CompletionResponse, StreamEvent, TokenUsage};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Trait for LLM providers, supporting both full and streaming completions.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Perform a full completion and return the response.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Perform a streaming completion, sending events to the channel.
    ///
    /// Implementations must stop reading from the upstream connection once
    /// the receiving side of `tx` has been dropped, so that an abandoned
    /// report run does not leak streaming connections.
    async fn complete_streaming(
        &self,
        request: CompletionRequest,
        tx: mpsc::Sender<StreamEvent>,
    ) -> Result<(), LlmError>;

    /// Return the model name.
    fn model_name(&self) -> &str;

    /// Return the context window size for this provider/model.
    fn context_window(&self) -> usize;
}

/// A queued scripted response for the mock provider.
#[derive(Debug, Clone)]
enum QueuedResponse {
    Text(CompletionResponse),
    /// Streams `prefix` word-by-word, then fails mid-stream.
    StreamFailure { prefix: String, message: String },
}

/// Mock LLM provider for testing.
///
/// Responses are queued and popped in FIFO order; when the queue is empty a
/// canned fallback is returned. `queue_stream_failure` scripts a mid-stream
/// provider failure for exercising per-section error isolation.
pub struct MockLlmProvider {
    model: String,
    context_window: usize,
    responses: std::sync::Mutex<Vec<QueuedResponse>>,
    calls: std::sync::atomic::AtomicUsize,
}

impl Default for MockLlmProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLlmProvider {
    pub fn new() -> Self {
        Self {
            model: "mock-model".to_string(),
            context_window: 128_000,
            responses: std::sync::Mutex::new(Vec::new()),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Create a MockLlmProvider that always returns the given text.
    ///
    /// Queues multiple copies of the response so it can handle multiple calls.
    pub fn with_response(text: &str) -> Self {
        let provider = Self::new();
        for _ in 0..20 {
            provider.queue_response(Self::text_response(text));
        }
        provider
    }

    /// Queue a response to be returned by the next `complete` call.
    pub fn queue_response(&self, response: CompletionResponse) {
        self.responses
            .lock()
            .unwrap()
            .push(QueuedResponse::Text(response));
    }

    /// Queue a text response by content alone.
    pub fn queue_text(&self, text: &str) {
        self.queue_response(Self::text_response(text));
    }

    /// Queue a streaming call that emits `prefix` word-by-word and then
    /// fails with `LlmError::Streaming`.
    pub fn queue_stream_failure(&self, prefix: &str, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push(QueuedResponse::StreamFailure {
                prefix: prefix.to_string(),
                message: message.to_string(),
            });
    }

    /// Number of `complete`/`complete_streaming` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Create a simple text response for testing.
    pub fn text_response(text: &str) -> CompletionResponse {
        CompletionResponse {
            text: text.to_string(),
            usage: TokenUsage {
                input_tokens: 100,
                output_tokens: 50,
            },
            model: "mock-model".to_string(),
            finish_reason: Some("stop".to_string()),
        }
    }

    fn pop(&self) -> QueuedResponse {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            QueuedResponse::Text(Self::text_response(
                "I'm a mock LLM. No queued responses available.",
            ))
        } else {
            responses.remove(0)
        }
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        match self.pop() {
            QueuedResponse::Text(response) => Ok(response),
            QueuedResponse::StreamFailure { message, .. } => {
                Err(LlmError::ApiRequest { message })
            }
        }
    }

    async fn complete_streaming(
        &self,
        _request: CompletionRequest,
        tx: mpsc::Sender<StreamEvent>,
    ) -> Result<(), LlmError> {
        match self.pop() {
            QueuedResponse::Text(response) => {
                for word in response.text.split_whitespace() {
                    if tx
                        .send(StreamEvent::Token(format!("{} ", word)))
                        .await
                        .is_err()
                    {
                        return Ok(());
                    }
                }
                let _ = tx
                    .send(StreamEvent::Done {
                        usage: response.usage,
                    })
                    .await;
                Ok(())
            }
            QueuedResponse::StreamFailure { prefix, message } => {
                for word in prefix.split_whitespace() {
                    if tx
                        .send(StreamEvent::Token(format!("{} ", word)))
                        .await
                        .is_err()
                    {
                        return Ok(());
                    }
                }
                Err(LlmError::Streaming { message })
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn context_window(&self) -> usize {
        self.context_window
    }
}
