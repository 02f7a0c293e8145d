//! # Reportant Core
//!
//! Core library for the Reportant report generator.
//! Provides outline synthesis, per-section grounded content generation,
//! the streaming report orchestrator, document export, the LLM/retrieval
//! provider abstractions, and configuration.

pub mod brain;
pub mod config;
pub mod error;
pub mod export;
pub mod generator;
pub mod orchestrator;
pub mod outline;
pub mod providers;
pub mod question;
pub mod retrieval;
pub mod types;

// Re-export commonly used types at the crate root.
pub use brain::{LlmProvider, MockLlmProvider};
pub use config::{ReportantConfig, load_config};
pub use error::{ReportantError, Result};
pub use export::{ExportFormat, export};
pub use generator::{GeneratorConfig, GroundedContentGenerator, SectionStream};
pub use orchestrator::{COMPLETION_MESSAGE, ReportOrchestrator};
pub use outline::OutlineSynthesizer;
pub use question::SectionQuestionRewriter;
pub use retrieval::{
    HttpRetriever, InMemoryTable, RetrievalProvider, RetrievedChunk, StaticRetriever,
    TabularProvider,
};
pub use types::{
    Chapter, CompletionRequest, CompletionResponse, GenerationEvent, Message, Outline,
    ReportDocument, Role, Section, StreamEvent, TokenUsage, Topic,
};
