//! Fundamental types shared across the Reportant core.
//!
//! Covers both sides of the pipeline: the provider boundary (messages,
//! completion requests, token streams) and the report domain (topic,
//! outline, generation events, flattened report document).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ReportantError;

/// The role of a message participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new message with auto-generated ID and current timestamp.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }

    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Create an assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }
}

/// Token usage reported by a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// A request for a completion from an LLM provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: Option<usize>,
    pub stop_sequences: Vec<String>,
    /// Override the provider's default model.
    pub model: Option<String>,
}

impl Default for CompletionRequest {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            temperature: 0.7,
            max_tokens: None,
            stop_sequences: Vec::new(),
            model: None,
        }
    }
}

impl CompletionRequest {
    /// Build a request from a system prompt and a single user message.
    pub fn from_prompt(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system), Message::user(user)],
            ..Default::default()
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A full (non-streaming) completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub text: String,
    pub usage: TokenUsage,
    pub model: String,
    pub finish_reason: Option<String>,
}

/// Events produced by a streaming completion.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// An incremental slice of generated text.
    Token(String),
    /// The stream finished normally.
    Done { usage: TokenUsage },
    /// The provider reported a mid-stream failure. The stream ends here.
    Error(String),
}

// ---------------------------------------------------------------------------
// Report domain
// ---------------------------------------------------------------------------

/// A validated, non-empty report topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    /// Validate and wrap a topic string. Fails with `InvalidInput` when the
    /// string is empty after trimming.
    pub fn new(topic: impl Into<String>) -> Result<Self, ReportantError> {
        let topic = topic.into();
        if topic.trim().is_empty() {
            return Err(ReportantError::invalid_input("topic must not be empty"));
        }
        Ok(Self(topic))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The smallest addressable unit of report structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
}

/// An ordered group of sections under one heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub heading: String,
    pub sections: Vec<Section>,
}

/// Hierarchical chapter/section skeleton describing report structure.
///
/// Created once by the outline synthesizer; the caller may reorder or rename
/// entries before submitting it for generation. The core only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outline {
    pub title: String,
    pub chapters: Vec<Chapter>,
}

impl Outline {
    /// Total number of sections across all chapters.
    pub fn section_count(&self) -> usize {
        self.chapters.iter().map(|c| c.sections.len()).sum()
    }

    /// Render the outline as numbered template text, the format the outline
    /// prompt shows the model (`제 1장 서론` / `1.1. …`).
    pub fn to_template_text(&self) -> String {
        let mut out = String::new();
        for (ci, chapter) in self.chapters.iter().enumerate() {
            if ci > 0 {
                out.push('\n');
            }
            out.push_str(&format!("제 {}장 {}\n", ci + 1, chapter.heading));
            for (si, section) in chapter.sections.iter().enumerate() {
                out.push_str(&format!("{}.{}. {}\n", ci + 1, si + 1, section.heading));
            }
        }
        out
    }
}

/// One unit of the streamed generation progress protocol.
///
/// Serializes to `{ "type": "...", "payload": "..." }` with snake_case type
/// tags, which is the exact wire format of the generation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum GenerationEvent {
    /// A section is about to be generated; payload is its heading.
    SectionTitle(String),
    /// An incremental fragment of the current section's body.
    Content(String),
    /// Terminal event: the whole run completed.
    Done(String),
    /// A section failed (payload: heading + reason), or the run failed
    /// before any section started.
    Error(String),
}

/// The flattened, human-readable report: the only input the export stage
/// accepts. Assembled by the caller after the event stream completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub title: String,
    pub content: String,
}

impl ReportDocument {
    /// Canonical flattening of a completed event stream: each section heading
    /// on its own line, followed by its concatenated content fragments. An
    /// errored section's payload stands in for its body.
    pub fn from_events(title: impl Into<String>, events: &[GenerationEvent]) -> Self {
        let mut content = String::new();
        for event in events {
            match event {
                GenerationEvent::SectionTitle(heading) => {
                    if !content.is_empty() {
                        content.push_str("\n\n");
                    }
                    content.push_str(heading);
                    content.push('\n');
                }
                GenerationEvent::Content(fragment) => content.push_str(fragment),
                GenerationEvent::Error(message) => content.push_str(message),
                GenerationEvent::Done(_) => {}
            }
        }
        Self {
            title: title.into(),
            content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_topic_rejects_whitespace() {
        assert!(Topic::new("   ").is_err());
        assert!(Topic::new("").is_err());
        let topic = Topic::new("국내 탄소 배출 현황").unwrap();
        assert_eq!(topic.as_str(), "국내 탄소 배출 현황");
    }

    #[test]
    fn test_outline_json_round_trip() {
        let outline = Outline {
            title: "국내 탄소 배출 현황 보고서".to_string(),
            chapters: vec![Chapter {
                heading: "서론".to_string(),
                sections: vec![Section {
                    heading: "1.1. 연구의 배경 및 필요성".to_string(),
                }],
            }],
        };
        let json = serde_json::to_value(&outline).unwrap();
        assert_eq!(json["title"], "국내 탄소 배출 현황 보고서");
        assert_eq!(json["chapters"][0]["heading"], "서론");
        assert_eq!(
            json["chapters"][0]["sections"][0]["heading"],
            "1.1. 연구의 배경 및 필요성"
        );
        let back: Outline = serde_json::from_value(json).unwrap();
        assert_eq!(back, outline);
    }

    #[test]
    fn test_outline_section_count() {
        let outline = Outline {
            title: "t".to_string(),
            chapters: vec![
                Chapter {
                    heading: "a".to_string(),
                    sections: vec![
                        Section {
                            heading: "a1".to_string(),
                        },
                        Section {
                            heading: "a2".to_string(),
                        },
                    ],
                },
                Chapter {
                    heading: "b".to_string(),
                    sections: vec![Section {
                        heading: "b1".to_string(),
                    }],
                },
            ],
        };
        assert_eq!(outline.section_count(), 3);
    }

    #[test]
    fn test_generation_event_wire_format() {
        let event = GenerationEvent::SectionTitle("1.1. 연구의 배경 및 필요성".to_string());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "section_title");
        assert_eq!(json["payload"], "1.1. 연구의 배경 및 필요성");

        let done: GenerationEvent =
            serde_json::from_str(r#"{"type":"done","payload":"보고서 생성이 완료되었습니다."}"#)
                .unwrap();
        assert_eq!(
            done,
            GenerationEvent::Done("보고서 생성이 완료되었습니다.".to_string())
        );
    }

    #[test]
    fn test_report_document_from_events() {
        let events = vec![
            GenerationEvent::SectionTitle("서론".to_string()),
            GenerationEvent::Content("첫 ".to_string()),
            GenerationEvent::Content("문단.".to_string()),
            GenerationEvent::SectionTitle("본론".to_string()),
            GenerationEvent::Error("'본론' 섹션 생성 실패: timeout".to_string()),
            GenerationEvent::Done("끝".to_string()),
        ];
        let doc = ReportDocument::from_events("보고서", &events);
        assert_eq!(doc.title, "보고서");
        assert_eq!(
            doc.content,
            "서론\n첫 문단.\n\n본론\n'본론' 섹션 생성 실패: timeout"
        );
    }

    #[test]
    fn test_template_text_rendering() {
        let outline = Outline {
            title: "t".to_string(),
            chapters: vec![Chapter {
                heading: "서론".to_string(),
                sections: vec![Section {
                    heading: "연구의 배경".to_string(),
                }],
            }],
        };
        let text = outline.to_template_text();
        assert!(text.contains("제 1장 서론"));
        assert!(text.contains("1.1. 연구의 배경"));
    }
}
