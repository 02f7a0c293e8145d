//! Outline synthesis: topic → (template text, structured outline).
//!
//! One generation request produces both a narrative template and a strict
//! JSON outline. The JSON block is located in the response (fenced block
//! preferred) and parsed against the outline schema; anything that does not
//! parse is a `MalformedOutline` failure, surfaced without retry.

use crate::brain::LlmProvider;
use crate::error::{OutlineError, Result};
use crate::types::{CompletionRequest, Outline, Topic};
use std::sync::Arc;
use tracing::{debug, info};

const SYSTEM_PROMPT: &str = "당신은 전문적인 보고서의 목차를 구조적으로 작성하는 AI입니다.";

/// Synthesizes report templates and outlines from a topic.
pub struct OutlineSynthesizer {
    llm: Arc<dyn LlmProvider>,
    temperature: f32,
}

impl OutlineSynthesizer {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm,
            temperature: 0.4,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Generate a template skeleton and structured outline for the topic.
    pub async fn synthesize(&self, topic: &Topic) -> Result<(String, Outline)> {
        let request = CompletionRequest::from_prompt(SYSTEM_PROMPT, build_prompt(topic))
            .with_temperature(self.temperature);

        let response = self.llm.complete(request).await?;
        debug!(chars = response.text.len(), "outline response received");

        let (template_text, outline) = parse_response(&response.text)?;
        info!(
            title = %outline.title,
            chapters = outline.chapters.len(),
            sections = outline.section_count(),
            "outline synthesized"
        );
        Ok((template_text, outline))
    }
}

fn build_prompt(topic: &Topic) -> String {
    format!(
        r#"다음 주제에 대한 전문적인 보고서의 목차(뼈대)를 생성해 주세요: '{topic}'

요구사항:
- 일반적인 보고서 형식에 따라 '서론', '본론', '결론'을 포함해야 합니다.
- 각 장(Chapter)과 절(Section)은 명확하게 번호로 구분되어야 합니다 (예: 1., 1.1., 2.1.).
- 내용은 '{topic}'이라는 주제에 맞춰 전문적이고 논리적인 흐름을 가져야 합니다.

먼저 목차를 텍스트로 작성한 뒤, 같은 목차를 아래 스키마를 따르는 JSON 코드 블록으로 한 번 더 출력해 주세요.
JSON은 정확히 이 형태여야 합니다:

```json
{{
  "title": "보고서 제목",
  "chapters": [
    {{
      "heading": "장 제목",
      "sections": [
        {{ "heading": "절 제목" }}
      ]
    }}
  ]
}}
```

JSON 코드 블록 외에 다른 JSON은 포함하지 마세요."#
    )
}

/// Split a synthesis response into template text and parsed outline.
fn parse_response(text: &str) -> Result<(String, Outline)> {
    let (json_str, json_start) = extract_json_block(text).ok_or_else(|| OutlineError::Malformed {
        message: "response contains no JSON outline block".to_string(),
    })?;

    let outline: Outline =
        serde_json::from_str(json_str).map_err(|e| OutlineError::Malformed {
            message: format!("outline JSON does not match schema: {}", e),
        })?;
    validate(&outline)?;

    let mut template_text = text[..json_start].trim();
    // Strip a dangling opening fence left in front of the JSON block.
    if let Some(stripped) = template_text.strip_suffix("```json") {
        template_text = stripped.trim_end();
    } else if let Some(stripped) = template_text.strip_suffix("```") {
        template_text = stripped.trim_end();
    }
    let template_text = if template_text.is_empty() {
        outline.to_template_text()
    } else {
        template_text.to_string()
    };

    Ok((template_text, outline))
}

/// Locate the JSON outline in the response. Returns the JSON source and its
/// byte offset in `text`. A fenced ```json block wins; otherwise the
/// outermost `{...}` span is used.
fn extract_json_block(text: &str) -> Option<(&str, usize)> {
    if let Some(fence_start) = text.find("```json") {
        let body_start = fence_start + "```json".len();
        if let Some(fence_len) = text[body_start..].find("```") {
            let json = text[body_start..body_start + fence_len].trim();
            if !json.is_empty() {
                return Some((json, fence_start));
            }
        }
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some((&text[start..=end], start))
}

fn validate(outline: &Outline) -> std::result::Result<(), OutlineError> {
    if outline.title.trim().is_empty() {
        return Err(OutlineError::Malformed {
            message: "outline title is empty".to_string(),
        });
    }
    if outline.chapters.is_empty() {
        return Err(OutlineError::Malformed {
            message: "outline has no chapters".to_string(),
        });
    }
    if outline.section_count() == 0 {
        return Err(OutlineError::Malformed {
            message: "outline has no sections".to_string(),
        });
    }
    Ok(())
}
