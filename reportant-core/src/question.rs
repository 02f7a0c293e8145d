//! Section question rewriting.
//!
//! A section heading like "2.1. 연도별 총배출량 변화 추이" is not directly
//! answerable; one small model call turns it into a concrete research
//! question using the report title and parent chapter as context. The
//! rewriter never fails a run: empty output and provider errors both
//! degrade to the raw heading.

use crate::brain::LlmProvider;
use crate::types::{CompletionRequest, Outline};
use std::sync::Arc;
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str =
    "당신은 보고서 목차 항목을 구체적인 조사 질문으로 변환하는 AI입니다.";

/// Rewrites section headings into answerable research questions.
pub struct SectionQuestionRewriter {
    llm: Arc<dyn LlmProvider>,
}

impl SectionQuestionRewriter {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Produce a single, specific, answerable question for the heading.
    /// Guaranteed non-empty.
    pub async fn rewrite(&self, section_heading: &str, outline: &Outline) -> String {
        let request = CompletionRequest::from_prompt(
            SYSTEM_PROMPT,
            build_prompt(section_heading, outline),
        )
        .with_temperature(0.2)
        .with_max_tokens(200);

        match self.llm.complete(request).await {
            Ok(response) => {
                let question = clean_question(&response.text);
                if question.is_empty() {
                    warn!(heading = %section_heading, "rewriter returned empty output, using heading");
                    section_heading.to_string()
                } else {
                    debug!(heading = %section_heading, question = %question, "section question rewritten");
                    question
                }
            }
            Err(e) => {
                warn!(heading = %section_heading, error = %e, "question rewrite failed, using heading");
                section_heading.to_string()
            }
        }
    }
}

fn build_prompt(section_heading: &str, outline: &Outline) -> String {
    let chapter_heading = outline
        .chapters
        .iter()
        .find(|c| c.sections.iter().any(|s| s.heading == section_heading))
        .map(|c| c.heading.as_str())
        .unwrap_or("");

    format!(
        r#"보고서 제목: '{}'
장 제목: '{}'
절 제목: '{}'

위 절에서 다루어야 할 내용을 조사하기 위한, 구체적이고 답변 가능한 질문 하나를 작성해 주세요.
질문 한 문장만 출력하고 다른 설명은 포함하지 마세요."#,
        outline.title, chapter_heading, section_heading
    )
}

/// Normalize model output to a single bare question.
fn clean_question(text: &str) -> String {
    text.trim()
        .lines()
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches('"')
        .trim()
        .to_string()
}
