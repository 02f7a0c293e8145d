//! Report orchestration: ordered section walk and event emission.
//!
//! The orchestrator walks a caller-supplied outline in document order and
//! emits a strictly ordered, finite stream of `GenerationEvent`s. Each
//! section is an isolated unit of work: its generation failure becomes an
//! `error` event and the run continues. The stream always terminates with a
//! single `done` event. No state survives a run; concurrent runs share
//! nothing mutable.

use crate::error::Result;
use crate::generator::GroundedContentGenerator;
use crate::question::SectionQuestionRewriter;
use crate::types::{GenerationEvent, Outline, StreamEvent, Topic};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Terminal event payload for a completed run.
pub const COMPLETION_MESSAGE: &str = "보고서 생성이 완료되었습니다.";

/// Event channel depth for a report run.
const EVENT_BUFFER: usize = 64;

/// Per-run progress. `Emitting` names the section currently being generated
/// by chapter/section index in the outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Idle,
    Emitting { chapter: usize, section: usize },
    Finished,
}

/// Drives outline-ordered report generation.
pub struct ReportOrchestrator {
    stages: Arc<Stages>,
}

/// The per-section pipeline stages, shared with the spawned run driver.
struct Stages {
    rewriter: SectionQuestionRewriter,
    generator: GroundedContentGenerator,
}

impl ReportOrchestrator {
    pub fn new(rewriter: SectionQuestionRewriter, generator: GroundedContentGenerator) -> Self {
        Self {
            stages: Arc::new(Stages {
                rewriter,
                generator,
            }),
        }
    }

    /// Start a report run and return its event stream.
    ///
    /// Validation happens before any provider call: a malformed outline is
    /// an `InvalidInput` error, not an `error` event. Dropping the receiver
    /// cancels the run before its next provider call.
    pub fn run(
        &self,
        topic: Topic,
        outline: Outline,
    ) -> Result<mpsc::Receiver<GenerationEvent>> {
        validate_outline(&outline)?;

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let stages = Arc::clone(&self.stages);
        tokio::spawn(async move {
            stages.drive(topic, outline, tx).await;
        });
        Ok(rx)
    }
}

impl Stages {
    async fn drive(&self, topic: Topic, outline: Outline, tx: mpsc::Sender<GenerationEvent>) {
        let mut state = RunState::Idle;
        debug!(?state, topic = %topic, sections = outline.section_count(), "report run starting");

        for (ci, chapter) in outline.chapters.iter().enumerate() {
            for (si, section) in chapter.sections.iter().enumerate() {
                state = RunState::Emitting {
                    chapter: ci,
                    section: si,
                };
                debug!(?state, heading = %section.heading, "section starting");

                if tx
                    .send(GenerationEvent::SectionTitle(section.heading.clone()))
                    .await
                    .is_err()
                {
                    debug!("event receiver dropped, cancelling run");
                    return;
                }
                if !self
                    .emit_section(&topic, &outline, &section.heading, &tx)
                    .await
                {
                    debug!("event receiver dropped mid-section, cancelling run");
                    return;
                }
            }
        }

        state = RunState::Finished;
        let _ = tx
            .send(GenerationEvent::Done(COMPLETION_MESSAGE.to_string()))
            .await;
        info!(?state, topic = %topic, "report run finished");
    }

    /// Generate one section and forward its fragments. Returns `false` only
    /// when the event receiver has gone away; a section failure is converted
    /// into an `error` event and reported as `true` (continue).
    async fn emit_section(
        &self,
        topic: &Topic,
        outline: &Outline,
        heading: &str,
        tx: &mpsc::Sender<GenerationEvent>,
    ) -> bool {
        let question = self.rewriter.rewrite(heading, outline).await;
        let mut stream = self.generator.generate(&question, topic).await;

        let mut stream_error: Option<String> = None;
        while let Some(event) = stream.events.recv().await {
            match event {
                StreamEvent::Token(fragment) => {
                    if tx.send(GenerationEvent::Content(fragment)).await.is_err() {
                        // Caller went away: abort the in-flight provider
                        // stream so no connection is leaked.
                        stream.handle.abort();
                        return false;
                    }
                }
                StreamEvent::Done { usage } => {
                    debug!(
                        heading = %heading,
                        output_tokens = usage.output_tokens,
                        "section stream complete"
                    );
                    break;
                }
                StreamEvent::Error(message) => {
                    stream_error = Some(message);
                    break;
                }
            }
        }

        let failure = match stream.handle.await {
            Ok(Ok(())) => stream_error,
            Ok(Err(e)) => Some(e.to_string()),
            Err(join_err) => Some(format!("generation task failed: {}", join_err)),
        };

        if let Some(reason) = failure {
            warn!(heading = %heading, reason = %reason, "section generation failed, continuing");
            let payload = format!("'{}' 섹션 생성 실패: {}", heading, reason);
            if tx.send(GenerationEvent::Error(payload)).await.is_err() {
                return false;
            }
        }
        true
    }
}

/// Reject malformed outlines before any provider call. An outline with zero
/// sections is legal (the caller omitted everything) and produces only the
/// terminal `done` event.
fn validate_outline(outline: &Outline) -> Result<()> {
    use crate::error::ReportantError;

    if outline.title.trim().is_empty() {
        return Err(ReportantError::invalid_input("outline title must not be empty"));
    }
    for chapter in &outline.chapters {
        if chapter.heading.trim().is_empty() {
            return Err(ReportantError::invalid_input(
                "chapter heading must not be empty",
            ));
        }
        for section in &chapter.sections {
            if section.heading.trim().is_empty() {
                return Err(ReportantError::invalid_input(
                    "section heading must not be empty",
                ));
            }
        }
    }
    Ok(())
}
