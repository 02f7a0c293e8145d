//! Context assembly for grounding prompts.

use super::RetrievedChunk;
use serde::{Deserialize, Serialize};

/// Assembled grounding context for one generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssembledContext {
    pub context_text: String,
    pub chunks_used: Vec<String>,
    pub total_tokens_estimate: usize,
    pub truncated: bool,
}

impl AssembledContext {
    pub fn is_empty(&self) -> bool {
        self.context_text.is_empty()
    }
}

/// Token-aware context assembler.
///
/// Joins chunk texts with a separator up to a token budget. Overflow is
/// truncated at a chunk boundary, never mid-chunk.
pub struct ContextAssembler {
    max_tokens: usize,
    avg_chars_per_token: f64,
}

impl ContextAssembler {
    pub fn new(max_tokens: usize) -> Self {
        Self {
            max_tokens,
            avg_chars_per_token: 4.0,
        }
    }

    pub fn assemble(&self, chunks: &[RetrievedChunk]) -> AssembledContext {
        let max_chars = (self.max_tokens as f64 * self.avg_chars_per_token) as usize;
        let mut text = String::new();
        let mut used = Vec::new();
        let mut truncated = false;

        for chunk in chunks {
            if text.len() + chunk.text.len() > max_chars {
                truncated = true;
                break;
            }
            if !text.is_empty() {
                text.push_str("\n\n---\n\n");
            }
            text.push_str(&chunk.text);
            used.push(chunk.document_id.clone());
        }

        let token_est = (text.len() as f64 / self.avg_chars_per_token) as usize;
        AssembledContext {
            context_text: text,
            chunks_used: used,
            total_tokens_estimate: token_est,
            truncated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, text: &str) -> RetrievedChunk {
        RetrievedChunk {
            document_id: id.to_string(),
            text: text.to_string(),
            score: 0.5,
        }
    }

    #[test]
    fn test_assemble_joins_with_separator() {
        let assembler = ContextAssembler::new(1000);
        let ctx = assembler.assemble(&[chunk("a", "first"), chunk("b", "second")]);
        assert_eq!(ctx.context_text, "first\n\n---\n\nsecond");
        assert_eq!(ctx.chunks_used, vec!["a", "b"]);
        assert!(!ctx.truncated);
    }

    #[test]
    fn test_assemble_truncates_at_budget() {
        // 2 tokens * 4 chars = 8 chars budget
        let assembler = ContextAssembler::new(2);
        let ctx = assembler.assemble(&[chunk("a", "12345678"), chunk("b", "overflow")]);
        assert_eq!(ctx.chunks_used, vec!["a"]);
        assert!(ctx.truncated);
    }

    #[test]
    fn test_assemble_empty() {
        let assembler = ContextAssembler::new(100);
        let ctx = assembler.assemble(&[]);
        assert!(ctx.is_empty());
        assert!(!ctx.truncated);
    }
}
