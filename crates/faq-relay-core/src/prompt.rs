//! System-instruction composition.
//!
//! The operator supplies one template containing a single `{context}`
//! placeholder. Retrieved passages are joined with a blank line, cut to a
//! character budget, and substituted into that position.

use crate::error::RelayError;
use crate::models::Passage;

/// Placeholder replaced with the retrieved context.
pub const CONTEXT_PLACEHOLDER: &str = "{context}";

/// Separator between passages in the composed context.
pub const PASSAGE_SEPARATOR: &str = "\n\n";

/// Default context budget, in characters.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 3000;

/// Template used when the operator does not supply one.
pub const DEFAULT_TEMPLATE: &str = "\
You are the official Discord server help bot. You will only answer questions \
related to this server and its growing community.

Rules:
1. Answer only from the reference material below.
2. If the material does not cover the question, say so.
3. Be concise and friendly.

{context}

Please provide a concise and accurate answer to the user's question based on the above guidelines.
";

/// Truncate `s` to at most `max_chars` characters, keeping the leading part.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}

/// Fills the operator template with retrieved context.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    prefix: String,
    suffix: String,
    max_context_chars: usize,
}

impl PromptComposer {
    /// Create a composer.
    ///
    /// Fails with [`RelayError::InvalidTemplate`] unless `template` contains
    /// the `{context}` placeholder exactly once.
    pub fn new(template: &str, max_context_chars: usize) -> Result<Self, RelayError> {
        let mut parts = template.splitn(3, CONTEXT_PLACEHOLDER);
        let prefix = parts.next().unwrap_or_default();
        let suffix = match (parts.next(), parts.next()) {
            (Some(suffix), None) => suffix,
            (None, _) => {
                return Err(RelayError::InvalidTemplate(format!(
                    "template must contain the {} placeholder",
                    CONTEXT_PLACEHOLDER
                )))
            }
            (Some(_), Some(_)) => {
                return Err(RelayError::InvalidTemplate(format!(
                    "template must contain the {} placeholder only once",
                    CONTEXT_PLACEHOLDER
                )))
            }
        };

        Ok(Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            max_context_chars,
        })
    }

    pub fn max_context_chars(&self) -> usize {
        self.max_context_chars
    }

    /// Join and truncate passage contents into the context block.
    pub fn context(&self, passages: &[Passage]) -> String {
        let joined = passages
            .iter()
            .map(|p| p.content.as_str())
            .collect::<Vec<_>>()
            .join(PASSAGE_SEPARATOR);
        truncate_chars(&joined, self.max_context_chars).to_string()
    }

    /// Produce the system instruction for `passages`.
    pub fn compose(&self, passages: &[Passage]) -> String {
        let context = self.context(passages);
        let mut out = String::with_capacity(self.prefix.len() + context.len() + self.suffix.len());
        out.push_str(&self.prefix);
        out.push_str(&context);
        out.push_str(&self.suffix);
        out
    }
}
