//! Prompt rendering
//!
//! A template has exactly two slots, `{context}` followed by `{question}`.
//! Rendering is plain concatenation of the fixed template text around the
//! joined passages and the question, so the output depends only on its inputs.

use docchat_core::config::PromptStyle;
use docchat_core::error::{DocchatError, Result};
use docchat_core::models::{PassageMatch, PromptText, Query};

/// Placed between consecutive passages in the context block
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

const CONTEXT_SLOT: &str = "{context}";
const QUESTION_SLOT: &str = "{question}";

const GROUNDED_TEMPLATE: &str = "Answer the question based only on the following context:

{context}

---

Answer the question based on the above context: {question}
";

const CONCISE_TEMPLATE: &str = "Use the following pieces of context to answer the question at the end.
If you don't know the answer, just say that you don't know, don't try to make up an answer.
Keep the answer concise.

Context: {context}

Question: {question}

Helpful Answer:";

/// A two-slot prompt template, pre-split around its slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    head: String,
    middle: String,
    tail: String,
}

impl PromptTemplate {
    /// Parse a template containing `{context}` once, followed by `{question}` once
    pub fn new(template: &str) -> Result<Self> {
        let invalid = |reason: &str| DocchatError::ConfigInvalid {
            key: "prompt_template".to_string(),
            reason: reason.to_string(),
        };

        if template.matches(CONTEXT_SLOT).count() != 1 {
            return Err(invalid("template must contain {context} exactly once"));
        }
        if template.matches(QUESTION_SLOT).count() != 1 {
            return Err(invalid("template must contain {question} exactly once"));
        }

        let (head, rest) = template
            .split_once(CONTEXT_SLOT)
            .ok_or_else(|| invalid("template must contain {context}"))?;
        let (middle, tail) = rest
            .split_once(QUESTION_SLOT)
            .ok_or_else(|| invalid("{question} must come after {context}"))?;

        Ok(Self {
            head: head.to_string(),
            middle: middle.to_string(),
            tail: tail.to_string(),
        })
    }

    /// Answer strictly from the retrieved context
    pub fn grounded() -> Self {
        Self::split_builtin(GROUNDED_TEMPLATE)
    }

    /// Keep answers short and admit missing knowledge
    pub fn concise() -> Self {
        Self::split_builtin(CONCISE_TEMPLATE)
    }

    pub fn for_style(style: PromptStyle) -> Self {
        match style {
            PromptStyle::Grounded => Self::grounded(),
            PromptStyle::Concise => Self::concise(),
        }
    }

    fn split_builtin(template: &str) -> Self {
        let (head, rest) = template.split_once(CONTEXT_SLOT).unwrap_or((template, ""));
        let (middle, tail) = rest.split_once(QUESTION_SLOT).unwrap_or((rest, ""));
        Self {
            head: head.to_string(),
            middle: middle.to_string(),
            tail: tail.to_string(),
        }
    }

    fn render(&self, context: &str, question: &str) -> String {
        let mut out = String::with_capacity(
            self.head.len() + context.len() + self.middle.len() + question.len() + self.tail.len(),
        );
        out.push_str(&self.head);
        out.push_str(context);
        out.push_str(&self.middle);
        out.push_str(question);
        out.push_str(&self.tail);
        out
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::grounded()
    }
}

/// Renders retrieved passages and the question into a prompt
#[derive(Debug, Clone, Default)]
pub struct PromptAssembler {
    template: PromptTemplate,
}

impl PromptAssembler {
    pub fn new(template: PromptTemplate) -> Self {
        Self { template }
    }

    pub fn from_style(style: PromptStyle) -> Self {
        Self::new(PromptTemplate::for_style(style))
    }

    /// Render the prompt; an empty passage list leaves the context block empty
    pub fn assemble(&self, passages: &[PassageMatch], query: &Query) -> PromptText {
        let context = passages
            .iter()
            .map(|p| p.content.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);

        PromptText::new(self.template.render(&context, query.as_str()))
    }
}
