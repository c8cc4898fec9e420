//! # DocSphere Agent
//!
//! Grounded question answering over a user's ingested documents:
//! retrieve the top-k pages with hybrid ranking, assemble them into a
//! context block, and ask the completion model to answer from that
//! context only. Each answer carries the citations (source link + page
//! number) of every page that fed it.

use std::sync::Arc;

use docsphere_core::error::Result;
use docsphere_core::traits::CompletionModel;
use docsphere_core::types::{Answer, RankedPage, Reference};
use docsphere_store::QueryEngine;

/// The model must answer from the supplied context or refuse with the
/// `@error:` prefix — the marker downstream callers key on.
pub const SYSTEM_PROMPT: &str = "You are DocQnA bot. The user will give you part of a long \
document as context and a question. Rather than making up your own answer, find the answer \
in the context; otherwise your response must start with \"@error:\"";

/// Prefix the model uses to signal it could not ground an answer.
pub const GROUNDING_FAILURE_PREFIX: &str = "@error:";

/// Default number of pages retrieved per question.
pub const DEFAULT_TOP_K: usize = 2;

/// Retrieval-augmented Q&A bot.
pub struct DocBot {
    completion: Arc<dyn CompletionModel>,
    query: Arc<QueryEngine>,
}

impl DocBot {
    pub fn new(completion: Arc<dyn CompletionModel>, query: Arc<QueryEngine>) -> Self {
        Self { completion, query }
    }

    /// Answer a question from the user's documents.
    ///
    /// Retrieval failures (including a dangling store reference) propagate;
    /// an empty retrieval still goes to the model, which will refuse via
    /// the `@error:` convention.
    pub async fn answer(&self, user_id: &str, question: &str, k: usize) -> Result<Answer> {
        let ranked = self.query.rank_hybrid(user_id, question, k).await?;
        tracing::debug!(
            "📖 Retrieved {} page(s) for user {user_id}",
            ranked.len()
        );

        let references: Vec<Reference> = ranked.iter().map(RankedPage::reference).collect();
        let prompt = user_prompt(&context_block(&ranked), question);
        let answer = self.completion.complete(SYSTEM_PROMPT, &prompt).await?;

        Ok(Answer { answer, references })
    }
}

/// Whether a model response is the refusal marker rather than an answer.
pub fn is_grounding_failure(answer: &str) -> bool {
    answer.trim_start().starts_with(GROUNDING_FAILURE_PREFIX)
}

fn context_block(ranked: &[RankedPage]) -> String {
    let mut block = String::new();
    for page in ranked {
        block.push_str(&format!(
            "[source: {} page {}]\n{}\n\n",
            page.source_location, page.page_no, page.content
        ));
    }
    block
}

fn user_prompt(context: &str, question: &str) -> String {
    format!(
        "Context: {context}\n=================\nQuestion: {question}\n=================\n"
    )
}
