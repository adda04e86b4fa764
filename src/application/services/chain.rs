use std::fmt;

use futures::stream::{self, StreamExt};
use tracing::{instrument, Instrument, Span};

use super::answer::{AnswerGenerator, AnswerStream};
use super::condenser::QuestionCondenser;
use super::retriever::DocumentRetriever;
use crate::domain::{
    combine_documents_with, ConversationalQuery, DocumentFragment, DomainError,
    DEFAULT_DOCUMENT_SEPARATOR,
};

/// Where a request currently is in the pipeline. Stages only move forward;
/// `Failed` can be entered from any of them and is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    Condensing,
    Retrieving,
    Generating,
    Streaming,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Condensing => "condensing",
            Self::Retrieving => "retrieving",
            Self::Generating => "generating",
            Self::Streaming => "streaming",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the answer stage needs, computed before any output is produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedAnswer {
    pub standalone_question: String,
    pub fragments: Vec<DocumentFragment>,
    pub context: String,
}

/// condense -> retrieve -> combine -> generate, strictly in sequence.
pub struct ConversationalRetrievalChain {
    condenser: QuestionCondenser,
    retriever: DocumentRetriever,
    generator: AnswerGenerator,
    separator: String,
}

impl ConversationalRetrievalChain {
    pub fn new(
        condenser: QuestionCondenser,
        retriever: DocumentRetriever,
        generator: AnswerGenerator,
    ) -> Self {
        Self {
            condenser,
            retriever,
            generator,
            separator: DEFAULT_DOCUMENT_SEPARATOR.to_string(),
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Runs every stage up to (not including) answer generation.
    #[instrument(skip(self, query), fields(history = query.chat_history.len()))]
    pub async fn prepare(&self, query: &ConversationalQuery) -> Result<PreparedAnswer, DomainError> {
        enter(PipelineStage::Received);

        enter(PipelineStage::Condensing);
        let standalone_question = self
            .condenser
            .condense(&query.formatted_history(), &query.question)
            .await
            .inspect_err(|e| failed(PipelineStage::Condensing, e))?;
        tracing::debug!(standalone_question = %standalone_question, "question condensed");

        enter(PipelineStage::Retrieving);
        let fragments = self
            .retriever
            .retrieve(&standalone_question)
            .await
            .inspect_err(|e| failed(PipelineStage::Retrieving, e))?;

        let context = combine_documents_with(&fragments, &self.separator);

        Ok(PreparedAnswer {
            standalone_question,
            fragments,
            context,
        })
    }

    /// Runs the whole pipeline. Any failure before the first answer chunk is
    /// returned here, so callers never see a partial answer for it. The
    /// returned stream is polled inside the caller's current span.
    pub async fn stream(&self, query: ConversationalQuery) -> Result<AnswerStream, DomainError> {
        let prepared = self.prepare(&query).await?;

        enter(PipelineStage::Generating);
        let answer = self
            .generator
            .generate(&prepared.context, &prepared.standalone_question)
            .await
            .inspect_err(|e| failed(PipelineStage::Generating, e))?;

        enter(PipelineStage::Streaming);
        Ok(track_stream(answer, Span::current()))
    }
}

fn enter(stage: PipelineStage) {
    tracing::debug!(stage = %stage, "pipeline stage");
}

fn failed(stage: PipelineStage, error: &DomainError) {
    tracing::error!(stage = %stage, next = %PipelineStage::Failed, error = %error, "pipeline failed");
}

struct Tracked {
    inner: AnswerStream,
    span: Span,
    chunks: usize,
    finished: bool,
}

/// Logs the terminal transition of the answer stream and stops after the
/// first error. Every poll runs inside `span`, which outlives the handler.
fn track_stream(inner: AnswerStream, span: Span) -> AnswerStream {
    let state = Tracked {
        inner,
        span,
        chunks: 0,
        finished: false,
    };

    stream::unfold(state, |mut state| {
        let span = state.span.clone();
        async move {
            if state.finished {
                return None;
            }
            match state.inner.next().await {
                Some(Ok(chunk)) => {
                    state.chunks += 1;
                    Some((Ok(chunk), state))
                }
                Some(Err(e)) => {
                    failed(PipelineStage::Streaming, &e);
                    state.finished = true;
                    Some((Err(e), state))
                }
                None => {
                    tracing::info!(stage = %PipelineStage::Done, chunks = state.chunks, "answer stream completed");
                    None
                }
            }
        }
        .instrument(span)
    })
    .boxed()
}
