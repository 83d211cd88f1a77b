//! Narrative summaries for collected reports.
//!
//! Prompts are YAML templates rendered with report data and sent to an
//! OpenAI-compatible chat-completions endpoint. Enrichment is optional: a
//! run without a summarizer only writes a placeholder overview.

pub mod enrich;
pub mod openai;
pub mod prompts;
pub mod summarizer;

pub use enrich::{Enricher, Enrichment, EnrichmentReport, SummaryOutcome};
pub use openai::{OpenAiConfig, OpenAiSummarizer};
pub use prompts::{PromptSet, PromptTemplate, PromptVariables};
pub use summarizer::{ChatMessage, Summarizer, SummaryRequest};
