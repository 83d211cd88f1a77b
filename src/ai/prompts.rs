//! YAML prompt templates for the three summary kinds.
//!
//! Templates are embedded at build time. A prompts directory can override any
//! of them with a `{name}.prompt.yml` file of the same shape.

use std::collections::BTreeMap;

use camino::Utf8Path;
use serde::Deserialize;
use tracing::debug;

use super::summarizer::{ChatMessage, SummaryRequest};
use crate::error::RepomonError;

const OVERALL_SOURCE: &str = include_str!("../../prompts/overall_summary.prompt.yml");
const BRANCH_SOURCE: &str = include_str!("../../prompts/branch_summary.prompt.yml");
const PULL_REQUEST_SOURCE: &str = include_str!("../../prompts/pr_summary.prompt.yml");

/// Named substitution values for a prompt.
pub type PromptVariables = BTreeMap<&'static str, String>;

/// Sampling parameters declared by a prompt.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ModelParameters {
    /// Sampling temperature.
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Nucleus sampling cut-off.
    #[serde(default, rename = "topP")]
    pub top_p: Option<f64>,
}

/// A prompt as loaded from YAML.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PromptTemplate {
    /// Prompt identifier.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Model the prompt was written for.
    #[serde(default)]
    pub model: String,
    /// Sampling parameters.
    #[serde(default, rename = "modelParameters")]
    pub model_parameters: ModelParameters,
    /// Messages with `{{name}}` placeholders.
    pub messages: Vec<ChatMessage>,
}

impl PromptTemplate {
    /// Parses a YAML prompt.
    ///
    /// # Errors
    ///
    /// Returns [`RepomonError::Template`] when the YAML does not describe a
    /// prompt.
    pub fn parse(source: &str) -> Result<Self, RepomonError> {
        serde_yaml::from_str(source).map_err(|error| RepomonError::Template {
            message: format!("failed to parse prompt YAML: {error}"),
        })
    }

    /// Substitutes every placeholder and returns the request to send.
    ///
    /// Substituted values are not scanned again, so a value containing
    /// `{{` is passed through untouched.
    ///
    /// # Errors
    ///
    /// Returns [`RepomonError::Template`] naming the first placeholder
    /// missing from `variables`.
    pub fn render(&self, variables: &PromptVariables) -> Result<SummaryRequest, RepomonError> {
        let messages = self
            .messages
            .iter()
            .map(|message| {
                substitute(&message.content, variables)
                    .map(|content| ChatMessage::new(message.role.as_str(), content))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SummaryRequest {
            messages,
            temperature: self.model_parameters.temperature,
        })
    }
}

fn substitute(template: &str, variables: &PromptVariables) -> Result<String, RepomonError> {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some((before, opened)) = rest.split_once("{{") {
        output.push_str(before);
        let Some((placeholder, after)) = opened.split_once("}}") else {
            output.push_str("{{");
            output.push_str(opened);
            return Ok(output);
        };
        let key = placeholder.trim();
        let Some(value) = variables.get(key) else {
            return Err(RepomonError::Template {
                message: format!("missing variable in vars map: {{{{{key}}}}}"),
            });
        };
        output.push_str(value);
        rest = after;
    }

    output.push_str(rest);
    Ok(output)
}

/// The overall, branch and pull request prompts used by one run.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSet {
    /// `overall_summary`.
    pub overall: PromptTemplate,
    /// `branch_summary`.
    pub branch: PromptTemplate,
    /// `pr_summary`.
    pub pull_request: PromptTemplate,
}

impl PromptSet {
    /// The prompts compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns [`RepomonError::Template`] if an embedded prompt is malformed.
    pub fn embedded() -> Result<Self, RepomonError> {
        Self::load(None)
    }

    /// Embedded prompts, each replaced by `{dir}/{name}.prompt.yml` when that
    /// file exists.
    ///
    /// # Errors
    ///
    /// Returns [`RepomonError::Io`] when an override cannot be read and
    /// [`RepomonError::Template`] when a prompt is malformed.
    pub fn load(prompts_dir: Option<&Utf8Path>) -> Result<Self, RepomonError> {
        Ok(Self {
            overall: load_prompt("overall_summary", OVERALL_SOURCE, prompts_dir)?,
            branch: load_prompt("branch_summary", BRANCH_SOURCE, prompts_dir)?,
            pull_request: load_prompt("pr_summary", PULL_REQUEST_SOURCE, prompts_dir)?,
        })
    }
}

fn load_prompt(
    name: &str,
    embedded: &str,
    prompts_dir: Option<&Utf8Path>,
) -> Result<PromptTemplate, RepomonError> {
    let Some(path) = prompts_dir
        .map(|dir| dir.join(format!("{name}.prompt.yml")))
        .filter(|candidate| candidate.is_file())
    else {
        return PromptTemplate::parse(embedded);
    };

    debug!(%path, "loading prompt override");
    let source = std::fs::read_to_string(&path).map_err(|error| RepomonError::Io {
        message: format!("failed to read prompt {path}: {error}"),
    })?;
    PromptTemplate::parse(&source)
}

#[cfg(test)]
#[path = "prompts_tests.rs"]
mod tests;
