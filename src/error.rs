//! # Error Module
//!
//! The pipeline's error taxonomy. Every stage returns `Result<_, PipelineError>`
//! and the orchestrator propagates the first failure unchanged: nothing here is
//! caught or retried.

use thiserror::Error;

use crate::state::StateField;

/// Errors that abort a pipeline invocation.
///
/// # Rust Concept: Struct Variants
///
/// Enum variants can carry named fields, just like structs. This keeps the
/// context of a failure (which stage, which field) attached to the error
/// instead of flattening it into a string too early.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A stage was invoked before the fields it reads were populated.
    #[error("stage '{stage}' requires '{field}', which is not set")]
    MissingInput {
        stage: &'static str,
        field: StateField,
    },

    /// The variables supplied to a template do not match its placeholders.
    #[error(
        "template '{template}' binding mismatch (missing: [{}], unexpected: [{}], duplicate: [{}])",
        .missing.join(", "),
        .unexpected.join(", "),
        .duplicate.join(", ")
    )]
    TemplateBinding {
        template: String,
        missing: Vec<String>,
        unexpected: Vec<String>,
        duplicate: Vec<String>,
    },

    /// A template body could not be parsed.
    #[error("template '{template}' is malformed: {reason}")]
    TemplateSyntax { template: String, reason: String },

    /// A stage wrote fields other than the one it declares.
    #[error("stage '{stage}' broke its contract: {reason}")]
    StageContract { stage: &'static str, reason: String },

    /// A collaborator could not be built from the supplied configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The search tool or the model client failed.
    #[error("{service} call failed: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },
}

impl PipelineError {
    /// Shorthand for an upstream failure.
    pub fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream {
            service,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_message() {
        let err = PipelineError::MissingInput {
            stage: "critical_thinker",
            field: StateField::Finding,
        };
        assert_eq!(
            err.to_string(),
            "stage 'critical_thinker' requires 'finding', which is not set"
        );
    }

    #[test]
    fn test_template_binding_lists_names() {
        let err = PipelineError::TemplateBinding {
            template: "critical_thinker".to_string(),
            missing: vec!["finding".to_string()],
            unexpected: vec!["search_result".to_string()],
            duplicate: Vec::new(),
        };
        let message = err.to_string();
        assert!(message.contains("missing: [finding]"));
        assert!(message.contains("unexpected: [search_result]"));
        assert!(message.contains("duplicate: []"));
    }

    #[test]
    fn test_upstream_helper() {
        let err = PipelineError::upstream("search", "HTTP 500");
        assert_eq!(err.to_string(), "search call failed: HTTP 500");
    }
}
