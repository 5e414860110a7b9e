//! # State Module
//!
//! The record threaded through every stage of the pipeline.
//!
//! Fields fill up strictly in pipeline order: `topic` at invocation, then
//! `finding`, `analysis` and `script`. Stages never mutate the state
//! directly; they return a [`StateUpdate`] that the orchestrator merges.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PipelineError;

/// Names of the fields held by [`PipelineState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateField {
    Topic,
    Finding,
    Analysis,
    Script,
}

impl StateField {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateField::Topic => "topic",
            StateField::Finding => "finding",
            StateField::Analysis => "analysis",
            StateField::Script => "script",
        }
    }
}

impl fmt::Display for StateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A partial update produced by one stage.
///
/// Only the fields set to `Some` are written when merged; everything else
/// in the running state is left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateUpdate {
    pub finding: Option<String>,
    pub analysis: Option<String>,
    pub script: Option<String>,
}

impl StateUpdate {
    pub fn finding(text: impl Into<String>) -> Self {
        Self {
            finding: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn analysis(text: impl Into<String>) -> Self {
        Self {
            analysis: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn script(text: impl Into<String>) -> Self {
        Self {
            script: Some(text.into()),
            ..Self::default()
        }
    }

    /// Fields this update writes, in pipeline order.
    pub fn fields(&self) -> Vec<StateField> {
        let mut fields = Vec::new();
        if self.finding.is_some() {
            fields.push(StateField::Finding);
        }
        if self.analysis.is_some() {
            fields.push(StateField::Analysis);
        }
        if self.script.is_some() {
            fields.push(StateField::Script);
        }
        fields
    }
}

/// The running state of a single pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineState {
    topic: String,
    finding: Option<String>,
    analysis: Option<String>,
    script: Option<String>,
}

impl PipelineState {
    /// Fresh state with only the topic set.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            finding: None,
            analysis: None,
            script: None,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Read a field, or `None` if it has not been populated yet.
    pub fn get(&self, field: StateField) -> Option<&str> {
        match field {
            StateField::Topic => Some(self.topic.as_str()),
            StateField::Finding => self.finding.as_deref(),
            StateField::Analysis => self.analysis.as_deref(),
            StateField::Script => self.script.as_deref(),
        }
    }

    /// Read a field a stage depends on.
    ///
    /// Unset and blank fields are both reported as missing, so a stage never
    /// builds a prompt around an empty input.
    pub fn require(&self, stage: &'static str, field: StateField) -> Result<&str, PipelineError> {
        match self.get(field) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(PipelineError::MissingInput { stage, field }),
        }
    }

    /// Merge a partial update by key, last write wins.
    pub fn merge(&mut self, update: StateUpdate) {
        if let Some(finding) = update.finding {
            self.finding = Some(finding);
        }
        if let Some(analysis) = update.analysis {
            self.analysis = Some(analysis);
        }
        if let Some(script) = update.script {
            self.script = Some(script);
        }
    }

    /// Convert a completed state into the caller-facing result.
    pub fn into_output(self) -> Result<PipelineOutput, PipelineError> {
        let finding = self.finding.ok_or(PipelineError::MissingInput {
            stage: "output",
            field: StateField::Finding,
        })?;
        let analysis = self.analysis.ok_or(PipelineError::MissingInput {
            stage: "output",
            field: StateField::Analysis,
        })?;
        let script = self.script.ok_or(PipelineError::MissingInput {
            stage: "output",
            field: StateField::Script,
        })?;

        Ok(PipelineOutput {
            topic: self.topic,
            finding,
            analysis,
            script,
        })
    }
}

/// The final state handed back to the caller once every stage has run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub topic: String,
    pub finding: String,
    pub analysis: String,
    pub script: String,
}
