//! # Stages Module
//!
//! The three steps of the pipeline. Each stage reads the fields it needs from
//! the shared [`PipelineState`], calls one collaborator, and returns a
//! [`StateUpdate`]. Stages never see each other; the orchestrator wires them.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::error::PipelineError;
use crate::llm::ModelClient;
use crate::prompt::PromptTemplate;
use crate::prompts;
use crate::state::{PipelineState, StateField, StateUpdate};
use crate::tools::SearchTool;

/// One step of the pipeline: a function from state to a partial update.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stable name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Fields the stage reads.
    fn reads(&self) -> &'static [StateField];

    /// Field the stage writes.
    fn writes(&self) -> StateField;

    async fn run(&self, state: &PipelineState) -> Result<StateUpdate, PipelineError>;
}

// =============================================================================
// RESEARCHER
// =============================================================================
/// Searches the web for the topic and records the raw result text.
pub struct Researcher {
    search: Arc<dyn SearchTool>,
}

impl Researcher {
    pub const NAME: &'static str = "researcher";

    pub fn new(search: Arc<dyn SearchTool>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl Stage for Researcher {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn reads(&self) -> &'static [StateField] {
        &[StateField::Topic]
    }

    fn writes(&self) -> StateField {
        StateField::Finding
    }

    async fn run(&self, state: &PipelineState) -> Result<StateUpdate, PipelineError> {
        let topic = state.require(Self::NAME, StateField::Topic)?;

        let finding = self.search.search(topic).await?;
        if finding.trim().is_empty() {
            return Err(PipelineError::upstream(
                "search",
                format!("empty result for '{}'", topic),
            ));
        }

        info!(stage = Self::NAME, chars = finding.len(), "Research gathered");
        Ok(StateUpdate::finding(finding))
    }
}

// =============================================================================
// CRITICAL THINKER
// =============================================================================
/// Consolidates the raw finding into a deduplicated analysis.
pub struct CriticalThinker {
    model: Arc<dyn ModelClient>,
    template: PromptTemplate,
}

impl CriticalThinker {
    pub const NAME: &'static str = "critical_thinker";

    pub fn new(model: Arc<dyn ModelClient>) -> Result<Self, PipelineError> {
        Ok(Self {
            model,
            template: prompts::critical_thinker_template()?,
        })
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }
}

#[async_trait]
impl Stage for CriticalThinker {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn reads(&self) -> &'static [StateField] {
        &[StateField::Topic, StateField::Finding]
    }

    fn writes(&self) -> StateField {
        StateField::Analysis
    }

    async fn run(&self, state: &PipelineState) -> Result<StateUpdate, PipelineError> {
        let topic = state.require(Self::NAME, StateField::Topic)?;
        let finding = state.require(Self::NAME, StateField::Finding)?;

        let prompt = self
            .template
            .render(&[("topic", topic), ("finding", finding)])?;
        let analysis = self.model.generate(&prompt).await?;

        info!(
            stage = Self::NAME,
            model = %self.model.model_name(),
            chars = analysis.len(),
            "Analysis produced"
        );
        Ok(StateUpdate::analysis(analysis))
    }
}

// =============================================================================
// WRITER
// =============================================================================
/// Turns the analysis into the final Markdown article.
pub struct Writer {
    model: Arc<dyn ModelClient>,
    template: PromptTemplate,
}

impl Writer {
    pub const NAME: &'static str = "writer";

    pub fn new(model: Arc<dyn ModelClient>) -> Result<Self, PipelineError> {
        Ok(Self {
            model,
            template: prompts::writer_template()?,
        })
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }
}

#[async_trait]
impl Stage for Writer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn reads(&self) -> &'static [StateField] {
        &[StateField::Topic, StateField::Analysis]
    }

    fn writes(&self) -> StateField {
        StateField::Script
    }

    async fn run(&self, state: &PipelineState) -> Result<StateUpdate, PipelineError> {
        let topic = state.require(Self::NAME, StateField::Topic)?;
        let analysis = state.require(Self::NAME, StateField::Analysis)?;

        let prompt = self
            .template
            .render(&[("topic", topic), ("analysis", analysis)])?;
        let script = self.model.generate(&prompt).await?;

        info!(
            stage = Self::NAME,
            model = %self.model.model_name(),
            words = script.split_whitespace().count(),
            "Script written"
        );
        Ok(StateUpdate::script(script))
    }
}
