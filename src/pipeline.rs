//! # Pipeline Module
//!
//! The orchestrator. A pipeline is an ordered list of stages applied one
//! after another to a fresh [`PipelineState`]:
//!
//! ```text
//! START -> researcher -> critical_thinker -> writer -> END
//! ```
//!
//! Each stage is awaited to completion and its update merged before the next
//! one starts. The first error stops the run and is returned as-is; there is
//! no partial result.
//!
//! Stage order is checked when the pipeline is built: every field a stage
//! reads must be the topic or written by an earlier stage.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, Instrument};

use crate::error::PipelineError;
use crate::llm::ModelClient;
use crate::state::{PipelineOutput, PipelineState, StateField};
use crate::stages::{CriticalThinker, Researcher, Stage, Writer};
use crate::tools::SearchTool;

pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// The standard research -> critical thinking -> writing pipeline.
    ///
    /// The collaborators are built once by the caller and shared by every
    /// invocation.
    pub fn new(
        search: Arc<dyn SearchTool>,
        model: Arc<dyn ModelClient>,
    ) -> Result<Self, PipelineError> {
        Self::from_stages(vec![
            Box::new(Researcher::new(search)),
            Box::new(CriticalThinker::new(model.clone())?),
            Box::new(Writer::new(model)?),
        ])
    }

    /// Build a pipeline from stages in execution order.
    ///
    /// Fails with [`PipelineError::MissingInput`] when a stage reads a field
    /// that no earlier stage writes.
    pub fn from_stages(stages: Vec<Box<dyn Stage>>) -> Result<Self, PipelineError> {
        let mut available = HashSet::from([StateField::Topic]);

        for stage in &stages {
            if let Some(&field) = stage.reads().iter().find(|f| !available.contains(*f)) {
                return Err(PipelineError::MissingInput {
                    stage: stage.name(),
                    field,
                });
            }
            available.insert(stage.writes());
        }

        Ok(Self { stages })
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage for `topic` and return the completed state.
    pub async fn invoke(&self, topic: &str) -> Result<PipelineOutput, PipelineError> {
        let started = Instant::now();
        info!(topic = %topic, stages = self.stages.len(), "Pipeline started");

        let mut state = PipelineState::new(topic);

        for stage in &self.stages {
            let span = info_span!("stage", name = stage.name());
            let stage_started = Instant::now();

            let update = stage.run(&state).instrument(span).await?;

            let written = update.fields();
            if written != [stage.writes()] {
                return Err(PipelineError::StageContract {
                    stage: stage.name(),
                    reason: format!("declared '{}' but wrote {:?}", stage.writes(), written),
                });
            }
            state.merge(update);

            info!(
                stage = stage.name(),
                writes = %stage.writes(),
                elapsed_ms = stage_started.elapsed().as_millis() as u64,
                "Stage completed"
            );
        }

        let output = state.into_output()?;
        info!(
            topic = %output.topic,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Pipeline finished"
        );
        Ok(output)
    }
}
