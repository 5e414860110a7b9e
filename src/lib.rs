//! # Content Pipeline
//!
//! A three-stage content generator built with the Rig framework:
//!
//! 1. **Researcher** - searches the web for a topic
//! 2. **Critical Thinker** - consolidates and deduplicates the findings with an LLM
//! 3. **Writer** - renders a Markdown article from the analysis with an LLM
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use content_pipeline::{Config, Pipeline, RigModelClient, WebSearchTool};
//!
//! let config = Config::from_env()?;
//! config.validate()?;
//!
//! let search = Arc::new(WebSearchTool::new(config.max_search_results)?);
//! let model = Arc::new(RigModelClient::from_config(&config)?);
//! let pipeline = Pipeline::new(search, model)?;
//!
//! let output = pipeline.invoke("history of tea").await?;
//! println!("{}", output.script);
//! ```

/// Configuration management
pub mod config;

/// Error taxonomy
pub mod error;

/// Model client seam and Rig-backed implementation
pub mod llm;

/// Orchestrator
pub mod pipeline;

/// Prompt templates with declared placeholders
pub mod prompt;

/// Fixed prompt texts
pub mod prompts;

/// Researcher, critical thinker and writer stages
pub mod stages;

/// Pipeline state and partial updates
pub mod state;

/// Web search
pub mod tools;

pub use config::{Config, ModelProvider};
pub use error::PipelineError;
pub use llm::{ModelClient, RigModelClient};
pub use pipeline::Pipeline;
pub use prompt::{ChatMessage, PromptTemplate, RenderedPrompt, Role};
pub use stages::{CriticalThinker, Researcher, Stage, Writer};
pub use state::{PipelineOutput, PipelineState, StateField, StateUpdate};
pub use tools::{SearchError, SearchTool, WebSearchTool};
