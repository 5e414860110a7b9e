//! # Prompts Module
//!
//! Fixed instructions for the two model-backed stages. Human messages carry
//! the placeholders; system messages are plain text.

use crate::error::PipelineError;
use crate::prompt::PromptTemplate;

/// System instruction for the critical thinker.
pub const CRITICAL_THINKER_SYSTEM: &str = r#"You are an expert critical thinker and research analyst.

You receive raw findings gathered from a web search. They are often noisy:
the same fact repeated across sources, sources that disagree with each other,
and material that is only loosely related to the topic.

Your job:
1. Resolve conflicts. Where sources disagree, say so and prefer the claim that
   is better supported; never silently pick one.
2. Remove redundancy. State each fact once.
3. Drop anything that is not relevant to the topic.
4. Produce a consolidated, accurate analysis organised by theme.

Do not add facts that are not present in the findings."#;

/// Human message for the critical thinker.
pub const CRITICAL_THINKER_HUMAN: &str = r#"Topic: {topic}

Research findings:
{finding}

Write the consolidated analysis of these findings."#;

/// System instruction for the writer.
pub const WRITER_SYSTEM: &str = r#"You are a versatile professional writer who adapts voice to subject matter.

PERSONA SELECTION
Before writing, decide which persona fits the topic's domain and keep it for
the whole piece:
- Travel and places: adventurous, vivid, sensory.
- Science and technology: precise, clear, explanatory.
- History and culture: narrative, evocative, grounded in chronology.
- Business and finance: crisp, pragmatic, outcome-focused.
- Health and lifestyle: warm, practical, reassuring.
For any other domain choose the tone a respected publication in that field
would use.

FORMAT
- Output Markdown only.
- Start with a Title as a top-level heading (# Title).
- Follow with a short Introduction paragraph.
- Organise the body under descriptive subheadings (## Subheading).
- Aim for 300 to 500 words in total.

GROUNDING
Use only the information in the supplied analysis. Do not introduce facts,
figures, names or dates that the analysis does not contain. If the analysis is
thin on a point, write less about it rather than inventing detail."#;

/// Human message for the writer.
pub const WRITER_HUMAN: &str = r#"Topic: {topic}

Analysis:
{analysis}

Write the article."#;

/// Template used by the critical thinker stage.
pub fn critical_thinker_template() -> Result<PromptTemplate, PipelineError> {
    PromptTemplate::new("critical_thinker", CRITICAL_THINKER_SYSTEM, CRITICAL_THINKER_HUMAN)
}

/// Template used by the writer stage.
pub fn writer_template() -> Result<PromptTemplate, PipelineError> {
    PromptTemplate::new("writer", WRITER_SYSTEM, WRITER_HUMAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(template: &PromptTemplate) -> Vec<&str> {
        template.placeholders().iter().map(String::as_str).collect()
    }

    #[test]
    fn test_critical_thinker_placeholders() {
        let template = critical_thinker_template().unwrap();
        assert_eq!(names(&template), vec!["finding", "topic"]);
    }

    #[test]
    fn test_writer_placeholders() {
        let template = writer_template().unwrap();
        assert_eq!(names(&template), vec!["analysis", "topic"]);
    }

    #[test]
    fn test_writer_system_covers_policy() {
        assert!(WRITER_SYSTEM.contains("adventurous"));
        assert!(WRITER_SYSTEM.contains("precise"));
        assert!(WRITER_SYSTEM.contains("Markdown"));
        assert!(WRITER_SYSTEM.contains("Introduction"));
        assert!(WRITER_SYSTEM.contains("300 to 500 words"));
        assert!(WRITER_SYSTEM.contains("Do not introduce facts"));
    }

    #[test]
    fn test_critical_thinker_system_covers_task() {
        assert!(CRITICAL_THINKER_SYSTEM.contains("critical thinker"));
        assert!(CRITICAL_THINKER_SYSTEM.contains("conflicts"));
        assert!(CRITICAL_THINKER_SYSTEM.contains("redundancy"));
    }
}
