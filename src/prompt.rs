//! # Prompt Template Module
//!
//! Structured chat prompts with named placeholders.
//!
//! A template is a list of role-tagged messages whose bodies may contain
//! `{name}` placeholders. Literal braces are written `{{` and `}}`. The set of
//! placeholders is parsed once, when the template is built, and every render
//! checks the supplied variable names against it: a missing, unknown or
//! repeated name is a [`PipelineError::TemplateBinding`] instead of a prompt
//! with a dangling `{finding}` in it.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::PipelineError;

/// Who a chat message is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    Human,
}

/// One finalized, role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// The output of [`PromptTemplate::render`]: an ordered list of messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    messages: Vec<ChatMessage>,
}

impl RenderedPrompt {
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// All system messages joined by a blank line, if there are any.
    pub fn system(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }

    /// All human messages joined by a blank line.
    pub fn human(&self) -> String {
        self.messages
            .iter()
            .filter(|m| m.role == Role::Human)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Placeholder(String),
}

#[derive(Debug, Clone)]
struct MessageTemplate {
    role: Role,
    segments: Vec<Segment>,
}

/// A chat prompt skeleton with declared placeholders.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    name: String,
    messages: Vec<MessageTemplate>,
    placeholders: BTreeSet<String>,
}

impl PromptTemplate {
    /// Build the usual system + human pair.
    pub fn new(name: impl Into<String>, system: &str, human: &str) -> Result<Self, PipelineError> {
        Self::from_messages(name, &[(Role::System, system), (Role::Human, human)])
    }

    /// Build a template from any sequence of role-tagged bodies.
    pub fn from_messages(
        name: impl Into<String>,
        messages: &[(Role, &str)],
    ) -> Result<Self, PipelineError> {
        let name = name.into();
        let mut placeholders = BTreeSet::new();
        let mut parsed = Vec::with_capacity(messages.len());

        for (role, body) in messages {
            let segments = parse_segments(body).map_err(|reason| PipelineError::TemplateSyntax {
                template: name.clone(),
                reason,
            })?;
            for segment in &segments {
                if let Segment::Placeholder(key) = segment {
                    placeholders.insert(key.clone());
                }
            }
            parsed.push(MessageTemplate {
                role: *role,
                segments,
            });
        }

        Ok(Self {
            name,
            messages: parsed,
            placeholders,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared placeholder names, sorted.
    pub fn placeholders(&self) -> &BTreeSet<String> {
        &self.placeholders
    }

    /// Render every message against `variables`.
    ///
    /// The supplied names must match the declared placeholders exactly, each
    /// one bound once.
    pub fn render(&self, variables: &[(&str, &str)]) -> Result<RenderedPrompt, PipelineError> {
        let mut bound: BTreeMap<&str, &str> = BTreeMap::new();
        let mut duplicate: BTreeSet<String> = BTreeSet::new();
        for &(key, value) in variables {
            if bound.insert(key, value).is_some() {
                duplicate.insert(key.to_string());
            }
        }

        let missing: Vec<String> = self
            .placeholders
            .iter()
            .filter(|key| !bound.contains_key(key.as_str()))
            .cloned()
            .collect();
        let unexpected: Vec<String> = bound
            .keys()
            .filter(|key| !self.placeholders.contains(**key))
            .map(|key| key.to_string())
            .collect();

        if !missing.is_empty() || !unexpected.is_empty() || !duplicate.is_empty() {
            return Err(PipelineError::TemplateBinding {
                template: self.name.clone(),
                missing,
                unexpected,
                duplicate: duplicate.into_iter().collect(),
            });
        }

        let messages = self
            .messages
            .iter()
            .map(|message| {
                let mut content = String::new();
                for segment in &message.segments {
                    match segment {
                        Segment::Text(text) => content.push_str(text),
                        // Presence was checked above.
                        Segment::Placeholder(key) => {
                            content.push_str(bound.get(key.as_str()).copied().unwrap_or_default())
                        }
                    }
                }
                ChatMessage {
                    role: message.role,
                    content,
                }
            })
            .collect();

        Ok(RenderedPrompt { messages })
    }
}

/// Split a template body into literal text and placeholders.
fn parse_segments(body: &str) -> Result<Vec<Segment>, String> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut chars = body.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    text.push('{');
                    continue;
                }

                let mut key = String::new();
                let mut closed = false;
                for (_, k) in chars.by_ref() {
                    if k == '}' {
                        closed = true;
                        break;
                    }
                    key.push(k);
                }

                if !closed {
                    return Err(format!("unclosed '{{' at byte {}", pos));
                }
                if key.is_empty() || !key.chars().all(|k| k.is_ascii_alphanumeric() || k == '_') {
                    return Err(format!("invalid placeholder name '{}' at byte {}", key, pos));
                }

                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                segments.push(Segment::Placeholder(key));
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    text.push('}');
                } else {
                    return Err(format!("unmatched '}}' at byte {}", pos));
                }
            }
            _ => text.push(c),
        }
    }

    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PromptTemplate {
        PromptTemplate::new(
            "sample",
            "You are a careful analyst.",
            "Topic: {topic}\nFindings: {finding}",
        )
        .unwrap()
    }

    #[test]
    fn test_placeholders_are_declared() {
        let template = sample();
        let names: Vec<&str> = template.placeholders().iter().map(String::as_str).collect();
        assert_eq!(names, vec!["finding", "topic"]);
    }

    #[test]
    fn test_render_interpolates_values() {
        let prompt = sample()
            .render(&[("topic", "tea"), ("finding", "tea is old")])
            .unwrap();

        assert_eq!(prompt.messages().len(), 2);
        assert_eq!(prompt.messages()[0].role, Role::System);
        assert_eq!(prompt.system().as_deref(), Some("You are a careful analyst."));
        assert_eq!(prompt.human(), "Topic: tea\nFindings: tea is old");
    }

    #[test]
    fn test_render_is_idempotent() {
        let template = sample();
        let vars = [("topic", "tea"), ("finding", "tea is old")];
        assert_eq!(template.render(&vars).unwrap(), template.render(&vars).unwrap());
    }

    #[test]
    fn test_mismatched_names_are_rejected() {
        let err = sample()
            .render(&[("topic", "tea"), ("search_result", "tea is old")])
            .unwrap_err();

        match err {
            PipelineError::TemplateBinding {
                template,
                missing,
                unexpected,
                duplicate,
            } => {
                assert_eq!(template, "sample");
                assert_eq!(missing, vec!["finding".to_string()]);
                assert_eq!(unexpected, vec!["search_result".to_string()]);
                assert!(duplicate.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let err = sample()
            .render(&[("topic", "tea"), ("finding", "old"), ("topic", "coffee")])
            .unwrap_err();

        match err {
            PipelineError::TemplateBinding {
                missing,
                unexpected,
                duplicate,
                ..
            } => {
                assert!(missing.is_empty());
                assert!(unexpected.is_empty());
                assert_eq!(duplicate, vec!["topic".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_values_are_not_reparsed() {
        let prompt = sample()
            .render(&[("topic", "{finding}"), ("finding", "}{")])
            .unwrap();
        assert_eq!(prompt.human(), "Topic: {finding}\nFindings: }{");
    }

    #[test]
    fn test_escaped_braces() {
        let template = PromptTemplate::new("json", "Reply as {{\"k\": 1}}", "{topic}").unwrap();
        assert_eq!(template.placeholders().len(), 1);
        let prompt = template.render(&[("topic", "tea")]).unwrap();
        assert_eq!(prompt.system().as_deref(), Some("Reply as {\"k\": 1}"));
    }

    #[test]
    fn test_malformed_templates() {
        assert!(matches!(
            PromptTemplate::new("bad", "{topic", "x"),
            Err(PipelineError::TemplateSyntax { .. })
        ));
        assert!(matches!(
            PromptTemplate::new("bad", "x", "topic}"),
            Err(PipelineError::TemplateSyntax { .. })
        ));
        assert!(matches!(
            PromptTemplate::new("bad", "x", "{}"),
            Err(PipelineError::TemplateSyntax { .. })
        ));
        assert!(matches!(
            PromptTemplate::new("bad", "x", "{two words}"),
            Err(PipelineError::TemplateSyntax { .. })
        ));
    }

    #[test]
    fn test_template_without_system_message() {
        let template = PromptTemplate::from_messages("solo", &[(Role::Human, "hi {who}")]).unwrap();
        let prompt = template.render(&[("who", "there")]).unwrap();
        assert!(prompt.system().is_none());
        assert_eq!(prompt.human(), "hi there");
    }
}
