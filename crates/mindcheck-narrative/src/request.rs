//! Chat-completion wire format.

use serde::{Deserialize, Serialize};

use crate::http::NarrativeError;
use crate::template::{PromptContext, PromptTemplate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// One narrative request. Serializes directly as the request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrativeRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl NarrativeRequest {
    /// Render `template` against `ctx` into a request for `model`.
    pub fn from_template(
        model: impl Into<String>,
        template: &PromptTemplate,
        ctx: &PromptContext<'_>,
        max_tokens: u32,
        temperature: Option<f32>,
    ) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = template.system {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(template.render(ctx)));
        Self {
            model: model.into(),
            messages,
            max_tokens,
            temperature,
        }
    }

    /// The rendered user prompt.
    pub fn prompt(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }

    pub fn system(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == "system")
            .map(|m| m.content.as_str())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Pull the first choice's text out of a response body.
pub(crate) fn parse_completion(body: &str) -> Result<String, NarrativeError> {
    let response: ChatResponse = serde_json::from_str(body)?;
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or(NarrativeError::NoChoices)?;
    let text = choice.message.content.unwrap_or_default();
    let text = text.trim();
    if text.is_empty() {
        return Err(NarrativeError::EmptyContent);
    }
    Ok(text.to_string())
}
