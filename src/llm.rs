// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Chat-completions client for OpenAI-compatible providers

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::organizer::OrganizationProposal;
use crate::{NotewiseError, Result};

/// Number of known tags offered to the model
const MAX_PROMPT_TAGS: usize = 20;

const DEFAULT_PROMPT: &str = "You organize notes in a personal knowledge base.\n\
Read the note supplied by the user and suggest:\n\
- title: a short, descriptive title without file extension\n\
- path: the best existing folder for the note, chosen from: {{folders}}\n\
- tags: up to five lowercase tags, preferring existing ones: {{tags}}\n\
\n\
The note is currently titled \"{{currentTitle}}\" and lives in \"{{currentPath}}\".\n\
Answer with a single JSON object of the form \
{\"title\": \"...\", \"path\": \"...\", \"tags\": [\"...\"]} and nothing else.";

/// Everything the prompt is built from
#[derive(Debug, Clone, Default)]
pub struct NoteContext {
    pub content: String,
    pub current_title: String,
    pub current_path: String,
    /// Destination folders that survived filtering
    pub folders: Vec<String>,
    pub tags: Vec<String>,
}

/// Fill a prompt template from the note context.
///
/// An empty template selects the built-in prompt.
pub fn build_prompt(template: &str, context: &NoteContext) -> String {
    let template = if template.trim().is_empty() {
        DEFAULT_PROMPT
    } else {
        template
    };

    let folders = context
        .folders
        .iter()
        .filter(|f| f.as_str() != "/")
        .map(|f| f.trim_start_matches('/'))
        .collect::<Vec<_>>()
        .join(", ");

    let tags = context
        .tags
        .iter()
        .take(MAX_PROMPT_TAGS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    template
        .replace("{{folders}}", if folders.is_empty() { "(none)" } else { &folders })
        .replace("{{tags}}", if tags.is_empty() { "(none)" } else { &tags })
        .replace("{{currentTitle}}", &context.current_title)
        .replace("{{currentPath}}", &context.current_path)
}

/// Extract and validate a proposal from free-form model output
pub fn parse_proposal(text: &str) -> Result<OrganizationProposal> {
    let start = text.find('{');
    let end = text.rfind('}');
    let json = match (start, end) {
        (Some(s), Some(e)) if s < e => &text[s..=e],
        _ => {
            return Err(NotewiseError::MalformedProposal(
                "no JSON object found in response".to_string(),
            ))
        }
    };

    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| NotewiseError::MalformedProposal(format!("invalid JSON: {}", e)))?;

    OrganizationProposal::from_value(&value)
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Client for one configured provider
pub struct LlmClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl LlmClient {
    pub fn new(provider: &ProviderConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        // Normalize URL
        let base_url = provider
            .base_url
            .trim_end_matches('/')
            .trim_end_matches("/chat/completions")
            .to_string();

        Ok(Self {
            client,
            base_url,
            api_key: provider.api_key.clone(),
            model: provider.model_name.clone(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Send the note with `prompt` as system message and return the raw reply
    pub async fn complete(&self, prompt: &str, content: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: prompt },
                ChatMessage { role: "user", content },
            ],
            temperature: 0.3,
            stream: false,
        };

        debug!("Sending request to {}: model={}", self.base_url, self.model);

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotewiseError::Provider(format!(
                "API request failed with status {}",
                response.status()
            )));
        }

        let result: ChatResponse = response.json().await?;
        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| NotewiseError::Provider("response contained no choices".to_string()))
    }

    /// Ask for a proposal for the note in `context`
    pub async fn organize(&self, context: &NoteContext, prompt: &str) -> Result<OrganizationProposal> {
        let reply = self.complete(prompt, &context.content).await?;
        debug!("Model reply: {}", reply);
        parse_proposal(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> NoteContext {
        NoteContext {
            content: "body".to_string(),
            current_title: "Untitled".to_string(),
            current_path: "Inbox".to_string(),
            folders: vec!["/".to_string(), "Inbox".to_string(), "Projects/Research".to_string()],
            tags: (0..30).map(|i| format!("t{}", i)).collect(),
        }
    }

    #[test]
    fn test_build_prompt_substitutes_placeholders() {
        let prompt = build_prompt(
            "F={{folders}} T={{tags}} C={{currentTitle}} P={{currentPath}} again {{currentTitle}}",
            &context(),
        );
        assert!(prompt.starts_with("F=Inbox, Projects/Research T=t0, t1,"));
        assert!(prompt.contains("t19 C=Untitled P=Inbox again Untitled"));
        assert!(!prompt.contains("t20"));
    }

    #[test]
    fn test_build_prompt_defaults() {
        let prompt = build_prompt("", &NoteContext::default());
        assert!(prompt.contains("chosen from: (none)"));
        assert!(prompt.contains("existing ones: (none)"));
    }

    #[test]
    fn test_parse_proposal_from_chatty_output() {
        let text = "Sure! Here you go:\n```json\n{\"title\": \"Plan\", \"path\": \"Work\", \"tags\": [\"q3\"]}\n```\nHope that helps.";
        let proposal = parse_proposal(text).unwrap();
        assert_eq!(proposal.title, "Plan");
        assert_eq!(proposal.path, "Work");
        assert_eq!(proposal.tags, vec!["q3"]);
    }

    #[test]
    fn test_parse_proposal_errors() {
        assert!(matches!(parse_proposal("no json here"), Err(NotewiseError::MalformedProposal(_))));
        assert!(matches!(parse_proposal("{not json}"), Err(NotewiseError::MalformedProposal(_))));
        assert!(matches!(
            parse_proposal("{\"tags\": \"single\"}"),
            Err(NotewiseError::MalformedProposal(_))
        ));
    }

    #[test]
    fn test_endpoint_normalization() {
        let provider = ProviderConfig {
            api_key: "k".to_string(),
            model_name: "m".to_string(),
            base_url: "https://api.example.com/v1/chat/completions/".to_string(),
        };
        let client = LlmClient::new(&provider, Duration::from_secs(5)).unwrap();
        assert_eq!(client.endpoint(), "https://api.example.com/v1/chat/completions");
    }
}
