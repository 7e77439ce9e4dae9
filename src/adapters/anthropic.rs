//! Anthropic Messages API adapter for query rewrites.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::QueryRewriter;
use crate::citation::Citation;
use crate::config::RewriteSettings;

const API_VERSION: &str = "2023-06-01";

/// Query rewriter backed by the Messages API
pub struct AnthropicRewriter {
    api_key: String,
    model: String,
    max_tokens: u32,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl AnthropicRewriter {
    /// Create a rewriter from resolved settings; the API key is required
    pub fn from_settings(settings: &RewriteSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .context("ANTHROPIC_API_KEY not set in environment")?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            api_key,
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }
}

/// System prompt listing the citations the rewrite must stay grounded in
pub fn system_prompt(citations: &[Citation]) -> String {
    let context = citations
        .iter()
        .enumerate()
        .map(|(i, c)| format!("[Citation {}] ({}): \"{}\"", i + 1, c.doc_id, c.citation_text))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are rewriting a synthetic Q&A query for evaluation purposes. The query is part of a RAG \
         evaluation dataset. Your job is to rewrite it according to the user's instruction while \
         keeping it grounded in the provided citations.\n\n\
         Here are the citations this query is based on:\n{}\n\n\
         Return ONLY the rewritten query, nothing else. No quotes, no explanation.",
        context
    )
}

/// User turn carrying the query and the instruction
pub fn user_message(query: &str, instruction: &str) -> String {
    format!("Original query: \"{}\"\n\nInstruction: {}", query, instruction)
}

#[async_trait]
impl QueryRewriter for AnthropicRewriter {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn rewrite(&self, query: &str, instruction: &str, citations: &[Citation]) -> Result<String> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: system_prompt(citations),
            messages: vec![Message {
                role: "user",
                content: user_message(query, instruction),
            }],
        };

        info!(model = %self.model, citations = citations.len(), "Requesting query rewrite");

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .context("Failed to send rewrite request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            anyhow::bail!("Rewrite API error ({}): {}", status, message);
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .context("Failed to parse rewrite response")?;

        Ok(first_text(&parsed))
    }
}

fn first_text(response: &MessagesResponse) -> String {
    response
        .content
        .first()
        .filter(|block| block.kind == "text")
        .and_then(|block| block.text.as_deref())
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(api_key: Option<&str>) -> RewriteSettings {
        RewriteSettings {
            api_key: api_key.map(str::to_string),
            base_url: "https://api.example.test/".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_requires_api_key() {
        assert!(AnthropicRewriter::from_settings(&settings(None)).is_err());
        assert!(AnthropicRewriter::from_settings(&settings(Some(""))).is_err());
    }

    #[test]
    fn test_messages_url() {
        let rewriter = AnthropicRewriter::from_settings(&settings(Some("key"))).unwrap();
        assert_eq!(rewriter.messages_url(), "https://api.example.test/v1/messages");
        assert_eq!(rewriter.name(), "anthropic");
    }

    #[test]
    fn test_system_prompt_lists_citations() {
        let citations = vec![
            Citation {
                doc_id: "refunds".to_string(),
                span_start: 0,
                span_end: 7,
                citation_text: "30 days".to_string(),
                chunks: Vec::new(),
            },
            Citation {
                doc_id: "faq".to_string(),
                span_start: 3,
                span_end: 9,
                citation_text: "receipt".to_string(),
                chunks: Vec::new(),
            },
        ];

        let prompt = system_prompt(&citations);
        assert!(prompt.contains("[Citation 1] (refunds): \"30 days\"\n[Citation 2] (faq): \"receipt\""));
        assert!(prompt.ends_with("No quotes, no explanation."));
    }

    #[test]
    fn test_user_message() {
        assert_eq!(
            user_message("How long?", "Make it formal"),
            "Original query: \"How long?\"\n\nInstruction: Make it formal"
        );
    }

    #[test]
    fn test_first_text_block_is_trimmed() {
        let response: MessagesResponse = serde_json::from_str(
            r#"{"content": [{"type": "text", "text": "  What is the refund period?\n"}]}"#,
        )
        .unwrap();
        assert_eq!(first_text(&response), "What is the refund period?");

        let response: MessagesResponse =
            serde_json::from_str(r#"{"content": [{"type": "tool_use", "id": "x"}]}"#).unwrap();
        assert_eq!(first_text(&response), "");
    }
}
