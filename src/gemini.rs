//! Gemini API client
//!
//! Implements `AdvisoryService` over the Gemini REST API: constrained JSON
//! generation for advisory requests and server-sent events for chat replies.
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::config::CoachConfig;
use crate::contract::Schema;
use crate::error::CoachError;
use crate::gateway::{AdvisoryService, ChatTurn, ChunkStream};
use crate::models::Sender;
use crate::Result;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use reqwest_eventsource::{Event, EventSource};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info};

/// Reusable Gemini client (connection-pooled)
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &CoachConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.request_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, self.model, method)
    }
}

#[async_trait]
impl AdvisoryService for GeminiClient {
    async fn generate(&self, prompt: &str, schema: &Schema) -> Result<String> {
        let request = GeminiRequest {
            contents: vec![Content::text("user", prompt)],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: schema.to_json(),
            }),
        };

        info!(model = %self.model, "Calling Gemini generateContent");

        let response = self
            .client
            .post(self.endpoint("generateContent"))
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Gemini API request failed: {}", e);
                CoachError::Transport(format!("Gemini API error: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Gemini API error response: {}", error_text);
            return Err(CoachError::Transport(format!(
                "Gemini API returned {}: {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Gemini response: {}", e);
            CoachError::Transport(format!("Gemini response unreadable: {}", e))
        })?;

        let text = gemini_response.text();
        if text.is_empty() {
            return Err(CoachError::Transport(
                "Empty response from Gemini".to_string(),
            ));
        }

        debug!(chars = text.len(), "Gemini response received");
        Ok(text)
    }

    async fn stream_chat(
        &self,
        directive: &str,
        history: &[ChatTurn],
        message: &str,
    ) -> Result<ChunkStream> {
        let request = chat_request(directive, history, message);

        info!(model = %self.model, turns = history.len(), "Opening Gemini chat stream");

        let builder = self
            .client
            .post(self.endpoint("streamGenerateContent"))
            .query(&[("alt", "sse"), ("key", self.api_key.as_str())])
            .json(&request);

        let es = EventSource::new(builder).map_err(|e| {
            error!("Failed to create EventSource: {}", e);
            CoachError::Transport(e.to_string())
        })?;

        let chunks = stream::unfold(Some(es), |state| async move {
            let Some(mut es) = state else {
                return None;
            };
            loop {
                match es.next().await {
                    Some(Ok(Event::Open)) => debug!("chat stream open"),
                    Some(Ok(Event::Message(msg))) => match parse_chunk(&msg.data) {
                        Ok(text) if text.is_empty() => continue,
                        Ok(text) => return Some((Ok(text), Some(es))),
                        Err(e) => {
                            es.close();
                            return Some((Err(e), None));
                        }
                    },
                    Some(Err(reqwest_eventsource::Error::StreamEnded)) | None => {
                        debug!("chat stream complete");
                        es.close();
                        return None;
                    }
                    Some(Err(e)) => {
                        error!("chat stream error: {}", e);
                        es.close();
                        return Some((Err(CoachError::Transport(e.to_string())), None));
                    }
                }
            }
        });

        Ok(chunks.boxed())
    }
}

fn chat_request(directive: &str, history: &[ChatTurn], message: &str) -> GeminiRequest {
    let mut contents: Vec<Content> = history
        .iter()
        .map(|turn| {
            let role = match turn.role {
                Sender::User => "user",
                Sender::Assistant => "model",
            };
            Content::text(role, &turn.text)
        })
        .collect();
    contents.push(Content::text("user", message));

    GeminiRequest {
        contents,
        system_instruction: Some(SystemInstruction {
            parts: vec![Part {
                text: directive.to_string(),
            }],
        }),
        generation_config: None,
    }
}

/// Text carried by one SSE event
fn parse_chunk(data: &str) -> Result<String> {
    let response: GeminiResponse = serde_json::from_str(data)
        .map_err(|e| CoachError::Transport(format!("malformed stream chunk: {}", e)))?;
    Ok(response.text())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(role: &str, text: &str) -> Self {
        Self {
            role: Some(role.to_string()),
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GeminiResponse {
    /// Concatenated text of the first candidate
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{StreamingSessionManager, ERROR_REPLY};
    use crate::gateway::AdvisoryGateway;
    use crate::models::Cohort;
    use std::sync::Arc;

    #[test]
    fn test_generate_request_serialization() {
        let request = GeminiRequest {
            contents: vec![Content::text("user", "Give me a fraud tip")],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: Schema::object().field("tip", Schema::string()).to_json(),
            }),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(json["generationConfig"]["responseSchema"]["type"], "OBJECT");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Give me a fraud tip");
        assert!(json.get("systemInstruction").is_none());
    }

    #[test]
    fn test_chat_request_maps_roles() {
        let history = vec![
            ChatTurn::new(Sender::User, "What is inflation?"),
            ChatTurn::new(Sender::Assistant, "Prices going up over time."),
        ];
        let json = serde_json::to_value(chat_request("Be friendly", &history, "Why?")).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "Be friendly");
        assert_eq!(json["contents"][1]["role"], "model");
        assert_eq!(json["contents"][2]["role"], "user");
        assert_eq!(json["contents"][2]["parts"][0]["text"], "Why?");
    }

    #[test]
    fn test_parse_chunk_text() {
        let data = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hel"},{"text":"lo"}]}}]}"#;
        assert_eq!(parse_chunk(data).unwrap(), "Hello");
        assert_eq!(parse_chunk(r#"{"candidates":[]}"#).unwrap(), "");
        assert!(parse_chunk("not json").is_err());
    }

    #[test]
    fn test_endpoint_uses_model() {
        let config = CoachConfig::new("test-key").unwrap();
        let client = GeminiClient::new(&config).unwrap();
        assert!(client
            .endpoint("generateContent")
            .ends_with("/models/gemini-2.5-flash:generateContent"));
    }

    #[tokio::test]
    async fn test_unresponsive_server_fails_chat_reply() {
        // completes the TCP handshake from its backlog but never answers
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let mut config = CoachConfig::new("test-key").unwrap();
        config.base_url = format!("http://{}", listener.local_addr().unwrap());

        let client = Arc::new(GeminiClient::new(&config).unwrap());
        let gateway = AdvisoryGateway::new(client, Duration::from_millis(200));
        let mut chat = StreamingSessionManager::new(gateway, 20);
        chat.start(Cohort::Teen);

        let reply = chat.send("Hello?").await.unwrap();
        let outcome =
            tokio::time::timeout(Duration::from_secs(5), chat.drive_reply(reply, |_| {})).await;

        assert!(matches!(outcome, Ok(Err(CoachError::Transport(_)))));
        assert_eq!(chat.transcript().last().unwrap().text, ERROR_REPLY);
        assert!(!chat.is_streaming());
        drop(listener);
    }
}
