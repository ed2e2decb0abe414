//! Model gateway: one stateless `generateContent` call per exchange
//!
//! Request = two priming turns + the conversation with crisis cards removed.
//! The whole history is resent every time; the remote side keeps no session.
//! Every failure is terminal for the exchange. There are no retries.

use async_trait::async_trait;
use reqwest::{Client, Proxy, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::config::GatewayConfig;
use crate::core::sentiment::SCORE_INSTRUCTION;
use crate::error::{ConfigError, GatewayError};
use crate::types::Turn;

/// Persona, counselling framework and safety protocol.
/// Sent as a `user` turn because the endpoint has no system role here.
pub const SYSTEM_INSTRUCTION: &str = "System Instruction: You are \"PolyU MindSpace\", a warm, \
non-judgmental peer counselor for students at the Hong Kong Polytechnic University. \
You know the campus (the Pao Yue-kong Library, VA, Z Core) and common stressors such as GPA \
pressure, the Final Year Project (FYP), internships and living away from home.\n\
Approach: listen first, reflect feelings back, ask one gentle open question at a time, and \
suggest small concrete next steps. Keep replies short and conversational. Reply in the \
language the student uses.\n\
Safety: you are not a therapist and must not diagnose. If the student mentions self-harm, \
suicide or feeling hopeless, respond with care and urge them to contact the 24-hour support \
line (852) 2766 5433 or emergency services immediately.";

/// Model acknowledgement that closes the priming pair
pub const SYSTEM_ACK: &str = "Understood. I am ready to help.";

/// Anything that can turn a conversation into the next assistant reply
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Produce the raw reply text for the given history
    async fn reply(&self, history: &[Turn]) -> Result<String, GatewayError>;
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    fn text(role: &str, text: &str) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f32,
}

/// Pull `candidates[0].content.parts[0].text` out of a 200 body
pub fn parse_reply(body: &str) -> Result<String, GatewayError> {
    let empty = || GatewayError::EmptyContent {
        body: body.to_string(),
    };
    let json: serde_json::Value = serde_json::from_str(body).map_err(|_| empty())?;
    json.pointer("/candidates/0/content/parts/0/text")
        .and_then(|t| t.as_str())
        .map(str::to_string)
        .ok_or_else(empty)
}

// =============================================================================
// GEMINI CLIENT
// =============================================================================

/// HTTP client for the Generative Language API
pub struct GeminiGateway {
    config: GatewayConfig,
    client: Client,
}

impl GeminiGateway {
    /// Build the HTTP client; a bad proxy url is a startup error
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        let mut builder = Client::builder().timeout(config.timeout);

        builder = match &config.proxy_url {
            Some(url) => {
                let proxy = Proxy::all(url).map_err(|e| ConfigError::InvalidProxy {
                    url: url.clone(),
                    message: e.to_string(),
                })?;
                builder.proxy(proxy)
            }
            // Only an explicit proxy is used, never the environment's
            None => builder.no_proxy(),
        };

        let client = builder
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Priming pair followed by the history, crisis cards removed
    pub fn build_request(&self, history: &[Turn]) -> GenerateRequest {
        let instruction = if self.config.scoring {
            format!("{}\n{}", SYSTEM_INSTRUCTION, SCORE_INSTRUCTION)
        } else {
            SYSTEM_INSTRUCTION.to_string()
        };

        let mut contents = Vec::with_capacity(history.len() + 2);
        contents.push(Content::text("user", &instruction));
        contents.push(Content::text("model", SYSTEM_ACK));
        contents.extend(
            history
                .iter()
                .filter(|t| t.in_context())
                .map(|t| Content::text(t.speaker.wire_role(), &t.text)),
        );

        GenerateRequest {
            contents,
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
            },
        }
    }
}

#[async_trait]
impl ChatGateway for GeminiGateway {
    async fn reply(&self, history: &[Turn]) -> Result<String, GatewayError> {
        let request = self.build_request(history);
        debug!(
            endpoint = %self.config.redacted_endpoint(),
            contents = request.contents.len(),
            "sending generateContent request"
        );

        let response = self
            .client
            .post(self.config.endpoint_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "model request failed in transport");
                GatewayError::from(e)
            })?;

        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            warn!(status = status.as_u16(), "model endpoint rejected request");
            return Err(GatewayError::RemoteRejected {
                status: status.as_u16(),
                body,
            });
        }

        parse_reply(&body).inspect_err(|_| {
            warn!(bytes = body.len(), "model response had no text content");
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn gateway(scoring: bool) -> GeminiGateway {
        let config = GatewayConfig::new(Some("test-key".into()))
            .unwrap()
            .with_scoring(scoring);
        GeminiGateway::new(config).unwrap()
    }

    #[test]
    fn test_priming_turns_come_first() {
        let request = gateway(false).build_request(&[Turn::user("hi")]);
        assert_eq!(request.contents.len(), 3);
        assert_eq!(request.contents[0].role, "user");
        assert_eq!(request.contents[0].parts[0].text, SYSTEM_INSTRUCTION);
        assert_eq!(request.contents[1], Content::text("model", SYSTEM_ACK));
        assert_eq!(request.contents[2], Content::text("user", "hi"));
    }

    #[test]
    fn test_crisis_turns_omitted_order_kept() {
        let history = vec![
            Turn::assistant("greeting"),
            Turn::user("first"),
            Turn::crisis_card("<div>card</div>"),
            Turn::user("second"),
            Turn::assistant("reply"),
        ];
        let request = gateway(false).build_request(&history);
        let tail: Vec<_> = request.contents[2..]
            .iter()
            .map(|c| (c.role.as_str(), c.parts[0].text.as_str()))
            .collect();
        assert_eq!(
            tail,
            vec![
                ("model", "greeting"),
                ("user", "first"),
                ("user", "second"),
                ("model", "reply"),
            ]
        );
    }

    #[test]
    fn test_scoring_adds_instruction() {
        let with = gateway(true).build_request(&[]);
        let without = gateway(false).build_request(&[]);
        assert!(with.contents[0].parts[0].text.contains("[[SCORE: x]]"));
        assert!(!without.contents[0].parts[0].text.contains("[[SCORE"));
    }

    #[test]
    fn test_request_json_shape() {
        let request = gateway(false).build_request(&[Turn::user("hi")]);
        let json = serde_json::to_value(&request).unwrap();
        assert!(json["contents"].is_array());
        assert_eq!(json["contents"][2]["parts"][0]["text"], "hi");
        let temp = json["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temp - 0.7).abs() < 1e-6);
        assert!(json.get("generation_config").is_none());
    }

    #[test]
    fn test_parse_reply_success() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"Hello!"}],"role":"model"}}]}"#;
        assert_eq!(parse_reply(body).unwrap(), "Hello!");
    }

    #[test]
    fn test_parse_reply_missing_path_keeps_body() {
        let body = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        assert_eq!(
            parse_reply(body),
            Err(GatewayError::EmptyContent {
                body: body.to_string()
            })
        );
        assert!(matches!(parse_reply("not json"), Err(GatewayError::EmptyContent { .. })));
        assert!(matches!(parse_reply("{}"), Err(GatewayError::EmptyContent { .. })));
    }

    #[test]
    fn test_invalid_proxy_is_config_error() {
        let config = GatewayConfig::new(Some("k".into()))
            .unwrap()
            .with_proxy(Some("http://[::1".into()));
        assert!(matches!(
            GeminiGateway::new(config),
            Err(ConfigError::InvalidProxy { .. })
        ));
    }
}
