//! Wire types of the `/chat` endpoint.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Models served by the inference API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelIdentifier {
    /// Llama 3.3 70B, served by Groq.
    #[serde(rename = "llama-3.3-70b-versatile")]
    Llama33_70bVersatile,
    /// GPT-OSS 120B, served by Groq.
    #[serde(rename = "openai/gpt-oss-120b")]
    GptOss120b,
    /// Gemini 2.5 Flash.
    #[serde(rename = "gemini-2.5-flash")]
    Gemini25Flash,
    /// Gemini 2.5 Pro.
    #[serde(rename = "gemini-2.5-pro")]
    Gemini25Pro,
}

/// Upstream provider hosting a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    /// Groq.
    Groq,
    /// Google Gemini.
    Gemini,
}

impl ModelIdentifier {
    /// All known models.
    pub const ALL: [Self; 4] = [
        Self::Llama33_70bVersatile,
        Self::GptOss120b,
        Self::Gemini25Flash,
        Self::Gemini25Pro,
    ];

    /// Wire name of the model.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Llama33_70bVersatile => "llama-3.3-70b-versatile",
            Self::GptOss120b => "openai/gpt-oss-120b",
            Self::Gemini25Flash => "gemini-2.5-flash",
            Self::Gemini25Pro => "gemini-2.5-pro",
        }
    }

    /// Provider hosting this model.
    #[must_use]
    pub const fn provider(self) -> ModelProvider {
        match self {
            Self::Llama33_70bVersatile | Self::GptOss120b => ModelProvider::Groq,
            Self::Gemini25Flash | Self::Gemini25Pro => ModelProvider::Gemini,
        }
    }
}

impl fmt::Display for ModelIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown model: {0}")]
pub struct UnknownModel(pub String);

impl FromStr for ModelIdentifier {
    type Err = UnknownModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|model| model.as_str() == s)
            .ok_or_else(|| UnknownModel(s.to_owned()))
    }
}

/// Routing preference when no model is pinned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Lowest latency.
    Fast,
    /// Best answer quality.
    Quality,
    /// Lowest cost.
    Cheap,
}

/// A single chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The user message.
    pub message: String,
    /// Pins a specific model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelIdentifier>,
    /// Lets the service pick a model by preference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Forwarded verbatim to the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl ChatRequest {
    /// Creates a request carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            model: None,
            priority: None,
            stream: None,
        }
    }

    /// Pins the model.
    #[must_use]
    pub fn with_model(mut self, model: ModelIdentifier) -> Self {
        self.model = Some(model);
        self
    }

    /// Sets the routing priority.
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the stream flag.
    #[must_use]
    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = Some(stream);
        self
    }
}

/// Token accounting of a completed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens.
    pub prompt: u64,
    /// Completion tokens.
    pub completion: u64,
    /// Sum of both.
    pub total: u64,
}

/// Successful answer of the `/chat` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    /// Generated text.
    pub content: String,
    /// Model that actually served the request.
    ///
    /// Kept as sent: the service may serve models this SDK does not list.
    pub model: String,
    /// Token usage breakdown.
    pub tokens: TokenUsage,
    /// Cost charged for the request.
    pub cost: f64,
    /// Whether the answer came from the service cache.
    pub cached: bool,
    /// Service-side request identifier.
    pub request_id: String,
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
}

impl ChatResponse {
    /// The serving model, if it is one this SDK knows.
    #[must_use]
    pub fn model_identifier(&self) -> Option<ModelIdentifier> {
        self.model.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_unset_fields() {
        let body = serde_json::to_value(ChatRequest::new("hi")).unwrap();
        assert_eq!(body, serde_json::json!({ "message": "hi" }));

        let body = serde_json::to_value(
            ChatRequest::new("hi")
                .with_model(ModelIdentifier::Gemini25Pro)
                .with_priority(Priority::Cheap),
        )
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "message": "hi", "model": "gemini-2.5-pro", "priority": "cheap" })
        );
    }

    #[test]
    fn model_names_round_trip_through_from_str() {
        for model in ModelIdentifier::ALL {
            assert_eq!(model.as_str().parse::<ModelIdentifier>().unwrap(), model);
        }
        assert!("gpt-5".parse::<ModelIdentifier>().is_err());
        assert_eq!(ModelIdentifier::GptOss120b.provider(), ModelProvider::Groq);
        assert_eq!(ModelIdentifier::Gemini25Flash.provider(), ModelProvider::Gemini);
    }

    #[test]
    fn response_uses_camel_case() {
        let response: ChatResponse = serde_json::from_value(serde_json::json!({
            "content": "hello",
            "model": "llama-3.3-70b-versatile",
            "tokens": { "prompt": 3, "completion": 5, "total": 8 },
            "cost": 0.001,
            "cached": false,
            "requestId": "req_1",
            "timestamp": 1_700_000_000_000_u64
        }))
        .unwrap();
        assert_eq!(response.request_id, "req_1");
        assert_eq!(response.tokens.total, 8);
        assert_eq!(
            response.model_identifier(),
            Some(ModelIdentifier::Llama33_70bVersatile)
        );
    }

    #[test]
    fn unlisted_serving_model_still_decodes() {
        let response: ChatResponse = serde_json::from_value(serde_json::json!({
            "content": "hello",
            "model": "llama-4-scout",
            "tokens": { "prompt": 1, "completion": 1, "total": 2 },
            "cost": 0.0,
            "cached": true,
            "requestId": "req_2",
            "timestamp": 1_700_000_000_001_u64
        }))
        .unwrap();
        assert_eq!(response.model, "llama-4-scout");
        assert_eq!(response.model_identifier(), None);
    }
}
