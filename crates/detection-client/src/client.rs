//! Frame submission and response interpretation

use crate::DetectionError;
use async_trait::async_trait;
use frame_source::EncodedFrame;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default request timeout for one submission
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Hazard sentinel the service places in `message` on a positive frame
pub const DEFAULT_HAZARD_SENTINEL: &str = "fire detected";

/// One labeled region in a frame
#[derive(Debug, Clone, Deserialize)]
pub struct Detection {
    /// Class label; the service historically emitted `class_name`
    #[serde(alias = "class_name")]
    pub label: String,
    pub confidence: f32,
    /// Bounding box as [x0, y0, x1, y1] in pixels
    #[serde(default)]
    pub bbox: Vec<f32>,
}

/// Interpreted outcome of one submission. Transient; never persisted.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    /// True when the service's message equals the hazard sentinel
    pub hazard_detected: bool,
    /// Overall confidence, clamped to [0, 1]
    pub confidence: f32,
    /// Per-region detections, in service order
    pub detections: Vec<Detection>,
    /// The service's verbatim message
    pub raw_message: String,
}

/// Wire shape of a 2xx response body
#[derive(Debug, Deserialize)]
struct PredictResponse {
    message: String,
    #[serde(default)]
    detections: Vec<Detection>,
    #[serde(default)]
    confidence_score: f32,
}

/// Supplies a bearer token for each call. Tokens may rotate or expire, so
/// the client asks again on every submission and never caches.
pub trait TokenProvider: Send + Sync {
    fn bearer_token(&self) -> Result<String, DetectionError>;
}

/// Fixed token handed over at construction
pub struct StaticToken(pub String);

impl TokenProvider for StaticToken {
    fn bearer_token(&self) -> Result<String, DetectionError> {
        Ok(self.0.clone())
    }
}

/// Reads the token from an environment variable on every call, so an
/// operator can rotate credentials without restarting the monitor.
pub struct EnvToken {
    pub var: String,
}

impl TokenProvider for EnvToken {
    fn bearer_token(&self) -> Result<String, DetectionError> {
        std::env::var(&self.var)
            .map_err(|_| DetectionError::Credential(format!("{} is not set", self.var)))
    }
}

/// Seam between the scheduler and the remote service, so the tick loop can
/// be driven by scripted backends in tests.
#[async_trait]
pub trait DetectionBackend: Send + Sync {
    async fn submit(&self, frame: EncodedFrame) -> Result<DetectionResult, DetectionError>;
}

/// HTTP client for `POST <backend>/predict`
pub struct DetectionClient {
    http: reqwest::Client,
    predict_url: String,
    hazard_sentinel: String,
    tokens: Box<dyn TokenProvider>,
}

impl DetectionClient {
    /// Create a client for the given backend base URL.
    pub fn new(base_url: &str, tokens: Box<dyn TokenProvider>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let predict_url = format!("{}/predict", base_url.trim_end_matches('/'));
        info!(url = %predict_url, "detection client ready");

        Self {
            http,
            predict_url,
            hazard_sentinel: DEFAULT_HAZARD_SENTINEL.to_string(),
            tokens,
        }
    }

    /// Override the message that marks a positive frame.
    pub fn with_hazard_sentinel(mut self, sentinel: &str) -> Self {
        self.hazard_sentinel = sentinel.to_string();
        self
    }
}

#[async_trait]
impl DetectionBackend for DetectionClient {
    async fn submit(&self, frame: EncodedFrame) -> Result<DetectionResult, DetectionError> {
        let token = self.tokens.bearer_token()?;

        let part = Part::bytes(frame.bytes)
            .file_name("frame.jpg")
            .mime_str(frame.mime_type)
            .map_err(|e| DetectionError::Transport(e.to_string()))?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(&self.predict_url)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| DetectionError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!(%status, "detection service rejected credential");
            return Err(DetectionError::Unauthorized);
        }
        if !status.is_success() {
            return Err(DetectionError::ServerFault(format!(
                "unexpected status {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DetectionError::Transport(e.to_string()))?;
        let result = interpret_body(&body, &self.hazard_sentinel)?;
        debug!(
            hazard = result.hazard_detected,
            confidence = result.confidence,
            "frame interpreted"
        );
        Ok(result)
    }
}

/// Validate a 2xx body against the response shape. Malformed bodies
/// classify as a server fault.
pub fn interpret_body(body: &str, sentinel: &str) -> Result<DetectionResult, DetectionError> {
    let wire: PredictResponse = serde_json::from_str(body)
        .map_err(|e| DetectionError::ServerFault(format!("malformed response body: {e}")))?;

    Ok(DetectionResult {
        hazard_detected: wire.message == sentinel,
        confidence: wire.confidence_score.clamp(0.0, 1.0),
        detections: wire.detections,
        raw_message: wire.message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hazard_sentinel_match() {
        let body = r#"{"message":"fire detected","confidence_score":0.92}"#;
        let result = interpret_body(body, DEFAULT_HAZARD_SENTINEL).unwrap();
        assert!(result.hazard_detected);
        assert_eq!(result.confidence, 0.92);
        assert_eq!(result.raw_message, "fire detected");
        assert!(result.detections.is_empty());
    }

    #[test]
    fn test_safe_message_is_not_hazard() {
        let body = r#"{"message":"safe"}"#;
        let result = interpret_body(body, DEFAULT_HAZARD_SENTINEL).unwrap();
        assert!(!result.hazard_detected);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_legacy_class_name_key_is_accepted() {
        let body = r#"{
            "message": "fire detected",
            "confidence_score": 0.8,
            "detections": [
                {"class_name": "fire", "confidence": 0.8, "bbox": [1.0, 2.0, 3.0, 4.0]}
            ]
        }"#;
        let result = interpret_body(body, DEFAULT_HAZARD_SENTINEL).unwrap();
        assert_eq!(result.detections.len(), 1);
        assert_eq!(result.detections[0].label, "fire");
        assert_eq!(result.detections[0].bbox, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_malformed_body_is_server_fault() {
        assert!(matches!(
            interpret_body("not json", DEFAULT_HAZARD_SENTINEL),
            Err(DetectionError::ServerFault(_))
        ));
        // Valid JSON but missing the required message field
        assert!(matches!(
            interpret_body(r#"{"confidence_score": 0.5}"#, DEFAULT_HAZARD_SENTINEL),
            Err(DetectionError::ServerFault(_))
        ));
    }

    #[test]
    fn test_confidence_is_clamped() {
        let body = r#"{"message":"fire detected","confidence_score":7.5}"#;
        let result = interpret_body(body, DEFAULT_HAZARD_SENTINEL).unwrap();
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_custom_sentinel() {
        let body = r#"{"message":"smoke detected"}"#;
        let result = interpret_body(body, "smoke detected").unwrap();
        assert!(result.hazard_detected);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        // Port 1 refuses connections immediately
        let client = DetectionClient::new(
            "http://127.0.0.1:1",
            Box::new(StaticToken("token".into())),
        );
        let frame = EncodedFrame {
            bytes: vec![0xFF, 0xD8],
            mime_type: "image/jpeg",
            captured_at: chrono::Utc::now(),
        };
        assert!(matches!(
            client.submit(frame).await,
            Err(DetectionError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_env_token_is_credential_error() {
        let client = DetectionClient::new(
            "http://127.0.0.1:1",
            Box::new(EnvToken {
                var: "FIREWATCH_TEST_TOKEN_THAT_DOES_NOT_EXIST".into(),
            }),
        );
        let frame = EncodedFrame {
            bytes: Vec::new(),
            mime_type: "image/jpeg",
            captured_at: chrono::Utc::now(),
        };
        assert!(matches!(
            client.submit(frame).await,
            Err(DetectionError::Credential(_))
        ));
    }
}
