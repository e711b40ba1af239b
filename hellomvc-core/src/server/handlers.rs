//! Request handlers for hellomvc
//!
//! `JsonEchoHandler` holds one operation per request-body variant. Each
//! operation logs the decoded fields and answers with either a fixed `ok`
//! or the record itself. Decode failures are not handled here; they bubble
//! up as `DecodeError` for the host to turn into a status code.

use crate::config::HandlerConfig;
use crate::model::{self, DecodeError, HelloData, HttpEntity};
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::Serialize;
use std::collections::HashMap;

use super::binding;

/// Handler result
pub type HandlerResult = Result<HandlerResponse, HandlerError>;

const TEXT_PLAIN: &str = "text/plain;charset=UTF-8";
const APPLICATION_JSON: &str = "application/json";

/// Response from a handler
#[derive(Debug)]
pub struct HandlerResponse {
    pub status: StatusCode,
    pub headers: HashMap<String, String>,
    pub body: Option<Bytes>,
}

/// Handler error
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("{0}")]
    Decode(#[from] DecodeError),

    #[error("Unsupported media type: {}", .0.as_deref().unwrap_or("none"))]
    UnsupportedMediaType(Option<String>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Status code the host answers with
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::Decode(_) => StatusCode::BAD_REQUEST,
            HandlerError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            HandlerError::Config(_) | HandlerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert into the error response sent to the client
    pub fn into_response(self) -> HandlerResponse {
        match &self {
            HandlerError::Decode(e) => HandlerResponse::bad_request(&e.to_string()),
            HandlerError::UnsupportedMediaType(_) => {
                HandlerResponse::with_body(self.status().as_u16(), "Unsupported Media Type")
                    .header("Accept", APPLICATION_JSON)
            }
            HandlerError::Config(_) | HandlerError::Internal(_) => HandlerResponse::internal_error(),
        }
    }
}

impl HandlerResponse {
    /// Create a response with body
    pub fn with_body(code: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status: StatusCode::from_u16(code).unwrap_or(StatusCode::OK),
            headers: HashMap::new(),
            body: Some(body.into()),
        }
        .header("Content-Type", TEXT_PLAIN)
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// 200 with a plain text body
    pub fn text(body: impl Into<Bytes>) -> Self {
        Self::with_body(200, body)
    }

    /// 200 with a value serialized as JSON
    pub fn json<T: Serialize>(value: &T) -> HandlerResult {
        let body = serde_json::to_vec(value).map_err(|e| HandlerError::Internal(e.to_string()))?;
        Ok(Self::with_body(200, body).header("Content-Type", APPLICATION_JSON))
    }

    /// Create bad request response
    pub fn bad_request(reason: &str) -> Self {
        Self::with_body(400, format!("Bad Request: {}", reason))
    }

    /// Create not found response
    pub fn not_found() -> Self {
        Self::with_body(404, "Not Found")
    }

    /// Create method not allowed response listing the accepted methods
    pub fn method_not_allowed(allowed: &[String]) -> Self {
        Self::with_body(405, "Method Not Allowed").header("Allow", allowed.join(", "))
    }

    /// Create payload too large response
    pub fn payload_too_large() -> Self {
        Self::with_body(413, "Payload Too Large")
    }

    /// Create internal server error response
    pub fn internal_error() -> Self {
        Self::with_body(500, "Internal Server Error")
    }

    #[cfg(test)]
    pub(crate) fn body_text(&self) -> Option<&str> {
        self.body.as_ref().and_then(|b| std::str::from_utf8(b).ok())
    }
}

/// Handlers for the `/request-body-json-*` routes
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEchoHandler;

impl JsonEchoHandler {
    /// Read the raw body, parse it and acknowledge
    pub fn handle_stream(&self, raw: &[u8]) -> Result<HandlerResponse, DecodeError> {
        let message_body = model::body_as_string(raw)?;
        tracing::info!("messageBody={}", message_body);
        let data = model::decode_str(&message_body)?;
        log_fields(&data);
        Ok(ack())
    }

    /// Parse a body the host already read as text, then acknowledge
    pub fn handle_string(&self, message_body: String) -> Result<HandlerResponse, DecodeError> {
        let data = model::decode_str(&message_body)?;
        log_fields(&data);
        Ok(ack())
    }

    /// Acknowledge a record the host already decoded
    pub fn handle_record(&self, data: HelloData) -> HandlerResponse {
        log_fields(&data);
        ack()
    }

    /// Acknowledge a decoded record that came with its request headers
    pub fn handle_entity(&self, entity: HttpEntity<HelloData>) -> HandlerResponse {
        tracing::debug!("request carried {} header(s)", entity.headers().len());
        log_fields(entity.body());
        ack()
    }

    /// Return the decoded record unchanged
    pub fn handle_echo(&self, data: HelloData) -> HelloData {
        log_fields(&data);
        data
    }
}

fn log_fields(data: &HelloData) {
    tracing::info!("username={}, age={}", data.username, data.age);
}

fn ack() -> HandlerResponse {
    HandlerResponse::text("ok")
}

/// Execute a handler configuration against a request
pub fn execute_handler(config: &HandlerConfig, headers: &HeaderMap, body: Bytes) -> HandlerResult {
    match config {
        HandlerConfig::JsonBody { binding, reply } => {
            binding::bind_and_handle(*binding, *reply, headers, body)
        }

        HandlerConfig::Health => Ok(HandlerResponse::text(r#"{"status":"healthy"}"#)
            .header("Content-Type", APPLICATION_JSON)),
    }
}
