//! Explicit request body binding
//!
//! Runs the decode step a route asks for and hands the result to the
//! matching `JsonEchoHandler` operation.

use crate::config::{Binding, Reply};
use crate::model::{self, HttpEntity};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::HeaderMap;

use super::handlers::{HandlerError, HandlerResponse, HandlerResult, JsonEchoHandler};

/// Bind the body according to `binding` and invoke the handler
pub fn bind_and_handle(binding: Binding, reply: Reply, headers: &HeaderMap, body: Bytes) -> HandlerResult {
    let handler = JsonEchoHandler;

    match binding {
        Binding::Stream | Binding::String if reply == Reply::Echo => Err(HandlerError::Config(format!(
            "echo reply is not available for {} binding",
            binding
        ))),

        Binding::Stream => Ok(handler.handle_stream(&body)?),

        Binding::String => {
            let message_body = model::body_as_string(&body)?;
            Ok(handler.handle_string(message_body)?)
        }

        Binding::Record | Binding::Entity => {
            require_json(headers)?;
            let data = model::decode(&body)?;
            match reply {
                Reply::Echo => HandlerResponse::json(&handler.handle_echo(data)),
                Reply::Ok if binding == Binding::Entity => {
                    Ok(handler.handle_entity(HttpEntity::new(headers.clone(), data)))
                }
                Reply::Ok => Ok(handler.handle_record(data)),
            }
        }
    }
}

/// Record bindings only accept JSON media types
fn require_json(headers: &HeaderMap) -> Result<(), HandlerError> {
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());

    match content_type {
        Some(value) if is_json(value) => Ok(()),
        other => Err(HandlerError::UnsupportedMediaType(other.map(str::to_string))),
    }
}

fn is_json(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json"))
}
