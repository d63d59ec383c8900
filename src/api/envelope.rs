//! Shared response envelope `{status, type, title, message, data?, error?}`

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{NominaError, NominaResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    #[default]
    Success,
    Error,
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub status: u16,
    #[serde(rename = "type", alias = "type_", default)]
    pub kind: ResponseKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl<T> ApiEnvelope<T> {
    pub fn new(status: u16, message: impl Into<String>, data: Option<T>) -> Self {
        let kind = if (200..300).contains(&status) {
            ResponseKind::Success
        } else {
            ResponseKind::Error
        };
        Self {
            status,
            kind,
            title: String::new(),
            message: message.into(),
            data,
            error: None,
        }
    }

    pub fn is_status(&self, accepted: &[u16]) -> bool {
        accepted.contains(&self.status)
    }

    /// Build the application-level failure for this envelope.
    pub fn failure(&self, fallback: &str) -> NominaError {
        let message = if !self.message.trim().is_empty() {
            self.message.clone()
        } else {
            self.error
                .as_ref()
                .and_then(detail_message)
                .unwrap_or_else(|| fallback.to_string())
        };
        NominaError::Api {
            status: self.status,
            message,
        }
    }

    /// Take the payload if the status is accepted; anything else is an
    /// application failure carrying the envelope's message.
    pub fn into_data(self, accepted: &[u16], fallback: &str) -> NominaResult<T> {
        if !self.is_status(accepted) {
            return Err(self.failure(fallback));
        }
        self.data.ok_or_else(|| {
            NominaError::Decode(format!("status {} response without data", self.status))
        })
    }
}

impl ApiEnvelope<Value> {
    /// Decode `data` into `T` only for success statuses. Failure envelopes
    /// often carry unrelated payloads, which are dropped rather than decoded.
    pub fn decode<T: DeserializeOwned>(self) -> NominaResult<ApiEnvelope<T>> {
        let data = match self.data {
            Some(value) if matches!(self.status, 200 | 201) => {
                Some(serde_json::from_value(value)?)
            }
            _ => None,
        };
        Ok(ApiEnvelope {
            status: self.status,
            kind: self.kind,
            title: self.title,
            message: self.message,
            data,
            error: self.error,
        })
    }
}

/// Message of an `error` member: a plain string or an object with `message`.
fn detail_message(detail: &Value) -> Option<String> {
    match detail {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string),
        _ => None,
    }
}

/// Message carried by an HTTP error body: the top-level `message`, then a
/// nested `error.message` or string `error`.
pub fn failure_message(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .or_else(|| body.get("error").and_then(detail_message))
        .or_else(|| {
            body.get("detail")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
}
