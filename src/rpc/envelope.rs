//! Request envelope decoding and validation
//!
//! A raw body is decoded into [`RawEnvelope`], which keeps a missing key apart
//! from an explicit `null`. [`validate_envelope`] then checks the fields in a
//! fixed order against the registry and yields a [`ValidatedCall`].

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

use crate::rpc::registry::{MethodRegistry, RegisteredMethod};
use crate::rpc::types::{
    RequestId, RpcResponse, ENVELOPE_ERROR, INVALID_PARAMS, JSON_RPC_VERSION, METHOD_NOT_FOUND,
};
use crate::rpc_error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed json: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("request must be a json object")]
    NotAnObject,
}

#[derive(Debug, Deserialize)]
pub struct RawEnvelope {
    #[serde(default, deserialize_with = "present")]
    id: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    jsonrpc: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    method: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    params: Option<Value>,
}

// Only runs for keys that exist, so `null` becomes `Some(Value::Null)`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

pub fn parse_envelope(raw_body: &[u8]) -> Result<RawEnvelope, ParseError> {
    let payload: Value = serde_json::from_slice(raw_body)?;
    if !payload.is_object() {
        return Err(ParseError::NotAnObject);
    }
    Ok(serde_json::from_value(payload)?)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeViolation {
    #[error("missing id")]
    MissingId,
    #[error("id must be either null or an integer")]
    InvalidId,
    #[error("jsonrpc must be {}, was {actual}", JSON_RPC_VERSION)]
    VersionMismatch { actual: String },
    #[error("method {method} is missing")]
    MethodNotFound { method: String },
    #[error("missing params")]
    MissingParams,
    #[error("Method expects {expected} params, but got {actual}")]
    ArityMismatch { expected: usize, actual: usize },
}

impl EnvelopeViolation {
    pub fn code(&self) -> i64 {
        match self {
            Self::MethodNotFound { .. } => METHOD_NOT_FOUND,
            Self::ArityMismatch { .. } => INVALID_PARAMS,
            Self::MissingId | Self::InvalidId | Self::VersionMismatch { .. } | Self::MissingParams => {
                ENVELOPE_ERROR
            }
        }
    }

    pub fn into_response(self) -> RpcResponse {
        rpc_error!(self.code(), "{}", self)
    }
}

#[derive(Debug)]
pub struct ValidatedCall<'r> {
    pub id: RequestId,
    pub method: &'r RegisteredMethod,
    pub params: Vec<Value>,
}

pub fn validate_envelope(
    envelope: RawEnvelope,
    registry: &MethodRegistry,
) -> Result<ValidatedCall<'_>, EnvelopeViolation> {
    let id = match envelope.id {
        None => return Err(EnvelopeViolation::MissingId),
        Some(Value::Null) => None,
        Some(value) => Some(value.as_i64().ok_or(EnvelopeViolation::InvalidId)?),
    };

    match envelope.jsonrpc {
        Some(Value::String(version)) if version == JSON_RPC_VERSION => {}
        other => {
            return Err(EnvelopeViolation::VersionMismatch {
                actual: display_value(other.as_ref()),
            })
        }
    }

    let method = envelope
        .method
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|name| registry.lookup(name).ok())
        .ok_or_else(|| EnvelopeViolation::MethodNotFound {
            method: display_value(envelope.method.as_ref()),
        })?;

    let params = match envelope.params {
        None => return Err(EnvelopeViolation::MissingParams),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(EnvelopeViolation::ArityMismatch {
                expected: method.required_arity(),
                actual: 0,
            })
        }
    };
    if params.len() != method.required_arity() {
        return Err(EnvelopeViolation::ArityMismatch {
            expected: method.required_arity(),
            actual: params.len(),
        });
    }

    Ok(ValidatedCall { id, method, params })
}

fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}
