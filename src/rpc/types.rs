//! JSON-RPC wire representations and response formatting
//!
//! Provides the response shapes produced by the dispatcher and the error code
//! constants it reports.

use serde::Serialize;
use serde_json::Value;

pub const JSON_RPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i64 = -32700;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;
/// Used for every envelope violation that has no standard code.
pub const ENVELOPE_ERROR: i64 = 0;

pub const NOT_AUTHORIZED: &str = "not authorized";

/// Request id echoed back on success. `None` is an explicit JSON `null`.
pub type RequestId = Option<i64>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcError {
    pub message: String,
    pub code: i64,
}

/// Outcome of a single dispatched request.
///
/// Error responses never echo the request id. Authorization denials use a bare
/// string under `error` instead of an error object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RpcResponse {
    Success {
        result: Value,
        jsonrpc: &'static str,
        id: RequestId,
    },
    Error {
        error: RpcError,
    },
    Unauthorized {
        error: &'static str,
    },
}

impl RpcResponse {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self::Success {
            result,
            jsonrpc: JSON_RPC_VERSION,
            id,
        }
    }

    pub fn error(code: i64, message: impl Into<String>) -> Self {
        Self::Error {
            error: RpcError {
                message: message.into(),
                code,
            },
        }
    }

    pub fn unauthorized() -> Self {
        Self::Unauthorized {
            error: NOT_AUTHORIZED,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn error_code(&self) -> Option<i64> {
        match self {
            Self::Error { error } => Some(error.code),
            _ => None,
        }
    }
}

/// Builds an error [`RpcResponse`] from an integer code and a format string.
///
/// ```
/// use jsonrpc_dispatcher::{rpc::types::INVALID_PARAMS, rpc_error};
///
/// let response = rpc_error!(INVALID_PARAMS, "Method expects {} params, but got {}", 2, 1);
/// assert_eq!(response.error_code(), Some(INVALID_PARAMS));
/// ```
#[macro_export]
macro_rules! rpc_error {
    ($code:expr, $($arg:tt)+) => {
        $crate::rpc::types::RpcResponse::error($code, format!($($arg)+))
    };
}
