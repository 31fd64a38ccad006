//! The request pipeline
//!
//! Parses a raw body, validates the envelope, checks the caller's roles against
//! the method whitelist, invokes the handler and formats the outcome. The first
//! failing stage produces the response.

use std::{collections::HashSet, sync::Arc};

use tracing::{debug, error, info};

use crate::rpc::audit::redact_audit_params;
use crate::rpc::envelope::{parse_envelope, validate_envelope};
use crate::rpc::registry::MethodRegistry;
use crate::rpc::types::{RpcResponse, INTERNAL_ERROR, PARSE_ERROR};
use crate::rpc_error;

/// Returned for every handler failure. The real cause only goes to the log.
pub const INTERNAL_ERROR_MESSAGE: &str = "error :(";

#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<MethodRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<MethodRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    pub async fn handle_request(
        &self,
        raw_body: &[u8],
        caller_roles: &HashSet<String>,
    ) -> RpcResponse {
        let envelope = match parse_envelope(raw_body) {
            Ok(envelope) => envelope,
            Err(err) => {
                debug!(error = %err, "request body rejected");
                return rpc_error!(PARSE_ERROR, "unable to parse json");
            }
        };

        let call = match validate_envelope(envelope, &self.registry) {
            Ok(call) => call,
            Err(violation) => {
                debug!(violation = %violation, code = violation.code(), "envelope rejected");
                return violation.into_response();
            }
        };

        let method = call.method.name();
        let audit_params = redact_audit_params(&call.params);

        if !call.method.permits(caller_roles) {
            info!(method = %method, params = %audit_params, outcome = "denied", "rpc call audited");
            return RpcResponse::unauthorized();
        }

        let response = match call.method.invoke(call.params).await {
            Ok(result) => RpcResponse::success(call.id, result),
            Err(err) => {
                error!(method = %method, error = %err, "method handler failed");
                rpc_error!(INTERNAL_ERROR, "{}", INTERNAL_ERROR_MESSAGE)
            }
        };

        info!(
            method = %method,
            params = %audit_params,
            outcome = if response.is_success() { "success" } else { "failure" },
            "rpc call audited"
        );

        response
    }
}
