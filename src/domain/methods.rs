//! Methods registered by the server binary at startup
//!
//! Provides `echo`, `add`, `server.time` and `server.methods`.

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::rpc::registry::{handler_fn, HandlerError, MethodConfig, MethodRegistry, RegistryError};

pub const ADMIN_ROLE: &str = "admin";
pub const METHOD_LISTING: &str = "server.methods";

pub fn register_default_methods(registry: &mut MethodRegistry) -> Result<(), RegistryError> {
    registry.register(
        MethodConfig::new("echo")
            .arity(1)
            .handler(handler_fn(|params: Vec<Value>| async move {
                params
                    .into_iter()
                    .next()
                    .ok_or_else(|| HandlerError::new("echo called without an argument"))
            })),
    )?;

    registry.register(
        MethodConfig::new("add")
            .arity(2)
            .handler(handler_fn(|params: Vec<Value>| async move { add(&params) })),
    )?;

    registry.register(
        MethodConfig::new("server.time")
            .arity(0)
            .allow_roles([ADMIN_ROLE])
            .handler(handler_fn(|_params: Vec<Value>| async move {
                Ok::<_, HandlerError>(json!(
                    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
                ))
            })),
    )?;

    Ok(())
}

/// Registers `server.methods`, which answers with the names registered so far.
/// Call it after every other registration.
pub fn register_method_listing(registry: &mut MethodRegistry) -> Result<(), RegistryError> {
    let mut names = registry.method_names();
    names.push(METHOD_LISTING.to_string());
    names.sort();
    registry.register(
        MethodConfig::new(METHOD_LISTING)
            .arity(0)
            .handler(handler_fn(move |_params: Vec<Value>| {
                let names = names.clone();
                async move { Ok::<_, HandlerError>(json!(names)) }
            })),
    )
}

fn add(params: &[Value]) -> Result<Value, HandlerError> {
    let [left, right] = params else {
        return Err(HandlerError::new("add expects exactly two operands"));
    };

    if let (Some(left), Some(right)) = (left.as_i64(), right.as_i64()) {
        return left
            .checked_add(right)
            .map(Value::from)
            .ok_or_else(|| HandlerError::new("integer overflow in add"));
    }

    match (left.as_f64(), right.as_f64()) {
        (Some(left), Some(right)) => Ok(json!(left + right)),
        _ => Err(HandlerError::new(format!(
            "add operands must be numbers, got {left} and {right}"
        ))),
    }
}
