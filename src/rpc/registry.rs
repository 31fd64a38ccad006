//! Method registry and handler seam
//!
//! Methods are registered once during startup. The registry is then moved
//! behind an `Arc` and only read from request handlers.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    future::Future,
    sync::Arc,
};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Failure raised by a method handler. The message is logged, never returned
/// to the caller.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("method name {0} already taken")]
    DuplicateMethod(String),
    #[error("invalid method config: {0}")]
    InvalidConfig(&'static str),
    #[error("method {0} is not registered")]
    NotFound(String),
}

#[async_trait]
pub trait RpcHandler: Send + Sync {
    /// Invoked with exactly the declared number of positional arguments.
    async fn call(&self, params: Vec<Value>) -> Result<Value, HandlerError>;
}

/// Adapts a closure returning a future into an [`RpcHandler`].
pub struct FnHandler<F>(F);

pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
{
    FnHandler(f)
}

#[async_trait]
impl<F, Fut> RpcHandler for FnHandler<F>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
{
    async fn call(&self, params: Vec<Value>) -> Result<Value, HandlerError> {
        (self.0)(params).await
    }
}

#[derive(Default)]
pub struct MethodConfig {
    name: String,
    arity: Option<usize>,
    handler: Option<Arc<dyn RpcHandler>>,
    roles: HashSet<String>,
}

impl MethodConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn arity(mut self, arity: usize) -> Self {
        self.arity = Some(arity);
        self
    }

    pub fn handler(mut self, handler: impl RpcHandler + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn allow_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }
}

pub struct RegisteredMethod {
    name: String,
    handler: Arc<dyn RpcHandler>,
    required_arity: usize,
    role_whitelist: HashSet<String>,
}

impl RegisteredMethod {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn required_arity(&self) -> usize {
        self.required_arity
    }

    pub fn role_whitelist(&self) -> &HashSet<String> {
        &self.role_whitelist
    }

    /// Open methods accept anyone; otherwise one shared role is enough.
    pub fn permits(&self, caller_roles: &HashSet<String>) -> bool {
        self.role_whitelist.is_empty() || !self.role_whitelist.is_disjoint(caller_roles)
    }

    pub async fn invoke(&self, params: Vec<Value>) -> Result<Value, HandlerError> {
        self.handler.call(params).await
    }
}

impl fmt::Debug for RegisteredMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredMethod")
            .field("name", &self.name)
            .field("required_arity", &self.required_arity)
            .field("role_whitelist", &self.role_whitelist)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct MethodRegistry {
    methods: HashMap<String, RegisteredMethod>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, config: MethodConfig) -> Result<(), RegistryError> {
        let MethodConfig {
            name,
            arity,
            handler,
            roles,
        } = config;

        if name.trim().is_empty() {
            return Err(RegistryError::InvalidConfig("method name must not be empty"));
        }
        let handler = handler.ok_or(RegistryError::InvalidConfig("method handler is required"))?;
        let arity = arity.ok_or(RegistryError::InvalidConfig("method arity is required"))?;
        if self.methods.contains_key(&name) {
            return Err(RegistryError::DuplicateMethod(name));
        }

        self.methods.insert(
            name.clone(),
            RegisteredMethod {
                name,
                handler,
                required_arity: arity,
                role_whitelist: roles,
            },
        );
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&RegisteredMethod, RegistryError> {
        self.methods
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.keys().cloned().collect();
        names.sort();
        names
    }
}
