//! JSON-RPC 2.0 method registry and dispatch pipeline
//!
//! Provides envelope validation, role-based authorization, handler invocation
//! and response formatting, independent of the HTTP transport.

pub mod audit;
pub mod dispatcher;
pub mod envelope;
pub mod registry;
pub mod types;
