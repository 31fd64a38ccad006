//! HTTP transport for the JSON-RPC dispatcher
//!
//! Provides the `/jsonrpc` endpoint along with health and discovery routes.

pub mod handlers;
