//! Application methods exposed over JSON-RPC

pub mod methods;
