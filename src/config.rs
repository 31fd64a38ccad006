use std::{
    collections::{HashMap, HashSet},
    env,
    net::SocketAddr,
};

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub bind_port: u16,
    pub token_roles: HashMap<String, HashSet<String>>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("invalid bind address or port")]
    InvalidSocket,
    #[error("RPC_TOKENS entry `{0}` must look like token=role1,role2")]
    InvalidTokenEntry(String),
    #[error("RPC_TOKENS lists a token more than once")]
    DuplicateToken,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string());
        let bind_port = lookup("BIND_PORT")
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(8080);
        let token_roles = lookup("RPC_TOKENS")
            .map(|value| parse_token_roles(&value))
            .transpose()?
            .unwrap_or_default();

        let config = Self {
            bind_addr,
            bind_port,
            token_roles,
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}

/// Parses `token=role1,role2;other=role3`. A token may carry no roles.
pub fn parse_token_roles(value: &str) -> Result<HashMap<String, HashSet<String>>, ConfigError> {
    let mut table = HashMap::new();

    for entry in value.split(';').map(str::trim).filter(|entry| !entry.is_empty()) {
        let (token, roles) = entry
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidTokenEntry(entry.to_string()))?;
        let token = token.trim();
        if token.is_empty() {
            return Err(ConfigError::InvalidTokenEntry(entry.to_string()));
        }

        let roles: HashSet<String> = roles
            .split(',')
            .map(str::trim)
            .filter(|role| !role.is_empty())
            .map(str::to_string)
            .collect();

        if table.insert(token.to_string(), roles).is_some() {
            return Err(ConfigError::DuplicateToken);
        }
    }

    Ok(table)
}
