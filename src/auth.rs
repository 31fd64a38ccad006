//! Caller identity
//!
//! Resolves the optional bearer token of a request into the set of roles the
//! dispatcher checks method whitelists against.

use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{errors::AppError, AppState};

/// Roles of the current caller. Empty for anonymous requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerRoles(pub HashSet<String>);

pub trait IdentityProvider: Send + Sync {
    fn roles_for(&self, bearer_token: Option<&str>) -> Result<CallerRoles, AppError>;
}

/// Static token table loaded from configuration.
#[derive(Debug, Default)]
pub struct TokenRoles {
    table: HashMap<String, HashSet<String>>,
}

impl TokenRoles {
    pub fn new(table: HashMap<String, HashSet<String>>) -> Self {
        Self { table }
    }
}

impl IdentityProvider for TokenRoles {
    fn roles_for(&self, bearer_token: Option<&str>) -> Result<CallerRoles, AppError> {
        let Some(token) = bearer_token else {
            return Ok(CallerRoles::default());
        };

        self.table
            .get(token)
            .map(|roles| CallerRoles(roles.clone()))
            .ok_or_else(|| AppError::unauthorized("invalid_token", "invalid bearer token"))
    }
}

pub async fn resolve_caller_roles(
    State(state): State<AppState>,
    auth_header: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = auth_header.as_ref().map(|TypedHeader(auth)| auth.token());
    let roles = state.identity.roles_for(token)?;
    request.extensions_mut().insert(roles);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> TokenRoles {
        TokenRoles::new(HashMap::from([(
            "abc".to_string(),
            HashSet::from(["admin".to_string()]),
        )]))
    }

    #[test]
    fn anonymous_caller_has_no_roles() {
        let roles = provider().roles_for(None).expect("anonymous allowed");
        assert!(roles.0.is_empty());
    }

    #[test]
    fn known_token_maps_to_roles() {
        let roles = provider().roles_for(Some("abc")).expect("known token");
        assert!(roles.0.contains("admin"));
    }

    #[test]
    fn unknown_token_is_rejected() {
        let err = provider()
            .roles_for(Some("nope"))
            .expect_err("unknown token");
        assert!(matches!(
            err,
            AppError::Unauthorized {
                code: "invalid_token",
                ..
            }
        ));
    }
}
