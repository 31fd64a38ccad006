use std::sync::Arc;

use jsonrpc_dispatcher::{
    auth::TokenRoles,
    build_app,
    config::Config,
    domain::methods::{register_default_methods, register_method_listing},
    logging,
    rpc::registry::MethodRegistry,
    AppState,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;

    let mut registry = MethodRegistry::new();
    register_default_methods(&mut registry)?;
    register_method_listing(&mut registry)?;
    info!(
        methods = ?registry.method_names(),
        tokens = config.token_roles.len(),
        "methods registered"
    );

    let bind_socket = config.bind_socket()?;
    let identity = Arc::new(TokenRoles::new(config.token_roles.clone()));
    let state = AppState::new(registry, identity);
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(bind_socket).await?;

    info!(
        bind_addr = %config.bind_addr,
        bind_port = config.bind_port,
        "server starting"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
