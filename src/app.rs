/*
 * Responsibility
 * - Tracing + panic hook setup
 * - Config -> collaborators (user store, authorization gate) -> Router
 * - Middleware stack, axum::serve() with graceful shutdown
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, UserStoreBackend};
use crate::repos::{InMemoryUserStore, PgUserStore, UserStore};
use crate::services::{auth::build_authz_gate, credential::CredentialHasher};
use crate::{api, middleware, state::AppState};

fn init_tracing() {
    // RUST_LOG wins when set, e.g. RUST_LOG=info,realm_user_api=debug
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // Development: crash loudly. Production: default hook, keep serving.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env().context("loading configuration")?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        env = ?config.app_env,
        addr = %config.addr,
        realm = %config.realm,
        base_path = config.base_path.as_deref().unwrap_or("/"),
        "starting realm user api"
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("binding {}", config.addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

pub async fn build_state(config: &Config) -> Result<AppState> {
    let users: Arc<dyn UserStore> = match &config.user_store {
        UserStoreBackend::Postgres {
            database_url,
            max_connections,
        } => Arc::new(
            PgUserStore::connect(database_url, *max_connections)
                .await
                .context("connecting to the user database")?,
        ),
        UserStoreBackend::Memory => {
            tracing::warn!("using the in-memory user store; users are lost on restart");
            Arc::new(InMemoryUserStore::new())
        }
    };

    let gate = build_authz_gate(config).context("building the authorization gate")?;

    Ok(AppState::new(
        config.realm.clone(),
        users,
        gate,
        Arc::new(CredentialHasher::new()),
    ))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let routes = api::routes(&state);

    let router = match config.base_path.as_deref() {
        Some(base) => Router::new().nest(base, routes),
        None => routes,
    }
    .with_state(state);

    middleware::http::apply(router, config)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
