//! Sutra Friend API server

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::sync::{Mutex, RwLock};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sutra_friend::config::Config;
use sutra_friend::conversation::SessionContext;
use sutra_friend::core::{ChatError, TurnOrchestrator, API_KEY_REQUIRED};
use sutra_friend::{routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sutra_friend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let orchestrator = match TurnOrchestrator::from_config(&config).await {
        Ok(engine) => {
            tracing::info!(strategies = ?engine.strategy_names(), "chat pipeline ready");
            Some(Arc::new(engine))
        }
        Err(ChatError::MissingApiKey) => {
            tracing::warn!("{}", API_KEY_REQUIRED);
            None
        }
        Err(e) => return Err(e.into()),
    };

    let session = SessionContext::new(config.user_id.clone(), config.language);

    let state = AppState {
        config: Arc::new(config),
        orchestrator,
        session: Arc::new(RwLock::new(session)),
        turn_lock: Arc::new(Mutex::new(())),
    };

    let app = Router::new()
        .merge(routes::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("Sutra Friend API running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
