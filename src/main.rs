use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use dentdesk::config::{AppConfig, SessionBackend};
use dentdesk::db;
use dentdesk::db::store::SqliteAppointmentStore;
use dentdesk::handlers;
use dentdesk::services::ai::groq::GroqProvider;
use dentdesk::services::ai::ollama::OllamaProvider;
use dentdesk::services::ai::LlmProvider;
use dentdesk::services::sessions::{
    InMemorySessionStore, SessionLocks, SessionStore, SqliteSessionStore,
};
use dentdesk::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = Arc::new(Mutex::new(db::init_db(&config.database_url)?));

    let llm: Box<dyn LlmProvider> = match config.llm_provider.as_str() {
        "groq" => {
            anyhow::ensure!(!config.groq_api_key.is_empty(), "GROQ_API_KEY must be set when LLM_PROVIDER=groq");
            tracing::info!("using Groq LLM provider (model: {})", config.groq_model);
            Box::new(GroqProvider::new(config.groq_api_key.clone(), config.groq_model.clone()))
        }
        _ => {
            tracing::info!(
                "using Ollama LLM provider (url: {}, model: {})",
                config.ollama_url,
                config.ollama_model
            );
            Box::new(OllamaProvider::new(config.ollama_url.clone(), config.ollama_model.clone()))
        }
    };

    let sessions: Box<dyn SessionStore> = match config.session_backend {
        SessionBackend::Sqlite => {
            tracing::info!("storing sessions in SQLite");
            Box::new(SqliteSessionStore::new(Arc::clone(&conn)))
        }
        SessionBackend::Memory => {
            tracing::info!("storing sessions in memory (capacity: {})", config.session_capacity);
            Box::new(InMemorySessionStore::new(config.session_capacity))
        }
    };

    let state = Arc::new(AppState {
        config: config.clone(),
        store: Box::new(SqliteAppointmentStore::shared(conn)),
        sessions,
        session_locks: SessionLocks::new(),
        llm,
    });

    tokio::spawn(purge_sessions_loop(
        Arc::clone(&state),
        Duration::from_secs(config.session_purge_interval_secs.max(1)),
    ));

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/chat", post(handlers::chat::send_message))
        .route("/api/chat/:session_id", delete(handlers::chat::end_session))
        .route("/api/slots/:date", get(handlers::slots::get_available))
        .route(
            "/api/admin/appointments",
            get(handlers::admin::get_appointments),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn purge_sessions_loop(state: Arc<AppState>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        match state.sessions.purge_expired() {
            Ok(0) => {}
            Ok(n) => tracing::info!("purged {n} expired sessions"),
            Err(e) => tracing::error!(error = %e, "failed to purge expired sessions"),
        }
        state.session_locks.prune();
    }
}
