use anyhow::{Context, Result};
use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;

use std::sync::Arc;

use crate::config::Config;
use crate::lbdb::{AwardPolicy, Db};

mod handlers;

/// Shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Db>,
}

impl AppState {
    pub fn new(db: Db) -> Self {
        Self { db: Arc::new(db) }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/progress", get(handlers::get_progress))
        .route("/api/progress/update", post(handlers::update_progress))
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/signin", post(handlers::sign_in))
        .route("/api/leaderboard", get(handlers::leaderboard))
        .route("/api/achievements", get(handlers::list_achievements))
        .route("/api/exercises/grade", post(handlers::grade_exercise))
        .with_state(state)
}

/// Serves the API on an already-bound listener until the process stops.
pub async fn serve(listener: TcpListener, db: Db) -> Result<()> {
    let addr = listener.local_addr()?;
    log::info!("learnboard is listening on http://{addr}");

    axum::serve(listener, router(AppState::new(db)))
        .await
        .context("Server stopped unexpectedly.")
}

pub async fn run_learnboard(config: &Config) -> Result<()> {
    let award_policy = if config.award_once {
        AwardPolicy::FirstCompletion
    } else {
        AwardPolicy::EveryUpdate
    };

    let db = Db::open(&config.db_path)
        .with_context(|| format!("Could not open database {}", config.db_path.display()))?
        .with_award_policy(award_policy);
    db.initialize().context("Could not initialize database tables.")?;

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Could not bind to {}", config.bind))?;

    serve(listener, db).await
}
