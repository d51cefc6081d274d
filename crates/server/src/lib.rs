//! A small polling site: published questions, choices, and vote counts,
//! rendered as HTML pages over a Postgres-backed store.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod notify;
pub mod seed;
pub mod store;
pub mod views;

use notify::QuestionNotifier;
use store::PollStore;

// ===== App State =====

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PollStore>,
    pub notifier: Arc<dyn QuestionNotifier>,
}

impl AppState {
    pub fn new(store: Arc<dyn PollStore>, notifier: Arc<dyn QuestionNotifier>) -> Self {
        Self { store, notifier }
    }
}

// ===== Router =====

pub fn app(state: AppState) -> Router {
    use handlers::*;

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/polls", get(index))
        .route("/polls/new", get(new_question).post(create_question))
        .route("/polls/:id", get(detail).post(add_choice))
        .route("/polls/:id/vote", post(vote))
        .route("/polls/:id/results", get(results))
        .route("/polls/:id/edit", get(edit_question).post(update_question))
        .route("/polls/:id/delete", get(confirm_delete).post(delete_question))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Installs the global `tracing` subscriber, honoring `RUST_LOG`.
pub fn setup_log() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("polls=info,tower_http=info"));
    fmt().with_env_filter(filter).init();
}
