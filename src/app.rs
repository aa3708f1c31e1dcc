use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{limit::RequestBodyLimitLayer, services::ServeDir};

use crate::config::Config;
use crate::handlers;
use crate::middleware;
use crate::services::{AccountDirectory, DataPortability, SharedStore, TaskDirectory};

// Application state shared between handlers
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountDirectory,
    pub tasks: TaskDirectory,
    pub portability: DataPortability,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: SharedStore, config: Config) -> Self {
        Self {
            accounts: AccountDirectory::new(store.clone(), &config.auth),
            tasks: TaskDirectory::new(store.clone()),
            portability: DataPortability::new(store),
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let max_import_size = state.config.upload.max_import_size;

    Router::new()
        // Auth routes
        .route("/", get(handlers::serve_login_page))
        .route("/login", post(handlers::handle_login))
        .route("/register", post(handlers::handle_register))
        .route("/logout", get(handlers::handle_logout))

        // Task routes
        .route("/dashboard", get(handlers::serve_dashboard))
        .route("/tasks", get(handlers::list_tasks).post(handlers::create_task))
        .route("/tasks/:task_id", post(handlers::update_task))
        .route("/tasks/:task_id/delete", post(handlers::delete_task))

        // Views
        .route("/calendar", get(handlers::serve_calendar))
        .route("/analytics", get(handlers::serve_analytics))

        // Settings routes
        .route("/settings", get(handlers::serve_settings))
        .route("/settings/profile", post(handlers::update_profile))
        .route("/settings/password", post(handlers::change_password))
        .route("/settings/export", get(handlers::export_data))
        .route("/settings/import", post(handlers::import_data))
        .route("/settings/wipe", post(handlers::wipe_data))

        // Static files
        .nest_service("/static", ServeDir::new("static"))

        // Add middleware
        .layer(from_fn_with_state(state.clone(), middleware::require_auth))

        // Import upload limit from config
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_import_size))

        // Add state
        .with_state(state)
}
