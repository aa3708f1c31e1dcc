use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::app::AppState;

/// Lets public paths through and, for everything else, resolves the current
/// session into a `UserProfile` request extension or redirects to the login
/// page.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let path = req.uri().path().to_owned();

    if path == "/" || path == "/login" || path == "/register" || path.starts_with("/static/") {
        return next.run(req).await;
    }

    let accounts = state.accounts.clone();
    let current = match tokio::task::spawn_blocking(move || accounts.current_user()).await {
        Ok(current) => current,
        Err(e) => {
            tracing::error!("Session lookup failed: {}", e);
            None
        }
    };

    match current {
        Some(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        None => {
            tracing::debug!("Unauthenticated request to {}", path);
            Redirect::to("/").into_response()
        }
    }
}
