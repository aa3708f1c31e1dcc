use axum::{
    extract::{Form, Query, State},
    response::{Html, IntoResponse, Response, Redirect},
};
use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::models::{LoginForm, MessageQuery, RegisterForm};
use super::{fill, flash_html, load_template, run_blocking};

pub async fn serve_login_page(
    State(state): State<AppState>,
    Query(messages): Query<MessageQuery>,
) -> AppResult<Response> {
    let accounts = state.accounts.clone();
    if run_blocking(move || Ok(accounts.current_user())).await?.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }

    let template = load_template("login.html")?;
    let html = fill(&template, &[("flash", flash_html(&messages))]);
    Ok(Html(html).into_response())
}

pub async fn handle_login(
    State(state): State<AppState>,
    Form(login_form): Form<LoginForm>,
) -> AppResult<Response> {
    tracing::info!("Login attempt for user: {}", login_form.email);

    let accounts = state.accounts.clone();
    run_blocking(move || accounts.login(login_form.email.trim(), &login_form.password)).await?;
    Ok(Redirect::to("/dashboard").into_response())
}

pub async fn handle_register(
    State(state): State<AppState>,
    Form(register_form): Form<RegisterForm>,
) -> AppResult<Response> {
    if register_form.password != register_form.confirm_password {
        return Ok(Redirect::to("/?error=Passwords%20don't%20match&form=register").into_response());
    }

    let email = register_form.email.trim().to_string();
    let name = register_form.name.trim().to_string();
    if email.is_empty() || name.is_empty() {
        return Ok(Redirect::to("/?error=Name%20and%20email%20are%20required&form=register").into_response());
    }

    let accounts = state.accounts.clone();
    let password = register_form.password;
    match run_blocking(move || accounts.register(&email, &password, &name)).await {
        Ok(_) => Ok(Redirect::to("/dashboard").into_response()),
        // Keep the register form open for a too-short password
        Err(AppError::Validation { message, .. }) => Ok(Redirect::to(&format!(
            "/?error={}&form=register",
            urlencoding::encode(&message)
        ))
        .into_response()),
        Err(e) => Err(e),
    }
}

pub async fn handle_logout(
    State(state): State<AppState>,
) -> Response {
    let accounts = state.accounts.clone();
    let result = run_blocking(move || accounts.logout().map_err(AppError::from)).await;
    if let Err(e) = result {
        tracing::warn!("Session removal error: {}", e);
    }
    Redirect::to("/").into_response()
}
