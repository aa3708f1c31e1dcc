use axum::{
    extract::{Form, Multipart, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response, Redirect},
    Extension,
};
use chrono::Utc;
use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::models::{MessageQuery, PasswordForm, ProfileForm, UserProfile};
use crate::services::ImportOutcome;
use super::{escape_html, render_page, run_blocking};

pub async fn serve_settings(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Query(messages): Query<MessageQuery>,
) -> AppResult<Response> {
    render_page("Settings", &user, &messages, "settings.html", &[
        ("name", escape_html(&user.name)),
        ("email", escape_html(&user.email)),
        ("member_since", user.created_at.format("%Y-%m-%d").to_string()),
        ("min_password_length", state.config.auth.min_password_length.to_string()),
    ])
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Form(profile_form): Form<ProfileForm>,
) -> AppResult<Response> {
    let name = profile_form.name.trim().to_string();
    let email = profile_form.email.trim().to_string();
    if name.is_empty() || email.is_empty() {
        return Err(AppError::validation("Name and email are required", "/settings"));
    }

    let accounts = state.accounts.clone();
    match run_blocking(move || accounts.update_profile(&user.id, &name, &email)).await {
        Ok(_) => Ok(Redirect::to("/settings?notice=Profile%20updated%20successfully!").into_response()),
        // Stay on the settings page instead of bouncing to the login form
        Err(AppError::DuplicateAccount(email)) => Err(AppError::validation(
            format!("Email {} is already in use", email),
            "/settings",
        )),
        Err(e) => Err(e),
    }
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Form(password_form): Form<PasswordForm>,
) -> AppResult<Response> {
    let accounts = state.accounts.clone();
    let result = run_blocking(move || {
        accounts.change_password(
            &user.id,
            &password_form.current_password,
            &password_form.new_password,
            &password_form.confirm_password,
        )
    })
    .await;

    match result {
        Ok(()) => Ok(Redirect::to("/settings?notice=Password%20changed%20successfully!").into_response()),
        // A wrong current password stays on the settings page
        Err(AppError::InvalidCredentials) => Err(AppError::validation(
            "Current password is incorrect!",
            "/settings",
        )),
        Err(e) => Err(e),
    }
}

pub async fn export_data(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
) -> AppResult<Response> {
    let now = Utc::now();
    let portability = state.portability.clone();
    let profile = user.clone();
    let body = run_blocking(move || Ok(portability.export_json(&profile, now)?)).await?;
    let filename = format!("taskflow-data-{}.json", now.format("%Y-%m-%d"));

    tracing::info!("Exporting data for user {} ({} bytes)", user.id, body.len());
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
        ],
        body,
    )
        .into_response())
}

pub async fn import_data(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    mut multipart: Multipart,
) -> AppResult<Response> {
    tracing::info!("Import requested by user {}", user.id);

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read import form: {}", e);
        AppError::InvalidImport(e.to_string())
    })? {
        if field.name() != Some("file") {
            tracing::warn!("Unexpected form field: {:?}", field.name());
            continue;
        }

        let raw = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidImport(e.to_string()))?;

        let portability = state.portability.clone();
        return match run_blocking(move || portability.import(&raw)).await? {
            ImportOutcome::Replaced => Ok(Redirect::to(
                "/settings?notice=Data%20imported%20successfully!",
            )
            .into_response()),
            ImportOutcome::NothingToImport => Ok(Redirect::to(
                "/settings?notice=No%20tasks%20found%20in%20file",
            )
            .into_response()),
        };
    }

    Err(AppError::validation("No file uploaded", "/settings"))
}

pub async fn wipe_data(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
) -> AppResult<Response> {
    tracing::warn!("User {} requested removal of all local data", user.id);
    let portability = state.portability.clone();
    run_blocking(move || Ok(portability.wipe_local_data()?)).await?;
    Ok(Redirect::to("/").into_response())
}
