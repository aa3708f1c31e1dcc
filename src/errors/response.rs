use axum::{
    response::{IntoResponse, Response, Redirect},
    http::StatusCode,
};
use crate::errors::AppError;

// The IntoResponse trait implementation converts AppError into a well-formed HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            // Account errors go back to the login form with the message
            AppError::DuplicateAccount(_) => {
                redirect_with_error("/", &message, Some("register"))
            }
            AppError::UserNotFound(_) | AppError::InvalidCredentials => {
                redirect_with_error("/", &message, None)
            }

            AppError::Validation { back_to, .. } => {
                redirect_with_error(back_to, &message, None)
            }

            AppError::InvalidImport(_) => {
                redirect_with_error("/settings", "Invalid file format!", None)
            }

            AppError::TaskNotFound(id) => (
                StatusCode::NOT_FOUND,
                format!("Task not found: {}", id)
            ).into_response(),

            // Storage and template failures are internal server errors
            AppError::Store(e) => {
                tracing::error!("Storage failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Storage error: {}", e)
                ).into_response()
            }

            AppError::File(e) => {
                tracing::error!("File failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("File error: {}", e)
                ).into_response()
            }

            AppError::PasswordHash(e) => {
                tracing::error!("Password hashing failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server error".to_string()
                ).into_response()
            }

            AppError::Background(e) => {
                tracing::error!("Blocking task failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server error".to_string()
                ).into_response()
            }
        }
    }
}

fn redirect_with_error(path: &str, message: &str, form: Option<&str>) -> Response {
    let mut target = format!("{}?error={}", path, urlencoding::encode(message));
    if let Some(form) = form {
        target.push_str("&form=");
        target.push_str(form);
    }
    Redirect::to(&target).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::LOCATION;

    fn location(response: &Response) -> &str {
        response.headers()[LOCATION].to_str().unwrap()
    }

    #[test]
    fn duplicate_account_returns_to_register_form() {
        let response = AppError::DuplicateAccount("a@b.c".into()).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            location(&response),
            "/?error=User%20already%20exists%3A%20a%40b.c&form=register"
        );
    }

    #[test]
    fn validation_goes_back_to_origin() {
        let response = AppError::validation("Title is required", "/tasks").into_response();
        assert_eq!(location(&response), "/tasks?error=Title%20is%20required");
    }

    #[test]
    fn missing_task_is_404() {
        let response = AppError::TaskNotFound("t1".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
