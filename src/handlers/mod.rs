mod auth;
mod task;
mod dashboard;
mod calendar;
mod analytics;
mod settings;

pub use auth::{serve_login_page, handle_login, handle_register, handle_logout};
pub use task::{list_tasks, create_task, update_task, delete_task};
pub use dashboard::serve_dashboard;
pub use calendar::serve_calendar;
pub use analytics::serve_analytics;
pub use settings::{serve_settings, update_profile, change_password, export_data, import_data, wipe_data};

use axum::response::{Html, IntoResponse, Response};
use crate::errors::{AppError, AppResult};
use crate::models::{MessageQuery, Priority, Task, TaskStatus, UserProfile};

/// Runs store and password-hashing work on the blocking pool so request
/// handlers never stall the async workers.
pub(crate) async fn run_blocking<T, F>(work: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

// Reads a template from the templates directory
fn load_template(name: &str) -> AppResult<String> {
    std::fs::read_to_string(format!("templates/{}", name)).map_err(|e| {
        tracing::error!("Failed to read template {}: {}", name, e);
        AppError::File(e)
    })
}

/// Substitutes `{{key}}` placeholders in a single pass, so substituted text
/// is never scanned again. Unknown placeholders are left as they are.
pub(crate) fn fill(template: &str, vars: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = &after[..end];
                match vars.iter().find(|(k, _)| *k == key) {
                    Some((_, value)) => out.push_str(value),
                    None => {
                        out.push_str("{{");
                        out.push_str(key);
                        out.push_str("}}");
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Renders a page fragment inside the shared layout.
pub(crate) fn render_page(
    title: &str,
    user: &UserProfile,
    messages: &MessageQuery,
    template: &str,
    vars: &[(&str, String)],
) -> AppResult<Response> {
    let content = fill(&load_template(template)?, vars);
    let layout = load_template("layout.html")?;

    let html = fill(&layout, &[
        ("title", escape_html(title)),
        ("user_name", escape_html(&user.name)),
        ("flash", flash_html(messages)),
        ("content", content),
    ]);
    Ok(Html(html).into_response())
}

pub(crate) fn flash_html(messages: &MessageQuery) -> String {
    let mut html = String::new();
    if let Some(error) = messages.error.as_deref().filter(|m| !m.is_empty()) {
        html.push_str(&format!(r#"<div class="flash error">{}</div>"#, escape_html(error)));
    }
    if let Some(notice) = messages.notice.as_deref().filter(|m| !m.is_empty()) {
        html.push_str(&format!(r#"<div class="flash notice">{}</div>"#, escape_html(notice)));
    }
    html
}

pub(crate) fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

// Builds <option> tags, marking the selected value
pub(crate) fn options_html<'a, I>(values: I, selected: &str) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    values
        .into_iter()
        .map(|(value, label)| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                escape_html(value),
                if value == selected { " selected" } else { "" },
                escape_html(label)
            )
        })
        .collect::<Vec<_>>()
        .join("")
}

pub(crate) fn status_options(selected: &str) -> String {
    options_html(TaskStatus::ALL.iter().map(|s| (s.as_str(), s.label())), selected)
}

pub(crate) fn priority_options(selected: &str) -> String {
    options_html(
        Priority::ALL.iter().map(|p| (p.as_str(), p.as_str())),
        selected,
    )
}

// One line summary used by the dashboard and the calendar
pub(crate) fn task_summary_html(task: &Task) -> String {
    format!(
        r#"<li class="task-summary priority-{}"><span class="title">{}</span> <span class="badge status-{}">{}</span></li>"#,
        task.priority,
        escape_html(&task.title),
        task.status,
        task.status.label()
    )
}
