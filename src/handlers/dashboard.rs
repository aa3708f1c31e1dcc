use axum::{
    extract::{Query, State},
    response::Response,
    Extension,
};
use crate::app::AppState;
use crate::errors::AppResult;
use crate::insights::{priority_breakdown, recent_tasks, TaskCounts};
use crate::models::{MessageQuery, UserProfile};
use super::{render_page, run_blocking, task_summary_html};

const RECENT_TASKS: usize = 5;

pub async fn serve_dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Query(messages): Query<MessageQuery>,
) -> AppResult<Response> {
    tracing::info!("Accessing dashboard for user: {}", user.id);

    let directory = state.tasks.clone();
    let user_id = user.id.clone();
    let tasks = run_blocking(move || Ok(directory.list(&user_id)?)).await?;
    let counts = TaskCounts::of(&tasks);
    let priorities = priority_breakdown(&tasks);

    let recent = recent_tasks(&tasks, RECENT_TASKS);
    let recent_html = if recent.is_empty() {
        r#"<li class="empty">No tasks yet. <a href="/tasks">Create your first task</a></li>"#.to_string()
    } else {
        recent.iter().map(|task| task_summary_html(task)).collect::<Vec<_>>().join("\n")
    };

    tracing::debug!("Dashboard counts for {}: {:?}", user.id, counts);
    render_page("Dashboard", &user, &messages, "dashboard.html", &[
        ("total", counts.total.to_string()),
        ("completed", counts.completed.to_string()),
        ("pending", counts.pending.to_string()),
        ("in_progress", counts.in_progress.to_string()),
        ("completion_rate", counts.completion_rate().to_string()),
        ("priority_high", priorities.high.to_string()),
        ("priority_medium", priorities.medium.to_string()),
        ("priority_low", priorities.low.to_string()),
        ("recent_tasks", recent_html),
    ])
}
