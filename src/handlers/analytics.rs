use axum::{
    extract::{Query, State},
    response::Response,
    Extension,
};
use chrono::Utc;
use crate::app::AppState;
use crate::errors::AppResult;
use crate::insights::{
    category_breakdown, created_in_month, percentage, priority_breakdown, weekly_productivity,
    TaskCounts,
};
use crate::models::{MessageQuery, Priority, TaskStatus, UserProfile};
use super::{escape_html, render_page, run_blocking};

pub async fn serve_analytics(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Query(messages): Query<MessageQuery>,
) -> AppResult<Response> {
    tracing::info!("Accessing analytics for user: {}", user.id);

    let now = Utc::now();
    let directory = state.tasks.clone();
    let user_id = user.id.clone();
    let tasks = run_blocking(move || Ok(directory.list(&user_id)?)).await?;
    let counts = TaskCounts::of(&tasks);
    let priorities = priority_breakdown(&tasks);

    let status_rows = TaskStatus::ALL
        .iter()
        .map(|status| bar_row(status.label(), counts.for_status(*status), counts.total))
        .collect::<Vec<_>>()
        .join("\n");

    let priority_rows = Priority::ALL
        .iter()
        .map(|priority| bar_row(priority.as_str(), priorities.get(*priority), counts.total))
        .collect::<Vec<_>>()
        .join("\n");

    let category_rows = category_breakdown(&tasks)
        .iter()
        .map(|(category, count)| bar_row(category, *count, counts.total))
        .collect::<Vec<_>>()
        .join("\n");

    let weekly_rows = weekly_productivity(&tasks, now.date_naive())
        .iter()
        .map(|day| {
            format!(
                r#"<li><span class="day">{}</span> <span class="count">{}</span></li>"#,
                day.date.format("%a %b %-d"),
                day.completed
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    render_page("Analytics", &user, &messages, "analytics.html", &[
        ("completion_rate", counts.completion_rate().to_string()),
        ("monthly_count", created_in_month(&tasks, now).len().to_string()),
        ("high_priority", priorities.high.to_string()),
        ("in_progress", counts.in_progress.to_string()),
        ("status_rows", status_rows),
        ("priority_rows", priority_rows),
        ("category_rows", category_rows),
        ("weekly_rows", weekly_rows),
    ])
}

fn bar_row(label: &str, count: usize, total: usize) -> String {
    let share = percentage(count, total);
    format!(
        r#"<div class="bar-row"><span class="label">{}</span><span class="value">{} ({}%)</span><div class="bar"><div class="fill" style="width: {}%"></div></div></div>"#,
        escape_html(label),
        count,
        share,
        share
    )
}
