use axum::{
    extract::{Form, Path, Query, State},
    response::{IntoResponse, Response, Redirect},
    Extension,
};
use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::insights::distinct_categories;
use crate::models::{
    FieldFilter, FilterQuery, MessageQuery, Task, TaskFilter, TaskForm, TaskUpdateForm, UserProfile,
};
use crate::services::TaskBoard;
use super::{escape_html, options_html, priority_options, render_page, run_blocking, status_options};

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Query(query): Query<FilterQuery>,
    Query(messages): Query<MessageQuery>,
) -> AppResult<Response> {
    let filter = TaskFilter::from_query(&query)
        .map_err(|e| AppError::validation(e, "/tasks"))?;

    let directory = state.tasks.clone();
    let user_id = user.id.clone();
    let mut board = run_blocking(move || Ok(TaskBoard::load(directory, &user_id)?)).await?;
    board.set_filter(filter);
    board.set_search(query.q.clone().unwrap_or_default());

    let visible = board.visible();
    tracing::debug!(
        "Listing {} of {} tasks for user {}",
        visible.len(),
        board.tasks().len(),
        user.id
    );

    let back_to = list_url(&query);
    let cards = if visible.is_empty() {
        r#"<p class="empty">No tasks found.</p>"#.to_string()
    } else {
        visible
            .iter()
            .map(|task| task_card_html(task, &back_to))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let categories = distinct_categories(board.tasks());
    let selected_category = match &board.filter().category {
        FieldFilter::All => "all",
        FieldFilter::Only(category) => category.as_str(),
    };
    let category_options = options_html(
        std::iter::once(("all", "All categories"))
            .chain(categories.iter().map(|c| (c.as_str(), c.as_str()))),
        selected_category,
    );
    let selected_status = match &board.filter().status {
        FieldFilter::All => "all",
        FieldFilter::Only(status) => status.as_str(),
    };
    let selected_priority = match &board.filter().priority {
        FieldFilter::All => "all",
        FieldFilter::Only(priority) => priority.as_str(),
    };

    render_page("Tasks", &user, &messages, "tasks.html", &[
        ("task_count", visible.len().to_string()),
        ("search", escape_html(board.search())),
        ("status_filter_options", format!(
            r#"<option value="all">All statuses</option>{}"#,
            status_options(selected_status)
        )),
        ("priority_filter_options", format!(
            r#"<option value="all">All priorities</option>{}"#,
            priority_options(selected_priority)
        )),
        ("category_filter_options", category_options),
        ("clear_filters", if board.filter().is_all() && board.search().is_empty() {
            String::new()
        } else {
            r#"<a href="/tasks" class="clear-filters">Clear filters</a>"#.to_string()
        }),
        ("priority_options", priority_options("medium")),
        ("status_options", status_options("pending")),
        ("tasks", cards),
    ])
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Form(task_form): Form<TaskForm>,
) -> AppResult<Response> {
    let data = task_form
        .into_new_task()
        .map_err(|e| AppError::validation(e, "/tasks"))?;

    let directory = state.tasks.clone();
    let user_id = user.id.clone();
    let task = run_blocking(move || {
        let mut board = TaskBoard::load(directory, &user_id)?;
        Ok(board.create(data)?)
    })
    .await?;
    tracing::info!("Created task {} for user {}", task.id, user.id);

    Ok(Redirect::to("/tasks?notice=Task%20created").into_response())
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Path(task_id): Path<String>,
    Form(mut update_form): Form<TaskUpdateForm>,
) -> AppResult<Response> {
    let back_to = update_form
        .redirect
        .take()
        .filter(|target| is_local_path(target))
        .unwrap_or_else(|| "/tasks".to_string());

    let patch = update_form
        .into_patch()
        .map_err(|e| AppError::validation(e, "/tasks"))?;

    let directory = state.tasks.clone();
    let user_id = user.id.clone();
    let task = run_blocking(move || {
        if patch.is_empty() {
            // Nothing to write, but the task must still be one of ours
            return directory
                .get(&task_id)?
                .filter(|task| task.user_id == user_id)
                .ok_or(AppError::TaskNotFound(task_id));
        }
        let mut board = TaskBoard::load(directory, &user_id)?;
        board.update(&task_id, patch)
    })
    .await?;
    tracing::info!("Updated task {} ({}) for user {}", task.id, task.status, user.id);

    Ok(Redirect::to(&back_to).into_response())
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Path(task_id): Path<String>,
) -> AppResult<Response> {
    tracing::info!("Attempting to delete task {} for user {}", task_id, user.id);

    let directory = state.tasks.clone();
    let user_id = user.id.clone();
    let id = task_id.clone();
    run_blocking(move || {
        let mut board = TaskBoard::load(directory, &user_id)?;
        board.delete(&id)
    })
    .await?;

    tracing::info!("Successfully deleted task {} for user {}", task_id, user.id);
    Ok(Redirect::to("/tasks?notice=Task%20deleted").into_response())
}

// Rebuilds the list URL so forms on the page can return to the same view
fn list_url(query: &FilterQuery) -> String {
    let params: Vec<String> = [
        ("status", &query.status),
        ("priority", &query.priority),
        ("category", &query.category),
        ("q", &query.q),
    ]
    .iter()
    .filter_map(|(key, value)| {
        value
            .as_deref()
            .filter(|v| !v.is_empty())
            .map(|v| format!("{}={}", key, urlencoding::encode(v)))
    })
    .collect();

    if params.is_empty() {
        "/tasks".to_string()
    } else {
        format!("/tasks?{}", params.join("&"))
    }
}

fn is_local_path(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.contains('\\')
}

fn task_card_html(task: &Task, back_to: &str) -> String {
    let description = task.description.as_deref().unwrap_or("");
    let due = task
        .due_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    let back_to = escape_html(back_to);

    format!(
        r#"<article class="task-card priority-{priority}">
    <header>
        <h3>{title}</h3>
        <span class="badge status-{status}">{status_label}</span>
        <span class="badge">{priority}</span>
        <span class="category">{category}</span>
    </header>
    <p class="description">{description}</p>
    <footer>
        <span class="due">{due_label}</span>
        <span class="updated">Updated {updated}</span>
        <form method="post" action="/tasks/{id}" class="inline">
            <input type="hidden" name="redirect" value="{back_to}">
            <select name="status" onchange="this.form.submit()">{status_options}</select>
        </form>
        <form method="post" action="/tasks/{id}/delete" class="inline">
            <button type="submit" class="delete-btn">Delete</button>
        </form>
    </footer>
    <details>
        <summary>Edit</summary>
        <form method="post" action="/tasks/{id}" class="task-form">
            <input type="hidden" name="redirect" value="{back_to}">
            <input name="title" value="{title}" required>
            <textarea name="description">{description}</textarea>
            <select name="priority">{priority_options}</select>
            <select name="status">{status_options}</select>
            <input name="category" value="{category}">
            <input type="date" name="due_date" value="{due}">
            <button type="submit">Save</button>
        </form>
    </details>
</article>"#,
        id = escape_html(&task.id),
        title = escape_html(&task.title),
        description = escape_html(description),
        priority = task.priority,
        status = task.status,
        status_label = task.status.label(),
        category = escape_html(&task.category),
        due = due,
        due_label = if due.is_empty() { String::new() } else { format!("Due {}", due) },
        updated = task.updated_at.format("%Y-%m-%d"),
        back_to = back_to,
        status_options = status_options(task.status.as_str()),
        priority_options = priority_options(task.priority.as_str()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_url_keeps_active_filters() {
        let query = FilterQuery {
            status: Some("completed".into()),
            priority: None,
            category: Some("Home & Garden".into()),
            q: Some(String::new()),
        };
        assert_eq!(
            list_url(&query),
            "/tasks?status=completed&category=Home%20%26%20Garden"
        );
        assert_eq!(list_url(&FilterQuery::default()), "/tasks");
    }

    #[test]
    fn only_local_redirects_are_followed() {
        assert!(is_local_path("/dashboard"));
        assert!(!is_local_path("//evil.example"));
        assert!(!is_local_path("https://evil.example"));
    }
}
