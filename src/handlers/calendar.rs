use axum::{
    extract::{Query, State},
    response::Response,
    Extension,
};
use chrono::{NaiveDate, Utc};
use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::insights::{month_grid, month_summary, tasks_due_on, CalendarCell, CalendarMonth};
use crate::models::{MessageQuery, MonthQuery, Task, UserProfile};
use super::{escape_html, render_page, run_blocking, task_summary_html};

pub async fn serve_calendar(
    State(state): State<AppState>,
    Extension(user): Extension<UserProfile>,
    Query(month_query): Query<MonthQuery>,
    Query(messages): Query<MessageQuery>,
) -> AppResult<Response> {
    let today = Utc::now().date_naive();
    let selected = match month_query.day.as_deref().filter(|d| !d.is_empty()) {
        Some(raw) => Some(
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| AppError::validation("Invalid day", "/calendar"))?,
        ),
        None => None,
    };
    let month = match (month_query.year, month_query.month) {
        (Some(year), Some(month)) => CalendarMonth::new(year, month),
        _ => CalendarMonth::containing(selected.unwrap_or(today)),
    }
    .ok_or_else(|| AppError::validation("Invalid month", "/calendar"))?;
    tracing::debug!("Rendering calendar {} for user {}", month.label(), user.id);

    let directory = state.tasks.clone();
    let user_id = user.id.clone();
    let tasks = run_blocking(move || Ok(directory.list(&user_id)?)).await?;
    let grid = month_grid(month, &tasks);
    let summary = month_summary(month, &tasks);

    render_page("Calendar", &user, &messages, "calendar.html", &[
        ("month_label", month.label()),
        ("prev_link", month.previous().map(month_link).unwrap_or_default()),
        ("next_link", month.next().map(month_link).unwrap_or_default()),
        ("grid", grid_html(month, &grid, today, selected)),
        ("selected_day", selected_day_html(&tasks, selected)),
        ("month_total", summary.total.to_string()),
        ("month_completed", summary.completed.to_string()),
        ("month_high", summary.high_priority.to_string()),
    ])
}

fn month_link(month: CalendarMonth) -> String {
    format!("/calendar?year={}&month={}", month.year(), month.month())
}

fn day_link(month: CalendarMonth, date: NaiveDate) -> String {
    format!("{}&day={}", month_link(month), date.format("%Y-%m-%d"))
}

// Six table rows of seven cells
fn grid_html(
    month: CalendarMonth,
    grid: &[CalendarCell<'_>],
    today: NaiveDate,
    selected: Option<NaiveDate>,
) -> String {
    grid.chunks(7)
        .map(|week| {
            let cells = week
                .iter()
                .map(|cell| {
                    let mut classes = vec!["day"];
                    if !cell.in_month {
                        classes.push("other-month");
                    }
                    if cell.date == today {
                        classes.push("today");
                    }
                    if Some(cell.date) == selected {
                        classes.push("selected");
                    }
                    let tasks = cell
                        .tasks
                        .iter()
                        .map(|task| task_summary_html(task))
                        .collect::<Vec<_>>()
                        .join("");
                    format!(
                        r#"<td class="{}"><a class="date" href="{}" title="{}">{}</a><ul>{}</ul></td>"#,
                        classes.join(" "),
                        escape_html(&day_link(month, cell.date)),
                        escape_html(&cell.date.format("%A, %B %-d, %Y").to_string()),
                        cell.date.format("%-d"),
                        tasks
                    )
                })
                .collect::<Vec<_>>()
                .join("");
            format!("<tr>{}</tr>", cells)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn selected_day_html(tasks: &[Task], selected: Option<NaiveDate>) -> String {
    let Some(date) = selected else {
        return r#"<p class="muted">Select a day to see its tasks.</p>"#.to_string();
    };

    let due = tasks_due_on(tasks, date);
    let items = if due.is_empty() {
        r#"<li class="empty">No tasks due on this day.</li>"#.to_string()
    } else {
        due.iter().map(|task| task_summary_html(task)).collect::<Vec<_>>().join("\n")
    };
    format!(
        r#"<h4>{}</h4><ul class="plain">{}</ul>"#,
        date.format("%A, %B %-d, %Y"),
        items
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::stats::fixtures::task;
    use crate::models::{Priority, TaskStatus};

    #[test]
    fn grid_renders_six_weeks() {
        let month = CalendarMonth::new(2024, 3).unwrap();
        let grid = month_grid(month, &[]);
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let selected = NaiveDate::from_ymd_opt(2024, 3, 20);

        let html = grid_html(month, &grid, today, selected);
        assert_eq!(html.matches("<tr>").count(), 6);
        assert_eq!(html.matches("<td ").count(), 42);
        assert_eq!(html.matches("today").count(), 1);
        assert_eq!(html.matches("selected").count(), 1);
        assert!(html.contains("/calendar?year=2024&amp;month=3&amp;day=2024-03-20"));
    }

    #[test]
    fn month_links_roll_over() {
        let december = CalendarMonth::new(2024, 12).unwrap();
        assert_eq!(
            december.next().map(month_link).as_deref(),
            Some("/calendar?year=2025&month=1")
        );
    }

    #[test]
    fn selected_day_lists_tasks_due_that_day() {
        let mut due = task("1", TaskStatus::Pending, Priority::High, "Work");
        due.title = "Dentist".into();
        due.due_date = NaiveDate::from_ymd_opt(2024, 3, 20);
        let tasks = vec![due, task("2", TaskStatus::Pending, Priority::Low, "Work")];

        let html = selected_day_html(&tasks, NaiveDate::from_ymd_opt(2024, 3, 20));
        assert!(html.contains("Wednesday, March 20, 2024"));
        assert!(html.contains("Dentist"));

        let html = selected_day_html(&tasks, NaiveDate::from_ymd_opt(2024, 3, 21));
        assert!(html.contains("No tasks due on this day."));

        assert!(selected_day_html(&tasks, None).contains("Select a day"));
    }
}
