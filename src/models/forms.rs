use serde::Deserialize;

use super::task::{due_date, NewTask, Priority, TaskPatch, TaskStatus};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Create form for a task. Every field arrives as text from the browser.
#[derive(Debug, Deserialize)]
pub struct TaskForm {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub due_date: String,
}

/// Edit form. Absent fields are left alone; an empty description or due
/// date clears it.
#[derive(Debug, Deserialize, Default)]
pub struct TaskUpdateForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub due_date: Option<String>,
    pub redirect: Option<String>,
}

impl TaskForm {
    pub fn into_new_task(self) -> Result<NewTask, String> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err("Title is required".to_string());
        }
        let priority: Priority = self.priority.parse()?;
        let status = match self.status.as_deref() {
            None | Some("") => TaskStatus::Pending,
            Some(raw) => raw.parse()?,
        };
        let due_date = if self.due_date.trim().is_empty() {
            None
        } else {
            Some(
                due_date::parse(&self.due_date)
                    .ok_or_else(|| format!("Invalid due date '{}'", self.due_date))?,
            )
        };

        Ok(NewTask {
            title,
            description: non_empty(self.description),
            priority,
            status,
            category: self.category.trim().to_string(),
            due_date,
        })
    }
}

impl TaskUpdateForm {
    pub fn into_patch(self) -> Result<TaskPatch, String> {
        let title = match self.title {
            Some(title) if title.trim().is_empty() => {
                return Err("Title is required".to_string());
            }
            Some(title) => Some(title.trim().to_string()),
            None => None,
        };
        let due_date = match self.due_date {
            None => None,
            Some(raw) if raw.trim().is_empty() => Some(None),
            Some(raw) => Some(Some(
                due_date::parse(&raw).ok_or_else(|| format!("Invalid due date '{}'", raw))?,
            )),
        };

        Ok(TaskPatch {
            title,
            description: self.description.map(non_empty),
            priority: self.priority.map(|p| p.parse::<Priority>()).transpose()?,
            status: self.status.map(|s| s.parse::<TaskStatus>()).transpose()?,
            category: self.category.map(|c| c.trim().to_string()),
            due_date,
        })
    }
}

/// Query string of the task list page. "all" (or an absent value) disables a
/// field.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct FilterQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct MonthQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    /// Selected day as `YYYY-MM-DD`.
    pub day: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub notice: Option<String>,
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn task_form_defaults_status_and_drops_blank_description() {
        let task = TaskForm {
            title: "  Buy milk ".into(),
            description: "   ".into(),
            priority: "low".into(),
            status: None,
            category: "Home".into(),
            due_date: "2024-03-15".into(),
        }
        .into_new_task()
        .unwrap();

        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.description, None);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2024, 3, 15));
    }

    #[test]
    fn task_form_rejects_unknown_priority() {
        let err = TaskForm {
            title: "x".into(),
            description: String::new(),
            priority: "urgent".into(),
            status: None,
            category: String::new(),
            due_date: String::new(),
        }
        .into_new_task()
        .unwrap_err();
        assert!(err.contains("urgent"));
    }

    #[test]
    fn update_form_only_touches_present_fields() {
        let patch = TaskUpdateForm {
            status: Some("completed".into()),
            due_date: Some(String::new()),
            ..TaskUpdateForm::default()
        }
        .into_patch()
        .unwrap();

        assert_eq!(patch.status, Some(TaskStatus::Completed));
        assert_eq!(patch.due_date, Some(None));
        assert_eq!(patch.title, None);
        assert_eq!(patch.description, None);
    }
}
