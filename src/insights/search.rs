use crate::models::{Task, TaskFilter};

/// Case-insensitive substring match on title or description. An empty term
/// matches everything.
pub fn matches_search(task: &Task, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    task.title.to_lowercase().contains(&term)
        || task
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(&term))
}

pub fn apply_filter<'a>(tasks: &'a [Task], filter: &TaskFilter) -> Vec<&'a Task> {
    tasks.iter().filter(|t| filter.matches(t)).collect()
}

pub fn search_tasks<'a, I>(tasks: I, term: &str) -> Vec<&'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    tasks.into_iter().filter(|t| matches_search(t, term)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::stats::fixtures::task;
    use crate::models::{FieldFilter, Priority, TaskStatus};

    fn sample() -> Vec<Task> {
        let mut tasks = vec![
            task("1", TaskStatus::Pending, Priority::High, "Work"),
            task("2", TaskStatus::Completed, Priority::Low, "Home"),
            task("3", TaskStatus::Pending, Priority::Low, "Work"),
        ];
        tasks[0].title = "Quarterly REPORT".into();
        tasks[1].description = Some("pick up the report binder".into());
        tasks
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_description() {
        let tasks = sample();
        let ids: Vec<_> = search_tasks(&tasks, "Report").iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(search_tasks(&tasks, "  ").len(), 3);
        assert!(search_tasks(&tasks, "nothing like this").is_empty());
    }

    #[test]
    fn default_filter_returns_everything() {
        let tasks = sample();
        assert_eq!(apply_filter(&tasks, &TaskFilter::default()).len(), tasks.len());
    }

    #[test]
    fn structured_filter_combines_fields() {
        let tasks = sample();
        let filter = TaskFilter {
            status: FieldFilter::Only(TaskStatus::Pending),
            priority: FieldFilter::All,
            category: FieldFilter::Only("Work".into()),
        };
        let ids: Vec<_> = apply_filter(&tasks, &filter).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);

        let filter = TaskFilter {
            priority: FieldFilter::Only(Priority::Low),
            ..filter
        };
        let ids: Vec<_> = apply_filter(&tasks, &filter).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["3"]);
    }
}
