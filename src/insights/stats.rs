use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::models::{Priority, Task, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskCounts {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub in_progress: usize,
}

impl TaskCounts {
    pub fn of(tasks: &[Task]) -> Self {
        tasks.iter().fold(Self::default(), |mut counts, task| {
            counts.total += 1;
            match task.status {
                TaskStatus::Completed => counts.completed += 1,
                TaskStatus::Pending => counts.pending += 1,
                TaskStatus::InProgress => counts.in_progress += 1,
            }
            counts
        })
    }

    pub fn for_status(&self, status: TaskStatus) -> usize {
        match status {
            TaskStatus::Completed => self.completed,
            TaskStatus::Pending => self.pending,
            TaskStatus::InProgress => self.in_progress,
        }
    }

    /// Completed share in whole percent; 0 for an empty list.
    pub fn completion_rate(&self) -> u32 {
        percentage(self.completed, self.total)
    }
}

/// `round(count / total * 100)`, or 0 when `total` is 0.
pub fn percentage(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((count as f64 / total as f64) * 100.0).round() as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PriorityBreakdown {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl PriorityBreakdown {
    pub fn get(&self, priority: Priority) -> usize {
        match priority {
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }
}

pub fn priority_breakdown(tasks: &[Task]) -> PriorityBreakdown {
    tasks.iter().fold(PriorityBreakdown::default(), |mut acc, task| {
        match task.priority {
            Priority::High => acc.high += 1,
            Priority::Medium => acc.medium += 1,
            Priority::Low => acc.low += 1,
        }
        acc
    })
}

/// Count per category string, in order of first appearance.
pub fn category_breakdown(tasks: &[Task]) -> Vec<(String, usize)> {
    let mut breakdown: Vec<(String, usize)> = Vec::new();
    for task in tasks {
        match breakdown.iter_mut().find(|(category, _)| *category == task.category) {
            Some((_, count)) => *count += 1,
            None => breakdown.push((task.category.clone(), 1)),
        }
    }
    breakdown
}

/// Sorted, de-duplicated category names, for the filter selector.
pub fn distinct_categories(tasks: &[Task]) -> Vec<String> {
    let mut categories: Vec<String> = tasks
        .iter()
        .map(|t| t.category.clone())
        .filter(|c| !c.is_empty())
        .collect();
    categories.sort();
    categories.dedup();
    categories
}

/// Tasks created in the same calendar month and year as `now`.
pub fn created_in_month(tasks: &[Task], now: DateTime<Utc>) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|t| t.created_at.year() == now.year() && t.created_at.month() == now.month())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyCompletions {
    pub date: NaiveDate,
    pub completed: usize,
}

/// Completed tasks per day for the seven days ending at `today`, oldest
/// first. A task counts on the day of its last update.
pub fn weekly_productivity(tasks: &[Task], today: NaiveDate) -> Vec<DailyCompletions> {
    (0..7)
        .rev()
        .map(|days_back| {
            let date = today - Duration::days(days_back);
            let completed = tasks
                .iter()
                .filter(|t| t.status == TaskStatus::Completed && t.updated_at.date_naive() == date)
                .count();
            DailyCompletions { date, completed }
        })
        .collect()
}

/// The `limit` most recently updated tasks, newest first.
pub fn recent_tasks(tasks: &[Task], limit: usize) -> Vec<&Task> {
    let mut recent: Vec<&Task> = tasks.iter().collect();
    recent.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    recent.truncate(limit);
    recent
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn task(id: &str, status: TaskStatus, priority: Priority, category: &str) -> Task {
        let stamp: DateTime<Utc> = "2024-03-10T09:00:00Z".parse().unwrap();
        Task {
            id: id.to_string(),
            title: format!("task {}", id),
            description: None,
            priority,
            status,
            category: category.to_string(),
            due_date: None,
            created_at: stamp,
            updated_at: stamp,
            user_id: "u1".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::task;
    use super::*;

    fn sample() -> Vec<Task> {
        vec![
            task("1", TaskStatus::Completed, Priority::High, "Work"),
            task("2", TaskStatus::Pending, Priority::Low, "Home"),
            task("3", TaskStatus::InProgress, Priority::High, "Work"),
            task("4", TaskStatus::Completed, Priority::Medium, "Errands"),
            task("5", TaskStatus::Pending, Priority::High, "Work"),
            task("6", TaskStatus::Completed, Priority::Low, "Home"),
        ]
    }

    #[test]
    fn counts_partition_the_list() {
        let tasks = sample();
        let counts = TaskCounts::of(&tasks);
        assert_eq!(counts.total, 6);
        assert_eq!(counts.completed + counts.pending + counts.in_progress, counts.total);
        assert_eq!(counts.completion_rate(), 50);
    }

    #[test]
    fn completion_rate_of_nothing_is_zero() {
        assert_eq!(TaskCounts::of(&[]).completion_rate(), 0);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn completion_rate_rounds_to_nearest() {
        let tasks = vec![
            task("1", TaskStatus::Completed, Priority::Low, "a"),
            task("2", TaskStatus::Completed, Priority::Low, "a"),
            task("3", TaskStatus::Pending, Priority::Low, "a"),
        ];
        assert_eq!(TaskCounts::of(&tasks).completion_rate(), 67);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(3, 3), 100);
    }

    #[test]
    fn breakdowns() {
        let tasks = sample();
        assert_eq!(
            priority_breakdown(&tasks),
            PriorityBreakdown { high: 3, medium: 1, low: 2 }
        );
        assert_eq!(
            category_breakdown(&tasks),
            vec![
                ("Work".to_string(), 3),
                ("Home".to_string(), 2),
                ("Errands".to_string(), 1),
            ]
        );
        assert_eq!(distinct_categories(&tasks), vec!["Errands", "Home", "Work"]);
    }

    #[test]
    fn monthly_filter_matches_month_and_year() {
        let mut tasks = sample();
        tasks[1].created_at = "2024-02-29T23:59:59Z".parse().unwrap();
        tasks[2].created_at = "2023-03-10T09:00:00Z".parse().unwrap();

        let now: DateTime<Utc> = "2024-03-31T12:00:00Z".parse().unwrap();
        let ids: Vec<_> = created_in_month(&tasks, now).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "4", "5", "6"]);
    }

    #[test]
    fn weekly_productivity_counts_completions_by_update_day() {
        let mut tasks = sample();
        tasks[0].updated_at = "2024-03-15T08:00:00Z".parse().unwrap();
        tasks[3].updated_at = "2024-03-15T22:00:00Z".parse().unwrap();
        tasks[5].updated_at = "2024-03-09T10:00:00Z".parse().unwrap();
        // Not completed, never counted.
        tasks[1].updated_at = "2024-03-15T10:00:00Z".parse().unwrap();

        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let week = weekly_productivity(&tasks, today);

        assert_eq!(week.len(), 7);
        assert_eq!(week[0].date, NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert_eq!(week[6].date, today);
        assert_eq!(week[0].completed, 1);
        assert_eq!(week[6].completed, 2);
        let total: usize = week.iter().map(|d| d.completed).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn recent_tasks_newest_first() {
        let mut tasks = sample();
        tasks[4].updated_at = "2024-03-20T00:00:00Z".parse().unwrap();
        tasks[2].updated_at = "2024-03-19T00:00:00Z".parse().unwrap();

        let recent = recent_tasks(&tasks, 5);
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].id, "5");
        assert_eq!(recent[1].id, "3");
    }
}
