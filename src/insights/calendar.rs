use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{Priority, Task, TaskStatus};

pub const GRID_CELLS: usize = 42;

/// Years a `CalendarMonth` may fall in. The six-week window around any month
/// in this range stays well inside what `NaiveDate` can represent.
pub const YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarMonth {
    year: i32,
    month: u32,
}

impl CalendarMonth {
    /// `None` unless `month` is in 1..=12 and `year` is within [`YEARS`].
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if !YEARS.contains(&year) {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Option<Self> {
        Self::new(date.year(), date.month())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // Checked in `new`
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn previous(&self) -> Option<Self> {
        if self.month == 1 {
            Self::new(self.year - 1, 12)
        } else {
            Self::new(self.year, self.month - 1)
        }
    }

    pub fn next(&self) -> Option<Self> {
        if self.month == 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn label(&self) -> String {
        format!("{} {}", MONTH_NAMES[(self.month - 1) as usize], self.year)
    }
}

#[derive(Debug, Clone)]
pub struct CalendarCell<'a> {
    pub date: NaiveDate,
    pub in_month: bool,
    pub tasks: Vec<&'a Task>,
}

/// Six weeks of days starting on the Sunday on or before the first of
/// `month`, each with the tasks due that day.
pub fn month_grid(month: CalendarMonth, tasks: &[Task]) -> Vec<CalendarCell<'_>> {
    let first = month.first_day();
    let lead = i64::from(first.weekday().num_days_from_sunday());
    let start = first - Duration::days(lead);

    (0..GRID_CELLS as i64)
        .map(|offset| {
            let date = start + Duration::days(offset);
            CalendarCell {
                date,
                in_month: month.contains(date),
                tasks: tasks_due_on(tasks, date),
            }
        })
        .collect()
}

pub fn tasks_due_on(tasks: &[Task], date: NaiveDate) -> Vec<&Task> {
    tasks.iter().filter(|t| t.due_date == Some(date)).collect()
}

/// Figures for tasks due within a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonthSummary {
    pub total: usize,
    pub completed: usize,
    pub high_priority: usize,
}

pub fn month_summary(month: CalendarMonth, tasks: &[Task]) -> MonthSummary {
    tasks
        .iter()
        .filter(|t| t.due_date.is_some_and(|d| month.contains(d)))
        .fold(MonthSummary::default(), |mut summary, task| {
            summary.total += 1;
            if task.status == TaskStatus::Completed {
                summary.completed += 1;
            }
            if task.priority == Priority::High {
                summary.high_priority += 1;
            }
            summary
        })
}
