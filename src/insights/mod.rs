//! Stateless derivations over task lists: dashboard and analytics figures,
//! the calendar grid, and list filtering. None of these fail; empty input
//! yields zeroes and empty lists.

pub mod calendar;
pub mod search;
pub mod stats;

pub use calendar::{month_grid, month_summary, tasks_due_on, CalendarCell, CalendarMonth, MonthSummary};
pub use search::{apply_filter, matches_search, search_tasks};
pub use stats::{
    category_breakdown, created_in_month, distinct_categories, percentage, priority_breakdown,
    recent_tasks, weekly_productivity, DailyCompletions, PriorityBreakdown, TaskCounts,
};
