use std::str::FromStr;

use super::forms::FilterQuery;
use super::task::{Priority, Task, TaskStatus};

pub const ALL: &str = "all";

/// One field of the structured filter: either bypassed or an exact match.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldFilter<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> FieldFilter<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            FieldFilter::All => true,
            FieldFilter::Only(expected) => expected == value,
        }
    }
}

impl<T: FromStr<Err = String>> FieldFilter<T> {
    fn parse(raw: Option<&str>) -> Result<Self, String> {
        match raw {
            None | Some("") | Some(ALL) => Ok(FieldFilter::All),
            Some(value) => value.parse().map(FieldFilter::Only),
        }
    }
}

impl FieldFilter<String> {
    fn parse_text(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") | Some(ALL) => FieldFilter::All,
            Some(value) => FieldFilter::Only(value.to_string()),
        }
    }
}

/// Transient status/priority/category filter of the task list; never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskFilter {
    pub status: FieldFilter<TaskStatus>,
    pub priority: FieldFilter<Priority>,
    pub category: FieldFilter<String>,
}

impl TaskFilter {
    pub fn from_query(query: &FilterQuery) -> Result<Self, String> {
        Ok(Self {
            status: FieldFilter::parse(query.status.as_deref())?,
            priority: FieldFilter::parse(query.priority.as_deref())?,
            category: FieldFilter::parse_text(query.category.as_deref()),
        })
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.status.matches(&task.status)
            && self.priority.matches(&task.priority)
            && self.category.matches(&task.category)
    }

    pub fn is_all(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_sentinel_bypasses_every_field() {
        let filter = TaskFilter::from_query(&FilterQuery {
            status: Some("all".into()),
            priority: Some("all".into()),
            category: Some("all".into()),
            q: None,
        })
        .unwrap();
        assert!(filter.is_all());
    }

    #[test]
    fn parses_typed_fields() {
        let filter = TaskFilter::from_query(&FilterQuery {
            status: Some("in-progress".into()),
            priority: Some("high".into()),
            category: Some("Work".into()),
            q: None,
        })
        .unwrap();
        assert_eq!(filter.status, FieldFilter::Only(TaskStatus::InProgress));
        assert_eq!(filter.priority, FieldFilter::Only(Priority::High));
        assert_eq!(filter.category, FieldFilter::Only("Work".to_string()));
    }

    #[test]
    fn rejects_unknown_status() {
        let query = FilterQuery {
            status: Some("archived".into()),
            ..FilterQuery::default()
        };
        assert!(TaskFilter::from_query(&query).is_err());
    }
}
