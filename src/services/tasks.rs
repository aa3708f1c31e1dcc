use chrono::{DateTime, Duration, Utc};

use crate::errors::{AppError, AppResult, StoreResult};
use crate::models::{NewTask, Task, TaskPatch};
use crate::services::store::{read_collection, write_collection, Collection, SharedStore, TASKS_KEY};

/// CRUD over the task collection shared by every user of the store.
///
/// Each call reads the whole collection, changes it and writes it back.
/// Stored elements that are not valid tasks are invisible here but are
/// written back untouched. `list` scopes by owner; `update` and `delete`
/// address tasks by id alone.
#[derive(Clone)]
pub struct TaskDirectory {
    store: SharedStore,
}

impl TaskDirectory {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Tasks owned by `user_id`, in storage order.
    pub fn list(&self, user_id: &str) -> StoreResult<Vec<Task>> {
        let tasks = self.all()?;
        Ok(tasks.into_iter().filter(|t| t.user_id == user_id).collect())
    }

    pub fn get(&self, task_id: &str) -> StoreResult<Option<Task>> {
        Ok(self.all()?.into_iter().find(|t| t.id == task_id))
    }

    pub fn create(&self, data: NewTask, user_id: &str) -> StoreResult<Task> {
        let mut tasks = self.stored()?;
        let now = Utc::now();

        let task = Task {
            id: uuid::Uuid::new_v4().to_string(),
            title: data.title,
            description: data.description,
            priority: data.priority,
            status: data.status,
            category: data.category,
            due_date: data.due_date,
            created_at: now,
            updated_at: now,
            user_id: user_id.to_string(),
        };

        tasks.push(task.clone());
        write_collection(self.store.as_ref(), TASKS_KEY, &tasks)?;

        tracing::debug!("Created task {} for user {}", task.id, user_id);
        Ok(task)
    }

    pub fn update(&self, task_id: &str, patch: TaskPatch) -> AppResult<Task> {
        let mut tasks = self.stored()?;
        let task = tasks
            .records_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| {
                tracing::warn!("Task not found: {}", task_id);
                AppError::TaskNotFound(task_id.to_string())
            })?;

        patch.apply(task);
        task.updated_at = next_timestamp(task.updated_at);
        let updated = task.clone();

        write_collection(self.store.as_ref(), TASKS_KEY, &tasks)?;

        tracing::debug!("Updated task {}", task_id);
        Ok(updated)
    }

    /// Removes the task if present. Removing an unknown id writes nothing.
    pub fn delete(&self, task_id: &str) -> StoreResult<()> {
        let mut tasks = self.stored()?;
        let before = tasks.len();
        tasks.retain(|t| t.id != task_id);

        if tasks.len() == before {
            tracing::debug!("Delete of unknown task {} ignored", task_id);
            return Ok(());
        }

        write_collection(self.store.as_ref(), TASKS_KEY, &tasks)?;
        tracing::debug!("Deleted task {}", task_id);
        Ok(())
    }

    /// Every stored task regardless of owner.
    pub fn all(&self) -> StoreResult<Vec<Task>> {
        Ok(self.stored()?.into_records())
    }

    /// The stored collection as-is, elements that are not valid tasks included.
    pub fn stored(&self) -> StoreResult<Collection<Task>> {
        read_collection(self.store.as_ref(), TASKS_KEY)
    }

    /// Overwrites the stored collection with an already-serialized array,
    /// without looking at its elements.
    pub fn replace_all(&self, tasks: &serde_json::Value) -> StoreResult<()> {
        self.store.set(TASKS_KEY, &serde_json::to_string(tasks)?)
    }
}

// Strictly later than `previous` even when the clock has not moved.
fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}
