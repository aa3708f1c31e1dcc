use crate::errors::{AppError, AppResult, StoreResult};
use crate::insights::{apply_filter, search_tasks};
use crate::models::{NewTask, Task, TaskFilter, TaskPatch};
use crate::services::tasks::TaskDirectory;

/// One user's task list together with the active filter and search term.
///
/// Mutations go through the directory first and are then mirrored into the
/// in-memory list, so the board never shows a write that failed. Only tasks
/// already on the board can be changed through it.
pub struct TaskBoard {
    directory: TaskDirectory,
    user_id: String,
    tasks: Vec<Task>,
    filter: TaskFilter,
    search: String,
}

impl TaskBoard {
    pub fn load(directory: TaskDirectory, user_id: &str) -> StoreResult<Self> {
        let tasks = directory.list(user_id)?;
        Ok(Self {
            directory,
            user_id: user_id.to_string(),
            tasks,
            filter: TaskFilter::default(),
            search: String::new(),
        })
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn filter(&self) -> &TaskFilter {
        &self.filter
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_filter(&mut self, filter: TaskFilter) {
        self.filter = filter;
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    /// Tasks passing the structured filter.
    fn filtered(&self) -> Vec<&Task> {
        apply_filter(&self.tasks, &self.filter)
    }

    /// Tasks passing both the structured filter and the search term.
    pub fn visible(&self) -> Vec<&Task> {
        search_tasks(self.filtered(), &self.search)
    }

    pub fn create(&mut self, data: NewTask) -> StoreResult<Task> {
        let task = self.directory.create(data, &self.user_id)?;
        self.tasks.push(task.clone());
        Ok(task)
    }

    pub fn update(&mut self, task_id: &str, patch: TaskPatch) -> AppResult<Task> {
        let index = self.position(task_id)?;
        let updated = self.directory.update(task_id, patch)?;
        self.tasks[index] = updated.clone();
        Ok(updated)
    }

    pub fn delete(&mut self, task_id: &str) -> AppResult<()> {
        let index = self.position(task_id)?;
        self.directory.delete(task_id)?;
        self.tasks.remove(index);
        Ok(())
    }

    fn position(&self, task_id: &str) -> AppResult<usize> {
        self.tasks
            .iter()
            .position(|t| t.id == task_id)
            .ok_or_else(|| AppError::TaskNotFound(task_id.to_string()))
    }
}
