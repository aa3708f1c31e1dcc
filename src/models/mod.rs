mod user;
mod forms;
mod task;
mod filter;

pub use user::{User, UserProfile};
pub use forms::{
    FilterQuery, LoginForm, MessageQuery, MonthQuery, PasswordForm, ProfileForm, RegisterForm,
    TaskForm, TaskUpdateForm,
};
pub use task::{due_date, NewTask, Priority, Task, TaskPatch, TaskStatus};
pub use filter::{FieldFilter, TaskFilter};
