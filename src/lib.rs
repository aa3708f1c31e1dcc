pub mod app;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod insights;
pub mod middleware;
pub mod models;
pub mod services;

pub use app::{build_router, AppState};
