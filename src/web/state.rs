//! # Web Application State

use crate::services::TaskLifecycleService;

/// Shared state handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub tasks: TaskLifecycleService,
}

impl AppState {
    pub fn new(tasks: TaskLifecycleService) -> Self {
        Self { tasks }
    }
}
