use proptest::prelude::*;
use task_service::models::{NewTask, TaskPatch};

/// Titles with at least one visible character
pub fn title_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9][a-zA-Z0-9 .,!?]{0,63}"
}

pub fn description_strategy() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[a-zA-Z0-9 .,!?]{0,255}")
}

pub fn user_id_strategy() -> impl Strategy<Value = i64> {
    1i64..=1_000_000
}

/// Creation inputs that pass validation
pub fn valid_new_task_strategy() -> impl Strategy<Value = NewTask> {
    (
        title_strategy(),
        description_strategy(),
        prop::option::of(any::<bool>()),
        user_id_strategy(),
    )
        .prop_map(|(title, description, completed, user_id)| NewTask {
            title: Some(title),
            description,
            completed,
            user_id: Some(user_id),
        })
}

/// Patches whose present fields are all valid
pub fn valid_patch_strategy() -> impl Strategy<Value = TaskPatch> {
    (
        prop::option::of(title_strategy()),
        description_strategy(),
        prop::option::of(any::<bool>()),
    )
        .prop_map(|(title, description, completed)| TaskPatch {
            title,
            description,
            completed,
            user_id: None,
        })
}
