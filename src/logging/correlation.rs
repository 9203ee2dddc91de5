//! Run correlation IDs
//!
//! Each anonymization or attack run is tagged with a correlation ID kept in
//! thread-local storage, so log lines and errors from the same run can be
//! joined. Rayon worker threads do not inherit it.

use std::cell::RefCell;

use tracing::trace;
use uuid::Uuid;

thread_local! {
    static CURRENT_CORRELATION_ID: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Generate a new correlation ID
pub fn generate_correlation_id() -> String {
    format!("run-{}", Uuid::new_v4().simple())
}

pub fn set_correlation_id(correlation_id: impl Into<String>) {
    let correlation_id = correlation_id.into();
    trace!("Setting correlation ID: {}", correlation_id);
    CURRENT_CORRELATION_ID.with(|current| {
        *current.borrow_mut() = Some(correlation_id);
    });
}

pub fn get_correlation_id() -> Option<String> {
    CURRENT_CORRELATION_ID.with(|current| current.borrow().clone())
}

pub fn clear_correlation_id() {
    CURRENT_CORRELATION_ID.with(|current| {
        *current.borrow_mut() = None;
    });
}

/// Execute a function with a specific correlation ID, restoring the previous one after
pub fn with_correlation_id<F, R>(correlation_id: impl Into<String>, f: F) -> R
where
    F: FnOnce() -> R,
{
    let previous = get_correlation_id();
    set_correlation_id(correlation_id);
    let result = f();
    match previous {
        Some(id) => set_correlation_id(id),
        None => clear_correlation_id(),
    }
    result
}

pub fn with_new_correlation_id<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    with_correlation_id(generate_correlation_id(), f)
}

pub fn get_or_generate_correlation_id() -> String {
    get_correlation_id().unwrap_or_else(generate_correlation_id)
}
