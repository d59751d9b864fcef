//! Process-wide settings shared by every metric and handler.
//!
//! Both values start empty at process start: propagation is off and the
//! ray id is generated on first use. They are plain process state, so
//! changing them affects every thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

static PROPAGATE_EXCEPTIONS: AtomicBool = AtomicBool::new(false);

static RAY_ID: RwLock<Option<Arc<str>>> = RwLock::new(None);

/// Whether handler failures are returned to the recording caller.
///
/// When `false` (the default) failures are logged and swallowed, so a
/// broken sink can never take down the instrumented application.
pub fn propagate_exceptions() -> bool {
    PROPAGATE_EXCEPTIONS.load(Ordering::Acquire)
}

/// Turn failure propagation on or off for the whole process
pub fn set_propagate_exceptions(enabled: bool) {
    PROPAGATE_EXCEPTIONS.store(enabled, Ordering::Release);
}

/// The correlation id attached to every record created in this process.
///
/// Generated once (UUID v4) unless [`set_ray_id`] supplied one first.
pub fn ray_id() -> Arc<str> {
    if let Some(id) = RAY_ID.read().unwrap_or_else(PoisonError::into_inner).as_ref() {
        return Arc::clone(id);
    }

    let mut slot = RAY_ID.write().unwrap_or_else(PoisonError::into_inner);
    // Another thread may have won the race between the two locks
    Arc::clone(slot.get_or_insert_with(|| Arc::from(Uuid::new_v4().to_string())))
}

/// Override the process correlation id
pub fn set_ray_id(id: impl Into<String>) {
    let id: String = id.into();
    *RAY_ID.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::from(id));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_id_is_stable_and_uuid_shaped() {
        let first = ray_id();
        let second = ray_id();

        assert_eq!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
    }
}
