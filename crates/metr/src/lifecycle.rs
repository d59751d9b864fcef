//! Process-wide handler list and ordered shutdown.
//!
//! Handlers are tracked through weak references only: the list never
//! keeps a handler alive. The entry disappears when the handler's last
//! [`SharedHandler`] is dropped, or once shutdown has closed it.

use metr_core::settings::propagate_exceptions;
use metr_core::Result;
use std::sync::{Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, error};

use crate::handler::{HandlerSlot, SharedHandler};

struct HandlerEntry {
    id: u64,
    handler: Weak<HandlerSlot>,
}

/// Registration order is preserved; shutdown walks it backwards
static HANDLERS: Mutex<Vec<HandlerEntry>> = Mutex::new(Vec::new());

// Never drop an upgraded handler while holding this guard: the drop
// path calls `deregister`, which takes the same lock.
fn handlers() -> MutexGuard<'static, Vec<HandlerEntry>> {
    HANDLERS.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn register(id: u64, handler: Weak<HandlerSlot>) {
    handlers().push(HandlerEntry { id, handler });
}

pub(crate) fn deregister(id: u64) {
    handlers().retain(|entry| entry.id != id);
}

/// Number of registered handlers that are still alive
pub fn live_handler_count() -> usize {
    handlers()
        .iter()
        .filter(|entry| entry.handler.strong_count() > 0)
        .count()
}

/// Flush and close every live handler, newest first.
///
/// Each handler is flushed and closed under its own lock, then removed
/// from the list, so a second call only sees handlers created since.
/// Errors are logged and skipped unless propagation is enabled, in which
/// case the first error aborts shutdown and the remaining handlers stay
/// registered.
pub fn shutdown_handlers() -> Result<()> {
    let snapshot: Vec<(u64, Weak<HandlerSlot>)> = handlers()
        .iter()
        .map(|entry| (entry.id, entry.handler.clone()))
        .collect();

    for (id, weak) in snapshot.into_iter().rev() {
        let Some(slot) = weak.upgrade() else {
            continue;
        };
        let handler = SharedHandler::from_slot(slot);

        match handler.flush_and_close() {
            Ok(()) => debug!("Closed handler {} ({})", handler.name(), id),
            Err(e) if propagate_exceptions() => return Err(e),
            Err(e) => debug!("Ignoring error closing handler {}: {}", handler.name(), e),
        }
        deregister(id);
    }

    Ok(())
}

/// Runs [`shutdown_handlers`] when dropped.
///
/// Hold one in `main` to get the cleanup other runtimes do at process
/// exit:
///
/// ```no_run
/// let _metrics = metr::shutdown_guard();
/// // ... record metrics ...
/// // handlers are flushed and closed here
/// ```
#[must_use = "handlers are closed when the guard is dropped"]
pub struct ShutdownGuard {
    _private: (),
}

/// Create a [`ShutdownGuard`]
pub fn shutdown_guard() -> ShutdownGuard {
    ShutdownGuard { _private: () }
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        if let Err(e) = shutdown_handlers() {
            error!("Handler shutdown aborted: {}", e);
        }
    }
}
