//! Handler abstraction: the sink side of a metric.
//!
//! A [`Handler`] is the plugin a user writes. It is never shared
//! directly; it is wrapped in a [`SharedHandler`], which owns the
//! handler's lock, registers it for shutdown and can be attached to any
//! number of metrics.

use metr_core::fail_open::fail_open;
use metr_core::{MetrError, Record, Result};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::lifecycle;

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// A sink for records.
///
/// Methods take `&mut self`: the wrapping [`SharedHandler`] serialises
/// every call, so implementations never need their own locking.
pub trait Handler: Send {
    /// Name used in log lines
    fn name(&self) -> &str;

    /// Persist or output one record
    fn emit(&mut self, record: &Record) -> Result<()>;

    /// Make pending output durable
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Release underlying resources
    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called with every error returned by [`Handler::emit`].
    ///
    /// The default logs and swallows the error, or returns it when
    /// propagation is enabled. Sinks overriding this (to roll back a
    /// transaction, say) should finish by calling [`contain_error`].
    fn handle_error(&mut self, record: &Record, error: MetrError) -> Result<()> {
        contain_error(self.name(), record, error)
    }
}

/// Log-and-swallow an emission failure, honouring the propagate flag
pub fn contain_error(handler: &str, record: &Record, error: MetrError) -> Result<()> {
    let operation = format!("handler {} for record {}", handler, record);
    fail_open(&operation, Err::<(), _>(error)).map(|_| ())
}

struct SinkState {
    sink: Box<dyn Handler>,
    closed: bool,
}

pub(crate) struct HandlerSlot {
    id: u64,
    name: String,
    state: Mutex<SinkState>,
}

impl Drop for HandlerSlot {
    fn drop(&mut self) {
        lifecycle::deregister(self.id);
    }
}

/// A reference-counted, lock-guarded handler.
///
/// Cloning is cheap and yields the same handler. Construction registers a
/// weak reference for [`shutdown_handlers`](crate::shutdown_handlers);
/// dropping the last clone removes it again.
#[derive(Clone)]
pub struct SharedHandler {
    slot: Arc<HandlerSlot>,
}

impl SharedHandler {
    pub fn new<H: Handler + 'static>(handler: H) -> Self {
        let slot = Arc::new(HandlerSlot {
            id: NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed),
            name: handler.name().to_string(),
            state: Mutex::new(SinkState {
                sink: Box::new(handler),
                closed: false,
            }),
        });
        lifecycle::register(slot.id, Arc::downgrade(&slot));
        Self { slot }
    }

    pub(crate) fn from_slot(slot: Arc<HandlerSlot>) -> Self {
        Self { slot }
    }

    /// Process-unique handler id
    pub fn id(&self) -> u64 {
        self.slot.id
    }

    pub fn name(&self) -> &str {
        &self.slot.name
    }

    /// Whether both values refer to the same handler
    pub fn ptr_eq(&self, other: &SharedHandler) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Emit a record under the handler lock.
    ///
    /// Emission errors, panics included, are routed through
    /// [`Handler::handle_error`]; only what that returns reaches the caller.
    pub fn handle(&self, record: &Record) -> Result<()> {
        let mut state = self.lock();
        let emitted = panic::catch_unwind(AssertUnwindSafe(|| state.sink.emit(record)))
            .unwrap_or_else(|payload| {
                Err(MetrError::Handler(format!(
                    "{} panicked in emit: {}",
                    self.slot.name,
                    panic_message(payload.as_ref())
                )))
            });
        match emitted {
            Ok(()) => Ok(()),
            Err(err) => state.sink.handle_error(record, err),
        }
    }

    pub fn flush(&self) -> Result<()> {
        self.lock().sink.flush()
    }

    /// Close the sink. Calling this again is a no-op.
    pub fn close(&self) -> Result<()> {
        let mut state = self.lock();
        Self::close_locked(&mut state)
    }

    /// Flush then close while holding the lock once
    pub(crate) fn flush_and_close(&self) -> Result<()> {
        let mut state = self.lock();
        if state.closed {
            return Ok(());
        }
        state.sink.flush()?;
        Self::close_locked(&mut state)
    }

    fn close_locked(state: &mut SinkState) -> Result<()> {
        if state.closed {
            return Ok(());
        }
        state.closed = true;
        state.sink.close()
    }

    // A panicking flush or close must not leave the sink unusable
    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.slot
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

impl fmt::Debug for SharedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedHandler")
            .field("id", &self.slot.id)
            .field("name", &self.slot.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    struct Flaky {
        emitted: Arc<StdMutex<Vec<i64>>>,
        closes: Arc<StdMutex<usize>>,
    }

    impl Handler for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        fn emit(&mut self, record: &Record) -> Result<()> {
            if record.value() < 0 {
                return Err(MetrError::Handler("negative".to_string()));
            }
            self.emitted.lock().unwrap().push(record.value());
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            *self.closes.lock().unwrap() += 1;
            Ok(())
        }
    }

    fn flaky() -> (SharedHandler, Arc<StdMutex<Vec<i64>>>, Arc<StdMutex<usize>>) {
        let emitted = Arc::new(StdMutex::new(Vec::new()));
        let closes = Arc::new(StdMutex::new(0));
        let handler = SharedHandler::new(Flaky {
            emitted: emitted.clone(),
            closes: closes.clone(),
        });
        (handler, emitted, closes)
    }

    #[test]
    fn test_handle_emits_record() {
        let (handler, emitted, _) = flaky();
        handler.handle(&Record::new("h.emit", 4)).unwrap();
        assert_eq!(*emitted.lock().unwrap(), vec![4]);
    }

    #[test]
    fn test_emit_failure_is_contained() {
        let (handler, emitted, _) = flaky();
        assert!(handler.handle(&Record::new("h.fail", -1)).is_ok());
        assert!(emitted.lock().unwrap().is_empty());
    }

    struct Unstable {
        emitted: Arc<StdMutex<Vec<i64>>>,
    }

    impl Handler for Unstable {
        fn name(&self) -> &str {
            "unstable"
        }

        fn emit(&mut self, record: &Record) -> Result<()> {
            if record.value() == 13 {
                panic!("unlucky value");
            }
            self.emitted.lock().unwrap().push(record.value());
            Ok(())
        }
    }

    #[test]
    fn test_emit_panic_is_contained_and_handler_stays_usable() {
        let emitted = Arc::new(StdMutex::new(Vec::new()));
        let handler = SharedHandler::new(Unstable {
            emitted: emitted.clone(),
        });

        assert!(handler.handle(&Record::new("h.panic", 13)).is_ok());
        assert!(handler.handle(&Record::new("h.panic", 1)).is_ok());

        assert_eq!(*emitted.lock().unwrap(), vec![1]);
        assert!(!handler.is_closed());
        handler.close().unwrap();
        assert!(handler.is_closed());
    }

    #[test]
    fn test_panic_message_reads_string_payloads() {
        let literal: Box<dyn Any + Send> = Box::new("boom");
        let owned: Box<dyn Any + Send> = Box::new(String::from("bang"));
        let other: Box<dyn Any + Send> = Box::new(7_u8);

        assert_eq!(panic_message(literal.as_ref()), "boom");
        assert_eq!(panic_message(owned.as_ref()), "bang");
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }

    #[test]
    fn test_close_twice_closes_sink_once() {
        let (handler, _, closes) = flaky();

        handler.close().unwrap();
        handler.close().unwrap();

        assert!(handler.is_closed());
        assert_eq!(*closes.lock().unwrap(), 1);
    }

    #[test]
    fn test_clones_share_identity() {
        let (a, _, _) = flaky();
        let (b, _, _) = flaky();

        assert!(a.ptr_eq(&a.clone()));
        assert!(!a.ptr_eq(&b));
        assert_ne!(a.id(), b.id());
    }
}
