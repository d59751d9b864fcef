//! Recording disciplines.
//!
//! Besides [`Metric::rec`] for single values there are two scoped
//! recorders. Both finish by calling [`Metric::handle_value`], so every
//! record takes the same propagation path.

use std::fmt;
use tracing::error;

use crate::metric::Metric;

/// Accumulates deltas and records their sum exactly once.
///
/// The sum is recorded by [`close`](CounterRecorder::close), or when the
/// recorder is dropped on any other exit path (early return, `?`,
/// unwinding).
///
/// ```no_run
/// let metric = metr::get_metric("jobs.processed");
/// {
///     let mut counter = metric.rec_counter();
///     counter.add(2);
///     counter.add(3);
/// } // records 5
/// ```
#[must_use = "the sum is recorded when the counter is closed or dropped"]
pub struct CounterRecorder<'a> {
    metric: &'a Metric,
    value: i64,
    finished: bool,
}

impl<'a> CounterRecorder<'a> {
    pub(crate) fn new(metric: &'a Metric) -> Self {
        Self {
            metric,
            value: 0,
            finished: false,
        }
    }

    /// Add `delta` to the running sum, saturating at the `i64` bounds
    pub fn add(&mut self, delta: i64) {
        self.value = self.value.saturating_add(delta);
    }

    /// Sum accumulated so far
    pub fn value(&self) -> i64 {
        self.value
    }

    /// Record the sum now and report the propagation outcome
    pub fn close(mut self) -> metr_core::Result<()> {
        self.finished = true;
        self.metric.handle_value(self.value)
    }
}

impl Drop for CounterRecorder<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if let Err(e) = self.metric.handle_value(self.value) {
            error!("Counter for {} failed to record: {}", self.metric.tag(), e);
        }
    }
}

impl fmt::Debug for CounterRecorder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CounterRecorder")
            .field("tag", &self.metric.tag())
            .field("value", &self.value)
            .finish()
    }
}

/// Records `1` each time a wrapped unit of work fails with a matching error.
///
/// The work's result is always returned untouched; successes and
/// non-matching errors record nothing.
pub struct ExceptionRecorder<'a, P> {
    metric: &'a Metric,
    matches: P,
}

impl<'a, P> ExceptionRecorder<'a, P> {
    pub(crate) fn new(metric: &'a Metric, matches: P) -> Self {
        Self { metric, matches }
    }

    /// Run `work`, counting a matching failure
    pub fn run<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        P: Fn(&E) -> bool,
    {
        let err = match work() {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if (self.matches)(&err) {
            // The caller gets its own error back, so a propagation
            // failure can only be logged here
            if let Err(e) = self.metric.handle_value(1) {
                error!("Exception counter for {} failed to record: {}", self.metric.tag(), e);
            }
        }
        Err(err)
    }
}

/// Matcher for [`Metric::rec_exception`] over `anyhow::Error`: true when
/// the error is, or wraps, a `K`
pub fn error_kind<K>() -> impl Fn(&anyhow::Error) -> bool
where
    K: fmt::Display + fmt::Debug + Send + Sync + 'static,
{
    |err| err.is::<K>()
}
