//! Process-wide map from tag to metric

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use crate::metric::Metric;

static METRICS: OnceLock<Mutex<HashMap<String, Arc<Metric>>>> = OnceLock::new();

fn metrics() -> MutexGuard<'static, HashMap<String, Arc<Metric>>> {
    METRICS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Get the metric for `tag`, creating it on first use.
///
/// Every caller asking for the same tag gets the same instance, even
/// when racing on another thread.
pub fn get_metric(tag: &str) -> Arc<Metric> {
    let mut map = metrics();
    if let Some(metric) = map.get(tag) {
        return Arc::clone(metric);
    }
    let metric = Arc::new(Metric::new(tag));
    map.insert(tag.to_string(), Arc::clone(&metric));
    metric
}

/// Register `metric` under its tag, replacing any existing entry
pub fn add_metric(metric: Metric) -> Arc<Metric> {
    let metric = Arc::new(metric);
    let replaced = metrics().insert(metric.tag().to_string(), Arc::clone(&metric));
    // Dropped here, outside the map lock
    drop(replaced);
    metric
}

/// Look up a metric without creating it
pub fn find_metric(tag: &str) -> Option<Arc<Metric>> {
    metrics().get(tag).cloned()
}

/// Proper prefixes of `tag`, longest first.
///
/// `"a.b.c"` yields `"a.b"` then `"a"`; a tag without a dot yields
/// nothing.
pub fn ancestor_tags(tag: &str) -> impl Iterator<Item = &str> {
    tag.rmatch_indices('.').map(move |(idx, _)| &tag[..idx])
}

/// The registered metric with the longest tag that is a proper prefix of `tag`
pub(crate) fn nearest_ancestor(tag: &str) -> Option<Arc<Metric>> {
    let map = metrics();
    ancestor_tags(tag).find_map(|prefix| map.get(prefix).cloned())
}
