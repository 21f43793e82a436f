//! Duplicate-emission suppression for tracking signals.
//!
//! Two layers: a cooldown cache that rejects repeat emissions of the same key
//! inside a fixed window, and a debouncer that collapses a burst of triggers
//! into a single firing after a quiet period. Checking the cache never marks
//! the key; marking happens only when an emission actually fires, so a check
//! superseded by a newer debounce timer leaves no trace.

use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex},
};

use tokio::{
    task::JoinHandle,
    time::{Duration, Instant},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = false;

use crate::log_info;

pub const DEFAULT_COOLDOWN_SECS: u64 = 30;
pub const DEFAULT_DEBOUNCE_MS: u64 = 1500;
pub const DEFAULT_SWEEP_THRESHOLD: usize = 1024;

pub struct ThrottleCache {
    entries: Mutex<HashMap<String, Instant>>,
    cooldown: Duration,
    sweep_threshold: usize,
}

impl ThrottleCache {
    pub fn new(cooldown: Duration, sweep_threshold: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            cooldown,
            sweep_threshold,
        }
    }

    /// Whether an emission for `key` would currently be accepted. Does not
    /// record anything.
    pub fn should_emit(&self, key: &str) -> bool {
        let entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(accepted) => accepted.elapsed() >= self.cooldown,
            None => true,
        }
    }

    /// Records an accepted emission for `key`. Entries older than the cooldown
    /// window are swept once the map grows past the threshold, keeping the
    /// cache bounded.
    pub fn mark(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap();
        if entries.len() >= self.sweep_threshold {
            let cooldown = self.cooldown;
            entries.retain(|_, accepted| accepted.elapsed() < cooldown);
        }
        entries.insert(key.to_string(), Instant::now());
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

/// Collapses rapid re-triggers of the same key into one firing. A new emit for
/// a key aborts the timer still pending for it; only the last scheduled action
/// runs, and only if the cooldown cache accepts the key at firing time.
pub struct Debouncer {
    pending: Mutex<HashMap<String, JoinHandle<()>>>,
    delay: Duration,
    throttle: Arc<ThrottleCache>,
}

impl Debouncer {
    pub fn new(delay: Duration, throttle: Arc<ThrottleCache>) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            delay,
            throttle,
        }
    }

    pub fn emit<F, Fut>(&self, key: String, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let throttle = Arc::clone(&self.throttle);
        let delay = self.delay;
        let fire_key = key.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if throttle.should_emit(&fire_key) {
                throttle.mark(&fire_key);
                log_info!("emitting debounced action for {fire_key}");
                action().await;
            } else {
                log_info!("suppressed emission for {fire_key} (cooldown)");
            }
        });

        let mut pending = self.pending.lock().unwrap();
        if pending.len() >= self.throttle.sweep_threshold {
            pending.retain(|_, handle| !handle.is_finished());
        }
        if let Some(superseded) = pending.insert(key, handle) {
            superseded.abort();
        }
    }

    #[cfg(test)]
    fn pending_len(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}
