use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;

use crate::timer::{DelayHandle, Timer};
use crate::value::{IntoObserver, Rx};

/// Quiet interval used by [`WatcherConfig::default`]
pub const DEFAULT_QUIET_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherConfig {
    /// How long the input must stay unchanged before its text is published
    pub quiet_interval: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self { Self { quiet_interval: DEFAULT_QUIET_INTERVAL } }
}

impl WatcherConfig {
    pub fn with_quiet_interval(mut self, quiet_interval: Duration) -> Self {
        self.quiet_interval = quiet_interval;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    /// No delay is armed
    Idle,
    /// A delay is armed and will publish the latest text when it elapses
    Pending,
}

/// What a raw change event did to the watcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Idle → Pending: a delay was armed
    Armed,
    /// Pending → Pending: the armed delay was cancelled, an empty reset was published, and a fresh
    /// delay was armed
    Restarted,
}

/// Debounces raw "value changed" events into settled values.
///
/// Each [`on_change`](DebouncedWatcher::on_change) (re)arms a delay of
/// [`quiet_interval`](WatcherConfig::quiet_interval). If a delay was already pending it is cancelled
/// and the empty string is published immediately, so observers can discard whatever they were
/// showing for the in-flight input. When a delay elapses without further events, the latest text is
/// published. At most one delay is armed at any time.
///
/// Dropping the watcher cancels the armed delay, if any.
pub struct DebouncedWatcher<Ti: Timer>(Arc<Inner<Ti>>);

struct Inner<Ti> {
    timer: Ti,
    config: WatcherConfig,
    value: Rx<String>,
    text: RwLock<String>,
    pending: Mutex<Option<DelayHandle>>,
}

impl<Ti: Timer> DebouncedWatcher<Ti> {
    pub fn new(timer: Ti, config: WatcherConfig) -> Self {
        Self(Arc::new(Inner { timer, config, value: Rx::new(String::new()), text: RwLock::new(String::new()), pending: Mutex::new(None) }))
    }

    /// Handle a raw change event carrying the input's text after the edit
    pub fn on_change(&self, text: impl Into<String>) -> Transition {
        // cancel before the new text is visible: a delay firing in between publishes the old text
        let transition = match self.0.take_pending() {
            Some(handle) if handle.cancel() => Transition::Restarted,
            _ => Transition::Armed,
        };
        *self.0.text.write().expect("text lock is poisoned") = text.into();

        if transition == Transition::Restarted {
            tracing::debug!("DebouncedWatcher: restarted, publishing reset");
            self.0.value.set(String::new());
        } else {
            tracing::debug!("DebouncedWatcher: armed for {:?}", self.0.config.quiet_interval);
        }

        self.0.arm(Arc::downgrade(&self.0));
        transition
    }

    /// Cancel the armed delay without publishing anything. Returns true if one was pending.
    pub fn cancel(&self) -> bool {
        let cancelled = self.0.take_pending().is_some_and(|handle| handle.cancel());
        if cancelled {
            tracing::debug!("DebouncedWatcher: cancelled");
        }
        cancelled
    }

    /// Publish the latest text now instead of waiting for the quiet interval.
    /// Returns false, publishing nothing, if no delay was pending.
    pub fn flush(&self) -> bool {
        if !self.cancel() {
            return false;
        }
        tracing::debug!("DebouncedWatcher: flushed");
        self.0.publish_text();
        true
    }

    pub fn state(&self) -> WatcherState {
        match self.0.pending.lock().expect("pending lock is poisoned").as_ref() {
            Some(handle) if handle.is_pending() => WatcherState::Pending,
            _ => WatcherState::Idle,
        }
    }

    /// Text carried by the most recent change event
    pub fn text(&self) -> String { self.0.text.read().expect("text lock is poisoned").clone() }

    /// The value the watcher publishes to
    pub fn value(&self) -> &Rx<String> { &self.0.value }

    /// Attach the observer of published values, replacing any previous one
    pub fn observe<O: IntoObserver<String>>(&self, observer: O) { self.0.value.observe(observer) }

    pub fn config(&self) -> &WatcherConfig { &self.0.config }

    pub fn timer(&self) -> &Ti { &self.0.timer }
}

impl<Ti: Timer> Inner<Ti> {
    fn take_pending(&self) -> Option<DelayHandle> { self.pending.lock().expect("pending lock is poisoned").take() }

    fn arm(&self, weak: Weak<Self>) {
        let handle = self.timer.delay(
            self.config.quiet_interval,
            Box::new(move || {
                // the watcher may have been dropped while the delay was in flight
                if let Some(inner) = weak.upgrade() {
                    inner.settle();
                }
            }),
        );
        // an observer of the reset may have re-entered on_change and armed its own delay
        let stale = self.pending.lock().expect("pending lock is poisoned").replace(handle);
        if let Some(stale) = stale {
            stale.cancel();
        }
    }

    fn settle(&self) {
        {
            let mut pending = self.pending.lock().expect("pending lock is poisoned");
            if pending.as_ref().is_some_and(|handle| !handle.is_pending()) {
                *pending = None;
            }
        }
        tracing::debug!("DebouncedWatcher: settled");
        self.publish_text();
    }

    fn publish_text(&self) {
        let text = self.text.read().expect("text lock is poisoned").clone();
        self.value.set(text);
    }
}

impl<Ti: Timer> Drop for DebouncedWatcher<Ti> {
    fn drop(&mut self) {
        if let Some(handle) = self.0.take_pending() {
            handle.cancel();
        }
    }
}

impl<Ti: Timer> std::fmt::Debug for DebouncedWatcher<Ti> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebouncedWatcher").field("state", &self.state()).field("text", &self.text()).field("config", &self.0.config).finish()
    }
}
