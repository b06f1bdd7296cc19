use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

mod simulated;
#[cfg(feature = "tokio")]
mod runtime;

#[cfg(feature = "tokio")]
pub use runtime::TokioTimer;
pub use simulated::SimulatedTimer;

/// Callback run when a delay elapses
pub type DelayCallback = Box<dyn FnOnce() + Send + 'static>;

/// Abstraction for timing mechanisms to allow both simulated and real time
pub trait Timer: Send + Sync + Clone + 'static {
    /// Time elapsed since this timer's epoch
    fn now(&self) -> Duration;

    /// Schedules `callback` to run once after `duration`, unless the returned handle is cancelled first
    fn delay(&self, duration: Duration, callback: DelayCallback) -> DelayHandle;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayStatus {
    Pending,
    Fired,
    Cancelled,
}

const PENDING: u8 = 0;
const FIRED: u8 = 1;
const CANCELLED: u8 = 2;

/// Shared status of one scheduled delay. Exactly one of fire/cancel can win.
///
/// A [`Timer`] implementation keeps one side of the `Arc` with its scheduled callback and calls
/// [`fire`](DelayState::fire) when the deadline passes, running the callback only if that returns
/// true. The other side goes into the [`DelayHandle`].
#[derive(Debug, Default)]
pub struct DelayState(AtomicU8);

impl DelayState {
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

    /// Claim the delay for firing. False if it was cancelled (or already fired).
    pub fn fire(&self) -> bool { self.0.compare_exchange(PENDING, FIRED, Ordering::AcqRel, Ordering::Acquire).is_ok() }

    pub fn cancel(&self) -> bool { self.0.compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire).is_ok() }

    pub fn status(&self) -> DelayStatus {
        match self.0.load(Ordering::Acquire) {
            PENDING => DelayStatus::Pending,
            FIRED => DelayStatus::Fired,
            _ => DelayStatus::Cancelled,
        }
    }

    pub fn is_pending(&self) -> bool { self.0.load(Ordering::Acquire) == PENDING }
}

/// Cleanup run once when a [`DelayHandle`] wins the cancellation, e.g. aborting a task or
/// unscheduling a queue entry
pub type CancelHook = Box<dyn Fn() + Send + Sync + 'static>;

/// Handle to a scheduled delay.
///
/// Dropping the handle does not cancel the delay.
pub struct DelayHandle {
    state: Arc<DelayState>,
    on_cancel: Option<CancelHook>,
}

impl DelayHandle {
    pub fn new(state: Arc<DelayState>) -> Self { Self { state, on_cancel: None } }

    /// Run `hook` after a successful [`cancel`](DelayHandle::cancel). It never runs if the delay fired first.
    pub fn on_cancel(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_cancel = Some(Box::new(hook));
        self
    }

    /// Cancel the delay. Returns true if it was still pending, in which case its callback will never run.
    pub fn cancel(&self) -> bool {
        let cancelled = self.state.cancel();
        if cancelled {
            if let Some(hook) = &self.on_cancel {
                hook();
            }
        }
        cancelled
    }

    pub fn status(&self) -> DelayStatus { self.state.status() }

    pub fn is_pending(&self) -> bool { self.state.is_pending() }
}

impl std::fmt::Debug for DelayHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelayHandle").field("status", &self.status()).field("on_cancel", &self.on_cancel.is_some()).finish()
    }
}
