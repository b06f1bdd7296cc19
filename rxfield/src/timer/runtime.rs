use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::Instant;

use super::{DelayCallback, DelayHandle, DelayState, Timer};
use crate::error::{Error, Result};

// roughly 30 years
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Real-time [`Timer`] backed by a tokio runtime.
///
/// Each delay is a spawned task sleeping until its deadline. Cancelling the handle aborts the task.
/// The intended host is a current-thread runtime acting as the single event loop; on a multi-thread
/// runtime callbacks may run on any worker. Durations too large to represent are clamped to a
/// deadline decades away, the same as `tokio::time::sleep`.
#[derive(Clone, Debug)]
pub struct TokioTimer {
    handle: Handle,
    epoch: Instant,
}

impl TokioTimer {
    pub fn new(handle: Handle) -> Self { Self { handle, epoch: Instant::now() } }

    /// Timer on the runtime the caller is running in
    pub fn current() -> Result<Self> {
        let handle = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        Ok(Self::new(handle))
    }
}

impl Timer for TokioTimer {
    fn now(&self) -> Duration { self.epoch.elapsed() }

    fn delay(&self, duration: Duration, callback: DelayCallback) -> DelayHandle {
        let state = DelayState::new();
        let now = Instant::now();
        let deadline = now.checked_add(duration).unwrap_or_else(|| now + FAR_FUTURE);
        let task = {
            let state = state.clone();
            self.handle.spawn(async move {
                tokio::time::sleep_until(deadline).await;
                if state.fire() {
                    callback();
                }
            })
        };
        let abort = task.abort_handle();
        DelayHandle::new(state).on_cancel(move || abort.abort())
    }
}
