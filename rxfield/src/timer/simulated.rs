use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use super::{DelayCallback, DelayHandle, DelayState, Timer};

/// A virtual clock for hosts that drive their own event loop, and for deterministic tests.
///
/// Time only moves when [`advance`](SimulatedTimer::advance) or
/// [`advance_to`](SimulatedTimer::advance_to) is called. Due callbacks run in deadline order
/// (ties in the order they were scheduled) with the clock set to their deadline, and may schedule
/// further delays. Cancelled delays are removed from the queue straight away. Deadlines past
/// `Duration::MAX` saturate. Clones share the same clock.
#[derive(Clone, Default)]
pub struct SimulatedTimer(Arc<Mutex<Schedule>>);

#[derive(Default)]
struct Schedule {
    now: Duration,
    next_seq: u64,
    // keyed by (deadline, scheduling order)
    queue: BTreeMap<(Duration, u64), Scheduled>,
}

struct Scheduled {
    state: Arc<DelayState>,
    callback: DelayCallback,
}

impl SimulatedTimer {
    pub fn new() -> Self { Self::default() }

    /// Move the clock forward by `by`, running every callback that falls due. Returns the number run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now().saturating_add(by);
        self.advance_to(target)
    }

    /// Move the clock to `target`, running every callback that falls due. Returns the number run.
    ///
    /// The clock never moves backwards; a `target` in the past only runs callbacks already due.
    pub fn advance_to(&self, target: Duration) -> usize {
        let target = target.max(self.now());
        let mut fired = 0;
        loop {
            let (deadline, scheduled) = {
                let mut schedule = self.0.lock().expect("schedule lock is poisoned");
                let due = schedule.queue.first_key_value().is_some_and(|((deadline, _), _)| *deadline <= target);
                if !due {
                    break;
                }
                let Some(((deadline, _), scheduled)) = schedule.queue.pop_first() else { break };
                schedule.now = schedule.now.max(deadline);
                (deadline, scheduled)
            };
            // lock released: the callback may schedule or cancel
            if scheduled.state.fire() {
                tracing::trace!("SimulatedTimer: firing delay due at {:?}", deadline);
                (scheduled.callback)();
                fired += 1;
            }
        }
        let mut schedule = self.0.lock().expect("schedule lock is poisoned");
        schedule.now = schedule.now.max(target);
        fired
    }

    /// Advance until no pending delay remains. Returns the number of callbacks run.
    pub fn run_until_idle(&self) -> usize {
        let mut fired = 0;
        while let Some(deadline) = self.next_deadline() {
            fired += self.advance_to(deadline);
        }
        fired
    }

    /// Deadline of the earliest delay that is still pending
    pub fn next_deadline(&self) -> Option<Duration> {
        let schedule = self.0.lock().expect("schedule lock is poisoned");
        schedule.queue.first_key_value().map(|((deadline, _), _)| *deadline)
    }

    /// Number of delays that are scheduled and not yet fired or cancelled
    pub fn pending(&self) -> usize { self.0.lock().expect("schedule lock is poisoned").queue.len() }
}

impl Timer for SimulatedTimer {
    fn now(&self) -> Duration { self.0.lock().expect("schedule lock is poisoned").now }

    fn delay(&self, duration: Duration, callback: DelayCallback) -> DelayHandle {
        let state = DelayState::new();
        let key = {
            let mut schedule = self.0.lock().expect("schedule lock is poisoned");
            let key = (schedule.now.saturating_add(duration), schedule.next_seq);
            schedule.next_seq += 1;
            schedule.queue.insert(key, Scheduled { state: state.clone(), callback });
            key
        };
        // weak: a queued callback may own the handle
        let queue: Weak<Mutex<Schedule>> = Arc::downgrade(&self.0);
        DelayHandle::new(state).on_cancel(move || {
            if let Some(queue) = queue.upgrade() {
                // dropped after the lock is released: the callback may own other handles
                let removed = queue.lock().expect("schedule lock is poisoned").queue.remove(&key);
                drop(removed);
            }
        })
    }
}

impl std::fmt::Debug for SimulatedTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedTimer").field("now", &self.now()).field("pending", &self.pending()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration { Duration::from_millis(millis) }

    fn log() -> (Arc<Mutex<Vec<(&'static str, Duration)>>>, impl Fn(&SimulatedTimer, &'static str) -> DelayCallback) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let entries = log.clone();
        let make = move |timer: &SimulatedTimer, name: &'static str| -> DelayCallback {
            let timer = timer.clone();
            let entries = entries.clone();
            Box::new(move || entries.lock().unwrap().push((name, timer.now())))
        };
        (log, make)
    }

    #[test]
    fn test_fires_in_deadline_order() {
        let timer = SimulatedTimer::new();
        let (log, make) = log();

        timer.delay(ms(300), make(&timer, "c"));
        timer.delay(ms(100), make(&timer, "a"));
        timer.delay(ms(200), make(&timer, "b"));
        timer.delay(ms(200), make(&timer, "b2"));

        assert_eq!(timer.advance(ms(150)), 1);
        assert_eq!(timer.now(), ms(150));
        assert_eq!(timer.advance_to(ms(1000)), 3);
        assert_eq!(*log.lock().unwrap(), vec![("a", ms(100)), ("b", ms(200)), ("b2", ms(200)), ("c", ms(300))]);
        assert_eq!(timer.now(), ms(1000));
    }

    #[test]
    fn test_cancelled_delay_never_fires() {
        let timer = SimulatedTimer::new();
        let (log, make) = log();

        let handle = timer.delay(ms(100), make(&timer, "cancelled"));
        timer.delay(ms(100), make(&timer, "kept"));
        assert_eq!(timer.pending(), 2);

        assert!(handle.cancel());
        assert_eq!(timer.pending(), 1);
        assert_eq!(timer.advance(ms(100)), 1);
        assert_eq!(*log.lock().unwrap(), vec![("kept", ms(100))]);
        assert!(!handle.cancel());
    }

    #[test]
    fn test_cancel_after_fire_returns_false() {
        let timer = SimulatedTimer::new();
        let (_log, make) = log();
        let handle = timer.delay(ms(10), make(&timer, "x"));
        timer.advance(ms(10));
        assert_eq!(handle.status(), crate::timer::DelayStatus::Fired);
        assert!(!handle.cancel());
    }

    #[test]
    fn test_callbacks_can_schedule() {
        let timer = SimulatedTimer::new();
        let (log, make) = log();
        let chained = {
            let timer = timer.clone();
            let make_next = make(&timer, "second");
            let first = make(&timer, "first");
            Box::new(move || {
                first();
                timer.delay(ms(50), make_next);
            })
        };
        timer.delay(ms(50), chained);

        assert_eq!(timer.run_until_idle(), 2);
        assert_eq!(*log.lock().unwrap(), vec![("first", ms(50)), ("second", ms(100))]);
        assert_eq!(timer.pending(), 0);
        assert_eq!(timer.next_deadline(), None);
    }

    #[test]
    fn test_clock_is_monotonic() {
        let timer = SimulatedTimer::new();
        timer.advance_to(ms(500));
        timer.advance_to(ms(100));
        assert_eq!(timer.now(), ms(500));

        let (log, make) = log();
        timer.delay(Duration::ZERO, make(&timer, "now"));
        timer.advance_to(ms(0));
        assert_eq!(*log.lock().unwrap(), vec![("now", ms(500))]);
    }

    #[test]
    fn test_cancel_removes_queue_entry() {
        let timer = SimulatedTimer::new();
        let (log, make) = log();
        let handles: Vec<_> = (0..100).map(|_| timer.delay(ms(100), make(&timer, "cancelled"))).collect();
        timer.delay(ms(200), make(&timer, "kept"));
        assert_eq!(timer.pending(), 101);

        for handle in &handles {
            assert!(handle.cancel());
        }
        assert_eq!(timer.pending(), 1);
        assert_eq!(timer.next_deadline(), Some(ms(200)));
        assert_eq!(timer.run_until_idle(), 1);
        assert_eq!(*log.lock().unwrap(), vec![("kept", ms(200))]);
    }

    #[test]
    fn test_huge_durations_saturate() {
        let timer = SimulatedTimer::new();
        let (log, make) = log();
        timer.advance(ms(1));
        timer.delay(Duration::MAX, make(&timer, "never"));
        assert_eq!(timer.next_deadline(), Some(Duration::MAX));

        assert_eq!(timer.advance(ms(10_000)), 0);
        assert_eq!(timer.advance(Duration::MAX), 1);
        assert_eq!(timer.now(), Duration::MAX);
        assert_eq!(*log.lock().unwrap(), vec![("never", Duration::MAX)]);
    }
}
