use rxfield::{SimulatedTimer, Timer};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::Level;

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() {
    // if LOG_LEVEL env var is set, use it
    let level = std::env::var("LOG_LEVEL").ok().and_then(|level| Level::from_str(&level).ok()).unwrap_or(Level::INFO);
    let _ = tracing_subscriber::fmt().with_max_level(level).with_test_writer().try_init();
}

#[allow(unused)]
pub fn ms(millis: u64) -> Duration { Duration::from_millis(millis) }

/// Returns an accumulating callback and a function that drains what it has accumulated so far
#[allow(unused)]
pub fn change_watcher<T: Send + Sync + 'static>() -> (impl Fn(T) + Send + Sync + 'static, impl Fn() -> Vec<T>) {
    let changes = Arc::new(Mutex::new(Vec::new()));
    let watcher = {
        let changes = changes.clone();
        move |value: T| {
            changes.lock().unwrap().push(value);
        }
    };

    let check = move || {
        let changes: Vec<T> = changes.lock().unwrap().drain(..).collect();
        changes
    };

    (watcher, check)
}

/// Like [`change_watcher`], but stamps each value with the simulated time it arrived at
#[allow(unused)]
pub fn timed_watcher<T: Send + Sync + 'static>(timer: &SimulatedTimer) -> (impl Fn(T) + Send + Sync + 'static, impl Fn() -> Vec<(T, Duration)>) {
    let (accumulate, check) = change_watcher();
    let timer = timer.clone();
    (move |value: T| accumulate((value, timer.now())), check)
}
