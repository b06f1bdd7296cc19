/*!
Debounced observable values with owner-safe dispatch.

# Design requirements:
- A value slot has exactly one observer. Reassigning the value always notifies it, synchronously.
- Bursts of raw edits are coalesced: only the text that survives a quiet interval is published,
  with an empty "reset" published whenever an in-flight value is superseded.
- At most one delay is armed per watcher, and a cancelled delay never fires.
- Callbacks into an owner hold it weakly. Once the owner is gone, dispatch is a silent no-op.
- Everything runs on one logical event loop; time is supplied by a [`Timer`] so that hosts can
  use a tokio runtime ([`TokioTimer`]) or drive a virtual clock ([`SimulatedTimer`]).

# Basic usage

```rust
use rxfield::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct SearchScreen {
    results_for: Mutex<Vec<String>>,
}

let screen = Arc::new(SearchScreen { results_for: Mutex::new(Vec::new()) });
let timer = SimulatedTimer::new();
let mut input = TextInput::new(timer.clone(), WatcherConfig::default());

// settled text → trimmed query → screen, for as long as the screen exists
let show = bind(&screen, |query: String, screen: &SearchScreen| screen.results_for.lock().unwrap().push(query));
input.watcher().observe(compose(|text: String| text.trim().to_string(), show));

input.insert_str("ru").unwrap();
timer.advance(Duration::from_millis(300));
input.insert_str("st ").unwrap(); // supersedes "ru": publishes the "" reset
timer.advance(Duration::from_secs(1));

assert_eq!(*screen.results_for.lock().unwrap(), ["", "rust"]);
```
*/

pub mod bind;
pub mod compose;
pub mod error;
pub mod input;
pub mod timer;
pub mod value;
pub mod watcher;

pub use bind::*;
pub use compose::*;
pub use error::{Error, Result};
pub use input::*;
pub use timer::*;
pub use value::*;
pub use watcher::*;
