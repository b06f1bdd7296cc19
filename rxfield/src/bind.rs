//! Owner-safe dispatch.
//!
//! A long-lived source (an [`Rx`](crate::Rx), a watcher, a channel) often needs to call back into a
//! shorter-lived owner. Capturing the owner strongly would keep it alive forever; capturing it
//! weakly means every dispatch has to resolve it first. [`bind`] does that resolution once, in one
//! place: the returned callback upgrades its [`Weak`] reference and silently does nothing once the
//! owner has been dropped.
//!
//! ```rust
//! use rxfield::{Bind, Rx};
//! use std::sync::{Arc, Mutex};
//!
//! struct Screen {
//!     title: Mutex<String>,
//! }
//!
//! let screen = Arc::new(Screen { title: Mutex::new(String::new()) });
//! let query = Rx::new(String::new());
//! query.observe(screen.action(|q: String, screen: &Screen| *screen.title.lock().unwrap() = q));
//!
//! query.set("rust".into());
//! assert_eq!(*screen.title.lock().unwrap(), "rust");
//!
//! drop(screen);
//! query.set("ignored".into()); // no-op, the screen is gone
//! ```

use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use crate::value::{IntoObserver, Observer};

/// Outcome of a single [`Binding::dispatch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The owner was alive and the action ran
    Delivered,
    /// The owner has been dropped; nothing ran
    OwnerGone,
}

/// An action bound to an owner through a non-owning reference
pub struct Binding<O, V, F> {
    owner: Weak<O>,
    action: F,
    _phantom: PhantomData<fn(V)>,
}

impl<O, V, F> Binding<O, V, F>
where F: Fn(V, &O)
{
    pub fn new(owner: &Arc<O>, action: F) -> Self { Self { owner: Arc::downgrade(owner), action, _phantom: PhantomData } }

    /// Whether the owner can still be resolved
    pub fn is_live(&self) -> bool { self.owner.strong_count() > 0 }

    /// Resolve the owner and, if it is still alive, run the action with it
    pub fn dispatch(&self, value: V) -> Dispatch {
        match self.owner.upgrade() {
            Some(owner) => {
                (self.action)(value, &owner);
                Dispatch::Delivered
            }
            None => {
                tracing::trace!("Binding: owner dropped, skipping dispatch");
                Dispatch::OwnerGone
            }
        }
    }

    /// Collapse into a plain one-argument callback
    pub fn into_fn(self) -> impl Fn(V) {
        move |value| {
            self.dispatch(value);
        }
    }
}

impl<O, V, F: Clone> Clone for Binding<O, V, F> {
    fn clone(&self) -> Self { Self { owner: self.owner.clone(), action: self.action.clone(), _phantom: PhantomData } }
}

/// Bind `action` against `owner` without extending the owner's lifetime.
///
/// The returned callback is a no-op once `owner` has been dropped.
pub fn bind<O, V, F>(owner: &Arc<O>, action: F) -> impl Fn(V) + use<O, V, F>
where F: Fn(V, &O) {
    Binding::new(owner, action).into_fn()
}

/// Lets an owner bind its own handlers: `owner.action(|value, owner| ..)`
pub trait Bind<O> {
    fn action<V, F>(&self, action: F) -> Binding<O, V, F>
    where F: Fn(V, &O);
}

impl<O> Bind<O> for Arc<O> {
    fn action<V, F>(&self, action: F) -> Binding<O, V, F>
    where F: Fn(V, &O) {
        Binding::new(self, action)
    }
}

impl<O, V, F> IntoObserver<V> for Binding<O, V, F>
where
    O: Send + Sync + 'static,
    V: 'static,
    F: Fn(V, &O) + Send + Sync + 'static,
{
    fn into_observer(self) -> Observer<V> {
        Arc::new(move |value| {
            self.dispatch(value);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Controller {
        received: Mutex<Vec<String>>,
    }

    #[test]
    fn test_dispatch_reaches_live_owner() {
        let controller = Arc::new(Controller::default());
        let binding = Binding::new(&controller, |value: String, c: &Controller| c.received.lock().unwrap().push(value));

        assert!(binding.is_live());
        assert_eq!(binding.dispatch("a".to_string()), Dispatch::Delivered);
        assert_eq!(binding.dispatch("b".to_string()), Dispatch::Delivered);
        assert_eq!(*controller.received.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_dispatch_after_owner_dropped() {
        let calls = Arc::new(Mutex::new(0));
        let controller = Arc::new(Controller::default());
        let binding = {
            let calls = calls.clone();
            Binding::new(&controller, move |_: u32, _: &Controller| *calls.lock().unwrap() += 1)
        };

        assert_eq!(binding.dispatch(1), Dispatch::Delivered);
        drop(controller);
        assert!(!binding.is_live());
        assert_eq!(binding.dispatch(2), Dispatch::OwnerGone);
        assert_eq!(binding.dispatch(3), Dispatch::OwnerGone);
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_binding_does_not_extend_owner_lifetime() {
        let controller = Arc::new(Controller::default());
        let callback = bind(&controller, |_: (), _: &Controller| {});
        assert_eq!(Arc::strong_count(&controller), 1);
        assert_eq!(Arc::weak_count(&controller), 1);
        callback(());
        assert_eq!(Arc::strong_count(&controller), 1);
    }

    #[test]
    fn test_bind_fn_is_silent_after_drop() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let controller = Arc::new(Controller::default());
        let callback = {
            let calls = calls.clone();
            bind(&controller, move |value: i32, _: &Controller| calls.lock().unwrap().push(value))
        };

        callback(1);
        drop(controller);
        callback(2);
        assert_eq!(*calls.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_owner_action_trait() {
        let controller = Arc::new(Controller::default());
        let on_value = controller.action(|value: &'static str, c: &Controller| c.received.lock().unwrap().push(value.to_string()));

        assert_eq!(on_value.dispatch("hello"), Dispatch::Delivered);
        assert_eq!(*controller.received.lock().unwrap(), vec!["hello"]);

        let weak = Arc::downgrade(&controller);
        drop(controller);
        assert!(weak.upgrade().is_none());
        assert_eq!(on_value.dispatch("nobody home"), Dispatch::OwnerGone);
    }

    #[test]
    fn test_binding_as_rx_observer() {
        let controller = Arc::new(Controller::default());
        let rx = crate::Rx::new(String::new());
        rx.observe(controller.action(|value: String, c: &Controller| c.received.lock().unwrap().push(value)));

        rx.set("first".to_string());
        drop(controller);
        rx.set("second".to_string());
        assert_eq!(rx.get(), "second");
    }
}
