use std::sync::{Arc, RwLock};

/// Observer callback held by an [`Rx`]
pub type Observer<T> = Arc<dyn Fn(T) + Send + Sync + 'static>;

/// Trait for types that can be installed as the observer of an [`Rx`]
pub trait IntoObserver<T> {
    fn into_observer(self) -> Observer<T>;
}

/// A single-slot reactive value.
///
/// Every [`set`](Rx::set) replaces the held value and then synchronously calls the observer,
/// if one is attached, with the new value. There is at most one observer; attaching another
/// replaces it. Reassignment always fires, even when the new value equals the old one. Use
/// [`set_if_changed`](Rx::set_if_changed) for equality-gated updates.
///
/// Clones share the same slot.
pub struct Rx<T>(Arc<Inner<T>>);

struct Inner<T> {
    value: RwLock<T>,
    observer: RwLock<Option<Observer<T>>>,
}

impl<T> Clone for Rx<T> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T: Default> Default for Rx<T> {
    fn default() -> Self { Self::new(T::default()) }
}

impl<T> Rx<T> {
    pub fn new(value: T) -> Self { Self(Arc::new(Inner { value: RwLock::new(value), observer: RwLock::new(None) })) }

    /// Attach the observer, discarding any previously attached one
    pub fn observe<O: IntoObserver<T>>(&self, observer: O) {
        let previous = self.0.observer.write().expect("observer lock is poisoned").replace(observer.into_observer());
        if previous.is_some() {
            tracing::trace!("Rx: replaced existing observer");
        }
    }

    /// Remove the observer. Returns true if one was attached.
    pub fn detach(&self) -> bool { self.0.observer.write().expect("observer lock is poisoned").take().is_some() }

    pub fn has_observer(&self) -> bool { self.0.observer.read().expect("observer lock is poisoned").is_some() }

    /// Calls a closure with a borrow of the current value
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.0.value.read().expect("value lock is poisoned");
        f(&*guard)
    }

    fn observer(&self) -> Option<Observer<T>> { self.0.observer.read().expect("observer lock is poisoned").clone() }
}

impl<T: Clone> Rx<T> {
    /// Returns a clone of the current value
    pub fn get(&self) -> T { self.with(T::clone) }

    /// Replace the value and notify the observer.
    ///
    /// The observer runs after the write lock is released, so it may read or set this `Rx` again.
    pub fn set(&self, value: T) {
        *self.0.value.write().expect("value lock is poisoned") = value.clone();
        match self.observer() {
            Some(observer) => {
                tracing::trace!("Rx: notifying observer");
                observer(value)
            }
            None => tracing::trace!("Rx: set without observer"),
        }
    }
}

impl<T: Clone + PartialEq> Rx<T> {
    /// Like [`set`](Rx::set), but does nothing when the value is unchanged. Returns whether it fired.
    pub fn set_if_changed(&self, value: T) -> bool {
        if self.with(|current| *current == value) {
            return false;
        }
        self.set(value);
        true
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Rx<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.with(|value| f.debug_struct("Rx").field("value", value).field("observed", &self.has_observer()).finish())
    }
}

impl<T: std::fmt::Display> std::fmt::Display for Rx<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { self.with(|v| write!(f, "{}", v)) }
}

// Implementations for converting closures to Observer<T>
impl<F, T> IntoObserver<T> for F
where F: Fn(T) + Send + Sync + 'static
{
    fn into_observer(self) -> Observer<T> { Arc::new(self) }
}

impl<T: Send + 'static> IntoObserver<T> for std::sync::mpsc::Sender<T> {
    fn into_observer(self) -> Observer<T> {
        Arc::new(move |value| {
            let _ = self.send(value); // Ignore send errors
        })
    }
}

#[cfg(feature = "tokio")]
impl<T: Send + 'static> IntoObserver<T> for tokio::sync::mpsc::UnboundedSender<T> {
    fn into_observer(self) -> Observer<T> {
        Arc::new(move |value| {
            let _ = self.send(value); // Ignore send errors
        })
    }
}
