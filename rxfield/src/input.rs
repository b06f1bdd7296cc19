use std::ops::Range;

use crate::error::{Error, Result};
use crate::timer::Timer;
use crate::watcher::{DebouncedWatcher, Transition, WatcherConfig};

/// Pre-commit veto over a proposed edit: `(current_text, byte_range, replacement) -> allow`
pub type EditHook = Box<dyn Fn(&str, Range<usize>, &str) -> bool + Send + Sync + 'static>;

/// Result of proposing an edit to a [`TextInput`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    /// The hook refused the edit; the text and the watcher are untouched
    Rejected,
    /// The edit would not change the text, so no change event was raised
    Unchanged,
    /// The edit was applied and the watcher received the change
    Committed(Transition),
}

/// A headless text input: the edit-event source feeding a [`DebouncedWatcher`].
///
/// Every proposed edit is first offered to the `should_change` hook, if one is set. An allowed
/// edit is applied and the new text is handed to the watcher as a raw change event.
pub struct TextInput<Ti: Timer> {
    text: String,
    should_change: Option<EditHook>,
    watcher: DebouncedWatcher<Ti>,
}

impl<Ti: Timer> TextInput<Ti> {
    pub fn new(timer: Ti, config: WatcherConfig) -> Self { Self { text: String::new(), should_change: None, watcher: DebouncedWatcher::new(timer, config) } }

    pub fn text(&self) -> &str { &self.text }

    pub fn watcher(&self) -> &DebouncedWatcher<Ti> { &self.watcher }

    /// Install the edit interception hook, replacing any previous one
    pub fn set_should_change<F>(&mut self, hook: F)
    where F: Fn(&str, Range<usize>, &str) -> bool + Send + Sync + 'static {
        self.should_change = Some(Box::new(hook));
    }

    /// Remove the edit interception hook; every edit is allowed again
    pub fn clear_should_change(&mut self) -> bool { self.should_change.take().is_some() }

    /// Replace the bytes in `range` with `replacement`.
    ///
    /// `range` must lie within the text and on char boundaries.
    pub fn replace_range(&mut self, range: Range<usize>, replacement: &str) -> Result<Edit> {
        let Range { start, end } = range;
        if start > end || end > self.text.len() {
            return Err(Error::RangeOutOfBounds { start, end, len: self.text.len() });
        }
        if !self.text.is_char_boundary(start) || !self.text.is_char_boundary(end) {
            return Err(Error::NotCharBoundary { start, end });
        }

        if let Some(should_change) = &self.should_change {
            if !should_change(&self.text, start..end, replacement) {
                tracing::debug!("TextInput: edit {}..{} rejected", start, end);
                return Ok(Edit::Rejected);
            }
        }

        if self.text[start..end] == *replacement {
            return Ok(Edit::Unchanged);
        }

        self.text.replace_range(start..end, replacement);
        Ok(Edit::Committed(self.watcher.on_change(self.text.as_str())))
    }

    /// Append at the end of the text, as typing does
    pub fn insert_str(&mut self, s: &str) -> Result<Edit> {
        let end = self.text.len();
        self.replace_range(end..end, s)
    }

    /// Delete the last character, as backspace does
    pub fn delete_backward(&mut self) -> Result<Edit> {
        match self.text.char_indices().next_back() {
            Some((start, _)) => self.replace_range(start..self.text.len(), ""),
            None => Ok(Edit::Unchanged),
        }
    }
}

impl<Ti: Timer> std::fmt::Debug for TextInput<Ti> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextInput").field("text", &self.text).field("should_change", &self.should_change.is_some()).field("watcher", &self.watcher).finish()
    }
}
