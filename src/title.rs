//! Window title suffixes.
//!
//! The manager remembers each window's title from before the suffix was
//! added, so the suffix can be removed or swapped later without ever
//! stacking two suffixes.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::host::{Window, WindowId};

struct TrackedWindow {
    window: Rc<dyn Window>,
    original: String,
}

/// Applies, removes and swaps title suffixes on workbench windows.
#[derive(Default)]
pub struct TitleManager {
    tracked: BTreeMap<WindowId, TrackedWindow>,
}

impl TitleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `" " + suffix` to the window title unless it already ends with
    /// the suffix.
    ///
    /// The first call records the window's original title. A title that
    /// already carries the suffix (left over from a previous session) is
    /// recorded without it. Blank suffixes and disposed windows are ignored.
    pub fn apply_suffix(&mut self, window: &Rc<dyn Window>, suffix: &str) {
        let suffix = suffix.trim();
        if suffix.is_empty() || window.is_disposed() {
            return;
        }

        let title = window.title();
        let id = window.id();
        if !self.tracked.contains_key(&id) {
            if let Some(stripped) = title.strip_suffix(suffix) {
                self.track(window, stripped.trim().to_string());
                return;
            }
            self.track(window, title.clone());
        }

        if !title.ends_with(suffix) {
            let suffixed = format!("{title} {suffix}");
            log::debug!("Setting title of {id} to {suffixed:?}");
            window.set_title(&suffixed);
        }
    }

    /// Restores the recorded original title and stops tracking the window.
    pub fn remove_suffix(&mut self, window: &dyn Window) {
        let Some(entry) = self.tracked.remove(&window.id()) else {
            return;
        };
        if !window.is_disposed() {
            window.set_title(&entry.original);
        }
    }

    /// Swaps the suffix on every tracked window.
    ///
    /// Each window gets its original title back and, when `suffix` is
    /// present, the new suffix applied on top with the original recorded
    /// afresh. Disposed windows are dropped without being written.
    pub fn update_suffix(&mut self, suffix: Option<&str>) {
        let tracked = std::mem::take(&mut self.tracked);
        log::debug!("Updating title suffix on {} windows to {suffix:?}", tracked.len());

        for (id, entry) in tracked {
            if entry.window.is_disposed() {
                log::debug!("Dropping disposed {id} from title tracking");
                continue;
            }
            entry.window.set_title(&entry.original);
            if let Some(suffix) = suffix {
                self.apply_suffix(&entry.window, suffix);
            }
        }
    }

    /// Stops tracking a window without touching its title.
    pub fn untrack(&mut self, id: WindowId) {
        self.tracked.remove(&id);
    }

    /// Stops tracking every window without touching titles.
    pub fn clear(&mut self) {
        self.tracked.clear();
    }

    pub fn is_tracked(&self, id: WindowId) -> bool {
        self.tracked.contains_key(&id)
    }

    /// The title recorded before the suffix was applied.
    pub fn original_title(&self, id: WindowId) -> Option<&str> {
        self.tracked.get(&id).map(|entry| entry.original.as_str())
    }

    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    fn track(&mut self, window: &Rc<dyn Window>, original: String) {
        log::debug!("Tracking {} with original title {original:?}", window.id());
        self.tracked.insert(
            window.id(),
            TrackedWindow {
                window: window.clone(),
                original,
            },
        );
    }
}
