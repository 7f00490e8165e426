//! The seam between the plugin core and the hosting workbench.
//!
//! The core never talks to a windowing toolkit directly. A host implements
//! [`Workbench`] and [`Window`]; the coordinator subscribes to window and
//! lifecycle events through it and marshals work onto the UI thread with
//! [`Workbench::run_on_ui_thread`]. Startup hooks running on other threads
//! reach the UI thread through a [`UiScheduler`].

use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::icon::IconSet;

/// Identity of a top-level window, unique for the window's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

/// A top-level workbench window.
///
/// All calls happen on the UI thread.
pub trait Window {
    fn id(&self) -> WindowId;

    /// Disposed windows must not be written to.
    fn is_disposed(&self) -> bool;

    fn title(&self) -> String;

    fn set_title(&self, title: &str);

    /// Replaces the window's icons. The host copies what it needs.
    fn set_icons(&self, icons: &IconSet);
}

/// Event topics a subscriber can listen to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Window opened and closed.
    Windows,
    /// Workbench shutdown.
    Lifecycle,
}

/// An event delivered on the UI thread.
#[derive(Clone)]
pub enum WorkbenchEvent {
    WindowOpened(Rc<dyn Window>),
    WindowClosed(Rc<dyn Window>),
    Shutdown,
}

impl WorkbenchEvent {
    pub fn topic(&self) -> Topic {
        match self {
            Self::WindowOpened(_) | Self::WindowClosed(_) => Topic::Windows,
            Self::Shutdown => Topic::Lifecycle,
        }
    }
}

impl fmt::Debug for WorkbenchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WindowOpened(w) => f.debug_tuple("WindowOpened").field(&w.id()).finish(),
            Self::WindowClosed(w) => f.debug_tuple("WindowClosed").field(&w.id()).finish(),
            Self::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Handle returned by [`Workbench::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

pub type EventHandler = Box<dyn FnMut(&WorkbenchEvent)>;

/// The hosting workbench.
pub trait Workbench {
    /// Currently open top-level windows.
    fn windows(&self) -> Vec<Rc<dyn Window>>;

    /// Registers `handler` for events of `topic`.
    fn subscribe(&self, topic: Topic, handler: EventHandler) -> Result<SubscriptionId>;

    fn unsubscribe(&self, id: SubscriptionId) -> Result<()>;

    /// Runs `task` on the UI thread, asynchronously.
    fn run_on_ui_thread(&self, task: Box<dyn FnOnce()>);
}

/// Hands tasks to the UI thread from any thread.
pub trait UiScheduler: Send + Sync {
    /// Queues `task` to run on the UI thread and returns immediately.
    fn schedule(&self, task: Box<dyn FnOnce() + Send>);
}

// ============================================================================
// Test host
// ============================================================================
