//! Startup, live updates and teardown.
//!
//! The [`Coordinator`] ties the resolver, the icon manager and the title
//! manager to a [`Workbench`]. It decorates every open window at startup,
//! every window opened afterwards, and all of them again whenever the
//! configuration is reloaded.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::context::InstanceContext;
use crate::error::Result;
use crate::host::{SubscriptionId, Topic, UiScheduler, Window, Workbench, WorkbenchEvent};
use crate::icon::IconSet;
use crate::manager::IconManager;
use crate::preferences::Preferences;
use crate::resolve::{ActiveConfiguration, ConfigResolver, TitleSuffix};
use crate::title::TitleManager;

/// Where the coordinator is in its lifetime. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initializing,
    Active,
    CleanedUp,
}

struct Inner {
    state: LifecycleState,
    ctx: InstanceContext,
    workbench: Rc<dyn Workbench>,
    icons: Option<IconManager>,
    titles: TitleManager,
    suffix: Option<TitleSuffix>,
    subscriptions: Vec<SubscriptionId>,
}

impl Inner {
    fn apply_to_window(&mut self, window: &Rc<dyn Window>) {
        if window.is_disposed() {
            return;
        }
        if let Some(icons) = &self.icons {
            if !icons.icons().is_empty() {
                window.set_icons(icons.icons());
            }
        }
        if let Some(suffix) = &self.suffix {
            self.titles.apply_suffix(window, suffix.as_str());
        }
    }

    fn shutdown(&mut self) {
        if self.state == LifecycleState::CleanedUp {
            return;
        }

        for id in std::mem::take(&mut self.subscriptions) {
            if let Err(e) = self.workbench.unsubscribe(id) {
                log::debug!("Unsubscribe {id:?} failed during shutdown: {e}");
            }
        }
        if let Some(icons) = self.icons.as_mut() {
            icons.dispose_all();
        }
        self.titles.clear();
        self.state = LifecycleState::CleanedUp;
        log::info!("Instance icon shut down");
    }

    fn apply_to_all_windows(&mut self) {
        let windows = self.workbench.windows();
        log::debug!("Applying icons and title to {} windows", windows.len());
        for window in &windows {
            self.apply_to_window(window);
        }
    }
}

// ============================================================================
// Coordinator
// ============================================================================

/// Owns the plugin's runtime state for one workbench.
///
/// Cloning yields another handle to the same coordinator. Event handlers
/// registered with the workbench hold only weak references, so dropping
/// every handle stops all further work.
#[derive(Clone)]
pub struct Coordinator {
    inner: Rc<RefCell<Inner>>,
}

impl Coordinator {
    pub fn new(ctx: InstanceContext, workbench: Rc<dyn Workbench>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                state: LifecycleState::Uninitialized,
                ctx,
                workbench,
                icons: None,
                titles: TitleManager::new(),
                suffix: None,
                subscriptions: Vec::new(),
            })),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.borrow().state
    }

    /// Builds and starts a coordinator on the UI thread, from any thread.
    ///
    /// `build` runs inside the scheduled task, so the context and the
    /// workbench handle never cross threads. The new coordinator is
    /// initialized and then handed to `ready`, which must keep it alive.
    /// An initialization error is logged and the coordinator is still
    /// handed over.
    pub fn schedule_startup<B, R>(scheduler: &dyn UiScheduler, build: B, ready: R)
    where
        B: FnOnce() -> Coordinator + Send + 'static,
        R: FnOnce(Coordinator) + Send + 'static,
    {
        scheduler.schedule(Box::new(move || {
            let coordinator = build();
            if let Err(e) = coordinator.initialize() {
                log::error!("Failed to initialize instance icon: {e}");
            }
            ready(coordinator);
        }));
    }

    /// Defers [`initialize`](Self::initialize) to a later turn of the UI
    /// thread.
    ///
    /// Call on the UI thread; nothing touches windows until the queued task
    /// runs. From another thread use
    /// [`schedule_startup`](Self::schedule_startup).
    pub fn early_startup(&self) {
        let weak = Rc::downgrade(&self.inner);
        let workbench = self.inner.borrow().workbench.clone();
        workbench.run_on_ui_thread(Box::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if let Err(e) = (Coordinator { inner }).initialize() {
                log::error!("Failed to initialize instance icon: {e}");
            }
        }));
    }

    /// Resolves the configuration, decorates every open window and
    /// subscribes to window and shutdown events. Must run on the UI thread.
    ///
    /// Only the first call does anything. A subscription failure is
    /// returned after the open windows have been decorated.
    pub fn initialize(&self) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.state != LifecycleState::Uninitialized {
            log::debug!("Ignoring initialize in state {:?}", inner.state);
            return Ok(());
        }
        inner.state = LifecycleState::Initializing;
        log::info!("Initializing instance icon for workspace {}", inner.ctx.workspace_id());

        let (spec, suffix) = {
            let resolver = ConfigResolver::new(&inner.ctx);
            (resolver.resolve_icon_spec(), resolver.resolve_title_suffix())
        };
        let mut icons = IconManager::new(inner.ctx.resources.clone());
        icons.load_from_spec(&spec);
        inner.icons = Some(icons);
        inner.suffix = suffix;
        inner.apply_to_all_windows();

        let workbench = inner.workbench.clone();
        for topic in [Topic::Windows, Topic::Lifecycle] {
            let weak = Rc::downgrade(&self.inner);
            let handler = Box::new(move |event: &WorkbenchEvent| dispatch(&weak, event));
            match workbench.subscribe(topic, handler) {
                Ok(id) => inner.subscriptions.push(id),
                Err(e) => {
                    inner.state = LifecycleState::Active;
                    return Err(e);
                }
            }
        }

        inner.state = LifecycleState::Active;
        log::info!("Instance icon active");
        Ok(())
    }

    /// Re-reads the preference file, re-resolves the configuration and
    /// reapplies it to every open window.
    ///
    /// A changed suffix replaces the old one on all tracked windows; the
    /// icon set is always reloaded. Returns once every window has the new
    /// icons.
    pub fn reload(&self) {
        self.reapply(true);
    }

    fn reapply(&self, reread: bool) {
        let mut inner = self.inner.borrow_mut();
        if inner.state != LifecycleState::Active {
            log::warn!("Ignoring reload in state {:?}", inner.state);
            return;
        }
        if reread {
            inner.ctx.preferences.refresh();
        }

        let (spec, suffix) = {
            let resolver = ConfigResolver::new(&inner.ctx);
            (resolver.resolve_icon_spec(), resolver.resolve_title_suffix())
        };

        if suffix != inner.suffix {
            log::info!("Title suffix changed from {:?} to {:?}", inner.suffix, suffix);
            inner.titles.update_suffix(suffix.as_ref().map(TitleSuffix::as_str));
            inner.suffix = suffix;
        }

        if let Some(icons) = inner.icons.as_mut() {
            icons.load_from_spec(&spec);
        }
        inner.apply_to_all_windows();
    }

    /// Edits the stored preferences, saves them and reloads.
    ///
    /// A failed save is logged; the edited values still take effect for
    /// this session and the file is not re-read.
    pub fn update_preferences(&self, edit: impl FnOnce(&mut Preferences)) {
        let saved = {
            let mut inner = self.inner.borrow_mut();
            edit(inner.ctx.preferences.get_mut());
            match inner.ctx.preferences.save() {
                Ok(()) => true,
                Err(e) => {
                    log::error!("Failed to save preferences: {e}");
                    false
                }
            }
        };
        self.reapply(saved);
    }

    /// Unsubscribes, releases the icon set and forgets tracked windows.
    ///
    /// Unsubscribe failures are expected when the workbench is already
    /// gone and are only logged. Later calls do nothing.
    pub fn shutdown(&self) {
        self.inner.borrow_mut().shutdown();
    }

    /// The active configuration as the resolver currently sees it.
    pub fn describe(&self) -> ActiveConfiguration {
        ConfigResolver::new(&self.inner.borrow().ctx).describe()
    }

    /// The suffix currently applied to windows.
    pub fn title_suffix(&self) -> Option<TitleSuffix> {
        self.inner.borrow().suffix.clone()
    }

    pub fn is_using_fallback(&self) -> bool {
        self.inner
            .borrow()
            .icons
            .as_ref()
            .is_some_and(IconManager::is_using_fallback)
    }

    /// Runs `f` with the current icon set; empty before initialization and
    /// after shutdown.
    pub fn with_icons<R>(&self, f: impl FnOnce(&IconSet) -> R) -> R {
        let inner = self.inner.borrow();
        match &inner.icons {
            Some(icons) => f(icons.icons()),
            None => f(&IconSet::new()),
        }
    }

    pub fn tracked_windows(&self) -> usize {
        self.inner.borrow().titles.tracked_count()
    }
}

fn dispatch(weak: &Weak<RefCell<Inner>>, event: &WorkbenchEvent) {
    let Some(inner) = weak.upgrade() else {
        return;
    };

    let Ok(mut state) = inner.try_borrow_mut() else {
        log::warn!("Dropping {event:?} delivered during a configuration update");
        return;
    };
    if state.state != LifecycleState::Active {
        return;
    }
    match event {
        WorkbenchEvent::WindowOpened(window) => {
            log::debug!("{} opened", window.id());
            state.apply_to_window(window);
        }
        WorkbenchEvent::WindowClosed(window) => {
            log::debug!("{} closed", window.id());
            state.titles.untrack(window.id());
        }
        WorkbenchEvent::Shutdown => state.shutdown(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{
        ENV_TITLE_SUFFIX, MapEnvironment, SYSPROP_TITLE_SUFFIX, SystemProperties,
    };
    use crate::host::testing::{MockScheduler, MockWindow, MockWorkbench};
    use crate::icon::ICON_SIZES;
    use crate::preferences::PreferenceStore;
    use std::sync::Arc;

    fn prefs(suffix: &str) -> Preferences {
        Preferences {
            title_suffix: suffix.into(),
            ..Preferences::default()
        }
    }

    fn setup(store: PreferenceStore) -> (Rc<MockWorkbench>, Coordinator) {
        let workbench = MockWorkbench::new();
        let ctx = InstanceContext::new(store).with_environment(MapEnvironment::new());
        let coordinator = Coordinator::new(ctx, workbench.clone());
        (workbench, coordinator)
    }

    fn started(suffix: &str) -> (Rc<MockWorkbench>, Coordinator, Rc<MockWindow>) {
        let (workbench, coordinator) = setup(PreferenceStore::in_memory(prefs(suffix)));
        let window = MockWindow::new(1, "MyProject");
        workbench.add_window(window.clone());
        coordinator.initialize().unwrap();
        (workbench, coordinator, window)
    }

    #[test]
    fn early_startup_runs_on_ui_thread() {
        let (workbench, coordinator) = setup(PreferenceStore::in_memory(prefs("[DEV]")));
        let window = MockWindow::new(1, "MyProject");
        workbench.add_window(window.clone());

        coordinator.early_startup();
        assert_eq!(coordinator.state(), LifecycleState::Uninitialized);
        assert_eq!(window.title(), "MyProject");

        assert_eq!(workbench.run_pending(), 1);
        assert_eq!(coordinator.state(), LifecycleState::Active);
        assert_eq!(window.title(), "MyProject [DEV]");
        assert_eq!(window.icon_sizes(), ICON_SIZES);
        assert_eq!(workbench.subscriptions(), 2);
    }

    #[test]
    fn early_startup_after_drop_does_nothing() {
        let (workbench, coordinator) = setup(PreferenceStore::in_memory(prefs("[DEV]")));
        let window = MockWindow::new(1, "MyProject");
        workbench.add_window(window.clone());

        coordinator.early_startup();
        drop(coordinator);
        workbench.run_pending();
        assert_eq!(window.title(), "MyProject");
        assert_eq!(workbench.subscriptions(), 0);
    }

    #[test]
    fn initialize_only_once() {
        let (workbench, coordinator, window) = started("[DEV]");
        coordinator.initialize().unwrap();

        assert_eq!(workbench.subscriptions(), 2);
        assert_eq!(window.icon_updates(), 1);
        assert_eq!(window.title(), "MyProject [DEV]");
    }

    #[test]
    fn system_property_suffix_wins() {
        let workbench = MockWorkbench::new();
        let mut properties = SystemProperties::new();
        properties.set(SYSPROP_TITLE_SUFFIX, "[PROP]");
        let mut env = MapEnvironment::new();
        env.set(ENV_TITLE_SUFFIX, "[ENV]");
        let ctx = InstanceContext::new(PreferenceStore::in_memory(prefs("[PREF]")))
            .with_properties(properties)
            .with_environment(env);
        let window = MockWindow::new(1, "Main");
        workbench.add_window(window.clone());

        let coordinator = Coordinator::new(ctx, workbench.clone());
        coordinator.initialize().unwrap();
        assert_eq!(window.title(), "Main [PROP]");
        assert_eq!(coordinator.describe().title_env.as_deref(), Some("[ENV]"));
    }

    #[test]
    fn new_windows_get_cached_icons_and_suffix() {
        let (workbench, coordinator, first) = started("[DEV]");
        let generation = first.icon_generation();

        let second = MockWindow::new(2, "Second");
        workbench.open_window(second.clone());
        assert_eq!(second.title(), "Second [DEV]");
        assert_eq!(second.icon_generation(), generation, "no reload for new windows");
        assert_eq!(coordinator.tracked_windows(), 2);

        workbench.close_window(2);
        assert_eq!(coordinator.tracked_windows(), 1);
    }

    #[test]
    fn reload_updates_suffix_and_icons() {
        let (_workbench, coordinator, window) = started("[DEV]");
        let first_generation = window.icon_generation().unwrap();

        coordinator.update_preferences(|prefs| prefs.title_suffix = "[TEST]".into());
        assert_eq!(window.title(), "MyProject [TEST]");
        assert_eq!(window.icon_generation(), Some(first_generation + 1));
        assert_eq!(window.icon_sizes(), ICON_SIZES);

        coordinator.update_preferences(|prefs| prefs.title_suffix.clear());
        assert_eq!(window.title(), "MyProject");
        assert_eq!(coordinator.title_suffix(), None);
        assert_eq!(coordinator.tracked_windows(), 0);
    }

    #[test]
    fn suffix_added_at_runtime_reaches_open_windows() {
        let (_workbench, coordinator, window) = started("");
        assert_eq!(window.title(), "MyProject");

        coordinator.update_preferences(|prefs| prefs.title_suffix = "[QA]".into());
        assert_eq!(window.title(), "MyProject [QA]");
    }

    #[test]
    fn failed_save_still_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let (workbench, coordinator) = setup(PreferenceStore::open(blocker.join("prefs.json")));
        let window = MockWindow::new(1, "Main");
        workbench.add_window(window.clone());
        coordinator.initialize().unwrap();

        coordinator.update_preferences(|prefs| prefs.title_suffix = "[DEV]".into());
        assert_eq!(window.title(), "Main [DEV]");
    }

    #[test]
    fn reload_reads_changes_saved_elsewhere() {
        let dir = tempfile::tempdir().unwrap();
        let (workbench, coordinator) = setup(PreferenceStore::for_workspace(dir.path()));
        let window = MockWindow::new(1, "Main");
        workbench.add_window(window.clone());
        coordinator.initialize().unwrap();
        assert_eq!(window.title(), "Main");

        let mut other = PreferenceStore::for_workspace(dir.path());
        other.get_mut().title_suffix = "[DEV]".into();
        other.save().unwrap();

        coordinator.reload();
        assert_eq!(window.title(), "Main [DEV]");
        assert_eq!(coordinator.title_suffix().unwrap().as_str(), "[DEV]");
    }

    thread_local! {
        static UI_WORKBENCH: RefCell<Option<Rc<MockWorkbench>>> = const { RefCell::new(None) };
        static UI_COORDINATOR: RefCell<Option<Coordinator>> = const { RefCell::new(None) };
    }

    #[test]
    fn startup_scheduled_from_background_thread() {
        let workbench = MockWorkbench::new();
        let window = MockWindow::new(1, "Main");
        workbench.add_window(window.clone());
        UI_WORKBENCH.with(|slot| *slot.borrow_mut() = Some(workbench.clone()));

        let scheduler = Arc::new(MockScheduler::default());
        let background = scheduler.clone();
        std::thread::spawn(move || {
            Coordinator::schedule_startup(
                background.as_ref(),
                || {
                    let workbench = UI_WORKBENCH.with(|slot| slot.borrow().clone()).unwrap();
                    let ctx = InstanceContext::new(PreferenceStore::in_memory(prefs("[DEV]")))
                        .with_environment(MapEnvironment::new());
                    Coordinator::new(ctx, workbench)
                },
                |coordinator| UI_COORDINATOR.with(|slot| *slot.borrow_mut() = Some(coordinator)),
            );
        })
        .join()
        .unwrap();

        assert_eq!(window.title(), "Main");
        assert_eq!(scheduler.run_pending(), 1);
        assert_eq!(window.title(), "Main [DEV]");
        assert_eq!(window.icon_sizes(), ICON_SIZES);

        let coordinator = UI_COORDINATOR.with(|slot| slot.borrow_mut().take()).unwrap();
        assert_eq!(coordinator.state(), LifecycleState::Active);
        assert_eq!(workbench.subscriptions(), 2);

        workbench.open_window(MockWindow::new(2, "Second"));
        assert_eq!(coordinator.tracked_windows(), 2);
    }

    #[test]
    fn shutdown_event_cleans_up() {
        let (workbench, coordinator, window) = started("[DEV]");
        assert!(coordinator.is_using_fallback());

        workbench.shutdown();
        assert_eq!(coordinator.state(), LifecycleState::CleanedUp);
        assert_eq!(workbench.subscriptions(), 0);
        assert!(coordinator.with_icons(|icons| icons.is_empty()));
        assert_eq!(coordinator.tracked_windows(), 0);

        // No longer listening
        let late = MockWindow::new(5, "Late");
        workbench.open_window(late.clone());
        assert_eq!(late.title(), "Late");
        assert_eq!(late.icon_generation(), None);

        coordinator.reload();
        assert_eq!(window.icon_updates(), 1);
    }

    #[test]
    fn shutdown_tolerates_torn_down_workbench() {
        let (workbench, coordinator, _window) = started("[DEV]");
        workbench.set_fail_unsubscribe(true);

        coordinator.shutdown();
        coordinator.shutdown();
        assert_eq!(coordinator.state(), LifecycleState::CleanedUp);
    }

    #[test]
    fn subscribe_failure_still_decorates_windows() {
        let (workbench, coordinator) = setup(PreferenceStore::in_memory(prefs("[DEV]")));
        let window = MockWindow::new(1, "Main");
        workbench.add_window(window.clone());
        workbench.set_fail_subscribe(true);

        assert!(coordinator.initialize().is_err());
        assert_eq!(window.title(), "Main [DEV]");
        assert_eq!(coordinator.state(), LifecycleState::Active);
    }

    #[test]
    fn disposed_windows_are_skipped() {
        let (workbench, coordinator) = setup(PreferenceStore::in_memory(prefs("[DEV]")));
        let window = MockWindow::new(1, "Main");
        window.dispose();
        workbench.add_window(window.clone());

        coordinator.initialize().unwrap();
        assert_eq!(window.title(), "Main");
        assert!(!coordinator.with_icons(|icons| icons.is_empty()));
        assert_eq!(coordinator.tracked_windows(), 0);
    }
}
