//! instance-icon: per-instance window icons and titles for a workbench
//!
//! This crate lets several running instances of the same workbench be told
//! apart at a glance. It resolves which icon and title suffix apply from
//! launcher properties, the environment and workspace preferences, renders
//! the icon at every standard size (recoloring an SVG template and drawing
//! optional overlay text) and keeps every window decorated as windows come
//! and go and the configuration changes.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use instance_icon::{
//!     BundledResources, ColorTriple, ICON_SIZES, IconManager, IconSpec, OverlaySpec,
//! };
//!
//! let mut manager = IconManager::new(Rc::new(BundledResources::embedded()));
//!
//! let spec = IconSpec::CustomColors {
//!     primary: ColorTriple::new(200, 30, 30),
//!     secondary: ColorTriple::DEFAULT_SECONDARY,
//!     accent: ColorTriple::DEFAULT_ACCENT,
//!     overlay: OverlaySpec::none(),
//! };
//!
//! let icons = manager.load_from_spec(&spec);
//! assert_eq!(icons.len(), ICON_SIZES.len());
//! assert!(!manager.is_using_fallback());
//! ```
//!
//! # Resolving configuration
//!
//! Launcher properties beat environment variables, which beat stored
//! preferences:
//!
//! ```
//! use instance_icon::{
//!     ConfigResolver, IconSpec, InstanceContext, MapEnvironment, PreferenceStore, Preferences,
//!     SystemProperties,
//! };
//!
//! let prefs = Preferences {
//!     title_suffix: "[PREF]".into(),
//!     ..Preferences::default()
//! };
//! let ctx = InstanceContext::new(PreferenceStore::in_memory(prefs))
//!     .with_properties(SystemProperties::from_args(["-Declipse.instance.titleSuffix=[DEV]"]))
//!     .with_environment(MapEnvironment::new());
//!
//! let resolver = ConfigResolver::new(&ctx);
//! assert_eq!(resolver.resolve_title_suffix().unwrap().as_str(), "[DEV]");
//! assert_eq!(resolver.resolve_icon_spec(), IconSpec::Fallback);
//! ```
//!
//! # Hosting
//!
//! A host implements [`Workbench`] and [`Window`] and hands them to a
//! [`Coordinator`], which takes care of startup, new windows, reloads and
//! shutdown. A startup hook running off the UI thread goes through
//! [`Coordinator::schedule_startup`] instead:
//!
//! ```no_run
//! # use std::rc::Rc;
//! # use instance_icon::{Coordinator, InstanceContext, Workbench};
//! # fn host(workbench: Rc<dyn Workbench>) {
//! let ctx = InstanceContext::for_workspace("/home/me/workspace", std::env::args());
//! let coordinator = Coordinator::new(ctx, workbench);
//! coordinator.early_startup();
//!
//! // Later, when the user saves the preference page:
//! coordinator.update_preferences(|prefs| prefs.title_suffix = "[TEST]".into());
//! # }
//! ```

mod color;
mod context;
mod error;
mod host;
mod icon;
mod lifecycle;
mod manager;
mod preferences;
pub mod render;
mod resolve;
mod resources;
mod title;

pub use color::{ColorTriple, OverlaySpec};
pub use context::{
    ENV_ICON, ENV_TITLE_SUFFIX, Environment, InstanceContext, MapEnvironment, ProcessEnvironment,
    SYSPROP_ICON, SYSPROP_TITLE_SUFFIX, SystemProperties, workspace_id,
};
pub use error::{Error, Result};
pub use host::{
    EventHandler, SubscriptionId, Topic, UiScheduler, Window, WindowId, Workbench, WorkbenchEvent,
};
pub use icon::{ICON_SIZES, IconImage, IconSet};
pub use lifecycle::{Coordinator, LifecycleState};
pub use manager::IconManager;
pub use preferences::{PREFERENCES_FILE, PreferenceStore, Preferences};
pub use resolve::{
    ActiveConfiguration, ConfigResolver, ConfigSource, IconPrecedence, IconSpec, TitleSuffix,
};
pub use resources::{
    BundledResources, MemoryResources, PredefinedTheme, ResourceProvider, TEMPLATE_PATH,
    THEME_DIR,
};
