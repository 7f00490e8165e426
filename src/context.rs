//! Process-level inputs: system properties, environment, workspace.
//!
//! Everything the resolver and the coordinator read from the outside world is
//! gathered in an [`InstanceContext`], so tests can substitute every source.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::preferences::PreferenceStore;
use crate::resolve::IconPrecedence;
use crate::resources::{BundledResources, ResourceProvider};

/// System property naming an icon file path.
pub const SYSPROP_ICON: &str = "eclipse.instance.icon";
/// System property naming the title suffix.
pub const SYSPROP_TITLE_SUFFIX: &str = "eclipse.instance.titleSuffix";
/// Environment variable naming an icon file path.
pub const ENV_ICON: &str = "ECLIPSE_INSTANCE_ICON";
/// Environment variable naming the title suffix.
pub const ENV_TITLE_SUFFIX: &str = "ECLIPSE_INSTANCE_TITLE_SUFFIX";

// ============================================================================
// SystemProperties
// ============================================================================

/// Launcher properties, as passed with `-Dname=value`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemProperties {
    values: BTreeMap<String, String>,
}

impl SystemProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects every `-Dname=value` argument. `-Dname` alone sets an empty
    /// value; other arguments are ignored.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut properties = Self::new();
        for arg in args {
            let Some(definition) = arg.as_ref().strip_prefix("-D") else {
                continue;
            };
            let (name, value) = definition.split_once('=').unwrap_or((definition, ""));
            if !name.is_empty() {
                properties.set(name, value);
            }
        }
        properties
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Read access to environment variables.
pub trait Environment {
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// A fixed set of variables.
#[derive(Debug, Clone, Default)]
pub struct MapEnvironment {
    vars: HashMap<String, String>,
}

impl MapEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.vars.remove(name)
    }
}

impl Environment for MapEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

// ============================================================================
// InstanceContext
// ============================================================================

/// All configuration inputs of one running instance.
pub struct InstanceContext {
    pub properties: SystemProperties,
    pub environment: Box<dyn Environment>,
    pub preferences: PreferenceStore,
    pub resources: Rc<dyn ResourceProvider>,
    pub precedence: IconPrecedence,
    pub workspace: Option<PathBuf>,
}

impl InstanceContext {
    /// A context over `preferences` with no properties, the process
    /// environment and the embedded resources.
    pub fn new(preferences: PreferenceStore) -> Self {
        Self {
            properties: SystemProperties::new(),
            environment: Box::new(ProcessEnvironment),
            preferences,
            resources: Rc::new(BundledResources::embedded()),
            precedence: IconPrecedence::default(),
            workspace: None,
        }
    }

    /// A context for a workspace directory, reading its preference file and
    /// the `-D` arguments in `args`.
    pub fn for_workspace<I, S>(workspace: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let workspace = workspace.into();
        let mut ctx = Self::new(PreferenceStore::for_workspace(&workspace))
            .with_properties(SystemProperties::from_args(args));
        ctx.workspace = Some(workspace);
        ctx
    }

    pub fn with_properties(mut self, properties: SystemProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_environment(mut self, environment: impl Environment + 'static) -> Self {
        self.environment = Box::new(environment);
        self
    }

    pub fn with_resources(mut self, resources: Rc<dyn ResourceProvider>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_precedence(mut self, precedence: IconPrecedence) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn workspace(&self) -> Option<&Path> {
        self.workspace.as_deref()
    }

    /// Stable identifier of the workspace, `"default"` without one.
    pub fn workspace_id(&self) -> String {
        match &self.workspace {
            Some(path) => workspace_id(path),
            None => "default".to_string(),
        }
    }
}

/// `"ws"` followed by the hex FNV-1a hash of the path's text.
///
/// The hash is fixed so the identifier is the same across runs and builds.
pub fn workspace_id(path: &Path) -> String {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in path.to_string_lossy().bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    format!("ws{hash:x}")
}
