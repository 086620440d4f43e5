//! Recipe configuration (`choreo.toml`)
//!
//! ```toml
//! [vars]
//! gate = "/var/run/deploy.ok"
//!
//! [[resource]]
//! type = "file"
//! name = "/etc/app/app.conf"
//! content = "port = 8080\n"
//!
//! [[choreography]]
//! name = "app"
//! on = ["file[/etc/app/app.conf]"]
//! steps = [
//!     { verb = "check_file", args = ["${gate}"] },
//!     { verb = "touch_file", args = ["/var/lib/app/last-change"] },
//! ]
//! ```

use anyhow::{Context, Result, bail};
use choregraphie::{Scope, Target};
use converge::Action;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

// ============================================================================
// Schema
// ============================================================================

/// Top-level recipe
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Values available to choreography steps as `${name}` and as verbs
    #[serde(default)]
    pub vars: BTreeMap<String, String>,

    /// Resources to converge, in order
    #[serde(default, rename = "resource")]
    pub resources: Vec<ResourceConfig>,

    /// Choreographies and the targets they attach to
    #[serde(default, rename = "choreography")]
    pub choreographies: Vec<ChoreographyConfig>,
}

/// A `[[resource]]` entry
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResourceConfig {
    File {
        name: String,
        #[serde(default)]
        action: Option<Action>,
        #[serde(default)]
        content: String,
    },
    Directory {
        name: String,
        #[serde(default)]
        action: Option<Action>,
    },
    Symlink {
        name: String,
        #[serde(default)]
        action: Option<Action>,
        source: String,
    },
    Command {
        name: String,
        #[serde(default)]
        action: Option<Action>,
        command: String,
        #[serde(default)]
        cwd: Option<String>,
        #[serde(default)]
        creates: Option<String>,
    },
}

impl ResourceConfig {
    /// Resource type, as used in ids
    pub fn resource_type(&self) -> &'static str {
        match self {
            Self::File { .. } => "file",
            Self::Directory { .. } => "directory",
            Self::Symlink { .. } => "symlink",
            Self::Command { .. } => "command",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::File { name, .. }
            | Self::Directory { name, .. }
            | Self::Symlink { name, .. }
            | Self::Command { name, .. } => name,
        }
    }

    pub fn action(&self) -> Option<&Action> {
        match self {
            Self::File { action, .. }
            | Self::Directory { action, .. }
            | Self::Symlink { action, .. }
            | Self::Command { action, .. } => action.as_ref(),
        }
    }

    /// Identifier choreographies bind to
    pub fn id(&self) -> String {
        format!("{}[{}]", self.resource_type(), self.name())
    }
}

/// A `[[choreography]]` entry
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChoreographyConfig {
    pub name: String,

    /// Targets to bind to
    #[serde(default)]
    pub on: Vec<TargetConfig>,

    /// Verbs called, in order, to build the choreography
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

/// A binding target: a resource id string, or `{ event = "..." }`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TargetConfig {
    Resource(String),
    Event { event: String },
}

impl From<&TargetConfig> for Target {
    fn from(target: &TargetConfig) -> Self {
        match target {
            TargetConfig::Resource(id) => Self::Resource(id.clone()),
            TargetConfig::Event { event } => Self::Event(event.clone()),
        }
    }
}

/// One verb call
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepConfig {
    pub verb: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

// ============================================================================
// Loading
// ============================================================================

impl Config {
    /// Load and validate the recipe at `path`
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!(
                "Config file not found: {}\nPass --config or set {}",
                path.display(),
                crate::paths::ENV_CONFIG
            );
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config: {}", path.display()))?;

        log::debug!(
            "Loaded {} resources and {} choreographies from {}",
            config.resources.len(),
            config.choreographies.len(),
            path.display()
        );
        Ok(config)
    }

    /// Parse and validate a recipe
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Invalid TOML format")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for resource in &self.resources {
            if resource.name().is_empty() {
                bail!("{} resource with an empty name", resource.resource_type());
            }
            if !ids.insert(resource.id()) {
                bail!("Duplicate resource: {}", resource.id());
            }
        }

        let mut names = HashSet::new();
        for choreography in &self.choreographies {
            if !names.insert(choreography.name.as_str()) {
                bail!("Duplicate choreography: {}", choreography.name);
            }
        }
        Ok(())
    }

    /// Whether a resource with this id is declared
    pub fn declares(&self, id: &str) -> bool {
        self.resources.iter().any(|r| r.id() == id)
    }

    /// Step arguments with `${var}` references expanded
    ///
    /// Names missing from `[vars]` fall back to the environment, and are left
    /// as written when neither knows them.
    pub fn expand_args(&self, args: &[Value]) -> Vec<Value> {
        args.iter().map(|arg| self.expand_value(arg)).collect()
    }

    fn expand_value(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.expand_str(s)),
            Value::Array(items) => Value::Array(self.expand_args(items)),
            other => other.clone(),
        }
    }

    /// Binding target for an `on` entry, with `${var}` expanded in resource ids
    pub fn target(&self, target: &TargetConfig) -> Target {
        match target {
            TargetConfig::Resource(id) => Target::Resource(self.expand_str(id)),
            TargetConfig::Event { .. } => Target::from(target),
        }
    }

    fn expand_str(&self, input: &str) -> String {
        shellexpand::env_with_context_no_errors(input, |name| {
            self.vars
                .get(name)
                .cloned()
                .or_else(|| std::env::var(name).ok())
        })
        .into_owned()
    }
}

// ============================================================================
// Authoring scope
// ============================================================================

/// Scope answering verbs that are not primitives from `[vars]`
#[derive(Debug, Clone, Default)]
pub struct VarsScope {
    vars: BTreeMap<String, String>,
}

impl VarsScope {
    pub fn new(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }
}

impl Scope for VarsScope {
    fn resolve(&self, name: &str, _args: &[Value]) -> choregraphie::Result<Value> {
        self.vars
            .get(name)
            .map(|value| Value::String(value.clone()))
            .ok_or_else(|| choregraphie::Error::UnresolvedIdentifier {
                name: name.to_string(),
            })
    }
}

// ============================================================================
// Tests
// ============================================================================
