//! Symlink resource

use anyhow::{Context, Result, bail};
use converge::{Action, ApplyContext, ApplyResult, Resource, ResourceState};
use std::fs;
use std::path::{Path, PathBuf};

/// A symlink at `target` pointing to `source`
#[derive(Debug, Clone)]
pub struct Symlink {
    /// Link path as written in the config (used for the resource id)
    pub name: String,
    /// What the symlink points to
    pub source: PathBuf,
    /// Where the symlink is created
    pub target: PathBuf,
}

#[derive(Debug)]
enum LinkState {
    Missing,
    Correct,
    WrongTarget(PathBuf),
    FileExists,
}

impl Symlink {
    pub fn new(name: impl Into<String>, source: &str) -> Self {
        let name = name.into();
        Self {
            target: crate::paths::expand(&name),
            source: crate::paths::expand(source),
            name,
        }
    }

    fn check_current(&self) -> Result<LinkState> {
        let target = &self.target;

        if !target.exists() && !target.is_symlink() {
            return Ok(LinkState::Missing);
        }
        if !target.is_symlink() {
            return Ok(LinkState::FileExists);
        }

        let link_target = fs::read_link(target).context("Failed to read symlink")?;

        // Canonicalize for comparison
        let expected = self
            .source
            .canonicalize()
            .unwrap_or_else(|_| self.source.clone());
        let actual = if link_target.is_absolute() {
            link_target.canonicalize().unwrap_or(link_target)
        } else {
            target
                .parent()
                .map(|p| p.join(&link_target))
                .and_then(|p| p.canonicalize().ok())
                .unwrap_or(link_target)
        };

        if expected == actual {
            Ok(LinkState::Correct)
        } else {
            Ok(LinkState::WrongTarget(actual))
        }
    }

    fn create_symlink(&self) -> Result<()> {
        let (source, target) = (&self.source, &self.target);

        if !source.exists() {
            bail!("Source does not exist: {}", source.display());
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create parent directory: {}", parent.display())
            })?;
        }

        // Replace a link pointing elsewhere
        if target.is_symlink() {
            fs::remove_file(target).with_context(|| {
                format!("Failed to remove existing symlink: {}", target.display())
            })?;
        }

        link(source, target).with_context(|| {
            format!(
                "Failed to create symlink: {} -> {}",
                target.display(),
                source.display()
            )
        })
    }

    fn details(&self) -> Option<String> {
        Some(format!("-> {}", self.source.display()))
    }
}

#[cfg(unix)]
fn link(source: &Path, target: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(source, target)
}

#[cfg(windows)]
fn link(source: &Path, target: &Path) -> std::io::Result<()> {
    if source.is_dir() {
        std::os::windows::fs::symlink_dir(source, target)
    } else {
        std::os::windows::fs::symlink_file(source, target)
    }
}

#[cfg(not(any(unix, windows)))]
fn link(_source: &Path, _target: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "Symlinks not supported on this platform",
    ))
}

impl Resource for Symlink {
    fn resource_type(&self) -> &'static str {
        "symlink"
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn description(&self) -> String {
        format!(
            "Symlink {} -> {}",
            self.target.display(),
            self.source.display()
        )
    }

    fn current_state(&self) -> Result<ResourceState> {
        match self.check_current()? {
            LinkState::Missing => Ok(ResourceState::Absent),
            LinkState::Correct => Ok(ResourceState::Present {
                details: self.details(),
            }),
            LinkState::WrongTarget(actual) => Ok(ResourceState::Modified {
                from: actual.to_string_lossy().to_string(),
                to: self.source.to_string_lossy().to_string(),
            }),
            LinkState::FileExists => Ok(ResourceState::Modified {
                from: "regular file".to_string(),
                to: format!("symlink -> {}", self.source.display()),
            }),
        }
    }

    fn desired_state(&self, action: &Action) -> ResourceState {
        if *action == Action::DELETE {
            ResourceState::Absent
        } else {
            ResourceState::Present {
                details: self.details(),
            }
        }
    }

    fn needs_apply(&self, action: &Action, current: &ResourceState) -> bool {
        if *action == Action::DELETE {
            // Only links are ever removed
            self.target.is_symlink()
        } else {
            *current != self.desired_state(action)
        }
    }

    fn apply(&self, action: &Action, ctx: &mut ApplyContext<'_>) -> Result<ApplyResult> {
        if *action == Action::DELETE {
            if !self.target.is_symlink() {
                return Ok(ApplyResult::NoChange);
            }
            ctx.converge_by(format!("remove symlink {}", self.target.display()), || {
                fs::remove_file(&self.target)
                    .with_context(|| format!("Failed to remove {}", self.target.display()))
            })?;
            return Ok(ApplyResult::Removed);
        }
        if *action != Action::CREATE {
            bail!("unsupported action {} for {}", action, self.id());
        }

        match self.check_current()? {
            LinkState::Correct => Ok(ApplyResult::NoChange),
            LinkState::Missing => {
                ctx.converge_by(self.description(), || self.create_symlink())?;
                Ok(ApplyResult::Created)
            }
            LinkState::WrongTarget(_) => {
                ctx.converge_by(format!("repoint {}", self.description()), || {
                    self.create_symlink()
                })?;
                Ok(ApplyResult::Modified)
            }
            // Don't overwrite existing files automatically
            LinkState::FileExists => Ok(ApplyResult::Skipped {
                reason: format!("File exists at {}", self.target.display()),
            }),
        }
    }
}
