//! File resource - a regular file with fixed content

use anyhow::{Context, Result, bail};
use converge::{Action, ApplyContext, ApplyResult, Resource, ResourceState};
use std::fs;
use std::path::PathBuf;

/// A file whose content is managed
#[derive(Debug, Clone)]
pub struct File {
    /// Path as written in the config (used for the resource id)
    pub name: String,
    /// Expanded path
    pub path: PathBuf,
    /// Desired content
    pub content: String,
}

impl File {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: crate::paths::expand(&name),
            name,
            content: content.into(),
        }
    }

    fn size_details(len: usize) -> Option<String> {
        Some(format!("{len} bytes"))
    }

    fn write(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create parent directory: {}", parent.display())
            })?;
        }
        fs::write(&self.path, &self.content)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

impl Resource for File {
    fn resource_type(&self) -> &'static str {
        "file"
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn description(&self) -> String {
        format!("File {}", self.path.display())
    }

    fn current_state(&self) -> Result<ResourceState> {
        if !self.path.exists() {
            return Ok(ResourceState::Absent);
        }
        if self.path.is_dir() {
            return Ok(ResourceState::Modified {
                from: "directory".to_string(),
                to: "file".to_string(),
            });
        }

        let current = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        if current == self.content {
            Ok(ResourceState::Present {
                details: Self::size_details(current.len()),
            })
        } else {
            Ok(ResourceState::Modified {
                from: format!("{} bytes", current.len()),
                to: format!("{} bytes", self.content.len()),
            })
        }
    }

    fn desired_state(&self, action: &Action) -> ResourceState {
        if *action == Action::DELETE {
            ResourceState::Absent
        } else {
            ResourceState::Present {
                details: Self::size_details(self.content.len()),
            }
        }
    }

    fn apply(&self, action: &Action, ctx: &mut ApplyContext<'_>) -> Result<ApplyResult> {
        let current = self.current_state()?;

        if *action == Action::CREATE {
            match current {
                ResourceState::Present { .. } => Ok(ApplyResult::NoChange),
                ResourceState::Modified { .. } if self.path.is_dir() => Ok(ApplyResult::Failed {
                    error: format!("{} is a directory", self.path.display()),
                }),
                ResourceState::Modified { .. } => {
                    ctx.converge_by(
                        format!("update content of {}", self.path.display()),
                        || self.write(),
                    )?;
                    Ok(ApplyResult::Modified)
                }
                _ => {
                    ctx.converge_by(format!("create file {}", self.path.display()), || {
                        self.write()
                    })?;
                    Ok(ApplyResult::Created)
                }
            }
        } else if *action == Action::DELETE {
            if current == ResourceState::Absent {
                return Ok(ApplyResult::NoChange);
            }
            ctx.converge_by(format!("delete file {}", self.path.display()), || {
                fs::remove_file(&self.path)
                    .with_context(|| format!("Failed to delete {}", self.path.display()))
            })?;
            Ok(ApplyResult::Removed)
        } else {
            bail!("unsupported action {} for {}", action, self.id())
        }
    }
}
