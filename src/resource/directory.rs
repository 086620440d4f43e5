//! Directory resource

use anyhow::{Context, Result, bail};
use converge::{Action, ApplyContext, ApplyResult, Resource, ResourceState};
use std::fs;
use std::path::PathBuf;

/// A directory that should exist (or not)
///
/// Deleting only removes empty directories.
#[derive(Debug, Clone)]
pub struct Directory {
    pub name: String,
    pub path: PathBuf,
}

impl Directory {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: crate::paths::expand(&name),
            name,
        }
    }
}

impl Resource for Directory {
    fn resource_type(&self) -> &'static str {
        "directory"
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn description(&self) -> String {
        format!("Directory {}", self.path.display())
    }

    fn current_state(&self) -> Result<ResourceState> {
        if self.path.is_dir() {
            Ok(ResourceState::Present { details: None })
        } else if self.path.exists() {
            Ok(ResourceState::Modified {
                from: "file".to_string(),
                to: "directory".to_string(),
            })
        } else {
            Ok(ResourceState::Absent)
        }
    }

    fn desired_state(&self, action: &Action) -> ResourceState {
        if *action == Action::DELETE {
            ResourceState::Absent
        } else {
            ResourceState::Present { details: None }
        }
    }

    fn apply(&self, action: &Action, ctx: &mut ApplyContext<'_>) -> Result<ApplyResult> {
        let current = self.current_state()?;

        if *action == Action::CREATE {
            match current {
                ResourceState::Present { .. } => Ok(ApplyResult::NoChange),
                ResourceState::Modified { .. } => Ok(ApplyResult::Failed {
                    error: format!("{} exists and is not a directory", self.path.display()),
                }),
                _ => {
                    ctx.converge_by(format!("create directory {}", self.path.display()), || {
                        fs::create_dir_all(&self.path).with_context(|| {
                            format!("Failed to create {}", self.path.display())
                        })
                    })?;
                    Ok(ApplyResult::Created)
                }
            }
        } else if *action == Action::DELETE {
            match current {
                ResourceState::Absent => Ok(ApplyResult::NoChange),
                ResourceState::Modified { .. } => Ok(ApplyResult::Failed {
                    error: format!("{} is not a directory", self.path.display()),
                }),
                _ => {
                    ctx.converge_by(format!("delete directory {}", self.path.display()), || {
                        fs::remove_dir(&self.path).with_context(|| {
                            format!("Failed to delete {}", self.path.display())
                        })
                    })?;
                    Ok(ApplyResult::Removed)
                }
            }
        } else {
            bail!("unsupported action {} for {}", action, self.id())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use converge::{EventDispatcher, ExecuteOptions, ExecutionPlan, execute_simple};
    use tempfile::TempDir;

    fn run(dir: Directory, action: Action) -> converge::ExecuteSummary {
        let mut plan = ExecutionPlan::new();
        plan.add(Box::new(dir), action);
        execute_simple(&plan, &ExecuteOptions::default(), &mut EventDispatcher::new()).unwrap()
    }

    #[test]
    fn test_create_nested() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a").join("b");
        let summary = run(Directory::new(path.to_string_lossy()), Action::CREATE);
        assert_eq!(summary.created, 1);
        assert!(path.is_dir());

        let summary = run(Directory::new(path.to_string_lossy()), Action::CREATE);
        assert_eq!(summary.no_change, 1);
    }

    #[test]
    fn test_create_over_file_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("taken");
        fs::write(&path, "x").unwrap();

        let summary = run(Directory::new(path.to_string_lossy()), Action::CREATE);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn test_delete() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("gone");
        fs::create_dir(&path).unwrap();

        let summary = run(Directory::new(path.to_string_lossy()), Action::DELETE);
        assert_eq!(summary.removed, 1);
        assert!(!path.exists());
    }
}
