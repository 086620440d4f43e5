//! Command resource - a shell command run on every converge

use anyhow::{Context, Result, bail};
use converge::{Action, ApplyContext, ApplyResult, Resource, ResourceState};
use std::path::PathBuf;
use std::process;

/// A shell command
///
/// Running a command cannot be simulated, so dry runs skip it. Set `creates`
/// to skip the command once the file it produces exists.
#[derive(Debug, Clone)]
pub struct Command {
    pub name: String,
    pub command: String,
    pub cwd: Option<PathBuf>,
    pub creates: Option<PathBuf>,
}

impl Command {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            cwd: None,
            creates: None,
        }
    }

    pub fn cwd(mut self, cwd: &str) -> Self {
        self.cwd = Some(crate::paths::expand(cwd));
        self
    }

    pub fn creates(mut self, path: &str) -> Self {
        self.creates = Some(crate::paths::expand(path));
        self
    }

    fn already_done(&self) -> bool {
        self.creates.as_ref().is_some_and(|path| path.exists())
    }

    /// Run the command through the platform shell and capture its output
    fn run(&self) -> Result<()> {
        let mut cmd = if cfg!(windows) {
            let mut cmd = process::Command::new("cmd");
            cmd.arg("/C");
            cmd
        } else {
            let mut cmd = process::Command::new("sh");
            cmd.arg("-c");
            cmd
        };
        cmd.arg(&self.command);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }

        let output = cmd
            .output()
            .with_context(|| format!("Failed to execute: {}", self.command))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            log::debug!("{}: {}", self.id(), stdout.trim());
        }

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("Command failed ({}): {}", output.status, stderr.trim())
        }
    }
}

impl Resource for Command {
    fn resource_type(&self) -> &'static str {
        "command"
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn description(&self) -> String {
        format!("Run `{}`", self.command)
    }

    fn default_action(&self) -> Action {
        Action::RUN
    }

    fn supports_dry_run(&self, _action: &Action) -> bool {
        false
    }

    fn current_state(&self) -> Result<ResourceState> {
        if self.already_done() {
            Ok(ResourceState::Present { details: None })
        } else {
            Ok(ResourceState::Unknown)
        }
    }

    fn desired_state(&self, _action: &Action) -> ResourceState {
        ResourceState::Present { details: None }
    }

    fn apply(&self, action: &Action, ctx: &mut ApplyContext<'_>) -> Result<ApplyResult> {
        if *action != Action::RUN {
            bail!("unsupported action {} for {}", action, self.id());
        }
        if self.already_done() {
            log::debug!("{} skipped, it already ran", self.id());
            return Ok(ApplyResult::NoChange);
        }

        ctx.converge_by(format!("run `{}`", self.command), || self.run())?;
        Ok(ApplyResult::Modified)
    }
}
