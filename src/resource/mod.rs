//! Resources choreo knows how to converge
//!
//! Each resource implements [`converge::Resource`]. Its id is
//! `type[name]`, with the name exactly as written in the config, and that id
//! is what choreographies bind to.

pub mod command;
pub mod directory;
pub mod file;
pub mod symlink;

pub use command::Command;
pub use directory::Directory;
pub use file::File;
pub use symlink::Symlink;

use crate::config::ResourceConfig;
use anyhow::{Result, bail};
use converge::{Action, BoxedResource};

/// Actions each resource type accepts
pub fn supported_actions(resource_type: &str) -> &'static [Action] {
    const PATHS: &[Action] = &[Action::CREATE, Action::DELETE];
    const COMMANDS: &[Action] = &[Action::RUN];

    match resource_type {
        "command" => COMMANDS,
        _ => PATHS,
    }
}

/// Build the resource described by a `[[resource]]` entry
///
/// Returns the resource with the action to run, or `None` for the `nothing`
/// action.
pub fn from_config(config: &ResourceConfig) -> Result<Option<(BoxedResource, Action)>> {
    let resource: BoxedResource = match config {
        ResourceConfig::File { name, content, .. } => Box::new(File::new(name, content.as_str())),
        ResourceConfig::Directory { name, .. } => Box::new(Directory::new(name)),
        ResourceConfig::Symlink { name, source, .. } => Box::new(Symlink::new(name, source)),
        ResourceConfig::Command {
            name,
            command,
            cwd,
            creates,
            ..
        } => {
            let mut resource = Command::new(name, command);
            if let Some(cwd) = cwd {
                resource = resource.cwd(cwd);
            }
            if let Some(creates) = creates {
                resource = resource.creates(creates);
            }
            Box::new(resource)
        }
    };

    let action = config
        .action()
        .cloned()
        .unwrap_or_else(|| resource.default_action());

    if action == Action::NOTHING {
        log::debug!("{} is declared with action nothing", resource.id());
        return Ok(None);
    }

    let supported = supported_actions(resource.resource_type());
    if !supported.contains(&action) {
        let names: Vec<_> = supported.iter().map(Action::as_str).collect();
        bail!(
            "{}: unsupported action '{}' (expected one of: {})",
            resource.id(),
            action,
            names.join(", ")
        );
    }

    Ok(Some((resource, action)))
}
