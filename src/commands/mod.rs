pub mod apply;
pub mod check;
pub mod primitives;

use anyhow::Result;
use std::path::PathBuf;

use crate::Context;
use crate::config::Config;
use crate::paths;

/// Resolve and load the recipe for this invocation
pub fn load_config(ctx: &Context) -> Result<(PathBuf, Config)> {
    let path = paths::config_file(ctx.config.as_deref())?;
    let config = Config::load(&path)?;
    Ok((path, config))
}
