//! Built-in primitives
//!
//! - `check_file(path)`: refuse to change the resource unless `path` exists
//! - `announce(message)`: log `message` before and after the change
//! - `touch_file(path)`: record the time of the last change in `path`

use crate::choreography::Choreography;
use crate::error::Result;
use crate::registry::{Primitive, PrimitiveKind, expect_arity, string_arg};
use anyhow::Context;
use converge::Resource;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

/// Before callback that fails unless a file exists
///
/// Useful as a manual gate: the resource only changes once an operator (or
/// another system) has dropped the file in place.
#[derive(Debug)]
pub struct CheckFile {
    path: PathBuf,
}

impl CheckFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Primitive for CheckFile {
    fn register_with(self: Box<Self>, choreography: &mut Choreography) -> Result<()> {
        let path = self.path;
        choreography.before(move |resource: &dyn Resource| {
            if path.exists() {
                log::debug!("{} found, letting {} converge", path.display(), resource.id());
                Ok(())
            } else {
                anyhow::bail!(
                    "{} is missing, refusing to converge {}",
                    path.display(),
                    resource.id()
                )
            }
        });
        Ok(())
    }
}

impl PrimitiveKind for CheckFile {
    const VERB: &'static str = "check_file";
    const SUMMARY: &'static str = "before: fail unless the given file exists";

    fn from_args(args: &[Value]) -> Result<Self> {
        expect_arity(Self::VERB, args, 1)?;
        Ok(Self::new(string_arg(Self::VERB, args, 0)?))
    }
}

/// Logs a message around the change
#[derive(Debug)]
pub struct Announce {
    message: String,
}

impl Primitive for Announce {
    fn register_with(self: Box<Self>, choreography: &mut Choreography) -> Result<()> {
        let before = self.message.clone();
        choreography.before(move |resource: &dyn Resource| {
            log::info!("{}: {} (about to change)", resource.id(), before);
            Ok(())
        });
        let after = self.message;
        choreography.after(move |resource: &dyn Resource| {
            log::info!("{}: {} (changed)", resource.id(), after);
            Ok(())
        });
        Ok(())
    }
}

impl PrimitiveKind for Announce {
    const VERB: &'static str = "announce";
    const SUMMARY: &'static str = "before + after: log the given message";

    fn from_args(args: &[Value]) -> Result<Self> {
        expect_arity(Self::VERB, args, 1)?;
        Ok(Self {
            message: string_arg(Self::VERB, args, 0)?,
        })
    }
}

/// After callback writing an RFC 3339 timestamp to a file
#[derive(Debug)]
pub struct TouchFile {
    path: PathBuf,
}

impl Primitive for TouchFile {
    fn register_with(self: Box<Self>, choreography: &mut Choreography) -> Result<()> {
        let path = self.path;
        choreography.after(move |resource: &dyn Resource| {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let stamp = format!("{} {}\n", chrono::Utc::now().to_rfc3339(), resource.id());
            fs::write(&path, stamp)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            Ok(())
        });
        Ok(())
    }
}

impl PrimitiveKind for TouchFile {
    const VERB: &'static str = "touch_file";
    const SUMMARY: &'static str = "after: write the time of the change to the given file";

    fn from_args(args: &[Value]) -> Result<Self> {
        expect_arity(Self::VERB, args, 1)?;
        Ok(Self {
            path: PathBuf::from(string_arg(Self::VERB, args, 0)?),
        })
    }
}
