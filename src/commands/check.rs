use anyhow::{Result, bail};
use choregraphie::{PrimitiveRegistry, Target};
use std::sync::Arc;

use crate::Context;
use crate::config::Config;
use crate::{recipe, ui};

/// What `check` found out about one choreography
#[derive(Debug)]
struct ChoreographyReport {
    name: String,
    /// Number of before and after callbacks, when the steps resolved
    callbacks: Option<(usize, usize)>,
    targets: Vec<TargetReport>,
    errors: Vec<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum TargetReport {
    Declared(String),
    Undeclared(String),
    Unsupported(String),
}

pub fn run(ctx: &Context) -> Result<()> {
    let (path, config) = super::load_config(ctx)?;

    ui::header("Recipe Check");
    ui::kv("Recipe", &path.display().to_string());

    let plan = recipe::plan(&config)?;
    ui::kv("Resources", &plan.len().to_string());
    ui::kv("Choreographies", &config.choreographies.len().to_string());

    let reports = inspect(&config);
    let mut problems = 0;
    for report in &reports {
        ui::section(&report.name);
        if let Some((before, after)) = report.callbacks {
            ui::kv("Callbacks", &format!("{before} before, {after} after"));
        }
        if report.targets.is_empty() {
            ui::warn("Not bound to anything");
        }
        for target in &report.targets {
            match target {
                TargetReport::Declared(id) => ui::success(id),
                TargetReport::Undeclared(id) => {
                    ui::warn(&format!("{id} (not declared in this recipe)"));
                }
                TargetReport::Unsupported(target) => {
                    ui::error(&format!("{target}: only resources are supported"));
                }
            }
        }
        for error in &report.errors {
            ui::error(error);
        }
        problems += report.problems();
    }

    println!();
    if problems > 0 {
        bail!("{} problems found in {}", problems, path.display());
    }
    ui::success("Recipe is valid");
    Ok(())
}

impl ChoreographyReport {
    fn problems(&self) -> usize {
        let unsupported = self
            .targets
            .iter()
            .filter(|t| matches!(t, TargetReport::Unsupported(_)))
            .count();
        unsupported + self.errors.len()
    }
}

fn inspect(config: &Config) -> Vec<ChoreographyReport> {
    let registry = Arc::new(PrimitiveRegistry::builtin());

    config
        .choreographies
        .iter()
        .map(|entry| {
            let mut errors = Vec::new();
            let callbacks = match recipe::choreography(config, entry, &registry) {
                Ok(choreography) => Some((
                    choreography.before_sequence().len(),
                    choreography.after_sequence().len(),
                )),
                Err(e) => {
                    errors.push(format!("{e:#}"));
                    None
                }
            };

            let targets = entry
                .on
                .iter()
                .map(|target| match config.target(target) {
                    Target::Resource(id) if config.declares(&id) => TargetReport::Declared(id),
                    Target::Resource(id) => TargetReport::Undeclared(id),
                    other => TargetReport::Unsupported(other.to_string()),
                })
                .collect();

            ChoreographyReport {
                name: entry.name.clone(),
                callbacks,
                targets,
                errors,
            }
        })
        .collect()
}
