//! Turns a loaded [`Config`] into an execution plan and bound choreographies

use anyhow::{Context, Result};
use choregraphie::{Choreography, PrimitiveRegistry, Target};
use converge::{EventDispatcher, ExecutionPlan};
use std::sync::Arc;

use crate::config::{ChoreographyConfig, Config, VarsScope};
use crate::resource;

/// Build the plan for every declared resource, in declaration order
pub fn plan(config: &Config) -> Result<ExecutionPlan> {
    let mut plan = ExecutionPlan::new();
    for entry in &config.resources {
        if let Some((resource, action)) = resource::from_config(entry)? {
            plan.add(resource, action);
        }
    }
    Ok(plan)
}

/// Build one choreography by calling its steps in order
pub fn choreography(
    config: &Config,
    entry: &ChoreographyConfig,
    registry: &Arc<PrimitiveRegistry>,
) -> Result<Choreography> {
    let scope = VarsScope::new(config.vars.clone());
    Choreography::define_with(&entry.name, Arc::clone(registry), scope, |c| {
        for step in &entry.steps {
            let args = config.expand_args(&step.args);
            let value = c.call(&step.verb, &args)?;
            if !value.is_null() {
                log::debug!("{}: {} resolved to {}", entry.name, step.verb, value);
            }
        }
        Ok(())
    })
    .with_context(|| format!("Failed to build choreography {}", entry.name))
}

/// Build every choreography and bind it to its targets
///
/// Returns the number of bindings made. Binding to an id no resource of the
/// recipe declares is allowed, with a warning.
pub fn bind_all(
    config: &Config,
    registry: &Arc<PrimitiveRegistry>,
    events: &mut EventDispatcher,
) -> Result<usize> {
    let mut bound = 0;
    for entry in &config.choreographies {
        let choreography = choreography(config, entry, registry)?;
        for target in &entry.on {
            let target = config.target(target);
            if let Target::Resource(id) = &target
                && !config.declares(id)
            {
                log::warn!(
                    "{} is bound to {}, which this recipe does not declare",
                    entry.name,
                    id
                );
            }
            choreography.bind_to(target, events)?;
            bound += 1;
        }
    }
    Ok(bound)
}
