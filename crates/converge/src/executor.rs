//! Execution engine - converges a plan and reports every step as events

use crate::context::{ApplyContext, NoProgress, ProgressCallback};
use crate::events::{EventDispatcher, LifecycleEvent};
use crate::planner::ExecutionPlan;
use crate::resource::Resource;
use crate::types::{Action, ApplyResult, ExecuteOptions, ExecuteSummary};
use anyhow::Result;

/// Execute a plan, emitting lifecycle events to `events`
///
/// Resource actions converge sequentially, in plan order. A resource that
/// fails to load or apply is recorded as failed and the run continues. An
/// error returned by an event handler aborts the run and is returned as-is.
///
/// # Arguments
/// * `plan` - The execution plan to run
/// * `opts` - Execution options (dry_run, verbose)
/// * `events` - Dispatcher that receives lifecycle events
/// * `progress` - Progress callback
///
/// # Returns
/// Summary of execution results
pub fn execute<P: ProgressCallback>(
    plan: &ExecutionPlan,
    opts: &ExecuteOptions,
    events: &mut EventDispatcher,
    progress: &mut P,
) -> Result<ExecuteSummary> {
    events.dispatch(&LifecycleEvent::ConvergeStart {
        resource_count: plan.len(),
        dry_run: opts.dry_run,
    })?;

    let mut summary = ExecuteSummary::default();
    for entry in plan.entries() {
        let resource = entry.resource.as_ref();
        let id = resource.id();

        progress.on_resource_start(&id, &entry.action);
        let result = converge_resource(resource, &entry.action, opts, events)?;
        progress.on_resource_complete(&id, &entry.action, &result);

        summary.add_result(&result);
    }

    events.dispatch(&LifecycleEvent::ConvergeComplete { summary: &summary })?;
    Ok(summary)
}

/// Simple execution without progress reporting
pub fn execute_simple(
    plan: &ExecutionPlan,
    opts: &ExecuteOptions,
    events: &mut EventDispatcher,
) -> Result<ExecuteSummary> {
    execute(plan, opts, events, &mut NoProgress)
}

/// Converge a single resource action
fn converge_resource(
    resource: &dyn Resource,
    action: &Action,
    opts: &ExecuteOptions,
    events: &mut EventDispatcher,
) -> Result<ApplyResult> {
    let dry_run_capable = resource.supports_dry_run(action);

    if opts.dry_run && !dry_run_capable {
        let reason = format!("action {action} cannot be simulated");
        log::debug!("Skipping {}: {}", resource.id(), reason);
        events.dispatch(&LifecycleEvent::Skipped {
            resource,
            action,
            reason: &reason,
        })?;
        return Ok(ApplyResult::Skipped { reason });
    }

    let current = match resource.current_state() {
        Ok(state) => state,
        Err(e) => return fail(resource, action, &e, events),
    };
    events.dispatch(&LifecycleEvent::StateLoaded {
        resource,
        action,
        current: &current,
    })?;

    if dry_run_capable && !resource.needs_apply(action, &current) {
        log::debug!("{} is up to date", resource.id());
        events.dispatch(&LifecycleEvent::UpToDate { resource, action })?;
        return Ok(ApplyResult::NoChange);
    }

    let (outcome, updated, would_update) = {
        let mut ctx = ApplyContext::new(opts.dry_run, opts.verbose, resource, action, events);
        let outcome = resource.apply(action, &mut ctx);
        if let Some(err) = ctx.take_handler_error() {
            return Err(err);
        }
        (outcome, ctx.is_updated(), ctx.would_update())
    };

    match outcome {
        Err(e) => fail(resource, action, &e, events),
        Ok(ApplyResult::Failed { error }) => {
            events.dispatch(&LifecycleEvent::Failed {
                resource,
                action,
                error: &error,
            })?;
            Ok(ApplyResult::Failed { error })
        }
        Ok(_) if opts.dry_run => {
            if !would_update {
                events.dispatch(&LifecycleEvent::UpToDate { resource, action })?;
                return Ok(ApplyResult::NoChange);
            }
            let reason = "dry run".to_string();
            events.dispatch(&LifecycleEvent::Skipped {
                resource,
                action,
                reason: &reason,
            })?;
            Ok(ApplyResult::Skipped { reason })
        }
        Ok(result) if updated || result.is_change() => {
            events.dispatch(&LifecycleEvent::Updated { resource, action })?;
            Ok(match result {
                ApplyResult::NoChange | ApplyResult::Skipped { .. } => ApplyResult::Modified,
                other => other,
            })
        }
        Ok(result) => {
            events.dispatch(&LifecycleEvent::UpToDate { resource, action })?;
            Ok(result)
        }
    }
}

fn fail(
    resource: &dyn Resource,
    action: &Action,
    err: &anyhow::Error,
    events: &mut EventDispatcher,
) -> Result<ApplyResult> {
    let error = format!("{err:#}");
    log::warn!("{} :{} failed: {}", resource.id(), action, error);
    events.dispatch(&LifecycleEvent::Failed {
        resource,
        action,
        error: &error,
    })?;
    Ok(ApplyResult::Failed { error })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResourceState;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct TestResource {
        name: String,
        present: bool,
        simulates: bool,
        applied: Arc<AtomicUsize>,
    }

    impl TestResource {
        fn new(name: &str, present: bool, simulates: bool) -> Self {
            Self {
                name: name.to_string(),
                present,
                simulates,
                applied: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl Resource for TestResource {
        fn resource_type(&self) -> &'static str {
            "test"
        }

        fn name(&self) -> String {
            self.name.clone()
        }

        fn supports_dry_run(&self, _action: &Action) -> bool {
            self.simulates
        }

        fn current_state(&self) -> Result<ResourceState> {
            if self.present {
                Ok(ResourceState::Present { details: None })
            } else {
                Ok(ResourceState::Absent)
            }
        }

        fn desired_state(&self, _action: &Action) -> ResourceState {
            ResourceState::Present { details: None }
        }

        fn apply(&self, _action: &Action, ctx: &mut ApplyContext<'_>) -> Result<ApplyResult> {
            ctx.converge_by(format!("create {}", self.name), || {
                self.applied.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })?;
            Ok(ApplyResult::Created)
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl Resource for Broken {
        fn resource_type(&self) -> &'static str {
            "test"
        }

        fn name(&self) -> String {
            "broken".into()
        }

        fn current_state(&self) -> Result<ResourceState> {
            Ok(ResourceState::Absent)
        }

        fn desired_state(&self, _action: &Action) -> ResourceState {
            ResourceState::Present { details: None }
        }

        fn apply(&self, _action: &Action, _ctx: &mut ApplyContext<'_>) -> Result<ApplyResult> {
            anyhow::bail!("disk on fire")
        }
    }

    /// Records `kind:id` for every resource event
    fn recorder(events: &mut EventDispatcher) -> Rc<RefCell<Vec<String>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_clone = Rc::clone(&log);
        events.subscribe("recorder", move |event: &LifecycleEvent<'_>| -> Result<()> {
            let entry = match event.resource() {
                Some(resource) => format!("{}:{}", event.kind(), resource.id()),
                None => event.kind().to_string(),
            };
            log_clone.borrow_mut().push(entry);
            Ok(())
        });
        log
    }

    #[test]
    fn test_execute_empty_plan() {
        let mut events = EventDispatcher::new();
        let log = recorder(&mut events);

        let summary =
            execute_simple(&ExecutionPlan::new(), &ExecuteOptions::default(), &mut events)
                .unwrap();

        assert_eq!(summary.total(), 0);
        assert_eq!(*log.borrow(), vec!["converge_start", "converge_complete"]);
    }

    #[test]
    fn test_execute_up_to_date_resource() {
        let mut plan = ExecutionPlan::new();
        plan.add_default(Box::new(TestResource::new("a", true, true)));
        let mut events = EventDispatcher::new();
        let log = recorder(&mut events);

        let summary = execute_simple(&plan, &ExecuteOptions::default(), &mut events).unwrap();

        assert_eq!(summary.no_change, 1);
        assert_eq!(
            log.borrow()[1..3],
            ["state_loaded:test[a]", "up_to_date:test[a]"]
        );
    }

    #[test]
    fn test_execute_with_changes() {
        let mut plan = ExecutionPlan::new();
        plan.add_default(Box::new(TestResource::new("b", false, true)));
        let mut events = EventDispatcher::new();
        let log = recorder(&mut events);

        let summary = execute_simple(&plan, &ExecuteOptions::default(), &mut events).unwrap();

        assert_eq!(summary.created, 1);
        assert_eq!(
            log.borrow()[1..4],
            [
                "state_loaded:test[b]",
                "pre_converge:test[b]",
                "updated:test[b]"
            ]
        );
    }

    #[test]
    fn test_dry_run_applies_nothing() {
        let mut plan = ExecutionPlan::new();
        plan.add_default(Box::new(TestResource::new("c", false, true)));
        plan.add_default(Box::new(TestResource::new("d", false, false)));
        let mut events = EventDispatcher::new();
        let log = recorder(&mut events);
        let opts = ExecuteOptions {
            dry_run: true,
            verbose: false,
        };

        let summary = execute_simple(&plan, &opts, &mut events).unwrap();

        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.total_changes(), 0);
        assert_eq!(
            log.borrow()[1..5],
            [
                "state_loaded:test[c]",
                "would_update:test[c]",
                "skipped:test[c]",
                "skipped:test[d]"
            ]
        );
    }

    #[test]
    fn test_resource_without_dry_run_always_applies() {
        let mut plan = ExecutionPlan::new();
        plan.add_default(Box::new(TestResource::new("e", true, false)));
        let mut events = EventDispatcher::new();

        let summary = execute_simple(&plan, &ExecuteOptions::default(), &mut events).unwrap();

        assert_eq!(summary.created, 1);
    }

    #[test]
    fn test_apply_failure_is_recorded_and_run_continues() {
        let mut plan = ExecutionPlan::new();
        plan.add_default(Box::new(Broken));
        plan.add_default(Box::new(TestResource::new("f", false, true)));
        let mut events = EventDispatcher::new();
        let log = recorder(&mut events);

        let summary = execute_simple(&plan, &ExecuteOptions::default(), &mut events).unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.created, 1);
        assert!(log.borrow().contains(&"failed:test[broken]".to_string()));
    }

    #[test]
    fn test_handler_error_aborts_run_before_change() {
        let resource = TestResource::new("g", false, true);
        let applied = Arc::clone(&resource.applied);
        let mut plan = ExecutionPlan::new();
        plan.add_default(Box::new(resource));
        let mut events = EventDispatcher::new();
        events.subscribe("veto", |event: &LifecycleEvent<'_>| -> Result<()> {
            if let LifecycleEvent::PreConverge { .. } = event {
                anyhow::bail!("maintenance window closed");
            }
            Ok(())
        });

        let err = execute_simple(&plan, &ExecuteOptions::default(), &mut events).unwrap_err();

        assert_eq!(err.to_string(), "maintenance window closed");
        assert_eq!(applied.load(Ordering::SeqCst), 0);
    }
}
