//! Terminal progress for converge runs

use colored::Colorize;
use converge::{Action, ApplyResult, EventHandler, LifecycleEvent, ProgressCallback};

use crate::ui;

/// Prints one line per converged resource
#[derive(Debug, Default)]
pub struct ConsoleProgress {
    quiet: bool,
    total: usize,
    done: usize,
}

impl ConsoleProgress {
    pub fn new(total: usize, quiet: bool) -> Self {
        Self {
            quiet,
            total,
            done: 0,
        }
    }
}

impl ProgressCallback for ConsoleProgress {
    fn on_resource_start(&mut self, id: &str, action: &Action) {
        log::debug!("[{}/{}] {} :{}", self.done + 1, self.total, id, action);
    }

    fn on_resource_complete(&mut self, id: &str, action: &Action, result: &ApplyResult) {
        self.done += 1;
        if self.quiet && !matches!(result, ApplyResult::Failed { .. }) {
            return;
        }

        let detail = match result {
            ApplyResult::Failed { error } => format!(" {}", error.red()),
            ApplyResult::Skipped { reason } => format!(" ({reason})").dimmed().to_string(),
            _ => String::new(),
        };
        println!(
            "  {} {} {}{}",
            ui::result_symbol(result),
            id,
            format!(":{action}").dimmed(),
            detail
        );
    }
}

/// Lists the changes a dry run would make
#[derive(Debug, Default)]
pub struct DryRunReporter;

impl EventHandler for DryRunReporter {
    fn on_event(&mut self, event: &LifecycleEvent<'_>) -> anyhow::Result<()> {
        if let LifecycleEvent::WouldUpdate { description, .. } = event {
            println!("    {} would {}", "→".cyan(), description);
        }
        Ok(())
    }
}

/// Traces every lifecycle event
#[derive(Debug, Default)]
pub struct EventLog;

impl EventHandler for EventLog {
    fn on_event(&mut self, event: &LifecycleEvent<'_>) -> anyhow::Result<()> {
        log::trace!("event {}: {}", event.kind(), event);
        Ok(())
    }
}
