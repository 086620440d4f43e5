use anyhow::{Result, bail};
use choregraphie::PrimitiveRegistry;
use colored::Colorize;
use converge::{EventDispatcher, ExecuteOptions, ExecuteSummary};
use std::sync::Arc;

use crate::Context;
use crate::cli::ApplyArgs;
use crate::progress::{ConsoleProgress, DryRunReporter, EventLog};
use crate::{recipe, ui};

pub fn run(ctx: &Context, args: &ApplyArgs) -> Result<()> {
    let (path, config) = super::load_config(ctx)?;

    if !ctx.quiet {
        ui::header("Applying Recipe");
        ui::kv("Recipe", &path.display().to_string());
        if args.dry_run {
            ui::warn("Dry run - no changes will be made");
        }
        println!();
    }

    let plan = recipe::plan(&config)?.filter_by_target(args.target.as_deref());
    if plan.is_empty() {
        if !ctx.quiet {
            ui::info("Nothing to converge");
        }
        return Ok(());
    }

    let registry = Arc::new(PrimitiveRegistry::builtin());
    let mut events = EventDispatcher::new();
    events.subscribe("log", EventLog);
    if args.dry_run && !ctx.quiet {
        events.subscribe("dry-run", DryRunReporter);
    }
    let bound = recipe::bind_all(&config, &registry, &mut events)?;
    log::info!("{} choreography bindings", bound);

    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        verbose: ctx.verbose > 0,
    };
    let mut progress = ConsoleProgress::new(plan.len(), ctx.quiet);
    let summary = converge::execute(&plan, &opts, &mut events, &mut progress)?;

    if !ctx.quiet {
        print_summary(&summary, args.dry_run);
    }
    if !summary.is_success() {
        bail!("{} of {} resources failed", summary.failed, summary.total());
    }
    Ok(())
}

fn print_summary(summary: &ExecuteSummary, dry_run: bool) {
    println!();
    if !summary.is_success() {
        println!("  {} Recipe applied with errors", "⚠".yellow().bold());
    } else if dry_run {
        println!("  {} Dry run - no changes made", "ℹ".blue());
    } else {
        println!("  {} Recipe applied successfully!", "✓".green().bold());
    }

    if summary.created > 0 {
        println!("    • {} resources created", summary.created);
    }
    if summary.modified > 0 {
        println!("    • {} resources modified", summary.modified);
    }
    if summary.removed > 0 {
        println!("    • {} resources removed", summary.removed);
    }
    if summary.skipped > 0 {
        println!("    • {} resources skipped", summary.skipped);
    }
    if summary.no_change > 0 {
        println!("    • {} resources up to date", summary.no_change);
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "resources".red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup(choreography: &str) -> (TempDir, Context) {
        let temp = TempDir::new().unwrap();
        let root = temp.path().display().to_string();
        let recipe = format!(
            r#"
[vars]
root = "{root}"

[[resource]]
type = "file"
name = "{root}/app.conf"
content = "debug = false\n"

[[resource]]
type = "command"
name = "reload"
command = "echo reload >> {root}/reloads"

{choreography}
"#
        );
        let path = temp.path().join("choreo.toml");
        fs::write(&path, recipe).unwrap();
        let ctx = Context {
            verbose: 0,
            quiet: true,
            config: Some(path),
        };
        (temp, ctx)
    }

    fn apply(ctx: &Context, dry_run: bool, target: Option<&str>) -> Result<()> {
        run(
            ctx,
            &ApplyArgs {
                dry_run,
                target: target.map(str::to_string),
            },
        )
    }

    #[test]
    fn test_apply_converges_and_stamps() {
        let (temp, ctx) = setup(
            r#"
[[choreography]]
name = "stamp"
on = ["file[${root}/app.conf]"]
steps = [{ verb = "touch_file", args = ["${root}/changed"] }]
"#,
        );

        apply(&ctx, false, None).unwrap();

        assert_eq!(
            fs::read_to_string(temp.path().join("app.conf")).unwrap(),
            "debug = false\n"
        );
        assert!(temp.path().join("changed").exists());
        assert!(temp.path().join("reloads").exists());
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let (temp, ctx) = setup(
            r#"
[[choreography]]
name = "stamp"
on = ["file[${root}/app.conf]"]
steps = [{ verb = "touch_file", args = ["${root}/changed"] }]
"#,
        );

        apply(&ctx, true, None).unwrap();

        assert!(!temp.path().join("app.conf").exists());
        assert!(!temp.path().join("changed").exists());
        assert!(!temp.path().join("reloads").exists());
    }

    #[test]
    fn test_target_filter() {
        let (temp, ctx) = setup("");

        apply(&ctx, false, Some("command")).unwrap();

        assert!(!temp.path().join("app.conf").exists());
        assert!(temp.path().join("reloads").exists());
    }

    #[test]
    fn test_before_failure_aborts() {
        let (temp, ctx) = setup(
            r#"
[[choreography]]
name = "gate"
on = ["command[reload]"]
steps = [{ verb = "check_file", args = ["${root}/maintenance"] }]
"#,
        );

        let err = apply(&ctx, false, None).unwrap_err();

        assert!(err.to_string().contains("refusing to converge command[reload]"));
        assert!(!temp.path().join("reloads").exists());
    }

    #[test]
    fn test_failed_resource_is_an_error() {
        let (_temp, ctx) = setup(
            r#"
[[resource]]
type = "command"
name = "broken"
command = "exit 1"
"#,
        );

        let err = apply(&ctx, false, None).unwrap_err();
        assert_eq!(err.to_string(), "1 of 3 resources failed");
    }
}
