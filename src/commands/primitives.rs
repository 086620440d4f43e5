use anyhow::Result;
use choregraphie::PrimitiveRegistry;
use colored::Colorize;

use crate::{Context, ui};

pub fn run(ctx: &Context) -> Result<()> {
    let registry = PrimitiveRegistry::builtin();

    if ctx.quiet {
        for (verb, _) in registry.verbs() {
            println!("{verb}");
        }
        return Ok(());
    }

    ui::header("Primitives");
    let width = registry.verbs().map(|(verb, _)| verb.len()).max().unwrap_or(0);
    for (verb, summary) in registry.verbs() {
        println!("  {}  {}", format!("{verb:width$}").cyan(), summary.dimmed());
    }
    println!();
    ui::dim("Use them as choreography steps: { verb = \"check_file\", args = [\"/path\"] }");
    Ok(())
}
