use colored::Colorize;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Symbol shown next to a resource once it has converged
pub fn result_symbol(result: &converge::ApplyResult) -> colored::ColoredString {
    use converge::ApplyResult;

    match result {
        ApplyResult::NoChange => "○".dimmed(),
        ApplyResult::Created | ApplyResult::Modified | ApplyResult::Removed => "✓".green(),
        ApplyResult::Failed { .. } => "✗".red(),
        ApplyResult::Skipped { .. } => "⊘".yellow(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colored::Color;
    use converge::ApplyResult;

    #[test]
    fn test_result_symbol() {
        let symbol = result_symbol(&ApplyResult::NoChange);
        assert_eq!(&*symbol, "○");
        assert_eq!(symbol.fgcolor(), None);

        let symbol = result_symbol(&ApplyResult::Created);
        assert_eq!(&*symbol, "✓");
        assert_eq!(symbol.fgcolor(), Some(Color::Green));

        let symbol = result_symbol(&ApplyResult::Failed {
            error: "boom".to_string(),
        });
        assert_eq!(&*symbol, "✗");
        assert_eq!(symbol.fgcolor(), Some(Color::Red));

        let symbol = result_symbol(&ApplyResult::Skipped {
            reason: "dry run".to_string(),
        });
        assert_eq!(&*symbol, "⊘");
        assert_eq!(symbol.fgcolor(), Some(Color::Yellow));
    }
}
