//! Formatting for terminal output.
//!
//! Everything here writes to stderr. stdout carries only a command's result
//! line so the tool composes in build scripts.

use console::style;

use crate::boundary::BoundaryWarning;
use crate::cli::options::Registry;

/// Print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").for_stderr().red().bold(), message);
}

/// Print a success message with a green checkmark.
pub fn display_success(message: &str) {
    eprintln!("{} {}", style("✓").for_stderr().green(), message);
}

/// Display a boundary warning to the user.
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").for_stderr().yellow(), warning);
}

/// Top-level help: every command by group, then every environment key.
pub fn format_usage(registry: &Registry) -> String {
    let mut out = String::from("Usage: xchelper COMMAND [OPTIONS]\n");

    let width = registry
        .commands()
        .map(|command| command.key().len())
        .max()
        .unwrap_or(0);

    for group in registry.groups() {
        out.push('\n');
        out.push_str(group.description);
        out.push('\n');
        for command in group.options {
            out.push_str(&format!(
                "  {:width$}  {}\n",
                command.key(),
                command.description,
                width = width
            ));
        }
    }

    out.push_str("\nEnvironment keys:\n");
    for key in registry.environment_keys() {
        out.push_str("  ");
        out.push_str(key);
        out.push('\n');
    }

    out.push_str("\nRun 'xchelper COMMAND --help' for the options of a command.");
    out
}
