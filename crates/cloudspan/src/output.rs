//! Results go to stdout as JSON; progress lines go to stderr.

use colored::Colorize;
use serde::Serialize;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn step(action: &str, target: &str) {
    eprintln!("{} {} {}", "→".blue(), action, target.cyan());
}

pub fn done(message: &str) {
    eprintln!("{} {}", "✓".green(), message);
}

/// Reports a delete call's outcome.
pub fn deleted(kind: &str, id: &str, result: bool) -> anyhow::Result<()> {
    if result {
        done(&format!("{kind} {id} deleted"));
    } else {
        eprintln!("{} {} {} was not deleted", "✗".red(), kind, id);
    }
    print_json(&serde_json::json!({ "id": id, "deleted": result }))
}
