//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::{ColoredString, Colorize};

use crate::domain::{Node, Role, TreeElement};

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print success status (green checkmark)
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print indented detail (no color)
pub fn detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {}", msg);
}

/// Print plain output (no color, for data)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// Role name colored like the bubble it stands for
pub fn role(role: Role) -> ColoredString {
    let name = format!("{:<8}", role.to_string());
    match role {
        Role::Root => name.blue().bold(),
        Role::Internal => name.cyan(),
        Role::Leaf => name.green(),
    }
}

/// Tree line for a node: label colored by role, id dimmed
pub fn tree_label<T: TreeElement>(node: &Node<T>) -> String {
    let label = match node.role {
        Role::Root => node.label().blue().bold(),
        Role::Internal => node.label().cyan(),
        Role::Leaf => node.label().green(),
    };
    format!("{} {}", label, format!("[{}]", node.id()).dimmed())
}

/// Print one node as `id  role  label`
pub fn node<T: TreeElement>(node: &Node<T>) {
    println!("{:>6}  {}  {}", node.id(), role(node.role), node.label());
}
