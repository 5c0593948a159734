//! # CLI Output Helpers
//!
//! Centralized output formatting for consistent CLI messages.

use console::{style, StyledObject};

/// Output icons with platform-specific spacing
pub struct Icons;

impl Icons {
    #[cfg(unix)]
    pub const SUCCESS: &'static str = "✅";
    #[cfg(windows)]
    pub const SUCCESS: &'static str = "[OK] ";

    #[cfg(unix)]
    pub const ERROR: &'static str = "❌";
    #[cfg(windows)]
    pub const ERROR: &'static str = "[ERR] ";

    #[cfg(unix)]
    pub const WARNING: &'static str = "⚡";
    #[cfg(windows)]
    pub const WARNING: &'static str = "[!] ";
}

pub fn icon_success() -> StyledObject<&'static str> {
    style(Icons::SUCCESS).green().bold()
}

pub fn icon_error() -> StyledObject<&'static str> {
    style(Icons::ERROR).red().bold()
}

pub fn icon_warning() -> StyledObject<&'static str> {
    style(Icons::WARNING).yellow().bold()
}

/// Status lines go to stderr so stdout can carry ciphertext.
pub fn print_success(msg: &str) {
    eprintln!(" {}{}", icon_success(), msg);
}

/// Print an error message to stderr
pub fn print_error(msg: impl std::fmt::Display) {
    eprintln!(" {}Error: {}", icon_error(), msg);
}

pub fn print_warning(msg: &str) {
    eprintln!(" {}{}", icon_warning(), msg);
}

/// Byte count with a binary unit, e.g. `1.5 KiB`
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
