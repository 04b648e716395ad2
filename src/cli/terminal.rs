//! Terminal capability detection and styling helpers.

use owo_colors::{OwoColorize, colors::css};

/// The widest a horizontal rule is drawn.
const MAX_RULE_WIDTH: usize = 60;

/// Whether colored output should be enabled.
fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// The terminal width, if stdout is a terminal.
fn terminal_width() -> Option<usize> {
    terminal_size::terminal_size()
        .map(|(width, _)| usize::from(width.0))
        .filter(|&width| width > 0)
}

/// A horizontal rule of `ch`, as wide as the terminal allows up to 60 columns.
pub fn rule(ch: char) -> String {
    let width = terminal_width().map_or(MAX_RULE_WIDTH, |w| w.min(MAX_RULE_WIDTH));
    std::iter::repeat_n(ch, width).collect()
}

/// A heading framed by `=` rules.
pub fn banner(title: &str) -> String {
    let rule = rule('=');
    format!("{rule}\n   {}\n{rule}", title.info())
}

/// Extension trait for colorizing output.
pub trait Colorize {
    /// Color as success (green).
    fn success(&self) -> String;
    /// Color as warning (amber).
    fn warning(&self) -> String;
    /// Color as info (blue).
    fn info(&self) -> String;
    /// Dim the text.
    fn dim(&self) -> String;
}

impl Colorize for str {
    fn success(&self) -> String {
        if supports_color() {
            self.fg::<css::Green>().to_string()
        } else {
            self.to_string()
        }
    }

    fn warning(&self) -> String {
        if supports_color() {
            self.fg::<css::Orange>().to_string()
        } else {
            self.to_string()
        }
    }

    fn info(&self) -> String {
        if supports_color() {
            self.fg::<css::LightBlue>().bold().to_string()
        } else {
            self.to_string()
        }
    }

    fn dim(&self) -> String {
        if supports_color() {
            self.dimmed().to_string()
        } else {
            self.to_string()
        }
    }
}

impl Colorize for String {
    fn success(&self) -> String {
        self.as_str().success()
    }

    fn warning(&self) -> String {
        self.as_str().warning()
    }

    fn info(&self) -> String {
        self.as_str().info()
    }

    fn dim(&self) -> String {
        self.as_str().dim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_is_bounded() {
        let rule = rule('-');
        assert!(!rule.is_empty());
        assert!(rule.chars().count() <= MAX_RULE_WIDTH);
        assert!(rule.chars().all(|c| c == '-'));
    }
}
