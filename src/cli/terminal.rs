//! Coloured terminal output

use owo_colors::{OwoColorize, colors::css};
use supports_color::Stream;

/// Whether stdout should receive ANSI colours.
pub fn supports_color() -> bool {
    supports_color::on_cached(Stream::Stdout).is_some()
}

fn paint(text: &str, style: impl FnOnce(&str) -> String) -> String {
    if supports_color() {
        style(text)
    } else {
        text.to_string()
    }
}

/// Colouring for status output.
pub trait Colorize: AsRef<str> {
    /// Green, for files written and checks passed.
    fn success(&self) -> String {
        paint(self.as_ref(), |s| s.fg::<css::Green>().to_string())
    }

    /// Amber, for problems that did not stop the command.
    fn warning(&self) -> String {
        paint(self.as_ref(), |s| s.fg::<css::Orange>().to_string())
    }

    /// Blue, for headings.
    fn info(&self) -> String {
        paint(self.as_ref(), |s| s.fg::<css::LightBlue>().to_string())
    }

    /// Dimmed, for rules and placeholders.
    fn dim(&self) -> String {
        paint(self.as_ref(), |s| s.dimmed().to_string())
    }
}

impl<T: AsRef<str> + ?Sized> Colorize for T {}
