//! ANSI styling for the line prefix.

use crate::Severity;
use colored::Color;

const RESET: &str = "\x1b[0m";

/// Escape fragments written around a styled fragment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Style {
    pub open: String,
    pub close: &'static str,
}

impl Style {
    pub fn wrap(&self, text: &str) -> String {
        format!("{}{}{}", self.open, text, self.close)
    }
}

/// Terminal color assigned to each severity
pub fn color_for(severity: Severity) -> Color {
    match severity {
        Severity::Error => Color::Red,
        Severity::Warn => Color::Yellow,
        Severity::Info => Color::Green,
        Severity::Log => Color::White,
        Severity::Debug => Color::Blue,
        Severity::Trace => Color::Magenta,
    }
}

pub fn style_for(severity: Severity) -> Style {
    Style {
        open: format!("\x1b[{}m", color_for(severity).to_fg_str()),
        close: RESET,
    }
}

/// Wrap `text` in the severity's color when `colored` is set and the
/// environment allows it (`NO_COLOR`, `CLICOLOR`, `CLICOLOR_FORCE`)
pub fn style_wrap(severity: Severity, text: &str, colored: bool) -> String {
    if colored && colored::control::SHOULD_COLORIZE.should_colorize() {
        style_for(severity).wrap(text)
    } else {
        text.to_string()
    }
}
