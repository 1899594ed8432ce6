//! Terminal styling helpers

use owo_colors::{OwoColorize, Stream, Style};
use std::fmt::Display;

/// Check mark for successful outcomes
pub const CHECK: &str = "✓";

/// Marker for outcomes that need a human
pub const ATTENTION: &str = "!";

/// Semantic styles, applied only when the stream supports color
pub trait Stylize: Display + Sized {
    /// Bold, for names and URLs
    fn emphasis(&self) -> String {
        self.styled(Style::new().bold())
    }

    /// Dimmed, for secondary detail
    fn muted(&self) -> String {
        self.styled(Style::new().dimmed())
    }

    /// Cyan
    fn accent(&self) -> String {
        self.styled(Style::new().cyan())
    }

    /// Green
    fn success(&self) -> String {
        self.styled(Style::new().green())
    }

    /// Yellow
    fn warn(&self) -> String {
        self.styled(Style::new().yellow())
    }

    /// Apply `style` when stdout supports color
    fn styled(&self, style: Style) -> String {
        format!(
            "{}",
            self.if_supports_color(Stream::Stdout, |t| t.style(style))
        )
    }
}

impl<T: Display> Stylize for T {}

/// Styled check mark
pub fn check() -> String {
    CHECK.success()
}

/// Styled attention marker
pub fn attention() -> String {
    ATTENTION.warn()
}
