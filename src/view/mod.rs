pub mod i18n;
pub mod render;
pub mod terminal;

pub use i18n::{describe, text, translate_error, Locale, Message};
pub use render::{render, JournalView, TradeRow};
pub use terminal::{FixedAnswer, StdinPrompt, TerminalSink};

/// Applies a rendered view to some output
pub trait ViewSink {
    fn commit(&mut self, view: &JournalView);

    /// One-line status or error message
    fn notify(&mut self, message: &str);
}

/// Yes/no confirmation asked of the user
pub trait Prompt: Send + Sync {
    fn confirm(&self, question: &str) -> bool;
}
