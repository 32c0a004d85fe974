//! Interactive prompting
//!
//! The resolver never talks to the terminal directly. It goes through a
//! [`Prompter`], which the CLI backs with [`TerminalPrompter`] and tests
//! replace with a mock.

mod handler;
mod terminal;

pub use handler::HandlerContext;
pub use terminal::TerminalPrompter;

use crate::error::ImperativeResult;
use async_trait::async_trait;

/// Options for one prompt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptOptions {
    /// Do not echo what the user types
    pub hide_text: bool,
    /// Character echoed for each hidden keystroke, when the terminal supports it
    pub mask_char: Option<char>,
    /// Seconds to wait for an answer; `None` uses the prompter's default
    pub sec_to_wait: Option<u64>,
}

impl PromptOptions {
    /// Options for a hidden (secure) prompt
    pub fn hidden() -> Self {
        Self {
            hide_text: true,
            mask_char: Some('*'),
            sec_to_wait: None,
        }
    }
}

/// Prompt primitive
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Ask for one value. `None` means the prompt timed out.
    async fn prompt(&self, text: &str, options: PromptOptions) -> ImperativeResult<Option<String>>;

    /// Show an informational message to the user
    fn show_message(&self, message: &str) {
        eprintln!("{}", message);
    }
}
