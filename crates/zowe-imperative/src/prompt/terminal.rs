//! Terminal prompter built on dialoguer

use super::{PromptOptions, Prompter};
use crate::error::{ImperativeError, ImperativeResult};
use async_trait::async_trait;
use dialoguer::{Input, Password, theme::ColorfulTheme};
use std::time::Duration;
use tracing::debug;

/// Prompts on the controlling terminal, bounded by a timeout
#[derive(Debug, Clone)]
pub struct TerminalPrompter {
    default_timeout: Option<Duration>,
}

impl TerminalPrompter {
    /// Create a prompter. `None` waits forever.
    pub fn new(default_timeout: Option<Duration>) -> Self {
        Self { default_timeout }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new(Some(Duration::from_secs(
            crate::settings::DEFAULT_PROMPT_TIMEOUT_SECS,
        )))
    }
}

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn prompt(&self, text: &str, options: PromptOptions) -> ImperativeResult<Option<String>> {
        // dialoguer appends its own ": "
        let label = text.trim_end().trim_end_matches(':').to_string();
        let hide = options.hide_text;

        let task = tokio::task::spawn_blocking(move || {
            let theme = ColorfulTheme::default();
            if hide {
                Password::with_theme(&theme)
                    .with_prompt(label)
                    .allow_empty_password(true)
                    .interact()
            } else {
                Input::<String>::with_theme(&theme)
                    .with_prompt(label)
                    .allow_empty(true)
                    .interact_text()
            }
        });

        let wait = match options.sec_to_wait {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => self.default_timeout,
        };

        let answer = match wait {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined?,
                Err(_) => {
                    debug!("Prompt timed out after {:?}", limit);
                    return Ok(None);
                }
            },
            None => task.await?,
        };

        answer
            .map(Some)
            .map_err(|e| ImperativeError::io(format!("Unable to read from the terminal: {}", e)))
    }
}
