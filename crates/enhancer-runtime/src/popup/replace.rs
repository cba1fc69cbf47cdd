//! Sending the enhanced text back into the originating page.

use enhancer_protocols::{MessageError, RuntimeMessage, TabId};
use serde::Serialize;
use tracing::{info, warn};

use super::PopupController;
use crate::error::PopupError;

/// Shown when the page could not be updated and the text went to the clipboard.
pub const CLIPBOARD_FALLBACK_NOTICE: &str =
    "Could not update the text on the page. The enhanced text was copied to your clipboard instead.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ReplaceOutcome {
    /// The tab's content script replaced the tracked field.
    Replaced { tab: TabId, attempts: u32 },
    /// Every attempt failed; the text was copied instead.
    CopiedToClipboard { attempts: u32, reason: String },
}

impl PopupController {
    /// Replace the tracked field in the source tab with the output.
    ///
    /// Each attempt probes the tab with `ping` under a timeout before sending
    /// `replaceText`. Failed attempts back off linearly. When no attempt
    /// succeeds the text is written to the clipboard and a notice explains
    /// why.
    pub async fn replace_in_tab(&self) -> Result<ReplaceOutcome, PopupError> {
        let (text, source_tab) = {
            let state = self.state.lock();
            (state.output.clone(), state.source_tab)
        };
        if text.trim().is_empty() {
            return Err(PopupError::NothingToReplace);
        }

        let tab = match source_tab {
            Some(tab) => Some(tab),
            None => self.host.tabs.active_tab().await,
        };

        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempts = 0;
        let mut last_error = MessageError::Disconnected;

        if let Some(tab) = tab {
            for attempt in 1..=max_attempts {
                attempts = attempt;
                match self.try_replace(tab, &text).await {
                    Ok(()) => {
                        info!(%tab, attempt, "Replaced text in page");
                        return Ok(ReplaceOutcome::Replaced { tab, attempts: attempt });
                    }
                    Err(e) => {
                        warn!(%tab, attempt, max_attempts, error = %e, "Replace attempt failed");
                        last_error = e;
                        if attempt < max_attempts {
                            tokio::time::sleep(self.retry.backoff_after(attempt)).await;
                        }
                    }
                }
            }
        } else {
            warn!("No tab to replace text in");
        }

        match self.host.clipboard.write_text(&text).await {
            Ok(()) => {
                self.notify(CLIPBOARD_FALLBACK_NOTICE.to_string());
                Ok(ReplaceOutcome::CopiedToClipboard {
                    attempts,
                    reason: last_error.to_string(),
                })
            }
            Err(e) => {
                warn!(error = %e, "Clipboard fallback failed");
                Err(self.fail(PopupError::Clipboard))
            }
        }
    }

    async fn try_replace(&self, tab: TabId, text: &str) -> Result<(), MessageError> {
        let timeout = self.retry.ping_timeout();
        let pong = tokio::time::timeout(timeout, self.host.tabs.send_to_tab(tab, RuntimeMessage::Ping))
            .await
            .map_err(|_| MessageError::Timeout(self.retry.ping_timeout_ms))??;
        if !pong.is_pong() {
            return Err(MessageError::Rejected("unexpected reply to ping".to_string()));
        }

        let reply = self
            .host
            .tabs
            .send_to_tab(
                tab,
                RuntimeMessage::ReplaceText {
                    text: text.to_string(),
                },
            )
            .await?;
        if reply.is_success() {
            Ok(())
        } else {
            Err(MessageError::Rejected(
                reply.error().unwrap_or("replace failed").to_string(),
            ))
        }
    }
}
