//! Clipboard seam for the "copy script" action.
//!
//! The core stays headless; embedders hand in whatever [`CopyText`]
//! implementation fits their shell. Desktop builds get an arboard-backed one
//! behind the `desktop` feature.

use crate::error::AppError;

pub trait CopyText: Send + Sync {
    fn copy(&self, text: &str) -> Result<(), AppError>;
}

/// Discards the text. Used in headless and test contexts.
pub struct NoopClipboard;

impl CopyText for NoopClipboard {
    fn copy(&self, text: &str) -> Result<(), AppError> {
        tracing::debug!(len = text.len(), "clipboard copy discarded (noop)");
        Ok(())
    }
}

#[cfg(feature = "desktop")]
pub struct SystemClipboard;

#[cfg(feature = "desktop")]
impl CopyText for SystemClipboard {
    fn copy(&self, text: &str) -> Result<(), AppError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| AppError::Clipboard(e.to_string()))?;
        clipboard
            .set_text(text)
            .map_err(|e| AppError::Clipboard(e.to_string()))
    }
}
