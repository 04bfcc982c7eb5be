//! Text entry and input-field clearing

use crate::config::TIMING_CONFIG;
use crate::error::{AdbError, Result};
use crate::session::DeviceSession;
use crate::ui::Selector;
use std::time::Duration;
use tracing::info;

/// Escape spaces for `input text`, which otherwise splits the payload
/// device-side.
fn escape_spaces(text: &str) -> String {
    text.replace(' ', "\\ ")
}

/// Split into fixed-size chunks on char boundaries.
fn chunk_chars(text: &str, size: usize) -> Vec<String> {
    if text.is_empty() || size == 0 {
        return Vec::new();
    }
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size).map(|c| c.iter().collect()).collect()
}

/// How many delete key events clear a field of `len` characters. The
/// counts are tuned against observed device input latency, not derived:
/// long-press delete eats roughly two characters per event, plus slack.
fn deletion_count(len: usize, fast: bool) -> usize {
    if fast {
        len + 4
    } else {
        len.div_ceil(2) + 5
    }
}

impl DeviceSession {
    /// Send text to the focused input field as a single command.
    pub async fn write_text(&mut self, text: &str) -> Result<()> {
        let escaped = escape_spaces(text);
        let result = self
            .run_recorded(&["shell", "input", "text", &escaped], None)
            .await?;
        if !result.success {
            return Err(AdbError::Interaction(format!(
                "input text failed: {}",
                result.combined().trim()
            )));
        }
        Ok(())
    }

    /// Send text in small chunks with a delay between them, for targets
    /// that drop characters under fast bulk input.
    pub async fn write_text_slow(&mut self, text: &str) -> Result<()> {
        let config = &TIMING_CONFIG.input;
        let delay = Duration::from_secs_f64(config.inter_chunk_delay);

        for chunk in chunk_chars(text, config.chunk_size as usize) {
            let escaped = escape_spaces(&chunk);
            let result = self
                .run_recorded(&["shell", "input", "text", &escaped], None)
                .await?;
            if !result.success {
                return Err(AdbError::Interaction(format!(
                    "input text failed: {}",
                    result.combined().trim()
                )));
            }
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    /// Move the cursor to the end of the field and issue `count` delete
    /// key events. Long-press deletes when `long_press` is set.
    pub async fn press_backspace(&mut self, count: usize, long_press: bool) -> Result<()> {
        self.press_key("KEYCODE_MOVE_END").await?;
        for _ in 0..count {
            if long_press {
                let result = self
                    .run_recorded(
                        &["shell", "input", "keyevent", "--longpress", "KEYCODE_DEL"],
                        None,
                    )
                    .await?;
                if !result.success {
                    return Err(AdbError::Interaction(format!(
                        "input keyevent --longpress KEYCODE_DEL: {}",
                        result.combined().trim()
                    )));
                }
            } else {
                self.press_key("KEYCODE_DEL").await?;
            }
        }
        Ok(())
    }

    /// Clear the text of the field matched by the selector, reading its
    /// current length from the current snapshot. An already-empty (or
    /// unmatched) field is a successful no-op. Fast mode uses plain delete
    /// events, otherwise long-press deletes.
    pub async fn clear_input(&mut self, selector: &Selector, fast: bool) -> Result<bool> {
        let Some(text) = self.get_text(selector) else {
            return Ok(true);
        };
        if text.is_empty() {
            return Ok(true);
        }

        let count = deletion_count(text.chars().count(), fast);
        self.press_backspace(count, !fast).await?;
        info!("cleared {} ({} chars, {} deletes)", selector, text.chars().count(), count);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_spaces() {
        assert_eq!(escape_spaces("hello big world"), "hello\\ big\\ world");
        assert_eq!(escape_spaces("nospaces"), "nospaces");
    }

    #[test]
    fn test_chunk_chars() {
        assert_eq!(chunk_chars("abcde", 2), vec!["ab", "cd", "e"]);
        assert_eq!(chunk_chars("", 2), Vec::<String>::new());
        // Multi-byte chars must not be split mid-codepoint
        assert_eq!(chunk_chars("héllo", 2), vec!["hé", "ll", "o"]);
    }

    #[test]
    fn test_deletion_counts() {
        // 7 chars: ceil(7/2) + 5 = 9 deliberate, 7 + 4 = 11 fast
        assert_eq!(deletion_count(7, false), 9);
        assert_eq!(deletion_count(7, true), 11);
        assert_eq!(deletion_count(1, false), 6);
        assert_eq!(deletion_count(0, true), 4);
    }
}
