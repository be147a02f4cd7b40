//! Mock character display that records every frame it is asked to show.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{HardwareError, Result, traits::DisplayDevice};

#[derive(Debug, Default)]
struct DisplayLog {
    frames: Vec<Vec<String>>,
    backlight: bool,
    fail_writes: bool,
}

fn lock(log: &Mutex<DisplayLog>) -> MutexGuard<'_, DisplayLog> {
    log.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock display for testing and development.
///
/// # Examples
///
/// ```
/// use doorlock_hardware::mock::MockDisplay;
/// use doorlock_hardware::traits::DisplayDevice;
///
/// #[tokio::main]
/// async fn main() -> doorlock_hardware::Result<()> {
///     let (mut display, handle) = MockDisplay::new();
///     display
///         .render(&["Press C".to_string(), "To Unlock".to_string()])
///         .await?;
///
///     assert_eq!(handle.current(), vec!["Press C", "To Unlock"]);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockDisplay {
    log: Arc<Mutex<DisplayLog>>,
}

impl MockDisplay {
    pub fn new() -> (Self, MockDisplayHandle) {
        let log = Arc::new(Mutex::new(DisplayLog::default()));
        (
            Self {
                log: Arc::clone(&log),
            },
            MockDisplayHandle { log },
        )
    }
}

impl Default for MockDisplay {
    fn default() -> Self {
        Self::new().0
    }
}

impl DisplayDevice for MockDisplay {
    async fn render(&mut self, lines: &[String]) -> Result<()> {
        let mut log = lock(&self.log);
        if log.fail_writes {
            return Err(HardwareError::communication("display write failed"));
        }
        log.frames.push(lines.to_vec());
        Ok(())
    }

    async fn set_backlight(&mut self, on: bool) -> Result<()> {
        lock(&self.log).backlight = on;
        Ok(())
    }
}

/// Handle for inspecting a mock display.
#[derive(Debug, Clone)]
pub struct MockDisplayHandle {
    log: Arc<Mutex<DisplayLog>>,
}

impl MockDisplayHandle {
    /// Every frame rendered so far, oldest first.
    pub fn frames(&self) -> Vec<Vec<String>> {
        lock(&self.log).frames.clone()
    }

    /// The frame currently on screen, with trailing padding removed.
    pub fn current(&self) -> Vec<String> {
        lock(&self.log)
            .frames
            .last()
            .map(|frame| frame.iter().map(|l| l.trim_end().to_string()).collect())
            .unwrap_or_default()
    }

    /// Returns `true` if any rendered line, trimmed, equals `text`.
    pub fn has_shown(&self, text: &str) -> bool {
        lock(&self.log)
            .frames
            .iter()
            .flatten()
            .any(|line| line.trim_end() == text)
    }

    pub fn backlight(&self) -> bool {
        lock(&self.log).backlight
    }

    pub fn clear(&self) {
        lock(&self.log).frames.clear();
    }

    /// Make every subsequent render fail.
    pub fn set_fail_writes(&self, fail: bool) {
        lock(&self.log).fail_writes = fail;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_recorded_in_order() {
        let (mut display, handle) = MockDisplay::new();
        display.render(&["One".to_string()]).await.unwrap();
        display
            .render(&["Two   ".to_string(), "Lines".to_string()])
            .await
            .unwrap();

        assert_eq!(handle.frames().len(), 2);
        assert_eq!(handle.current(), vec!["Two", "Lines"]);
        assert!(handle.has_shown("One"));
        assert!(!handle.has_shown("Three"));
    }

    #[tokio::test]
    async fn test_failed_writes_not_recorded() {
        let (mut display, handle) = MockDisplay::new();
        handle.set_fail_writes(true);
        assert!(display.render(&["Lost".to_string()]).await.is_err());
        assert!(handle.frames().is_empty());
    }

    #[tokio::test]
    async fn test_backlight() {
        let (mut display, handle) = MockDisplay::new();
        display.set_backlight(true).await.unwrap();
        assert!(handle.backlight());
    }
}
