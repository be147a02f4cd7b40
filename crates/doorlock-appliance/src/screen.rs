//! Display feedback on the 16x2 character display.
//!
//! [`Screen`] keeps a line buffer in front of the [`DisplayDevice`] and
//! only writes frames that differ from the last one shown, so re-rendering
//! the idle prompt on every pass of the loop costs nothing.
//!
//! # Character Set
//!
//! The HD44780 ROM only maps printable ASCII reliably. Control characters
//! are stripped here; any other non-ASCII character is replaced by the
//! driver.
//!
//! Write failures are logged and otherwise ignored: a flow never aborts
//! because the display is unplugged. The next differing frame retries.
//!
//! # Examples
//!
//! ```
//! use doorlock_appliance::{Row, Screen};
//! use doorlock_hardware::devices::AnyDisplayDevice;
//! use doorlock_hardware::mock::MockDisplay;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (display, handle) = MockDisplay::new();
//!     let mut screen = Screen::new(AnyDisplayDevice::Mock(display));
//!
//!     screen.show("Place Finger", "").await;
//!     screen.set_row(Row::Bottom, "Waiting...").await;
//!
//!     assert_eq!(handle.current(), vec!["Place Finger", "Waiting..."]);
//! }
//! ```

use std::time::Duration;

use tracing::{trace, warn};

use doorlock_core::constants::{
    DISPLAY_COLUMNS, DISPLAY_LINES, IDLE_PROMPT_LINE1, IDLE_PROMPT_LINE2,
};
use doorlock_hardware::devices::AnyDisplayDevice;
use doorlock_hardware::traits::DisplayDevice;

/// A display line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
    Top,
    Bottom,
}

impl Row {
    fn index(self) -> usize {
        match self {
            Row::Top => 0,
            Row::Bottom => 1,
        }
    }
}

/// Buffered writer for the character display.
#[derive(Debug)]
pub struct Screen {
    display: AnyDisplayDevice,
    buffer: [String; DISPLAY_LINES],
    /// Last frame the device accepted.
    shown: Option<[String; DISPLAY_LINES]>,
}

impl Screen {
    pub fn new(display: AnyDisplayDevice) -> Self {
        Self {
            display,
            buffer: std::array::from_fn(|_| fit_text("")),
            shown: None,
        }
    }

    /// Clear the screen and show two lines.
    pub async fn show(&mut self, top: &str, bottom: &str) {
        self.buffer = [fit_text(top), fit_text(bottom)];
        self.flush().await;
    }

    /// Overwrite one line, keeping the other.
    pub async fn set_row(&mut self, row: Row, text: &str) {
        self.buffer[row.index()] = fit_text(text);
        self.flush().await;
    }

    /// Show two lines, then hold them for `hold`.
    pub async fn notice(&mut self, top: &str, bottom: &str, hold: Duration) {
        self.show(top, bottom).await;
        tokio::time::sleep(hold).await;
    }

    /// Show the idle prompt.
    pub async fn show_idle(&mut self) {
        self.show(IDLE_PROMPT_LINE1, IDLE_PROMPT_LINE2).await;
    }

    pub async fn set_backlight(&mut self, on: bool) {
        if let Err(e) = self.display.set_backlight(on).await {
            warn!(error = %e, "Failed to switch display backlight");
        }
    }

    /// Buffered lines, padded to the display width.
    pub fn lines(&self) -> &[String] {
        &self.buffer
    }

    /// Returns `true` if the buffer holds the idle prompt.
    pub fn is_idle(&self) -> bool {
        self.buffer[0].trim_end() == IDLE_PROMPT_LINE1
            && self.buffer[1].trim_end() == IDLE_PROMPT_LINE2
    }

    async fn flush(&mut self) {
        if self.shown.as_ref() == Some(&self.buffer) {
            return;
        }
        trace!(
            top = %self.buffer[0].trim_end(),
            bottom = %self.buffer[1].trim_end(),
            "Display frame"
        );
        match self.display.render(&self.buffer).await {
            Ok(()) => self.shown = Some(self.buffer.clone()),
            Err(e) => {
                warn!(error = %e, "Display write failed");
                self.shown = None;
            }
        }
    }
}

/// Truncate text to a maximum number of characters.
///
/// # Examples
///
/// ```
/// use doorlock_appliance::screen::truncate_text;
///
/// assert_eq!(truncate_text("Fingerprint Error", 16), "Fingerprint Erro");
/// assert_eq!(truncate_text("Short", 10), "Short");
/// ```
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Sanitize, truncate and left-align text to exactly the display width.
///
/// ```
/// use doorlock_appliance::screen::fit_text;
///
/// assert_eq!(fit_text("ID: 1"), "ID: 1           ");
/// assert_eq!(fit_text("Door\tClosed"), "DoorClosed      ");
/// ```
pub fn fit_text(text: &str) -> String {
    let clean = sanitize_text(text);
    let mut line = truncate_text(&clean, DISPLAY_COLUMNS);
    let padding = DISPLAY_COLUMNS - line.chars().count();
    line.extend(std::iter::repeat_n(' ', padding));
    line
}

/// Remove control characters.
fn sanitize_text(text: &str) -> String {
    text.chars().filter(|c| !c.is_control()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use doorlock_hardware::mock::{MockDisplay, MockDisplayHandle};

    fn screen() -> (Screen, MockDisplayHandle) {
        let (display, handle) = MockDisplay::new();
        (Screen::new(AnyDisplayDevice::Mock(display)), handle)
    }

    #[test]
    fn test_fit_text_pads_to_width() {
        assert_eq!(fit_text("").len(), DISPLAY_COLUMNS);
        assert_eq!(fit_text("Press C"), "Press C         ");
    }

    #[test]
    fn test_fit_text_truncates() {
        assert_eq!(fit_text("Object Detected! extra"), "Object Detected!");
    }

    #[test]
    fn test_control_characters_removed() {
        assert_eq!(fit_text("A\nB\r\u{7}C").trim_end(), "ABC");
    }

    #[tokio::test]
    async fn test_show_replaces_both_lines() {
        let (mut screen, handle) = screen();
        screen.show("Registered!", "ID: 1").await;
        screen.show("Door Closed", "").await;

        assert_eq!(handle.current(), vec!["Door Closed", ""]);
    }

    #[tokio::test]
    async fn test_set_row_keeps_other_line() {
        let (mut screen, handle) = screen();
        screen.show("Place Again", "").await;
        screen.set_row(Row::Bottom, "Waiting...").await;
        screen.set_row(Row::Bottom, "Image taken").await;

        assert_eq!(handle.current(), vec!["Place Again", "Image taken"]);
    }

    #[tokio::test]
    async fn test_identical_frames_written_once() {
        let (mut screen, handle) = screen();
        screen.show_idle().await;
        screen.show_idle().await;
        screen.set_row(Row::Bottom, IDLE_PROMPT_LINE2).await;

        assert_eq!(handle.frames().len(), 1);
        assert!(screen.is_idle());
    }

    #[tokio::test]
    async fn test_failed_write_retried_on_next_frame() {
        let (mut screen, handle) = screen();
        handle.set_fail_writes(true);
        screen.show_idle().await;
        assert!(handle.frames().is_empty());

        handle.set_fail_writes(false);
        screen.show_idle().await;
        assert_eq!(handle.current(), vec!["Press C", "To Unlock"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_notice_holds() {
        let (mut screen, handle) = screen();
        let start = tokio::time::Instant::now();
        screen.notice("Access Denied", "", Duration::from_secs(2)).await;

        assert_eq!(start.elapsed(), Duration::from_secs(2));
        assert!(handle.has_shown("Access Denied"));
    }

    #[tokio::test]
    async fn test_backlight() {
        let (mut screen, handle) = screen();
        screen.set_backlight(true).await;
        assert!(handle.backlight());
    }
}
