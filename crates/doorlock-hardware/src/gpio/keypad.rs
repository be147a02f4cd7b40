//! 4x4 matrix keypad scanned over GPIO.
//!
//! Rows are outputs held high and pulled low one at a time; columns are
//! inputs with pull-ups, so a pressed key reads low on its column while its
//! row is driven.

use crate::types::KeypadInput;

/// Key legends indexed by `[row][column]`.
pub const KEY_LAYOUT: [[char; 4]; 4] = [
    ['1', '2', '3', 'A'],
    ['4', '5', '6', 'B'],
    ['7', '8', '9', 'C'],
    ['*', '0', '#', 'D'],
];

/// Map a layout position to its input.
pub fn key_at(row: usize, column: usize) -> Option<KeypadInput> {
    KEY_LAYOUT
        .get(row)
        .and_then(|r| r.get(column))
        .and_then(|c| KeypadInput::from_char(*c).ok())
}

/// Turns raw scans into one event per press.
///
/// A key held across several scans is reported on the first scan only; it
/// can be reported again after a scan with no key down.
#[derive(Debug, Default)]
pub struct PressTracker {
    held: Option<KeypadInput>,
}

impl PressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the key seen by the latest scan; returns a newly pressed key.
    pub fn update(&mut self, scanned: Option<KeypadInput>) -> Option<KeypadInput> {
        let pressed = match (self.held, scanned) {
            (Some(held), Some(key)) if held == key => None,
            (_, key) => key,
        };
        self.held = scanned;
        pressed
    }
}

#[cfg(feature = "hardware-gpio")]
pub use driver::MatrixKeypad;

#[cfg(feature = "hardware-gpio")]
mod driver {
    use std::time::Duration;

    use rppal::gpio::{Gpio, InputPin, OutputPin};
    use tracing::trace;

    use super::{PressTracker, key_at};
    use crate::{Result, gpio::gpio_error, traits::KeypadDevice, types::KeypadInput};

    /// Time for a driven row to settle before the columns are read.
    const ROW_SETTLE: Duration = Duration::from_micros(10);

    /// Keypad wired to four row and four column GPIO lines.
    #[derive(Debug)]
    pub struct MatrixKeypad {
        rows: Vec<OutputPin>,
        columns: Vec<InputPin>,
        tracker: PressTracker,
    }

    impl MatrixKeypad {
        /// Claim the given BCM pins.
        ///
        /// # Errors
        ///
        /// Returns an initialization error if a pin is unavailable.
        pub fn new(row_pins: [u8; 4], column_pins: [u8; 4]) -> Result<Self> {
            let gpio = Gpio::new().map_err(gpio_error)?;
            let rows = row_pins
                .iter()
                .map(|pin| Ok(gpio.get(*pin).map_err(gpio_error)?.into_output_high()))
                .collect::<Result<Vec<_>>>()?;
            let columns = column_pins
                .iter()
                .map(|pin| Ok(gpio.get(*pin).map_err(gpio_error)?.into_input_pullup()))
                .collect::<Result<Vec<_>>>()?;

            Ok(Self {
                rows,
                columns,
                tracker: PressTracker::new(),
            })
        }

        fn scan(&mut self) -> Option<KeypadInput> {
            let mut found = None;
            for (r, row) in self.rows.iter_mut().enumerate() {
                row.set_low();
                std::thread::sleep(ROW_SETTLE);
                if found.is_none() {
                    found = self
                        .columns
                        .iter()
                        .position(|column| column.is_low())
                        .and_then(|c| key_at(r, c));
                }
                row.set_high();
            }
            found
        }
    }

    impl KeypadDevice for MatrixKeypad {
        async fn poll_key(&mut self) -> Result<Option<KeypadInput>> {
            let scanned = tokio::task::block_in_place(|| self.scan());
            let pressed = self.tracker.update(scanned);
            if let Some(key) = pressed {
                trace!(%key, "Key pressed");
            }
            Ok(pressed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_press_reported_once_while_held() {
        let five = KeypadInput::Digit(5);
        let mut tracker = PressTracker::new();
        assert_eq!(tracker.update(Some(five)), Some(five));
        assert_eq!(tracker.update(Some(five)), None);
        assert_eq!(tracker.update(Some(five)), None);
        assert_eq!(tracker.update(None), None);
        assert_eq!(tracker.update(Some(five)), Some(five));
    }

    #[test]
    fn test_rolling_to_another_key() {
        let mut tracker = PressTracker::new();
        assert_eq!(
            tracker.update(Some(KeypadInput::Digit(1))),
            Some(KeypadInput::Digit(1))
        );
        assert_eq!(
            tracker.update(Some(KeypadInput::Digit(2))),
            Some(KeypadInput::Digit(2))
        );
        assert_eq!(tracker.update(None), None);
    }

    #[rstest]
    #[case(0, 0, Some(KeypadInput::Digit(1)))]
    #[case(2, 3, Some(KeypadInput::Letter('C')))]
    #[case(3, 0, Some(KeypadInput::Star))]
    #[case(3, 2, Some(KeypadInput::Hash))]
    #[case(3, 1, Some(KeypadInput::Digit(0)))]
    #[case(4, 0, None)]
    fn test_layout(
        #[case] row: usize,
        #[case] column: usize,
        #[case] expected: Option<KeypadInput>,
    ) {
        assert_eq!(key_at(row, column), expected);
    }
}
