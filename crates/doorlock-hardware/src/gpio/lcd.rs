//! HD44780 16x2 character LCD behind a PCF8574 I2C backpack.
//!
//! The backpack maps its eight outputs as: P0 = RS, P1 = RW, P2 = EN,
//! P3 = backlight, P4..P7 = D4..D7. The controller runs in 4-bit mode, so
//! each byte is sent as two nibbles, each latched by an EN pulse.

use doorlock_core::constants::DISPLAY_COLUMNS;

const RS: u8 = 0x01;
const EN: u8 = 0x04;
const BACKLIGHT: u8 = 0x08;

const CMD_SET_DDRAM: u8 = 0x80;

/// DDRAM start address of each row.
const ROW_OFFSETS: [u8; 2] = [0x00, 0x40];

/// Whether a byte goes to the instruction or the data register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    Command,
    Data,
}

/// Expander writes that transfer one byte in 4-bit mode.
///
/// Each nibble is written with EN high, then with EN low to latch it.
pub fn byte_frames(value: u8, register: Register, backlight: bool) -> [u8; 4] {
    let mut flags = if backlight { BACKLIGHT } else { 0 };
    if register == Register::Data {
        flags |= RS;
    }
    let high = (value & 0xF0) | flags;
    let low = ((value << 4) & 0xF0) | flags;
    [high | EN, high, low | EN, low]
}

/// "Set DDRAM address" instruction for a cursor position.
pub fn cursor_command(row: usize, column: usize) -> u8 {
    let offset = ROW_OFFSETS[row.min(ROW_OFFSETS.len() - 1)];
    CMD_SET_DDRAM | (offset + column.min(DISPLAY_COLUMNS - 1) as u8)
}

/// Character codes for one full display row.
///
/// Characters outside printable ASCII become `?`; the row is padded with
/// spaces and truncated to the display width.
pub fn row_bytes(line: &str) -> [u8; DISPLAY_COLUMNS] {
    let mut row = [b' '; DISPLAY_COLUMNS];
    for (slot, c) in row.iter_mut().zip(line.chars()) {
        *slot = if c.is_ascii() && !c.is_ascii_control() {
            c as u8
        } else {
            b'?'
        };
    }
    row
}

#[cfg(feature = "hardware-gpio")]
pub use driver::Lcd1602;

#[cfg(feature = "hardware-gpio")]
mod driver {
    use std::time::Duration;

    use doorlock_core::constants::DISPLAY_LINES;
    use rppal::i2c::I2c;
    use tracing::debug;

    use super::*;
    use crate::{HardwareError, Result, traits::DisplayDevice};

    const CMD_CLEAR: u8 = 0x01;
    const CMD_ENTRY_MODE: u8 = 0x06;
    const CMD_DISPLAY_ON: u8 = 0x0C;
    const CMD_FUNCTION_4BIT_2LINE: u8 = 0x28;

    /// Long enough for the clear and home instructions.
    const SLOW_COMMAND_DELAY: Duration = Duration::from_millis(2);

    #[derive(Debug)]
    pub struct Lcd1602 {
        i2c: I2c,
        backlight: bool,
    }

    fn i2c_error(e: rppal::i2c::Error) -> HardwareError {
        HardwareError::communication(format!("I2C: {}", e))
    }

    impl Lcd1602 {
        /// Open the primary I2C bus and initialize the controller at `address`.
        pub fn new(address: u16) -> Result<Self> {
            let mut i2c = I2c::new().map_err(|e| {
                HardwareError::initialization_failed(format!("I2C bus: {}", e))
            })?;
            i2c.set_slave_address(address).map_err(i2c_error)?;

            let mut lcd = Self {
                i2c,
                backlight: true,
            };
            lcd.initialize()?;
            debug!(address = format_args!("0x{:02X}", address), "LCD initialized");
            Ok(lcd)
        }

        fn write_raw(&mut self, byte: u8) -> Result<()> {
            self.i2c.write(&[byte]).map_err(i2c_error)?;
            Ok(())
        }

        fn send(&mut self, value: u8, register: Register) -> Result<()> {
            for frame in byte_frames(value, register, self.backlight) {
                self.write_raw(frame)?;
            }
            Ok(())
        }

        /// Power-on sequence that forces 4-bit mode from any state.
        fn initialize(&mut self) -> Result<()> {
            std::thread::sleep(Duration::from_millis(50));
            let flags = if self.backlight { BACKLIGHT } else { 0 };
            for nibble in [0x30, 0x30, 0x30, 0x20] {
                self.write_raw(nibble | flags | EN)?;
                self.write_raw(nibble | flags)?;
                std::thread::sleep(Duration::from_millis(5));
            }
            self.send(CMD_FUNCTION_4BIT_2LINE, Register::Command)?;
            self.send(CMD_DISPLAY_ON, Register::Command)?;
            self.send(CMD_CLEAR, Register::Command)?;
            std::thread::sleep(SLOW_COMMAND_DELAY);
            self.send(CMD_ENTRY_MODE, Register::Command)
        }

        fn write_screen(&mut self, lines: &[String]) -> Result<()> {
            for row in 0..DISPLAY_LINES {
                let text = lines.get(row).map(String::as_str).unwrap_or("");
                self.send(cursor_command(row, 0), Register::Command)?;
                for byte in row_bytes(text) {
                    self.send(byte, Register::Data)?;
                }
            }
            Ok(())
        }
    }

    impl DisplayDevice for Lcd1602 {
        async fn render(&mut self, lines: &[String]) -> Result<()> {
            tokio::task::block_in_place(|| self.write_screen(lines))
        }

        async fn set_backlight(&mut self, on: bool) -> Result<()> {
            self.backlight = on;
            let byte = if on { BACKLIGHT } else { 0 };
            tokio::task::block_in_place(|| self.write_raw(byte))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_command_frames() {
        // 0x28 -> nibbles 0x2 and 0x8, backlight on, RS low.
        assert_eq!(
            byte_frames(0x28, Register::Command, true),
            [0x2C, 0x28, 0x8C, 0x88]
        );
    }

    #[test]
    fn test_data_frames_without_backlight() {
        // 'A' = 0x41 -> nibbles 0x4 and 0x1, RS high.
        assert_eq!(
            byte_frames(b'A', Register::Data, false),
            [0x45, 0x41, 0x15, 0x11]
        );
    }

    #[rstest]
    #[case(0, 0, 0x80)]
    #[case(0, 5, 0x85)]
    #[case(1, 0, 0xC0)]
    #[case(1, 15, 0xCF)]
    #[case(1, 40, 0xCF)]
    fn test_cursor_command(#[case] row: usize, #[case] column: usize, #[case] expected: u8) {
        assert_eq!(cursor_command(row, column), expected);
    }

    #[test]
    fn test_row_bytes_pads_and_truncates() {
        assert_eq!(&row_bytes("Press C"), b"Press C         ");
        assert_eq!(&row_bytes("Object Detected!!!"), b"Object Detected!");
        assert_eq!(&row_bytes("Caf\u{e9}"), b"Caf?            ");
    }
}
