//! Mock keypad implementation for testing and development.
//!
//! This module provides a simulated keypad device that can be controlled
//! programmatically for testing without requiring physical hardware.

use crate::{HardwareError, Result, traits::KeypadDevice, types::KeypadInput};
use tokio::sync::mpsc::{self, error::TryRecvError};

/// Mock keypad device for testing and development.
///
/// Key presses are queued through a [`MockKeypadHandle`] and delivered one
/// per [`poll_key`](KeypadDevice::poll_key) call, in order.
///
/// # Examples
///
/// ```
/// use doorlock_hardware::mock::MockKeypad;
/// use doorlock_hardware::traits::KeypadDevice;
/// use doorlock_hardware::KeypadInput;
///
/// #[tokio::main]
/// async fn main() -> doorlock_hardware::Result<()> {
///     let (mut keypad, handle) = MockKeypad::new();
///
///     handle.press('C').await?;
///
///     assert_eq!(keypad.poll_key().await?, Some(KeypadInput::Letter('C')));
///     assert_eq!(keypad.poll_key().await?, None);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockKeypad {
    /// Channel receiver for simulated input
    input_rx: mpsc::Receiver<KeypadInput>,
}

impl MockKeypad {
    /// Create a new mock keypad.
    ///
    /// Returns a tuple of (MockKeypad, MockKeypadHandle) where the handle
    /// can be used to simulate key presses.
    pub fn new() -> (Self, MockKeypadHandle) {
        let (input_tx, input_rx) = mpsc::channel(32);
        (Self { input_rx }, MockKeypadHandle { input_tx })
    }
}

impl Default for MockKeypad {
    fn default() -> Self {
        Self::new().0
    }
}

impl KeypadDevice for MockKeypad {
    async fn poll_key(&mut self) -> Result<Option<KeypadInput>> {
        match self.input_rx.try_recv() {
            Ok(input) => Ok(Some(input)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                Err(HardwareError::disconnected("Keypad input channel closed"))
            }
        }
    }
}

/// Handle for controlling a mock keypad.
///
/// This handle can be cloned and shared across tasks.
#[derive(Debug, Clone)]
pub struct MockKeypadHandle {
    /// Channel sender for simulated input
    input_tx: mpsc::Sender<KeypadInput>,
}

impl MockKeypadHandle {
    /// Queue an input event.
    ///
    /// # Errors
    ///
    /// Returns an error if the keypad has been dropped.
    pub async fn send_input(&self, input: KeypadInput) -> Result<()> {
        self.input_tx
            .send(input)
            .await
            .map_err(|_| HardwareError::disconnected("Keypad input channel closed"))
    }

    /// Queue a press of the key with the given legend.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is not on the keypad or the keypad has
    /// been dropped.
    pub async fn press(&self, key: char) -> Result<()> {
        self.send_input(KeypadInput::from_char(key)?).await
    }
}
