//! Lock relay on a single GPIO output, active high.

use rppal::gpio::{Gpio, OutputPin};

use crate::{Result, gpio::gpio_error, traits::RelayDevice};

#[derive(Debug)]
pub struct GpioRelay {
    pin: OutputPin,
}

impl GpioRelay {
    /// Claim `pin` (BCM numbering) and drive it low.
    pub fn new(pin: u8) -> Result<Self> {
        let pin = Gpio::new()
            .map_err(gpio_error)?
            .get(pin)
            .map_err(gpio_error)?
            .into_output_low();
        Ok(Self { pin })
    }
}

impl RelayDevice for GpioRelay {
    async fn set_energized(&mut self, energized: bool) -> Result<()> {
        if energized {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
        Ok(())
    }

    async fn is_energized(&self) -> Result<bool> {
        Ok(self.pin.is_set_high())
    }
}
