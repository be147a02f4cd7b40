//! HC-SR04 ultrasonic range finder.
//!
//! A 10 µs trigger pulse starts a measurement; the sensor then holds its
//! echo line high for the round-trip time of the ultrasonic burst.

use std::time::{Duration, Instant};

use rppal::gpio::{Gpio, InputPin, OutputPin};

use crate::{Result, gpio::gpio_error, traits::SonarDevice};

const TRIGGER_PULSE: Duration = Duration::from_micros(10);
const TRIGGER_SETTLE: Duration = Duration::from_micros(2);

#[derive(Debug)]
pub struct HcSr04 {
    trigger: OutputPin,
    echo: InputPin,
}

impl HcSr04 {
    pub fn new(trigger_pin: u8, echo_pin: u8) -> Result<Self> {
        let gpio = Gpio::new().map_err(gpio_error)?;
        Ok(Self {
            trigger: gpio.get(trigger_pin).map_err(gpio_error)?.into_output_low(),
            echo: gpio.get(echo_pin).map_err(gpio_error)?.into_input(),
        })
    }

    fn measure(&mut self, timeout: Duration) -> Option<Duration> {
        self.trigger.set_low();
        spin(TRIGGER_SETTLE);
        self.trigger.set_high();
        spin(TRIGGER_PULSE);
        self.trigger.set_low();

        let deadline = Instant::now() + timeout;
        while self.echo.is_low() {
            if Instant::now() >= deadline {
                return None;
            }
        }

        let start = Instant::now();
        while self.echo.is_high() {
            if Instant::now() >= deadline {
                return None;
            }
        }
        Some(start.elapsed())
    }
}

/// Busy-wait for microsecond-scale delays.
fn spin(duration: Duration) {
    let start = Instant::now();
    while start.elapsed() < duration {
        std::hint::spin_loop();
    }
}

impl SonarDevice for HcSr04 {
    async fn ping(&mut self, timeout: Duration) -> Result<Option<Duration>> {
        Ok(tokio::task::block_in_place(|| self.measure(timeout)))
    }
}
