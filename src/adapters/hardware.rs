//! GPIO adapter: the only code that touches the ultrasonic pins.
//!
//! Bridges [`DigitalIo`] onto the raw `hw_init` helpers. Pins must have
//! been configured by [`hw_init::init_ultrasonic_pins`] first. On
//! non-espidf targets the helpers are no-op stubs.

use crate::app::ports::{DigitalIo, GpioNum};
use crate::drivers::hw_init;

#[derive(Debug, Default, Clone, Copy)]
pub struct EspGpio;

impl EspGpio {
    pub fn new() -> Self {
        Self
    }
}

impl DigitalIo for EspGpio {
    fn set_output_level(&mut self, pin: GpioNum, high: bool) {
        hw_init::gpio_write(pin, high);
    }

    fn read_input_level(&mut self, pin: GpioNum) -> bool {
        hw_init::gpio_read(pin)
    }
}
