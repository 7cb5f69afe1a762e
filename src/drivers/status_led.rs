//! RGB status LED driver.
//!
//! Three GPIO outputs drive discrete R/G/B LEDs, active HIGH.  Colours
//! are never mixed: exactly one channel (or none) is lit.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: configures and drives the three GPIOs directly.
//! On host/test: tracks state in-memory only.

#[cfg(target_os = "espidf")]
use esp_idf_sys::*;

use crate::app::ports::{LedColour, StatusLedPort};
use crate::pins;

/// GPIO configuration failed with the given ESP-IDF return code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedInitError(pub i32);

impl core::fmt::Display for LedInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "LED GPIO config failed (rc={})", self.0)
    }
}

impl std::error::Error for LedInitError {}

const LED_PINS: [(i32, u8); 3] = [
    (pins::LED_R_GPIO, LedColour::Red.bits()),
    (pins::LED_G_GPIO, LedColour::Green.bits()),
    (pins::LED_B_GPIO, LedColour::Blue.bits()),
];

pub struct StatusLed {
    current: LedColour,
}

impl StatusLed {
    /// Configure the LED pins as outputs, all off.
    #[cfg(target_os = "espidf")]
    pub fn new() -> Result<Self, LedInitError> {
        for &(pin, _) in &LED_PINS {
            let cfg = gpio_config_t {
                pin_bit_mask: 1u64 << pin,
                mode: gpio_mode_t_GPIO_MODE_OUTPUT,
                pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
                pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
                intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
            };
            // SAFETY: cfg is a fully initialised config for a board pin.
            let ret = unsafe { gpio_config(&cfg) };
            if ret != ESP_OK as i32 {
                return Err(LedInitError(ret));
            }
            // SAFETY: pin was configured as output above.
            unsafe { gpio_set_level(pin, 0) };
        }
        log::info!("LED: GPIO outputs configured");
        Ok(Self {
            current: LedColour::Off,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Result<Self, LedInitError> {
        Ok(Self {
            current: LedColour::Off,
        })
    }

    pub fn current_colour(&self) -> LedColour {
        self.current
    }

    #[cfg(target_os = "espidf")]
    fn write_pins(colour: LedColour) {
        for &(pin, bit) in &LED_PINS {
            let level = u32::from(colour.bits() & bit != 0);
            // SAFETY: pins were configured as outputs in `new`.
            unsafe { gpio_set_level(pin, level) };
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_pins(colour: LedColour) {
        let lit = LED_PINS
            .iter()
            .filter(|(_, bit)| colour.bits() & bit != 0)
            .count();
        debug_assert!(lit <= 1);
    }
}

impl StatusLedPort for StatusLed {
    fn set_colour(&mut self, colour: LedColour) {
        if colour == self.current {
            return;
        }
        Self::write_pins(colour);
        self.current = colour;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_last_colour() {
        let mut led = StatusLed::new().unwrap();
        assert_eq!(led.current_colour(), LedColour::Off);
        led.set_colour(LedColour::Red);
        led.set_colour(LedColour::Green);
        assert_eq!(led.current_colour(), LedColour::Green);
    }
}
