//! Raw GPIO lines behind the `embedded-hal` digital traits.
//!
//! On ESP-IDF each line is configured once with `gpio_config` and then
//! driven with `gpio_set_level` / `gpio_get_level`.  On the host the lines
//! hold their level in memory: outputs remember what was written, inputs
//! read the released level so a simulated panel sits idle.

use core::fmt;

use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use crate::app::ports::{InputLine, OutputLine};
use crate::config::PinMap;
use crate::siren::SirenLines;

/// An `esp_err_t` from the GPIO driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioError(pub i32);

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gpio error (rc={})", self.0)
    }
}

impl std::error::Error for GpioError {}

impl embedded_hal::digital::Error for GpioError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

// ── Outputs ──────────────────────────────────────────────────

/// Push-pull output, low at construction.
pub struct GpioOutput {
    pin: i32,
    #[cfg(not(target_os = "espidf"))]
    level: bool,
}

impl GpioOutput {
    #[cfg(target_os = "espidf")]
    pub fn new(pin: i32) -> Result<Self, GpioError> {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        // SAFETY: gpio_config copies the struct; `pin` comes from a
        // validated PinMap.
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(GpioError(ret));
        }
        let mut line = Self { pin };
        line.write(false)?;
        Ok(line)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(pin: i32) -> Result<Self, GpioError> {
        log::debug!("gpio(sim): output {pin}");
        Ok(Self { pin, level: false })
    }

    pub fn pin(&self) -> i32 {
        self.pin
    }

    #[cfg(target_os = "espidf")]
    fn write(&mut self, high: bool) -> Result<(), GpioError> {
        // SAFETY: writes an already-configured output pin.
        let ret = unsafe { gpio_set_level(self.pin, u32::from(high)) };
        if ret == ESP_OK as i32 { Ok(()) } else { Err(GpioError(ret)) }
    }

    #[cfg(not(target_os = "espidf"))]
    fn write(&mut self, high: bool) -> Result<(), GpioError> {
        self.level = high;
        Ok(())
    }
}

impl ErrorType for GpioOutput {
    type Error = GpioError;
}

impl OutputPin for GpioOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}

// ── Inputs ───────────────────────────────────────────────────

/// Input with the pull resistor that holds a released button at its idle
/// level.
pub struct GpioInput {
    pin: i32,
    #[cfg(not(target_os = "espidf"))]
    idle_high: bool,
}

impl GpioInput {
    #[cfg(target_os = "espidf")]
    pub fn new(pin: i32, active_low: bool) -> Result<Self, GpioError> {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: if active_low {
                gpio_pullup_t_GPIO_PULLUP_ENABLE
            } else {
                gpio_pullup_t_GPIO_PULLUP_DISABLE
            },
            pull_down_en: if active_low {
                gpio_pulldown_t_GPIO_PULLDOWN_DISABLE
            } else {
                gpio_pulldown_t_GPIO_PULLDOWN_ENABLE
            },
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        // SAFETY: as for outputs.
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(GpioError(ret));
        }
        Ok(Self { pin })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(pin: i32, active_low: bool) -> Result<Self, GpioError> {
        log::debug!("gpio(sim): input {pin}");
        Ok(Self {
            pin,
            idle_high: active_low,
        })
    }

    pub fn pin(&self) -> i32 {
        self.pin
    }

    #[cfg(target_os = "espidf")]
    fn read(&self) -> bool {
        // SAFETY: read-only register access on a configured input.
        (unsafe { gpio_get_level(self.pin) }) != 0
    }

    #[cfg(not(target_os = "espidf"))]
    fn read(&self) -> bool {
        self.idle_high
    }
}

impl ErrorType for GpioInput {
    type Error = GpioError;
}

impl InputPin for GpioInput {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.read())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.read())
    }
}

// ── Wiring helpers ───────────────────────────────────────────

fn output(pin: i32) -> Result<Box<dyn OutputLine>, GpioError> {
    Ok(Box::new(GpioOutput::new(pin)?))
}

/// Motor and damper relays.
pub fn siren_lines(pins: &PinMap) -> Result<SirenLines, GpioError> {
    Ok(SirenLines {
        motor: output(pins.motor)?,
        high_damper: output(pins.high_damper)?,
        low_damper: output(pins.low_damper)?,
    })
}

/// Ready and alarm lamps.
pub fn lamp_lines(pins: &PinMap) -> Result<(Box<dyn OutputLine>, Box<dyn OutputLine>), GpioError> {
    Ok((output(pins.ready_led)?, output(pins.alarm_led)?))
}

/// The five button inputs in [`Button::ALL`](crate::fsm::Button::ALL) order.
pub fn button_lines(pins: &PinMap) -> Result<[Box<dyn InputLine>; 5], GpioError> {
    let [t, a, f, k, c] = pins.buttons();
    let input = |pin| -> Result<Box<dyn InputLine>, GpioError> {
        Ok(Box::new(GpioInput::new(pin, pins.buttons_active_low)?))
    };
    Ok([input(t)?, input(a)?, input(f)?, input(k)?, input(c)?])
}
