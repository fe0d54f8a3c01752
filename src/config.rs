//! Panel configuration parameters
//!
//! Pin wiring, attached siren model, and actuation timing.  Built once by the
//! composition root and handed to the panel at construction.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pins;

/// Which siren hardware is attached to the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SirenModel {
    /// Federal Signal 3T22A: rotor motor plus high/low damper solenoids.
    #[default]
    Fs3t22a,
    /// Federal Signal 2T22: rotor motor only.
    Fs2t22,
}

/// GPIO wiring of the panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinMap {
    pub motor: i32,
    pub high_damper: i32,
    pub low_damper: i32,

    pub test_button: i32,
    pub alert_button: i32,
    pub fire_button: i32,
    pub attack_button: i32,
    pub cancel_button: i32,

    pub ready_led: i32,
    pub alarm_led: i32,

    /// Buttons pull the line low when pressed.
    pub buttons_active_low: bool,
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            motor: pins::MOTOR_GPIO,
            high_damper: pins::HIGH_SOLENOID_GPIO,
            low_damper: pins::LOW_SOLENOID_GPIO,

            test_button: pins::TEST_BUTTON_GPIO,
            alert_button: pins::ALERT_BUTTON_GPIO,
            fire_button: pins::FIRE_BUTTON_GPIO,
            attack_button: pins::ATTACK_BUTTON_GPIO,
            cancel_button: pins::CANCEL_BUTTON_GPIO,

            ready_led: pins::READY_LED_GPIO,
            alarm_led: pins::ALERT_LED_GPIO,

            buttons_active_low: true,
        }
    }
}

impl PinMap {
    /// Button lines in [`Button::ALL`](crate::fsm::Button::ALL) order.
    pub fn buttons(&self) -> [i32; 5] {
        [
            self.test_button,
            self.alert_button,
            self.fire_button,
            self.attack_button,
            self.cancel_button,
        ]
    }

    fn all(&self) -> [i32; 10] {
        let [t, a, f, k, c] = self.buttons();
        [
            self.motor,
            self.high_damper,
            self.low_damper,
            t,
            a,
            f,
            k,
            c,
            self.ready_led,
            self.alarm_led,
        ]
    }
}

/// Actuation and input timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Longest a solenoid may stay energised before its watchdog drops it.
    pub max_on_time_ms: u64,
    /// Watchdog sleep increment; bounds how long `off()` can block.
    pub watchdog_step_ms: u64,
    /// Half-period of the fire tone's high/low damper toggle.
    pub fire_phase_ms: u64,
    /// Motor on (and off) period of the attack wail.
    pub attack_phase_ms: u64,
    /// Fire toggles per motor phase in the fire+attack composite.
    pub fire_attack_block: u32,
    /// Button debounce window.
    pub debounce_ms: u64,
    /// Button poll period of the edge poller.
    pub poll_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            max_on_time_ms: 5_000,
            watchdog_step_ms: 1_000,
            fire_phase_ms: 500,
            attack_phase_ms: 4_000,
            fire_attack_block: 4,
            debounce_ms: 50,
            poll_interval_ms: 10,
        }
    }
}

impl TimingConfig {
    pub fn max_on_time(&self) -> Duration {
        Duration::from_millis(self.max_on_time_ms)
    }

    pub fn watchdog_step(&self) -> Duration {
        Duration::from_millis(self.watchdog_step_ms)
    }

    pub fn fire_phase(&self) -> Duration {
        Duration::from_millis(self.fire_phase_ms)
    }

    pub fn attack_phase(&self) -> Duration {
        Duration::from_millis(self.attack_phase_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Complete panel configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PanelConfig {
    pub model: SirenModel,
    pub pins: PinMap,
    pub timing: TimingConfig,
}

impl PanelConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|_| Error::Config("malformed JSON"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the panel unsafe or inert.
    pub fn validate(&self) -> Result<()> {
        let t = &self.timing;
        if t.max_on_time_ms == 0 {
            return Err(Error::Config("max_on_time_ms must be > 0"));
        }
        if t.watchdog_step_ms == 0 || t.watchdog_step_ms > 1_000 {
            return Err(Error::Config("watchdog_step_ms must be in 1..=1000"));
        }
        if t.watchdog_step_ms > t.max_on_time_ms {
            return Err(Error::Config("watchdog_step_ms exceeds max_on_time_ms"));
        }
        if t.fire_phase_ms == 0 || t.attack_phase_ms == 0 || t.fire_attack_block == 0 {
            return Err(Error::Config("tone timing must be non-zero"));
        }
        if t.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be > 0"));
        }

        let all = self.pins.all();
        for (i, pin) in all.iter().enumerate() {
            if all[i + 1..].contains(pin) {
                return Err(Error::Config("duplicate GPIO in pin map"));
            }
        }
        Ok(())
    }
}
