//! Siren capability interface and hardware models.
//!
//! The panel has five buttons, but what each one does depends on the siren
//! wired to it.  A 2T22 has no solenoids, so it has nothing to do for
//! "Fire"; a 3T22A drives two dampers.  Each model implements [`Siren`];
//! the panel holds one `Arc<dyn Siren>` and never needs to know which.
//!
//! Tone methods run on the actuation worker thread and must block until
//! their [`CancelToken`] reports cancellation (or the pattern completes),
//! then leave every output off.  They sleep only through
//! [`CancelToken::wait`], never by polling.

pub mod fs2t22;
pub mod fs3t22a;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::ports::OutputLine;
use crate::config::{PanelConfig, SirenModel};
use crate::drivers::cancel::CancelToken;
use crate::error::{CommandError, HardwareFault};

pub use fs2t22::Fs2t22;
pub use fs3t22a::Fs3t22a;

/// A named actuation pattern a user can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Test,
    Alert,
    Fire,
    Attack,
    FireAttack,
}

impl Tone {
    pub const ALL: [Tone; 5] = [
        Tone::Alert,
        Tone::Fire,
        Tone::Attack,
        Tone::FireAttack,
        Tone::Test,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Alert => "alert",
            Self::Fire => "fire",
            Self::Attack => "attack",
            Self::FireAttack => "fire_attack",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, CommandError> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| CommandError::UnknownTone(name.to_owned()))
    }
}

/// Capability set of a siren attached to the panel.
///
/// Optional capabilities default to "nothing to do", mirroring a siren
/// that simply lacks the hardware.
pub trait Siren: Send + Sync {
    fn model(&self) -> &'static str;

    /// Whether this model has a meaningful pattern for `tone`.
    fn supports(&self, tone: Tone) -> bool {
        let _ = tone;
        true
    }

    fn test(&self, cancel: &CancelToken) -> Result<(), HardwareFault> {
        self.alert(cancel)
    }

    /// Steady tone until cancelled.
    fn alert(&self, cancel: &CancelToken) -> Result<(), HardwareFault>;

    fn fire(&self, cancel: &CancelToken) -> Result<(), HardwareFault> {
        let _ = cancel;
        Ok(())
    }

    /// Rising and falling wail until cancelled.
    fn attack(&self, cancel: &CancelToken) -> Result<(), HardwareFault>;

    fn fire_attack(&self, cancel: &CancelToken) -> Result<(), HardwareFault> {
        let _ = cancel;
        Ok(())
    }

    fn set_high_damper(&self, closed: bool) -> Result<(), HardwareFault> {
        let _ = closed;
        Ok(())
    }

    fn set_low_damper(&self, closed: bool) -> Result<(), HardwareFault> {
        let _ = closed;
        Ok(())
    }

    /// Direct motor control for debug actuation.
    fn set_motor(&self, on: bool) -> Result<(), HardwareFault>;

    /// De-energise every output.  Attempts all of them even if one fails
    /// and reports the first failure.
    fn all_off(&self) -> Result<(), HardwareFault>;

    /// Whether any output is currently energised.
    fn is_energised(&self) -> bool;

    /// Dispatch `tone` to its pattern.
    fn play(&self, tone: Tone, cancel: &CancelToken) -> Result<(), HardwareFault> {
        match tone {
            Tone::Test => self.test(cancel),
            Tone::Alert => self.alert(cancel),
            Tone::Fire => self.fire(cancel),
            Tone::Attack => self.attack(cancel),
            Tone::FireAttack => self.fire_attack(cancel),
        }
    }
}

/// Pattern timing shared by every model.
#[derive(Debug, Clone, Copy)]
pub struct ToneTiming {
    pub fire_phase: Duration,
    pub attack_phase: Duration,
    /// Fire phases per motor phase in fire+attack.
    pub fire_attack_block: u32,
    pub max_on: Duration,
    pub watchdog_step: Duration,
}

impl From<&PanelConfig> for ToneTiming {
    fn from(config: &PanelConfig) -> Self {
        let t = &config.timing;
        Self {
            fire_phase: t.fire_phase(),
            attack_phase: t.attack_phase(),
            fire_attack_block: t.fire_attack_block,
            max_on: t.max_on_time(),
            watchdog_step: t.watchdog_step(),
        }
    }
}

/// Output lines of the siren relay board.
pub struct SirenLines {
    pub motor: Box<dyn OutputLine>,
    pub high_damper: Box<dyn OutputLine>,
    pub low_damper: Box<dyn OutputLine>,
}

/// Build the siren model named in `config`.
pub fn build(config: &PanelConfig, lines: SirenLines) -> Result<Arc<dyn Siren>, HardwareFault> {
    let timing = ToneTiming::from(config);
    let siren: Arc<dyn Siren> = match config.model {
        SirenModel::Fs3t22a => Arc::new(Fs3t22a::new(lines, timing)?),
        SirenModel::Fs2t22 => Arc::new(Fs2t22::new(lines, timing)?),
    };
    log::info!("Siren model: {}", siren.model());
    Ok(siren)
}
