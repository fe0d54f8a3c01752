//! Unified error types for the AF panel firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! composition root's error handling uniform.  Hardware faults are `Copy` so
//! they can be handed from a dying actuation worker to the event bus without
//! allocation.

use core::fmt;

use embedded_hal::digital::ErrorKind;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An adapter asked for something the panel cannot do.
    Command(CommandError),
    /// A physical output line could not be driven.
    Hardware(HardwareFault),
    /// Configuration is invalid or could not be parsed.
    Config(&'static str),
    /// A worker thread could not be created.
    Spawn(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Hardware(e) => write!(f, "hardware: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Spawn(name) => write!(f, "spawn: could not start '{name}'"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Command errors
// ---------------------------------------------------------------------------

/// Rejections reported back to the console / REST / websocket adapters.
/// Core state is never changed when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    UnknownMode(String),
    UnknownTone(String),
    UnknownControl(String),
    UnknownDebug(String),
    /// The attached siren model has no such capability.
    Unsupported(&'static str),
    /// Debug actuation is only allowed while the panel is idle.
    Busy,
    /// The subscriber registry is full.
    TooManySubscribers,
    /// A JSON request could not be understood.
    BadRequest(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMode(m) => write!(f, "Mode {m} not valid"),
            Self::UnknownTone(t) => write!(f, "Tone {t} not valid"),
            Self::UnknownControl(c) => write!(f, "Control {c} not valid"),
            Self::UnknownDebug(d) => write!(f, "Debug {d} not valid"),
            Self::Unsupported(what) => write!(f, "{what} not supported by this siren"),
            Self::Busy => write!(f, "panel busy"),
            Self::TooManySubscribers => write!(f, "too many event subscribers"),
            Self::BadRequest(msg) => write!(f, "bad request: {msg}"),
        }
    }
}

impl CommandError {
    /// JSON error payload handed back to adapters.
    pub fn error_payload(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.to_string() })
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

// ---------------------------------------------------------------------------
// Hardware faults
// ---------------------------------------------------------------------------

/// A write to a physical output failed.  Fatal to the actuation worker
/// that hit it; never retried at this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareFault {
    /// Name of the line that failed (`"motor"`, `"high_damper"`, ...).
    pub line: &'static str,
    pub kind: ErrorKind,
}

impl HardwareFault {
    pub const fn new(line: &'static str, kind: ErrorKind) -> Self {
        Self { line, kind }
    }
}

impl fmt::Display for HardwareFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "write to '{}' failed ({:?})", self.line, self.kind)
    }
}

impl From<HardwareFault> for Error {
    fn from(e: HardwareFault) -> Self {
        Self::Hardware(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
