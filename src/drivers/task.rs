//! Named, core-pinned thread spawning for the panel's worker roles.
//!
//! The firmware runs three thread populations: button-edge callbacks,
//! at most one actuation worker, and one watchdog per energised solenoid.
//! All of them are created here so naming, stack size and core affinity are
//! decided in one place.
//!
//! On ESP-IDF, `esp_pthread_set_cfg()` sets thread-local configuration that
//! applies to the *next* `pthread_create()` call from the calling thread,
//! so the config→spawn pair must not be interleaved with other thread
//! creation on the same thread.

use std::thread::JoinHandle;

use crate::error::Error;

/// CPU core identifiers for the ESP32 Xtensa dual-core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU): protocol stacks and button callbacks.
    Pro = 0,
    /// Core 1 (APP_CPU): actuation workers and coil watchdogs.
    App = 1,
}

/// What a spawned thread is for.  Decides core, priority and stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRole {
    Actuation,
    Watchdog,
    ButtonEdge,
    Poller,
}

impl TaskRole {
    fn core(self) -> Core {
        match self {
            Self::Actuation | Self::Watchdog => Core::App,
            Self::ButtonEdge | Self::Poller => Core::Pro,
        }
    }

    fn priority(self) -> u8 {
        match self {
            // A watchdog must be able to pre-empt the pattern it guards.
            Self::Watchdog => 10,
            Self::Actuation => 8,
            Self::ButtonEdge => 6,
            Self::Poller => 5,
        }
    }

    fn stack_kb(self) -> usize {
        match self {
            Self::Watchdog | Self::Poller => 4,
            Self::Actuation | Self::ButtonEdge => 8,
        }
    }
}

/// Spawn a thread for `role`.  `name` must be null-terminated
/// (e.g. `"siren-worker\0"`).
#[cfg(target_os = "espidf")]
pub fn spawn_task(
    role: TaskRole,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> Result<JoinHandle<()>, Error> {
    let display_name = name.trim_end_matches('\0');

    // SAFETY: esp_pthread_set_cfg only copies the struct into thread-local
    // storage; `name` is 'static and null-terminated.
    unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = role.core() as i32;
        cfg.prio = role.priority() as i32;
        cfg.stack_size = (role.stack_kb() * 1024) as _;
        cfg.thread_name = name.as_ptr() as *const _;
        let ret = esp_idf_sys::esp_pthread_set_cfg(&cfg);
        if ret != esp_idf_sys::ESP_OK as i32 {
            log::error!("esp_pthread_set_cfg failed for '{}': {}", display_name, ret);
            return Err(Error::Spawn(display_name));
        }
    }

    std::thread::Builder::new()
        .name(display_name.into())
        .spawn(f)
        .map_err(|_| Error::Spawn(display_name))
}

/// Simulation fallback; ignores core affinity and priority.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_task(
    role: TaskRole,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> Result<JoinHandle<()>, Error> {
    let display_name = name.trim_end_matches('\0');
    log::debug!(
        "Spawning '{}' (sim, {:?} on {:?}, pri={}, no pinning)",
        display_name,
        role,
        role.core(),
        role.priority()
    );

    std::thread::Builder::new()
        .name(display_name.into())
        .stack_size(role.stack_kb().max(64) * 1024)
        .spawn(f)
        .map_err(|_| Error::Spawn(display_name))
}
