//! Default GPIO assignments for the AF timer panel.
//!
//! These are only the factory defaults for [`PinMap`](crate::config::PinMap);
//! drivers never read them directly.  Rewire a panel by changing the config,
//! not this file.

// ---------------------------------------------------------------------------
// Siren outputs (relay board)
// ---------------------------------------------------------------------------

/// Rotor motor contactor relay.
pub const MOTOR_GPIO: i32 = 26;
/// High damper solenoid relay.
pub const HIGH_SOLENOID_GPIO: i32 = 20;
/// Low damper solenoid relay.
pub const LOW_SOLENOID_GPIO: i32 = 21;

// ---------------------------------------------------------------------------
// Panel buttons (momentary, active-low with pull-up)
// ---------------------------------------------------------------------------

pub const TEST_BUTTON_GPIO: i32 = 23;
pub const ALERT_BUTTON_GPIO: i32 = 22;
pub const FIRE_BUTTON_GPIO: i32 = 27;
pub const ATTACK_BUTTON_GPIO: i32 = 18;
pub const CANCEL_BUTTON_GPIO: i32 = 17;

// ---------------------------------------------------------------------------
// Panel lamps
// ---------------------------------------------------------------------------

/// Green "ready" lamp.
pub const READY_LED_GPIO: i32 = 9;
/// Red "alarm" lamp, lit while the siren is actuating.
pub const ALERT_LED_GPIO: i32 = 11;
