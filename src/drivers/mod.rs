//! Actuator drivers, button inputs, cancellation, and worker spawning.

pub mod button;
pub mod cancel;
pub mod indicator;
pub mod motor;
pub mod relay;
pub mod solenoid;
pub mod task;
