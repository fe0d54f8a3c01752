//! Application core: the panel state machine and its boundaries.
//!
//! Everything here is hardware-agnostic.  Physical lines come in through
//! the [`ports`] traits, adapters talk to [`service::PanelService`] with
//! [`commands`], and hear back through [`events`].

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
