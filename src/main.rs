//! AF Timer Panel Firmware: Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  GpioOutput/Input   ButtonPoller        LogEventSink           │
//! │  (relays, lamps,    (debounce, one      (EventHandler)         │
//! │   buttons)           thread per edge)                          │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │   PanelService: Mode · decide · actuation worker       │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Siren (3T22A / 2T22) · GuardedActuator watchdogs              │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;

use anyhow::Result;
use log::info;

use afpanel::adapters::gpio;
use afpanel::adapters::log_sink::LogEventSink;
use afpanel::adapters::poller::ButtonPoller;
use afpanel::app::service::PanelService;
use afpanel::config::PanelConfig;
use afpanel::drivers::button::PanelInputs;
use afpanel::drivers::indicator::Indicators;
use afpanel::error::Error;
use afpanel::siren;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  AF Panel v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = PanelConfig::default();
    config.validate()?;
    info!("Siren model {:?}, pins {:?}", config.model, config.pins);

    // ── 3. Hardware lines ─────────────────────────────────────
    let siren = siren::build(&config, gpio::siren_lines(&config.pins)?).map_err(Error::from)?;
    let (ready, alarm) = gpio::lamp_lines(&config.pins)?;
    let indicators = Arc::new(Indicators::new(ready, alarm).map_err(Error::from)?);
    let inputs = PanelInputs::new(
        gpio::button_lines(&config.pins)?,
        config.pins.buttons_active_low,
    );

    // ── 4. Panel core ─────────────────────────────────────────
    let panel = Arc::new(PanelService::new(siren, Box::new(inputs)).with_indicators(indicators));
    panel.add_event_handler(Arc::new(LogEventSink::new())).map_err(Error::from)?;
    panel.start();
    info!("Command table: {}", panel.api_mappings().to_json());

    // ── 5. Button edges ───────────────────────────────────────
    let mut poller = ButtonPoller::start(Arc::clone(&panel), &config.timing)?;
    info!("System ready.");
    poller.join();

    Ok(())
}
