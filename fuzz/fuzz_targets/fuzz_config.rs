//! Fuzz target: `PanelConfig::from_json`
//!
//! Any document that parses and validates must describe a panel whose
//! watchdog can actually guard a coil:
//! - step in 1..=1000 ms and no longer than `max_on_time_ms`
//! - no GPIO used twice
//!
//! cargo fuzz run fuzz_config

#![no_main]

use afpanel::config::PanelConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = PanelConfig::from_json(text) {
        let t = &config.timing;
        assert!((1..=1_000).contains(&t.watchdog_step_ms));
        assert!(t.watchdog_step_ms <= t.max_on_time_ms);
        assert!(t.poll_interval_ms > 0);

        let mut pins = config.pins.buttons().to_vec();
        pins.extend([
            config.pins.motor,
            config.pins.high_damper,
            config.pins.low_damper,
            config.pins.ready_led,
            config.pins.alarm_led,
        ]);
        pins.sort_unstable();
        pins.dedup();
        assert_eq!(pins.len(), 10);
    }
});
