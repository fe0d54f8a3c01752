//! Fuzz target: websocket request parsing
//!
//! Feeds arbitrary bytes to `Request::parse` and checks the fields of
//! whatever parses, verifying:
//! - No panics on malformed JSON or absurd durations
//! - Tone names resolve exactly when they are one of the five tones
//! - Every failure is a typed `CommandError` with a JSON payload
//!
//! cargo fuzz run fuzz_request

#![no_main]

use afpanel::app::commands::{duration_from_secs, Request};
use afpanel::siren::Tone;
use libfuzzer_sys::fuzz_target;

const TONES: [&str; 5] = ["alert", "fire", "attack", "fire_attack", "test"];

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let duration = match Request::parse(text) {
        Ok(Request::SetTone { tone, duration }) => {
            assert_eq!(Tone::from_name(&tone).is_ok(), TONES.contains(&tone.as_str()));
            duration
        }
        Ok(Request::TurnOn { duration }) => duration,
        Ok(_) => None,
        Err(e) => {
            assert!(e.error_payload()["error"].is_string());
            return;
        }
    };
    match duration_from_secs(duration) {
        Ok(Some(d)) => assert!(d.as_secs_f64() >= 0.0),
        Ok(None) => {}
        Err(e) => assert!(e.error_payload()["error"].is_string()),
    }
});
