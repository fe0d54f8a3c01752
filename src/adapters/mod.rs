//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements               | Connects to               |
//! |------------|--------------------------|---------------------------|
//! | `gpio`     | OutputPin / InputPin     | ESP32 GPIO (sim on host)  |
//! | `poller`   | edge delivery            | `PanelService` buttons    |
//! | `log_sink` | EventHandler             | Serial log output         |

pub mod gpio;
pub mod log_sink;
pub mod poller;
