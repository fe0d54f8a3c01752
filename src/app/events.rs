//! Outbound panel events and the subscriber registry.
//!
//! The [`PanelService`](super::service::PanelService) publishes a
//! [`PanelEvent`] on every mode change, debug actuation and hardware fault.
//! Adapters on the other side (websocket push, log sink) register an
//! [`EventHandler`] and decide what to do with it.
//!
//! Delivery is synchronous and best-effort.  The registry lock is never
//! held while a handler runs, so a slow subscriber only delays the thread
//! that emitted the event, never the registry or the state machine locks.

use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::app::commands::DebugAction;
use crate::error::CommandError;
use crate::fsm::Mode;

/// Maximum simultaneous subscribers (one per websocket client, plus logs).
pub const MAX_SUBSCRIBERS: usize = 16;

/// Structured events emitted by the panel core.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PanelEvent {
    /// The panel came up (carries its initial mode).
    Started { mode: Mode },
    ModeChanged { from: Mode, to: Mode },
    /// An output was driven directly through a debug command.
    Debug { action: DebugAction },
    /// An output write failed; the running pattern was abandoned.
    HardwareFault { line: &'static str },
}

impl PanelEvent {
    /// JSON payload as pushed to websocket clients.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}

/// A subscriber to panel events.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &PanelEvent);
}

impl<F> EventHandler for F
where
    F: Fn(&PanelEvent) + Send + Sync,
{
    fn handle(&self, event: &PanelEvent) {
        self(event);
    }
}

/// Registration handle returned by [`EventBus::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Subscribers = heapless::Vec<(HandlerId, Arc<dyn EventHandler>), MAX_SUBSCRIBERS>;

/// Unordered set of event subscribers.
pub struct EventBus {
    subscribers: Mutex<Subscribers>,
    next_id: AtomicU64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(heapless::Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn add(&self, handler: Arc<dyn EventHandler>) -> Result<HandlerId, CommandError> {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut subs = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        subs.push((id, handler))
            .map_err(|_| CommandError::TooManySubscribers)?;
        Ok(id)
    }

    /// Returns `false` if `id` was not registered.
    pub fn remove(&self, id: HandlerId) -> bool {
        let mut subs = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        match subs.iter().position(|(h, _)| *h == id) {
            Some(idx) => {
                subs.swap_remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn emit(&self, event: &PanelEvent) {
        let snapshot: heapless::Vec<Arc<dyn EventHandler>, MAX_SUBSCRIBERS> = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();
        for handler in &snapshot {
            handler.handle(event);
        }
    }
}
