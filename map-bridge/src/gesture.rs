//! Gesture ownership between the host's scroll container and the map.
//!
//! While a pointer is down inside the embedded view the outer scroll is
//! disabled so pans and pinches reach the map. No debouncing: the last signal
//! wins. A lost `touchEnd` leaves outer scroll disabled until the next
//! start/end pair.

use shared_types::ViewMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureSignal {
    Start,
    End,
}

impl GestureSignal {
    pub fn from_message(message: &ViewMessage) -> Option<Self> {
        match message {
            ViewMessage::TouchStart => Some(GestureSignal::Start),
            ViewMessage::TouchEnd => Some(GestureSignal::End),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureArbiter {
    outer_scroll_enabled: bool,
}

impl Default for GestureArbiter {
    fn default() -> Self {
        Self {
            outer_scroll_enabled: true,
        }
    }
}

impl GestureArbiter {
    pub fn outer_scroll_enabled(&self) -> bool {
        self.outer_scroll_enabled
    }

    /// Returns the new outer-scroll setting.
    pub fn apply(&mut self, signal: GestureSignal) -> bool {
        self.outer_scroll_enabled = signal == GestureSignal::End;
        tracing::trace!(?signal, enabled = self.outer_scroll_enabled, "outer scroll");
        self.outer_scroll_enabled
    }
}
