//! Host end of the bridge channel and its readiness handshake.
//!
//! The embedded view's script starts emitting before the host has
//! necessarily attached its listener, so the host only trusts the view to
//! receive once `viewReady` arrives. Until then every `send` is dropped:
//! nothing is queued, and nothing sent before the handshake can ever arrive
//! after something sent once the channel is ready. Sends after the handshake
//! go down a single ordered pipe (FIFO).

use shared_types::{HostMessage, ViewMessage};

use super::{decode_view_message, encode, FrameSink, Inbound};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    #[default]
    Uninitialized,
    AwaitingReady,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    /// Channel not ready, or the view is gone
    Dropped,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// The handshake just completed
    Ready,
    Message(ViewMessage),
    Ignored,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStats {
    pub delivered: u64,
    pub dropped: u64,
    pub ignored: u64,
}

pub struct BridgeChannel<S> {
    state: ChannelState,
    sink: S,
    stats: ChannelStats,
}

impl<S: FrameSink> BridgeChannel<S> {
    /// Attach to the pipe towards the view. The channel starts out waiting
    /// for the handshake.
    pub fn new(sink: S) -> Self {
        let mut channel = Self {
            state: ChannelState::Uninitialized,
            sink,
            stats: ChannelStats::default(),
        };
        channel.transition(ChannelState::AwaitingReady);
        channel
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ChannelState::Ready
    }

    pub fn stats(&self) -> ChannelStats {
        self.stats
    }

    pub fn send(&mut self, message: &HostMessage) -> SendOutcome {
        if !self.is_ready() {
            self.stats.dropped += 1;
            tracing::debug!(
                kind = message.kind(),
                state = ?self.state,
                "dropping bridge message sent before handshake"
            );
            return SendOutcome::Dropped;
        }

        let frame = match encode(message) {
            Ok(frame) => frame,
            Err(e) => {
                self.stats.dropped += 1;
                tracing::error!(kind = message.kind(), error = %e, "Failed to encode bridge message");
                return SendOutcome::Dropped;
            }
        };

        match self.sink.post(frame) {
            Ok(()) => {
                self.stats.delivered += 1;
                tracing::trace!(kind = message.kind(), "bridge message sent");
                SendOutcome::Delivered
            }
            Err(e) => {
                self.stats.dropped += 1;
                tracing::warn!(kind = message.kind(), error = %e, "bridge message lost");
                SendOutcome::Dropped
            }
        }
    }

    /// Handle one frame from the view. Never fails.
    pub fn receive(&mut self, raw: &str) -> ChannelEvent {
        match decode_view_message(raw) {
            Inbound::Message(ViewMessage::ViewReady) => {
                if self.is_ready() {
                    tracing::debug!("ignoring repeated viewReady");
                    self.stats.ignored += 1;
                    return ChannelEvent::Ignored;
                }
                self.transition(ChannelState::Ready);
                ChannelEvent::Ready
            }
            Inbound::Message(message) => ChannelEvent::Message(message),
            Inbound::Ignored(reason) => {
                self.stats.ignored += 1;
                tracing::debug!(?reason, "ignoring bridge frame");
                ChannelEvent::Ignored
            }
        }
    }

    fn transition(&mut self, next: ChannelState) {
        tracing::info!(from = ?self.state, to = ?next, "bridge channel state");
        self.state = next;
    }
}
