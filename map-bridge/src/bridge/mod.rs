//! Bridge protocol between the native host and the embedded map view
//!
//! Frames are JSON text carrying a `type` discriminator. Decoding never fails
//! loudly: anything unparseable or carrying an unrecognized `type` comes back
//! as [`Inbound::Ignored`], because an error thrown at the receive boundary has
//! nowhere to go on the other side of the isolation boundary.

pub mod channel;

pub use channel::{BridgeChannel, ChannelEvent, ChannelState, ChannelStats, SendOutcome};

use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{HostMessage, ViewMessage, HOST_MESSAGE_TYPES, VIEW_MESSAGE_TYPES};
use tokio::sync::mpsc;

/// One side of the ordered pipe across the isolation boundary.
pub trait FrameSink {
    fn post(&self, frame: String) -> Result<(), SinkClosed>;
}

#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
#[error("the other side of the bridge has gone away")]
pub struct SinkClosed;

impl FrameSink for mpsc::UnboundedSender<String> {
    fn post(&self, frame: String) -> Result<(), SinkClosed> {
        self.send(frame).map_err(|_| SinkClosed)
    }
}

/// Result of decoding one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound<T> {
    Message(T),
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Not JSON, or a known type with a malformed payload
    Malformed(String),
    /// JSON object without a string `type`
    MissingType,
    UnknownType(String),
}

pub fn decode_view_message(raw: &str) -> Inbound<ViewMessage> {
    decode(raw, VIEW_MESSAGE_TYPES)
}

pub fn decode_host_message(raw: &str) -> Inbound<HostMessage> {
    decode(raw, HOST_MESSAGE_TYPES)
}

pub fn encode<T: Serialize>(message: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(message)
}

fn decode<T: DeserializeOwned>(raw: &str, known_types: &[&str]) -> Inbound<T> {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => return Inbound::Ignored(IgnoreReason::Malformed(e.to_string())),
    };

    let Some(kind) = value.get("type").and_then(|t| t.as_str()) else {
        return Inbound::Ignored(IgnoreReason::MissingType);
    };
    if !known_types.contains(&kind) {
        return Inbound::Ignored(IgnoreReason::UnknownType(kind.to_string()));
    }

    match serde_json::from_value(value) {
        Ok(message) => Inbound::Message(message),
        Err(e) => Inbound::Ignored(IgnoreReason::Malformed(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_known_view_messages() {
        assert_eq!(
            decode_view_message(r#"{"type":"viewReady"}"#),
            Inbound::Message(ViewMessage::ViewReady)
        );
        assert_eq!(
            decode_view_message(r#"{"type":"locationSelected","lat":28.61,"lng":77.2}"#),
            Inbound::Message(ViewMessage::LocationSelected {
                lat: 28.61,
                lng: 77.2
            })
        );
        assert_eq!(
            decode_view_message(r#"{"type":"webviewReady"}"#),
            Inbound::Message(ViewMessage::ViewReady)
        );
    }

    #[test]
    fn test_decode_ignores_garbage() {
        assert!(matches!(
            decode_view_message("not json"),
            Inbound::Ignored(IgnoreReason::Malformed(_))
        ));
        assert_eq!(
            decode_view_message(r#"{"lat":1}"#),
            Inbound::Ignored(IgnoreReason::MissingType)
        );
        assert_eq!(
            decode_view_message(r#"{"type":"zoomChanged","zoom":3}"#),
            Inbound::Ignored(IgnoreReason::UnknownType("zoomChanged".to_string()))
        );
        assert!(matches!(
            decode_view_message(r#"{"type":"locationSelected","lat":"north"}"#),
            Inbound::Ignored(IgnoreReason::Malformed(_))
        ));
    }

    #[test]
    fn test_directions_do_not_cross() {
        // A host-bound frame echoed back at the host is not a view message.
        let frame = encode(&HostMessage::CenterMap { lat: 1.0, lng: 2.0 }).unwrap();
        assert_eq!(
            decode_view_message(&frame),
            Inbound::Ignored(IgnoreReason::UnknownType("centerMap".to_string()))
        );
        assert_eq!(
            decode_host_message(&frame),
            Inbound::Message(HostMessage::CenterMap { lat: 1.0, lng: 2.0 })
        );
    }

    #[test]
    fn test_sink_reports_closed_pipe() {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        assert!(tx.post("a".to_string()).is_ok());
        drop(rx);
        assert_eq!(tx.post("b".to_string()), Err(SinkClosed));
    }
}
