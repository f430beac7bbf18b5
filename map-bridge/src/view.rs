//! The embedded map view, both as the page handed to the web view and as a
//! headless stand-in that speaks the same protocol.
//!
//! [`EmbeddedMapView`] mirrors what the page script does so the host side can
//! be driven end to end without a browser engine.

use shared_types::{HostMessage, LatLng, ViewMessage};
use tokio::sync::mpsc;

use crate::bridge::{decode_host_message, encode, FrameSink, Inbound};
use crate::reconciler::{MarkerReconciler, RenderReport, Viewport};

const PAGE_TEMPLATE: &str = include_str!("../assets/map_page.html");

/// Starting frame of the browse screen: New Delhi.
pub const DEFAULT_CENTER: LatLng = LatLng {
    lat: 28.6139,
    lng: 77.2090,
};
pub const BROWSE_ZOOM: u8 = 12;
/// Zoom of the edit screen, centered on the record being edited.
pub const EDIT_ZOOM: u8 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    /// Markers only
    Browse,
    /// Taps report `locationSelected`
    Pick,
}

impl PageMode {
    fn as_str(self) -> &'static str {
        match self {
            PageMode::Browse => "browse",
            PageMode::Pick => "pick",
        }
    }
}

/// Parameters for the self-contained page loaded into the web view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapPage {
    pub center: LatLng,
    pub zoom: u8,
    pub mode: PageMode,
}

impl MapPage {
    pub fn browse() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: BROWSE_ZOOM,
            mode: PageMode::Browse,
        }
    }

    /// Add screen: same frame as browsing, but taps pick a location.
    pub fn pick() -> Self {
        Self {
            mode: PageMode::Pick,
            ..Self::browse()
        }
    }

    pub fn edit(at: LatLng) -> Self {
        Self {
            center: at,
            zoom: EDIT_ZOOM,
            mode: PageMode::Pick,
        }
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::Centered {
            center: self.center,
            zoom: self.zoom,
        }
    }

    pub fn render(&self) -> String {
        PAGE_TEMPLATE
            .replace("{{MODE}}", self.mode.as_str())
            .replace("{{CENTER_LAT}}", &self.center.lat.to_string())
            .replace("{{CENTER_LNG}}", &self.center.lng.to_string())
            .replace("{{ZOOM}}", &self.zoom.to_string())
    }
}

/// View side of the bridge channel.
pub struct EmbeddedMapView<S> {
    reconciler: MarkerReconciler,
    to_host: S,
    ready_sent: bool,
    selected: Option<LatLng>,
}

impl<S: FrameSink> EmbeddedMapView<S> {
    pub fn new(page: MapPage, to_host: S) -> Self {
        Self {
            reconciler: MarkerReconciler::new(page.viewport()),
            to_host,
            ready_sent: false,
            selected: None,
        }
    }

    pub fn reconciler(&self) -> &MarkerReconciler {
        &self.reconciler
    }

    pub fn selected(&self) -> Option<LatLng> {
        self.selected
    }

    /// Page finished loading; announces readiness at most once.
    pub fn load(&mut self) {
        if self.ready_sent {
            return;
        }
        self.ready_sent = true;
        self.post(&ViewMessage::ViewReady);
    }

    /// Handle one frame from the host. Unknown or malformed frames are
    /// dropped without a reply.
    pub fn deliver(&mut self, raw: &str) -> Option<RenderReport> {
        match decode_host_message(raw) {
            Inbound::Message(message) => self.apply(&message),
            Inbound::Ignored(reason) => {
                tracing::debug!(?reason, "view ignoring host frame");
                None
            }
        }
    }

    pub fn apply(&mut self, message: &HostMessage) -> Option<RenderReport> {
        match message {
            HostMessage::RenderMarkers { payload } => Some(self.reconciler.render(payload)),
            HostMessage::CenterMap { lat, lng } => {
                self.reconciler.center_on(LatLng::new(*lat, *lng));
                None
            }
        }
    }

    /// User tapped the map at `at`.
    pub fn tap(&mut self, at: LatLng) {
        self.selected = Some(at);
        self.post(&ViewMessage::LocationSelected {
            lat: at.lat,
            lng: at.lng,
        });
    }

    pub fn pointer_down(&mut self) {
        self.post(&ViewMessage::TouchStart);
    }

    pub fn pointer_up(&mut self) {
        self.post(&ViewMessage::TouchEnd);
    }

    /// Apply every frame currently queued from the host.
    pub fn pump(&mut self, from_host: &mut mpsc::UnboundedReceiver<String>) -> usize {
        let mut handled = 0;
        while let Ok(frame) = from_host.try_recv() {
            self.deliver(&frame);
            handled += 1;
        }
        handled
    }

    fn post(&self, message: &ViewMessage) {
        let frame = match encode(message) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(kind = message.kind(), error = %e, "Failed to encode view message");
                return;
            }
        };
        if self.to_host.post(frame).is_err() {
            tracing::warn!(kind = message.kind(), "host is gone, view message lost");
        }
    }
}
