//! Screen-level controller tying the record store to one embedded map view.
//!
//! A `MapSession` owns the host end of a bridge channel and a handle to the
//! shared [`RecordStore`]. Whenever the store's collection is replaced and
//! the channel is ready, the plottable records are pushed to the view as a
//! `renderMarkers` frame; the handshake pushes whatever is current at that
//! moment. Frames from the view update the pending location and the gesture
//! arbiter.
//!
//! The session's own operations push right after they change the store.
//! Changes made through other handles of the store reach the view through
//! [`MapSession::run`], which selects over view frames and store changes.

use std::collections::VecDeque;

use shared_types::{HostMessage, LatLng, ListingRecord, SearchCriteria, ViewMessage};
use tokio::sync::{mpsc, watch};

use crate::bridge::{
    BridgeChannel, ChannelEvent, ChannelState, ChannelStats, FrameSink, SendOutcome,
};
use crate::client::{ListingsClient, StoreError};
use crate::config::BridgeConfig;
use crate::form::{criteria_from_inputs, FormError, ListingForm};
use crate::geocode::{GeocodeError, GeocodeOutcome, Geocoder};
use crate::gesture::{GestureArbiter, GestureSignal};
use crate::notice::Notice;
use crate::store::{RecordSet, RecordStore, StoreSnapshot};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct MapSession<S> {
    channel: BridgeChannel<S>,
    store: RecordStore,
    records: watch::Receiver<RecordSet>,
    geocoder: Geocoder,
    gestures: GestureArbiter,
    pending_location: Option<LatLng>,
    criteria: SearchCriteria,
    notices: VecDeque<Notice>,
}

impl<S: FrameSink> MapSession<S> {
    pub fn new(to_view: S, store: RecordStore, geocoder: Geocoder) -> Self {
        let records = store.subscribe();
        Self {
            channel: BridgeChannel::new(to_view),
            store,
            records,
            geocoder,
            gestures: GestureArbiter::default(),
            pending_location: None,
            criteria: SearchCriteria::default(),
            notices: VecDeque::new(),
        }
    }

    /// Build a session with its own store and geocoder.
    pub fn from_config(config: &BridgeConfig, to_view: S) -> anyhow::Result<Self> {
        let store = RecordStore::new(ListingsClient::from_config(config)?);
        let geocoder = Geocoder::from_config(config)?;
        Ok(Self::new(to_view, store, geocoder))
    }

    /// Edit screen: start from the record's saved coordinates.
    pub fn with_pending_location(mut self, at: Option<LatLng>) -> Self {
        self.pending_location = at;
        self
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn channel_state(&self) -> ChannelState {
        self.channel.state()
    }

    pub fn channel_stats(&self) -> ChannelStats {
        self.channel.stats()
    }

    pub fn outer_scroll_enabled(&self) -> bool {
        self.gestures.outer_scroll_enabled()
    }

    pub fn pending_location(&self) -> Option<LatLng> {
        self.pending_location
    }

    pub fn criteria(&self) -> &SearchCriteria {
        &self.criteria
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.store.snapshot()
    }

    /// Drain the notices queued for the presentation layer.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    /// Dispatch one frame from the view.
    pub fn handle_frame(&mut self, raw: &str) -> ChannelEvent {
        let event = self.channel.receive(raw);
        match &event {
            ChannelEvent::Ready => {
                self.push_markers();
            }
            ChannelEvent::Message(ViewMessage::LocationSelected { lat, lng }) => {
                tracing::debug!(lat, lng, "location selected");
                self.pending_location = Some(LatLng::new(*lat, *lng));
            }
            ChannelEvent::Message(message) => {
                if let Some(signal) = GestureSignal::from_message(message) {
                    self.gestures.apply(signal);
                }
            }
            ChannelEvent::Ignored => {}
        }
        event
    }

    /// Push the collection if it changed since the last push. Nothing is
    /// consumed before the handshake, so the handshake still sees the change.
    pub fn sync_markers(&mut self) -> bool {
        if !self.channel.is_ready() || !self.records.has_changed().unwrap_or(false) {
            return false;
        }
        self.push_markers() == SendOutcome::Delivered
    }

    /// Event loop for a mounted view: dispatch frames from the view and push
    /// markers whenever the shared collection is replaced, whoever replaced
    /// it. Returns once the view side of the pipe is gone.
    pub async fn run(&mut self, from_view: &mut mpsc::UnboundedReceiver<String>) {
        loop {
            tokio::select! {
                frame = from_view.recv() => match frame {
                    Some(frame) => {
                        self.handle_frame(&frame);
                    }
                    None => {
                        tracing::info!("embedded view closed, session loop stopping");
                        break;
                    }
                },
                changed = self.records.changed() => {
                    if changed.is_err() {
                        tracing::warn!("record store dropped, session loop stopping");
                        break;
                    }
                    // Before the handshake there is nothing to send; the
                    // ready push carries the current collection.
                    if self.channel.is_ready() {
                        self.push_markers();
                    }
                }
            }
        }
    }

    /// Reload the whole collection.
    pub async fn load_all(&mut self) -> Result<RecordSet, StoreError> {
        let result = self.store.fetch_all().await;
        self.after_read(result)
    }

    /// Search with the map screen's raw filter inputs.
    pub async fn apply_filters(
        &mut self,
        location: &str,
        max_price: &str,
    ) -> Result<RecordSet, StoreError> {
        self.criteria = criteria_from_inputs(location, max_price);
        let result = self.store.search(&self.criteria).await;
        self.after_read(result)
    }

    /// Re-run the current filters, or load everything when there are none.
    pub async fn refresh(&mut self) -> Result<RecordSet, StoreError> {
        let result = if self.criteria.is_empty() {
            self.store.fetch_all().await
        } else {
            self.store.search(&self.criteria).await
        };
        self.after_read(result)
    }

    /// Geocode a place name and recenter the view on the first match.
    pub async fn center_on_place(&mut self, query: &str) -> Result<GeocodeOutcome, GeocodeError> {
        let outcome = self.geocoder.resolve(query).await;
        match &outcome {
            Ok(GeocodeOutcome::Found(at)) => {
                self.channel.send(&HostMessage::CenterMap {
                    lat: at.lat,
                    lng: at.lng,
                });
            }
            Ok(GeocodeOutcome::NotFound) => {
                self.notices
                    .push_back(Notice::error("Not found", "Could not find that location."));
            }
            Ok(GeocodeOutcome::Skipped) => {}
            Err(e) => {
                tracing::warn!(error = %e, %query, "geocoding failed");
                self.notices.push_back(Notice::error(
                    "Error",
                    "Failed to geocode location. Try again.",
                ));
            }
        }
        outcome
    }

    /// Add screen: persist the form at the pending location.
    pub async fn submit_listing(
        &mut self,
        form: &ListingForm,
    ) -> Result<ListingRecord, SessionError> {
        let draft = form.to_draft(self.pending_location)?;
        let record = self.store.add(draft).await?;
        self.pending_location = None;
        self.sync_markers();
        Ok(record)
    }

    /// Edit screen: save the form over record `id`.
    pub async fn save_listing(
        &mut self,
        id: &str,
        form: &ListingForm,
    ) -> Result<ListingRecord, SessionError> {
        let patch = form.to_patch(self.pending_location)?;
        let record = self.store.update(id, patch).await?;
        self.sync_markers();
        Ok(record)
    }

    fn after_read(
        &mut self,
        result: Result<RecordSet, StoreError>,
    ) -> Result<RecordSet, StoreError> {
        match &result {
            Ok(_) => {
                self.sync_markers();
            }
            Err(e) if e.is_superseded() => {}
            Err(e) => self.notices.push_back(Notice::error("Error", e.to_string())),
        }
        result
    }

    fn push_markers(&mut self) -> SendOutcome {
        let plottable: Vec<ListingRecord> = self
            .records
            .borrow_and_update()
            .iter()
            .filter(|r| r.is_plottable())
            .cloned()
            .collect();
        tracing::debug!(count = plottable.len(), "pushing markers to view");
        self.channel.send(&HostMessage::RenderMarkers { payload: plottable })
    }
}
