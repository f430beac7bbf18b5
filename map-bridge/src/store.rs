//! Record store - the authoritative in-memory listing collection
//!
//! One `RecordStore` is shared (by cloning the handle) between every
//! screen-level controller. Mutation happens only through its operations.
//!
//! # Sequencing
//!
//! Reads (`fetch_all`, `search`) replace the whole collection. Each read takes
//! a monotonically increasing sequence number before it suspends; when the
//! response comes back it is applied only if no newer read has already been
//! applied. Overlapping searches therefore resolve last-request-wins instead
//! of last-response-wins.
//!
//! Writes (`add`, `update`) patch the collection in place and return their
//! outcome to the caller. They do not touch the shared error slot, which is
//! reserved for read failures the map screen renders.

use std::sync::{Arc, Mutex, MutexGuard};

use shared_types::{ListingDraft, ListingPatch, ListingRecord, SearchCriteria};
use tokio::sync::watch;

use crate::client::{ListingsClient, StoreError};

/// Immutable view of the collection; a new `Arc` means a new collection.
pub type RecordSet = Arc<Vec<ListingRecord>>;

#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub records: RecordSet,
    pub loading: bool,
    pub error: Option<String>,
    /// Bumped every time `records` is replaced
    pub revision: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestSeq(u64);

impl RequestSeq {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Clone)]
pub struct RecordStore {
    inner: Arc<RecordStoreInner>,
}

struct RecordStoreInner {
    client: ListingsClient,
    state: Mutex<StoreState>,
    records_tx: watch::Sender<RecordSet>,
}

#[derive(Default)]
struct StoreState {
    records: RecordSet,
    error: Option<String>,
    revision: u64,
    /// Highest read sequence handed out
    issued: u64,
    /// Highest read sequence whose response was applied
    applied: u64,
    pending_writes: usize,
}

impl StoreState {
    fn loading(&self) -> bool {
        self.applied < self.issued || self.pending_writes > 0
    }

    fn replace(&mut self, records: RecordSet) {
        self.records = records;
        self.revision += 1;
    }
}

impl RecordStore {
    pub fn new(client: ListingsClient) -> Self {
        let (records_tx, _) = watch::channel(RecordSet::default());
        Self {
            inner: Arc::new(RecordStoreInner {
                client,
                state: Mutex::new(StoreState::default()),
                records_tx,
            }),
        }
    }

    /// Receiver that is notified whenever the collection is replaced.
    pub fn subscribe(&self) -> watch::Receiver<RecordSet> {
        self.inner.records_tx.subscribe()
    }

    pub fn records(&self) -> RecordSet {
        self.state().records.clone()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.state();
        StoreSnapshot {
            records: state.records.clone(),
            loading: state.loading(),
            error: state.error.clone(),
            revision: state.revision,
        }
    }

    /// Load the full (or availability-filtered) collection.
    pub async fn fetch_all(&self) -> Result<RecordSet, StoreError> {
        let seq = self.begin_read();
        tracing::debug!(seq = seq.get(), "fetching all listings");
        let result = self.inner.client.fetch_all().await;
        self.complete_read(seq, result)
    }

    /// Replace the collection with the records matching `criteria`.
    pub async fn search(&self, criteria: &SearchCriteria) -> Result<RecordSet, StoreError> {
        let seq = self.begin_read();
        tracing::debug!(
            seq = seq.get(),
            max_price = ?criteria.max_price,
            location = ?criteria.location_filter(),
            "searching listings"
        );
        let result = self.inner.client.search(criteria).await;
        self.complete_read(seq, result)
    }

    /// Persist a new listing and append it to the collection.
    pub async fn add(&self, draft: ListingDraft) -> Result<ListingRecord, StoreError> {
        self.begin_write();
        let result = self.inner.client.create(&draft).await;

        let mut state = self.state();
        state.pending_writes = state.pending_writes.saturating_sub(1);
        match result {
            Ok(record) => {
                let mut records = state.records.as_ref().clone();
                records.push(record.clone());
                let records = Arc::new(records);
                state.replace(records.clone());
                self.inner.records_tx.send_replace(records);
                tracing::info!(id = %record.id, name = %record.name, "listing added");
                Ok(record)
            }
            Err(e) => {
                tracing::error!(error = %e, name = %draft.name, "Failed to add listing");
                Err(e)
            }
        }
    }

    /// Persist a partial update and swap the matching record in place.
    pub async fn update(&self, id: &str, patch: ListingPatch) -> Result<ListingRecord, StoreError> {
        self.begin_write();
        let result = self.inner.client.update(id, &patch).await;

        let mut state = self.state();
        state.pending_writes = state.pending_writes.saturating_sub(1);
        match result {
            Ok(record) => {
                if let Some(index) = state.records.iter().position(|r| r.id == record.id) {
                    let mut records = state.records.as_ref().clone();
                    records[index] = record.clone();
                    let records = Arc::new(records);
                    state.replace(records.clone());
                    self.inner.records_tx.send_replace(records);
                } else {
                    tracing::debug!(id = %record.id, "updated listing is not in the loaded collection");
                }
                tracing::info!(id = %record.id, "listing updated");
                Ok(record)
            }
            Err(e) => {
                tracing::error!(error = %e, id = %id, "Failed to update listing");
                Err(e)
            }
        }
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn begin_read(&self) -> RequestSeq {
        let mut state = self.state();
        state.issued += 1;
        state.error = None;
        RequestSeq(state.issued)
    }

    fn begin_write(&self) {
        self.state().pending_writes += 1;
    }

    fn complete_read(
        &self,
        seq: RequestSeq,
        result: Result<Vec<ListingRecord>, StoreError>,
    ) -> Result<RecordSet, StoreError> {
        let mut state = self.state();
        if seq.0 < state.applied {
            tracing::debug!(
                seq = seq.0,
                latest = state.applied,
                "discarding stale listings response"
            );
            return Err(StoreError::Superseded {
                seq: seq.0,
                latest: state.applied,
            });
        }
        state.applied = seq.0;

        match result {
            Ok(records) => {
                let records = Arc::new(records);
                state.replace(records.clone());
                state.error = None;
                self.inner.records_tx.send_replace(records.clone());
                tracing::debug!(seq = seq.0, count = records.len(), "listings applied");
                Ok(records)
            }
            Err(e) => {
                // Prior collection stays intact.
                tracing::warn!(seq = seq.0, error = %e, "listings request failed");
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }
}
