//! The queuing surface handed to user transformations.
//!
//! A [`TransactionHandle`] collects entries, deletions, assets, and an
//! optional configuration replacement during one transaction, and exposes a
//! lazy, cached view of the pre-transaction snapshot. The handle is cheap to
//! clone; all clones share one state cell. When the transaction ends the
//! engine drains that cell, after which every operation fails with
//! [`StoreError::TransactionClosed`] - a clone that escaped the
//! transformation cannot silently write into nowhere.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::warn;

use chronolog_codec::{config as config_codec, event as event_codec, stream};
use chronolog_fs::{Capabilities, ExistingFile, FsError};
use chronolog_types::{Config, Event, EventId};

use crate::assets::Asset;
use crate::error::StoreError;
use crate::{CONFIG_FILE, DATA_FILE};

/// Everything a transformation queued, drained by the engine at commit time.
#[derive(Default)]
pub(crate) struct TxData {
    /// New entries in insertion order.
    pub(crate) entries: Vec<Event>,
    /// Identifiers queued for deletion, deduplicated.
    pub(crate) deleted: BTreeSet<EventId>,
    /// Queued assets in insertion order.
    pub(crate) assets: Vec<Asset>,
    /// Pending configuration replacement.
    pub(crate) config: Option<Config>,
    snapshot_entries: Option<Arc<[Event]>>,
    snapshot_config: Option<Option<Config>>,
}

/// Storage handle scoped to one transaction.
#[derive(Clone)]
pub struct TransactionHandle {
    inner: Arc<Inner>,
}

struct Inner {
    caps: Capabilities,
    data_file: Option<ExistingFile>,
    config_file: Option<ExistingFile>,
    state: Mutex<Option<TxData>>,
}

impl TransactionHandle {
    /// Bind the data and config file handles as they exist right now and
    /// start with empty queues.
    pub(crate) async fn open(caps: Capabilities, work_tree: &Path) -> Result<Self, FsError> {
        let data_file = caps.checker.check_file(&work_tree.join(DATA_FILE)).await?;
        let config_file = caps.checker.check_file(&work_tree.join(CONFIG_FILE)).await?;
        Ok(Self {
            inner: Arc::new(Inner {
                caps,
                data_file,
                config_file,
                state: Mutex::new(Some(TxData::default())),
            }),
        })
    }

    /// Queue an entry together with its asset files. No validation happens
    /// here; the entry is persisted verbatim at commit time.
    pub async fn add_entry(
        &self,
        event: Event,
        assets: Vec<ExistingFile>,
    ) -> Result<(), StoreError> {
        let mut guard = self.inner.state.lock().await;
        let data = guard.as_mut().ok_or(StoreError::TransactionClosed)?;
        for file in assets {
            data.assets.push(Asset {
                event: event.clone(),
                file,
            });
        }
        data.entries.push(event);
        Ok(())
    }

    /// Queue `id` for deletion, dropping any queued entry with the same
    /// identifier. Duplicate deletions coalesce.
    pub async fn delete_entry(&self, id: EventId) -> Result<(), StoreError> {
        let mut guard = self.inner.state.lock().await;
        let data = guard.as_mut().ok_or(StoreError::TransactionClosed)?;
        data.entries.retain(|entry| entry.id != id);
        data.deleted.insert(id);
        Ok(())
    }

    /// The identifiers currently queued for deletion, in sorted order.
    pub async fn deleted_ids(&self) -> Result<Vec<EventId>, StoreError> {
        let guard = self.inner.state.lock().await;
        let data = guard.as_ref().ok_or(StoreError::TransactionClosed)?;
        Ok(data.deleted.iter().cloned().collect())
    }

    /// Replace the pending configuration. A later call wins; this is a full
    /// replacement, never a merge.
    pub async fn set_config(&self, config: Config) -> Result<(), StoreError> {
        let mut guard = self.inner.state.lock().await;
        let data = guard.as_mut().ok_or(StoreError::TransactionClosed)?;
        data.config = Some(config);
        Ok(())
    }

    /// The pending configuration replacement, if any.
    pub async fn new_config(&self) -> Result<Option<Config>, StoreError> {
        let guard = self.inner.state.lock().await;
        let data = guard.as_ref().ok_or(StoreError::TransactionClosed)?;
        Ok(data.config.clone())
    }

    /// The pre-transaction event log.
    ///
    /// The file is read and decoded on first call only; later calls return
    /// the same shared sequence. Records that fail schema validation are
    /// skipped with a warning, an absent file yields the empty sequence, and
    /// an unreadable file yields the empty sequence with a warning.
    pub async fn existing_entries(&self) -> Result<Arc<[Event]>, StoreError> {
        let mut guard = self.inner.state.lock().await;
        let data = guard.as_mut().ok_or(StoreError::TransactionClosed)?;
        if let Some(cached) = &data.snapshot_entries {
            return Ok(cached.clone());
        }

        let mut events = Vec::new();
        if let Some(file) = &self.inner.data_file {
            match stream::read_objects(self.inner.caps.reader.as_ref(), file).await {
                Ok(values) => {
                    for value in &values {
                        match event_codec::try_deserialize(value) {
                            Ok(event) => events.push(event),
                            Err(error) => {
                                warn!(%error, "skipping invalid event record in snapshot");
                            }
                        }
                    }
                }
                Err(error) => {
                    warn!(%error, "failed to read event log snapshot, treating it as empty");
                }
            }
        }

        let cached: Arc<[Event]> = events.into();
        data.snapshot_entries = Some(cached.clone());
        Ok(cached)
    }

    /// The pre-transaction configuration, or `None` if `config.json` was
    /// absent or invalid (the latter with a warning). Cached after the first
    /// read.
    pub async fn existing_config(&self) -> Result<Option<Config>, StoreError> {
        let mut guard = self.inner.state.lock().await;
        let data = guard.as_mut().ok_or(StoreError::TransactionClosed)?;
        if let Some(cached) = &data.snapshot_config {
            return Ok(cached.clone());
        }

        let config = match &self.inner.config_file {
            None => None,
            Some(file) => read_config(&self.inner.caps, file).await,
        };

        data.snapshot_config = Some(config.clone());
        Ok(config)
    }

    /// End the transaction, returning everything that was queued. Every
    /// later use of any clone of this handle fails with
    /// [`StoreError::TransactionClosed`].
    pub(crate) async fn finish(&self) -> Result<TxData, StoreError> {
        self.inner
            .state
            .lock()
            .await
            .take()
            .ok_or(StoreError::TransactionClosed)
    }

    /// The data file handle bound at transaction start.
    pub(crate) fn data_file(&self) -> Option<&ExistingFile> {
        self.inner.data_file.as_ref()
    }
}

async fn read_config(caps: &Capabilities, file: &ExistingFile) -> Option<Config> {
    let text = match caps.reader.read_to_string(file).await {
        Ok(text) => text,
        Err(error) => {
            warn!(%error, "failed to read configuration snapshot");
            return None;
        }
    };
    let value: Value = match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(error) => {
            warn!(%error, "configuration snapshot is not valid JSON");
            return None;
        }
    };
    match config_codec::try_deserialize(&value) {
        Ok(config) => Some(config),
        Err(error) => {
            warn!(%error, "configuration snapshot failed validation");
            None
        }
    }
}
