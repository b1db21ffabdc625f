//! The transaction engine: persistence protocol and compensation.

use std::collections::BTreeSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, warn};

use chronolog_codec::{config as config_codec, event as event_codec, stream, to_tab_json};
use chronolog_fs::{Capabilities, ExistingFile, FileDeleter, FsError};
use chronolog_types::{Event, EventId};
use chronolog_vcs::{Session, VcsError};

use crate::assets::{asset_target, Asset};
use crate::env::Environment;
use crate::error::StoreError;
use crate::transaction::{TransactionHandle, TxData};
use crate::{COMMIT_MESSAGE, CONFIG_FILE, DATA_FILE, WORK_DIR_NAME};

/// The event-log store.
///
/// Owns nothing but its wiring: the [`Environment`] saying where the remote
/// repository, asset tree, and local state live, and the filesystem
/// [`Capabilities`] every byte moves through. One store instance serves any
/// number of sequential transactions; the working directory is single-writer
/// and the store does not queue concurrent attempts.
pub struct EventLogStore {
    env: Arc<dyn Environment>,
    caps: Capabilities,
}

impl EventLogStore {
    /// Wire a store from its environment and filesystem capabilities.
    pub fn new(env: Arc<dyn Environment>, caps: Capabilities) -> Self {
        Self { env, caps }
    }

    /// Path of the working-copy mirror this store operates on.
    pub fn working_directory(&self) -> PathBuf {
        self.env.state_directory().join(WORK_DIR_NAME)
    }

    /// Fast-forward the local mirror from the remote without opening a
    /// transaction. For read-only callers.
    pub async fn synchronize(&self) -> Result<(), VcsError> {
        chronolog_vcs::synchronize(&self.env.event_log_repository(), &self.working_directory())
            .await
    }

    /// Run `transform` inside a transaction and persist whatever it queued.
    ///
    /// After the transformation returns successfully the engine appends new
    /// entries (rewriting the log instead when deletions were queued),
    /// replaces the configuration if one was set, commits and pushes the
    /// working copy when anything changed on disk, and finally copies queued
    /// assets into place. The transformation's result is returned.
    ///
    /// On any failure after the transformation - including a failed push -
    /// every queued asset's computed target is deleted on a best-effort
    /// basis before the original error is re-raised. A failing
    /// transformation propagates its own error unchanged and leaves the log
    /// untouched.
    pub async fn transaction<F, Fut, T>(&self, transform: F) -> Result<T>
    where
        F: FnOnce(TransactionHandle) -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
        T: Send,
    {
        let remote = self.env.event_log_repository();
        let working = self.working_directory();
        let assets_root = self.env.event_log_assets_directory();
        let caps = self.caps.clone();

        // Asset targets planned by the transaction body, exported for the
        // compensation path below. `None` means the body never ran.
        let planned: Arc<Mutex<Option<Vec<PathBuf>>>> = Arc::new(Mutex::new(None));
        let planned_in = planned.clone();

        let result = chronolog_vcs::transaction(&remote, &working, move |session| async move {
            let handle = TransactionHandle::open(caps.clone(), session.work_tree()).await?;
            let outcome = transform(handle.clone()).await;
            let state = handle.finish().await?;

            let targets: Vec<PathBuf> = state
                .assets
                .iter()
                .map(|asset| asset_target(&assets_root, &asset.event, &asset.file))
                .collect();
            *planned_in.lock().unwrap() = Some(targets.clone());

            let value = outcome?;
            persist(&caps, &session, &handle, &state).await?;
            copy_assets(&caps, &state.assets, &targets).await?;
            Ok(value)
        })
        .await;

        match result {
            Ok(value) => Ok(value),
            Err(error) => {
                let targets = planned.lock().unwrap().take().unwrap_or_default();
                if !targets.is_empty() {
                    remove_assets(self.caps.deleter.as_ref(), &targets).await;
                }
                Err(error)
            }
        }
    }
}

/// Steps 2-5 of the commit protocol: mutate the working tree and commit if
/// anything changed.
async fn persist(
    caps: &Capabilities,
    session: &Session,
    handle: &TransactionHandle,
    state: &TxData,
) -> Result<()> {
    let work_tree = session.work_tree();
    let has_entries = !state.entries.is_empty();
    let has_deletions = !state.deleted.is_empty();
    let has_config = state.config.is_some();

    if has_deletions {
        // Deletions apply to the on-disk state first; new entries are
        // appended after the survivors in the same rewrite.
        rewrite_log(caps, work_tree, handle.data_file(), &state.deleted, &state.entries).await?;
    } else if has_entries {
        append_entries(caps, work_tree, handle.data_file(), &state.entries).await?;
    }

    if let Some(config) = &state.config {
        let text = format!("{}\n", to_tab_json(&config_codec::serialize(config))?);
        caps.writer.write(&work_tree.join(CONFIG_FILE), &text).await?;
        debug!("replaced configuration document");
    }

    if has_entries || has_deletions || has_config {
        session.commit(COMMIT_MESSAGE).await?;
    }
    Ok(())
}

async fn rewrite_log(
    caps: &Capabilities,
    work_tree: &Path,
    data_file: Option<&ExistingFile>,
    deleted: &BTreeSet<EventId>,
    new_entries: &[Event],
) -> Result<()> {
    let survivors: Vec<Value> = match data_file {
        None => Vec::new(),
        Some(file) => {
            let deleted_ids: BTreeSet<&str> = deleted.iter().map(EventId::identifier).collect();
            stream::read_objects(caps.reader.as_ref(), file)
                .await?
                .into_iter()
                .filter(|value| {
                    // Records without a readable id cannot match a deletion
                    // and survive the rewrite.
                    value
                        .get("id")
                        .and_then(Value::as_str)
                        .map(|id| !deleted_ids.contains(id))
                        .unwrap_or(true)
                })
                .collect()
        }
    };

    if data_file.is_none() && new_entries.is_empty() {
        // Nothing on disk to delete from and nothing to add.
        return Ok(());
    }

    let mut text = String::new();
    for value in &survivors {
        text.push_str(&to_tab_json(value)?);
        text.push('\n');
    }
    for event in new_entries {
        text.push_str(&to_tab_json(&event_codec::serialize(event))?);
        text.push('\n');
    }
    caps.writer.write(&work_tree.join(DATA_FILE), &text).await?;
    debug!(
        survivors = survivors.len(),
        appended = new_entries.len(),
        "rewrote event log"
    );
    Ok(())
}

async fn append_entries(
    caps: &Capabilities,
    work_tree: &Path,
    data_file: Option<&ExistingFile>,
    entries: &[Event],
) -> Result<()> {
    let file = match data_file {
        Some(file) => file.clone(),
        None => caps.creator.create_file(&work_tree.join(DATA_FILE)).await?,
    };

    let mut text = String::new();
    for event in entries {
        text.push_str(&to_tab_json(&event_codec::serialize(event))?);
        text.push('\n');
    }
    caps.appender.append(&file, &text).await?;
    debug!(appended = entries.len(), "appended event records");
    Ok(())
}

/// Step 6: copy queued assets into place, creating parents on demand.
async fn copy_assets(caps: &Capabilities, assets: &[Asset], targets: &[PathBuf]) -> Result<()> {
    for (asset, target) in assets.iter().zip(targets) {
        if let Some(parent) = target.parent() {
            caps.creator
                .create_dir_all(parent)
                .await
                .map_err(|e| copy_failed(asset, target, e))?;
        }
        caps.copier
            .copy(&asset.file, target)
            .await
            .map_err(|e| copy_failed(asset, target, e))?;
        debug!(
            source = %asset.file.path().display(),
            dest = %target.display(),
            "copied asset"
        );
    }
    Ok(())
}

fn copy_failed(asset: &Asset, target: &Path, source: FsError) -> StoreError {
    StoreError::AssetCopyFailed {
        source_path: asset.file.path().to_path_buf(),
        target: target.to_path_buf(),
        source,
    }
}

/// Compensation: delete every planned asset target. Per-delete failures are
/// logged and swallowed so they never mask the error that triggered this.
async fn remove_assets(deleter: &dyn FileDeleter, targets: &[PathBuf]) {
    for target in targets {
        match deleter.delete(target).await {
            Ok(()) => debug!(path = %target.display(), "removed asset during rollback"),
            Err(error) => {
                warn!(path = %target.display(), %error, "failed to remove asset during rollback");
            }
        }
    }
}
