//! Board snapshot persistence.
//!
//! DESIGN
//! ======
//! Only the view settings survive a reload: the transform and the filters.
//! A `SnapshotSink` is attached to the store as an ordinary listener and
//! receives a fresh `Snapshot` whenever one of those changes. Sets are
//! written as sorted arrays so the output is stable.
//!
//! ERROR HANDLING
//! ==============
//! A snapshot that cannot be decoded is discarded with a warning and the
//! board starts from `BoardState::default()`. Sink write failures are
//! logged and do not reach the store.

#[cfg(test)]
#[path = "persist_test.rs"]
mod persist_test;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::camera::Transform;
use crate::doc::CardKind;
use crate::engine::Engine;
use crate::state::{BoardState, Filters, ListenerId};

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("invalid snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot transform is not finite")]
    NonFinite,
    #[error("failed to write snapshot to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Serialized form of [`Filters`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotFilters {
    pub kinds: Vec<CardKind>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub only_connected: bool,
}

impl From<&Filters> for SnapshotFilters {
    fn from(filters: &Filters) -> Self {
        let mut kinds: Vec<_> = filters.kinds.iter().copied().collect();
        kinds.sort_unstable();
        let mut tags: Vec<_> = filters.tags.iter().cloned().collect();
        tags.sort_unstable();
        Self { kinds, tags, only_connected: filters.only_connected }
    }
}

impl From<SnapshotFilters> for Filters {
    fn from(snapshot: SnapshotFilters) -> Self {
        Self {
            kinds: snapshot.kinds.into_iter().collect(),
            tags: snapshot.tags.into_iter().collect(),
            only_connected: snapshot.only_connected,
        }
    }
}

/// The persisted part of the board state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub transform: Transform,
    /// Older snapshots carry only the transform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<SnapshotFilters>,
}

impl Snapshot {
    #[must_use]
    pub fn capture(state: &BoardState) -> Self {
        Self { transform: state.transform, filters: Some(SnapshotFilters::from(&state.filters)) }
    }

    /// Encode as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn encode(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// A default board state carrying this snapshot's view settings.
    #[must_use]
    pub fn into_state(self) -> BoardState {
        BoardState {
            transform: self.transform.clamped(),
            filters: self.filters.map(Filters::from).unwrap_or_default(),
            ..BoardState::default()
        }
    }
}

/// Decode a snapshot, rejecting non-finite transforms.
///
/// # Errors
///
/// Returns an error if `raw` is not a valid snapshot.
pub fn decode_snapshot(raw: &str) -> Result<Snapshot, SnapshotError> {
    let snapshot: Snapshot = serde_json::from_str(raw)?;
    if !snapshot.transform.is_finite() {
        return Err(SnapshotError::NonFinite);
    }
    Ok(snapshot)
}

/// Initial board state from a persisted snapshot, if there is a usable one.
#[must_use]
pub fn restore_state(raw: Option<&str>) -> BoardState {
    let Some(raw) = raw else {
        return BoardState::default();
    };
    match decode_snapshot(raw) {
        Ok(snapshot) => snapshot.into_state(),
        Err(e) => {
            warn!(error = %e, "discarding persisted board snapshot");
            BoardState::default()
        }
    }
}

// =============================================================================
// SINKS
// =============================================================================

/// Destination for snapshots.
pub trait SnapshotSink {
    /// Store `snapshot`, replacing the previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot could not be stored.
    fn write(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError>;
}

/// Writes each snapshot as JSON to a file.
#[derive(Debug, Clone)]
pub struct FileSnapshotSink {
    path: PathBuf,
}

impl FileSnapshotSink {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the file for [`restore_state`]. A missing or unreadable file yields `None`.
    #[must_use]
    pub fn load(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Some(raw),
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %self.path.display(), error = %e, "cannot read board snapshot");
                }
                None
            }
        }
    }
}

impl SnapshotSink for FileSnapshotSink {
    fn write(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        let json = snapshot.encode()?;
        std::fs::write(&self.path, json).map_err(|source| SnapshotError::Io { path: self.path.clone(), source })
    }
}

/// Subscribe `sink` to the engine's store.
///
/// The sink sees a snapshot each time the transform or filters change.
pub fn attach_sink(engine: &mut Engine, mut sink: impl SnapshotSink + 'static) -> ListenerId {
    let mut last = Snapshot::capture(engine.state());
    engine.subscribe(move |state| {
        let snapshot = Snapshot::capture(state);
        if snapshot == last {
            return;
        }
        if let Err(e) = sink.write(&snapshot) {
            warn!(error = %e, "failed to persist board snapshot");
        }
        last = snapshot;
    })
}
