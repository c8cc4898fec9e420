//! Durable persistence for the store — single JSON blob, rewritten in full
//! after every mutation.
//!
//! Writes go through a temp file followed by an atomic rename; the previous
//! image is never truncated in place, so an interrupted write cannot leave
//! an unreadable store behind.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use docsphere_core::error::{DocSphereError, Result};
use docsphere_core::types::Document;

use crate::store::Store;

/// Owner and sole mutator of the [`Store`].
///
/// Readers take a cheap `Arc` snapshot and never block behind ingestion
/// I/O. Mutations serialize on a store-wide async lock covering the whole
/// clone → append → persist → publish sequence; a new snapshot is published
/// only after the durable write succeeds, so a failed persist rolls back
/// for free.
#[derive(Debug)]
pub struct PersistentStore {
    path: PathBuf,
    snapshot: RwLock<Arc<Store>>,
    write_lock: tokio::sync::Mutex<()>,
}

impl PersistentStore {
    /// Open the backing file, or initialize an empty store.
    ///
    /// A fresh install persists the empty store immediately so it leaves a
    /// valid file rather than a missing one. An existing file that cannot
    /// be deserialized, or whose contents violate a store invariant, is
    /// [`DocSphereError::StoreCorrupt`] — the process must not serve from it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let store = match std::fs::metadata(&path) {
            Ok(meta) if meta.len() > 0 => {
                let content = std::fs::read_to_string(&path)?;
                let store: Store = serde_json::from_str(&content).map_err(|e| {
                    DocSphereError::StoreCorrupt(format!("{}: {e}", path.display()))
                })?;
                store.check_invariants()?;
                tracing::info!(
                    "📚 Store loaded: {} document(s), {} page(s)",
                    store.document_count(),
                    store.page_count()
                );
                store
            }
            _ => {
                let store = Store::default();
                write_atomic(&path, &store)?;
                tracing::info!("📚 Initialized empty store at {}", path.display());
                store
            }
        };

        Ok(Self {
            path,
            snapshot: RwLock::new(Arc::new(store)),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// The current immutable snapshot.
    pub fn snapshot(&self) -> Arc<Store> {
        self.snapshot.read().unwrap().clone()
    }

    /// Append one document and persist the full collection.
    ///
    /// The write lock serializes concurrent appends — persist() rewrites
    /// the entire store, and two interleaved full rewrites would silently
    /// lose one of them. O(total pages) per call; acceptable because
    /// ingestion is rare relative to queries.
    pub async fn append(&self, doc: Document) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut next = Store::clone(&self.snapshot());
        next.append_document(doc)?;
        write_atomic(&self.path, &next)
            .map_err(|e| DocSphereError::Persistence(e.to_string()))?;

        // Durable write succeeded — publish the new snapshot.
        *self.snapshot.write().unwrap() = Arc::new(next);
        tracing::debug!("💾 Store persisted to {}", self.path.display());
        Ok(())
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Serialize the store to `<path>.tmp`, then rename over the live file.
fn write_atomic(path: &Path, store: &Store) -> Result<()> {
    let json = serde_json::to_vec(store)?;
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, &json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
