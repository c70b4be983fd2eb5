use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::document::PortfolioDocument;
use crate::models::holding::Holding;
use crate::models::snapshot::PortfolioSnapshot;

/// Flat-file JSON store for the portfolio document.
///
/// The whole document is rewritten on every mutation — no transactions, no
/// locking, last writer wins. Writes are atomic (serialize to a sibling temp
/// file, then rename over the target) so a crash mid-write can never leave a
/// truncated document behind. Single-writer: the owner holds `&mut self` for
/// every mutation.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    document: PortfolioDocument,
}

impl JsonStore {
    /// Open the store at `path`. Creates an empty document if the file does
    /// not exist. Backfills missing holding/snapshot ids from older files,
    /// persisting immediately if anything changed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            let store = Self {
                path,
                document: PortfolioDocument::default(),
            };
            store.save()?;
            return Ok(store);
        }

        let raw = std::fs::read_to_string(&path)?;
        let mut document: PortfolioDocument = serde_json::from_str(&raw)?;

        let mut changed = false;
        for holding in &mut document.holdings {
            if holding.id.is_none() {
                holding.id = Some(Uuid::new_v4());
                changed = true;
            }
        }
        for snapshot in &mut document.snapshots {
            if snapshot.id.is_none() {
                snapshot.id = Some(Uuid::new_v4());
                changed = true;
            }
        }

        let store = Self { path, document };
        if changed {
            store.save()?;
        }
        Ok(store)
    }

    /// Write the document to disk atomically: temp file, then rename.
    fn save(&self) -> Result<(), CoreError> {
        let json = serde_json::to_string_pretty(&self.document)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize document: {e}")))?;

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// The path this store persists to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The full persisted document (holdings + snapshot history).
    pub fn document(&self) -> &PortfolioDocument {
        &self.document
    }

    // ── Holdings ────────────────────────────────────────────────────

    pub fn holdings(&self) -> &[Holding] {
        &self.document.holdings
    }

    /// Append a holding, assigning an id if it doesn't carry one.
    /// Returns the holding's id.
    pub fn add_holding(&mut self, mut holding: Holding) -> Result<Uuid, CoreError> {
        let id = holding.id.unwrap_or_else(Uuid::new_v4);
        holding.id = Some(id);
        self.document.holdings.push(holding);
        self.save()?;
        Ok(id)
    }

    /// Replace the holding with the given id. The stored record keeps `id`
    /// regardless of what the incoming record carries.
    pub fn update_holding(&mut self, id: Uuid, mut holding: Holding) -> Result<(), CoreError> {
        holding.id = Some(id);
        let slot = self
            .document
            .holdings
            .iter_mut()
            .find(|h| h.id == Some(id))
            .ok_or_else(|| CoreError::HoldingNotFound(id.to_string()))?;
        *slot = holding;
        self.save()
    }

    pub fn delete_holding(&mut self, id: Uuid) -> Result<(), CoreError> {
        let before = self.document.holdings.len();
        self.document.holdings.retain(|h| h.id != Some(id));
        if self.document.holdings.len() == before {
            return Err(CoreError::HoldingNotFound(id.to_string()));
        }
        self.save()
    }

    /// Replace the entire current holdings list, leaving history untouched.
    /// Incoming records without ids get fresh ones.
    pub fn replace_holdings(&mut self, holdings: Vec<Holding>) -> Result<(), CoreError> {
        self.document.holdings = holdings;
        for holding in &mut self.document.holdings {
            if holding.id.is_none() {
                holding.id = Some(Uuid::new_v4());
            }
        }
        self.save()
    }

    // ── Snapshots ───────────────────────────────────────────────────

    pub fn snapshots(&self) -> &[PortfolioSnapshot] {
        &self.document.snapshots
    }

    pub fn find_snapshot(&self, id: Uuid) -> Option<&PortfolioSnapshot> {
        self.document.snapshots.iter().find(|s| s.id == Some(id))
    }

    /// Append a snapshot to history. Never overwrites an existing snapshot.
    /// Returns the snapshot's id.
    pub fn append_snapshot(&mut self, mut snapshot: PortfolioSnapshot) -> Result<Uuid, CoreError> {
        let id = snapshot.id.unwrap_or_else(Uuid::new_v4);
        snapshot.id = Some(id);
        self.document.snapshots.push(snapshot);
        self.save()?;
        Ok(id)
    }

    /// Remove exactly one snapshot by id, preserving the order of the rest.
    pub fn delete_snapshot(&mut self, id: Uuid) -> Result<(), CoreError> {
        let before = self.document.snapshots.len();
        self.document.snapshots.retain(|s| s.id != Some(id));
        if self.document.snapshots.len() == before {
            return Err(CoreError::SnapshotNotFound(id.to_string()));
        }
        self.save()
    }

    // ── Whole document ──────────────────────────────────────────────

    /// Replace the entire persisted document (holdings and history).
    /// Records without ids get fresh ones before the write.
    pub fn replace_document(&mut self, document: PortfolioDocument) -> Result<(), CoreError> {
        self.document = document;
        for holding in &mut self.document.holdings {
            if holding.id.is_none() {
                holding.id = Some(Uuid::new_v4());
            }
        }
        for snapshot in &mut self.document.snapshots {
            if snapshot.id.is_none() {
                snapshot.id = Some(Uuid::new_v4());
            }
        }
        self.save()
    }
}
