pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use std::path::Path;

use chrono::Utc;
use log::warn;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use errors::CoreError;
use models::{
    document::PortfolioDocument,
    holding::Holding,
    snapshot::PortfolioSnapshot,
    summary::PortfolioSummary,
};
use providers::tencent::TencentQuoteProvider;
use providers::traits::QuoteProvider;
use services::valuation_service::ValuationService;
use storage::store::JsonStore;

/// The single currency all summaries and totals are expressed in
/// unless a different one is passed at construction.
pub const DEFAULT_REPORTING_CURRENCY: &str = "HKD";

/// How an imported payload is applied to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStrategy {
    /// Replace only the current holdings list. Each incoming record is
    /// validated individually; invalid records are skipped, not fatal.
    /// Snapshot history is left untouched.
    Current,
    /// Replace the entire persisted document (holdings and history).
    /// The whole payload must deserialize and every holding must validate,
    /// or nothing is replaced.
    Full,
}

/// Outcome of an import: how many holding records were applied and how many
/// invalid ones were skipped (non-zero only under the "current" strategy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

/// Main entry point for the portfolio-tracker core library.
///
/// Owns the persisted document (through the store), the quote provider, and
/// the valuation engine, and exposes every logical operation of the backend:
/// holdings CRUD, summary computation, snapshot history, restore, and
/// import/export. Single-writer by construction — all mutations take
/// `&mut self`.
#[must_use]
pub struct PortfolioTracker {
    store: JsonStore,
    quotes: Box<dyn QuoteProvider>,
    valuation: ValuationService,
    reporting_currency: String,
}

impl std::fmt::Debug for PortfolioTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioTracker")
            .field("path", &self.store.path())
            .field("holdings", &self.store.holdings().len())
            .field("snapshots", &self.store.snapshots().len())
            .field("provider", &self.quotes.name())
            .field("reporting_currency", &self.reporting_currency)
            .finish()
    }
}

impl PortfolioTracker {
    /// Open (or create) the portfolio document at `path`, quoting from the
    /// Tencent endpoint, reporting in HKD.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        Self::open_with_provider(
            path,
            Box::new(TencentQuoteProvider::new()),
            DEFAULT_REPORTING_CURRENCY,
        )
    }

    /// Open (or create) the portfolio document at `path` with an explicit
    /// quote provider and reporting currency.
    pub fn open_with_provider(
        path: impl AsRef<Path>,
        quotes: Box<dyn QuoteProvider>,
        reporting_currency: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let store = JsonStore::open(path)?;
        Ok(Self {
            store,
            quotes,
            valuation: ValuationService::new(),
            reporting_currency: reporting_currency.into(),
        })
    }

    /// The currency all summaries and totals are expressed in.
    #[must_use]
    pub fn reporting_currency(&self) -> &str {
        &self.reporting_currency
    }

    // ── Holdings ────────────────────────────────────────────────────

    /// Current holdings, in stored order.
    #[must_use]
    pub fn holdings(&self) -> &[Holding] {
        self.store.holdings()
    }

    /// Get a single holding by its id.
    #[must_use]
    pub fn get_holding(&self, id: Uuid) -> Option<&Holding> {
        self.store.holdings().iter().find(|h| h.id == Some(id))
    }

    /// Validate and add a holding. Returns the assigned id.
    pub fn add_holding(&mut self, holding: Holding) -> Result<Uuid, CoreError> {
        holding.validate()?;
        self.store.add_holding(holding)
    }

    /// Validate and replace the holding with the given id.
    /// Fails with `HoldingNotFound` if the id is absent.
    pub fn update_holding(&mut self, id: Uuid, holding: Holding) -> Result<(), CoreError> {
        holding.validate()?;
        self.store.update_holding(id, holding)
    }

    /// Delete a holding by id. Fails with `HoldingNotFound` if absent.
    pub fn delete_holding(&mut self, id: Uuid) -> Result<(), CoreError> {
        self.store.delete_holding(id)
    }

    // ── Summary ─────────────────────────────────────────────────────

    /// Compute the aggregated net-worth summary from live quotes.
    ///
    /// Read-only and never cached — a pure function of current holdings and
    /// whatever the quote provider answers. Individual quote failures degrade
    /// that holding's contribution rather than failing the request.
    pub async fn portfolio_summary(&self) -> PortfolioSummary {
        self.valuation
            .compute_summary(
                self.store.holdings(),
                self.quotes.as_ref(),
                &self.reporting_currency,
            )
            .await
    }

    // ── Snapshots ───────────────────────────────────────────────────

    /// Capture a fresh summary into history as an immutable snapshot,
    /// dated today. Returns the stored snapshot.
    pub async fn create_snapshot(&mut self) -> Result<PortfolioSnapshot, CoreError> {
        let summary = self.portfolio_summary().await;
        let snapshot = PortfolioSnapshot {
            id: Some(Uuid::new_v4()),
            date: Utc::now().date_naive(),
            total_net_worth: summary.total_net_worth,
            holdings_snapshot: summary.holdings,
        };
        self.store.append_snapshot(snapshot.clone())?;
        Ok(snapshot)
    }

    /// Snapshot history, oldest first.
    #[must_use]
    pub fn history(&self) -> &[PortfolioSnapshot] {
        self.store.snapshots()
    }

    /// Delete exactly one snapshot by id, leaving all others (and their
    /// order) unchanged. Fails with `SnapshotNotFound` if absent.
    pub fn delete_snapshot(&mut self, id: Uuid) -> Result<(), CoreError> {
        self.store.delete_snapshot(id)
    }

    /// Replace the current holdings with the ones recorded in a snapshot.
    /// History is untouched and no new snapshot is created.
    /// Fails with `SnapshotNotFound` (leaving holdings unchanged) if absent.
    pub fn restore_snapshot(&mut self, id: Uuid) -> Result<(), CoreError> {
        let holdings = self
            .store
            .find_snapshot(id)
            .map(PortfolioSnapshot::recorded_holdings)
            .ok_or_else(|| CoreError::SnapshotNotFound(id.to_string()))?;
        self.store.replace_holdings(holdings)
    }

    // ── Export / Import ─────────────────────────────────────────────

    /// The entire persisted document (holdings + history).
    #[must_use]
    pub fn export_document(&self) -> PortfolioDocument {
        self.store.document().clone()
    }

    /// The entire persisted document as a JSON string.
    pub fn export_json(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(self.store.document())
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize document: {e}")))
    }

    /// Import a structured payload under the given strategy. See
    /// [`ImportStrategy`] for the semantics of each.
    pub fn import_document(
        &mut self,
        payload: serde_json::Value,
        strategy: ImportStrategy,
    ) -> Result<ImportReport, CoreError> {
        match strategy {
            ImportStrategy::Current => self.import_current(payload),
            ImportStrategy::Full => self.import_full(payload),
        }
    }

    /// "current": validate each record, skip invalid ones, replace only the
    /// current holdings list.
    fn import_current(&mut self, payload: serde_json::Value) -> Result<ImportReport, CoreError> {
        let Some(raw_holdings) = payload.get("holdings") else {
            // Nothing to import — the document is left as-is
            return Ok(ImportReport::default());
        };
        let records = raw_holdings.as_array().ok_or_else(|| {
            CoreError::ValidationError("'holdings' must be an array of holding records".into())
        })?;

        let mut holdings = Vec::with_capacity(records.len());
        let mut skipped = 0;
        for record in records {
            match serde_json::from_value::<Holding>(record.clone())
                .map_err(|e| CoreError::ValidationError(e.to_string()))
                .and_then(|h| h.validate().map(|()| h))
            {
                Ok(holding) => holdings.push(holding),
                Err(e) => {
                    warn!("Skipping invalid holding record: {e}");
                    skipped += 1;
                }
            }
        }

        let imported = holdings.len();
        self.store.replace_holdings(holdings)?;
        Ok(ImportReport { imported, skipped })
    }

    /// "full": the payload must be a complete, valid document. Any invalid
    /// holding rejects the whole import, leaving the store untouched.
    fn import_full(&mut self, payload: serde_json::Value) -> Result<ImportReport, CoreError> {
        let document: PortfolioDocument = serde_json::from_value(payload)
            .map_err(|e| CoreError::ValidationError(format!("Malformed document payload: {e}")))?;

        for holding in &document.holdings {
            holding.validate()?;
        }

        let imported = document.holdings.len();
        self.store.replace_document(document)?;
        Ok(ImportReport { imported, skipped: 0 })
    }
}
