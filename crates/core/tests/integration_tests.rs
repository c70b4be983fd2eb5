// ═══════════════════════════════════════════════════════════════════
// Integration Tests — PortfolioTracker facade end-to-end:
// CRUD → summary → snapshot → restore → import/export
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use std::path::Path;
use uuid::Uuid;

use portfolio_tracker_core::errors::CoreError;
use portfolio_tracker_core::models::holding::{Holding, Market, OptionKind};
use portfolio_tracker_core::providers::tencent::intrinsic_value;
use portfolio_tracker_core::providers::traits::QuoteProvider;
use portfolio_tracker_core::{ImportStrategy, PortfolioTracker};

// ═══════════════════════════════════════════════════════════════════
// Fixed-quote mock provider
// ═══════════════════════════════════════════════════════════════════

/// Answers every price with a fixed value and every FX pair with a fixed
/// rate — enough to make summaries deterministic.
struct FixedQuotes {
    price: f64,
    usd_hkd: f64,
}

impl FixedQuotes {
    fn new() -> Self {
        Self {
            price: 300.0,
            usd_hkd: 7.8,
        }
    }
}

#[async_trait]
impl QuoteProvider for FixedQuotes {
    fn name(&self) -> &str {
        "FixedQuotes"
    }

    async fn current_price(&self, _ticker: &str, _market: Market) -> Result<f64, CoreError> {
        Ok(self.price)
    }

    async fn fx_rate(&self, from: &str, to: &str) -> Result<f64, CoreError> {
        if from == to {
            Ok(1.0)
        } else if from == "USD" && to == "HKD" {
            Ok(self.usd_hkd)
        } else {
            Err(CoreError::FxUnavailable {
                pair: format!("{from}{to}"),
            })
        }
    }

    async fn sector(&self, _ticker: &str, _market: Market) -> String {
        "Unknown".to_string()
    }

    async fn company_name(&self, ticker: &str, _market: Market) -> String {
        ticker.to_string()
    }

    async fn option_price(
        &self,
        _ticker: &str,
        strike: f64,
        _expiry: NaiveDate,
        kind: OptionKind,
        _market: Market,
    ) -> Result<f64, CoreError> {
        Ok(intrinsic_value(kind, self.price, strike))
    }
}

fn open_tracker(path: &Path) -> PortfolioTracker {
    PortfolioTracker::open_with_provider(path, Box::new(FixedQuotes::new()), "HKD").unwrap()
}

// ═══════════════════════════════════════════════════════════════════
// Holdings lifecycle
// ═══════════════════════════════════════════════════════════════════

mod holdings_lifecycle {
    use super::*;

    #[test]
    fn add_update_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portfolio.json");
        let mut tracker = open_tracker(&path);

        let id = tracker
            .add_holding(Holding::stock("0700", Market::Hk, 100.0, 250.0))
            .unwrap();
        assert_eq!(tracker.holdings().len(), 1);
        assert_eq!(tracker.get_holding(id).unwrap().quantity, 100.0);

        tracker
            .update_holding(id, Holding::stock("0700", Market::Hk, 150.0, 255.0))
            .unwrap();
        assert_eq!(tracker.get_holding(id).unwrap().quantity, 150.0);

        tracker.delete_holding(id).unwrap();
        assert!(tracker.holdings().is_empty());
    }

    #[test]
    fn invalid_holding_rejected_on_add_and_update() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = open_tracker(&dir.path().join("p.json"));

        let invalid = Holding::stock("", Market::Us, 1.0, 1.0);
        assert!(matches!(
            tracker.add_holding(invalid.clone()),
            Err(CoreError::ValidationError(_))
        ));

        let id = tracker.add_holding(Holding::cash(Market::Hk, 1.0)).unwrap();
        assert!(tracker.update_holding(id, invalid).is_err());
    }

    #[test]
    fn holdings_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portfolio.json");

        let mut tracker = open_tracker(&path);
        tracker.add_holding(Holding::cash(Market::Us, 10_000.0)).unwrap();
        drop(tracker);

        let reopened = open_tracker(&path);
        assert_eq!(reopened.holdings().len(), 1);
        assert_eq!(reopened.holdings()[0].quantity, 10_000.0);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Summary through the facade
// ═══════════════════════════════════════════════════════════════════

mod summary {
    use super::*;

    #[tokio::test]
    async fn summary_reflects_current_holdings() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = open_tracker(&dir.path().join("p.json"));

        tracker.add_holding(Holding::stock("0700", Market::Hk, 100.0, 250.0)).unwrap();
        tracker.add_holding(Holding::cash(Market::Us, 10_000.0)).unwrap();

        let summary = tracker.portfolio_summary().await;
        // 100 × 300 × 1.0 + 10000 × 7.8
        assert_eq!(summary.total_net_worth, 30_000.0 + 78_000.0);
        assert_eq!(summary.market_distribution["HK"], 30_000.0);
        assert_eq!(summary.market_distribution["Cash"], 78_000.0);
        assert_eq!(summary.currency, "HKD");
    }

    #[tokio::test]
    async fn summary_does_not_mutate_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.json");
        let mut tracker = open_tracker(&path);
        tracker.add_holding(Holding::cash(Market::Hk, 500.0)).unwrap();

        let before = std::fs::read_to_string(&path).unwrap();
        let _ = tracker.portfolio_summary().await;
        let after = std::fs::read_to_string(&path).unwrap();
        assert_eq!(before, after);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Snapshots and restore
// ═══════════════════════════════════════════════════════════════════

mod snapshots {
    use super::*;

    #[tokio::test]
    async fn create_snapshot_captures_the_summary() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = open_tracker(&dir.path().join("p.json"));
        tracker.add_holding(Holding::stock("0700", Market::Hk, 100.0, 250.0)).unwrap();

        let snapshot = tracker.create_snapshot().await.unwrap();
        assert!(snapshot.id.is_some());
        assert_eq!(snapshot.total_net_worth, 30_000.0);
        assert_eq!(snapshot.holdings_snapshot.len(), 1);

        assert_eq!(tracker.history().len(), 1);
        assert_eq!(tracker.history()[0], snapshot);
    }

    #[tokio::test]
    async fn snapshots_accumulate_never_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = open_tracker(&dir.path().join("p.json"));
        tracker.add_holding(Holding::cash(Market::Hk, 100.0)).unwrap();

        let first = tracker.create_snapshot().await.unwrap();
        let second = tracker.create_snapshot().await.unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(tracker.history().len(), 2);
    }

    #[tokio::test]
    async fn restore_replaces_holdings_and_keeps_history() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = open_tracker(&dir.path().join("p.json"));
        let original = tracker
            .add_holding(Holding::stock("0700", Market::Hk, 100.0, 250.0))
            .unwrap();

        let snapshot = tracker.create_snapshot().await.unwrap();
        let snapshot_id = snapshot.id.unwrap();

        // Mutate: drop the original and add something else
        tracker.delete_holding(original).unwrap();
        tracker.add_holding(Holding::cash(Market::Us, 999.0)).unwrap();

        tracker.restore_snapshot(snapshot_id).unwrap();

        assert_eq!(tracker.holdings().len(), 1);
        assert_eq!(tracker.holdings()[0].ticker, "0700");
        // History untouched; no new snapshot created by restore
        assert_eq!(tracker.history().len(), 1);
    }

    #[tokio::test]
    async fn restore_unknown_id_fails_and_leaves_holdings_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = open_tracker(&dir.path().join("p.json"));
        tracker.add_holding(Holding::cash(Market::Hk, 500.0)).unwrap();
        let before = tracker.holdings().to_vec();

        let result = tracker.restore_snapshot(Uuid::new_v4());
        assert!(matches!(result, Err(CoreError::SnapshotNotFound(_))));
        assert_eq!(tracker.holdings(), before.as_slice());
    }

    #[tokio::test]
    async fn delete_snapshot_preserves_the_rest_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = open_tracker(&dir.path().join("p.json"));
        tracker.add_holding(Holding::cash(Market::Hk, 100.0)).unwrap();

        let a = tracker.create_snapshot().await.unwrap().id.unwrap();
        let b = tracker.create_snapshot().await.unwrap().id.unwrap();
        let c = tracker.create_snapshot().await.unwrap().id.unwrap();

        tracker.delete_snapshot(b).unwrap();

        let remaining: Vec<Option<Uuid>> = tracker.history().iter().map(|s| s.id).collect();
        assert_eq!(remaining, [Some(a), Some(c)]);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Export / Import
// ═══════════════════════════════════════════════════════════════════

mod import_export {
    use super::*;

    #[tokio::test]
    async fn export_then_full_import_reproduces_the_document() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = open_tracker(&dir.path().join("source.json"));
        source.add_holding(Holding::stock("0700", Market::Hk, 100.0, 250.0)).unwrap();
        source.add_holding(Holding::cash(Market::Us, 10_000.0)).unwrap();
        source.create_snapshot().await.unwrap();

        let exported = source.export_document();
        let payload: serde_json::Value =
            serde_json::from_str(&source.export_json().unwrap()).unwrap();

        let mut target = open_tracker(&dir.path().join("target.json"));
        let report = target.import_document(payload, ImportStrategy::Full).unwrap();

        assert_eq!(report.imported, 2);
        assert_eq!(report.skipped, 0);
        assert_eq!(target.export_document(), exported);
    }

    #[test]
    fn current_import_skips_invalid_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = open_tracker(&dir.path().join("p.json"));
        tracker.add_holding(Holding::cash(Market::Hk, 1.0)).unwrap();

        let payload = json!({
            "holdings": [
                {"ticker": "AAPL", "market": "US", "asset_type": "Stock",
                 "quantity": 10.0, "cost_basis": 150.0},
                {"ticker": "", "market": "US", "asset_type": "Stock",
                 "quantity": 1.0, "cost_basis": 1.0},
                {"ticker": "BAD", "market": "??", "asset_type": "Stock",
                 "quantity": 1.0, "cost_basis": 1.0}
            ]
        });
        let report = tracker.import_document(payload, ImportStrategy::Current).unwrap();

        assert_eq!(report.imported, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(tracker.holdings().len(), 1);
        assert_eq!(tracker.holdings()[0].ticker, "AAPL");
        assert!(tracker.holdings()[0].id.is_some());
    }

    #[tokio::test]
    async fn current_import_leaves_history_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = open_tracker(&dir.path().join("p.json"));
        tracker.add_holding(Holding::cash(Market::Hk, 1.0)).unwrap();
        tracker.create_snapshot().await.unwrap();

        let payload = json!({ "holdings": [] });
        tracker.import_document(payload, ImportStrategy::Current).unwrap();

        assert!(tracker.holdings().is_empty());
        assert_eq!(tracker.history().len(), 1);
    }

    #[test]
    fn current_import_without_holdings_key_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = open_tracker(&dir.path().join("p.json"));
        tracker.add_holding(Holding::cash(Market::Hk, 1.0)).unwrap();

        let report = tracker
            .import_document(json!({"something": "else"}), ImportStrategy::Current)
            .unwrap();
        assert_eq!(report, Default::default());
        assert_eq!(tracker.holdings().len(), 1);
    }

    #[test]
    fn full_import_rejects_invalid_payloads_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = open_tracker(&dir.path().join("p.json"));
        tracker.add_holding(Holding::cash(Market::Hk, 500.0)).unwrap();
        let before = tracker.export_document();

        // One invalid holding rejects the whole import
        let payload = json!({
            "holdings": [
                {"ticker": "AAPL", "market": "US", "asset_type": "Stock",
                 "quantity": 10.0, "cost_basis": 150.0},
                {"ticker": "", "market": "US", "asset_type": "Stock",
                 "quantity": 1.0, "cost_basis": 1.0}
            ],
            "snapshots": []
        });
        let result = tracker.import_document(payload, ImportStrategy::Full);
        assert!(matches!(result, Err(CoreError::ValidationError(_))));
        assert_eq!(tracker.export_document(), before);

        // So does a structurally malformed document
        let result = tracker.import_document(json!({"holdings": 42}), ImportStrategy::Full);
        assert!(matches!(result, Err(CoreError::ValidationError(_))));
        assert_eq!(tracker.export_document(), before);
    }

    #[tokio::test]
    async fn full_import_replaces_history_too() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = open_tracker(&dir.path().join("p.json"));
        tracker.add_holding(Holding::cash(Market::Hk, 1.0)).unwrap();
        tracker.create_snapshot().await.unwrap();

        let payload = json!({ "holdings": [], "snapshots": [] });
        tracker.import_document(payload, ImportStrategy::Full).unwrap();

        assert!(tracker.holdings().is_empty());
        assert!(tracker.history().is_empty());
    }
}
