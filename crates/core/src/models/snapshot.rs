use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::summary::HoldingValuation;

/// An immutable historical record of the portfolio at a point in time.
///
/// Created by the snapshot operation, never mutated afterwards. The store
/// appends snapshots to history and deletes them individually by id; only a
/// full-strategy import replaces the list wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    /// Unique identifier. Assigned by the store at append if absent.
    #[serde(default)]
    pub id: Option<Uuid>,

    /// Calendar date the snapshot was captured (no time-of-day)
    pub date: NaiveDate,

    /// Aggregate net worth in the reporting currency at capture time
    pub total_net_worth: f64,

    /// Verbatim copy of the computed per-holding summary at capture time
    pub holdings_snapshot: Vec<HoldingValuation>,
}

impl PortfolioSnapshot {
    /// The holding records captured in this snapshot, for restore.
    pub fn recorded_holdings(&self) -> Vec<super::holding::Holding> {
        self.holdings_snapshot
            .iter()
            .map(|v| v.holding.clone())
            .collect()
    }
}
