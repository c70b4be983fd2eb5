use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::holding::Holding;

/// A mapping from category name (market, sector, or ticker) to the
/// accumulated monetary value in the reporting currency.
/// Absolute values only — consumers compute percentages themselves.
pub type Distribution = BTreeMap<String, f64>;

/// One valued holding inside a summary: the holding record itself plus
/// everything the valuation engine resolved for it. For stocks the engine
/// writes the resolved company name back into the embedded holding.
///
/// All monetary fields are in the reporting currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingValuation {
    #[serde(flatten)]
    pub holding: Holding,

    /// Current per-unit price in the holding's native currency
    /// (1.0 for cash, the option premium for options; 0.0 on fetch failure)
    pub current_price: f64,

    /// quantity × price × fx (× 100 for options)
    pub market_value: f64,

    /// cost_basis × quantity × fx — informational, for profit/loss display
    pub cost_value: f64,

    /// Potential exercise obligation of a short option position
    /// (|quantity| × strike × 100 × fx); 0.0 for everything else
    #[serde(default)]
    pub exposure_value: f64,

    /// Resolved sector: custom override, fetched sector, or "Unknown"
    pub sector: String,
}

/// The aggregated net-worth view of the whole portfolio.
///
/// Derived, never persisted (except verbatim inside snapshots) and never
/// cached — recomputed from live quotes on every request. Holdings appear
/// in the same order as the input holdings list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    /// Total net worth in the reporting currency
    pub total_net_worth: f64,

    /// The reporting currency all values are expressed in
    pub currency: String,

    /// Per-holding valuations, input order preserved
    pub holdings: Vec<HoldingValuation>,

    /// Value by market ("US", "HK", "CN", "Cash")
    pub market_distribution: Distribution,

    /// Value by resolved sector
    pub sector_distribution: Distribution,

    /// Value by ticker (exposure for short Puts, market value otherwise)
    pub ticker_distribution: Distribution,
}
