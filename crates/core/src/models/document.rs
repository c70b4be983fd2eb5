use serde::{Deserialize, Serialize};

use super::holding::Holding;
use super::snapshot::PortfolioSnapshot;

/// The persisted document: everything the store writes to disk.
///
/// Two top-level collections — the current holdings and the append-only
/// snapshot history. The whole document is rewritten on every mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioDocument {
    /// Ordered list of current holdings
    #[serde(default)]
    pub holdings: Vec<Holding>,

    /// Ordered, append-only snapshot history
    #[serde(default)]
    pub snapshots: Vec<PortfolioSnapshot>,
}
