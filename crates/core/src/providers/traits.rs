use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::holding::{Market, OptionKind};

/// Trait abstraction over the external quote source.
///
/// The valuation engine only ever talks to this trait, so the parsing logic
/// for any one data source can be swapped without touching the engine. Every
/// call is fallible by contract; `Err` never crosses the engine boundary —
/// the engine substitutes documented fallbacks (price→0.0, fx→1.0) and logs
/// a diagnostic instead.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Current price of a ticker on a market, in the market's native currency.
    async fn current_price(&self, ticker: &str, market: Market) -> Result<f64, CoreError>;

    /// Exchange rate from one currency to another. Identity pairs return 1.0.
    async fn fx_rate(&self, from_currency: &str, to_currency: &str) -> Result<f64, CoreError>;

    /// Sector classification of a ticker. Defaults to "Unknown" on any failure
    /// — this call never errors.
    async fn sector(&self, ticker: &str, market: Market) -> String;

    /// Company name for a ticker. Defaults to the ticker itself on any failure
    /// — this call never errors.
    async fn company_name(&self, ticker: &str, market: Market) -> String;

    /// Current premium of an option contract, per underlying unit.
    /// An intrinsic-value approximation from the underlying price is acceptable.
    async fn option_price(
        &self,
        ticker: &str,
        strike: f64,
        expiry: NaiveDate,
        kind: OptionKind,
        market: Market,
    ) -> Result<f64, CoreError>;
}
