use log::warn;

use crate::models::holding::{AssetType, Holding, Market, OptionKind};
use crate::models::summary::{Distribution, HoldingValuation, PortfolioSummary};
use crate::providers::traits::QuoteProvider;

/// Exchange-traded options settle 100 underlying units per contract.
pub const OPTION_CONTRACT_MULTIPLIER: f64 = 100.0;

/// Market-distribution bucket for cash balances.
const CASH_CATEGORY: &str = "Cash";

/// The valuation engine: turns the current holdings list into an aggregated
/// net-worth summary using live quotes.
///
/// Pure with respect to the store — it only reads holdings and produces a
/// summary. A failed quote fetch degrades that one holding's contribution
/// (price→0.0, fx→1.0) with a diagnostic; it never fails the whole summary.
pub struct ValuationService;

impl ValuationService {
    pub fn new() -> Self {
        Self
    }

    /// Compute the portfolio summary for the given holdings, in input order.
    pub async fn compute_summary(
        &self,
        holdings: &[Holding],
        quotes: &dyn QuoteProvider,
        reporting_currency: &str,
    ) -> PortfolioSummary {
        let mut total_net_worth = 0.0;
        let mut valuations = Vec::with_capacity(holdings.len());

        // The market distribution always shows all four buckets, even at zero.
        let mut market_dist: Distribution = [Market::Us, Market::Hk, Market::Cn]
            .iter()
            .map(|m| (m.as_str().to_string(), 0.0))
            .chain(std::iter::once((CASH_CATEGORY.to_string(), 0.0)))
            .collect();
        let mut sector_dist = Distribution::new();
        let mut ticker_dist = Distribution::new();

        for holding in holdings {
            let valuation = match holding.asset_type {
                AssetType::Cash => {
                    self.value_cash(holding, quotes, reporting_currency, &mut market_dist)
                        .await
                }
                AssetType::Stock => {
                    self.value_stock(
                        holding,
                        quotes,
                        reporting_currency,
                        &mut market_dist,
                        &mut sector_dist,
                        &mut ticker_dist,
                    )
                    .await
                }
                AssetType::Option => {
                    self.value_option(
                        holding,
                        quotes,
                        reporting_currency,
                        &mut market_dist,
                        &mut sector_dist,
                        &mut ticker_dist,
                    )
                    .await
                }
            };
            total_net_worth += valuation.market_value;
            valuations.push(valuation);
        }

        PortfolioSummary {
            total_net_worth,
            currency: reporting_currency.to_string(),
            holdings: valuations,
            market_distribution: market_dist,
            sector_distribution: sector_dist,
            ticker_distribution: ticker_dist,
        }
    }

    /// Cash: price fixed at 1.0 in the market's own currency. Contributes to
    /// net worth and to the "Cash" market bucket only.
    async fn value_cash(
        &self,
        holding: &Holding,
        quotes: &dyn QuoteProvider,
        reporting_currency: &str,
        market_dist: &mut Distribution,
    ) -> HoldingValuation {
        let currency = holding.market.currency(reporting_currency);
        let fx = self.fx_or_unity(quotes, &currency, reporting_currency).await;

        let market_value = holding.quantity * fx;
        let cost_value = holding.cost_basis * holding.quantity * fx;

        *market_dist.entry(CASH_CATEGORY.to_string()).or_insert(0.0) += market_value;

        HoldingValuation {
            holding: holding.clone(),
            current_price: 1.0,
            market_value,
            cost_value,
            exposure_value: 0.0,
            sector: CASH_CATEGORY.to_string(),
        }
    }

    /// Stock: market value = quantity × price × fx, accumulated into all
    /// three distributions.
    async fn value_stock(
        &self,
        holding: &Holding,
        quotes: &dyn QuoteProvider,
        reporting_currency: &str,
        market_dist: &mut Distribution,
        sector_dist: &mut Distribution,
        ticker_dist: &mut Distribution,
    ) -> HoldingValuation {
        let currency = holding.market.currency(reporting_currency);
        let price = self.price_or_zero(quotes, holding).await;
        let fx = self.fx_or_unity(quotes, &currency, reporting_currency).await;

        let market_value = holding.quantity * price * fx;
        let cost_value = holding.cost_basis * holding.quantity * fx;

        let sector = self.resolve_sector(holding, quotes).await;
        let company_name = match &holding.company_name {
            Some(name) => name.clone(),
            None => quotes.company_name(&holding.ticker, holding.market).await,
        };

        *market_dist
            .entry(holding.market.as_str().to_string())
            .or_insert(0.0) += market_value;
        *sector_dist.entry(sector.clone()).or_insert(0.0) += market_value;
        *ticker_dist.entry(holding.ticker.clone()).or_insert(0.0) += market_value;

        // The valued record carries the resolved name
        let mut holding = holding.clone();
        holding.company_name = Some(company_name);

        HoldingValuation {
            holding,
            current_price: price,
            market_value,
            cost_value,
            exposure_value: 0.0,
            sector,
        }
    }

    /// Option: market value = quantity × premium × 100 × fx, counted into net
    /// worth and the market distribution. A short Put additionally carries an
    /// exercise exposure of |quantity| × strike × 100 × fx — that exposure,
    /// not the market value, is what the ticker and sector distributions
    /// accumulate for it. All other options contribute market value there.
    async fn value_option(
        &self,
        holding: &Holding,
        quotes: &dyn QuoteProvider,
        reporting_currency: &str,
        market_dist: &mut Distribution,
        sector_dist: &mut Distribution,
        ticker_dist: &mut Distribution,
    ) -> HoldingValuation {
        let currency = holding.market.currency(reporting_currency);
        let fx = self.fx_or_unity(quotes, &currency, reporting_currency).await;

        let (premium, strike) = match holding.option_terms() {
            Some(terms) => {
                let premium = match quotes
                    .option_price(
                        &holding.ticker,
                        terms.strike,
                        terms.expiry,
                        terms.kind,
                        holding.market,
                    )
                    .await
                {
                    Ok(p) => p,
                    Err(e) => {
                        warn!(
                            "Could not fetch option price for {} ({}): {e}",
                            holding.ticker, holding.market
                        );
                        0.0
                    }
                };
                (premium, terms.strike)
            }
            None => {
                // Incomplete option terms should be rejected at validation;
                // a record that slipped through contributes nothing.
                warn!("Option holding {} has incomplete terms", holding.ticker);
                (0.0, 0.0)
            }
        };

        let market_value = holding.quantity * premium * OPTION_CONTRACT_MULTIPLIER * fx;
        let cost_value =
            holding.cost_basis * holding.quantity.abs() * OPTION_CONTRACT_MULTIPLIER * fx;

        let is_short_put =
            holding.quantity < 0.0 && holding.option_kind == Some(OptionKind::Put);
        let exposure_value = if is_short_put {
            holding.quantity.abs() * strike * OPTION_CONTRACT_MULTIPLIER * fx
        } else {
            0.0
        };

        let sector = self.resolve_sector(holding, quotes).await;

        *market_dist
            .entry(holding.market.as_str().to_string())
            .or_insert(0.0) += market_value;

        // Distribution basis: short Puts weigh in at exposure, everything
        // else at market value.
        let dist_value = if is_short_put { exposure_value } else { market_value };
        *sector_dist.entry(sector.clone()).or_insert(0.0) += dist_value;
        *ticker_dist.entry(holding.ticker.clone()).or_insert(0.0) += dist_value;

        HoldingValuation {
            holding: holding.clone(),
            current_price: premium,
            market_value,
            cost_value,
            exposure_value,
            sector,
        }
    }

    /// Custom sector override takes precedence over the fetched sector.
    async fn resolve_sector(&self, holding: &Holding, quotes: &dyn QuoteProvider) -> String {
        match &holding.custom_sector {
            Some(sector) => sector.clone(),
            None => quotes.sector(&holding.ticker, holding.market).await,
        }
    }

    /// Documented fallback: a failed price fetch values the holding at zero.
    async fn price_or_zero(&self, quotes: &dyn QuoteProvider, holding: &Holding) -> f64 {
        match quotes.current_price(&holding.ticker, holding.market).await {
            Ok(price) => price,
            Err(e) => {
                warn!(
                    "Could not fetch price for {} ({}): {e}",
                    holding.ticker, holding.market
                );
                0.0
            }
        }
    }

    /// Documented fallback: a failed FX fetch converts at parity.
    async fn fx_or_unity(&self, quotes: &dyn QuoteProvider, from: &str, to: &str) -> f64 {
        match quotes.fx_rate(from, to).await {
            Ok(rate) => rate,
            Err(e) => {
                warn!("Could not fetch FX rate {from}->{to}: {e}");
                1.0
            }
        }
    }
}

impl Default for ValuationService {
    fn default() -> Self {
        Self::new()
    }
}
