use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::CoreError;

/// The exchange/market a holding trades on.
/// Determines the holding's native currency and how tickers are resolved
/// against the quote source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Market {
    /// US exchanges (NYSE, NASDAQ) — priced in USD
    #[serde(rename = "US")]
    Us,
    /// Hong Kong Stock Exchange — priced in HKD
    #[serde(rename = "HK")]
    Hk,
    /// Mainland China (Shanghai/Shenzhen) — priced in CNY
    #[serde(rename = "CN")]
    Cn,
}

impl Market {
    /// The native currency a position on this market is denominated in.
    /// HK positions use the reporting currency directly (HKD by default).
    pub fn currency(self, reporting_currency: &str) -> String {
        match self {
            Market::Us => "USD".to_string(),
            Market::Cn => "CNY".to_string(),
            Market::Hk => reporting_currency.to_string(),
        }
    }

    /// The distribution key for this market ("US", "HK", "CN").
    pub fn as_str(self) -> &'static str {
        match self {
            Market::Us => "US",
            Market::Hk => "HK",
            Market::Cn => "CN",
        }
    }
}

impl std::fmt::Display for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The type/category of a holding.
/// Drives the valuation rule used for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetType {
    /// Cash balance in the market's native currency
    Cash,
    /// Stocks / equities
    Stock,
    /// Exchange-traded option contracts (100-unit multiplier)
    Option,
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetType::Cash => write!(f, "Cash"),
            AssetType::Stock => write!(f, "Stock"),
            AssetType::Option => write!(f, "Option"),
        }
    }
}

/// Call or Put, for Option holdings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionKind {
    Call,
    Put,
}

impl std::fmt::Display for OptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionKind::Call => write!(f, "Call"),
            OptionKind::Put => write!(f, "Put"),
        }
    }
}

/// Long/Short annotation on an option position. Informational only —
/// the sign of `quantity` is what carries long/short meaning in valuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionSide {
    Long,
    Short,
}

/// Fully-specified option terms, extracted from a validated Option holding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionTerms {
    pub kind: OptionKind,
    pub strike: f64,
    pub expiry: NaiveDate,
}

/// A single position in the portfolio: cash, a stock, or an option contract.
///
/// `quantity` is signed — negative means a short position (meaningful for
/// Option holdings). `cost_basis` is the per-unit acquisition price in the
/// holding's native currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Unique identifier. Assigned by the store at creation if absent.
    #[serde(default)]
    pub id: Option<Uuid>,

    /// Ticker symbol as the user entered it (e.g., "AAPL", "0700", "600519")
    pub ticker: String,

    /// Market the position trades on
    pub market: Market,

    /// Cash, Stock, or Option
    pub asset_type: AssetType,

    /// Signed amount held (shares, contracts, or cash units)
    pub quantity: f64,

    /// Per-unit acquisition price in the holding's native currency
    pub cost_basis: f64,

    /// Company name; resolved from the quote source when absent
    #[serde(default)]
    pub company_name: Option<String>,

    /// User-supplied sector override; takes precedence over the fetched sector
    #[serde(default)]
    pub custom_sector: Option<String>,

    // Option-specific fields
    #[serde(default)]
    pub option_kind: Option<OptionKind>,

    #[serde(default)]
    pub strike_price: Option<f64>,

    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,

    #[serde(default)]
    pub side: Option<OptionSide>,
}

impl Holding {
    /// Create a cash holding: `quantity` units of the market's currency.
    pub fn cash(market: Market, quantity: f64) -> Self {
        Self {
            id: None,
            ticker: "CASH".to_string(),
            market,
            asset_type: AssetType::Cash,
            quantity,
            cost_basis: 1.0,
            company_name: None,
            custom_sector: None,
            option_kind: None,
            strike_price: None,
            expiry_date: None,
            side: None,
        }
    }

    /// Create a stock holding.
    pub fn stock(ticker: impl Into<String>, market: Market, quantity: f64, cost_basis: f64) -> Self {
        Self {
            id: None,
            ticker: ticker.into(),
            market,
            asset_type: AssetType::Stock,
            quantity,
            cost_basis,
            company_name: None,
            custom_sector: None,
            option_kind: None,
            strike_price: None,
            expiry_date: None,
            side: None,
        }
    }

    /// Create an option holding. Negative `quantity` denotes a short position.
    pub fn option(
        ticker: impl Into<String>,
        market: Market,
        quantity: f64,
        cost_basis: f64,
        kind: OptionKind,
        strike: f64,
        expiry: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            ticker: ticker.into(),
            market,
            asset_type: AssetType::Option,
            quantity,
            cost_basis,
            company_name: None,
            custom_sector: None,
            option_kind: Some(kind),
            strike_price: Some(strike),
            expiry_date: Some(expiry),
            side: Some(if quantity < 0.0 { OptionSide::Short } else { OptionSide::Long }),
        }
    }

    /// The option terms, if this is a fully-specified Option holding.
    pub fn option_terms(&self) -> Option<OptionTerms> {
        match (self.asset_type, self.option_kind, self.strike_price, self.expiry_date) {
            (AssetType::Option, Some(kind), Some(strike), Some(expiry)) => {
                Some(OptionTerms { kind, strike, expiry })
            }
            _ => None,
        }
    }

    /// Validate the holding's record before it enters the store.
    ///
    /// Rules:
    /// - Ticker must be non-empty
    /// - Quantity and cost basis must be finite, cost basis non-negative
    /// - Option holdings must carry kind, a positive strike, and an expiry date
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.ticker.trim().is_empty() {
            return Err(CoreError::ValidationError("Ticker must not be empty".into()));
        }
        if !self.quantity.is_finite() {
            return Err(CoreError::ValidationError(format!(
                "Quantity {} is not a finite number",
                self.quantity
            )));
        }
        if !self.cost_basis.is_finite() || self.cost_basis < 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Cost basis {} must be finite and non-negative",
                self.cost_basis
            )));
        }
        if self.asset_type == AssetType::Option {
            let terms = self.option_terms().ok_or_else(|| {
                CoreError::ValidationError(format!(
                    "Option holding '{}' must specify option kind, strike price, and expiry date",
                    self.ticker
                ))
            })?;
            if !terms.strike.is_finite() || terms.strike <= 0.0 {
                return Err(CoreError::ValidationError(format!(
                    "Option strike {} must be a positive number",
                    terms.strike
                )));
            }
        }
        Ok(())
    }
}
