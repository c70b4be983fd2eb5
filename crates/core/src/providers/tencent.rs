use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use reqwest::Client;

use super::cache::QuoteCache;
use super::traits::QuoteProvider;
use crate::errors::CoreError;
use crate::models::holding::{Market, OptionKind};

const BASE_URL: &str = "http://qt.gtimg.cn";

/// Per-call network timeout. A slow quote endpoint must degrade to a
/// fallback, not leave the request pending.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bounds for the in-process quote cache.
const DEFAULT_CACHE_CAPACITY: usize = 512;
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Tencent Finance quote provider.
///
/// - **Free**: no API key, no registration.
/// - **Coverage**: US, Hong Kong, and Mainland China equities plus FX pairs.
/// - **Format**: `GET /q=<symbol>` returns a JS assignment
///   `v_<symbol>="f0~f1~f2~…";` with tilde-separated fields. Price sits at
///   field index 3; the company name at index 1 (index 46 holds the English
///   name for US tickers).
///
/// FX quotes use the `fx_s<from><to>` symbol family (rate at field index 1),
/// with a hardcoded approximate-rate table as a last resort when the endpoint
/// is unreachable.
///
/// Option premiums are approximated by intrinsic value from the underlying's
/// current price — no free endpoint quotes option chains.
pub struct TencentQuoteProvider {
    client: Client,
    cache: Mutex<QuoteCache>,
}

impl TencentQuoteProvider {
    /// Create a provider with the default cache bounds (512 entries, 5 min TTL).
    pub fn new() -> Self {
        Self::with_cache(DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL)
    }

    /// Create a provider with explicit cache capacity and TTL.
    pub fn with_cache(capacity: usize, ttl: Duration) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            cache: Mutex::new(QuoteCache::new(capacity, ttl)),
        }
    }

    async fn fetch_fields(&self, symbol: &str) -> Result<Vec<String>, CoreError> {
        let url = format!("{BASE_URL}/q={symbol}");
        let body = self.client.get(&url).send().await?.text().await?;
        parse_quote_payload(&body).ok_or_else(|| CoreError::Api {
            provider: "Tencent".into(),
            message: format!("Unrecognized payload for {symbol}"),
        })
    }

    fn cache_get(&self, key: &str) -> Option<f64> {
        self.cache.lock().ok()?.get(key)
    }

    fn cache_put(&self, key: String, value: f64) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, value);
        }
    }
}

impl Default for TencentQuoteProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a user-entered ticker to the Tencent symbol format:
/// `usAAPL` (US, uppercased), `hk00700` (HK, zero-padded to 5 digits),
/// `sh600519` / `sz000001` (CN — Shanghai for tickers starting with 6,
/// Shenzhen for 0/3, Shanghai otherwise).
pub fn tencent_symbol(ticker: &str, market: Market) -> String {
    match market {
        Market::Us => format!("us{}", ticker.to_uppercase()),
        Market::Hk => format!("hk{ticker:0>5}"),
        Market::Cn => {
            if ticker.starts_with('6') {
                format!("sh{ticker}")
            } else if ticker.starts_with('0') || ticker.starts_with('3') {
                format!("sz{ticker}")
            } else {
                format!("sh{ticker}")
            }
        }
    }
}

/// Split a Tencent quote payload (`v_<symbol>="f0~f1~…";`) into its
/// tilde-separated fields. Returns `None` for anything that doesn't look
/// like a quote assignment.
pub fn parse_quote_payload(body: &str) -> Option<Vec<String>> {
    let data = body.trim().split_once("=\"")?.1;
    let data = data.trim_end_matches(';').trim_end_matches('"');
    Some(data.split('~').map(str::to_string).collect())
}

/// Extract a positive, finite price from the field at `index`.
pub fn price_field(fields: &[String], index: usize) -> Option<f64> {
    let price: f64 = fields.get(index)?.trim().parse().ok()?;
    if price.is_finite() && price > 0.0 {
        Some(price)
    } else {
        None
    }
}

/// Hardcoded approximate FX rates, used when the quote endpoint is
/// unreachable. Keyed by concatenated pair, e.g. "USDHKD".
pub fn fallback_fx_rate(pair: &str) -> Option<f64> {
    match pair {
        "USDHKD" => Some(7.8),
        "USDCNY" => Some(7.2),
        "CNYHKD" => Some(1.08),
        "HKDUSD" => Some(0.128),
        "HKDCNY" => Some(0.92),
        "CNYUSD" => Some(0.139),
        _ => None,
    }
}

/// Intrinsic value of an option: `max(0, underlying − strike)` for a Call,
/// `max(0, strike − underlying)` for a Put.
pub fn intrinsic_value(kind: OptionKind, underlying: f64, strike: f64) -> f64 {
    match kind {
        OptionKind::Call => (underlying - strike).max(0.0),
        OptionKind::Put => (strike - underlying).max(0.0),
    }
}

#[async_trait]
impl QuoteProvider for TencentQuoteProvider {
    fn name(&self) -> &str {
        "Tencent"
    }

    async fn current_price(&self, ticker: &str, market: Market) -> Result<f64, CoreError> {
        let symbol = tencent_symbol(ticker, market);
        let key = format!("px:{symbol}");

        if let Some(price) = self.cache_get(&key) {
            debug!("Cache hit for {symbol}: {price}");
            return Ok(price);
        }

        let fields = self.fetch_fields(&symbol).await?;
        let price = price_field(&fields, 3).ok_or_else(|| CoreError::QuoteUnavailable {
            symbol: symbol.clone(),
        })?;

        self.cache_put(key, price);
        Ok(price)
    }

    async fn fx_rate(&self, from_currency: &str, to_currency: &str) -> Result<f64, CoreError> {
        let from = from_currency.to_uppercase();
        let to = to_currency.to_uppercase();

        if from == to {
            return Ok(1.0);
        }

        let pair = format!("{from}{to}");
        let key = format!("fx:{pair}");

        if let Some(rate) = self.cache_get(&key) {
            return Ok(rate);
        }

        // Tencent FX symbol format: fx_susdhkd
        let symbol = format!("fx_s{}{}", from.to_lowercase(), to.to_lowercase());
        match self.fetch_fields(&symbol).await {
            Ok(fields) => {
                if let Some(rate) = price_field(&fields, 1) {
                    self.cache_put(key, rate);
                    return Ok(rate);
                }
            }
            Err(e) => {
                debug!("FX fetch failed for {pair}: {e}");
            }
        }

        fallback_fx_rate(&pair).ok_or(CoreError::FxUnavailable { pair })
    }

    async fn sector(&self, _ticker: &str, _market: Market) -> String {
        // The quote endpoint carries no sector classification; the user
        // supplies one via the holding's custom sector override.
        "Unknown".to_string()
    }

    async fn company_name(&self, ticker: &str, market: Market) -> String {
        let symbol = tencent_symbol(ticker, market);
        let Ok(fields) = self.fetch_fields(&symbol).await else {
            return ticker.to_string();
        };

        // US quotes carry the English name at index 46; CN/HK quotes carry
        // the (Chinese) name at index 1.
        if market == Market::Us {
            if let Some(name) = fields.get(46).map(|s| s.trim()) {
                if !name.is_empty() {
                    return name.to_string();
                }
            }
        }
        match fields.get(1).map(|s| s.trim()) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => ticker.to_string(),
        }
    }

    async fn option_price(
        &self,
        ticker: &str,
        strike: f64,
        _expiry: NaiveDate,
        kind: OptionKind,
        market: Market,
    ) -> Result<f64, CoreError> {
        let underlying = self.current_price(ticker, market).await?;
        Ok(intrinsic_value(kind, underlying, strike))
    }
}
