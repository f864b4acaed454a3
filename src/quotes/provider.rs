//! Quote provider contract consumed by the ledger.
//!
//! These two calls are the only ones the ledger issues outward for market
//! data. Implementations live behind a trait object so tests can substitute
//! a canned provider.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Point-in-time quote and classification data for one symbol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockQuote {
    pub symbol: String,
    pub name: String,
    pub price: Decimal,
    pub sector: String,
    pub industry: String,
    pub beta: Decimal,
}

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("no API key configured (set STOCKFOLIO_API_KEY)")]
    MissingApiKey,
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

/// Market-data source for single-symbol lookups and bulk price refreshes
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Fetch price plus sector/industry/beta for a single symbol.
    /// Fails on unknown symbols and network errors.
    async fn get_stock_info(&self, symbol: &str) -> Result<StockQuote, QuoteError>;

    /// Fetch current prices for multiple symbols in one round trip.
    /// Symbols the provider does not know are absent from the result,
    /// which is not an error.
    async fn get_batch_quotes(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, Decimal>, QuoteError>;
}
