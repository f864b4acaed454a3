//! Stock quote acquisition: provider contract, HTTP client, and cache

pub mod cache;
pub mod client;
pub mod provider;

pub use client::AlphaVantageClient;
pub use provider::{QuoteError, QuoteProvider, StockQuote};
