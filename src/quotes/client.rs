//! Alpha Vantage market-data client.
//!
//! Implements [`QuoteProvider`] over the Alpha Vantage REST API:
//! - `GLOBAL_QUOTE` + `OVERVIEW` back a single-symbol lookup
//! - `REALTIME_BULK_QUOTES` backs the batched price refresh
//!
//! Company classification data (name/sector/industry/beta) is cached in an
//! injected [`QuoteCache`]; prices are never cached.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Settings;

use super::cache::QuoteCache;
use super::provider::{QuoteError, QuoteProvider, StockQuote};

/// Maximum symbols per bulk quote request
const BATCH_SIZE: usize = 100;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Company classification data cached between lookups
#[derive(Debug, Clone)]
struct CompanyInfo {
    name: String,
    sector: String,
    industry: String,
    beta: Decimal,
}

impl Default for CompanyInfo {
    fn default() -> Self {
        Self {
            name: "Unknown".to_string(),
            sector: "Unknown".to_string(),
            industry: "Unknown".to_string(),
            beta: Decimal::ONE,
        }
    }
}

pub struct AlphaVantageClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    company_cache: QuoteCache<CompanyInfo>,
}

impl AlphaVantageClient {
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: Client::new(),
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
            company_cache: QuoteCache::new(settings.company_cache_ttl_hours),
        }
    }

    /// Drop cached company data for one symbol
    pub fn invalidate_company(&self, symbol: &str) -> bool {
        self.company_cache.invalidate(symbol)
    }

    async fn request(&self, params: &[(&str, &str)]) -> Result<Value, QuoteError> {
        let api_key = self.api_key.as_deref().ok_or(QuoteError::MissingApiKey)?;

        debug!(?params, "Quote provider request");

        let response = self
            .client
            .get(&self.base_url)
            .query(params)
            .query(&[("apikey", api_key)])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        let data: Value = response.json().await?;

        // The provider reports request-level errors inside a 200 body
        if let Some(message) = data.get("Error Message").and_then(Value::as_str) {
            return Err(QuoteError::Malformed(message.to_string()));
        }

        Ok(data)
    }

    async fn company_info(&self, symbol: &str) -> Result<CompanyInfo, QuoteError> {
        if let Some(cached) = self.company_cache.get(symbol) {
            return Ok(cached);
        }

        let data = self
            .request(&[("function", "OVERVIEW"), ("symbol", symbol)])
            .await?;

        let info = CompanyInfo {
            name: string_field(&data, "Name"),
            sector: string_field(&data, "Sector"),
            industry: string_field(&data, "Industry"),
            beta: data
                .get("Beta")
                .and_then(Value::as_str)
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(Decimal::ONE),
        };

        self.company_cache.insert(symbol, info.clone());
        Ok(info)
    }
}

fn string_field(data: &Value, key: &str) -> String {
    data.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .unwrap_or("Unknown")
        .to_string()
}

fn parse_price(raw: &str) -> Option<Decimal> {
    raw.parse::<Decimal>().ok().filter(|price| !price.is_zero())
}

#[async_trait]
impl QuoteProvider for AlphaVantageClient {
    async fn get_stock_info(&self, symbol: &str) -> Result<StockQuote, QuoteError> {
        let quote = self
            .request(&[("function", "GLOBAL_QUOTE"), ("symbol", symbol)])
            .await?;

        let price = quote
            .get("Global Quote")
            .and_then(|q| q.get("05. price"))
            .and_then(Value::as_str)
            .and_then(parse_price)
            .ok_or_else(|| QuoteError::UnknownSymbol(symbol.to_string()))?;

        // Classification data is best-effort: a position can be priced
        // without it, so degrade to Unknown rather than failing the trade
        let company = match self.company_info(symbol).await {
            Ok(info) => info,
            Err(e) => {
                warn!(symbol, error = %e, "Company overview unavailable, using defaults");
                CompanyInfo::default()
            }
        };

        Ok(StockQuote {
            symbol: symbol.to_string(),
            name: company.name,
            price,
            sector: company.sector,
            industry: company.industry,
            beta: company.beta,
        })
    }

    async fn get_batch_quotes(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, Decimal>, QuoteError> {
        let mut quotes = HashMap::new();

        for batch in symbols.chunks(BATCH_SIZE) {
            let joined = batch.join(",");
            let data = self
                .request(&[("function", "REALTIME_BULK_QUOTES"), ("symbols", &joined)])
                .await?;

            let entries = data
                .get("Stock Quotes")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();

            for entry in entries {
                let symbol = entry.get("1. symbol").and_then(Value::as_str);
                let price = entry
                    .get("2. price")
                    .and_then(Value::as_str)
                    .and_then(parse_price);

                match (symbol, price) {
                    (Some(symbol), Some(price)) => {
                        quotes.insert(symbol.to_string(), price);
                    }
                    (symbol, _) => {
                        warn!(?symbol, "Skipping unparseable bulk quote entry");
                    }
                }
            }
        }

        Ok(quotes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings_for(server: &MockServer) -> Settings {
        Settings {
            api_key: Some("demo".to_string()),
            base_url: server.uri(),
            risk_free_rate: 0.02,
            company_cache_ttl_hours: 24,
        }
    }

    #[tokio::test]
    async fn fetches_quote_with_company_info() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("function", "GLOBAL_QUOTE"))
            .and(query_param("symbol", "AAPL"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Global Quote": { "01. symbol": "AAPL", "05. price": "160.2500" }
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(query_param("function", "OVERVIEW"))
            .and(query_param("symbol", "AAPL"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Name": "Apple Inc",
                "Sector": "Technology",
                "Industry": "Consumer Electronics",
                "Beta": "1.2"
            })))
            .mount(&server)
            .await;

        let client = AlphaVantageClient::new(&settings_for(&server));
        let quote = client.get_stock_info("AAPL").await.unwrap();

        assert_eq!(quote.price, dec!(160.25));
        assert_eq!(quote.sector, "Technology");
        assert_eq!(quote.industry, "Consumer Electronics");
        assert_eq!(quote.beta, dec!(1.2));
    }

    #[tokio::test]
    async fn missing_price_is_unknown_symbol() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("function", "GLOBAL_QUOTE"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "Global Quote": {} })),
            )
            .mount(&server)
            .await;

        let client = AlphaVantageClient::new(&settings_for(&server));
        let err = client.get_stock_info("NOPE").await.unwrap_err();

        assert!(matches!(err, QuoteError::UnknownSymbol(symbol) if symbol == "NOPE"));
    }

    #[tokio::test]
    async fn overview_failure_degrades_to_unknown() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("function", "GLOBAL_QUOTE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Global Quote": { "05. price": "50.00" }
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(query_param("function", "OVERVIEW"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = AlphaVantageClient::new(&settings_for(&server));
        let quote = client.get_stock_info("XYZ").await.unwrap();

        assert_eq!(quote.price, dec!(50.00));
        assert_eq!(quote.sector, "Unknown");
        assert_eq!(quote.beta, Decimal::ONE);
    }

    #[tokio::test]
    async fn batch_quotes_skip_missing_symbols() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("function", "REALTIME_BULK_QUOTES"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Stock Quotes": [
                    { "1. symbol": "AAPL", "2. price": "161.00" },
                    { "1. symbol": "MSFT", "2. price": "not-a-price" }
                ]
            })))
            .mount(&server)
            .await;

        let client = AlphaVantageClient::new(&settings_for(&server));
        let symbols = vec!["AAPL".to_string(), "MSFT".to_string(), "GME".to_string()];
        let quotes = client.get_batch_quotes(&symbols).await.unwrap();

        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes["AAPL"], dec!(161.00));
    }

    #[tokio::test]
    async fn missing_api_key_is_typed() {
        let server = MockServer::start().await;
        let mut settings = settings_for(&server);
        settings.api_key = None;

        let client = AlphaVantageClient::new(&settings);
        let err = client.get_stock_info("AAPL").await.unwrap_err();

        assert!(matches!(err, QuoteError::MissingApiKey));
    }
}
