//! Runtime settings sourced from the environment.
//!
//! All knobs are plain environment variables so the CLI works the same way
//! under a shell, a cron job, or a .env file loaded by `dotenvy` in `main`.

use anyhow::{Context, Result};

/// Default quote provider endpoint (Alpha Vantage)
pub const DEFAULT_QUOTE_URL: &str = "https://www.alphavantage.co/query";

/// Annual risk-free rate used for Sharpe when none is configured
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;

/// Company info moves slowly; cache it for a day by default
pub const DEFAULT_COMPANY_CACHE_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct Settings {
    /// Quote provider API key. Optional so that read-only commands work
    /// without one; quote-dependent calls fail with a typed error instead.
    pub api_key: Option<String>,
    /// Quote provider base URL (overridable for tests)
    pub base_url: String,
    /// Annual risk-free rate for Sharpe-ratio computation
    pub risk_free_rate: f64,
    /// TTL for cached company classification data
    pub company_cache_ttl_hours: i64,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("STOCKFOLIO_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());

        let base_url = std::env::var("STOCKFOLIO_QUOTE_URL")
            .unwrap_or_else(|_| DEFAULT_QUOTE_URL.to_string());

        let risk_free_rate = match std::env::var("STOCKFOLIO_RISK_FREE_RATE") {
            Ok(raw) => parse_rate(&raw)
                .context("STOCKFOLIO_RISK_FREE_RATE must be a rate like 0.02")?,
            Err(_) => DEFAULT_RISK_FREE_RATE,
        };

        let company_cache_ttl_hours = match std::env::var("STOCKFOLIO_COMPANY_CACHE_TTL_HOURS") {
            Ok(raw) => raw
                .trim()
                .parse()
                .context("STOCKFOLIO_COMPANY_CACHE_TTL_HOURS must be an integer")?,
            Err(_) => DEFAULT_COMPANY_CACHE_TTL_HOURS,
        };

        Ok(Self {
            api_key,
            base_url,
            risk_free_rate,
            company_cache_ttl_hours,
        })
    }
}

fn parse_rate(raw: &str) -> Result<f64> {
    let rate: f64 = raw.trim().parse()?;
    if !rate.is_finite() {
        anyhow::bail!("rate must be finite");
    }
    Ok(rate)
}
