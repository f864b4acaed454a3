//! CLI command implementations, one module per subcommand

pub mod analytics;
pub mod buy;
pub mod cover;
pub mod history;
pub mod portfolio;
pub mod refresh;
pub mod sell;
pub mod short;
pub mod snapshot;

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::config::Settings;
use crate::data_paths::DataPaths;
use crate::portfolio::{start_portfolio_service, PortfolioHandle, PortfolioStore};
use crate::quotes::{AlphaVantageClient, QuoteProvider};

/// Wire up storage, quote provider, and the portfolio service actor
pub(crate) async fn connect(
    settings: &Settings,
    data_paths: DataPaths,
) -> Result<PortfolioHandle> {
    let store = PortfolioStore::new(data_paths);
    let quotes: Arc<dyn QuoteProvider> = Arc::new(AlphaVantageClient::new(settings));
    start_portfolio_service(store, quotes, settings.risk_free_rate).await
}

/// Resolve an optional CLI date to a trade timestamp (today when omitted)
pub(crate) fn trade_date(date: Option<NaiveDate>) -> DateTime<Utc> {
    match date {
        Some(date) => start_of_day(date),
        None => Utc::now(),
    }
}

pub(crate) fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Last representable instant of the day, so date windows are inclusive
pub(crate) fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + Duration::days(1) - Duration::nanoseconds(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_bounds_are_inclusive() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let start = start_of_day(date);
        let end = end_of_day(date);

        assert!(start < end);
        assert_eq!(start.date_naive(), date);
        assert_eq!(end.date_naive(), date);
        assert_eq!(end_of_day(date) + Duration::nanoseconds(1), start_of_day(date + Duration::days(1)));
    }
}
