use anyhow::Result;
use chrono::{Duration, NaiveDate, Utc};
use clap::Args;

use crate::config::Settings;
use crate::data_paths::DataPaths;
use crate::portfolio::display::{PerformanceFormatter, RiskMetricsFormatter};

use super::{connect, end_of_day, start_of_day};

/// Default performance window when no dates are given
const DEFAULT_WINDOW_DAYS: i64 = 30;

#[derive(Args, Clone)]
pub struct AnalyticsArgs {
    /// Performance window start date (YYYY-MM-DD, defaults to 30 days ago)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Performance window end date (YYYY-MM-DD inclusive, defaults to today)
    #[arg(long)]
    pub end: Option<NaiveDate>,
}

pub struct AnalyticsCommand {
    args: AnalyticsArgs,
}

impl AnalyticsCommand {
    pub fn new(args: AnalyticsArgs) -> Self {
        Self { args }
    }

    pub async fn execute(&self, settings: &Settings, data_paths: DataPaths) -> Result<()> {
        let handle = connect(settings, data_paths).await?;

        let end = match self.args.end {
            Some(date) => end_of_day(date),
            None => Utc::now(),
        };
        let start = match self.args.start {
            Some(date) => start_of_day(date),
            None => end - Duration::days(DEFAULT_WINDOW_DAYS),
        };

        let risk = handle.risk_metrics().await?;
        print!("{}", RiskMetricsFormatter::new(&risk).format());

        let performance = handle.performance(start, end).await?;
        println!(
            "\nPerformance {} to {}:",
            start.date_naive(),
            end.date_naive()
        );
        print!("{}", PerformanceFormatter::new(&performance).format());

        Ok(())
    }
}
