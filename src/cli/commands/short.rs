use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use tracing::info;

use crate::config::Settings;
use crate::data_paths::DataPaths;

use super::{connect, trade_date};

#[derive(Args, Clone)]
pub struct ShortArgs {
    /// Ticker symbol
    pub symbol: String,

    /// Number of shares to sell short
    #[arg(long)]
    pub quantity: Decimal,

    /// Price per share received
    #[arg(long)]
    pub price: Decimal,

    /// Trade date (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

pub struct ShortCommand {
    args: ShortArgs,
}

impl ShortCommand {
    pub fn new(args: ShortArgs) -> Self {
        Self { args }
    }

    pub async fn execute(&self, settings: &Settings, data_paths: DataPaths) -> Result<()> {
        info!("Executing short command for symbol: {}", self.args.symbol);

        let handle = connect(settings, data_paths).await?;
        let (position, transaction) = handle
            .short(
                self.args.symbol.clone(),
                self.args.quantity,
                self.args.price,
                trade_date(self.args.date),
            )
            .await?;

        println!(
            "Shorted {} {} at {:.2} ({})",
            transaction.quantity, position.symbol, transaction.price, transaction.id
        );
        println!(
            "Short position: {} shares, cost basis {:.2}, mark {:.2}",
            position.quantity, position.cost_basis, position.current_price
        );

        Ok(())
    }
}
