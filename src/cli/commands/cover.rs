use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use tracing::info;

use crate::config::Settings;
use crate::data_paths::DataPaths;

use super::{connect, trade_date};

#[derive(Args, Clone)]
pub struct CoverArgs {
    /// Ticker symbol
    pub symbol: String,

    /// Number of shares to buy back
    #[arg(long)]
    pub quantity: Decimal,

    /// Price per share paid
    #[arg(long)]
    pub price: Decimal,

    /// Trade date (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

pub struct CoverCommand {
    args: CoverArgs,
}

impl CoverCommand {
    pub fn new(args: CoverArgs) -> Self {
        Self { args }
    }

    pub async fn execute(&self, settings: &Settings, data_paths: DataPaths) -> Result<()> {
        info!("Executing cover command for symbol: {}", self.args.symbol);

        let handle = connect(settings, data_paths).await?;
        let (remaining, transaction) = handle
            .cover(
                self.args.symbol.clone(),
                self.args.quantity,
                self.args.price,
                trade_date(self.args.date),
            )
            .await?;

        let realized = transaction.realized_gain.unwrap_or(Decimal::ZERO);
        println!(
            "Covered {} {} at {:.2} ({}), realized {:.2}",
            transaction.quantity, transaction.symbol, transaction.price, transaction.id, realized
        );

        match remaining {
            Some(position) => println!(
                "Remaining short: {} shares at cost basis {:.2}",
                position.quantity, position.cost_basis
            ),
            None => println!("Short position closed."),
        }

        Ok(())
    }
}
