use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use tracing::info;

use crate::config::Settings;
use crate::data_paths::DataPaths;

use super::{connect, trade_date};

#[derive(Args, Clone)]
pub struct SellArgs {
    /// Ticker symbol
    pub symbol: String,

    /// Number of shares
    #[arg(long)]
    pub quantity: Decimal,

    /// Price per share
    #[arg(long)]
    pub price: Decimal,

    /// Trade date (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

pub struct SellCommand {
    args: SellArgs,
}

impl SellCommand {
    pub fn new(args: SellArgs) -> Self {
        Self { args }
    }

    pub async fn execute(&self, settings: &Settings, data_paths: DataPaths) -> Result<()> {
        info!("Executing sell command for symbol: {}", self.args.symbol);

        let handle = connect(settings, data_paths).await?;
        let (remaining, transaction) = handle
            .sell(
                self.args.symbol.clone(),
                self.args.quantity,
                self.args.price,
                trade_date(self.args.date),
            )
            .await?;

        let realized = transaction.realized_gain.unwrap_or(Decimal::ZERO);
        println!(
            "Sold {} {} at {:.2} ({}), realized {:.2}",
            transaction.quantity, transaction.symbol, transaction.price, transaction.id, realized
        );

        match remaining {
            Some(position) => println!(
                "Remaining: {} shares at cost basis {:.2}",
                position.quantity, position.cost_basis
            ),
            None => println!("Position closed."),
        }

        let state = handle.state().await?;
        println!(
            "Running realized total for {}: {:.2}",
            transaction.symbol,
            state.running_realized_gain(&transaction.symbol)
        );

        Ok(())
    }
}
