use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use tracing::info;

use crate::config::Settings;
use crate::data_paths::DataPaths;

use super::{connect, trade_date};

#[derive(Args, Clone)]
pub struct BuyArgs {
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

pub struct BuyCommand {
    args: BuyArgs,
}

impl BuyCommand {
    pub fn new(args: BuyArgs) -> Self {
        Self { args }
    }

    pub async fn execute(&self, settings: &Settings, data_paths: DataPaths) -> Result<()> {
        info!("Executing buy command for symbol: {}", self.args.symbol);

        let handle = connect(settings, data_paths).await?;
        let (position, transaction) = handle
            .buy(
                self.args.symbol.clone(),
                self.args.quantity,
                self.args.price,
                trade_date(self.args.date),
            )
            .await?;

        println!(
            "Bought {} {} at {:.2} ({})",
            transaction.quantity, position.symbol, transaction.price, transaction.id
        );
        println!(
            "Position: {} shares, cost basis {:.2}, mark {:.2}",
            position.quantity, position.cost_basis, position.current_price
        );

        Ok(())
    }
}
