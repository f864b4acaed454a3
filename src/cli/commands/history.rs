use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;

use crate::config::Settings;
use crate::data_paths::DataPaths;
use crate::portfolio::display::{format_transaction_summary, TransactionsFormatter};
use crate::portfolio::{HistoryFilter, TransactionKind};

use super::{connect, end_of_day, start_of_day};

#[derive(Args, Clone)]
pub struct HistoryArgs {
    /// Only show transactions for this symbol
    #[arg(long)]
    pub symbol: Option<String>,

    /// Only show transactions of this kind (buy, sell, short, cover)
    #[arg(long)]
    pub kind: Option<TransactionKind>,

    /// Window start date (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Window end date (YYYY-MM-DD, inclusive)
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Print totals and counts instead of the full table
    #[arg(long)]
    pub summary: bool,
}

pub struct HistoryCommand {
    args: HistoryArgs,
}

impl HistoryCommand {
    pub fn new(args: HistoryArgs) -> Self {
        Self { args }
    }

    fn filter(&self) -> HistoryFilter {
        HistoryFilter {
            symbol: self.args.symbol.clone(),
            kind: self.args.kind,
            start: self.args.start.map(start_of_day),
            end: self.args.end.map(end_of_day),
        }
    }

    pub async fn execute(&self, settings: &Settings, data_paths: DataPaths) -> Result<()> {
        let handle = connect(settings, data_paths).await?;

        if self.args.summary {
            let summary = handle.transaction_summary(self.filter()).await?;
            print!("{}", format_transaction_summary(&summary));
        } else {
            let transactions = handle.history(self.filter()).await?;
            print!("{}", TransactionsFormatter::new(&transactions).format_table());
        }

        Ok(())
    }
}
