//! CLI module for stockfolio
//!
//! Command-line interface for the portfolio ledger. Uses clap for argument
//! parsing and a structured command pattern: one `Args` + `Command` pair
//! per subcommand, dispatched from [`Cli::execute`].

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

use crate::config::Settings;
use crate::data_paths::DataPaths;
use crate::logging::{init_logging, LoggingConfig};

use commands::analytics::{AnalyticsArgs, AnalyticsCommand};
use commands::buy::{BuyArgs, BuyCommand};
use commands::cover::{CoverArgs, CoverCommand};
use commands::history::{HistoryArgs, HistoryCommand};
use commands::portfolio::{PortfolioArgs, PortfolioCommand};
use commands::refresh::{RefreshArgs, RefreshCommand};
use commands::sell::{SellArgs, SellCommand};
use commands::short::{ShortArgs, ShortCommand};
use commands::snapshot::{SnapshotArgs, SnapshotCommand};

#[derive(Parser)]
#[command(name = "stockfolio")]
#[command(version)]
#[command(about = "Long/short equity portfolio ledger and analytics", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory path (defaults to the platform data dir)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Buy shares, opening or adding to a long position
    Buy(BuyArgs),

    /// Sell shares out of a long position
    Sell(SellArgs),

    /// Sell short, opening or adding to a short position
    Short(ShortArgs),

    /// Buy to cover a short position
    Cover(CoverArgs),

    /// Refresh current prices for all open positions
    Refresh(RefreshArgs),

    /// Show positions and the portfolio summary
    Portfolio(PortfolioArgs),

    /// Show or summarize transaction history
    History(HistoryArgs),

    /// Show risk and performance analytics
    Analytics(AnalyticsArgs),

    /// Save an integrity-hashed snapshot of the portfolio
    Snapshot(SnapshotArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let data_paths = DataPaths::new(
            self.data_dir
                .clone()
                .unwrap_or_else(DataPaths::default_root),
        );

        // Ensure all directories exist before logging opens its file
        data_paths.ensure_directories()?;
        init_logging(LoggingConfig::new(data_paths.clone(), self.verbose))?;

        let settings = Settings::from_env()?;

        match self.command {
            Commands::Buy(args) => BuyCommand::new(args).execute(&settings, data_paths).await,
            Commands::Sell(args) => SellCommand::new(args).execute(&settings, data_paths).await,
            Commands::Short(args) => ShortCommand::new(args).execute(&settings, data_paths).await,
            Commands::Cover(args) => CoverCommand::new(args).execute(&settings, data_paths).await,
            Commands::Refresh(args) => {
                RefreshCommand::new(args).execute(&settings, data_paths).await
            }
            Commands::Portfolio(args) => {
                PortfolioCommand::new(args).execute(&settings, data_paths).await
            }
            Commands::History(args) => {
                HistoryCommand::new(args).execute(&settings, data_paths).await
            }
            Commands::Analytics(args) => {
                AnalyticsCommand::new(args).execute(&settings, data_paths).await
            }
            Commands::Snapshot(args) => {
                SnapshotCommand::new(args).execute(&settings, data_paths).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_trade_commands() {
        let cli = Cli::parse_from([
            "stockfolio", "buy", "AAPL", "--quantity", "100", "--price", "150.25",
        ]);
        match cli.command {
            Commands::Buy(args) => {
                assert_eq!(args.symbol, "AAPL");
                assert_eq!(args.quantity.to_string(), "100");
                assert_eq!(args.price.to_string(), "150.25");
                assert!(args.date.is_none());
            }
            _ => panic!("expected buy command"),
        }
    }

    #[test]
    fn cli_parses_history_filters() {
        let cli = Cli::parse_from([
            "stockfolio", "history", "--symbol", "AAPL", "--kind", "sell", "--start",
            "2024-01-01", "--summary",
        ]);
        match cli.command {
            Commands::History(args) => {
                assert_eq!(args.symbol.as_deref(), Some("AAPL"));
                assert_eq!(args.kind, Some(crate::portfolio::TransactionKind::Sell));
                assert!(args.summary);
            }
            _ => panic!("expected history command"),
        }
    }

    #[test]
    fn bad_dates_are_rejected_at_parse_time() {
        let result = Cli::try_parse_from([
            "stockfolio", "buy", "AAPL", "--quantity", "1", "--price", "1", "--date",
            "not-a-date",
        ]);
        assert!(result.is_err());
    }
}
