//! Display utilities and formatters for portfolio data
//!
//! Renders positions, summary metadata, metrics, and transaction history
//! as fixed-width tables for the CLI. All rounding to two decimal places
//! happens here, at the presentation boundary.

use rust_decimal::Decimal;

use super::analytics::{PerformanceMetrics, RiskMetrics};
use super::ledger::{RefreshReport, TransactionSummary};
use super::types::{Portfolio, Position, Transaction};

/// Format positions for display
pub struct PositionsFormatter<'a> {
    pub positions: &'a [Position],
}

impl<'a> PositionsFormatter<'a> {
    pub fn new(positions: &'a [Position]) -> Self {
        Self { positions }
    }

    /// Format as a table
    pub fn format_table(&self) -> String {
        if self.positions.is_empty() {
            return "No open positions.\n".to_string();
        }

        let mut output = String::new();

        output.push_str("┌──────────┬───────┬────────────┬────────────┬────────────┬────────────┬──────────────┬──────────┐\n");
        output.push_str("│ Symbol   │ Side  │ Quantity   │ Cost Basis │ Price      │ Value      │ Unreal. P&L  │ Change   │\n");
        output.push_str("├──────────┼───────┼────────────┼────────────┼────────────┼────────────┼──────────────┼──────────┤\n");

        for position in self.positions {
            output.push_str(&format!(
                "│ {:<8} │ {:<5} │ {:>10.2} │ {:>10.2} │ {:>10.2} │ {:>10.2} │ {:>12.2} │ {:>7.2}% │\n",
                position.symbol,
                position.side.as_str(),
                position.quantity,
                position.cost_basis,
                position.current_price,
                position.position_value(),
                position.unrealized_gain(),
                position.percent_change(),
            ));
        }

        output.push_str("└──────────┴───────┴────────────┴────────────┴────────────┴────────────┴──────────────┴──────────┘\n");

        output
    }
}

/// Format the derived portfolio summary for display
pub struct SummaryFormatter<'a> {
    pub portfolio: &'a Portfolio,
}

impl<'a> SummaryFormatter<'a> {
    pub fn new(portfolio: &'a Portfolio) -> Self {
        Self { portfolio }
    }

    pub fn format(&self) -> String {
        let metadata = &self.portfolio.metadata;
        let mut output = String::new();

        output.push_str(&PositionsFormatter::new(&self.portfolio.positions).format_table());
        output.push('\n');

        output.push_str("┌──────────────────────────┬─────────────────┐\n");
        output.push_str("│ Portfolio Summary        │ Value           │\n");
        output.push_str("├──────────────────────────┼─────────────────┤\n");
        output.push_str(&format!(
            "│ Total Long Value         │ ${:>14.2} │\n",
            metadata.total_long_value
        ));
        output.push_str(&format!(
            "│ Total Short Value        │ ${:>14.2} │\n",
            metadata.total_short_value
        ));
        output.push_str(&format!(
            "│ Long/Short Ratio         │ {:>15} │\n",
            format_ratio(metadata.long_short_ratio)
        ));
        output.push_str(&format!(
            "│ Realized Gains           │ ${:>14.2} │\n",
            metadata.total_realized_gains
        ));
        output.push_str(&format!(
            "│ Unrealized Gains         │ ${:>14.2} │\n",
            metadata.total_unrealized_gains
        ));
        output.push_str(&format!(
            "│ Long Positions           │ {:>15} │\n",
            metadata.long_positions_count
        ));
        output.push_str(&format!(
            "│ Short Positions          │ {:>15} │\n",
            metadata.short_positions_count
        ));
        output.push_str(&format!(
            "│ Weighted Long Beta       │ {:>15.2} │\n",
            metadata.weighted_long_beta
        ));
        output.push_str(&format!(
            "│ Weighted Short Beta      │ {:>15.2} │\n",
            metadata.weighted_short_beta
        ));
        output.push_str("└──────────────────────────┴─────────────────┘\n");

        for (label, sectors) in [
            ("Long sector exposure", &metadata.sector_exposure.long),
            ("Short sector exposure", &metadata.sector_exposure.short),
        ] {
            if sectors.is_empty() {
                continue;
            }
            output.push_str(&format!("\n{label}:\n"));
            let mut rows: Vec<(&String, &Decimal)> = sectors.iter().collect();
            rows.sort_by(|a, b| b.1.cmp(a.1));
            for (sector, percent) in rows {
                output.push_str(&format!("  {:<28} {:>6.2}%\n", sector, percent));
            }
        }

        output
    }
}

/// Format risk metrics for display
pub struct RiskMetricsFormatter<'a> {
    pub metrics: &'a RiskMetrics,
}

impl<'a> RiskMetricsFormatter<'a> {
    pub fn new(metrics: &'a RiskMetrics) -> Self {
        Self { metrics }
    }

    pub fn format(&self) -> String {
        let mut output = String::new();

        output.push_str("┌──────────────────────────┬─────────────────┐\n");
        output.push_str("│ Risk Metrics             │ Value           │\n");
        output.push_str("├──────────────────────────┼─────────────────┤\n");
        output.push_str(&format!(
            "│ Long Beta                │ {:>15.2} │\n",
            self.metrics.long_beta
        ));
        output.push_str(&format!(
            "│ Short Beta               │ {:>15.2} │\n",
            self.metrics.short_beta
        ));
        output.push_str(&format!(
            "│ Net Beta Exposure        │ {:>15.2} │\n",
            self.metrics.net_beta_exposure
        ));
        output.push_str(&format!(
            "│ Long/Short Ratio         │ {:>15} │\n",
            format_ratio(self.metrics.long_short_ratio)
        ));
        output.push_str("└──────────────────────────┴─────────────────┘\n");

        if !self.metrics.sector_concentration.is_empty() {
            output.push_str("\nSector concentration:\n");
            let mut rows: Vec<(&String, &Decimal)> =
                self.metrics.sector_concentration.iter().collect();
            rows.sort_by(|a, b| b.1.cmp(a.1));
            for (sector, percent) in rows {
                output.push_str(&format!("  {:<28} {:>6.2}%\n", sector, percent));
            }
        }

        let concentration = &self.metrics.position_concentration;
        if !concentration.top_positions.is_empty() {
            output.push_str("\nTop positions by weight:\n");
            for (symbol, percent) in &concentration.top_positions {
                output.push_str(&format!("  {:<10} {:>6.2}%\n", symbol, percent));
            }
        }

        output
    }
}

/// Format performance metrics for display
pub struct PerformanceFormatter<'a> {
    pub metrics: &'a PerformanceMetrics,
}

impl<'a> PerformanceFormatter<'a> {
    pub fn new(metrics: &'a PerformanceMetrics) -> Self {
        Self { metrics }
    }

    pub fn format(&self) -> String {
        let mut output = String::new();

        output.push_str("┌──────────────────────────┬─────────────────┐\n");
        output.push_str("│ Performance              │ Value           │\n");
        output.push_str("├──────────────────────────┼─────────────────┤\n");
        output.push_str(&format!(
            "│ Realized Gains           │ ${:>14.2} │\n",
            self.metrics.realized_gains
        ));
        output.push_str(&format!(
            "│ Sharpe Ratio             │ {:>15.2} │\n",
            self.metrics.sharpe_ratio
        ));
        output.push_str(&format!(
            "│ Win Rate                 │ {:>14.1}% │\n",
            self.metrics.win_rate * 100.0
        ));
        output.push_str(&format!(
            "│ Average Win              │ ${:>14.2} │\n",
            self.metrics.average_win
        ));
        output.push_str(&format!(
            "│ Average Loss             │ ${:>14.2} │\n",
            self.metrics.average_loss
        ));
        output.push_str("└──────────────────────────┴─────────────────┘\n");

        if !self.metrics.daily_pnl.is_empty() {
            output.push_str("\nDaily P&L:\n");
            for (date, pnl) in &self.metrics.daily_pnl {
                output.push_str(&format!("  {date}  ${:>12.2}\n", pnl));
            }
        }

        output
    }
}

/// Format transactions for display
pub struct TransactionsFormatter<'a> {
    pub transactions: &'a [Transaction],
}

impl<'a> TransactionsFormatter<'a> {
    pub fn new(transactions: &'a [Transaction]) -> Self {
        Self { transactions }
    }

    pub fn format_table(&self) -> String {
        if self.transactions.is_empty() {
            return "No transactions found.\n".to_string();
        }

        let mut output = String::new();

        output.push_str("┌────────┬──────────┬───────┬────────────┬────────────┬──────────────┬──────────────┐\n");
        output.push_str("│ Id     │ Symbol   │ Kind  │ Quantity   │ Price      │ Total        │ Realized     │\n");
        output.push_str("├────────┼──────────┼───────┼────────────┼────────────┼──────────────┼──────────────┤\n");

        for transaction in self.transactions {
            let realized = match transaction.realized_gain {
                Some(gain) => format!("{:>12.2}", gain),
                None => format!("{:>12}", "-"),
            };
            output.push_str(&format!(
                "│ {:<6} │ {:<8} │ {:<5} │ {:>10.2} │ {:>10.2} │ {:>12.2} │ {} │\n",
                transaction.id,
                transaction.symbol,
                transaction.kind.as_str(),
                transaction.quantity,
                transaction.price,
                transaction.total_value(),
                realized,
            ));
        }

        output.push_str("└────────┴──────────┴───────┴────────────┴────────────┴──────────────┴──────────────┘\n");

        output
    }
}

/// One-line rendering of a transaction summary
pub fn format_transaction_summary(summary: &TransactionSummary) -> String {
    format!(
        "{} transactions (buy {} / sell {} / short {} / cover {}), \
         volume: buys ${:.2}, sells ${:.2}, shorts ${:.2}, covers ${:.2}, \
         realized gains ${:.2}\n",
        summary.total_transactions,
        summary.buy_count,
        summary.sell_count,
        summary.short_count,
        summary.cover_count,
        summary.total_buys,
        summary.total_sells,
        summary.total_shorts,
        summary.total_covers,
        summary.realized_gains,
    )
}

/// One-line rendering of a refresh outcome
pub fn format_refresh_report(report: &RefreshReport) -> String {
    if report.requested == 0 {
        return "No positions to refresh.\n".to_string();
    }
    if report.stale.is_empty() {
        format!("Updated prices for all {} symbols.\n", report.updated)
    } else {
        format!(
            "Updated prices for {}/{} symbols; no quote for: {}\n",
            report.updated,
            report.requested,
            report.stale.join(", ")
        )
    }
}

fn format_ratio(ratio: Option<Decimal>) -> String {
    match ratio {
        Some(ratio) => format!("{:.2}", ratio),
        None => "N/A".to_string(),
    }
}
