//! Read-only analytics over the aggregate and the trade log.
//!
//! Everything in this module is a pure function: it reads positions and
//! transactions and produces derived numbers, never mutating state. Money
//! values stay `Decimal` end to end; statistical ratios (Sharpe, win rate)
//! are `f64` since they are not subject to the cost-basis invariants.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use super::types::{
    Portfolio, PortfolioMetadata, Position, PositionSide, SectorExposure, Transaction,
};

/// Trading days used to annualize daily statistics
const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// How many positions the concentration report ranks
const TOP_POSITIONS: usize = 5;

/// Beta-weighted exposure and concentration measures
#[derive(Debug, Clone, Serialize)]
pub struct RiskMetrics {
    /// Value-weighted beta over long positions (0 when none)
    pub long_beta: Decimal,
    /// Value-weighted beta over short positions (0 when none)
    pub short_beta: Decimal,
    pub net_beta_exposure: Decimal,
    #[serde(with = "super::types::ratio_sentinel")]
    pub long_short_ratio: Option<Decimal>,
    /// Percent of total position value per sector, across both directions
    pub sector_concentration: HashMap<String, Decimal>,
    pub position_concentration: PositionConcentration,
}

#[derive(Debug, Clone, Serialize)]
pub struct PositionConcentration {
    /// Symbol and percent-of-total of the single largest position
    pub largest_position: Option<(String, Decimal)>,
    /// Top positions by percent of total value, descending
    pub top_positions: Vec<(String, Decimal)>,
}

/// Time-windowed performance statistics over realized gains
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceMetrics {
    pub realized_gains: Decimal,
    /// Realized P&L summed per calendar date; dates without realized
    /// transactions are absent, not zero-filled
    pub daily_pnl: BTreeMap<NaiveDate, Decimal>,
    /// Annualized; 0 when fewer than two daily samples exist
    pub sharpe_ratio: f64,
    /// Winning trades over trades with a realized gain; 0 when none
    pub win_rate: f64,
    pub average_win: Decimal,
    pub average_loss: Decimal,
}

/// Recompute the derived metadata snapshot from positions + transactions.
///
/// This is the only way metadata is ever produced; the ledger calls it
/// after every mutation so the snapshot can never drift from the entities
/// it summarizes.
pub fn recompute_metadata(
    positions: &[Position],
    transactions: &[Transaction],
    now: DateTime<Utc>,
) -> PortfolioMetadata {
    let longs: Vec<&Position> = positions.iter().filter(|p| p.side == PositionSide::Long).collect();
    let shorts: Vec<&Position> = positions.iter().filter(|p| p.side == PositionSide::Short).collect();

    let total_long_value: Decimal = longs.iter().map(|p| p.position_value()).sum();
    let total_short_value: Decimal = shorts.iter().map(|p| p.position_value()).sum();

    let long_short_ratio = if total_short_value > Decimal::ZERO {
        Some(total_long_value / total_short_value)
    } else {
        None
    };

    let total_realized_gains = transactions.iter().filter_map(|t| t.realized_gain).sum();
    let total_unrealized_gains = positions.iter().map(|p| p.unrealized_gain()).sum();

    PortfolioMetadata {
        total_long_value,
        total_short_value,
        long_short_ratio,
        total_realized_gains,
        total_unrealized_gains,
        long_positions_count: longs.len(),
        short_positions_count: shorts.len(),
        sector_exposure: SectorExposure {
            long: sector_percentages(&longs, total_long_value),
            short: sector_percentages(&shorts, total_short_value),
        },
        weighted_long_beta: value_weighted_beta(&longs, total_long_value),
        weighted_short_beta: value_weighted_beta(&shorts, total_short_value),
        last_updated: now,
    }
}

/// Beta exposure, long/short ratio, and concentration for the portfolio
pub fn portfolio_metrics(portfolio: &Portfolio) -> RiskMetrics {
    let longs: Vec<&Position> = portfolio.positions_by_side(PositionSide::Long).collect();
    let shorts: Vec<&Position> = portfolio.positions_by_side(PositionSide::Short).collect();

    let total_long_value: Decimal = longs.iter().map(|p| p.position_value()).sum();
    let total_short_value: Decimal = shorts.iter().map(|p| p.position_value()).sum();

    let long_beta = value_weighted_beta(&longs, total_long_value);
    let short_beta = value_weighted_beta(&shorts, total_short_value);

    let all: Vec<&Position> = portfolio.positions.iter().collect();
    let total_value: Decimal = all.iter().map(|p| p.position_value()).sum();

    RiskMetrics {
        long_beta,
        short_beta,
        net_beta_exposure: long_beta - short_beta,
        long_short_ratio: if total_short_value > Decimal::ZERO {
            Some(total_long_value / total_short_value)
        } else {
            None
        },
        sector_concentration: sector_percentages(&all, total_value),
        position_concentration: position_concentration(&all, total_value),
    }
}

/// Performance statistics over the transactions inside `[start, end]`
pub fn performance_metrics(
    transactions: &[Transaction],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    annual_risk_free_rate: f64,
) -> PerformanceMetrics {
    let window: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.date >= start && t.date <= end)
        .collect();

    let realized: Vec<Decimal> = window.iter().filter_map(|t| t.realized_gain).collect();
    let realized_gains: Decimal = realized.iter().copied().sum();

    let daily_pnl = daily_pnl(&window);
    let sharpe_ratio = sharpe_ratio(&daily_pnl, annual_risk_free_rate);

    let wins: Vec<Decimal> = realized.iter().copied().filter(|g| *g > Decimal::ZERO).collect();
    let losses: Vec<Decimal> = realized.iter().copied().filter(|g| *g < Decimal::ZERO).collect();

    let win_rate = if realized.is_empty() {
        0.0
    } else {
        wins.len() as f64 / realized.len() as f64
    };

    PerformanceMetrics {
        realized_gains,
        daily_pnl,
        sharpe_ratio,
        win_rate,
        average_win: mean(&wins),
        average_loss: mean(&losses),
    }
}

fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    values.iter().copied().sum::<Decimal>() / Decimal::from(values.len())
}

fn daily_pnl(window: &[&Transaction]) -> BTreeMap<NaiveDate, Decimal> {
    let mut daily: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for transaction in window {
        if let Some(gain) = transaction.realized_gain {
            *daily.entry(transaction.date.date_naive()).or_default() += gain;
        }
    }
    daily
}

/// Annualized Sharpe over daily realized P&L, using the sample standard
/// deviation. Undefined (returned as 0) below two daily samples or with
/// zero dispersion.
fn sharpe_ratio(daily: &BTreeMap<NaiveDate, Decimal>, annual_risk_free_rate: f64) -> f64 {
    if daily.len() < 2 {
        return 0.0;
    }

    let returns: Vec<f64> = daily.values().filter_map(|d| d.to_f64()).collect();
    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();

    if std_dev == 0.0 {
        return 0.0;
    }

    let daily_risk_free = annual_risk_free_rate / TRADING_DAYS_PER_YEAR;
    (mean - daily_risk_free) / std_dev * TRADING_DAYS_PER_YEAR.sqrt()
}

fn value_weighted_beta(positions: &[&Position], total_value: Decimal) -> Decimal {
    if total_value.is_zero() {
        return Decimal::ZERO;
    }
    positions
        .iter()
        .map(|p| p.position_value() / total_value * p.beta)
        .sum()
}

fn sector_percentages(positions: &[&Position], total_value: Decimal) -> HashMap<String, Decimal> {
    let mut sectors: HashMap<String, Decimal> = HashMap::new();
    if total_value.is_zero() {
        return sectors;
    }
    for position in positions {
        *sectors.entry(position.sector.clone()).or_default() += position.position_value();
    }
    sectors
        .into_iter()
        .map(|(sector, value)| (sector, value / total_value * Decimal::ONE_HUNDRED))
        .collect()
}

fn position_concentration(positions: &[&Position], total_value: Decimal) -> PositionConcentration {
    if total_value.is_zero() {
        return PositionConcentration {
            largest_position: None,
            top_positions: Vec::new(),
        };
    }

    let mut weights: Vec<(String, Decimal)> = positions
        .iter()
        .map(|p| {
            (
                p.symbol.clone(),
                p.position_value() / total_value * Decimal::ONE_HUNDRED,
            )
        })
        .collect();
    weights.sort_by(|a, b| b.1.cmp(&a.1));

    PositionConcentration {
        largest_position: weights.first().cloned(),
        top_positions: weights.into_iter().take(TOP_POSITIONS).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::types::TransactionKind;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn position(
        symbol: &str,
        side: PositionSide,
        quantity: Decimal,
        cost: Decimal,
        price: Decimal,
        sector: &str,
        beta: Decimal,
    ) -> Position {
        Position {
            symbol: symbol.to_string(),
            side,
            quantity,
            cost_basis: cost,
            current_price: price,
            sector: sector.to_string(),
            industry: "Unknown".to_string(),
            beta,
            entry_date: Utc::now(),
            last_updated: Utc::now(),
        }
    }

    fn sample_portfolio() -> Portfolio {
        let mut portfolio = Portfolio::empty();
        portfolio.positions = vec![
            position("AAPL", PositionSide::Long, dec!(100), dec!(150), dec!(160), "Technology", dec!(1.2)),
            position("MSFT", PositionSide::Long, dec!(50), dec!(200), dec!(220), "Technology", dec!(1.1)),
            position("GME", PositionSide::Short, dec!(30), dec!(40), dec!(35), "Consumer Cyclical", dec!(2.5)),
        ];
        portfolio
    }

    fn realized(id: &str, day: u32, gain: Option<Decimal>) -> Transaction {
        Transaction {
            id: id.to_string(),
            symbol: "AAPL".to_string(),
            kind: if gain.is_some() { TransactionKind::Sell } else { TransactionKind::Buy },
            quantity: dec!(1),
            price: dec!(100),
            date: Utc.with_ymd_and_hms(2024, 3, day, 15, 30, 0).unwrap(),
            realized_gain: gain,
        }
    }

    #[test]
    fn weighted_betas_follow_position_values() {
        let metrics = portfolio_metrics(&sample_portfolio());

        // long: (16000/27000)*1.2 + (11000/27000)*1.1
        assert_eq!(metrics.long_beta.round_dp(4), dec!(1.1593));
        assert_eq!(metrics.short_beta, dec!(2.5));
        assert_eq!(metrics.net_beta_exposure.round_dp(4), dec!(-1.3407));
    }

    #[test]
    fn long_short_ratio_is_none_without_shorts() {
        let mut portfolio = sample_portfolio();
        assert_eq!(
            portfolio_metrics(&portfolio).long_short_ratio.map(|r| r.round_dp(2)),
            Some(dec!(25.71))
        );

        portfolio.positions.retain(|p| p.side == PositionSide::Long);
        assert_eq!(portfolio_metrics(&portfolio).long_short_ratio, None);
    }

    #[test]
    fn sector_concentration_spans_both_directions() {
        let metrics = portfolio_metrics(&sample_portfolio());

        // total value 28050: 27000 tech, 1050 consumer cyclical
        let tech = metrics.sector_concentration["Technology"];
        let consumer = metrics.sector_concentration["Consumer Cyclical"];
        assert_eq!(tech.round_dp(2), dec!(96.26));
        assert_eq!(consumer.round_dp(2), dec!(3.74));
        assert_eq!((tech + consumer).round_dp(6), dec!(100));
    }

    #[test]
    fn position_concentration_ranks_descending() {
        let metrics = portfolio_metrics(&sample_portfolio());
        let concentration = metrics.position_concentration;

        let (symbol, weight) = concentration.largest_position.unwrap();
        assert_eq!(symbol, "AAPL");
        assert_eq!(weight.round_dp(2), dec!(57.04));

        let symbols: Vec<&str> = concentration
            .top_positions
            .iter()
            .map(|(s, _)| s.as_str())
            .collect();
        assert_eq!(symbols, vec!["AAPL", "MSFT", "GME"]);
    }

    #[test]
    fn empty_portfolio_yields_zero_metrics() {
        let metrics = portfolio_metrics(&Portfolio::empty());
        assert_eq!(metrics.long_beta, Decimal::ZERO);
        assert_eq!(metrics.short_beta, Decimal::ZERO);
        assert_eq!(metrics.long_short_ratio, None);
        assert!(metrics.sector_concentration.is_empty());
        assert!(metrics.position_concentration.largest_position.is_none());
    }

    #[test]
    fn metadata_sector_exposure_is_per_direction() {
        let portfolio = sample_portfolio();
        let metadata = recompute_metadata(&portfolio.positions, &portfolio.transactions, Utc::now());

        assert_eq!(metadata.total_long_value, dec!(27000));
        assert_eq!(metadata.total_short_value, dec!(1050));
        assert_eq!(metadata.sector_exposure.long["Technology"], dec!(100));
        assert_eq!(metadata.sector_exposure.short["Consumer Cyclical"], dec!(100));
        assert_eq!(metadata.long_positions_count, 2);
        assert_eq!(metadata.short_positions_count, 1);
        // GME short is up 150 while the longs are up 1000 + 1000
        assert_eq!(metadata.total_unrealized_gains, dec!(2150));
    }

    #[test]
    fn metadata_recompute_is_idempotent() {
        let portfolio = sample_portfolio();
        let now = Utc::now();
        let first = recompute_metadata(&portfolio.positions, &portfolio.transactions, now);
        let second = recompute_metadata(&portfolio.positions, &portfolio.transactions, now);
        assert_eq!(first, second);
    }

    #[test]
    fn daily_pnl_omits_dates_without_realized_gains() {
        let transactions = vec![
            realized("T1", 1, Some(dec!(100))),
            realized("T2", 1, Some(dec!(-30))),
            realized("T3", 2, None),
            realized("T4", 3, Some(dec!(50))),
        ];
        let metrics = performance_metrics(
            &transactions,
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap(),
            0.02,
        );

        assert_eq!(metrics.daily_pnl.len(), 2);
        let day1 = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let day3 = NaiveDate::from_ymd_opt(2024, 3, 3).unwrap();
        assert_eq!(metrics.daily_pnl[&day1], dec!(70));
        assert_eq!(metrics.daily_pnl[&day3], dec!(50));
        assert_eq!(metrics.realized_gains, dec!(120));
    }

    #[test]
    fn sharpe_is_zero_below_two_daily_samples() {
        let transactions = vec![realized("T1", 1, Some(dec!(100)))];
        let metrics = performance_metrics(
            &transactions,
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap(),
            0.02,
        );
        assert_eq!(metrics.sharpe_ratio, 0.0);
    }

    #[test]
    fn sharpe_annualizes_daily_pnl() {
        // Two daily samples: +100 and -50, risk-free 0 for a clean check.
        // mean 25, sample stddev sqrt(11250); sharpe = 25/106.066 * sqrt(252)
        let transactions = vec![
            realized("T1", 1, Some(dec!(100))),
            realized("T2", 2, Some(dec!(-50))),
        ];
        let metrics = performance_metrics(
            &transactions,
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap(),
            0.0,
        );
        assert!((metrics.sharpe_ratio - 3.741657).abs() < 1e-4);
    }

    #[test]
    fn win_rate_and_averages_split_by_sign() {
        let transactions = vec![
            realized("T1", 1, Some(dec!(100))),
            realized("T2", 2, Some(dec!(50))),
            realized("T3", 3, Some(dec!(-30))),
            realized("T4", 4, None),
        ];
        let metrics = performance_metrics(
            &transactions,
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap(),
            0.02,
        );

        // 2 wins out of 3 realized trades; the buy does not count
        assert!((metrics.win_rate - 2.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(metrics.average_win, dec!(75));
        assert_eq!(metrics.average_loss, dec!(-30));
    }

    #[test]
    fn window_filter_is_inclusive() {
        let transactions = vec![
            realized("T1", 1, Some(dec!(10))),
            realized("T2", 15, Some(dec!(20))),
            realized("T3", 31, Some(dec!(40))),
        ];
        let metrics = performance_metrics(
            &transactions,
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 15, 23, 59, 59).unwrap(),
            0.02,
        );
        assert_eq!(metrics.realized_gains, dec!(30));
    }
}
