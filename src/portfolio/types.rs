//! Core entity types for the portfolio ledger with strong typing
//!
//! All money and quantity fields are `rust_decimal::Decimal` and serialize
//! as decimal strings, matching the persisted JSON shape. Rounding happens
//! only at display boundaries, never here.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Position side (long/short)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionSide::Long => "long",
            PositionSide::Short => "short",
        }
    }

    /// Sign applied to directional gains: shorts profit when price falls
    fn gain_multiplier(&self) -> Decimal {
        match self {
            PositionSide::Long => Decimal::ONE,
            PositionSide::Short => Decimal::NEGATIVE_ONE,
        }
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of trade event recorded in the transaction log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Buy,
    Sell,
    Short,
    Cover,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Buy => "buy",
            TransactionKind::Sell => "sell",
            TransactionKind::Short => "short",
            TransactionKind::Cover => "cover",
        }
    }

    /// Sell and cover lock in gains against cost basis
    pub fn realizes_gains(&self) -> bool {
        matches!(self, TransactionKind::Sell | TransactionKind::Cover)
    }

    /// The position side this kind of trade acts on
    pub fn side(&self) -> PositionSide {
        match self {
            TransactionKind::Buy | TransactionKind::Sell => PositionSide::Long,
            TransactionKind::Short | TransactionKind::Cover => PositionSide::Short,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "buy" => Ok(TransactionKind::Buy),
            "sell" => Ok(TransactionKind::Sell),
            "short" => Ok(TransactionKind::Short),
            "cover" => Ok(TransactionKind::Cover),
            other => Err(format!(
                "unknown transaction kind '{other}' (expected buy, sell, short, or cover)"
            )),
        }
    }
}

/// A single long or short holding in one symbol.
///
/// Identity is `(symbol, side)`: at most one position exists per pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: PositionSide,
    /// Number of shares held (or sold short); always positive
    pub quantity: Decimal,
    /// Quantity-weighted average price paid (long) or received (short)
    pub cost_basis: Decimal,
    pub current_price: Decimal,
    pub sector: String,
    pub industry: String,
    pub beta: Decimal,
    pub entry_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Position {
    /// Unsigned market value of the holding
    pub fn position_value(&self) -> Decimal {
        (self.quantity * self.current_price).abs()
    }

    /// Mark-to-market gain against cost basis, sign flipped for shorts
    pub fn unrealized_gain(&self) -> Decimal {
        self.side.gain_multiplier() * (self.current_price - self.cost_basis) * self.quantity
    }

    /// Percent move of the mark against cost basis, direction-adjusted
    pub fn percent_change(&self) -> Decimal {
        if self.cost_basis.is_zero() {
            return Decimal::ZERO;
        }
        self.side.gain_multiplier() * (self.current_price - self.cost_basis) / self.cost_basis
            * Decimal::ONE_HUNDRED
    }

    /// Update the mark and touch the freshness stamp
    pub fn update_price(&mut self, price: Decimal, now: DateTime<Utc>) {
        self.current_price = price;
        self.last_updated = now;
    }
}

/// An immutable record of one trade event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sequential id of the form "T{n}"
    pub id: String,
    pub symbol: String,
    pub kind: TransactionKind,
    pub quantity: Decimal,
    pub price: Decimal,
    pub date: DateTime<Utc>,
    /// Present only for sell/cover
    pub realized_gain: Option<Decimal>,
}

impl Transaction {
    pub fn total_value(&self) -> Decimal {
        self.quantity * self.price
    }
}

/// Sector exposure percentages, per direction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorExposure {
    pub long: HashMap<String, Decimal>,
    pub short: HashMap<String, Decimal>,
}

/// Derived snapshot of aggregate state.
///
/// Never the source of truth: always reproducible from positions +
/// transactions via [`crate::portfolio::analytics::recompute_metadata`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioMetadata {
    pub total_long_value: Decimal,
    pub total_short_value: Decimal,
    /// None when the portfolio holds no short value; serialized as "N/A"
    #[serde(with = "ratio_sentinel")]
    pub long_short_ratio: Option<Decimal>,
    pub total_realized_gains: Decimal,
    pub total_unrealized_gains: Decimal,
    pub long_positions_count: usize,
    pub short_positions_count: usize,
    pub sector_exposure: SectorExposure,
    pub weighted_long_beta: Decimal,
    pub weighted_short_beta: Decimal,
    pub last_updated: DateTime<Utc>,
}

impl PortfolioMetadata {
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            total_long_value: Decimal::ZERO,
            total_short_value: Decimal::ZERO,
            long_short_ratio: None,
            total_realized_gains: Decimal::ZERO,
            total_unrealized_gains: Decimal::ZERO,
            long_positions_count: 0,
            short_positions_count: 0,
            sector_exposure: SectorExposure::default(),
            weighted_long_beta: Decimal::ZERO,
            weighted_short_beta: Decimal::ZERO,
            last_updated: now,
        }
    }
}

/// The single logical portfolio: open positions plus the full trade log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    pub positions: Vec<Position>,
    pub transactions: Vec<Transaction>,
    pub metadata: PortfolioMetadata,
}

impl Portfolio {
    pub fn empty() -> Self {
        Self {
            positions: Vec::new(),
            transactions: Vec::new(),
            metadata: PortfolioMetadata::empty(Utc::now()),
        }
    }

    pub fn position(&self, symbol: &str, side: PositionSide) -> Option<&Position> {
        self.positions
            .iter()
            .find(|p| p.symbol == symbol && p.side == side)
    }

    pub fn position_mut(&mut self, symbol: &str, side: PositionSide) -> Option<&mut Position> {
        self.positions
            .iter_mut()
            .find(|p| p.symbol == symbol && p.side == side)
    }

    pub fn remove_position(&mut self, symbol: &str, side: PositionSide) -> Option<Position> {
        let index = self
            .positions
            .iter()
            .position(|p| p.symbol == symbol && p.side == side)?;
        Some(self.positions.remove(index))
    }

    pub fn positions_by_side(&self, side: PositionSide) -> impl Iterator<Item = &Position> {
        self.positions.iter().filter(move |p| p.side == side)
    }

    /// Next sequential transaction id, derived from the log so that the
    /// sequence survives reload
    pub fn next_transaction_id(&self) -> String {
        let max = self
            .transactions
            .iter()
            .filter_map(|t| t.id.strip_prefix('T'))
            .filter_map(|n| n.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        format!("T{}", max + 1)
    }

    /// Running realized-gain total for one symbol across the trade log
    pub fn running_realized_gain(&self, symbol: &str) -> Decimal {
        self.transactions
            .iter()
            .filter(|t| t.symbol == symbol)
            .filter_map(|t| t.realized_gain)
            .sum()
    }
}

/// Serializes the long/short ratio as a decimal string, with the literal
/// "N/A" standing in when the ratio is undefined.
pub(crate) mod ratio_sentinel {
    use rust_decimal::Decimal;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Decimal>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ratio) => serializer.serialize_str(&ratio.to_string()),
            None => serializer.serialize_str("N/A"),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Decimal>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == "N/A" {
            return Ok(None);
        }
        raw.parse().map(Some).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn long_position(symbol: &str, quantity: Decimal, cost: Decimal, price: Decimal) -> Position {
        Position {
            symbol: symbol.to_string(),
            side: PositionSide::Long,
            quantity,
            cost_basis: cost,
            current_price: price,
            sector: "Technology".to_string(),
            industry: "Software".to_string(),
            beta: dec!(1.1),
            entry_date: Utc::now(),
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn long_unrealized_gain_follows_price() {
        let position = long_position("AAPL", dec!(100), dec!(150), dec!(160));
        assert_eq!(position.position_value(), dec!(16000));
        assert_eq!(position.unrealized_gain(), dec!(1000));
        assert_eq!(position.percent_change().round_dp(2), dec!(6.67));
    }

    #[test]
    fn short_gain_sign_is_inverted() {
        let mut position = long_position("GME", dec!(30), dec!(40), dec!(35));
        position.side = PositionSide::Short;

        // Price fell below the short basis: the position is up
        assert_eq!(position.unrealized_gain(), dec!(150));
        assert_eq!(position.percent_change(), dec!(12.5));

        position.update_price(dec!(45), Utc::now());
        assert_eq!(position.unrealized_gain(), dec!(-150));
    }

    #[test]
    fn transaction_kind_round_trips_strings() {
        for kind in [
            TransactionKind::Buy,
            TransactionKind::Sell,
            TransactionKind::Short,
            TransactionKind::Cover,
        ] {
            assert_eq!(kind.as_str().parse::<TransactionKind>().unwrap(), kind);
        }
        assert!("hold".parse::<TransactionKind>().is_err());
    }

    #[test]
    fn transaction_ids_are_sequential_and_survive_gaps() {
        let mut portfolio = Portfolio::empty();
        assert_eq!(portfolio.next_transaction_id(), "T1");

        portfolio.transactions.push(Transaction {
            id: "T7".to_string(),
            symbol: "AAPL".to_string(),
            kind: TransactionKind::Buy,
            quantity: dec!(10),
            price: dec!(100),
            date: Utc::now(),
            realized_gain: None,
        });
        assert_eq!(portfolio.next_transaction_id(), "T8");
    }

    #[test]
    fn decimals_serialize_as_strings() {
        let position = long_position("AAPL", dec!(100), dec!(156.6666), dec!(160));
        let json = serde_json::to_value(&position).unwrap();

        assert_eq!(json["quantity"], "100");
        assert_eq!(json["cost_basis"], "156.6666");
        assert_eq!(json["side"], "long");
    }

    #[test]
    fn ratio_sentinel_round_trips() {
        let mut metadata = PortfolioMetadata::empty(Utc::now());
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["long_short_ratio"], "N/A");

        metadata.long_short_ratio = Some(dec!(2.5));
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["long_short_ratio"], "2.5");

        let back: PortfolioMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(back.long_short_ratio, Some(dec!(2.5)));
    }

    #[test]
    fn running_realized_gain_sums_one_symbol() {
        let mut portfolio = Portfolio::empty();
        for (id, symbol, gain) in [
            ("T1", "AAPL", Some(dec!(100))),
            ("T2", "AAPL", Some(dec!(-40))),
            ("T3", "MSFT", Some(dec!(999))),
            ("T4", "AAPL", None),
        ] {
            portfolio.transactions.push(Transaction {
                id: id.to_string(),
                symbol: symbol.to_string(),
                kind: TransactionKind::Sell,
                quantity: dec!(1),
                price: dec!(1),
                date: Utc::now(),
                realized_gain: gain,
            });
        }
        assert_eq!(portfolio.running_realized_gain("AAPL"), dec!(60));
    }
}
