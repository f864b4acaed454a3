//! Trade execution over the shared portfolio aggregate.
//!
//! All mutating operations serialize through one `RwLock`d aggregate and
//! follow the same shape: validate, fetch market data (outside the lock),
//! then mutate a working copy, persist it, and commit it back under the
//! write lock. A failed save leaves the in-memory aggregate untouched, so
//! memory and disk cannot silently diverge.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::errors::LedgerError;
use crate::quotes::provider::QuoteProvider;

use super::analytics::{self, PerformanceMetrics, RiskMetrics};
use super::storage::PortfolioStore;
use super::types::{Portfolio, Position, PositionSide, Transaction, TransactionKind};

/// Outcome of a bulk price refresh.
///
/// A partially-covered batch is not an error: symbols the provider did not
/// quote are listed in `stale` and their positions keep their previous
/// mark, while every quoted symbol was updated in one critical section.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    pub requested: usize,
    pub updated: usize,
    pub stale: Vec<String>,
}

/// Criteria for querying the transaction log
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub symbol: Option<String>,
    pub kind: Option<TransactionKind>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl HistoryFilter {
    fn matches(&self, transaction: &Transaction) -> bool {
        if let Some(symbol) = &self.symbol {
            if !transaction.symbol.eq_ignore_ascii_case(symbol) {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if transaction.kind != kind {
                return false;
            }
        }
        if let Some(start) = self.start {
            if transaction.date < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if transaction.date > end {
                return false;
            }
        }
        true
    }
}

/// Totals and counts over a filtered slice of the transaction log
#[derive(Debug, Clone, Serialize)]
pub struct TransactionSummary {
    pub total_transactions: usize,
    pub total_buys: Decimal,
    pub total_sells: Decimal,
    pub total_shorts: Decimal,
    pub total_covers: Decimal,
    pub realized_gains: Decimal,
    pub buy_count: usize,
    pub sell_count: usize,
    pub short_count: usize,
    pub cover_count: usize,
}

/// Trade execution engine owning the portfolio aggregate
pub struct Ledger {
    state: Arc<RwLock<Portfolio>>,
    quotes: Arc<dyn QuoteProvider>,
    store: PortfolioStore,
}

impl Ledger {
    /// Load the persisted aggregate and wrap it in a ledger
    pub async fn open(
        store: PortfolioStore,
        quotes: Arc<dyn QuoteProvider>,
    ) -> Result<Self, LedgerError> {
        let portfolio = store.load().await?;
        Ok(Self::with_state(portfolio, store, quotes))
    }

    /// Wrap an already-loaded aggregate
    pub fn with_state(
        portfolio: Portfolio,
        store: PortfolioStore,
        quotes: Arc<dyn QuoteProvider>,
    ) -> Self {
        Self {
            state: Arc::new(RwLock::new(portfolio)),
            quotes,
            store,
        }
    }

    /// Buy shares, opening or adding to the long position for `symbol`
    pub async fn execute_buy(
        &self,
        symbol: &str,
        quantity: Decimal,
        price: Decimal,
        date: DateTime<Utc>,
    ) -> Result<(Position, Transaction), LedgerError> {
        self.open_position(TransactionKind::Buy, symbol, quantity, price, date)
            .await
    }

    /// Sell shares out of the long position for `symbol`
    pub async fn execute_sell(
        &self,
        symbol: &str,
        quantity: Decimal,
        price: Decimal,
        date: DateTime<Utc>,
    ) -> Result<(Option<Position>, Transaction), LedgerError> {
        self.reduce_position(TransactionKind::Sell, symbol, quantity, price, date)
            .await
    }

    /// Sell short, opening or adding to the short position for `symbol`
    pub async fn execute_short(
        &self,
        symbol: &str,
        quantity: Decimal,
        price: Decimal,
        date: DateTime<Utc>,
    ) -> Result<(Position, Transaction), LedgerError> {
        self.open_position(TransactionKind::Short, symbol, quantity, price, date)
            .await
    }

    /// Buy to cover out of the short position for `symbol`
    pub async fn execute_cover(
        &self,
        symbol: &str,
        quantity: Decimal,
        price: Decimal,
        date: DateTime<Utc>,
    ) -> Result<(Option<Position>, Transaction), LedgerError> {
        self.reduce_position(TransactionKind::Cover, symbol, quantity, price, date)
            .await
    }

    /// Shared path for buy/short: weighted-average the cost basis into an
    /// existing same-direction position or create a fresh one
    async fn open_position(
        &self,
        kind: TransactionKind,
        symbol: &str,
        quantity: Decimal,
        price: Decimal,
        date: DateTime<Utc>,
    ) -> Result<(Position, Transaction), LedgerError> {
        let symbol = normalize_symbol(symbol)?;
        validate_positive("quantity", quantity)?;
        validate_positive("price", price)?;
        let side = kind.side();

        // Quote first: a position that cannot be priced must fail before
        // any mutation
        let quote = self
            .quotes
            .get_stock_info(&symbol)
            .await
            .map_err(|source| LedgerError::QuoteUnavailable {
                symbol: symbol.clone(),
                source,
            })?;
        validate_beta(quote.beta)?;

        let now = Utc::now();
        let mut portfolio = self.state.write().await;
        let mut working = portfolio.clone();

        let transaction = Transaction {
            id: working.next_transaction_id(),
            symbol: symbol.clone(),
            kind,
            quantity,
            price,
            date,
            realized_gain: None,
        };

        let position = match working.position_mut(&symbol, side) {
            Some(existing) => {
                let new_quantity = existing.quantity + quantity;
                existing.cost_basis =
                    (existing.quantity * existing.cost_basis + quantity * price) / new_quantity;
                existing.quantity = new_quantity;
                existing.update_price(quote.price, now);
                existing.clone()
            }
            None => {
                let created = Position {
                    symbol: symbol.clone(),
                    side,
                    quantity,
                    cost_basis: price,
                    current_price: quote.price,
                    sector: quote.sector,
                    industry: quote.industry,
                    beta: quote.beta,
                    entry_date: date,
                    last_updated: now,
                };
                working.positions.push(created.clone());
                created
            }
        };

        working.transactions.push(transaction.clone());
        working.metadata =
            analytics::recompute_metadata(&working.positions, &working.transactions, now);

        self.store.save(&working).await?;
        *portfolio = working;

        info!(
            %symbol,
            kind = %kind,
            %quantity,
            %price,
            cost_basis = %position.cost_basis,
            "Executed trade"
        );

        Ok((position, transaction))
    }

    /// Shared path for sell/cover: realize gains against cost basis and
    /// shrink or close the position
    async fn reduce_position(
        &self,
        kind: TransactionKind,
        symbol: &str,
        quantity: Decimal,
        price: Decimal,
        date: DateTime<Utc>,
    ) -> Result<(Option<Position>, Transaction), LedgerError> {
        let symbol = normalize_symbol(symbol)?;
        validate_positive("quantity", quantity)?;
        validate_positive("price", price)?;
        let side = kind.side();

        let now = Utc::now();
        let mut portfolio = self.state.write().await;
        let mut working = portfolio.clone();

        let (held, cost_basis) = match working.position(&symbol, side) {
            Some(position) => (position.quantity, position.cost_basis),
            None => {
                return Err(LedgerError::PositionNotFound {
                    symbol: symbol.clone(),
                    side,
                })
            }
        };
        if held < quantity {
            return Err(LedgerError::InsufficientShares {
                symbol: symbol.clone(),
                requested: quantity,
                held,
            });
        }

        // Long realizes on the way up, short on the way down
        let realized_gain = match side {
            PositionSide::Long => (price - cost_basis) * quantity,
            PositionSide::Short => (cost_basis - price) * quantity,
        };

        let transaction = Transaction {
            id: working.next_transaction_id(),
            symbol: symbol.clone(),
            kind,
            quantity,
            price,
            date,
            realized_gain: Some(realized_gain),
        };

        let remaining = if held == quantity {
            working.remove_position(&symbol, side);
            None
        } else {
            working.position_mut(&symbol, side).map(|position| {
                position.quantity -= quantity;
                position.last_updated = now;
                position.clone()
            })
        };

        working.transactions.push(transaction.clone());
        working.metadata =
            analytics::recompute_metadata(&working.positions, &working.transactions, now);

        self.store.save(&working).await?;
        *portfolio = working;

        info!(
            %symbol,
            kind = %kind,
            %quantity,
            %price,
            %realized_gain,
            closed = remaining.is_none(),
            "Executed trade"
        );

        Ok((remaining, transaction))
    }

    /// Refresh the mark on every open position from one batched quote call.
    ///
    /// Symbols missing from the provider's response keep their previous
    /// price and are reported in the returned [`RefreshReport`]; only a
    /// failure of the whole batch call is an error.
    pub async fn refresh_prices(&self) -> Result<RefreshReport, LedgerError> {
        let symbols: Vec<String> = {
            let portfolio = self.state.read().await;
            let unique: HashSet<String> =
                portfolio.positions.iter().map(|p| p.symbol.clone()).collect();
            let mut symbols: Vec<String> = unique.into_iter().collect();
            symbols.sort();
            symbols
        };

        if symbols.is_empty() {
            return Ok(RefreshReport {
                requested: 0,
                updated: 0,
                stale: Vec::new(),
            });
        }

        // Network round trip happens with no lock held
        let quotes = self
            .quotes
            .get_batch_quotes(&symbols)
            .await
            .map_err(LedgerError::BatchQuoteFailure)?;

        let now = Utc::now();
        let mut portfolio = self.state.write().await;
        let mut working = portfolio.clone();

        let mut updated_symbols: HashSet<&str> = HashSet::new();
        for position in working.positions.iter_mut() {
            if let Some(price) = quotes.get(&position.symbol) {
                position.update_price(*price, now);
            }
        }
        for symbol in &symbols {
            if quotes.contains_key(symbol) {
                updated_symbols.insert(symbol);
            }
        }

        let stale: Vec<String> = symbols
            .iter()
            .filter(|s| !updated_symbols.contains(s.as_str()))
            .cloned()
            .collect();

        working.metadata =
            analytics::recompute_metadata(&working.positions, &working.transactions, now);

        self.store.save(&working).await?;
        *portfolio = working;

        let report = RefreshReport {
            requested: symbols.len(),
            updated: updated_symbols.len(),
            stale,
        };

        if report.stale.is_empty() {
            info!(updated = report.updated, "Refreshed all position prices");
        } else {
            warn!(
                updated = report.updated,
                requested = report.requested,
                stale = ?report.stale,
                "Partial price refresh"
            );
        }

        Ok(report)
    }

    /// Consistent snapshot of the aggregate
    pub async fn state(&self) -> Portfolio {
        self.state.read().await.clone()
    }

    /// Beta exposure and concentration over the current positions
    pub async fn risk_metrics(&self) -> RiskMetrics {
        let portfolio = self.state.read().await;
        analytics::portfolio_metrics(&portfolio)
    }

    /// Performance statistics over the transaction window
    pub async fn performance_metrics(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        annual_risk_free_rate: f64,
    ) -> PerformanceMetrics {
        let portfolio = self.state.read().await;
        analytics::performance_metrics(&portfolio.transactions, start, end, annual_risk_free_rate)
    }

    /// Filtered transaction history, most recent first
    pub async fn history(&self, filter: &HistoryFilter) -> Vec<Transaction> {
        let portfolio = self.state.read().await;
        let mut transactions: Vec<Transaction> = portfolio
            .transactions
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        transactions.sort_by(|a, b| b.date.cmp(&a.date));
        transactions
    }

    /// Totals and counts over the filtered history
    pub async fn transaction_summary(&self, filter: &HistoryFilter) -> TransactionSummary {
        let transactions = self.history(filter).await;

        let total_for = |kind: TransactionKind| -> Decimal {
            transactions
                .iter()
                .filter(|t| t.kind == kind)
                .map(Transaction::total_value)
                .sum()
        };
        let count_for = |kind: TransactionKind| -> usize {
            transactions.iter().filter(|t| t.kind == kind).count()
        };

        TransactionSummary {
            total_transactions: transactions.len(),
            total_buys: total_for(TransactionKind::Buy),
            total_sells: total_for(TransactionKind::Sell),
            total_shorts: total_for(TransactionKind::Short),
            total_covers: total_for(TransactionKind::Cover),
            realized_gains: transactions.iter().filter_map(|t| t.realized_gain).sum(),
            buy_count: count_for(TransactionKind::Buy),
            sell_count: count_for(TransactionKind::Sell),
            short_count: count_for(TransactionKind::Short),
            cover_count: count_for(TransactionKind::Cover),
        }
    }

    /// Write an integrity-hashed snapshot of the aggregate
    pub async fn create_snapshot(&self) -> Result<String, LedgerError> {
        let portfolio = self.state.read().await;
        Ok(self.store.save_snapshot(&portfolio).await?)
    }

    /// Remove old snapshots, keeping the newest `keep`
    pub async fn prune_snapshots(&self, keep: usize) -> Result<usize, LedgerError> {
        Ok(self.store.prune_snapshots(keep).await?)
    }
}

fn normalize_symbol(symbol: &str) -> Result<String, LedgerError> {
    let trimmed = symbol.trim();
    let valid = !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    if !valid {
        return Err(LedgerError::InvalidInput {
            field: "symbol",
            reason: format!("'{symbol}' is not a valid ticker symbol"),
        });
    }
    Ok(trimmed.to_ascii_uppercase())
}

fn validate_positive(field: &'static str, value: Decimal) -> Result<(), LedgerError> {
    if value <= Decimal::ZERO {
        return Err(LedgerError::InvalidInput {
            field,
            reason: format!("{value} is not positive"),
        });
    }
    Ok(())
}

// Beta outside this range indicates bad provider data, not a real stock
fn validate_beta(beta: Decimal) -> Result<(), LedgerError> {
    if beta < Decimal::NEGATIVE_ONE || beta > Decimal::from(5) {
        return Err(LedgerError::InvalidInput {
            field: "beta",
            reason: format!("{beta} is outside the accepted range [-1, 5]"),
        });
    }
    Ok(())
}
