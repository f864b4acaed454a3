//! Portfolio service actor with channel-based communication
//!
//! The service owns the ledger and serializes every application-level
//! operation through a command channel; callers hold a cheap cloneable
//! handle and await oneshot replies. This keeps lock usage inside the
//! ledger an implementation detail.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::info;

use crate::errors::LedgerError;
use crate::quotes::provider::QuoteProvider;

use super::analytics::{PerformanceMetrics, RiskMetrics};
use super::ledger::{HistoryFilter, Ledger, RefreshReport, TransactionSummary};
use super::storage::PortfolioStore;
use super::types::{Portfolio, Position, Transaction};

const COMMAND_BUFFER: usize = 100;

type TradeReply = Result<(Position, Transaction), LedgerError>;
type ReduceReply = Result<(Option<Position>, Transaction), LedgerError>;

/// Portfolio service commands
#[derive(Debug)]
pub enum PortfolioCommand {
    Buy {
        symbol: String,
        quantity: Decimal,
        price: Decimal,
        date: DateTime<Utc>,
        response: oneshot::Sender<TradeReply>,
    },
    Sell {
        symbol: String,
        quantity: Decimal,
        price: Decimal,
        date: DateTime<Utc>,
        response: oneshot::Sender<ReduceReply>,
    },
    Short {
        symbol: String,
        quantity: Decimal,
        price: Decimal,
        date: DateTime<Utc>,
        response: oneshot::Sender<TradeReply>,
    },
    Cover {
        symbol: String,
        quantity: Decimal,
        price: Decimal,
        date: DateTime<Utc>,
        response: oneshot::Sender<ReduceReply>,
    },
    RefreshPrices {
        response: oneshot::Sender<Result<RefreshReport, LedgerError>>,
    },
    GetState {
        response: oneshot::Sender<Portfolio>,
    },
    GetRiskMetrics {
        response: oneshot::Sender<RiskMetrics>,
    },
    GetPerformance {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        response: oneshot::Sender<PerformanceMetrics>,
    },
    GetHistory {
        filter: HistoryFilter,
        response: oneshot::Sender<Vec<Transaction>>,
    },
    GetTransactionSummary {
        filter: HistoryFilter,
        response: oneshot::Sender<TransactionSummary>,
    },
    CreateSnapshot {
        keep: usize,
        response: oneshot::Sender<Result<String, LedgerError>>,
    },
}

/// Portfolio service actor
pub struct PortfolioService {
    ledger: Ledger,
    annual_risk_free_rate: f64,
    command_rx: mpsc::Receiver<PortfolioCommand>,
}

impl PortfolioService {
    pub fn new(
        ledger: Ledger,
        annual_risk_free_rate: f64,
        command_rx: mpsc::Receiver<PortfolioCommand>,
    ) -> Self {
        Self {
            ledger,
            annual_risk_free_rate,
            command_rx,
        }
    }

    /// Run the actor until every handle is dropped
    pub async fn run(mut self) {
        info!("Portfolio service started");

        while let Some(command) = self.command_rx.recv().await {
            self.handle_command(command).await;
        }

        info!("Command channel closed, stopping portfolio service");
    }

    async fn handle_command(&mut self, command: PortfolioCommand) {
        match command {
            PortfolioCommand::Buy {
                symbol,
                quantity,
                price,
                date,
                response,
            } => {
                let result = self.ledger.execute_buy(&symbol, quantity, price, date).await;
                let _ = response.send(result);
            }
            PortfolioCommand::Sell {
                symbol,
                quantity,
                price,
                date,
                response,
            } => {
                let result = self.ledger.execute_sell(&symbol, quantity, price, date).await;
                let _ = response.send(result);
            }
            PortfolioCommand::Short {
                symbol,
                quantity,
                price,
                date,
                response,
            } => {
                let result = self.ledger.execute_short(&symbol, quantity, price, date).await;
                let _ = response.send(result);
            }
            PortfolioCommand::Cover {
                symbol,
                quantity,
                price,
                date,
                response,
            } => {
                let result = self.ledger.execute_cover(&symbol, quantity, price, date).await;
                let _ = response.send(result);
            }
            PortfolioCommand::RefreshPrices { response } => {
                let _ = response.send(self.ledger.refresh_prices().await);
            }
            PortfolioCommand::GetState { response } => {
                let _ = response.send(self.ledger.state().await);
            }
            PortfolioCommand::GetRiskMetrics { response } => {
                let _ = response.send(self.ledger.risk_metrics().await);
            }
            PortfolioCommand::GetPerformance {
                start,
                end,
                response,
            } => {
                let metrics = self
                    .ledger
                    .performance_metrics(start, end, self.annual_risk_free_rate)
                    .await;
                let _ = response.send(metrics);
            }
            PortfolioCommand::GetHistory { filter, response } => {
                let _ = response.send(self.ledger.history(&filter).await);
            }
            PortfolioCommand::GetTransactionSummary { filter, response } => {
                let _ = response.send(self.ledger.transaction_summary(&filter).await);
            }
            PortfolioCommand::CreateSnapshot { keep, response } => {
                let result = match self.ledger.create_snapshot().await {
                    Ok(filename) => match self.ledger.prune_snapshots(keep).await {
                        Ok(_) => Ok(filename),
                        Err(e) => Err(e),
                    },
                    Err(e) => Err(e),
                };
                let _ = response.send(result);
            }
        }
    }
}

/// Portfolio service handle for sending commands
#[derive(Clone)]
pub struct PortfolioHandle {
    command_tx: mpsc::Sender<PortfolioCommand>,
}

impl PortfolioHandle {
    pub fn new(command_tx: mpsc::Sender<PortfolioCommand>) -> Self {
        Self { command_tx }
    }

    pub async fn buy(
        &self,
        symbol: String,
        quantity: Decimal,
        price: Decimal,
        date: DateTime<Utc>,
    ) -> anyhow::Result<(Position, Transaction)> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(PortfolioCommand::Buy {
                symbol,
                quantity,
                price,
                date,
                response: tx,
            })
            .await?;
        Ok(rx.await??)
    }

    pub async fn sell(
        &self,
        symbol: String,
        quantity: Decimal,
        price: Decimal,
        date: DateTime<Utc>,
    ) -> anyhow::Result<(Option<Position>, Transaction)> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(PortfolioCommand::Sell {
                symbol,
                quantity,
                price,
                date,
                response: tx,
            })
            .await?;
        Ok(rx.await??)
    }

    pub async fn short(
        &self,
        symbol: String,
        quantity: Decimal,
        price: Decimal,
        date: DateTime<Utc>,
    ) -> anyhow::Result<(Position, Transaction)> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(PortfolioCommand::Short {
                symbol,
                quantity,
                price,
                date,
                response: tx,
            })
            .await?;
        Ok(rx.await??)
    }

    pub async fn cover(
        &self,
        symbol: String,
        quantity: Decimal,
        price: Decimal,
        date: DateTime<Utc>,
    ) -> anyhow::Result<(Option<Position>, Transaction)> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(PortfolioCommand::Cover {
                symbol,
                quantity,
                price,
                date,
                response: tx,
            })
            .await?;
        Ok(rx.await??)
    }

    pub async fn refresh_prices(&self) -> anyhow::Result<RefreshReport> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(PortfolioCommand::RefreshPrices { response: tx })
            .await?;
        Ok(rx.await??)
    }

    pub async fn state(&self) -> anyhow::Result<Portfolio> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(PortfolioCommand::GetState { response: tx })
            .await?;
        Ok(rx.await?)
    }

    pub async fn risk_metrics(&self) -> anyhow::Result<RiskMetrics> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(PortfolioCommand::GetRiskMetrics { response: tx })
            .await?;
        Ok(rx.await?)
    }

    pub async fn performance(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<PerformanceMetrics> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(PortfolioCommand::GetPerformance {
                start,
                end,
                response: tx,
            })
            .await?;
        Ok(rx.await?)
    }

    pub async fn history(&self, filter: HistoryFilter) -> anyhow::Result<Vec<Transaction>> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(PortfolioCommand::GetHistory {
                filter,
                response: tx,
            })
            .await?;
        Ok(rx.await?)
    }

    pub async fn transaction_summary(
        &self,
        filter: HistoryFilter,
    ) -> anyhow::Result<TransactionSummary> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(PortfolioCommand::GetTransactionSummary {
                filter,
                response: tx,
            })
            .await?;
        Ok(rx.await?)
    }

    pub async fn create_snapshot(&self, keep: usize) -> anyhow::Result<String> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(PortfolioCommand::CreateSnapshot { keep, response: tx })
            .await?;
        Ok(rx.await??)
    }
}

/// Start the portfolio service and return a handle to it
pub async fn start_portfolio_service(
    store: PortfolioStore,
    quotes: Arc<dyn QuoteProvider>,
    annual_risk_free_rate: f64,
) -> anyhow::Result<PortfolioHandle> {
    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let handle = PortfolioHandle::new(command_tx);

    let ledger = Ledger::open(store, quotes).await?;
    let service = PortfolioService::new(ledger, annual_risk_free_rate, command_rx);

    tokio::spawn(async move {
        service.run().await;
    });

    Ok(handle)
}
