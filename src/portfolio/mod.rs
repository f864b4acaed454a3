//! Portfolio ledger, analytics, and persistence
//!
//! The aggregate (positions + transactions + derived metadata) is owned by
//! the [`ledger::Ledger`]; the [`service`] actor serializes application
//! access to it and [`analytics`] derives read-only metrics from it.

pub mod analytics;
pub mod display;
pub mod ledger;
pub mod service;
pub mod storage;
pub mod types;

pub use analytics::{PerformanceMetrics, RiskMetrics};
pub use ledger::{HistoryFilter, Ledger, RefreshReport};
pub use service::{start_portfolio_service, PortfolioHandle};
pub use storage::PortfolioStore;
pub use types::{Portfolio, Position, PositionSide, Transaction, TransactionKind};
