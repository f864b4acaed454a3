//! Domain error taxonomy for ledger operations.
//!
//! Every failure a caller can act on is a distinct variant carrying enough
//! context (symbol, requested vs. held quantity) to render a useful
//! message. Component-level errors (`QuoteError`, `StorageError`) stay
//! typed at their own boundaries and are wrapped here.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::portfolio::storage::StorageError;
use crate::portfolio::types::PositionSide;
use crate::quotes::provider::QuoteError;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Request failed validation before touching the aggregate
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// Sell or cover exceeding the held quantity; nothing was mutated
    #[error("insufficient shares for {symbol}: requested {requested}, held {held}")]
    InsufficientShares {
        symbol: String,
        requested: Decimal,
        held: Decimal,
    },

    /// Sell/cover with no matching open position
    #[error("no {side} position found for {symbol}")]
    PositionNotFound { symbol: String, side: PositionSide },

    /// Quote collaborator failure while pricing a single symbol; fatal to
    /// the buy/short that needed it
    #[error("quote unavailable for {symbol}")]
    QuoteUnavailable {
        symbol: String,
        #[source]
        source: QuoteError,
    },

    /// The entire batched quote call failed during a price refresh.
    /// Distinct from a partial batch, which is not an error (see
    /// [`crate::portfolio::ledger::RefreshReport`]).
    #[error("batch quote refresh failed")]
    BatchQuoteFailure(#[source] QuoteError),

    /// Saving the aggregate failed; the in-memory state was rolled back
    #[error("failed to persist portfolio")]
    Persistence(#[from] StorageError),
}
