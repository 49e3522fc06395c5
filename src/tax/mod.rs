pub mod fifo;
pub mod report;
pub mod wash;

pub use fifo::{DisposalMatch, Ledger, Lot};
pub use report::{calculate, Disposal, TaxReport, Term};

use rust_decimal::Decimal;

/// Structural errors raised by the engine. Financial oddities (missing
/// prices, disposals exceeding recorded lots) are never errors; they are
/// surfaced as fields on the output instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("transaction {id}: amount must be positive, got {amount}")]
    InvalidAmount { id: String, amount: Decimal },
}
