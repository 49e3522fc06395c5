//! Wash-sale detection and the replacement-lot basis adjustment.
//!
//! A loss is disallowed when substantially identical property was acquired
//! within 30 days either side of the disposal. The disallowed amount rolls
//! into the cost basis of the replacement position instead of being
//! deducted.

use crate::tax::fifo::Ledger;
use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;

/// Days on each side of the sale date, boundaries inclusive
const WASH_SALE_WINDOW_DAYS: i64 = 30;

/// Whether a disposal's loss is disallowed under the wash-sale rule.
///
/// Gains are never flagged. Only the token's current post-disposal queue
/// is inspected: lots fully consumed by the disposal itself are already
/// gone, so the scan sees remaining or newer acquisitions only. That is
/// the replacement-shares test, not a historical one, and keeping it that
/// way is a deliberate compatibility choice.
pub fn is_wash_sale(
    ledger: &Ledger,
    token: &str,
    sale_date: NaiveDateTime,
    gain_loss: Decimal,
) -> bool {
    if gain_loss >= Decimal::ZERO {
        return false;
    }

    let window_start = sale_date - Duration::days(WASH_SALE_WINDOW_DAYS);
    let window_end = sale_date + Duration::days(WASH_SALE_WINDOW_DAYS);

    ledger.lots(token).any(|lot| {
        lot.date >= window_start && lot.date <= window_end && lot.date != sale_date
    })
}

/// Add the full disallowed loss to the most recently added lot still in
/// the token's queue, raising the future cost basis of that replacement
/// position. With no lot left there is nothing to adjust; the loss stays
/// disallowed regardless.
pub fn adjust_replacement_basis(ledger: &mut Ledger, token: &str, disallowed_loss: Decimal) {
    match ledger.last_lot_mut(token) {
        Some(lot) => {
            lot.cost_basis += disallowed_loss;
            log::debug!(
                "Wash sale {}: added {} to basis of lot {}, now {}",
                token,
                disallowed_loss,
                lot.source_id,
                lot.cost_basis
            );
        }
        None => {
            log::debug!(
                "Wash sale {}: no replacement lot to absorb disallowed loss of {}",
                token,
                disallowed_loss
            );
        }
    }
}
