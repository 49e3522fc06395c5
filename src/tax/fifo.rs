use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};

/// Holding periods of 365 days or less are short-term
const LONG_TERM_THRESHOLD_DAYS: i64 = 365;

/// A single acquisition lot awaiting disposal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lot {
    pub amount: Decimal,
    /// Total USD cost of the whole lot, not per unit
    pub cost_basis: Decimal,
    pub date: NaiveDateTime,
    /// Id of the transaction that created the lot
    pub source_id: String,
}

/// Per-token FIFO queues of cost-basis lots, oldest at the front.
///
/// A fresh ledger is built for every calculation run, so the engine stays
/// reentrant; there is no state shared between runs.
#[derive(Debug, Default)]
pub struct Ledger {
    queues: HashMap<String, VecDeque<Lot>>,
}

/// Result of matching a disposal against the ledger
#[derive(Debug)]
pub struct DisposalMatch {
    /// Blended USD cost basis of everything consumed
    pub cost_basis: Decimal,
    /// Long-term only when every consumed lot was held more than 365 days
    pub long_term: bool,
    /// Units the queue could not supply
    pub shortfall: Decimal,
    /// Lots (or slices of lots) consumed, oldest first
    pub consumed: Vec<Lot>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an acquisition lot to the token's queue, creating the queue
    /// if absent. Callers validate `amount > 0` before lots get here.
    pub fn add_lot(
        &mut self,
        token: &str,
        amount: Decimal,
        cost_basis: Decimal,
        date: NaiveDateTime,
        source_id: &str,
    ) {
        log::debug!(
            "Ledger {} ADD: amount={}, cost={}, date={}",
            token,
            amount,
            cost_basis,
            date
        );
        self.queues.entry(token.to_string()).or_default().push_back(Lot {
            amount,
            cost_basis,
            date,
            source_id: source_id.to_string(),
        });
    }

    /// Read access to a token's lots, oldest first
    pub fn lots(&self, token: &str) -> impl Iterator<Item = &Lot> {
        self.queues.get(token).into_iter().flatten()
    }

    /// The most recently added lot still in the token's queue
    pub fn last_lot_mut(&mut self, token: &str) -> Option<&mut Lot> {
        self.queues.get_mut(token).and_then(|q| q.back_mut())
    }

    /// Match a disposal against the oldest lots first.
    ///
    /// Whole lots are removed from the queue; a lot larger than what is
    /// still needed is split, with the front lot's amount and cost basis
    /// shrunk in place by the consumed proportion. If the queue runs out
    /// before the disposal is satisfied, the unfilled remainder comes back
    /// as `shortfall` with whatever cost basis was accumulated; that is
    /// bad upstream data, not a fault.
    pub fn consume(
        &mut self,
        token: &str,
        amount: Decimal,
        sale_date: NaiveDateTime,
    ) -> DisposalMatch {
        let queue = self.queues.entry(token.to_string()).or_default();
        let mut remaining = amount;
        let mut total_cost_basis = Decimal::ZERO;
        let mut long_term = true;
        let mut consumed = Vec::new();

        while remaining > Decimal::ZERO {
            let Some(front) = queue.front_mut() else {
                break;
            };

            // One lot held 365 days or less makes the whole disposal
            // short-term
            let days_held = (sale_date - front.date).num_days();
            if days_held <= LONG_TERM_THRESHOLD_DAYS {
                long_term = false;
            }

            if front.amount <= remaining {
                // Consume the entire lot
                total_cost_basis += front.cost_basis;
                remaining -= front.amount;
                let lot = queue.pop_front().expect("front lot exists");
                log::debug!(
                    "Ledger {} CONSUME ALL of lot {}: amount={}, cost={}",
                    token,
                    lot.source_id,
                    lot.amount,
                    lot.cost_basis
                );
                consumed.push(lot);
            } else {
                // Split the front lot proportionally; it stays at the front
                let ratio = remaining / front.amount;
                let slice_cost = front.cost_basis * ratio;
                total_cost_basis += slice_cost;
                front.amount -= remaining;
                front.cost_basis -= slice_cost;
                log::debug!(
                    "Ledger {} CONSUME PART of lot {}: amount={}, cost={}. Lot remaining: amount={}, cost={}",
                    token,
                    front.source_id,
                    remaining,
                    slice_cost,
                    front.amount,
                    front.cost_basis
                );
                consumed.push(Lot {
                    amount: remaining,
                    cost_basis: slice_cost,
                    date: front.date,
                    source_id: front.source_id.clone(),
                });
                remaining = Decimal::ZERO;
            }
        }

        if remaining > Decimal::ZERO {
            log::warn!(
                "Ledger {}: disposal of {} exceeds recorded lots by {}",
                token,
                amount,
                remaining
            );
        }

        DisposalMatch {
            cost_basis: total_cost_basis,
            long_term,
            shortfall: remaining,
            consumed,
        }
    }

    /// Total units remaining in a token's queue
    #[cfg(test)]
    pub fn remaining(&self, token: &str) -> Decimal {
        self.lots(token).map(|lot| lot.amount).sum()
    }
}
