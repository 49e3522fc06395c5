use crate::tax::fifo::Ledger;
use crate::tax::{wash, Error};
use crate::transaction::{Direction, Transaction};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// An annotated disposal, one Form 8949 line.
///
/// Input transactions are never mutated; the engine returns these records
/// instead, cloned and patched with the calculated values.
#[derive(Debug, Clone)]
pub struct Disposal {
    pub id: String,
    pub token: String,
    pub amount: Decimal,
    pub date_sold: NaiveDateTime,
    pub proceeds: Decimal,
    pub cost_basis: Decimal,
    /// Forced to zero when the loss was wash-sale disallowed
    pub gain_loss: Decimal,
    pub is_wash_sale: bool,
    pub long_term: bool,
    /// Units the ledger could not supply; non-zero means the upstream data
    /// disposed more than it ever acquired and the cost basis here is
    /// understated
    pub shortfall: Decimal,
}

/// Aggregate output of a calculation run
#[derive(Debug, Default)]
pub struct TaxReport {
    pub total_gains: Decimal,
    pub total_losses: Decimal,
    /// `total_gains - total_losses`
    pub net_gains: Decimal,
    pub short_term_gains: Decimal,
    pub long_term_gains: Decimal,
    pub staking_income: Decimal,
    /// Sum of disallowed loss magnitudes
    pub wash_sale_losses: Decimal,
    /// Count of all input transactions, not just disposals
    pub total_transactions: usize,
    /// Form 8949 Part I (short-term disposals)
    pub short_term: Vec<Disposal>,
    /// Form 8949 Part II (long-term disposals)
    pub long_term: Vec<Disposal>,
}

/// Holding-period classification of a disposal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Term {
    Short,
    Long,
}

/// CSV record for Form 8949 style output
#[derive(Debug, Serialize, Deserialize)]
pub struct DisposalCsvRecord {
    pub id: String,
    pub token: String,
    pub term: String,
    pub date_sold: String,
    pub amount: String,
    pub proceeds_usd: String,
    pub cost_basis_usd: String,
    pub gain_loss_usd: String,
    pub wash_sale: String,
}

impl From<&Disposal> for DisposalCsvRecord {
    fn from(d: &Disposal) -> Self {
        DisposalCsvRecord {
            id: d.id.clone(),
            token: d.token.clone(),
            term: if d.long_term { "long" } else { "short" }.to_string(),
            date_sold: d.date_sold.format("%Y-%m-%d").to_string(),
            amount: d.amount.to_string(),
            proceeds_usd: d.proceeds.round_dp(2).to_string(),
            cost_basis_usd: d.cost_basis.round_dp(2).to_string(),
            gain_loss_usd: d.gain_loss.round_dp(2).to_string(),
            wash_sale: if d.is_wash_sale { "W" } else { "" }.to_string(),
        }
    }
}

impl TaxReport {
    /// All disposals, short-term first
    pub fn disposals(&self) -> impl Iterator<Item = &Disposal> {
        self.short_term.iter().chain(self.long_term.iter())
    }

    /// Write disposals to CSV, short-term rows first, optionally
    /// filtered to one holding-period class
    pub fn write_csv<W: Write>(&self, writer: W, term: Option<Term>) -> anyhow::Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for disposal in self.disposals().filter(move |d| match term {
            Some(Term::Short) => !d.long_term,
            Some(Term::Long) => d.long_term,
            None => true,
        }) {
            let record: DisposalCsvRecord = disposal.into();
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// A realized loss whose wash-sale status is still open: a qualifying
/// repurchase may arrive within 30 days after the sale.
#[derive(Debug)]
struct PendingLoss {
    token: String,
    sale_date: NaiveDateTime,
    /// Positive magnitude of the loss
    loss: Decimal,
    term: Term,
    /// Position within the term's form list
    index: usize,
}

/// Run the full calculation: FIFO cost-basis matching, holding-period
/// classification, wash-sale disallowance and income aggregation.
///
/// Transactions are processed in timestamp order (stable, so input order
/// breaks ties). The input is read-only; each run owns a fresh [`Ledger`].
pub fn calculate(transactions: &[Transaction]) -> Result<TaxReport, Error> {
    for tx in transactions {
        if tx.amount <= Decimal::ZERO {
            return Err(Error::InvalidAmount {
                id: tx.id.clone(),
                amount: tx.amount,
            });
        }
    }

    let mut ordered: Vec<&Transaction> = transactions.iter().collect();
    ordered.sort_by_key(|tx| tx.timestamp);

    let mut ledger = Ledger::new();
    let mut pending: Vec<PendingLoss> = Vec::new();
    let mut report = TaxReport {
        total_transactions: transactions.len(),
        ..Default::default()
    };

    for tx in ordered {
        if tx.kind.is_staking() {
            // Ordinary income at FMV on receipt; the reward also becomes
            // cost basis for a later disposal
            let income = tx.value_usd();
            report.staking_income += income;
            ledger.add_lot(&tx.token, tx.amount, income, tx.timestamp, &tx.id);
            settle_pending_losses(&mut report, &mut ledger, &mut pending, &tx.token);
        } else if tx.direction == Direction::In {
            ledger.add_lot(&tx.token, tx.amount, tx.value_usd(), tx.timestamp, &tx.id);
            settle_pending_losses(&mut report, &mut ledger, &mut pending, &tx.token);
        } else {
            let proceeds = tx.value_usd();
            let matched = ledger.consume(&tx.token, tx.amount, tx.timestamp);
            let gain_loss = proceeds - matched.cost_basis;

            // The wash-sale scan runs against the post-disposal queue
            let is_wash_sale = wash::is_wash_sale(&ledger, &tx.token, tx.timestamp, gain_loss);

            if is_wash_sale {
                let disallowed = gain_loss.abs();
                report.wash_sale_losses += disallowed;
                wash::adjust_replacement_basis(&mut ledger, &tx.token, disallowed);
            } else if gain_loss > Decimal::ZERO {
                report.total_gains += gain_loss;
                if matched.long_term {
                    report.long_term_gains += gain_loss;
                } else {
                    report.short_term_gains += gain_loss;
                }
            } else {
                report.total_losses += gain_loss.abs();
            }

            let disposal = Disposal {
                id: tx.id.clone(),
                token: tx.token.clone(),
                amount: tx.amount,
                date_sold: tx.timestamp,
                proceeds,
                cost_basis: matched.cost_basis,
                gain_loss: if is_wash_sale { Decimal::ZERO } else { gain_loss },
                is_wash_sale,
                long_term: matched.long_term,
                shortfall: matched.shortfall,
            };
            let (list, term) = if matched.long_term {
                (&mut report.long_term, Term::Long)
            } else {
                (&mut report.short_term, Term::Short)
            };
            list.push(disposal);

            // A loss not disallowed yet may still be washed by a
            // repurchase within the next 30 days
            if !is_wash_sale && gain_loss < Decimal::ZERO {
                pending.push(PendingLoss {
                    token: tx.token.clone(),
                    sale_date: tx.timestamp,
                    loss: gain_loss.abs(),
                    term,
                    index: list.len() - 1,
                });
            }
        }
    }

    report.net_gains = report.total_gains - report.total_losses;
    Ok(report)
}

/// Re-run the wash-sale check for unresolved losses after a same-token
/// acquisition. The lot just added is now in the queue, so the evaluator's
/// current-queue scan picks it up when it falls inside a pending loss's
/// window; the loss is then disallowed retroactively and rolled into the
/// basis of the new replacement lot.
fn settle_pending_losses(
    report: &mut TaxReport,
    ledger: &mut Ledger,
    pending: &mut Vec<PendingLoss>,
    token: &str,
) {
    let mut i = 0;
    while i < pending.len() {
        let open = &pending[i];
        if open.token == token && wash::is_wash_sale(ledger, token, open.sale_date, -open.loss) {
            let open = pending.remove(i);
            let disposal = match open.term {
                Term::Short => &mut report.short_term[open.index],
                Term::Long => &mut report.long_term[open.index],
            };
            disposal.gain_loss = Decimal::ZERO;
            disposal.is_wash_sale = true;
            report.total_losses -= open.loss;
            report.wash_sale_losses += open.loss;
            wash::adjust_replacement_basis(ledger, token, open.loss);
        } else {
            i += 1;
        }
    }
}
