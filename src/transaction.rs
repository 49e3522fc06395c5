use anyhow::bail;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Unified JSON input format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxInput {
    #[serde(default)]
    pub wallet: Option<String>,
    pub transactions: Vec<TransactionRecord>,
}

/// Kind of on-chain transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxKind {
    Transfer,
    Trade,
    Swap,
    Defi,
    /// Staking rewards are ordinary income at FMV when received,
    /// regardless of direction
    Staking,
}

impl TxKind {
    pub fn is_staking(&self) -> bool {
        matches!(self, TxKind::Staking)
    }
}

/// Flow direction relative to the wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    In,
    Out,
}

/// A normalized transaction, as produced by the ingestion layer.
/// Amounts are token units; `unit_price` is USD per unit at transaction
/// time, already resolved (missing means no price data was available).
#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: String,
    pub kind: TxKind,
    pub direction: Direction,
    pub amount: Decimal,
    pub token: String,
    pub timestamp: NaiveDateTime,
    pub unit_price: Option<Decimal>,
}

impl Transaction {
    /// USD value of the whole transaction; missing price counts as zero
    pub fn value_usd(&self) -> Decimal {
        self.amount * self.unit_price.unwrap_or(Decimal::ZERO)
    }
}

/// Parse a date string that may be date-only or datetime format
fn parse_datetime(s: &str) -> anyhow::Result<NaiveDateTime> {
    // Try datetime format first: "2024-01-15T10:30:00" or "2024-01-15 10:30:00"
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt);
    }
    // Try with milliseconds
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt);
    }
    // Fall back to date-only format, defaulting to midnight
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::from_hms_opt(0, 0, 0).unwrap()));
    }
    bail!("invalid date/datetime format: {}", s)
}

/// CSV/JSON record format for transactions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub kind: String,
    pub direction: String,
    pub amount: Decimal,
    pub token: String,
    pub timestamp: String,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
}

impl TryFrom<TransactionRecord> for Transaction {
    type Error = anyhow::Error;

    fn try_from(record: TransactionRecord) -> anyhow::Result<Self> {
        let timestamp = parse_datetime(&record.timestamp)
            .map_err(|e| anyhow::anyhow!("transaction {}: {}", record.id, e))?;

        let kind = match record.kind.as_str() {
            "transfer" => TxKind::Transfer,
            "trade" => TxKind::Trade,
            "swap" => TxKind::Swap,
            "defi" => TxKind::Defi,
            "staking" => TxKind::Staking,
            other => bail!("transaction {}: unknown kind {:?}", record.id, other),
        };

        let direction = match record.direction.as_str() {
            "in" => Direction::In,
            "out" => Direction::Out,
            other => bail!("transaction {}: unknown direction {:?}", record.id, other),
        };

        Ok(Transaction {
            id: record.id,
            kind,
            direction,
            amount: record.amount,
            token: record.token,
            timestamp,
            unit_price: record.unit_price,
        })
    }
}

impl From<&Transaction> for TransactionRecord {
    fn from(tx: &Transaction) -> Self {
        let kind = match tx.kind {
            TxKind::Transfer => "transfer",
            TxKind::Trade => "trade",
            TxKind::Swap => "swap",
            TxKind::Defi => "defi",
            TxKind::Staking => "staking",
        }
        .to_string();

        let direction = match tx.direction {
            Direction::In => "in",
            Direction::Out => "out",
        }
        .to_string();

        TransactionRecord {
            id: tx.id.clone(),
            kind,
            direction,
            amount: tx.amount,
            token: tx.token.clone(),
            timestamp: tx.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
            unit_price: tx.unit_price,
        }
    }
}

/// Read transactions from CSV
pub fn read_csv<R: Read>(reader: R) -> anyhow::Result<Vec<Transaction>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let records: Result<Vec<TransactionRecord>, _> =
        rdr.deserialize::<TransactionRecord>().collect();
    records?.into_iter().map(TryInto::try_into).collect()
}

/// Read transactions from JSON
pub fn read_json<R: Read>(reader: R) -> anyhow::Result<Vec<Transaction>> {
    let input: TaxInput = serde_json::from_reader(reader)?;
    input
        .transactions
        .into_iter()
        .map(TryInto::try_into)
        .collect()
}
