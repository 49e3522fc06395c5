//! Summary command - aggregated totals and income

use crate::cmd::read_transactions;
use crate::tax::{self, TaxReport};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Args, Debug)]
pub struct SummaryCommand {
    /// CSV or JSON file containing transactions (or "-" for stdin)
    #[arg(short, long)]
    transactions: PathBuf,

    /// Filter by token (e.g. SOL, USDC)
    #[arg(short = 'k', long)]
    token: Option<String>,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

/// Summary data for JSON output
#[derive(Debug, Serialize)]
struct SummaryData {
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    total_transactions: usize,
    short_term_disposals: usize,
    long_term_disposals: usize,
    total_gains: String,
    total_losses: String,
    net_gains: String,
    short_term_gains: String,
    long_term_gains: String,
    staking_income: String,
    wash_sale_losses: String,
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "USD")]
    value: String,
}

impl SummaryCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let all_transactions = read_transactions(&self.transactions)?;

        let filtered: Vec<_> = match &self.token {
            Some(token) => all_transactions
                .into_iter()
                .filter(|tx| tx.token.eq_ignore_ascii_case(token))
                .collect(),
            None => all_transactions,
        };

        let report = tax::calculate(&filtered)?;

        if self.json {
            self.print_json(&report)
        } else {
            self.print_summary(&report);
            Ok(())
        }
    }

    fn print_summary(&self, report: &TaxReport) {
        if let Some(ref token) = self.token {
            println!("Token: {}", token);
        }
        println!(
            "Transactions: {} ({} short-term disposals, {} long-term disposals)",
            report.total_transactions,
            report.short_term.len(),
            report.long_term.len()
        );

        let rows = vec![
            SummaryRow {
                metric: "Total gains",
                value: report.total_gains.round_dp(2).normalize().to_string(),
            },
            SummaryRow {
                metric: "Total losses",
                value: report.total_losses.round_dp(2).normalize().to_string(),
            },
            SummaryRow {
                metric: "Net gains",
                value: report.net_gains.round_dp(2).normalize().to_string(),
            },
            SummaryRow {
                metric: "Short-term gains",
                value: report.short_term_gains.round_dp(2).normalize().to_string(),
            },
            SummaryRow {
                metric: "Long-term gains",
                value: report.long_term_gains.round_dp(2).normalize().to_string(),
            },
            SummaryRow {
                metric: "Staking income",
                value: report.staking_income.round_dp(2).normalize().to_string(),
            },
            SummaryRow {
                metric: "Wash sale losses disallowed",
                value: report.wash_sale_losses.round_dp(2).normalize().to_string(),
            },
        ];

        let mut table = Table::new(rows);
        table.with(Style::sharp());
        println!("{}", table);
    }

    fn print_json(&self, report: &TaxReport) -> anyhow::Result<()> {
        let data = SummaryData {
            token: self.token.clone(),
            total_transactions: report.total_transactions,
            short_term_disposals: report.short_term.len(),
            long_term_disposals: report.long_term.len(),
            total_gains: report.total_gains.round_dp(2).normalize().to_string(),
            total_losses: report.total_losses.round_dp(2).normalize().to_string(),
            net_gains: report.net_gains.round_dp(2).normalize().to_string(),
            short_term_gains: report.short_term_gains.round_dp(2).normalize().to_string(),
            long_term_gains: report.long_term_gains.round_dp(2).normalize().to_string(),
            staking_income: report.staking_income.round_dp(2).normalize().to_string(),
            wash_sale_losses: report.wash_sale_losses.round_dp(2).normalize().to_string(),
        };
        println!("{}", serde_json::to_string_pretty(&data)?);
        Ok(())
    }
}
