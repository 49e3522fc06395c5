//! Report command - Form 8949 style disposal rows as CSV

use crate::cmd::read_transactions;
use crate::tax::{self, Term};
use clap::{Args, ValueEnum};
use std::io;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ReportCommand {
    /// CSV or JSON file containing transactions (or "-" for stdin)
    #[arg(short, long)]
    transactions: PathBuf,

    /// Limit output to one holding-period class
    #[arg(long, value_enum)]
    term: Option<TermArg>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TermArg {
    Short,
    Long,
}

impl From<TermArg> for Term {
    fn from(arg: TermArg) -> Self {
        match arg {
            TermArg::Short => Term::Short,
            TermArg::Long => Term::Long,
        }
    }
}

impl ReportCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let transactions = read_transactions(&self.transactions)?;
        let report = tax::calculate(&transactions)?;
        report.write_csv(io::stdout(), self.term.map(Into::into))
    }
}
