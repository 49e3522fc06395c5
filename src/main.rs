use clap::{Parser, Subcommand};

mod cmd;
mod tax;
mod transaction;

use cmd::report::ReportCommand;
use cmd::summary::SummaryCommand;

#[derive(Parser, Debug)]
#[command(
    name = "fifotax",
    version,
    about = "US crypto tax calculator: FIFO capital gains, wash sales and staking income"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregated totals: gains, losses, income and wash sales
    Summary(SummaryCommand),
    /// Form 8949 style disposal report as CSV
    Report(ReportCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Summary(cmd) => cmd.exec(),
        Command::Report(cmd) => cmd.exec(),
    }
}
