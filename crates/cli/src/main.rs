//! `dsr`: daily status reports from issue-tracker activity.

mod app;
mod args;

use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = args::Cli::parse();
    app::run(cli).await
}
