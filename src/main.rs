use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;

use scansnap_to_lark::modules::config::{Cli, Command};
use scansnap_to_lark::SyncManager;

#[tokio::main]
async fn main() -> ExitCode {
    // values from .env never override the real environment
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(success_count) if success_count > 0 => {
            println!("\n✓ Successfully synced {} records", success_count);
            ExitCode::SUCCESS
        }
        Ok(_) => {
            eprintln!("\n✗ No records were synced");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("\n✗ Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<usize> {
    match cli.command {
        Command::Sync(args) => {
            let config = args.into_config()?;
            let csv_path = config.csv_path.clone();

            let manager = SyncManager::new(config).context("Failed to create Lark client")?;
            let success_count = manager
                .sync_all()
                .await
                .with_context(|| format!("Sync of {} failed", csv_path.display()))?;

            Ok(success_count)
        }
    }
}
