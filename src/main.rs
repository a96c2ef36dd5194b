use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    cbzify::logging::init().context("init logging")?;

    let cli = cbzify::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        cbzify::cli::Command::Make(args) => {
            cbzify::make::run(args).await.context("make")?;
        }
        cbzify::cli::Command::Inspect(args) => {
            cbzify::inspect::run(args).context("inspect")?;
        }
    }

    Ok(())
}
