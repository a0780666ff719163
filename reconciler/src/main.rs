use tokio_util::sync::CancellationToken;

use reconciler::job::{JobConfig, JobRuntime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CliMode {
    Run { dry_run: bool },
    Help,
}

fn parse_cli_mode<I>(args: I) -> anyhow::Result<CliMode>
where
    I: IntoIterator<Item = String>,
{
    let mut dry_run = false;
    for arg in args.into_iter().skip(1) {
        match arg.as_str() {
            "--dry-run" => dry_run = true,
            "--help" | "-h" => return Ok(CliMode::Help),
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }
    Ok(CliMode::Run { dry_run })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let dry_run = match parse_cli_mode(std::env::args())? {
        CliMode::Help => {
            println!("Usage: reconciler [--dry-run]");
            println!("  --dry-run   Report drift without writing repairs");
            return Ok(());
        }
        CliMode::Run { dry_run } => dry_run,
    };

    let config = JobConfig::from_env(dry_run)?;
    let runtime = JobRuntime::bootstrap(config).await?;

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("[reconciler] interrupt received, stopping");
            signal_cancel.cancel();
        }
    });

    runtime.run(&cancel).await
}
