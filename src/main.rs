use anyhow::Result;
use chrono::Local;
use clap::Parser;
use esoload::{config::Cli, pipeline};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,esoload=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) configuration ────────────────────────────────────────────
    let cli = Cli::parse();
    let cfg = cli.resolve()?;
    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());
    info!(
        source = %cfg.source,
        output = %cfg.output.display(),
        %today,
        dry_run = cli.dry_run,
        "configured"
    );

    // ─── 3) run ──────────────────────────────────────────────────────
    match pipeline::run(&cfg, today, cli.dry_run).await {
        Ok(summary) => {
            if let Some(snapshot) = &summary.snapshot {
                info!(snapshot = %snapshot.display(), swept = summary.swept.len(), "archived");
            }
            info!("all done");
            Ok(())
        }
        Err(e) => {
            error!("run failed: {:#}", e);
            Err(e)
        }
    }
}
