// Channel harvest binary
//
// Runs one harvest tick and exits. Meant to be started by cron; everything it
// needs comes from CHANNELSCOUT_* environment variables.

use anyhow::{Context, Result};
use kodegen_tools_channelscout::browser_profile::sweep_stale_profiles;
use kodegen_tools_channelscout::{HarvestConfig, RunOutcome, harvest};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,chromiumoxide=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let config = HarvestConfig::from_env().context("Invalid configuration")?;

    if let Err(e) = sweep_stale_profiles(&config.profiles_dir()) {
        tracing::warn!("Stale profile sweep failed: {e:#}");
    }

    let cancel = CancellationToken::new();

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current step");
            ctrl_c.cancel();
        }
    });

    if let Some(deadline) = config.run_deadline() {
        let expired = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            tracing::warn!("Run deadline of {}s reached", deadline.as_secs());
            expired.cancel();
        });
    }

    match harvest(config, cancel).await? {
        RunOutcome::Idle => tracing::info!("Nothing to harvest"),
        RunOutcome::NoChannels { attempted } => {
            tracing::info!("No channels discovered for {attempted} items")
        }
        RunOutcome::Persisted {
            path,
            records,
            processed_rows,
        } => tracing::info!(
            "Wrote {records} records to {} and marked {processed_rows} rows processed",
            path.display()
        ),
    }
    Ok(())
}
