use verkeerscentrum::config::AccountConfig;
use verkeerscentrum::{TrajectoryPoller, VerkeerscentrumClient};

extern crate env_logger;
extern crate log;

use log::LevelFilter;

use log::info;

async fn list_trajectories(mut client: VerkeerscentrumClient) -> anyhow::Result<()> {
    let result = client.get_user_trajectories().await;
    client.close();

    let trajectories = result?;
    if trajectories.is_empty() {
        info!("No trajectories saved on this account");
        return Ok(());
    }
    info!("Set VERKEERSCENTRUM_TRAJECTORIES to the ids to follow:");
    for trajectory in &trajectories {
        info!(
            "  {}: {}",
            trajectory.id.as_deref().unwrap_or("<no id>"),
            trajectory.option_label()
        );
    }
    Ok(())
}

async fn poll_trajectories(
    client: VerkeerscentrumClient,
    config: &AccountConfig,
) -> anyhow::Result<()> {
    info!(
        "Polling {} trajectories every {}s",
        config.trajectory_ids.len(),
        config.poll_interval.as_secs()
    );
    let mut poller = TrajectoryPoller::new(client, config.trajectory_ids.clone());

    tokio::select! {
        _ = poller.run(config.poll_interval) => {}
        _ = tokio::signal::ctrl_c() => info!("Interrupted, shutting down"),
    }

    let halted = poller.is_halted();
    poller.into_client().close();
    if halted {
        anyhow::bail!("polling stopped, credentials were refused");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let config = AccountConfig::new()?;
    let client =
        VerkeerscentrumClient::with_options(config.credentials.clone(), config.client_options.clone())?;

    if config.trajectory_ids.is_empty() {
        list_trajectories(client).await
    } else {
        poll_trajectories(client, &config).await
    }
}
