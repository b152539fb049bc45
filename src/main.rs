use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};

use arena_streams::config::Config;
use arena_streams::models::{SubscriptionPurpose, TournamentStatus};
use arena_streams::service::{ReplayTransport, StreamRegistry};
use arena_streams::telemetry::init_telemetry;

const LEADERBOARD_SUMMARY_SIZE: usize = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize telemetry
    init_telemetry(&config.log);

    info!(
        replay_dir = %config.replay.dir.display(),
        "Starting arena stream replay"
    );

    let transport = ReplayTransport::from_config(&config.replay);
    let registry = StreamRegistry::new(transport, config.stream.clone());

    registry
        .subscribe_defaults()
        .await
        .context("Failed to subscribe to default streams")?;

    if let Some(address) = &config.stream.watch_address {
        if let Err(e) = registry.subscribe(SubscriptionPurpose::player(address)).await {
            warn!(address = %address, error = %e, "No player stream for watched wallet");
        }
    }

    tokio::select! {
        _ = registry.transport().wait_idle() => {
            info!("Replay finished");
        }
        result = signal::ctrl_c() => {
            result.context("Failed to listen for shutdown signal")?;
            info!("Shutdown signal received, stopping replay...");
        }
    }

    let state = registry.snapshot();
    info!(
        players = state.players.len(),
        tournaments = state.tournaments.len(),
        "Final state"
    );
    for (position, player) in state
        .leaderboard()
        .into_iter()
        .take(LEADERBOARD_SUMMARY_SIZE)
        .enumerate()
    {
        info!(
            position = position + 1,
            address = %player.wallet_address,
            rank = player.rank,
            score = player.score,
            wins = player.wins,
            losses = player.losses,
            win_rate = player.win_rate,
            "Leaderboard"
        );
    }
    for status in [
        TournamentStatus::Live,
        TournamentStatus::Upcoming,
        TournamentStatus::Completed,
    ] {
        let ids: Vec<&str> = state
            .tournaments_with_status(status)
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        info!(status = %status, count = ids.len(), ids = ?ids, "Tournaments");
    }

    registry.unsubscribe_all();
    Ok(())
}
