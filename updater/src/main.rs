//! Updater entrypoint (§5 "Process startup/shutdown"): wires the source
//! clients, relay, and controller into the two-task layout and drives the
//! relay-liveness supervisor and graceful-shutdown sequence around them.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use oracle_common::assets::ASSETS;
use oracle_updater::config::Config;
use oracle_updater::controller::Controller;
use oracle_updater::key_handle::KeyHandle;
use oracle_updater::lock_file::LockFile;
use oracle_updater::pda::derive_state_pda;
use oracle_updater::relay::{AssetFeed, Relay, RelayMessage};
use oracle_updater::rpc::RpcDriver;
use oracle_updater::supervisor::{Action, RestartSupervisor, RESTART_GRACE};
use oracle_updater::tx_builder::TransactionBuilder;
use oracle_updater::venues;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

/// Builds one `AssetFeed` per compile-time asset, wiring its institutional
/// feed (if any) and its composite-venue clients (§4.3).
fn build_feeds(cfg: &Config) -> Vec<AssetFeed> {
    ASSETS
        .iter()
        .map(|asset| {
            let primary = asset.primary_feed_id.map(|feed_id| {
                venues::build_institutional(feed_id, &cfg.institutional_feed_base_url, cfg.institutional_poll_ms)
            });
            let venue_clients = asset.venues.iter().map(|m| venues::build(m.venue, m.symbol)).collect();
            AssetFeed::spawn(asset.symbol, primary, venue_clients, asset.stale_ms, asset.tolerance)
        })
        .collect()
}

/// Spawns a fresh relay generation: its own feed set and shutdown channel,
/// sharing `tx` with the controller so a restart is invisible to it.
fn spawn_relay(cfg: &Config, tx: mpsc::Sender<RelayMessage>) -> (tokio::task::JoinHandle<()>, watch::Sender<bool>) {
    let feeds = build_feeds(cfg);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let relay = Relay::new(feeds);
    let publish_ms = cfg.publish_ms;
    let handle = tokio::spawn(relay.run(tx, publish_ms, shutdown_rx));
    (handle, shutdown_tx)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cfg = Config::from_env()?;
    cfg.validate()?;
    oracle_updater::tracing_logger::init(&cfg.log_level);

    info!(updater_index = cfg.updater_index, is_authority = cfg.is_authority, "starting updater");

    let _lock = LockFile::acquire(&cfg.lock_file_path)?;
    let key_handle = KeyHandle::load(&cfg.key_source)?;
    let keypair = Arc::new(key_handle.into_keypair());

    let program_id = Pubkey::from_str(&cfg.solana.program_id)?;
    let (state_pda, _bump) = derive_state_pda(&program_id);

    let commitment = match cfg.solana.commitment.as_str() {
        "confirmed" => CommitmentConfig::confirmed(),
        "finalized" => CommitmentConfig::finalized(),
        _ => CommitmentConfig::processed(),
    };
    let rpc = Arc::new(RpcDriver::new(&cfg.solana.rpc_url, commitment));
    let tx_builder = Arc::new(TransactionBuilder::new(rpc, program_id, state_pda));

    // §4.5 "Account bootstrap": only the configured update_authority may
    // create the state account; every other updater just waits for it.
    if !tx_builder.account_exists().await {
        if cfg.is_authority {
            info!("state account absent, submitting initialize");
            tx_builder.submit_initialize(&keypair, cfg.decimals).await?;
        } else {
            anyhow::bail!(
                "state account {} does not exist and this updater is not the update_authority; \
                 start the authority updater first",
                state_pda
            );
        }
    }

    let bounds: BTreeMap<String, _> =
        ASSETS.iter().map(|a| (a.symbol.to_string(), cfg.bounds_for(a.symbol))).collect();

    let controller = Controller::new(
        cfg.updater_index,
        cfg.decimals,
        cfg.tick_ms,
        keypair,
        tx_builder,
        bounds,
        cfg.circuit_breaker.clone(),
    );

    let (relay_tx, relay_rx) = mpsc::channel(64);
    let (activity_tx, mut activity_rx) = watch::channel(Instant::now());
    let (controller_shutdown_tx, controller_shutdown_rx) = watch::channel(false);

    let (initial_handle, initial_shutdown) = spawn_relay(&cfg, relay_tx.clone());

    let controller_task = tokio::spawn(controller.run(relay_rx, activity_tx, controller_shutdown_rx));

    let supervisor_shutdown_tx = controller_shutdown_tx.clone();
    let supervisor_task = tokio::spawn(async move {
        let mut sup = RestartSupervisor::new(Instant::now());
        let mut check = tokio::time::interval(Duration::from_secs(10));
        let mut relay_handle = initial_handle;
        let mut relay_shutdown = initial_shutdown;

        loop {
            tokio::select! {
                _ = check.tick() => {
                    match sup.check(Instant::now()) {
                        Action::Ok => {}
                        Action::Restart => {
                            warn!("relay liveness timeout, restarting");
                            let _ = relay_shutdown.send(true);
                            relay_handle.abort();
                            tokio::time::sleep(RESTART_GRACE).await;
                            let (h, s) = spawn_relay(&cfg, relay_tx.clone());
                            relay_handle = h;
                            relay_shutdown = s;
                        }
                        Action::Fatal => {
                            error!("relay restart budget exhausted, shutting down updater");
                            let _ = supervisor_shutdown_tx.send(true);
                            return;
                        }
                    }
                }
                changed = activity_rx.changed() => {
                    if changed.is_ok() {
                        sup.record_activity(*activity_rx.borrow());
                    } else {
                        return;
                    }
                }
            }
        }
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("received shutdown signal");
        }
    }

    let _ = controller_shutdown_tx.send(true);
    let _ = tokio::time::timeout(Duration::from_secs(5), controller_task).await;
    supervisor_task.abort();

    info!("updater shut down");
    Ok(())
}
