use letmeout::config::load_harness_config;
use letmeout::game_loop::{run_host_loop, HostBroadcast, HostCommand};
use letmeout::icons::plugin_asset_dir;
use letmeout_shared::config::HarnessConfig;
use letmeout_shared::vec3::vec3;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match load_harness_config(&PathBuf::from(&path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Invalid harness configuration {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => HarnessConfig::default(),
    };
    if let Err(e) = config.validate() {
        eprintln!("Invalid harness configuration: {}", e);
        std::process::exit(1);
    }

    let asset_dir = plugin_asset_dir().unwrap_or_else(|e| {
        tracing::warn!("Cannot resolve asset directory, using cwd: {}", e);
        PathBuf::from(".")
    });

    let (cmd_tx, cmd_rx) = mpsc::channel::<HostCommand>(64);
    let (broadcast_tx, mut broadcast_rx) = broadcast::channel::<HostBroadcast>(256);

    let host = tokio::spawn(run_host_loop(cmd_rx, broadcast_tx, config, asset_dir));

    // Print snapshots as JSON lines
    let printer = tokio::spawn(async move {
        loop {
            match broadcast_rx.recv().await {
                Ok(HostBroadcast::Snapshot(snapshot)) => match serde_json::to_string(&snapshot) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::warn!("Failed to serialize snapshot: {}", e),
                },
                Ok(HostBroadcast::ChargeStopped(reason)) => {
                    tracing::info!("Charge stopped: {:?}", reason);
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Snapshot printer lagged by {} messages", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    if let Err(e) = run_scenario(&cmd_tx).await {
        tracing::warn!("Scenario aborted: {}", e);
    }
    let _ = cmd_tx.send(HostCommand::Shutdown).await;

    match host.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            eprintln!("Host loop failed: {}", e);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Host loop panicked: {}", e);
            std::process::exit(1);
        }
    }
    let _ = printer.await;
}

/// Enable the artifact, charge the anchor with a handful of players around
/// it, knock one of them out of the zone, then finish charging.
async fn run_scenario(
    cmd_tx: &mpsc::Sender<HostCommand>,
) -> Result<(), mpsc::error::SendError<HostCommand>> {
    cmd_tx.send(HostCommand::SetArtifactEnabled(true)).await?;
    cmd_tx.send(HostCommand::LoadScene).await?;

    let starts = [
        (vec3(2.0, 0.0, 1.0), vec3(0.0, 0.0, 0.0)),
        (vec3(-6.0, 0.0, 4.0), vec3(-3.0, 0.0, 0.0)),
        (vec3(0.0, 0.0, 9.0), vec3(0.0, 0.0, 14.0)),
        (vec3(8.0, 1.0, -8.0), vec3(1.0, 0.0, -1.0)),
    ];
    let mut players = Vec::new();
    for (position, velocity) in starts {
        let (tx, rx) = oneshot::channel();
        cmd_tx
            .send(HostCommand::SpawnPlayer {
                position,
                velocity,
                capsule_height: 1.8,
                response: tx,
            })
            .await?;
        if let Ok(id) = rx.await {
            players.push(id);
        }
    }

    cmd_tx
        .send(HostCommand::BeginCharging {
            position: vec3(0.0, 0.0, 0.0),
        })
        .await?;
    tokio::time::sleep(Duration::from_secs(4)).await;

    if let Some(&id) = players.first() {
        cmd_tx
            .send(HostCommand::PushPlayer {
                id,
                velocity: vec3(400.0, 0.0, 0.0),
            })
            .await?;
    }
    tokio::time::sleep(Duration::from_secs(2)).await;

    cmd_tx.send(HostCommand::FinishCharging).await?;
    tokio::time::sleep(Duration::from_millis(500)).await;
    Ok(())
}
