use crate::error::Result;
use crate::host::ActorId;
use crate::lifecycle::{StopReason, TickOutcome};
use crate::plugin::LetMeOut;
use crate::signals::{HostSignal, SignalBus};
use crate::world::SimWorld;
use letmeout_shared::config::HarnessConfig;
use letmeout_shared::protocol::{HostSnapshot, SNAPSHOT_VERSION};
use letmeout_shared::vec3::Vec3;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Scripted inputs to the reference host.
#[derive(Debug)]
pub enum HostCommand {
    /// Set the run's modifier selection. Takes effect on the next scene load.
    SetArtifactEnabled(bool),
    LoadScene,
    BeginCharging {
        position: Vec3,
    },
    FinishCharging,
    /// Swap the anchor instance mid-charge.
    ReplaceAnchor,
    SpawnPlayer {
        position: Vec3,
        velocity: Vec3,
        capsule_height: f64,
        response: oneshot::Sender<ActorId>,
    },
    /// Overwrite a player's velocity, as a knockback effect would.
    PushPlayer {
        id: ActorId,
        velocity: Vec3,
    },
    Shutdown,
}

/// Broadcasts from the host loop to observers
#[derive(Debug, Clone)]
pub enum HostBroadcast {
    Snapshot(HostSnapshot),
    ChargeStopped(StopReason),
}

/// Run the reference host at a fixed tick rate with the plugin installed.
/// Owns the world, the signal bus and the plugin.
pub async fn run_host_loop(
    mut cmd_rx: mpsc::Receiver<HostCommand>,
    broadcast_tx: broadcast::Sender<HostBroadcast>,
    config: HarnessConfig,
    asset_dir: PathBuf,
) -> Result<()> {
    let mut world = SimWorld::with_config(&config);
    let mut bus = SignalBus::new();
    let mut plugin = LetMeOut::install(&mut world, &mut bus, config.mod_config, &asset_dir)?;

    let dt = 1.0 / config.tick_rate_hz as f64;
    let snapshot_every_n = (config.tick_rate_hz / config.snapshot_rate_hz).max(1) as u64;
    let mut tick_count: u64 = 0;

    let mut tick_interval = tokio::time::interval(Duration::from_secs_f64(dt));
    tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                tick_count += 1;
                let now = tick_count as f64 * dt;

                if let Some(anchor) = world.step(dt) {
                    bus.publish(HostSignal::Charged(anchor));
                }
                if let TickOutcome::Stopped(reason) = plugin.update(now, &mut world) {
                    let _ = broadcast_tx.send(HostBroadcast::ChargeStopped(reason));
                }

                // Snapshots at lower rate
                if tick_count % snapshot_every_n == 0 {
                    let snapshot = snapshot(tick_count, now, &world, &mut plugin);
                    let _ = broadcast_tx.send(HostBroadcast::Snapshot(snapshot));
                }
            }

            Some(cmd) = cmd_rx.recv() => {
                match cmd {
                    HostCommand::SetArtifactEnabled(enabled) => {
                        let key = plugin.artifact().key().clone();
                        world.set_modifier_enabled(&key, enabled);
                    }
                    HostCommand::LoadScene => {
                        world.load_scene();
                        bus.publish(HostSignal::SceneLoaded);
                    }
                    HostCommand::BeginCharging { position } => {
                        let anchor = world.begin_charging(position);
                        bus.publish(HostSignal::ChargingBegan(anchor));
                    }
                    HostCommand::FinishCharging => {
                        if let Some(anchor) = world.finish_charging() {
                            bus.publish(HostSignal::Charged(anchor));
                        }
                    }
                    HostCommand::ReplaceAnchor => {
                        world.replace_anchor();
                    }
                    HostCommand::SpawnPlayer { position, velocity, capsule_height, response } => {
                        let id = world.spawn_player(position, velocity, capsule_height);
                        let _ = response.send(id);
                        tracing::info!("Player {} spawned", id.0);
                    }
                    HostCommand::PushPlayer { id, velocity } => {
                        if let Some(body) = world.player_mut(id) {
                            body.velocity = velocity;
                        }
                    }
                    HostCommand::Shutdown => break,
                }
            }

            else => break,
        }
    }

    plugin.shutdown(&mut bus, &mut world);
    tracing::info!("Host loop ended");
    Ok(())
}

fn snapshot(tick: u64, now: f64, world: &SimWorld, plugin: &mut LetMeOut) -> HostSnapshot {
    HostSnapshot {
        version: SNAPSHOT_VERSION,
        tick,
        time: now,
        artifact_enabled: plugin.artifact().is_enabled(),
        charge_state: plugin.charge_state_wire(now),
        boundary: plugin.boundary().map(|b| b.to_wire()),
        players: world.players_wire(),
        corrections: plugin.take_corrections(),
    }
}
