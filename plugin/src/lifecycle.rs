use crate::boundary::{Boundary, BoundaryGeometry};
use crate::containment::{BoundarySample, ContainmentSimulator};
use crate::gate::ContactDecision;
use crate::host::{ActorLookup, ActorRoster, AnchorId, AnchorSource, BodyId, ShellId, ShellScene};
use letmeout_shared::config::{LifecycleConfig, ModConfig};
use letmeout_shared::protocol::{ChargeStateWire, CorrectionCounts};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChargeState {
    Idle,
    /// Containment starts acting once `now >= starts_at`.
    Charging { anchor: AnchorId, starts_at: f64 },
}

/// Why charging ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Charged,
    SceneLoaded,
    AnchorReplaced,
    /// The anchor reported completion without a `Charged` signal.
    AnchorReportedCharged,
    Shutdown,
}

/// Result of one lifecycle tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    Idle,
    /// Charging, but the start delay has not elapsed.
    Armed,
    /// Charging, but the host has no usable anchor this tick.
    WaitingForAnchor,
    Stopped(StopReason),
    Contained(CorrectionCounts),
}

/// Owns the charge state, the boundary and the simulator that acts on it.
pub struct ChargeLifecycle {
    state: ChargeState,
    config: LifecycleConfig,
    geometry: BoundaryGeometry,
    simulator: ContainmentSimulator,
    boundary: Option<Boundary>,
    rng: ChaCha8Rng,
}

impl ChargeLifecycle {
    pub fn new(config: &ModConfig) -> Self {
        Self {
            state: ChargeState::Idle,
            config: config.lifecycle,
            geometry: BoundaryGeometry::new(config.shell),
            simulator: ContainmentSimulator::new(config.containment),
            boundary: None,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    pub fn state(&self) -> ChargeState {
        self.state
    }

    pub fn is_charging(&self) -> bool {
        matches!(self.state, ChargeState::Charging { .. })
    }

    pub fn boundary(&self) -> Option<&Boundary> {
        self.boundary.as_ref()
    }

    pub fn wire_state(&self, now: f64) -> ChargeStateWire {
        match self.state {
            ChargeState::Idle => ChargeStateWire::Idle,
            ChargeState::Charging { starts_at, .. } if now < starts_at => ChargeStateWire::Armed,
            ChargeState::Charging { .. } => ChargeStateWire::Charging,
        }
    }

    /// Charge-begin signal. Ignored when disabled or already charging.
    /// Returns true if the state changed.
    pub fn begin(&mut self, anchor: AnchorId, now: f64, enabled: bool) -> bool {
        if !enabled || self.is_charging() {
            return false;
        }
        let starts_at = now + self.config.charge_start_delay;
        self.state = ChargeState::Charging { anchor, starts_at };
        tracing::info!("Charging began for {:?}, containment at {:.2}", anchor, starts_at);
        true
    }

    /// Return to Idle and destroy the boundary, if any.
    /// Returns true if the controller was charging.
    pub fn stop<S: ShellScene + ?Sized>(&mut self, reason: StopReason, scene: &mut S) -> bool {
        let was_charging = self.is_charging();
        self.state = ChargeState::Idle;
        if let Some(boundary) = self.boundary.take() {
            self.geometry.destroy(boundary, scene);
        }
        if was_charging {
            tracing::info!("Charging stopped: {:?}", reason);
        }
        was_charging
    }

    /// Run one tick: refresh the boundary from the anchor, then contain.
    pub fn tick<H>(&mut self, now: f64, host: &mut H) -> TickOutcome
    where
        H: AnchorSource + ActorRoster + ShellScene + ?Sized,
    {
        let ChargeState::Charging { anchor, starts_at } = self.state else {
            return TickOutcome::Idle;
        };
        if now < starts_at {
            return TickOutcome::Armed;
        }

        let Some(live) = host.charging_anchor() else {
            return TickOutcome::WaitingForAnchor;
        };
        if live.id != anchor {
            tracing::warn!(
                "Charging anchor changed mid-charge: expected {:?}, found {:?}",
                anchor,
                live.id
            );
            self.stop(StopReason::AnchorReplaced, host);
            return TickOutcome::Stopped(StopReason::AnchorReplaced);
        }
        if live.was_charged {
            self.stop(StopReason::AnchorReportedCharged, host);
            return TickOutcome::Stopped(StopReason::AnchorReportedCharged);
        }
        if !(live.radius.is_finite() && live.radius > 0.0) || !live.position.is_finite() {
            return TickOutcome::WaitingForAnchor;
        }

        if self
            .boundary
            .as_ref()
            .is_some_and(|b| !host.is_shell_valid(b.shell()))
        {
            if let Some(stale) = self.boundary.take() {
                tracing::debug!("Boundary shell {:?} lost, recreating", stale.shell());
                self.geometry.destroy(stale, host);
            }
        }

        match self.boundary.as_mut() {
            Some(b) => {
                self.geometry.update_center(b, host, live.position);
                self.geometry.update_radius(b, host, live.radius);
            }
            None => {
                let b = self.geometry.create(host, live.position, live.radius);
                tracing::info!("Boundary created with radius {:.2}", live.radius);
                self.boundary = Some(b);
            }
        }

        let Some(sample) = self.boundary.as_ref().map(|b| BoundarySample {
            center: b.center(),
            radius: b.radius(),
        }) else {
            return TickOutcome::WaitingForAnchor;
        };
        let counts = self.simulator.tick(sample, host, &mut self.rng);
        TickOutcome::Contained(counts)
    }

    /// Filter a contact reported against `shell`. `None` if the shell is not
    /// the live boundary.
    pub fn on_shell_contact<L: ActorLookup + ?Sized>(
        &mut self,
        shell: ShellId,
        body: BodyId,
        lookup: &L,
    ) -> Option<ContactDecision> {
        let boundary = self.boundary.as_mut().filter(|b| b.shell() == shell)?;
        Some(boundary.gate_mut().on_contact(lookup, body))
    }
}
