use crate::artifact::{artifact_key, modifier_def, ArtifactToggle};
use crate::boundary::Boundary;
use crate::error::{LetMeOutError, Result};
use crate::gate::ContactDecision;
use crate::host::{ActorLookup, BodyId, Host, ModifierRegistry, ShellId, ShellScene};
use crate::lifecycle::{ChargeLifecycle, ChargeState, StopReason, TickOutcome};
use crate::signals::{HostSignal, SignalBus, SignalKind, SignalReceiver};
use letmeout_shared::config::ModConfig;
use letmeout_shared::protocol::{ChargeStateWire, CorrectionCounts};
use std::path::Path;

/// Name the plugin subscribes to the signal bus under.
pub const SUBSCRIBER_NAME: &str = "letmeout";

const SUBSCRIBED_KINDS: [SignalKind; 3] = [
    SignalKind::ChargingBegan,
    SignalKind::Charged,
    SignalKind::SceneLoaded,
];

/// The installed plugin. One live controller per registry; a second
/// `install` fails until the first is shut down.
pub struct LetMeOut {
    lifecycle: ChargeLifecycle,
    artifact: ArtifactToggle,
    signals: SignalReceiver,
    corrections: CorrectionCounts,
}

impl LetMeOut {
    /// Attach as the modifier's controller, register the modifier if the
    /// registry has not seen it yet, and subscribe to host signals.
    pub fn install<R: ModifierRegistry + ?Sized>(
        registry: &mut R,
        bus: &mut SignalBus,
        config: ModConfig,
        asset_dir: &Path,
    ) -> Result<Self> {
        config.validate().map_err(LetMeOutError::InvalidConfig)?;

        let key = artifact_key();
        if !registry.attach_controller(&key) {
            return Err(LetMeOutError::DuplicateController(key.0));
        }
        if !registry.contains(&key) {
            registry.register(modifier_def(asset_dir));
        }
        let signals = bus.subscribe(SUBSCRIBER_NAME, &SUBSCRIBED_KINDS);

        tracing::info!("LetMeOut installed as {}", key.as_str());
        Ok(Self {
            lifecycle: ChargeLifecycle::new(&config),
            artifact: ArtifactToggle::new(),
            signals,
            corrections: CorrectionCounts::default(),
        })
    }

    /// Per-frame entry point. Queued signals are applied before the tick.
    pub fn update<H: Host + ?Sized>(&mut self, now: f64, host: &mut H) -> TickOutcome {
        while let Some(signal) = self.signals.try_next() {
            self.handle_signal(signal, now, host);
        }
        if !self.artifact.is_enabled() {
            return TickOutcome::Idle;
        }

        let outcome = self.lifecycle.tick(now, host);
        if let TickOutcome::Contained(counts) = &outcome {
            self.corrections.accumulate(counts);
        }
        outcome
    }

    fn handle_signal<H: Host + ?Sized>(&mut self, signal: HostSignal, now: f64, host: &mut H) {
        match signal {
            HostSignal::ChargingBegan(anchor) => {
                self.lifecycle.begin(anchor, now, self.artifact.is_enabled());
            }
            HostSignal::Charged(_) => {
                self.lifecycle.stop(StopReason::Charged, host);
            }
            HostSignal::SceneLoaded => {
                self.artifact.refresh(&*host);
                self.lifecycle.stop(StopReason::SceneLoaded, host);
            }
        }
    }

    /// Contact filter for the host's physics callback.
    pub fn on_shell_contact<L: ActorLookup + ?Sized>(
        &mut self,
        shell: ShellId,
        body: BodyId,
        lookup: &L,
    ) -> Option<ContactDecision> {
        self.lifecycle.on_shell_contact(shell, body, lookup)
    }

    /// Unsubscribe, tear down any live boundary and release the controller
    /// slot. The modifier stays registered.
    pub fn shutdown<H: ShellScene + ModifierRegistry + ?Sized>(
        mut self,
        bus: &mut SignalBus,
        host: &mut H,
    ) {
        bus.unsubscribe(self.signals.id());
        self.lifecycle.stop(StopReason::Shutdown, host);
        host.detach_controller(self.artifact.key());
        tracing::info!("LetMeOut shut down");
    }

    pub fn charge_state(&self) -> ChargeState {
        self.lifecycle.state()
    }

    pub fn charge_state_wire(&self, now: f64) -> ChargeStateWire {
        self.lifecycle.wire_state(now)
    }

    pub fn boundary(&self) -> Option<&Boundary> {
        self.lifecycle.boundary()
    }

    pub fn artifact(&self) -> &ArtifactToggle {
        &self.artifact
    }

    /// Corrections applied since the previous call.
    pub fn take_corrections(&mut self) -> CorrectionCounts {
        std::mem::take(&mut self.corrections)
    }
}
