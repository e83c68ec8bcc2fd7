use crate::host::AnchorId;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

/// Host events the plugin reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSignal {
    ChargingBegan(AnchorId),
    Charged(AnchorId),
    SceneLoaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    ChargingBegan,
    Charged,
    SceneLoaded,
}

impl HostSignal {
    pub fn kind(&self) -> SignalKind {
        match self {
            HostSignal::ChargingBegan(_) => SignalKind::ChargingBegan,
            HostSignal::Charged(_) => SignalKind::Charged,
            HostSignal::SceneLoaded => SignalKind::SceneLoaded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    name: String,
    kinds: Vec<SignalKind>,
    tx: UnboundedSender<HostSignal>,
}

/// Publish/subscribe registry for host signals.
///
/// Delivery is queued: subscribers drain their receiver on their own tick.
/// Subscribers whose receiver was dropped are pruned on the next publish.
#[derive(Default)]
pub struct SignalBus {
    subscribers: Vec<Subscriber>,
    next_id: u64,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, name: impl Into<String>, kinds: &[SignalKind]) -> SignalReceiver {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        let (tx, rx) = mpsc::unbounded_channel();
        let name = name.into();
        tracing::debug!("Subscriber {} listening for {:?}", name, kinds);
        self.subscribers.push(Subscriber {
            id,
            name,
            kinds: kinds.to_vec(),
            tx,
        });
        SignalReceiver { id, rx }
    }

    /// Returns false if the id was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    /// Deliver to every subscriber interested in this signal kind.
    /// Returns the number of deliveries.
    pub fn publish(&mut self, signal: HostSignal) -> usize {
        self.subscribers.retain(|s| !s.tx.is_closed());
        let kind = signal.kind();
        let mut delivered = 0;
        for sub in &self.subscribers {
            if sub.kinds.contains(&kind) && sub.tx.send(signal).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    pub fn is_subscribed(&self, name: &str) -> bool {
        self.subscribers
            .iter()
            .any(|s| s.name == name && !s.tx.is_closed())
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Receiving end of a subscription.
pub struct SignalReceiver {
    id: SubscriptionId,
    rx: UnboundedReceiver<HostSignal>,
}

impl SignalReceiver {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Next queued signal, if any. Never blocks.
    pub fn try_next(&mut self) -> Option<HostSignal> {
        match self.rx.try_recv() {
            Ok(signal) => Some(signal),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// All queued signals in publish order.
    pub fn drain(&mut self) -> Vec<HostSignal> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}
