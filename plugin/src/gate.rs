use crate::host::{ActorLookup, BodyId, ShellId};
use std::collections::HashSet;

/// Outcome for one contact between the shell and another body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactDecision {
    Collide,
    Ignore,
}

/// Contact filter attached to a boundary shell.
///
/// Only bodies owned by a player-controlled actor collide with the shell.
/// Anything else (projectiles, terrain, effects) is ignored, and stays ignored
/// for the lifetime of the shell.
#[derive(Debug)]
pub struct CollisionGate {
    shell: ShellId,
    ignored: HashSet<BodyId>,
}

impl CollisionGate {
    pub fn new(shell: ShellId) -> Self {
        Self {
            shell,
            ignored: HashSet::new(),
        }
    }

    pub fn shell(&self) -> ShellId {
        self.shell
    }

    /// Pure predicate: does this body belong to a player?
    /// A body with no resolvable controller is not a player.
    pub fn is_player_body<L: ActorLookup + ?Sized>(lookup: &L, body: BodyId) -> bool {
        lookup.player_controller(body).is_some()
    }

    /// Decide a contact, remembering suppressed bodies.
    pub fn on_contact<L: ActorLookup + ?Sized>(
        &mut self,
        lookup: &L,
        body: BodyId,
    ) -> ContactDecision {
        if self.ignored.contains(&body) {
            return ContactDecision::Ignore;
        }
        if Self::is_player_body(lookup, body) {
            ContactDecision::Collide
        } else {
            self.ignored.insert(body);
            ContactDecision::Ignore
        }
    }

    pub fn is_ignored(&self, body: BodyId) -> bool {
        self.ignored.contains(&body)
    }

    pub fn ignored_count(&self) -> usize {
        self.ignored.len()
    }
}
