//! Narrow interfaces the plugin consumes from the host game.

use crate::icons::Texture;
use crate::icosphere::IcoSphere;
use letmeout_shared::vec3::Vec3;
use std::sync::Arc;

/// Identity of a charging anchor instance. A new id mid-charge means the
/// anchor was replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorId(pub u64);

/// Player-controlled actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u32);

/// Any physical body the host can report in a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyId(pub u64);

/// Host-side handle of a spawned shell object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShellId(pub u64);

/// What the charging anchor reports this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorState {
    pub id: AnchorId,
    pub position: Vec3,
    pub radius: f64,
    pub was_charged: bool,
}

pub trait AnchorSource {
    /// The active charging anchor, if the scene has one.
    fn charging_anchor(&self) -> Option<AnchorState>;
}

/// Direct access to a body's movement, bypassing normal integration.
pub trait CharacterMotor {
    fn position(&self) -> Vec3;
    fn velocity(&self) -> Vec3;
    fn capsule_height(&self) -> f64;
    fn set_velocity(&mut self, velocity: Vec3);
    fn set_position(&mut self, position: Vec3);
}

pub trait ActorRoster {
    /// Currently active player-controlled actors.
    fn player_actors(&self) -> Vec<ActorId>;

    /// Resolve an actor's motor. `None` when the actor has no live body this
    /// tick (dead, respawning, despawned).
    fn motor(&mut self, actor: ActorId) -> Option<&mut dyn CharacterMotor>;
}

/// Everything the host needs to spawn the boundary shell.
#[derive(Debug, Clone)]
pub struct ShellSpawn {
    pub name: &'static str,
    pub position: Vec3,
    /// Uniform scale applied to the unit mesh.
    pub scale: f64,
    pub layer: u32,
    /// Unit-radius mesh, used both for rendering and as the mesh collider.
    pub mesh: Arc<IcoSphere>,
}

pub trait ShellScene {
    fn spawn_shell(&mut self, spawn: ShellSpawn) -> ShellId;
    fn set_shell_position(&mut self, shell: ShellId, position: Vec3);
    fn set_shell_scale(&mut self, shell: ShellId, scale: f64);
    fn despawn_shell(&mut self, shell: ShellId);
    /// False once the host has torn the shell down on its own (scene unload).
    fn is_shell_valid(&self, shell: ShellId) -> bool;
}

/// Name under which an optional run modifier is registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModifierKey(pub String);

impl ModifierKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub trait ModifierCatalog {
    /// Is this optional modifier selected for the current run?
    fn is_modifier_enabled(&self, key: &ModifierKey) -> bool;
}

/// Definition handed to the host's modifier registry.
#[derive(Debug, Clone)]
pub struct ModifierDef {
    pub key: ModifierKey,
    pub name_token: String,
    pub description_token: String,
    pub display_name: String,
    pub description: String,
    pub enabled_icon: Option<Texture>,
    pub disabled_icon: Option<Texture>,
}

/// Modifier definitions outlive the controller that registered them, so
/// controller liveness is tracked separately from registration.
pub trait ModifierRegistry {
    fn contains(&self, key: &ModifierKey) -> bool;
    fn register(&mut self, def: ModifierDef);
    /// Claim the controller slot for `key`. Returns false if a controller is
    /// already attached.
    fn attach_controller(&mut self, key: &ModifierKey) -> bool;
    fn detach_controller(&mut self, key: &ModifierKey);
}

/// Resolves which player actor, if any, owns a physical body.
pub trait ActorLookup {
    fn player_controller(&self, body: BodyId) -> Option<ActorId>;
}

/// Per-tick host surface.
pub trait Host: AnchorSource + ActorRoster + ShellScene + ModifierCatalog {}

impl<T: AnchorSource + ActorRoster + ShellScene + ModifierCatalog> Host for T {}
