//! In-memory reference host.
//!
//! `SimWorld` implements every host trait with plain collections so the
//! plugin can be driven without a game engine: tests use it directly and the
//! harness loop wraps it in a fixed-rate tokio task.

use crate::host::{
    ActorId, ActorLookup, ActorRoster, AnchorId, AnchorSource, AnchorState, BodyId,
    CharacterMotor, ModifierCatalog, ModifierDef, ModifierKey, ModifierRegistry, ShellId,
    ShellScene, ShellSpawn,
};
use crate::icosphere::IcoSphere;
use letmeout_shared::config::HarnessConfig;
use letmeout_shared::protocol::PlayerWire;
use letmeout_shared::vec3::{add, scale, Vec3};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// A player-owned rigid body.
#[derive(Debug, Clone, PartialEq)]
pub struct SimBody {
    pub body: BodyId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub capsule_height: f64,
    /// False while the actor has no live body (dead, respawning).
    pub present: bool,
}

impl CharacterMotor for SimBody {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn capsule_height(&self) -> f64 {
        self.capsule_height
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }
}

/// A spawned boundary shell.
#[derive(Debug, Clone)]
pub struct SimShell {
    pub name: &'static str,
    pub position: Vec3,
    pub scale: f64,
    pub layer: u32,
    pub mesh: Arc<IcoSphere>,
}

/// The charging anchor (teleporter) of the current scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SimAnchor {
    pub id: AnchorId,
    pub position: Vec3,
    pub radius: f64,
    /// Seconds spent charging so far.
    pub elapsed: f64,
    pub was_charged: bool,
}

/// Anchor growth parameters.
#[derive(Debug, Clone, Copy)]
struct AnchorTuning {
    growth_rate: f64,
    start_radius: f64,
    max_radius: f64,
    charge_duration: f64,
}

pub struct SimWorld {
    players: BTreeMap<ActorId, SimBody>,
    body_owners: HashMap<BodyId, ActorId>,
    shells: HashMap<ShellId, SimShell>,
    anchor: Option<SimAnchor>,
    enabled_modifiers: HashSet<ModifierKey>,
    registered: Vec<ModifierDef>,
    controllers: HashSet<ModifierKey>,
    tuning: AnchorTuning,
    gravity: f64,
    next_actor_id: u32,
    next_body_id: u64,
    next_shell_id: u64,
    next_anchor_id: u64,
    shell_scale_writes: usize,
    shell_position_writes: usize,
    scene_count: u32,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SimWorld {
    pub fn new() -> Self {
        Self::with_config(&HarnessConfig::default())
    }

    pub fn with_config(config: &HarnessConfig) -> Self {
        Self {
            players: BTreeMap::new(),
            body_owners: HashMap::new(),
            shells: HashMap::new(),
            anchor: None,
            enabled_modifiers: HashSet::new(),
            registered: Vec::new(),
            controllers: HashSet::new(),
            tuning: AnchorTuning {
                growth_rate: config.anchor_growth_rate,
                start_radius: config.anchor_start_radius,
                max_radius: config.anchor_max_radius,
                charge_duration: config.charge_duration,
            },
            gravity: config.gravity,
            next_actor_id: 1,
            next_body_id: 1,
            next_shell_id: 1,
            next_anchor_id: 1,
            shell_scale_writes: 0,
            shell_position_writes: 0,
            scene_count: 0,
        }
    }

    // --- players ---

    pub fn spawn_player(&mut self, position: Vec3, velocity: Vec3, capsule_height: f64) -> ActorId {
        let actor = ActorId(self.next_actor_id);
        self.next_actor_id += 1;
        let body = self.alloc_body();
        self.body_owners.insert(body, actor);
        self.players.insert(
            actor,
            SimBody {
                body,
                position,
                velocity,
                capsule_height,
                present: true,
            },
        );
        actor
    }

    pub fn despawn_player(&mut self, actor: ActorId) -> bool {
        match self.players.remove(&actor) {
            Some(body) => {
                self.body_owners.remove(&body.body);
                true
            }
            None => false,
        }
    }

    pub fn player(&self, actor: ActorId) -> Option<&SimBody> {
        self.players.get(&actor)
    }

    pub fn player_mut(&mut self, actor: ActorId) -> Option<&mut SimBody> {
        self.players.get_mut(&actor)
    }

    pub fn player_body(&self, actor: ActorId) -> Option<BodyId> {
        self.players.get(&actor).map(|p| p.body)
    }

    pub fn set_body_present(&mut self, actor: ActorId, present: bool) {
        if let Some(p) = self.players.get_mut(&actor) {
            p.present = present;
        }
    }

    /// Spawn a body no player controls (projectile, debris).
    pub fn spawn_prop(&mut self) -> BodyId {
        self.alloc_body()
    }

    pub fn players_wire(&self) -> Vec<PlayerWire> {
        self.players
            .iter()
            .map(|(id, p)| PlayerWire {
                id: id.0,
                pos: p.position.to_array(),
                vel: p.velocity.to_array(),
            })
            .collect()
    }

    fn alloc_body(&mut self) -> BodyId {
        let body = BodyId(self.next_body_id);
        self.next_body_id += 1;
        body
    }

    // --- anchor ---

    /// Start charging a fresh anchor at `position`.
    pub fn begin_charging(&mut self, position: Vec3) -> AnchorId {
        let id = self.alloc_anchor();
        self.anchor = Some(SimAnchor {
            id,
            position,
            radius: self.tuning.start_radius,
            elapsed: 0.0,
            was_charged: false,
        });
        id
    }

    /// Swap the anchor instance in place, keeping its geometry.
    pub fn replace_anchor(&mut self) -> Option<AnchorId> {
        let id = self.alloc_anchor();
        let anchor = self.anchor.as_mut()?;
        anchor.id = id;
        Some(id)
    }

    /// Mark the anchor fully charged. Returns its id.
    pub fn finish_charging(&mut self) -> Option<AnchorId> {
        let anchor = self.anchor.as_mut()?;
        anchor.was_charged = true;
        Some(anchor.id)
    }

    pub fn set_anchor_position(&mut self, position: Vec3) {
        if let Some(a) = self.anchor.as_mut() {
            a.position = position;
        }
    }

    pub fn set_anchor_radius(&mut self, radius: f64) {
        if let Some(a) = self.anchor.as_mut() {
            a.radius = radius;
        }
    }

    pub fn clear_anchor(&mut self) {
        self.anchor = None;
    }

    pub fn anchor(&self) -> Option<&SimAnchor> {
        self.anchor.as_ref()
    }

    fn alloc_anchor(&mut self) -> AnchorId {
        let id = AnchorId(self.next_anchor_id);
        self.next_anchor_id += 1;
        id
    }

    // --- shells ---

    pub fn shell(&self, shell: ShellId) -> Option<&SimShell> {
        self.shells.get(&shell)
    }

    pub fn shell_count(&self) -> usize {
        self.shells.len()
    }

    /// Number of `set_shell_scale` calls that hit a live shell.
    pub fn shell_scale_writes(&self) -> usize {
        self.shell_scale_writes
    }

    pub fn shell_position_writes(&self) -> usize {
        self.shell_position_writes
    }

    /// Tear a shell down behind the plugin's back.
    pub fn invalidate_shell(&mut self, shell: ShellId) -> bool {
        self.shells.remove(&shell).is_some()
    }

    // --- scene and modifiers ---

    /// Unload the current scene: shells and the anchor go away, players stay.
    pub fn load_scene(&mut self) {
        self.shells.clear();
        self.anchor = None;
        self.scene_count += 1;
        tracing::debug!("Scene {} loaded", self.scene_count);
    }

    pub fn scene_count(&self) -> u32 {
        self.scene_count
    }

    pub fn set_modifier_enabled(&mut self, key: &ModifierKey, enabled: bool) {
        if enabled {
            self.enabled_modifiers.insert(key.clone());
        } else {
            self.enabled_modifiers.remove(key);
        }
    }

    pub fn registered_modifiers(&self) -> &[ModifierDef] {
        &self.registered
    }

    // --- simulation ---

    /// Advance the world by `dt` seconds. Returns the anchor id when the
    /// anchor became fully charged during this step.
    pub fn step(&mut self, dt: f64) -> Option<AnchorId> {
        let gravity = scale(Vec3::UP, -self.gravity);
        for p in self.players.values_mut().filter(|p| p.present) {
            p.velocity = add(p.velocity, scale(gravity, dt));
            p.position = add(p.position, scale(p.velocity, dt));
        }

        let tuning = self.tuning;
        let anchor = self.anchor.as_mut()?;
        if anchor.was_charged {
            return None;
        }
        anchor.elapsed += dt;
        anchor.radius = (anchor.radius + tuning.growth_rate * dt).min(tuning.max_radius);
        if anchor.elapsed >= tuning.charge_duration {
            anchor.was_charged = true;
            return Some(anchor.id);
        }
        None
    }
}

impl AnchorSource for SimWorld {
    fn charging_anchor(&self) -> Option<AnchorState> {
        self.anchor.as_ref().map(|a| AnchorState {
            id: a.id,
            position: a.position,
            radius: a.radius,
            was_charged: a.was_charged,
        })
    }
}

impl ActorRoster for SimWorld {
    fn player_actors(&self) -> Vec<ActorId> {
        self.players.keys().copied().collect()
    }

    fn motor(&mut self, actor: ActorId) -> Option<&mut dyn CharacterMotor> {
        self.players
            .get_mut(&actor)
            .filter(|p| p.present)
            .map(|p| p as &mut dyn CharacterMotor)
    }
}

impl ShellScene for SimWorld {
    fn spawn_shell(&mut self, spawn: ShellSpawn) -> ShellId {
        let id = ShellId(self.next_shell_id);
        self.next_shell_id += 1;
        self.shells.insert(
            id,
            SimShell {
                name: spawn.name,
                position: spawn.position,
                scale: spawn.scale,
                layer: spawn.layer,
                mesh: spawn.mesh,
            },
        );
        id
    }

    fn set_shell_position(&mut self, shell: ShellId, position: Vec3) {
        if let Some(s) = self.shells.get_mut(&shell) {
            s.position = position;
            self.shell_position_writes += 1;
        }
    }

    fn set_shell_scale(&mut self, shell: ShellId, scale: f64) {
        if let Some(s) = self.shells.get_mut(&shell) {
            s.scale = scale;
            self.shell_scale_writes += 1;
        }
    }

    fn despawn_shell(&mut self, shell: ShellId) {
        self.shells.remove(&shell);
    }

    fn is_shell_valid(&self, shell: ShellId) -> bool {
        self.shells.contains_key(&shell)
    }
}

impl ModifierCatalog for SimWorld {
    fn is_modifier_enabled(&self, key: &ModifierKey) -> bool {
        self.enabled_modifiers.contains(key)
    }
}

impl ModifierRegistry for SimWorld {
    fn contains(&self, key: &ModifierKey) -> bool {
        self.registered.iter().any(|d| &d.key == key)
    }

    fn register(&mut self, def: ModifierDef) {
        self.registered.push(def);
    }

    fn attach_controller(&mut self, key: &ModifierKey) -> bool {
        self.controllers.insert(key.clone())
    }

    fn detach_controller(&mut self, key: &ModifierKey) {
        self.controllers.remove(key);
    }
}

impl ActorLookup for SimWorld {
    fn player_controller(&self, body: BodyId) -> Option<ActorId> {
        self.body_owners.get(&body).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use letmeout_shared::vec3::vec3;

    #[test]
    fn absent_body_has_no_motor() {
        let mut world = SimWorld::new();
        let id = world.spawn_player(Vec3::ZERO, Vec3::ZERO, 2.0);
        assert!(world.motor(id).is_some());
        world.set_body_present(id, false);
        assert!(world.motor(id).is_none());
        assert_eq!(world.player_actors(), vec![id]);
    }

    #[test]
    fn step_integrates_present_bodies_only() {
        let mut world = SimWorld::new();
        let a = world.spawn_player(Vec3::ZERO, vec3(1.0, 0.0, 0.0), 2.0);
        let b = world.spawn_player(Vec3::ZERO, vec3(1.0, 0.0, 0.0), 2.0);
        world.set_body_present(b, false);
        world.step(0.5);
        assert_eq!(world.player(a).unwrap().position, vec3(0.5, 0.0, 0.0));
        assert_eq!(world.player(b).unwrap().position, Vec3::ZERO);
    }

    #[test]
    fn anchor_grows_and_reports_charged_once() {
        let config = HarnessConfig {
            anchor_start_radius: 10.0,
            anchor_growth_rate: 4.0,
            anchor_max_radius: 14.0,
            charge_duration: 2.0,
            ..Default::default()
        };
        let mut world = SimWorld::with_config(&config);
        let id = world.begin_charging(Vec3::ZERO);

        assert_eq!(world.step(0.5), None);
        assert_eq!(world.anchor().unwrap().radius, 12.0);
        assert_eq!(world.step(1.5), Some(id));
        assert_eq!(world.anchor().unwrap().radius, 14.0);
        assert!(world.charging_anchor().unwrap().was_charged);
        assert_eq!(world.step(1.0), None);
    }

    #[test]
    fn replaced_anchor_gets_new_id() {
        let mut world = SimWorld::new();
        let first = world.begin_charging(Vec3::ZERO);
        let second = world.replace_anchor().unwrap();
        assert_ne!(first, second);
        assert_eq!(world.charging_anchor().unwrap().id, second);
    }

    #[test]
    fn scene_load_drops_shells_and_anchor() {
        let mut world = SimWorld::new();
        world.begin_charging(Vec3::ZERO);
        let shell = world.spawn_shell(ShellSpawn {
            name: "s",
            position: Vec3::ZERO,
            scale: 1.0,
            layer: 0,
            mesh: Arc::new(IcoSphere::new(0)),
        });
        world.load_scene();
        assert!(!world.is_shell_valid(shell));
        assert!(world.charging_anchor().is_none());
        assert_eq!(world.scene_count(), 1);
    }

    #[test]
    fn lookup_resolves_player_bodies_only() {
        let mut world = SimWorld::new();
        let actor = world.spawn_player(Vec3::ZERO, Vec3::ZERO, 2.0);
        let body = world.player_body(actor).unwrap();
        let prop = world.spawn_prop();
        assert_eq!(world.player_controller(body), Some(actor));
        assert_eq!(world.player_controller(prop), None);

        world.despawn_player(actor);
        assert_eq!(world.player_controller(body), None);
    }
}
