use crate::gate::CollisionGate;
use crate::host::{ShellId, ShellScene, ShellSpawn};
use crate::icosphere::IcoSphere;
use letmeout_shared::config::ShellConfig;
use letmeout_shared::protocol::BoundaryWire;
use letmeout_shared::vec3::Vec3;
use std::sync::Arc;

pub const SHELL_NAME: &str = "LetMeOutCollider";

/// Direction the logical radius moved on the last update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Growth {
    Growing,
    Steady,
    Shrinking,
}

/// The live containment sphere and the host shell representing it.
#[derive(Debug)]
pub struct Boundary {
    shell: ShellId,
    center: Vec3,
    radius: f64,
    shell_scale: f64,
    growth: Growth,
    gate: CollisionGate,
}

impl Boundary {
    pub fn shell(&self) -> ShellId {
        self.shell
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Logical radius used for containment decisions.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Scale last written to the host shell (physical radius).
    pub fn shell_scale(&self) -> f64 {
        self.shell_scale
    }

    pub fn growth(&self) -> Growth {
        self.growth
    }

    pub fn gate(&self) -> &CollisionGate {
        &self.gate
    }

    pub fn gate_mut(&mut self) -> &mut CollisionGate {
        &mut self.gate
    }

    pub fn to_wire(&self) -> BoundaryWire {
        BoundaryWire {
            center: self.center.to_array(),
            radius: self.radius,
            shell_scale: self.shell_scale,
        }
    }
}

/// Builds, resizes and tears down the boundary shell.
pub struct BoundaryGeometry {
    config: ShellConfig,
    mesh: Option<Arc<IcoSphere>>,
}

impl BoundaryGeometry {
    pub fn new(config: ShellConfig) -> Self {
        Self { config, mesh: None }
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Unit mesh, built on first use and shared by every shell afterwards.
    pub fn mesh(&mut self) -> Arc<IcoSphere> {
        let subdivisions = self.config.subdivisions;
        self.mesh
            .get_or_insert_with(|| Arc::new(IcoSphere::new(subdivisions)))
            .clone()
    }

    pub fn physical_radius(&self, radius: f64) -> f64 {
        radius * self.config.collision_scale
    }

    /// Spawn a shell at `center` sized for `radius`, with its collision gate.
    pub fn create<S: ShellScene + ?Sized>(
        &mut self,
        scene: &mut S,
        center: Vec3,
        radius: f64,
    ) -> Boundary {
        let shell_scale = self.physical_radius(radius);
        let shell = scene.spawn_shell(ShellSpawn {
            name: SHELL_NAME,
            position: center,
            scale: shell_scale,
            layer: self.config.layer,
            mesh: self.mesh(),
        });
        tracing::debug!("Boundary shell {:?} spawned, radius {:.2}", shell, radius);

        Boundary {
            shell,
            center,
            radius,
            shell_scale,
            growth: Growth::Steady,
            gate: CollisionGate::new(shell),
        }
    }

    /// Track a new logical radius. The shell transform is only rewritten when
    /// the physical scale drifts by more than the hysteresis.
    /// Returns true if the shell was rescaled.
    pub fn update_radius<S: ShellScene + ?Sized>(
        &self,
        boundary: &mut Boundary,
        scene: &mut S,
        radius: f64,
    ) -> bool {
        boundary.growth = if radius > boundary.radius {
            Growth::Growing
        } else if radius < boundary.radius {
            Growth::Shrinking
        } else {
            Growth::Steady
        };
        boundary.radius = radius;

        let target = self.physical_radius(radius);
        if (boundary.shell_scale - target).abs() > self.config.rescale_hysteresis {
            scene.set_shell_scale(boundary.shell, target);
            boundary.shell_scale = target;
            return true;
        }
        false
    }

    /// Follow the anchor. Returns true if the shell was moved.
    pub fn update_center<S: ShellScene + ?Sized>(
        &self,
        boundary: &mut Boundary,
        scene: &mut S,
        center: Vec3,
    ) -> bool {
        if boundary.center == center {
            return false;
        }
        boundary.center = center;
        scene.set_shell_position(boundary.shell, center);
        true
    }

    pub fn destroy<S: ShellScene + ?Sized>(&self, boundary: Boundary, scene: &mut S) {
        scene.despawn_shell(boundary.shell);
        tracing::debug!("Boundary shell {:?} despawned", boundary.shell);
    }
}
