use crate::host::{ActorRoster, CharacterMotor};
use letmeout_shared::config::{ContainmentConfig, ReflectionMode};
use letmeout_shared::protocol::CorrectionCounts;
use letmeout_shared::vec3::{
    add, dot, heading_direction, length, length_sq, project, scale, sub, Vec3,
};
use rand::Rng;
use std::f64::consts::TAU;

/// Concentric distance ranges around the boundary center.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Inside,
    Correction,
    FarEscape,
}

/// What the simulator did to one body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Correction {
    None,
    Nudged,
    Reflected,
    Teleported { to: Vec3 },
}

/// Boundary geometry as seen by one simulator pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundarySample {
    pub center: Vec3,
    pub radius: f64,
}

impl BoundarySample {
    pub fn is_materialized(&self) -> bool {
        self.radius.is_finite() && self.radius > 0.0 && self.center.is_finite()
    }
}

/// Classify a radial distance against the band thresholds.
pub fn classify(distance: f64, radius: f64, config: &ContainmentConfig) -> Band {
    if distance < radius * config.inner_band_factor {
        Band::Inside
    } else if distance > radius * config.escape_band_factor {
        Band::FarEscape
    } else {
        Band::Correction
    }
}

/// Per-tick containment of player bodies.
pub struct ContainmentSimulator {
    config: ContainmentConfig,
}

impl ContainmentSimulator {
    pub fn new(config: ContainmentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ContainmentConfig {
        &self.config
    }

    /// Velocity after a correction-band pass. `delta` is the outward offset
    /// from the center.
    pub fn correct_velocity(&self, velocity: Vec3, delta: Vec3) -> (Vec3, Correction) {
        let min_speed = self.config.slow_speed_threshold;
        if length_sq(velocity) < min_speed * min_speed {
            let nudged = add(velocity, scale(delta, -self.config.nudge_gain));
            return (nudged, Correction::Nudged);
        }

        let radial = project(velocity, delta);
        let outward = dot(radial, delta) > 0.0;
        match self.config.reflection {
            ReflectionMode::PreserveTangential => {
                if outward {
                    (sub(velocity, radial), Correction::Reflected)
                } else {
                    (velocity, Correction::None)
                }
            }
            ReflectionMode::RadialOnly => {
                let v = if outward { scale(radial, -1.0) } else { radial };
                (v, Correction::Reflected)
            }
        }
    }

    /// Landing spot for a far-escaped body: a fixed horizontal offset at
    /// heading `yaw`, lifted by a multiple of the capsule height.
    pub fn teleport_target(&self, center: Vec3, capsule_height: f64, yaw: f64) -> Vec3 {
        let horizontal = scale(heading_direction(yaw), self.config.teleport_horizontal_offset);
        let lift = scale(Vec3::UP, capsule_height * self.config.teleport_height_factor);
        add(add(center, horizontal), lift)
    }

    /// Upper bound of `|teleport_target - center|`.
    pub fn max_teleport_distance(&self, capsule_height: f64) -> f64 {
        self.config.teleport_horizontal_offset
            + capsule_height * self.config.teleport_height_factor
    }

    /// Apply the band rules to a single motor.
    pub fn apply(
        &self,
        sample: BoundarySample,
        motor: &mut dyn CharacterMotor,
        rng: &mut impl Rng,
    ) -> Correction {
        let delta = sub(motor.position(), sample.center);
        let distance = length(delta);

        match classify(distance, sample.radius, &self.config) {
            Band::Inside => Correction::None,
            Band::FarEscape => {
                let yaw = rng.gen_range(0.0..TAU);
                let to = self.teleport_target(sample.center, motor.capsule_height(), yaw);
                motor.set_position(to);
                tracing::debug!(
                    "Teleported escaped body at {:.2} (radius {:.2})",
                    distance,
                    sample.radius
                );
                Correction::Teleported { to }
            }
            Band::Correction => {
                let (velocity, correction) = self.correct_velocity(motor.velocity(), delta);
                if correction != Correction::None {
                    motor.set_velocity(velocity);
                }
                correction
            }
        }
    }

    /// Simulate one tick over every player actor the roster reports.
    /// Actors without a resolvable motor are skipped.
    pub fn tick<R: ActorRoster + ?Sized>(
        &self,
        sample: BoundarySample,
        roster: &mut R,
        rng: &mut impl Rng,
    ) -> CorrectionCounts {
        let mut counts = CorrectionCounts::default();
        if !sample.is_materialized() {
            return counts;
        }

        for actor in roster.player_actors() {
            let Some(motor) = roster.motor(actor) else {
                counts.skipped += 1;
                continue;
            };
            match self.apply(sample, motor, rng) {
                Correction::None => counts.untouched += 1,
                Correction::Nudged => counts.nudged += 1,
                Correction::Reflected => counts.reflected += 1,
                Correction::Teleported { .. } => counts.teleported += 1,
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::SimWorld;
    use letmeout_shared::vec3::{normalize, vec3};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn assert_vec3_close(actual: Vec3, expected: Vec3) {
        assert!(
            length(sub(actual, expected)) < 1e-9,
            "Expected {:?} to be close to {:?}",
            actual,
            expected
        );
    }

    fn sim() -> ContainmentSimulator {
        ContainmentSimulator::new(ContainmentConfig::default())
    }

    fn sample() -> BoundarySample {
        BoundarySample {
            center: vec3(0.0, 0.0, 0.0),
            radius: 20.0,
        }
    }

    // --- classify ---

    #[test]
    fn classify_bands() {
        let config = ContainmentConfig::default();
        assert_eq!(classify(0.0, 20.0, &config), Band::Inside);
        assert_eq!(classify(19.5, 20.0, &config), Band::Inside);
        assert_eq!(classify(19.6, 20.0, &config), Band::Correction);
        assert_eq!(classify(27.0, 20.0, &config), Band::Correction);
        assert_eq!(classify(27.1, 20.0, &config), Band::FarEscape);
    }

    // --- inside band ---

    #[test]
    fn inside_band_is_untouched() {
        let mut world = SimWorld::new();
        let positions = [
            vec3(0.0, 0.0, 0.0),
            vec3(10.0, 5.0, -3.0),
            vec3(0.0, 19.5, 0.0),
            vec3(-13.0, 0.0, 13.0),
        ];
        let ids: Vec<_> = positions
            .iter()
            .map(|&p| world.spawn_player(p, vec3(30.0, -4.0, 12.0), 2.0))
            .collect();

        let counts = sim().tick(sample(), &mut world, &mut test_rng());

        assert_eq!(counts.untouched, 4);
        assert_eq!(counts.corrected(), 0);
        for (id, p) in ids.iter().zip(positions) {
            let body = world.player(*id).unwrap();
            assert_eq!(body.position, p);
            assert_eq!(body.velocity, vec3(30.0, -4.0, 12.0));
        }
    }

    // --- correction band, slow ---

    #[test]
    fn slow_body_gets_exact_inward_nudge() {
        let mut world = SimWorld::new();
        let pos = vec3(21.0, 3.0, 0.0);
        let vel = vec3(2.0, 1.0, -3.0);
        let id = world.spawn_player(pos, vel, 2.0);

        let counts = sim().tick(sample(), &mut world, &mut test_rng());

        assert_eq!(counts.nudged, 1);
        let delta = sub(pos, sample().center);
        let expected = add(vel, scale(delta, -0.1));
        assert_eq!(world.player(id).unwrap().velocity, expected);
        assert_eq!(world.player(id).unwrap().position, pos);
    }

    // --- correction band, fast ---

    fn preserve_tangential() -> ContainmentSimulator {
        ContainmentSimulator::new(ContainmentConfig {
            reflection: ReflectionMode::PreserveTangential,
            ..Default::default()
        })
    }

    #[test]
    fn fast_outward_body_is_sent_back_along_radius() {
        let delta = vec3(21.0, 0.0, 0.0);
        let (v, c) = sim().correct_velocity(vec3(15.0, 0.0, 8.0), delta);
        assert_eq!(c, Correction::Reflected);
        assert!(dot(v, delta) <= 0.0);
        assert_vec3_close(v, vec3(-15.0, 0.0, 0.0));
    }

    #[test]
    fn fast_inward_body_keeps_only_radial_motion() {
        let mut world = SimWorld::new();
        let id = world.spawn_player(vec3(21.0, 0.0, 0.0), vec3(-15.0, 2.0, 8.0), 2.0);

        let counts = sim().tick(sample(), &mut world, &mut test_rng());

        assert_eq!(counts.reflected, 1);
        assert_vec3_close(world.player(id).unwrap().velocity, vec3(-15.0, 0.0, 0.0));
    }

    #[test]
    fn preserve_tangential_cancels_outward_motion() {
        let delta = vec3(21.0, 0.0, 0.0);
        let (v, c) = preserve_tangential().correct_velocity(vec3(15.0, 0.0, 8.0), delta);
        assert_eq!(c, Correction::Reflected);
        assert_vec3_close(v, vec3(0.0, 0.0, 8.0));
    }

    #[test]
    fn preserve_tangential_keeps_inward_velocity() {
        let delta = vec3(21.0, 0.0, 0.0);
        let vel = vec3(-15.0, 2.0, 8.0);
        let (v, c) = preserve_tangential().correct_velocity(vel, delta);
        assert_eq!(c, Correction::None);
        assert_eq!(v, vel);
    }

    #[test]
    fn radial_only_mode_matches_projection() {
        let s = sim();
        let delta = vec3(0.0, 0.0, 22.0);
        let (v, c) = s.correct_velocity(vec3(5.0, 0.0, 12.0), delta);
        assert_eq!(c, Correction::Reflected);
        assert_vec3_close(v, vec3(0.0, 0.0, -12.0));

        // Inward motion: tangential part dropped, radial kept.
        let (v, _) = s.correct_velocity(vec3(5.0, 0.0, -12.0), delta);
        assert_vec3_close(v, vec3(0.0, 0.0, -12.0));
    }

    #[test]
    fn fast_bodies_never_move_further_out() {
        let mut rng = test_rng();
        for mode in [ReflectionMode::PreserveTangential, ReflectionMode::RadialOnly] {
            let s = ContainmentSimulator::new(ContainmentConfig {
                reflection: mode,
                ..Default::default()
            });
            for _ in 0..500 {
                let dir = normalize(vec3(
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                ));
                let delta = scale(dir, rng.gen_range(19.6..27.0));
                let vel = vec3(
                    rng.gen_range(-40.0..40.0),
                    rng.gen_range(-40.0..40.0),
                    rng.gen_range(-40.0..40.0),
                );
                if length(vel) < 10.0 {
                    continue;
                }
                let (v, _) = s.correct_velocity(vel, delta);
                assert!(dot(v, delta) <= 1e-9, "mode {:?} vel {:?}", mode, vel);
            }
        }
    }

    // --- far escape ---

    #[test]
    fn far_escape_teleports_near_center() {
        let mut world = SimWorld::new();
        let center = vec3(5.0, 1.0, -2.0);
        let s = BoundarySample {
            center,
            radius: 20.0,
        };
        let capsule_height = 1.8;
        let id = world.spawn_player(vec3(40.0, 1.0, -2.0), vec3(50.0, 0.0, 0.0), capsule_height);

        let counts = sim().tick(s, &mut world, &mut test_rng());

        assert_eq!(counts.teleported, 1);
        let body = world.player(id).unwrap();
        let offset = sub(body.position, center);
        assert!(length(offset) <= sim().max_teleport_distance(capsule_height) + 1e-9);
        assert_eq!(sim().max_teleport_distance(capsule_height), 5.0 + 2.0 * capsule_height);
        assert!((offset.y - 2.0 * capsule_height).abs() < 1e-9);
        let horizontal = (offset.x * offset.x + offset.z * offset.z).sqrt();
        assert!((horizontal - 5.0).abs() < 1e-9);
    }

    #[test]
    fn teleport_target_ignores_velocity() {
        let run = |vel: Vec3| {
            let mut world = SimWorld::new();
            let id = world.spawn_player(vec3(0.0, 0.0, 30.0), vel, 2.0);
            sim().tick(sample(), &mut world, &mut test_rng());
            world.player(id).unwrap().position
        };
        assert_eq!(run(vec3(0.0, 0.0, 0.0)), run(vec3(-80.0, 12.0, 300.0)));
    }

    #[test]
    fn teleport_headings_vary() {
        let s = sim();
        let mut rng = test_rng();
        let mut world = SimWorld::new();
        let id = world.spawn_player(vec3(0.0, 0.0, 50.0), Vec3::ZERO, 1.0);
        let mut landings = Vec::new();
        for _ in 0..8 {
            world.player_mut(id).unwrap().position = vec3(0.0, 0.0, 50.0);
            s.tick(sample(), &mut world, &mut rng);
            landings.push(world.player(id).unwrap().position);
        }
        let distinct = landings
            .iter()
            .filter(|p| length(sub(**p, landings[0])) > 1e-6)
            .count();
        assert!(distinct > 0);
    }

    // --- skipping ---

    #[test]
    fn missing_motor_is_skipped() {
        let mut world = SimWorld::new();
        let a = world.spawn_player(vec3(25.0, 0.0, 0.0), Vec3::ZERO, 2.0);
        let b = world.spawn_player(vec3(25.0, 0.0, 0.0), Vec3::ZERO, 2.0);
        world.set_body_present(a, false);

        let counts = sim().tick(sample(), &mut world, &mut test_rng());

        assert_eq!(counts.skipped, 1);
        assert_eq!(counts.nudged, 1);
        assert_eq!(world.player(a).unwrap().velocity, Vec3::ZERO);
        assert_ne!(world.player(b).unwrap().velocity, Vec3::ZERO);
    }

    #[test]
    fn unmaterialized_boundary_does_nothing() {
        let mut world = SimWorld::new();
        let id = world.spawn_player(vec3(100.0, 0.0, 0.0), vec3(1.0, 0.0, 0.0), 2.0);
        let s = BoundarySample {
            center: Vec3::ZERO,
            radius: 0.0,
        };
        let counts = sim().tick(s, &mut world, &mut test_rng());
        assert_eq!(counts, CorrectionCounts::default());
        assert_eq!(world.player(id).unwrap().position, vec3(100.0, 0.0, 0.0));
    }
}
