/// How the correction band treats a fast body moving outward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReflectionMode {
    /// Cancel the outward radial component, keep the tangential one.
    /// Inward movers are left alone.
    PreserveTangential,
    /// Replace the velocity with its radial projection, negated if it points
    /// outward. Tangential motion is dropped.
    RadialOnly,
}

/// Containment band thresholds and correction gains.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainmentConfig {
    /// Bodies closer than `radius * inner_band_factor` are left alone.
    pub inner_band_factor: f64,
    /// Bodies further than `radius * escape_band_factor` are teleported back.
    pub escape_band_factor: f64,
    /// Below this speed the correction band nudges instead of reflecting.
    pub slow_speed_threshold: f64,
    /// Restoring gain applied to the radial offset: `v += delta * -gain`.
    pub nudge_gain: f64,
    /// Horizontal distance from the center where teleported bodies land.
    pub teleport_horizontal_offset: f64,
    /// Teleport lift as a multiple of the body's capsule height.
    pub teleport_height_factor: f64,
    pub reflection: ReflectionMode,
}

impl Default for ContainmentConfig {
    fn default() -> Self {
        Self {
            inner_band_factor: 0.98,
            escape_band_factor: 1.35,
            slow_speed_threshold: 10.0,
            nudge_gain: 0.1,
            teleport_horizontal_offset: 5.0,
            teleport_height_factor: 2.0,
            reflection: ReflectionMode::RadialOnly,
        }
    }
}

impl ContainmentConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.inner_band_factor.is_finite() || self.inner_band_factor <= 0.0 {
            return Err("inner_band_factor must be finite and > 0".to_string());
        }
        if !self.escape_band_factor.is_finite() || self.escape_band_factor < self.inner_band_factor
        {
            return Err("escape_band_factor must be finite and >= inner_band_factor".to_string());
        }
        if !self.slow_speed_threshold.is_finite() || self.slow_speed_threshold < 0.0 {
            return Err("slow_speed_threshold must be finite and >= 0".to_string());
        }
        if !self.nudge_gain.is_finite() || self.nudge_gain < 0.0 {
            return Err("nudge_gain must be finite and >= 0".to_string());
        }
        if !self.teleport_horizontal_offset.is_finite() || self.teleport_horizontal_offset < 0.0 {
            return Err("teleport_horizontal_offset must be finite and >= 0".to_string());
        }
        if !self.teleport_height_factor.is_finite() || self.teleport_height_factor < 0.0 {
            return Err("teleport_height_factor must be finite and >= 0".to_string());
        }
        Ok(())
    }
}

/// Physical shell parameters.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShellConfig {
    /// Physical radius as a multiple of the logical containment radius.
    pub collision_scale: f64,
    /// Minimum scale change before the shell transform is rewritten.
    pub rescale_hysteresis: f64,
    /// Icosphere refinement level of the unit mesh.
    pub subdivisions: u32,
    /// Collision layer the shell is spawned on.
    pub layer: u32,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            collision_scale: 1.01,
            rescale_hysteresis: 0.1,
            subdivisions: 2,
            layer: 11,
        }
    }
}

impl ShellConfig {
    /// Cap on refinement; level 6 is already ~40k triangles.
    pub const MAX_SUBDIVISIONS: u32 = 6;

    pub fn validate(&self) -> Result<(), String> {
        if !self.collision_scale.is_finite() || self.collision_scale < 1.0 {
            return Err("collision_scale must be finite and >= 1".to_string());
        }
        if !self.rescale_hysteresis.is_finite() || self.rescale_hysteresis < 0.0 {
            return Err("rescale_hysteresis must be finite and >= 0".to_string());
        }
        if self.subdivisions > Self::MAX_SUBDIVISIONS {
            return Err(format!(
                "subdivisions must be <= {}",
                Self::MAX_SUBDIVISIONS
            ));
        }
        Ok(())
    }
}

/// Charge lifecycle timing.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LifecycleConfig {
    /// Seconds between the charge-begin signal and containment kicking in.
    pub charge_start_delay: f64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            charge_start_delay: 2.0,
        }
    }
}

impl LifecycleConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.charge_start_delay.is_finite() || self.charge_start_delay < 0.0 {
            return Err("charge_start_delay must be finite and >= 0".to_string());
        }
        Ok(())
    }
}

/// Full plugin configuration.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModConfig {
    pub containment: ContainmentConfig,
    pub shell: ShellConfig,
    pub lifecycle: LifecycleConfig,
    /// Seed for teleport headings.
    pub rng_seed: u64,
}

impl Default for ModConfig {
    fn default() -> Self {
        Self {
            containment: ContainmentConfig::default(),
            shell: ShellConfig::default(),
            lifecycle: LifecycleConfig::default(),
            rng_seed: 42,
        }
    }
}

impl ModConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.containment.validate()?;
        self.shell.validate()?;
        self.lifecycle.validate()?;
        Ok(())
    }

    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Reference host / harness configuration
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HarnessConfig {
    pub tick_rate_hz: u32,
    pub snapshot_rate_hz: u32,
    /// Radius growth of the charging anchor (units per second).
    pub anchor_growth_rate: f64,
    pub anchor_start_radius: f64,
    pub anchor_max_radius: f64,
    /// Seconds of charging until the anchor reports fully charged.
    pub charge_duration: f64,
    pub gravity: f64,
    pub mod_config: ModConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            snapshot_rate_hz: 10,
            anchor_growth_rate: 2.0,
            anchor_start_radius: 10.0,
            anchor_max_radius: 60.0,
            charge_duration: 90.0,
            gravity: 0.0,
            mod_config: ModConfig::default(),
        }
    }
}

impl HarnessConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_rate_hz == 0 {
            return Err("tick_rate_hz must be > 0".to_string());
        }
        if self.snapshot_rate_hz == 0 || self.snapshot_rate_hz > self.tick_rate_hz {
            return Err("snapshot_rate_hz must be in 1..=tick_rate_hz".to_string());
        }
        if !self.anchor_start_radius.is_finite() || self.anchor_start_radius <= 0.0 {
            return Err("anchor_start_radius must be finite and > 0".to_string());
        }
        if !self.anchor_max_radius.is_finite() || self.anchor_max_radius < self.anchor_start_radius
        {
            return Err("anchor_max_radius must be finite and >= anchor_start_radius".to_string());
        }
        if !self.charge_duration.is_finite() || self.charge_duration <= 0.0 {
            return Err("charge_duration must be finite and > 0".to_string());
        }
        self.mod_config.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mod_config_is_valid() {
        assert!(ModConfig::default().validate().is_ok());
    }

    #[test]
    fn default_harness_config_is_valid() {
        assert!(HarnessConfig::default().validate().is_ok());
    }

    #[test]
    fn escape_band_inside_inner_band_invalid() {
        let mut config = ContainmentConfig::default();
        config.escape_band_factor = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn shrinking_shell_invalid() {
        let mut config = ShellConfig::default();
        config.collision_scale = 0.9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn too_many_subdivisions_invalid() {
        let mut config = ShellConfig::default();
        config.subdivisions = ShellConfig::MAX_SUBDIVISIONS + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_delay_invalid() {
        let config = LifecycleConfig {
            charge_start_delay: -1.0,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config =
            ModConfig::from_json_str(r#"{"containment":{"teleportHorizontalOffset":8.0}}"#)
                .unwrap();
        assert_eq!(config.containment.teleport_horizontal_offset, 8.0);
        assert_eq!(config.containment.inner_band_factor, 0.98);
        assert_eq!(config.lifecycle.charge_start_delay, 2.0);
        assert_eq!(config.shell.collision_scale, 1.01);
    }

    #[test]
    fn reflection_mode_parses_camel_case() {
        let config =
            ModConfig::from_json_str(r#"{"containment":{"reflection":"preserveTangential"}}"#)
                .unwrap();
        assert_eq!(config.containment.reflection, ReflectionMode::PreserveTangential);
    }

    #[test]
    fn default_reflection_drops_tangential_motion() {
        assert_eq!(
            ContainmentConfig::default().reflection,
            ReflectionMode::RadialOnly
        );
    }
}
