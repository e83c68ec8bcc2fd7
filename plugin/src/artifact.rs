use crate::host::{ModifierCatalog, ModifierDef, ModifierKey};
use crate::icons::load_icon_or_warn;
use std::path::Path;

/// Registry key and token stem of the modifier.
pub const ARTIFACT_KEY: &str = "ARTIFACT_LETMEOUT_JAIL";
pub const DISPLAY_NAME: &str = "Artifact of Jail";
pub const DESCRIPTION: &str = "When enabled, no player can leave the teleporter zone.";
pub const ENABLED_ICON_FILE: &str = "artifactEnabled.png";
pub const DISABLED_ICON_FILE: &str = "artifactDisabled.png";

pub fn artifact_key() -> ModifierKey {
    ModifierKey::new(ARTIFACT_KEY)
}

/// Build the registration record. Icons that fail to load are left out.
pub fn modifier_def(asset_dir: &Path) -> ModifierDef {
    ModifierDef {
        key: artifact_key(),
        name_token: format!("{}_NAME", ARTIFACT_KEY),
        description_token: format!("{}_DESCRIPTION", ARTIFACT_KEY),
        display_name: DISPLAY_NAME.to_string(),
        description: DESCRIPTION.to_string(),
        enabled_icon: load_icon_or_warn(asset_dir, ENABLED_ICON_FILE),
        disabled_icon: load_icon_or_warn(asset_dir, DISABLED_ICON_FILE),
    }
}

/// Per-run on/off switch, cached once per scene.
#[derive(Debug, Clone)]
pub struct ArtifactToggle {
    key: ModifierKey,
    enabled: bool,
}

impl Default for ArtifactToggle {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactToggle {
    /// Starts disabled until the first scene is loaded.
    pub fn new() -> Self {
        Self {
            key: artifact_key(),
            enabled: false,
        }
    }

    pub fn key(&self) -> &ModifierKey {
        &self.key
    }

    /// Re-query the run's modifier selection. Returns the cached value.
    pub fn refresh<C: ModifierCatalog + ?Sized>(&mut self, catalog: &C) -> bool {
        let enabled = catalog.is_modifier_enabled(&self.key);
        if enabled != self.enabled {
            tracing::info!("Artifact enabled for this scene: {}", enabled);
        }
        self.enabled = enabled;
        enabled
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
