use serde::{Deserialize, Serialize};

/// Snapshot format version - increment when making breaking changes.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeStateWire {
    Idle,
    /// Charging, but still inside the start delay.
    Armed,
    Charging,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryWire {
    pub center: [f64; 3],
    pub radius: f64,
    pub shell_scale: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerWire {
    pub id: u32,
    pub pos: [f64; 3],
    pub vel: [f64; 3],
}

/// Per-tick correction counters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionCounts {
    pub untouched: u32,
    pub nudged: u32,
    pub reflected: u32,
    pub teleported: u32,
    pub skipped: u32,
}

impl CorrectionCounts {
    pub fn accumulate(&mut self, other: &CorrectionCounts) {
        self.untouched += other.untouched;
        self.nudged += other.nudged;
        self.reflected += other.reflected;
        self.teleported += other.teleported;
        self.skipped += other.skipped;
    }

    pub fn corrected(&self) -> u32 {
        self.nudged + self.reflected + self.teleported
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HostSnapshot {
    pub version: u32,
    pub tick: u64,
    pub time: f64,
    pub artifact_enabled: bool,
    pub charge_state: ChargeStateWire,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boundary: Option<BoundaryWire>,
    pub players: Vec<PlayerWire>,
    /// Corrections applied since the previous snapshot.
    pub corrections: CorrectionCounts,
}
