//! Serde structs for the settings file.
//!
//! These define the on-disk format for starting stats and upgrade ladders.
//! They are deserialized from RON, JSON, or TOML and then resolved into a
//! core [`EngineConfig`](skyhopper_core::config::EngineConfig) by the loader.

use serde::Deserialize;

// ===========================================================================
// Top level
// ===========================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsData {
    #[serde(default)]
    pub starting: StartingData,
    #[serde(default)]
    pub upgrades: UpgradesData,
}

// ===========================================================================
// Starting stats
// ===========================================================================

/// Stats of a freshly placed node. Speeds are seconds per cycle.
#[derive(Debug, Clone, Deserialize)]
pub struct StartingData {
    #[serde(default = "default_speed")]
    pub suction_speed: f64,
    #[serde(default = "default_one")]
    pub suction_amount: u32,
    #[serde(default = "default_one")]
    pub suction_range: u32,
    #[serde(default = "default_speed")]
    pub transfer_speed: f64,
    #[serde(default = "default_one")]
    pub transfer_amount: u32,
    #[serde(default = "default_one")]
    pub max_links: u32,
}

fn default_speed() -> f64 {
    1.0
}

fn default_one() -> u32 {
    1
}

impl Default for StartingData {
    fn default() -> Self {
        Self {
            suction_speed: default_speed(),
            suction_amount: default_one(),
            suction_range: default_one(),
            transfer_speed: default_speed(),
            transfer_amount: default_one(),
            max_links: default_one(),
        }
    }
}

// ===========================================================================
// Upgrade ladders
// ===========================================================================

/// One purchasable tier.
#[derive(Debug, Clone, Deserialize)]
pub struct TierData<T> {
    pub value: T,
    pub price: f64,
}

/// Ladders per stat. Any ladder may be omitted; order within a ladder does
/// not matter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpgradesData {
    #[serde(default)]
    pub suction_speed: Vec<TierData<f64>>,
    #[serde(default)]
    pub suction_amount: Vec<TierData<u32>>,
    #[serde(default)]
    pub suction_range: Vec<TierData<u32>>,
    #[serde(default)]
    pub transfer_speed: Vec<TierData<f64>>,
    #[serde(default)]
    pub transfer_amount: Vec<TierData<u32>>,
    #[serde(default)]
    pub max_links: Vec<TierData<u32>>,
}
