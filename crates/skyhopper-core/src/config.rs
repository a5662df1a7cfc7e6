//! Engine configuration: starting stats for new nodes and the upgrade table.

use crate::fixed::{seconds, Seconds};
use crate::node::{Capped, Improvement, Upgrades};
use crate::upgrade::{UpgradeLadder, UpgradeTable};
use serde::{Deserialize, Serialize};

/// Stat values a freshly placed node starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartingStats {
    pub suction_speed: Seconds,
    pub suction_amount: u32,
    pub suction_range: u32,
    pub transfer_speed: Seconds,
    pub transfer_amount: u32,
    pub max_links: u32,
}

impl Default for StartingStats {
    fn default() -> Self {
        Self {
            suction_speed: seconds(1.0),
            suction_amount: 1,
            suction_range: 1,
            transfer_speed: seconds(1.0),
            transfer_amount: 1,
            max_links: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub starting: StartingStats,
    pub upgrades: UpgradeTable,
}

fn capped<T: PartialOrd + Copy>(start: T, ladder: &UpgradeLadder<T>, dir: Improvement) -> Capped<T> {
    match ladder.best() {
        Some(best) if dir.is_better(best.value, start) => Capped::new(start, best.value, dir),
        _ => Capped::fixed(start, dir),
    }
}

impl EngineConfig {
    pub fn new(starting: StartingStats, upgrades: UpgradeTable) -> Self {
        Self { starting, upgrades }
    }

    /// Upgrade state of a new node: starting values, capped at the best tier
    /// of each ladder (or at the starting value when the ladder is empty).
    pub fn default_upgrades(&self) -> Upgrades {
        let s = &self.starting;
        let t = &self.upgrades;
        Upgrades {
            transfer_speed: capped(s.transfer_speed, &t.transfer_speed, Improvement::Decrease),
            transfer_amount: capped(s.transfer_amount, &t.transfer_amount, Improvement::Increase),
            suction_speed: capped(s.suction_speed, &t.suction_speed, Improvement::Decrease),
            suction_amount: capped(s.suction_amount, &t.suction_amount, Improvement::Increase),
            suction_range: capped(s.suction_range, &t.suction_range, Improvement::Increase),
            max_links: capped(s.max_links, &t.max_links, Improvement::Increase),
        }
    }
}
