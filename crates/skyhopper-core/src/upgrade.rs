//! Upgrade ladders.
//!
//! Each upgradeable stat has a ladder of tiers, ordered from worst to best in
//! the stat's improvement direction. Prices are carried through for the host's
//! economy; this crate never charges anything.

use crate::fixed::Seconds;
use crate::node::{Capped, Improvement, Node, Upgrades};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The six upgradeable stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeKind {
    SuctionSpeed,
    SuctionAmount,
    SuctionRange,
    TransferSpeed,
    TransferAmount,
    MaxLinks,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 6] = [
        UpgradeKind::SuctionSpeed,
        UpgradeKind::SuctionAmount,
        UpgradeKind::SuctionRange,
        UpgradeKind::TransferSpeed,
        UpgradeKind::TransferAmount,
        UpgradeKind::MaxLinks,
    ];

    pub fn direction(self) -> Improvement {
        match self {
            UpgradeKind::SuctionSpeed | UpgradeKind::TransferSpeed => Improvement::Decrease,
            _ => Improvement::Increase,
        }
    }
}

impl fmt::Display for UpgradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpgradeKind::SuctionSpeed => "suction speed",
            UpgradeKind::SuctionAmount => "suction amount",
            UpgradeKind::SuctionRange => "suction range",
            UpgradeKind::TransferSpeed => "transfer speed",
            UpgradeKind::TransferAmount => "transfer amount",
            UpgradeKind::MaxLinks => "max links",
        };
        f.write_str(name)
    }
}

/// A stat value: cooldowns are seconds, everything else is a count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatValue {
    Seconds(Seconds),
    Count(u32),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UpgradeError {
    #[error("{kind} cannot go past its cap")]
    ExceedsCap { kind: UpgradeKind },
    #[error("{kind} takes a different kind of value")]
    WrongValue { kind: UpgradeKind },
    #[error("{kind} is already at its best tier")]
    Maxed { kind: UpgradeKind },
    #[error("no node at {0:?}")]
    NoSuchNode(crate::id::BlockPos),
}

// ---------------------------------------------------------------------------
// Ladders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tier<T> {
    pub value: T,
    pub price: f64,
}

/// Tiers of one stat, sorted worst to best.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeLadder<T> {
    tiers: Vec<Tier<T>>,
    direction: Improvement,
}

impl<T: PartialOrd + Copy> UpgradeLadder<T> {
    pub fn new(direction: Improvement, mut tiers: Vec<Tier<T>>) -> Self {
        tiers.sort_by(|a, b| {
            let ord = a
                .value
                .partial_cmp(&b.value)
                .unwrap_or(std::cmp::Ordering::Equal);
            match direction {
                Improvement::Increase => ord,
                Improvement::Decrease => ord.reverse(),
            }
        });
        Self { tiers, direction }
    }

    pub fn empty(direction: Improvement) -> Self {
        Self {
            tiers: Vec::new(),
            direction,
        }
    }

    pub fn tiers(&self) -> &[Tier<T>] {
        &self.tiers
    }

    pub fn direction(&self) -> Improvement {
        self.direction
    }

    /// The first tier strictly better than `current`, if any.
    pub fn next_tier(&self, current: T) -> Option<&Tier<T>> {
        self.tiers
            .iter()
            .find(|t| self.direction.is_better(t.value, current))
    }

    /// The best tier on the ladder.
    pub fn best(&self) -> Option<&Tier<T>> {
        self.tiers.last()
    }
}

/// Ladders for every stat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeTable {
    pub suction_speed: UpgradeLadder<Seconds>,
    pub suction_amount: UpgradeLadder<u32>,
    pub suction_range: UpgradeLadder<u32>,
    pub transfer_speed: UpgradeLadder<Seconds>,
    pub transfer_amount: UpgradeLadder<u32>,
    pub max_links: UpgradeLadder<u32>,
}

impl Default for UpgradeTable {
    fn default() -> Self {
        Self {
            suction_speed: UpgradeLadder::empty(Improvement::Decrease),
            suction_amount: UpgradeLadder::empty(Improvement::Increase),
            suction_range: UpgradeLadder::empty(Improvement::Increase),
            transfer_speed: UpgradeLadder::empty(Improvement::Decrease),
            transfer_amount: UpgradeLadder::empty(Improvement::Increase),
            max_links: UpgradeLadder::empty(Improvement::Increase),
        }
    }
}

impl UpgradeTable {
    /// The next tier of `kind` above the node's current value, with its price.
    pub fn next_tier(&self, kind: UpgradeKind, upgrades: &Upgrades) -> Option<(StatValue, f64)> {
        fn seconds(t: &Tier<Seconds>) -> (StatValue, f64) {
            (StatValue::Seconds(t.value), t.price)
        }
        fn count(t: &Tier<u32>) -> (StatValue, f64) {
            (StatValue::Count(t.value), t.price)
        }
        match kind {
            UpgradeKind::SuctionSpeed => self
                .suction_speed
                .next_tier(upgrades.suction_speed.current())
                .map(seconds),
            UpgradeKind::TransferSpeed => self
                .transfer_speed
                .next_tier(upgrades.transfer_speed.current())
                .map(seconds),
            UpgradeKind::SuctionAmount => self
                .suction_amount
                .next_tier(upgrades.suction_amount.current())
                .map(count),
            UpgradeKind::SuctionRange => self
                .suction_range
                .next_tier(upgrades.suction_range.current())
                .map(count),
            UpgradeKind::TransferAmount => self
                .transfer_amount
                .next_tier(upgrades.transfer_amount.current())
                .map(count),
            UpgradeKind::MaxLinks => self
                .max_links
                .next_tier(upgrades.max_links.current())
                .map(count),
        }
    }
}

// ---------------------------------------------------------------------------
// Applying upgrades
// ---------------------------------------------------------------------------

fn set_capped<T: PartialOrd + Copy>(
    stat: &mut Capped<T>,
    value: T,
    kind: UpgradeKind,
) -> Result<(), UpgradeError> {
    if stat.set(value) {
        Ok(())
    } else {
        Err(UpgradeError::ExceedsCap { kind })
    }
}

impl Upgrades {
    pub fn get(&self, kind: UpgradeKind) -> StatValue {
        match kind {
            UpgradeKind::SuctionSpeed => StatValue::Seconds(self.suction_speed.current()),
            UpgradeKind::TransferSpeed => StatValue::Seconds(self.transfer_speed.current()),
            UpgradeKind::SuctionAmount => StatValue::Count(self.suction_amount.current()),
            UpgradeKind::SuctionRange => StatValue::Count(self.suction_range.current()),
            UpgradeKind::TransferAmount => StatValue::Count(self.transfer_amount.current()),
            UpgradeKind::MaxLinks => StatValue::Count(self.max_links.current()),
        }
    }

    /// Set one stat, refusing values past its cap.
    pub fn apply(&mut self, kind: UpgradeKind, value: StatValue) -> Result<(), UpgradeError> {
        match (kind, value) {
            (UpgradeKind::SuctionSpeed, StatValue::Seconds(v)) => {
                set_capped(&mut self.suction_speed, v, kind)
            }
            (UpgradeKind::TransferSpeed, StatValue::Seconds(v)) => {
                set_capped(&mut self.transfer_speed, v, kind)
            }
            (UpgradeKind::SuctionAmount, StatValue::Count(v)) => {
                set_capped(&mut self.suction_amount, v, kind)
            }
            (UpgradeKind::SuctionRange, StatValue::Count(v)) => {
                set_capped(&mut self.suction_range, v, kind)
            }
            (UpgradeKind::TransferAmount, StatValue::Count(v)) => {
                set_capped(&mut self.transfer_amount, v, kind)
            }
            (UpgradeKind::MaxLinks, StatValue::Count(v)) => {
                set_capped(&mut self.max_links, v, kind)
            }
            _ => Err(UpgradeError::WrongValue { kind }),
        }
    }
}

impl Node {
    pub fn apply_upgrade(&mut self, kind: UpgradeKind, value: StatValue) -> Result<(), UpgradeError> {
        self.attrs.upgrades.apply(kind, value)
    }

    /// Step `kind` up to its next tier. Returns the applied value and its price.
    pub fn upgrade_to_next(
        &mut self,
        table: &UpgradeTable,
        kind: UpgradeKind,
    ) -> Result<(StatValue, f64), UpgradeError> {
        let (value, price) = table
            .next_tier(kind, self.upgrades())
            .ok_or(UpgradeError::Maxed { kind })?;
        self.apply_upgrade(kind, value)?;
        Ok((value, price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::seconds;
    use crate::id::{BlockPos, WorldId};
    use crate::node::NodeAttributes;

    fn tier<T>(value: T, price: f64) -> Tier<T> {
        Tier { value, price }
    }

    fn upgrades() -> Upgrades {
        Upgrades {
            transfer_speed: Capped::new(seconds(1.0), seconds(0.25), Improvement::Decrease),
            transfer_amount: Capped::new(1, 16, Improvement::Increase),
            suction_speed: Capped::new(seconds(1.0), seconds(0.5), Improvement::Decrease),
            suction_amount: Capped::new(1, 8, Improvement::Increase),
            suction_range: Capped::new(1, 4, Improvement::Increase),
            max_links: Capped::new(1, 4, Improvement::Increase),
        }
    }

    fn table() -> UpgradeTable {
        UpgradeTable {
            transfer_speed: UpgradeLadder::new(
                Improvement::Decrease,
                vec![tier(seconds(0.25), 500.0), tier(seconds(0.5), 100.0)],
            ),
            transfer_amount: UpgradeLadder::new(
                Improvement::Increase,
                vec![tier(32, 900.0), tier(4, 50.0), tier(16, 300.0)],
            ),
            ..UpgradeTable::default()
        }
    }

    #[test]
    fn ladder_sorts_worst_to_best() {
        let t = table();
        let amounts: Vec<u32> = t.transfer_amount.tiers().iter().map(|t| t.value).collect();
        assert_eq!(amounts, vec![4, 16, 32]);
        let speeds: Vec<_> = t.transfer_speed.tiers().iter().map(|t| t.value).collect();
        assert_eq!(speeds, vec![seconds(0.5), seconds(0.25)]);
    }

    #[test]
    fn next_tier_follows_direction() {
        let t = table();
        assert_eq!(t.transfer_amount.next_tier(4).map(|t| t.value), Some(16));
        assert_eq!(t.transfer_amount.next_tier(10).map(|t| t.value), Some(16));
        assert!(t.transfer_amount.next_tier(32).is_none());
        assert_eq!(
            t.transfer_speed.next_tier(seconds(1.0)).map(|t| t.value),
            Some(seconds(0.5))
        );
        assert!(t.transfer_speed.next_tier(seconds(0.25)).is_none());
    }

    #[test]
    fn apply_rejects_past_cap_and_wrong_kind() {
        let mut u = upgrades();
        assert_eq!(
            u.apply(UpgradeKind::TransferAmount, StatValue::Count(32)),
            Err(UpgradeError::ExceedsCap {
                kind: UpgradeKind::TransferAmount
            })
        );
        assert_eq!(
            u.apply(UpgradeKind::TransferAmount, StatValue::Seconds(seconds(1.0))),
            Err(UpgradeError::WrongValue {
                kind: UpgradeKind::TransferAmount
            })
        );
        assert_eq!(u.apply(UpgradeKind::TransferAmount, StatValue::Count(16)), Ok(()));
        assert_eq!(u.get(UpgradeKind::TransferAmount), StatValue::Count(16));
    }

    #[test]
    fn upgrade_to_next_walks_the_ladder_until_capped() {
        let pos = BlockPos::new(WorldId(0), 0, 0, 0);
        let mut node = Node::new(pos, NodeAttributes::new(upgrades(), None), 0);
        let t = table();
        assert_eq!(
            node.upgrade_to_next(&t, UpgradeKind::TransferAmount),
            Ok((StatValue::Count(4), 50.0))
        );
        assert_eq!(
            node.upgrade_to_next(&t, UpgradeKind::TransferAmount),
            Ok((StatValue::Count(16), 300.0))
        );
        // 32 is on the ladder but beyond this node's cap.
        assert_eq!(
            node.upgrade_to_next(&t, UpgradeKind::TransferAmount),
            Err(UpgradeError::ExceedsCap {
                kind: UpgradeKind::TransferAmount
            })
        );
        assert_eq!(
            node.upgrade_to_next(&t, UpgradeKind::MaxLinks),
            Err(UpgradeError::Maxed {
                kind: UpgradeKind::MaxLinks
            })
        );
    }

    #[test]
    fn speed_directions() {
        assert_eq!(UpgradeKind::SuctionSpeed.direction(), Improvement::Decrease);
        assert_eq!(UpgradeKind::MaxLinks.direction(), Improvement::Increase);
    }
}
