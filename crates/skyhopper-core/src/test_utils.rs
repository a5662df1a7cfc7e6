//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::config::{EngineConfig, StartingStats};
use crate::fixed::{seconds, Millis};
use crate::id::*;
use crate::item::{Inventory, SlotRole};
use crate::node::{Capped, Improvement, Node, NodeAttributes, Upgrades};
use crate::serialize::{decode_attributes, encode_attributes};
use crate::upgrade::{Tier, UpgradeLadder, UpgradeTable};
use crate::world::*;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

// ===========================================================================
// Node constructors
// ===========================================================================

/// Stats used by test nodes: 1 s cooldowns, suction 4 units within radius 2,
/// transfer 8 units, up to 4 links.
pub fn upgrades() -> Upgrades {
    Upgrades {
        transfer_speed: Capped::new(seconds(1.0), seconds(0.25), Improvement::Decrease),
        transfer_amount: Capped::new(8, 64, Improvement::Increase),
        suction_speed: Capped::new(seconds(1.0), seconds(0.25), Improvement::Decrease),
        suction_amount: Capped::new(4, 64, Improvement::Increase),
        suction_range: Capped::new(2, 8, Improvement::Increase),
        max_links: Capped::new(4, 8, Improvement::Increase),
    }
}

pub fn node_at(pos: BlockPos, now: Millis) -> Node {
    Node::new(pos, NodeAttributes::new(upgrades(), None), now)
}

/// Starting stats matching [`upgrades`], with short ladders above them.
pub fn config() -> EngineConfig {
    let starting = StartingStats {
        suction_speed: seconds(1.0),
        suction_amount: 4,
        suction_range: 2,
        transfer_speed: seconds(1.0),
        transfer_amount: 8,
        max_links: 4,
    };
    let counts = |values: &[(u32, f64)]| {
        UpgradeLadder::new(
            Improvement::Increase,
            values.iter().map(|&(value, price)| Tier { value, price }).collect(),
        )
    };
    let speeds = |values: &[(f64, f64)]| {
        UpgradeLadder::new(
            Improvement::Decrease,
            values
                .iter()
                .map(|&(value, price)| Tier { value: seconds(value), price })
                .collect(),
        )
    };
    let table = UpgradeTable {
        suction_speed: speeds(&[(0.5, 100.0), (0.25, 250.0)]),
        suction_amount: counts(&[(16, 100.0), (64, 400.0)]),
        suction_range: counts(&[(4, 150.0), (8, 600.0)]),
        transfer_speed: speeds(&[(0.5, 100.0), (0.25, 250.0)]),
        transfer_amount: counts(&[(16, 100.0), (64, 400.0)]),
        max_links: counts(&[(6, 200.0), (8, 500.0)]),
    };
    EngineConfig::new(starting, table)
}

pub fn pos(x: i32, y: i32, z: i32) -> BlockPos {
    BlockPos::new(WorldId(0), x, y, z)
}

// ===========================================================================
// Mock host
// ===========================================================================

/// A presentation hook call recorded by [`MockHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    SuctionSuccess(BlockPos),
    Destroy(BlockPos),
    TransferSuccess(BlockPos, BlockPos),
    TransferBlocked(BlockPos),
}

#[derive(Debug, Clone, Copy)]
struct LooseEntry {
    center: (f64, f64, f64),
    item_type: ItemTypeId,
    amount: u32,
}

/// An in-memory world. Chunks are active unless deactivated.
#[derive(Debug, Default)]
pub struct MockHost {
    blocks: HashMap<BlockPos, BlockKind>,
    containers: HashMap<BlockPos, Inventory>,
    powered: HashSet<BlockPos>,
    inactive: HashSet<ChunkPos>,
    loose: BTreeMap<EntityId, LooseEntry>,
    fits: BTreeSet<(ItemTypeId, SlotRole)>,
    releases: BTreeSet<(ItemTypeId, SlotRole)>,
    pub events: Vec<HookEvent>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place an empty five-slot hopper.
    pub fn add_hopper(&mut self, pos: BlockPos) {
        self.blocks.insert(pos, BlockKind::Hopper);
        self.containers.insert(pos, Inventory::hopper());
    }

    pub fn add_container(&mut self, pos: BlockPos, inventory: Inventory) {
        self.blocks.insert(pos, BlockKind::Container);
        self.containers.insert(pos, inventory);
    }

    /// Replace whatever is at `pos` with a plain block.
    pub fn break_block(&mut self, pos: BlockPos) {
        self.blocks.insert(pos, BlockKind::Other);
        self.containers.remove(&pos);
    }

    pub fn set_powered(&mut self, pos: BlockPos, powered: bool) {
        if powered {
            self.powered.insert(pos);
        } else {
            self.powered.remove(&pos);
        }
    }

    pub fn deactivate_chunk(&mut self, chunk: ChunkPos) {
        self.inactive.insert(chunk);
    }

    pub fn activate_chunk(&mut self, chunk: ChunkPos) {
        self.inactive.remove(&chunk);
    }

    /// Drop a loose stack at the center of `at`.
    pub fn spawn_loose(&mut self, at: BlockPos, item: LooseItem, amount: u32) {
        self.loose.insert(
            item.entity,
            LooseEntry {
                center: at.center(),
                item_type: item.item_type,
                amount,
            },
        );
    }

    /// Let `item` into `role` slots. General slots take anything; other
    /// roles take only what is allowed here.
    pub fn allow_in(&mut self, item: ItemTypeId, role: SlotRole) {
        self.fits.insert((item, role));
    }

    /// Let automation pull `item` out of `role` slots that are not
    /// extractable by default.
    pub fn allow_out(&mut self, item: ItemTypeId, role: SlotRole) {
        self.releases.insert((item, role));
    }

    pub fn has_entity(&self, entity: EntityId) -> bool {
        self.loose.contains_key(&entity)
    }

    pub fn quantity(&self, pos: BlockPos, item: ItemTypeId) -> u32 {
        self.containers.get(&pos).map_or(0, |inv| inv.quantity(item))
    }

    pub fn total(&self, pos: BlockPos) -> u32 {
        self.containers.get(&pos).map_or(0, Inventory::total)
    }
}

impl World for MockHost {
    fn is_chunk_active(&self, pos: BlockPos) -> bool {
        !self.inactive.contains(&pos.chunk())
    }

    fn block_at(&self, pos: BlockPos) -> BlockKind {
        self.blocks.get(&pos).copied().unwrap_or(BlockKind::Other)
    }

    fn is_powered(&self, pos: BlockPos) -> bool {
        self.powered.contains(&pos)
    }

    fn nearby_loose_items(&self, center: (f64, f64, f64), half_extent: f64) -> Vec<LooseItem> {
        let within = |a: f64, b: f64| (a - b).abs() <= half_extent;
        self.loose
            .iter()
            .filter(|(_, e)| {
                within(e.center.0, center.0) && within(e.center.1, center.1) && within(e.center.2, center.2)
            })
            .map(|(id, e)| LooseItem {
                entity: *id,
                item_type: e.item_type,
            })
            .collect()
    }

    fn container(&self, pos: BlockPos) -> Option<&Inventory> {
        self.containers.get(&pos)
    }

    fn container_mut(&mut self, pos: BlockPos) -> Option<&mut Inventory> {
        self.containers.get_mut(&pos)
    }

    fn item_fits(&self, _container: BlockPos, item: ItemTypeId, role: SlotRole) -> bool {
        role == SlotRole::General || self.fits.contains(&(item, role))
    }

    fn item_extractable(&self, _container: BlockPos, item: ItemTypeId, role: SlotRole) -> bool {
        role.is_extractable() || self.releases.contains(&(item, role))
    }
}

impl StackAdapter for MockHost {
    fn amount(&self, entity: EntityId) -> u32 {
        self.loose.get(&entity).map_or(0, |e| e.amount)
    }

    fn set_amount(&mut self, entity: EntityId, amount: u32) {
        if amount == 0 {
            self.loose.remove(&entity);
        } else if let Some(e) = self.loose.get_mut(&entity) {
            e.amount = amount;
        }
    }
}

impl PresentationHook for MockHost {
    fn on_suction_success(&mut self, node: BlockPos) {
        self.events.push(HookEvent::SuctionSuccess(node));
    }

    fn on_destroy(&mut self, node: BlockPos) {
        self.events.push(HookEvent::Destroy(node));
    }

    fn on_transfer_success(&mut self, from: BlockPos, to: BlockPos) {
        self.events.push(HookEvent::TransferSuccess(from, to));
    }

    fn on_transfer_blocked(&mut self, node: BlockPos) {
        self.events.push(HookEvent::TransferBlocked(node));
    }
}

// ===========================================================================
// Persistence doubles
// ===========================================================================

/// Returned by the in-memory doubles when told to fail.
#[derive(Debug, thiserror::Error)]
#[error("simulated persistence failure")]
pub struct SimulatedFailure;

#[derive(Debug, Default)]
pub struct MemoryIndex {
    positions: BTreeSet<BlockPos>,
    pub fail: bool,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        self.positions.contains(&pos)
    }
}

impl LocationIndex for MemoryIndex {
    fn list(&self) -> Result<Vec<BlockPos>, PersistError> {
        if self.fail {
            return Err(PersistError::Index(Box::new(SimulatedFailure)));
        }
        Ok(self.positions.iter().copied().collect())
    }

    fn add(&mut self, pos: BlockPos) -> Result<(), PersistError> {
        if self.fail {
            return Err(PersistError::Index(Box::new(SimulatedFailure)));
        }
        self.positions.insert(pos);
        Ok(())
    }

    fn remove(&mut self, pos: BlockPos) -> Result<(), PersistError> {
        if self.fail {
            return Err(PersistError::Index(Box::new(SimulatedFailure)));
        }
        self.positions.remove(&pos);
        Ok(())
    }
}

/// Attribute storage holding encoded records, as a host block store would.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: HashMap<BlockPos, Vec<u8>>,
    pub fail: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw bytes, bypassing the codec.
    pub fn put_raw(&mut self, pos: BlockPos, bytes: Vec<u8>) {
        self.records.insert(pos, bytes);
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        self.records.contains_key(&pos)
    }
}

impl NodeStorage for MemoryStorage {
    fn read_attributes(&self, pos: BlockPos) -> Result<Option<NodeAttributes>, PersistError> {
        if self.fail {
            return Err(PersistError::Storage {
                pos,
                source: Box::new(SimulatedFailure),
            });
        }
        let Some(bytes) = self.records.get(&pos) else {
            return Ok(None);
        };
        decode_attributes(bytes)
            .map(Some)
            .map_err(|e| PersistError::Storage {
                pos,
                source: Box::new(e),
            })
    }

    fn write_attributes(&mut self, pos: BlockPos, attrs: &NodeAttributes) -> Result<(), PersistError> {
        if self.fail {
            return Err(PersistError::Storage {
                pos,
                source: Box::new(SimulatedFailure),
            });
        }
        let bytes = encode_attributes(attrs).map_err(|e| PersistError::Storage {
            pos,
            source: Box::new(e),
        })?;
        self.records.insert(pos, bytes);
        Ok(())
    }
}
