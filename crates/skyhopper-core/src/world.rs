//! Interfaces to the host server.
//!
//! The engine never owns world state. Everything it reads or writes goes
//! through these traits, implemented by the host (or by the in-memory doubles
//! in `test_utils`).

use crate::id::{BlockPos, ChunkPos, EntityId, ItemTypeId};
use crate::item::{Inventory, SlotRole};
use crate::node::NodeAttributes;

/// What kind of block occupies a coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Hopper,
    /// Any other block with an inventory.
    Container,
    Other,
}

impl BlockKind {
    /// Hoppers are containers too.
    pub fn is_container(self) -> bool {
        matches!(self, BlockKind::Hopper | BlockKind::Container)
    }
}

/// A loose item entity lying in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LooseItem {
    pub entity: EntityId,
    pub item_type: ItemTypeId,
}

/// Read and write access to the world around the nodes.
pub trait World {
    fn is_chunk_active(&self, pos: BlockPos) -> bool;

    fn block_at(&self, pos: BlockPos) -> BlockKind;

    /// True when the block receives redstone power.
    fn is_powered(&self, pos: BlockPos) -> bool;

    /// Loose items inside the axis-aligned cube of the given half-extent
    /// around `center`.
    fn nearby_loose_items(&self, center: (f64, f64, f64), half_extent: f64) -> Vec<LooseItem>;

    fn container(&self, pos: BlockPos) -> Option<&Inventory>;

    fn container_mut(&mut self, pos: BlockPos) -> Option<&mut Inventory>;

    /// Whether `item` may be inserted into a `role` slot of the container at
    /// `container`: only fuels into a furnace's fuel slot, only smeltables
    /// into its input, and so on.
    fn item_fits(&self, _container: BlockPos, _item: ItemTypeId, role: SlotRole) -> bool {
        role.fits_by_default()
    }

    /// Whether automation may pull `item` out of a `role` slot, e.g. the
    /// empty bucket left in a furnace's fuel slot.
    fn item_extractable(&self, _container: BlockPos, _item: ItemTypeId, role: SlotRole) -> bool {
        role.is_extractable()
    }
}

/// Unit counts of loose item entities. Hosts with stacking plugins store the
/// count outside the entity's own item stack.
pub trait StackAdapter {
    fn amount(&self, entity: EntityId) -> u32;

    /// Setting zero removes the entity.
    fn set_amount(&mut self, entity: EntityId, amount: u32);
}

/// Fire-and-forget feedback. Every method defaults to doing nothing.
pub trait PresentationHook {
    fn on_suction_success(&mut self, _node: BlockPos) {}

    fn on_destroy(&mut self, _node: BlockPos) {}

    fn on_transfer_success(&mut self, _from: BlockPos, _to: BlockPos) {}

    fn on_transfer_blocked(&mut self, _node: BlockPos) {}
}

/// Everything the scheduler needs from the host in one bound.
pub trait Host: World + StackAdapter + PresentationHook {}

impl<T: World + StackAdapter + PresentationHook> Host for T {}

// ---------------------------------------------------------------------------
// Persistence collaborators
// ---------------------------------------------------------------------------

/// A failure reported by a persistence collaborator.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("location index failure: {0}")]
    Index(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("attribute storage failure at {pos:?}: {source}")]
    Storage {
        pos: BlockPos,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("no cached node at {0:?}")]
    NotCached(BlockPos),
}

/// The durable list of every node coordinate.
pub trait LocationIndex {
    fn list(&self) -> Result<Vec<BlockPos>, PersistError>;

    /// Coordinates inside one chunk. The default filters [`list`](Self::list).
    fn list_in_chunk(&self, chunk: ChunkPos) -> Result<Vec<BlockPos>, PersistError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|pos| chunk.contains(*pos))
            .collect())
    }

    fn add(&mut self, pos: BlockPos) -> Result<(), PersistError>;

    fn remove(&mut self, pos: BlockPos) -> Result<(), PersistError>;
}

/// Attribute storage attached to the node's own block.
pub trait NodeStorage {
    /// `Ok(None)` when the block carries no attributes.
    fn read_attributes(&self, pos: BlockPos) -> Result<Option<NodeAttributes>, PersistError>;

    fn write_attributes(&mut self, pos: BlockPos, attrs: &NodeAttributes) -> Result<(), PersistError>;
}
