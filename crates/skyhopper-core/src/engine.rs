//! The scheduling engine: owns the node registry and the deferred queue and
//! runs the three-pass tick.
//!
//! # Tick
//!
//! Each [`Engine::step`] runs, strictly in order:
//! 1. **Deferred** -- resolve every entry recorded by native signals since
//!    the last tick (dropped wholesale while paused).
//! 2. **Suction** -- eligible nodes pull nearby loose items.
//! 3. **Transfer** -- eligible nodes push their contents into linked
//!    containers.
//!
//! While paused, suction and transfer are no-ops and node clocks are left
//! untouched.
//!
//! Readers get owned copies of nodes; every mutation goes through a fetch,
//! modify, [`Engine::cache_node`] cycle.

use crate::clock::Operation;
use crate::config::EngineConfig;
use crate::deferred::{self, DeferredQueue, DeferredTransfer};
use crate::filter::FilterType;
use crate::fixed::Millis;
use crate::id::{BlockPos, ChunkPos, ItemTypeId, PlayerId};
use crate::node::{Node, NodeAttributes, NodeError};
use crate::registry::NodeRegistry;
use crate::sim::TickReport;
use crate::upgrade::{StatValue, UpgradeError, UpgradeKind};
use crate::world::{Host, LocationIndex, NodeStorage, PersistError, World};
use crate::{suction, transfer};

/// What the host should do with a native signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignalResponse {
    /// Cancel the native action.
    pub cancel: bool,
    /// An entry was recorded for the next tick.
    pub deferred: bool,
}

impl SignalResponse {
    const IGNORE: SignalResponse = SignalResponse {
        cancel: false,
        deferred: false,
    };
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Engine {
    registry: NodeRegistry,
    deferred: DeferredQueue,
    paused: bool,
    config: EngineConfig,
    tick: u64,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Swap in a new configuration. Cached nodes keep their stats.
    pub fn set_config(&mut self, config: EngineConfig) {
        self.config = config;
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    // -----------------------------------------------------------------------
    // Registry access
    // -----------------------------------------------------------------------

    /// An owned copy of the node at `pos`.
    pub fn get_node(&self, pos: BlockPos) -> Option<Node> {
        self.registry.get(pos)
    }

    pub fn is_node(&self, pos: BlockPos) -> bool {
        self.registry.contains(pos)
    }

    /// Insert or replace a node record.
    pub fn cache_node(&mut self, node: Node) {
        self.registry.cache(node);
    }

    pub fn node_count(&self) -> usize {
        self.registry.len()
    }

    pub fn node_positions(&self) -> Vec<BlockPos> {
        self.registry.positions()
    }

    /// Fresh attributes for a node placed by `owner`, from the configured
    /// starting stats.
    pub fn new_attributes(&self, owner: Option<PlayerId>) -> NodeAttributes {
        NodeAttributes::new(self.config.default_upgrades(), owner)
    }

    // -----------------------------------------------------------------------
    // Pause gate
    // -----------------------------------------------------------------------

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        if !self.paused {
            log::info!("scheduling paused");
        }
        self.paused = true;
    }

    pub fn unpause(&mut self) {
        if self.paused {
            log::info!("scheduling resumed");
        }
        self.paused = false;
    }

    // -----------------------------------------------------------------------
    // Deferred queue and native signals
    // -----------------------------------------------------------------------

    /// Record an entry for the next tick, replacing any entry under `key`.
    pub fn enqueue_deferred(&mut self, key: BlockPos, entry: DeferredTransfer) {
        self.deferred.enqueue(key, entry);
    }

    pub fn pending_deferred(&self) -> usize {
        self.deferred.len()
    }

    pub fn deferred_entry(&self, key: BlockPos) -> Option<&DeferredTransfer> {
        self.deferred.get(key)
    }

    /// Classify a native item move from `source` to `destination` started by
    /// `initiator`.
    ///
    /// Moves that touch no node, or whose initiator is not a node, are left
    /// alone. Otherwise the native move is cancelled and, unless paused or a
    /// node involved is disabled, an entry is recorded under `source`.
    pub fn on_item_move(
        &mut self,
        source: BlockPos,
        destination: BlockPos,
        initiator: BlockPos,
        now: Millis,
    ) -> SignalResponse {
        if !self.registry.contains(initiator) {
            return SignalResponse::IGNORE;
        }
        let src = self.registry.peek(source);
        let dst = self.registry.peek(destination);
        if src.is_none() && dst.is_none() {
            return SignalResponse::IGNORE;
        }
        let mut response = SignalResponse {
            cancel: true,
            deferred: false,
        };
        let any_disabled =
            src.is_some_and(|n| !n.is_enabled()) || dst.is_some_and(|n| !n.is_enabled());
        if self.paused || any_disabled {
            return response;
        }

        let entry = match (src, dst) {
            (Some(s), Some(d)) => {
                if initiator == source && s.is_eligible(Operation::Transfer, now) {
                    Some(DeferredTransfer::transfer(source, destination))
                } else if initiator == destination && d.is_eligible(Operation::Suction, now) {
                    Some(DeferredTransfer::suction(source, destination))
                } else {
                    None
                }
            }
            (Some(_), None) => Some(DeferredTransfer::transfer(source, destination)),
            (None, Some(_)) => Some(DeferredTransfer::suction(source, destination)),
            (None, None) => None,
        };
        if let Some(entry) = entry {
            self.deferred.enqueue(source, entry);
            response.deferred = true;
        }
        response
    }

    /// Whether a native pickup into `pos` should be cancelled. Nodes collect
    /// loose items only through the suction pass.
    pub fn on_item_pickup(&self, pos: BlockPos) -> bool {
        self.registry.contains(pos)
    }

    // -----------------------------------------------------------------------
    // Step
    // -----------------------------------------------------------------------

    /// Run one tick at wall-clock time `now`.
    pub fn step<H: Host + ?Sized>(&mut self, now: Millis, host: &mut H) -> TickReport {
        self.tick += 1;
        let mut report = TickReport {
            tick: self.tick,
            paused: self.paused,
            ..TickReport::default()
        };

        report.deferred = deferred::resolve(
            &mut self.deferred,
            &mut self.registry,
            host,
            self.paused,
            now,
        );
        if self.paused {
            return report;
        }
        report.suction = suction::run(&mut self.registry, host, now);
        report.transfer = transfer::run(&mut self.registry, host, now);

        log::debug!(
            "tick {}: deferred {}/{} dropped {}, suction {} nodes moved {} destroyed {}, transfer {} nodes moved {} destroyed {}",
            self.tick,
            report.deferred.attempted,
            report.deferred.moved,
            report.deferred.dropped,
            report.suction.attempted,
            report.suction.moved,
            report.suction.destroyed,
            report.transfer.attempted,
            report.transfer.moved,
            report.transfer.destroyed,
        );
        report
    }

    // -----------------------------------------------------------------------
    // Registry lifecycle
    // -----------------------------------------------------------------------

    /// Cache every indexed node inside `chunk` that is not cached yet.
    /// Coordinates without stored attributes are skipped. Returns the number
    /// of nodes loaded.
    pub fn load_chunk<I, S>(
        &mut self,
        chunk: ChunkPos,
        now: Millis,
        index: &I,
        storage: &S,
    ) -> Result<usize, PersistError>
    where
        I: LocationIndex + ?Sized,
        S: NodeStorage + ?Sized,
    {
        let mut loaded = 0;
        for pos in index.list_in_chunk(chunk)? {
            if self.registry.contains(pos) {
                continue;
            }
            match storage.read_attributes(pos) {
                Ok(Some(attrs)) => {
                    self.registry.cache(Node::new(pos, attrs, now));
                    loaded += 1;
                }
                Ok(None) => {}
                Err(e) => log::warn!("skipping node at {pos:?}: {e}"),
            }
        }
        if loaded > 0 {
            log::info!("loaded {loaded} nodes in chunk ({}, {})", chunk.x, chunk.z);
        }
        Ok(loaded)
    }

    /// Evict every cached node inside `chunk`.
    pub fn unload_chunk(&mut self, chunk: ChunkPos) -> usize {
        let evicted = self.registry.evict_chunk(chunk);
        if evicted > 0 {
            log::debug!("evicted {evicted} nodes from chunk ({}, {})", chunk.x, chunk.z);
        }
        evicted
    }

    /// Persist and register a newly placed node.
    pub fn place_node<I, S>(
        &mut self,
        pos: BlockPos,
        attrs: NodeAttributes,
        now: Millis,
        index: &mut I,
        storage: &mut S,
    ) -> Result<Node, PersistError>
    where
        I: LocationIndex + ?Sized,
        S: NodeStorage + ?Sized,
    {
        storage.write_attributes(pos, &attrs)?;
        index.add(pos)?;
        let node = Node::new(pos, attrs, now);
        self.registry.cache(node.clone());
        Ok(node)
    }

    /// Forget the node at `pos` and drop every link pointing at it.
    pub fn remove_node<I>(&mut self, pos: BlockPos, index: &mut I) -> Result<Option<Node>, PersistError>
    where
        I: LocationIndex + ?Sized,
    {
        index.remove(pos)?;
        let removed = self.registry.remove(pos);
        self.registry.purge_links_to(pos);
        Ok(removed)
    }

    /// A linked container is gone: drop every link to it. Returns the nodes
    /// that changed.
    pub fn container_removed(&mut self, pos: BlockPos) -> Vec<BlockPos> {
        self.registry.purge_links_to(pos)
    }

    /// Write the cached node's attributes back to its storage.
    pub fn save_node<S>(&self, pos: BlockPos, storage: &mut S) -> Result<(), PersistError>
    where
        S: NodeStorage + ?Sized,
    {
        let node = self.registry.peek(pos).ok_or(PersistError::NotCached(pos))?;
        storage.write_attributes(pos, &node.attrs)
    }

    /// Rebuild the registry from storage for every active chunk. Scheduling
    /// is paused for the duration and the pending queue is discarded.
    pub fn reload<I, S>(
        &mut self,
        active_chunks: &[ChunkPos],
        now: Millis,
        index: &I,
        storage: &S,
    ) -> Result<usize, PersistError>
    where
        I: LocationIndex + ?Sized,
        S: NodeStorage + ?Sized,
    {
        let was_paused = self.paused;
        self.pause();
        self.registry.clear();
        self.deferred.clear();
        let mut result = Ok(0);
        for chunk in active_chunks {
            match self.load_chunk(*chunk, now, index, storage) {
                Ok(n) => result = result.map(|total| total + n),
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        if !was_paused {
            self.unpause();
        }
        result
    }

    // -----------------------------------------------------------------------
    // Node management
    // -----------------------------------------------------------------------

    /// Fetch a copy of the node at `pos`, apply `f`, and cache the result if
    /// `f` succeeds.
    pub fn update_node<T, E>(
        &mut self,
        pos: BlockPos,
        f: impl FnOnce(&mut Node) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<NodeError>,
    {
        let mut node = self.registry.get(pos).ok_or(NodeError::NoSuchNode(pos))?;
        let out = f(&mut node)?;
        self.registry.cache(node);
        Ok(out)
    }

    /// Link the node at `pos` to the container at `destination`.
    pub fn link<W>(&mut self, pos: BlockPos, destination: BlockPos, world: &W) -> Result<(), NodeError>
    where
        W: World + ?Sized,
    {
        if !world.block_at(destination).is_container() {
            return Err(NodeError::NotAContainer(destination));
        }
        self.update_node(pos, |node| node.link(destination))
    }

    pub fn unlink(&mut self, pos: BlockPos, destination: BlockPos) -> Result<(), NodeError> {
        self.update_node(pos, |node| node.unlink(destination).map(drop))
    }

    pub fn set_link_filter_type(
        &mut self,
        pos: BlockPos,
        destination: BlockPos,
        kind: FilterType,
    ) -> Result<(), NodeError> {
        self.update_node(pos, |node| {
            node.link_mut(destination)?.filter.kind = kind;
            Ok(())
        })
    }

    pub fn add_link_filter_item(
        &mut self,
        pos: BlockPos,
        destination: BlockPos,
        item: ItemTypeId,
    ) -> Result<bool, NodeError> {
        self.update_node(pos, |node| Ok(node.link_mut(destination)?.filter.add_item(item)))
    }

    pub fn remove_link_filter_item(
        &mut self,
        pos: BlockPos,
        destination: BlockPos,
        item: ItemTypeId,
    ) -> Result<bool, NodeError> {
        self.update_node(pos, |node| {
            Ok(node.link_mut(destination)?.filter.remove_item(item))
        })
    }

    pub fn set_filter_type(&mut self, pos: BlockPos, kind: FilterType) -> Result<(), NodeError> {
        self.update_node(pos, |node| {
            node.set_filter_type(kind);
            Ok(())
        })
    }

    pub fn add_filter_item(&mut self, pos: BlockPos, item: ItemTypeId) -> Result<bool, NodeError> {
        self.update_node(pos, |node| Ok(node.add_filter_item(item)))
    }

    pub fn remove_filter_item(&mut self, pos: BlockPos, item: ItemTypeId) -> Result<bool, NodeError> {
        self.update_node(pos, |node| Ok(node.remove_filter_item(item)))
    }

    pub fn set_owner(&mut self, pos: BlockPos, owner: Option<PlayerId>) -> Result<(), NodeError> {
        self.update_node(pos, |node| {
            node.set_owner(owner);
            Ok(())
        })
    }

    pub fn add_member(&mut self, pos: BlockPos, player: PlayerId) -> Result<bool, NodeError> {
        self.update_node(pos, |node| Ok(node.add_member(player)))
    }

    pub fn remove_member(&mut self, pos: BlockPos, player: PlayerId) -> Result<bool, NodeError> {
        self.update_node(pos, |node| Ok(node.remove_member(player)))
    }

    pub fn set_enabled(&mut self, pos: BlockPos, enabled: bool) -> Result<(), NodeError> {
        self.update_node(pos, |node| {
            node.set_enabled(enabled);
            Ok(())
        })
    }

    pub fn set_particles_enabled(&mut self, pos: BlockPos, enabled: bool) -> Result<(), NodeError> {
        self.update_node(pos, |node| {
            node.set_particles_enabled(enabled);
            Ok(())
        })
    }

    /// The next tier of `kind` for the node at `pos`, with its price.
    pub fn next_tier(&self, pos: BlockPos, kind: UpgradeKind) -> Option<(StatValue, f64)> {
        let node = self.registry.peek(pos)?;
        self.config.upgrades.next_tier(kind, node.upgrades())
    }

    /// Move the node at `pos` to the next tier of `kind`.
    pub fn upgrade(&mut self, pos: BlockPos, kind: UpgradeKind) -> Result<(StatValue, f64), UpgradeError> {
        let mut node = self.registry.get(pos).ok_or(UpgradeError::NoSuchNode(pos))?;
        let applied = node.upgrade_to_next(&self.config.upgrades, kind)?;
        self.registry.cache(node);
        Ok(applied)
    }

    /// Set a stat directly, refusing values past its cap.
    pub fn apply_upgrade(
        &mut self,
        pos: BlockPos,
        kind: UpgradeKind,
        value: StatValue,
    ) -> Result<(), UpgradeError> {
        let mut node = self.registry.get(pos).ok_or(UpgradeError::NoSuchNode(pos))?;
        node.apply_upgrade(kind, value)?;
        self.registry.cache(node);
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
