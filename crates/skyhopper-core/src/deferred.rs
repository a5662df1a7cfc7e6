//! Deferred cross-node transfers.
//!
//! Native item-move signals between a node and a neighbour are cancelled on
//! the spot and recorded here instead. The next tick resolves every pending
//! entry exactly once, before suction and transfer run: it either performs a
//! single drain on behalf of the acting node or drops the entry. Nothing is
//! ever retried.

use crate::clock::Operation;
use crate::fixed::Millis;
use crate::id::BlockPos;
use crate::mover::{drain_container, Destination, Feedback, MoveError, MoveOutcome};
use crate::node::Node;
use crate::registry::NodeRegistry;
use crate::sim::PassReport;
use crate::world::Host;
use std::collections::BTreeMap;

/// A pending move between two containers, at least one of them a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeferredTransfer {
    pub source: BlockPos,
    pub destination: BlockPos,
    /// Suction entries check the acting node's suction clock; transfer
    /// entries check its transfer clock.
    pub is_suction: bool,
    /// When both sides are nodes, selects the source as the acting side.
    pub initiator_is_source: bool,
}

impl DeferredTransfer {
    pub fn transfer(source: BlockPos, destination: BlockPos) -> Self {
        Self {
            source,
            destination,
            is_suction: false,
            initiator_is_source: true,
        }
    }

    pub fn suction(source: BlockPos, destination: BlockPos) -> Self {
        Self {
            source,
            destination,
            is_suction: true,
            initiator_is_source: false,
        }
    }

    fn operation(&self) -> Operation {
        if self.is_suction {
            Operation::Suction
        } else {
            Operation::Transfer
        }
    }
}

/// Pending entries keyed by coordinate. A later signal for the same key
/// replaces the earlier one.
#[derive(Debug, Default)]
pub struct DeferredQueue {
    pending: BTreeMap<BlockPos, DeferredTransfer>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry. Returns the entry it replaced, if any.
    pub fn enqueue(&mut self, key: BlockPos, entry: DeferredTransfer) -> Option<DeferredTransfer> {
        self.pending.insert(key, entry)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn get(&self, key: BlockPos) -> Option<&DeferredTransfer> {
        self.pending.get(&key)
    }

    /// Remove and return every pending entry.
    pub fn drain(&mut self) -> Vec<DeferredTransfer> {
        std::mem::take(&mut self.pending).into_values().collect()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Whether a node may take part in a deferred move at all.
fn is_active<H: Host + ?Sized>(node: &Node, host: &H) -> bool {
    node.is_enabled() && !host.is_powered(node.pos())
}

/// Resolve one entry. `Ok(None)` means the entry was dropped.
fn resolve_one<H: Host + ?Sized>(
    registry: &mut NodeRegistry,
    host: &mut H,
    entry: &DeferredTransfer,
    now: Millis,
) -> Result<Option<MoveOutcome>, MoveError> {
    let valid = |pos: BlockPos| host.block_at(pos).is_container() && host.container(pos).is_some();
    if !valid(entry.source) || !valid(entry.destination) {
        return Ok(None);
    }

    // Every node involved must be enabled and unpowered, not just the one
    // that acts.
    let mut acting = match (registry.get(entry.source), registry.get(entry.destination)) {
        (Some(source), Some(destination)) => {
            if !is_active(&source, host) || !is_active(&destination, host) {
                return Ok(None);
            }
            if entry.initiator_is_source {
                source
            } else {
                destination
            }
        }
        (Some(node), None) | (None, Some(node)) => node,
        (None, None) => return Ok(None),
    };
    let op = entry.operation();
    if !is_active(&acting, host) || !acting.is_eligible(op, now) {
        return Ok(None);
    }

    let at = acting.pos();
    let feedback = match (acting.particles_enabled(), entry.is_suction) {
        (false, _) => Feedback::Silent,
        (true, true) => Feedback::Suction { node: at },
        (true, false) => Feedback::Transfer {
            node: at,
            from: entry.source,
        },
    };
    let dests = [Destination {
        pos: entry.destination,
        filter: acting.filter(),
    }];
    let outcome = drain_container(host, entry.source, &dests, acting.amount(op), feedback)?;

    acting.advance(op, now);
    registry.cache(acting);
    Ok(Some(outcome))
}

/// Resolve and empty the queue. While paused every entry is dropped.
pub(crate) fn resolve<H: Host + ?Sized>(
    queue: &mut DeferredQueue,
    registry: &mut NodeRegistry,
    host: &mut H,
    paused: bool,
    now: Millis,
) -> PassReport {
    let mut report = PassReport::default();
    for entry in queue.drain() {
        if paused {
            report.dropped += 1;
            continue;
        }
        match resolve_one(registry, host, &entry, now) {
            Ok(Some(outcome)) => {
                report.attempted += 1;
                report.record(&outcome);
            }
            Ok(None) => report.dropped += 1,
            Err(e) => {
                report.failed += 1;
                log::warn!(
                    "deferred move {:?} -> {:?} aborted: {e}",
                    entry.source,
                    entry.destination
                );
            }
        }
    }
    report
}
