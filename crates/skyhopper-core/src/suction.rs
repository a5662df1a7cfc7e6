//! Suction pass: eligible nodes pull nearby loose items into themselves.

use crate::clock::Operation;
use crate::fixed::Millis;
use crate::id::BlockPos;
use crate::mover::{move_stack, Destination, Feedback, MoveError, MoveOutcome, StackSource};
use crate::node::Node;
use crate::registry::NodeRegistry;
use crate::sim::PassReport;
use crate::world::{BlockKind, Host, World};

fn is_eligible<H: World + ?Sized>(node: &Node, host: &H, now: Millis) -> bool {
    let pos = node.pos();
    node.is_enabled()
        && host.is_chunk_active(pos)
        && node.is_eligible(Operation::Suction, now)
        && host.block_at(pos) == BlockKind::Hopper
}

/// One suction attempt for `node`. Loose items are taken in the order the
/// world reports them, sharing the node's suction budget. Hooks fire as
/// units land when the node shows particles.
pub fn suction_once<H: Host + ?Sized>(host: &mut H, node: &Node) -> Result<MoveOutcome, MoveError> {
    let pos = node.pos();
    let half_extent = f64::from(node.upgrades().suction_range.current()) + 0.5;
    let items = host.nearby_loose_items(pos.center(), half_extent);
    let dests = [Destination {
        pos,
        filter: node.filter(),
    }];
    let feedback = if node.particles_enabled() {
        Feedback::Suction { node: pos }
    } else {
        Feedback::Silent
    };

    let budget = node.amount(Operation::Suction);
    let mut total = MoveOutcome::default();
    for item in items {
        let remaining = budget - total.consumed();
        if remaining == 0 {
            break;
        }
        total.merge(move_stack(
            host,
            StackSource::Loose(item),
            &dests,
            remaining,
            feedback,
        )?);
    }
    Ok(total)
}

pub(crate) fn run<H: Host + ?Sized>(registry: &mut NodeRegistry, host: &mut H, now: Millis) -> PassReport {
    let mut report = PassReport::default();
    let due: Vec<BlockPos> = registry
        .iter()
        .filter(|node| is_eligible(node, &*host, now))
        .map(Node::pos)
        .collect();
    for pos in due {
        let Some(mut node) = registry.get(pos) else {
            continue;
        };
        report.attempted += 1;
        match suction_once(host, &node) {
            Ok(outcome) => report.record(&outcome),
            Err(e) => {
                report.failed += 1;
                log::warn!("suction at {pos:?} aborted: {e}");
            }
        }
        node.advance(Operation::Suction, now);
        registry.cache(node);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterType;
    use crate::id::{EntityId, ItemTypeId, WorldId};
    use crate::test_utils::{self, HookEvent, MockHost};
    use crate::world::LooseItem;
    use crate::world::StackAdapter;

    const SAND: ItemTypeId = ItemTypeId(4);

    fn setup() -> (NodeRegistry, MockHost, BlockPos) {
        let pos = BlockPos::new(WorldId(0), 0, 64, 0);
        let mut host = MockHost::new();
        host.add_hopper(pos);
        let mut registry = NodeRegistry::new();
        registry.cache(test_utils::node_at(pos, 0));
        (registry, host, pos)
    }

    fn loose(id: u64) -> LooseItem {
        LooseItem {
            entity: EntityId(id),
            item_type: SAND,
        }
    }

    #[test]
    fn pulls_items_inside_range_only() {
        let (mut registry, mut host, pos) = setup();
        host.spawn_loose(BlockPos::new(WorldId(0), 1, 64, 0), loose(1), 3);
        host.spawn_loose(BlockPos::new(WorldId(0), 9, 64, 0), loose(2), 3);
        let report = run(&mut registry, &mut host, 10_000);
        assert_eq!(report.attempted, 1);
        assert_eq!(report.moved, 3);
        assert_eq!(host.quantity(pos, SAND), 3);
        assert_eq!(host.amount(EntityId(2)), 3);
        assert_eq!(host.events, vec![HookEvent::SuctionSuccess(pos)]);
    }

    #[test]
    fn budget_spans_several_entities() {
        let (mut registry, mut host, pos) = setup();
        for id in 1..=4 {
            host.spawn_loose(pos, loose(id), 2);
        }
        // test node sucks 4 per attempt
        let report = run(&mut registry, &mut host, 10_000);
        assert_eq!(report.moved, 4);
        assert_eq!(host.amount(EntityId(3)), 2);
    }

    #[test]
    fn clock_advances_even_when_nothing_moves() {
        let (mut registry, mut host, pos) = setup();
        let report = run(&mut registry, &mut host, 10_000);
        assert_eq!(report.attempted, 1);
        assert_eq!(report.moved, 0);
        let next = registry.peek(pos).unwrap().clocks.next(Operation::Suction);
        assert_eq!(next, 10_000 + 1_000);
        assert!(host.events.is_empty());
    }

    #[test]
    fn ineligible_nodes_are_skipped() {
        let (mut registry, mut host, pos) = setup();
        host.spawn_loose(pos, loose(1), 3);

        // clock not yet due
        assert_eq!(run(&mut registry, &mut host, 500).attempted, 0);

        let mut node = registry.get(pos).unwrap();
        node.set_enabled(false);
        registry.cache(node);
        assert_eq!(run(&mut registry, &mut host, 10_000).attempted, 0);

        let mut node = registry.get(pos).unwrap();
        node.set_enabled(true);
        registry.cache(node);
        host.deactivate_chunk(pos.chunk());
        assert_eq!(run(&mut registry, &mut host, 10_000).attempted, 0);
        assert_eq!(host.amount(EntityId(1)), 3);
    }

    #[test]
    fn destroy_filter_voids_loose_items() {
        let (mut registry, mut host, pos) = setup();
        let mut node = registry.get(pos).unwrap();
        node.set_filter_type(FilterType::Destroy);
        node.add_filter_item(SAND);
        registry.cache(node);
        host.spawn_loose(pos, loose(1), 3);
        let report = run(&mut registry, &mut host, 10_000);
        assert_eq!(report.destroyed, 3);
        assert_eq!(report.moved, 0);
        assert!(!host.has_entity(EntityId(1)));
        assert_eq!(host.quantity(pos, SAND), 0);
        assert_eq!(host.events, vec![HookEvent::Destroy(pos)]);
    }
}
