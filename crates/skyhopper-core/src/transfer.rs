//! Transfer pass: eligible nodes push their contents into linked containers.

use crate::clock::Operation;
use crate::fixed::Millis;
use crate::id::BlockPos;
use crate::mover::{drain_container, Destination, Feedback, MoveError, MoveOutcome};
use crate::node::Node;
use crate::registry::NodeRegistry;
use crate::sim::PassReport;
use crate::world::{BlockKind, Host, World};

fn is_eligible<H: World + ?Sized>(node: &Node, host: &H, now: Millis) -> bool {
    let pos = node.pos();
    node.is_enabled()
        && host.is_chunk_active(pos)
        && host.block_at(pos) == BlockKind::Hopper
        && !host.is_powered(pos)
        && node.is_eligible(Operation::Transfer, now)
        && !node.links().is_empty()
}

/// One transfer attempt for `node`. Links in unloaded chunks or pointing at
/// blocks that are no longer containers sit this attempt out. Hooks fire as
/// units land when the node shows particles.
pub fn transfer_once<H: Host + ?Sized>(host: &mut H, node: &Node) -> Result<MoveOutcome, MoveError> {
    let pos = node.pos();
    let dests: Vec<Destination<'_>> = node
        .links()
        .iter()
        .filter(|link| {
            host.is_chunk_active(link.destination) && host.block_at(link.destination).is_container()
        })
        .map(|link| Destination {
            pos: link.destination,
            filter: &link.filter,
        })
        .collect();
    if dests.is_empty() {
        return Ok(MoveOutcome::default());
    }
    let feedback = if node.particles_enabled() {
        Feedback::Transfer { node: pos, from: pos }
    } else {
        Feedback::Silent
    };
    drain_container(host, pos, &dests, node.amount(Operation::Transfer), feedback)
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
        match transfer_once(host, &node) {
            Ok(outcome) => {
                report.record(&outcome);
                if node.particles_enabled()
                    && outcome.is_empty()
                    && host.container(pos).is_some_and(|inv| !inv.is_empty())
                {
                    host.on_transfer_blocked(pos);
                }
            }
            Err(e) => {
                report.failed += 1;
                log::warn!("transfer from {pos:?} aborted: {e}");
            }
        }
        node.advance(Operation::Transfer, now);
        registry.cache(node);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterType;
    use crate::id::{ItemTypeId, WorldId};
    use crate::item::{Inventory, ItemStack};
    use crate::test_utils::{self, HookEvent, MockHost};

    const COAL: ItemTypeId = ItemTypeId(5);
    const ORE: ItemTypeId = ItemTypeId(6);

    fn pos(x: i32) -> BlockPos {
        BlockPos::new(WorldId(0), x, 64, 0)
    }

    /// A hopper at x=0 holding `stock`, linked to chests at x=1..=n.
    fn setup(stock: &[(ItemTypeId, u32)], chests: usize) -> (NodeRegistry, MockHost) {
        let mut host = MockHost::new();
        host.add_hopper(pos(0));
        for (item, qty) in stock {
            assert_eq!(host.container_mut(pos(0)).unwrap().insert(*item, *qty), *qty);
        }
        let mut node = test_utils::node_at(pos(0), 0);
        for i in 1..=chests {
            host.add_container(pos(i as i32), Inventory::new(9, 64));
            node.link(pos(i as i32)).unwrap();
        }
        let mut registry = NodeRegistry::new();
        registry.cache(node);
        (registry, host)
    }

    #[test]
    fn budget_is_shared_across_slots() {
        let (mut registry, mut host) = setup(&[(COAL, 5), (ORE, 5)], 1);
        // test node transfers 8 per attempt
        let report = run(&mut registry, &mut host, 10_000);
        assert_eq!(report.moved, 8);
        assert_eq!(host.quantity(pos(1), COAL), 5);
        assert_eq!(host.quantity(pos(1), ORE), 3);
        assert_eq!(host.quantity(pos(0), ORE), 2);
    }

    #[test]
    fn only_due_nodes_are_attempted() {
        let (mut registry, mut host) = setup(&[(COAL, 5)], 1);
        host.add_hopper(pos(5));
        host.add_container(pos(6), Inventory::new(9, 64));
        let mut late = test_utils::node_at(pos(5), 20_000);
        late.link(pos(6)).unwrap();
        registry.cache(late.clone());

        let report = run(&mut registry, &mut host, 10_000);
        assert_eq!(report.attempted, 1);
        assert_eq!(registry.peek(pos(5)), Some(&late));
    }

    #[test]
    fn powered_hopper_does_not_transfer() {
        let (mut registry, mut host) = setup(&[(COAL, 5)], 1);
        host.set_powered(pos(0), true);
        assert_eq!(run(&mut registry, &mut host, 10_000).attempted, 0);
        assert_eq!(host.quantity(pos(0), COAL), 5);
    }

    #[test]
    fn node_without_links_is_not_attempted() {
        let (mut registry, mut host) = setup(&[(COAL, 5)], 0);
        assert_eq!(run(&mut registry, &mut host, 10_000).attempted, 0);
        let next = registry.peek(pos(0)).unwrap().clocks.next(Operation::Transfer);
        assert_eq!(next, 1_000);
    }

    #[test]
    fn stale_links_are_skipped() {
        let (mut registry, mut host) = setup(&[(COAL, 5)], 2);
        host.break_block(pos(1));
        let report = run(&mut registry, &mut host, 10_000);
        assert_eq!(report.moved, 5);
        assert_eq!(report.failed, 0);
        assert_eq!(host.quantity(pos(2), COAL), 5);
    }

    #[test]
    fn blocked_hook_fires_when_nothing_moves() {
        let (mut registry, mut host) = setup(&[(COAL, 5)], 1);
        let mut node = registry.get(pos(0)).unwrap();
        node.link_mut(pos(1)).unwrap().filter.kind = FilterType::Whitelist;
        registry.cache(node);
        let report = run(&mut registry, &mut host, 10_000);
        assert_eq!(report.attempted, 1);
        assert_eq!(report.moved, 0);
        assert_eq!(host.events, vec![HookEvent::TransferBlocked(pos(0))]);
        let next = registry.peek(pos(0)).unwrap().clocks.next(Operation::Transfer);
        assert_eq!(next, 11_000);
    }

    #[test]
    fn success_hook_per_delivery_respects_particles() {
        let (mut registry, mut host) = setup(&[(COAL, 2)], 1);
        run(&mut registry, &mut host, 10_000);
        assert_eq!(host.events, vec![HookEvent::TransferSuccess(pos(0), pos(1))]);

        host.events.clear();
        let mut node = registry.get(pos(0)).unwrap();
        node.set_particles_enabled(false);
        registry.cache(node);
        host.container_mut(pos(0))
            .unwrap()
            .set_slot(0, Some(ItemStack::new(COAL, 2)));
        let report = run(&mut registry, &mut host, 20_000);
        assert_eq!(report.moved, 2);
        assert!(host.events.is_empty());
    }

    #[test]
    fn full_destination_falls_through_to_next_link() {
        let (mut registry, mut host) = setup(&[(COAL, 4)], 2);
        let chest = host.container_mut(pos(1)).unwrap();
        for slot in 0..chest.slot_count() {
            chest.set_slot(slot, Some(ItemStack::new(ORE, 64)));
        }
        run(&mut registry, &mut host, 10_000);
        assert_eq!(host.quantity(pos(2), COAL), 4);
    }
}
