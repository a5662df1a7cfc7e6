//! Budgeted multi-destination moves.
//!
//! [`move_stack`] pushes one source stack into an ordered list of
//! destinations, each with its own filter, until the stack or the budget runs
//! out. Destroyed units never reach a destination but still count against the
//! budget. [`drain_container`] applies it to every extractable slot of a
//! container with one shared budget.
//!
//! Destinations with role-split slots (furnaces, brewing stands) only receive
//! items into slots the world says they fit, and role-split sources only give
//! up their outputs.

use crate::filter::{Filter, Verdict};
use crate::id::{BlockPos, ItemTypeId};
use crate::item::SlotRole;
use crate::world::{Host, LooseItem, PresentationHook, StackAdapter, World};

/// Where the units come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackSource {
    /// One slot of a container inventory.
    Slot { container: BlockPos, slot: usize },
    /// A loose item entity, counted through the stack adapter.
    Loose(LooseItem),
}

/// A destination container and the filter guarding it.
#[derive(Debug, Clone, Copy)]
pub struct Destination<'a> {
    pub pos: BlockPos,
    pub filter: &'a Filter,
}

/// Presentation hooks fired as units land or are voided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    /// Particles disabled: fire nothing.
    Silent,
    /// `on_suction_success(node)` per delivery.
    Suction { node: BlockPos },
    /// `on_transfer_success(from, destination)` per delivery.
    Transfer { node: BlockPos, from: BlockPos },
}

impl Feedback {
    fn delivered<H: PresentationHook + ?Sized>(self, host: &mut H, to: BlockPos) {
        match self {
            Feedback::Silent => {}
            Feedback::Suction { node } => host.on_suction_success(node),
            Feedback::Transfer { from, .. } => host.on_transfer_success(from, to),
        }
    }

    fn destroyed<H: PresentationHook + ?Sized>(self, host: &mut H) {
        match self {
            Feedback::Silent => {}
            Feedback::Suction { node } | Feedback::Transfer { node, .. } => host.on_destroy(node),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Units that arrived in a destination.
    pub moved: u32,
    /// Units removed from the source without being delivered.
    pub destroyed: u32,
    /// Number of successful insertions.
    pub deliveries: u32,
    /// Number of destroy events.
    pub destroys: u32,
}

impl MoveOutcome {
    /// Budget used: moved plus destroyed.
    pub fn consumed(&self) -> u32 {
        self.moved + self.destroyed
    }

    pub fn is_empty(&self) -> bool {
        self.consumed() == 0
    }

    pub fn merge(&mut self, other: MoveOutcome) {
        self.moved += other.moved;
        self.destroyed += other.destroyed;
        self.deliveries += other.deliveries;
        self.destroys += other.destroys;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("container at {0:?} disappeared mid-move")]
    ContainerMissing(BlockPos),
}

/// Which slot roles of one container accept one item type, queried before
/// the inventory is borrowed mutably.
#[derive(Debug, Clone, Copy)]
struct RoleFit([bool; 4]);

impl RoleFit {
    fn query<H: World + ?Sized>(host: &H, container: BlockPos, item: ItemTypeId) -> Self {
        Self(SlotRole::ALL.map(|role| host.item_fits(container, item, role)))
    }

    fn allows(self, role: SlotRole) -> bool {
        self.0[role as usize]
    }
}

fn read_source<H: Host + ?Sized>(
    host: &H,
    source: StackSource,
) -> Result<Option<(ItemTypeId, u32)>, MoveError> {
    match source {
        StackSource::Slot { container, slot } => {
            let inv = host
                .container(container)
                .ok_or(MoveError::ContainerMissing(container))?;
            Ok(inv.slot(slot).map(|s| (s.item_type, s.quantity)))
        }
        StackSource::Loose(item) => {
            let amount = host.amount(item.entity);
            Ok((amount > 0).then_some((item.item_type, amount)))
        }
    }
}

/// Remove `quantity` units from the source. `available` is the amount the
/// source held before the removal.
fn take<H: Host + ?Sized>(
    host: &mut H,
    source: StackSource,
    available: u32,
    quantity: u32,
) -> Result<u32, MoveError> {
    match source {
        StackSource::Slot { container, slot } => {
            let inv = host
                .container_mut(container)
                .ok_or(MoveError::ContainerMissing(container))?;
            Ok(inv.take_from_slot(slot, quantity))
        }
        StackSource::Loose(item) => {
            let taken = quantity.min(available);
            host.set_amount(item.entity, available - taken);
            Ok(taken)
        }
    }
}

/// Move units of one source stack into `destinations`, in order, spending at
/// most `budget`.
///
/// Saturated destinations are skipped. A `Deny` verdict skips the
/// destination; a `Destroy` verdict voids up to the remaining budget from the
/// source and ends the stack.
pub fn move_stack<H: Host + ?Sized>(
    host: &mut H,
    source: StackSource,
    destinations: &[Destination<'_>],
    budget: u32,
    feedback: Feedback,
) -> Result<MoveOutcome, MoveError> {
    let mut outcome = MoveOutcome::default();
    let Some((item_type, mut available)) = read_source(host, source)? else {
        return Ok(outcome);
    };
    let mut remaining = budget;

    for dest in destinations {
        if remaining == 0 || available == 0 {
            break;
        }
        let fit = RoleFit::query(host, dest.pos, item_type);
        let free = host
            .container(dest.pos)
            .ok_or(MoveError::ContainerMissing(dest.pos))?
            .free_capacity_where(item_type, |role| fit.allows(role));
        if free == 0 {
            continue;
        }
        match dest.filter.evaluate(item_type) {
            Verdict::Deny => continue,
            Verdict::Destroy => {
                let voided = take(host, source, available, available.min(remaining))?;
                outcome.destroyed += voided;
                outcome.destroys += 1;
                feedback.destroyed(host);
                break;
            }
            Verdict::Allow => {
                let want = available.min(remaining).min(free);
                let inserted = host
                    .container_mut(dest.pos)
                    .ok_or(MoveError::ContainerMissing(dest.pos))?
                    .insert_where(item_type, want, |role| fit.allows(role));
                if inserted == 0 {
                    continue;
                }
                let taken = take(host, source, available, inserted)?;
                available -= taken;
                remaining -= taken;
                outcome.moved += taken;
                outcome.deliveries += 1;
                feedback.delivered(host, dest.pos);
            }
        }
    }
    Ok(outcome)
}

/// Push every extractable slot of `source` through [`move_stack`] in slot
/// order, sharing one budget across slots.
pub fn drain_container<H: Host + ?Sized>(
    host: &mut H,
    source: BlockPos,
    destinations: &[Destination<'_>],
    budget: u32,
    feedback: Feedback,
) -> Result<MoveOutcome, MoveError> {
    let inv = host
        .container(source)
        .ok_or(MoveError::ContainerMissing(source))?;
    let slots: Vec<usize> = inv
        .stacks()
        .filter(|(i, s)| host.item_extractable(source, s.item_type, inv.role(*i)))
        .map(|(i, _)| i)
        .collect();

    let mut total = MoveOutcome::default();
    for slot in slots {
        let remaining = budget - total.consumed();
        if remaining == 0 {
            break;
        }
        let outcome = move_stack(
            host,
            StackSource::Slot {
                container: source,
                slot,
            },
            destinations,
            remaining,
            feedback,
        )?;
        total.merge(outcome);
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterType;
    use crate::id::{EntityId, WorldId};
    use crate::item::{Inventory, ItemStack};
    use crate::test_utils::{HookEvent, MockHost};

    const STONE: ItemTypeId = ItemTypeId(1);
    const DIRT: ItemTypeId = ItemTypeId(2);
    const COAL: ItemTypeId = ItemTypeId(3);
    const ORE: ItemTypeId = ItemTypeId(4);
    const INGOT: ItemTypeId = ItemTypeId(5);

    fn pos(x: i32) -> BlockPos {
        BlockPos::new(WorldId(0), x, 64, 0)
    }

    fn host_with(source: Inventory, dests: &[Inventory]) -> MockHost {
        let mut host = MockHost::new();
        host.add_container(pos(0), source);
        for (i, inv) in dests.iter().enumerate() {
            host.add_container(pos(i as i32 + 1), inv.clone());
        }
        host
    }

    fn stocked(item: ItemTypeId, qty: u32) -> Inventory {
        let mut inv = Inventory::hopper();
        assert_eq!(inv.insert(item, qty), qty);
        inv
    }

    #[test]
    fn splits_across_destinations_in_order() {
        let mut d1 = Inventory::new(1, 64);
        d1.set_slot(0, Some(ItemStack::new(STONE, 59)));
        let mut host = host_with(stocked(STONE, 10), &[d1, Inventory::new(1, 64)]);
        let open = Filter::default();
        let dests = [
            Destination { pos: pos(1), filter: &open },
            Destination { pos: pos(2), filter: &open },
        ];
        let src = StackSource::Slot { container: pos(0), slot: 0 };
        let out = move_stack(&mut host, src, &dests, 8, Feedback::Silent).unwrap();
        assert_eq!(out.moved, 8);
        assert_eq!(out.deliveries, 2);
        assert_eq!(host.quantity(pos(1), STONE), 64);
        assert_eq!(host.quantity(pos(2), STONE), 3);
        assert_eq!(host.quantity(pos(0), STONE), 2);
    }

    #[test]
    fn denied_destination_is_skipped() {
        let mut host = host_with(stocked(STONE, 4), &[Inventory::hopper(), Inventory::hopper()]);
        let deny = Filter::with_items(FilterType::Blacklist, [STONE]);
        let open = Filter::default();
        let dests = [
            Destination { pos: pos(1), filter: &deny },
            Destination { pos: pos(2), filter: &open },
        ];
        let src = StackSource::Slot { container: pos(0), slot: 0 };
        let out = move_stack(&mut host, src, &dests, 64, Feedback::Silent).unwrap();
        assert_eq!(out.deliveries, 1);
        assert_eq!(host.quantity(pos(2), STONE), 4);
        assert_eq!(host.quantity(pos(1), STONE), 0);
    }

    #[test]
    fn destroy_voids_and_ends_stack() {
        let mut host = host_with(stocked(STONE, 30), &[Inventory::hopper(), Inventory::hopper()]);
        let void = Filter::with_items(FilterType::Destroy, [STONE]);
        let open = Filter::default();
        let dests = [
            Destination { pos: pos(1), filter: &void },
            Destination { pos: pos(2), filter: &open },
        ];
        let src = StackSource::Slot { container: pos(0), slot: 0 };
        let out = move_stack(&mut host, src, &dests, 20, Feedback::Silent).unwrap();
        assert_eq!(out.moved, 0);
        assert_eq!(out.destroyed, 20);
        assert_eq!(out.destroys, 1);
        assert_eq!(out.consumed(), 20);
        assert_eq!(host.quantity(pos(0), STONE), 10);
        assert_eq!(host.quantity(pos(2), STONE), 0);
    }

    #[test]
    fn saturated_destination_is_skipped_before_filter() {
        let mut full = Inventory::new(1, 64);
        full.set_slot(0, Some(ItemStack::new(DIRT, 64)));
        let mut host = host_with(stocked(STONE, 5), &[full]);
        let void = Filter::with_items(FilterType::Destroy, [STONE]);
        let dests = [Destination { pos: pos(1), filter: &void }];
        let src = StackSource::Slot { container: pos(0), slot: 0 };
        let out = move_stack(&mut host, src, &dests, 64, Feedback::Silent).unwrap();
        assert!(out.is_empty());
        assert_eq!(host.quantity(pos(0), STONE), 5);
    }

    #[test]
    fn loose_source_goes_through_adapter() {
        let mut host = host_with(Inventory::hopper(), &[]);
        let item = LooseItem { entity: EntityId(9), item_type: STONE };
        host.spawn_loose(pos(0), item, 50);
        let open = Filter::default();
        let dests = [Destination { pos: pos(0), filter: &open }];
        let out = move_stack(&mut host, StackSource::Loose(item), &dests, 16, Feedback::Silent).unwrap();
        assert_eq!(out.moved, 16);
        assert_eq!(host.amount(EntityId(9)), 34);
        assert_eq!(host.quantity(pos(0), STONE), 16);

        let out = move_stack(&mut host, StackSource::Loose(item), &dests, 64, Feedback::Silent).unwrap();
        assert_eq!(out.moved, 34);
        assert!(!host.has_entity(EntityId(9)));
    }

    #[test]
    fn drain_shares_budget_across_slots() {
        let mut src = Inventory::hopper();
        src.set_slot(0, Some(ItemStack::new(STONE, 3)));
        src.set_slot(2, Some(ItemStack::new(DIRT, 10)));
        let mut host = host_with(src, &[Inventory::hopper()]);
        let open = Filter::default();
        let dests = [Destination { pos: pos(1), filter: &open }];
        let out = drain_container(&mut host, pos(0), &dests, 8, Feedback::Silent).unwrap();
        assert_eq!(out.moved, 8);
        assert_eq!(host.quantity(pos(1), STONE), 3);
        assert_eq!(host.quantity(pos(1), DIRT), 5);
        assert_eq!(host.quantity(pos(0), DIRT), 5);
    }

    #[test]
    fn missing_destination_is_an_error() {
        let mut host = host_with(stocked(STONE, 1), &[]);
        let open = Filter::default();
        let dests = [Destination { pos: pos(7), filter: &open }];
        let src = StackSource::Slot { container: pos(0), slot: 0 };
        assert_eq!(
            move_stack(&mut host, src, &dests, 1, Feedback::Silent),
            Err(MoveError::ContainerMissing(pos(7)))
        );
    }

    #[test]
    fn transfer_feedback_fires_per_delivery() {
        let mut host = host_with(stocked(STONE, 10), &[Inventory::new(1, 4), Inventory::hopper()]);
        let open = Filter::default();
        let dests = [
            Destination { pos: pos(1), filter: &open },
            Destination { pos: pos(2), filter: &open },
        ];
        let feedback = Feedback::Transfer { node: pos(0), from: pos(0) };
        let out = drain_container(&mut host, pos(0), &dests, 8, feedback).unwrap();
        assert_eq!(out.moved, 8);
        assert_eq!(
            host.events,
            vec![
                HookEvent::TransferSuccess(pos(0), pos(1)),
                HookEvent::TransferSuccess(pos(0), pos(2)),
            ]
        );
    }

    #[test]
    fn silent_feedback_fires_nothing() {
        let mut host = host_with(stocked(STONE, 10), &[Inventory::hopper()]);
        let void = Filter::with_items(FilterType::Destroy, [STONE]);
        let dests = [Destination { pos: pos(1), filter: &void }];
        let out = drain_container(&mut host, pos(0), &dests, 8, Feedback::Silent).unwrap();
        assert_eq!(out.destroyed, 8);
        assert!(host.events.is_empty());
    }

    #[test]
    fn furnace_gets_fuel_and_input_in_their_slots() {
        let mut src = Inventory::hopper();
        src.set_slot(0, Some(ItemStack::new(ORE, 10)));
        src.set_slot(1, Some(ItemStack::new(COAL, 6)));
        src.set_slot(2, Some(ItemStack::new(DIRT, 3)));
        let mut host = host_with(src, &[Inventory::furnace()]);
        host.allow_in(COAL, SlotRole::Fuel);
        host.allow_in(ORE, SlotRole::Input);
        let open = Filter::default();
        let dests = [Destination { pos: pos(1), filter: &open }];
        let out = drain_container(&mut host, pos(0), &dests, 64, Feedback::Silent).unwrap();

        assert_eq!(out.moved, 16);
        let furnace = host.container(pos(1)).unwrap();
        assert_eq!(furnace.slot(0), Some(&ItemStack::new(ORE, 10)));
        assert_eq!(furnace.slot(1), Some(&ItemStack::new(COAL, 6)));
        assert_eq!(furnace.slot(2), None);
        // dirt neither burns nor smelts
        assert_eq!(host.quantity(pos(0), DIRT), 3);
    }

    #[test]
    fn furnace_source_gives_up_only_its_output() {
        let mut furnace = Inventory::furnace();
        furnace.set_slot(0, Some(ItemStack::new(ORE, 5)));
        furnace.set_slot(1, Some(ItemStack::new(COAL, 5)));
        furnace.set_slot(2, Some(ItemStack::new(INGOT, 5)));
        let mut host = host_with(furnace, &[Inventory::hopper()]);
        let open = Filter::default();
        let dests = [Destination { pos: pos(1), filter: &open }];
        let out = drain_container(&mut host, pos(0), &dests, 64, Feedback::Silent).unwrap();

        assert_eq!(out.moved, 5);
        assert_eq!(host.quantity(pos(1), INGOT), 5);
        assert_eq!(host.quantity(pos(0), ORE), 5);
        assert_eq!(host.quantity(pos(0), COAL), 5);
    }

    #[test]
    fn host_can_release_fuel_slot_leftovers() {
        const BUCKET: ItemTypeId = ItemTypeId(6);
        let mut furnace = Inventory::furnace();
        furnace.set_slot(1, Some(ItemStack::new(BUCKET, 1)));
        let mut host = host_with(furnace, &[Inventory::hopper()]);
        host.allow_out(BUCKET, SlotRole::Fuel);
        let open = Filter::default();
        let dests = [Destination { pos: pos(1), filter: &open }];
        let out = drain_container(&mut host, pos(0), &dests, 64, Feedback::Silent).unwrap();
        assert_eq!(out.moved, 1);
        assert_eq!(host.quantity(pos(1), BUCKET), 1);
    }
}
