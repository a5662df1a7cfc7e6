use crate::id::ItemTypeId;
use serde::{Deserialize, Serialize};

/// Default per-slot stack limit for container inventories.
pub const DEFAULT_STACK_LIMIT: u32 = 64;

/// A stack of fungible items of one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item_type: ItemTypeId,
    pub quantity: u32,
}

impl ItemStack {
    pub fn new(item_type: ItemTypeId, quantity: u32) -> Self {
        Self {
            item_type,
            quantity,
        }
    }
}

/// What a slot is for. Chests and hoppers only have general slots; furnaces
/// and brewing stands split theirs by role.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum SlotRole {
    #[default]
    General,
    /// Smelting input or brewing ingredient.
    Input,
    Fuel,
    /// Products. Also where brewing stands keep their bottles.
    Output,
}

impl SlotRole {
    pub const ALL: [SlotRole; 4] = [
        SlotRole::General,
        SlotRole::Input,
        SlotRole::Fuel,
        SlotRole::Output,
    ];

    /// Order in which insertion visits roles: an item that is both fuel and
    /// smeltable tops up the fuel slot first.
    pub const INSERT_ORDER: [SlotRole; 4] = [
        SlotRole::Fuel,
        SlotRole::Input,
        SlotRole::Output,
        SlotRole::General,
    ];

    /// Whether an item fits a slot of this role when nothing else is known
    /// about it.
    pub fn fits_by_default(self) -> bool {
        self != SlotRole::Output
    }

    /// Whether automation may pull from a slot of this role by default.
    pub fn is_extractable(self) -> bool {
        matches!(self, SlotRole::General | SlotRole::Output)
    }
}

/// A container inventory: ordered slots, each holding at most `stack_limit`
/// units of a single item type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    slots: Vec<Option<ItemStack>>,
    /// Per-slot roles. Empty means every slot is general.
    #[serde(default)]
    roles: Vec<SlotRole>,
    stack_limit: u32,
}

impl Inventory {
    pub fn new(slot_count: usize, stack_limit: u32) -> Self {
        Self {
            slots: vec![None; slot_count],
            roles: Vec::new(),
            stack_limit,
        }
    }

    /// One slot per entry of `roles`.
    pub fn with_roles(roles: Vec<SlotRole>, stack_limit: u32) -> Self {
        Self {
            slots: vec![None; roles.len()],
            roles,
            stack_limit,
        }
    }

    /// A vanilla hopper: five slots of 64.
    pub fn hopper() -> Self {
        Self::new(5, DEFAULT_STACK_LIMIT)
    }

    /// Smelting input, fuel, result.
    pub fn furnace() -> Self {
        Self::with_roles(
            vec![SlotRole::Input, SlotRole::Fuel, SlotRole::Output],
            DEFAULT_STACK_LIMIT,
        )
    }

    /// Three bottle slots, ingredient, blaze powder.
    pub fn brewing_stand() -> Self {
        Self::with_roles(
            vec![
                SlotRole::Output,
                SlotRole::Output,
                SlotRole::Output,
                SlotRole::Input,
                SlotRole::Fuel,
            ],
            DEFAULT_STACK_LIMIT,
        )
    }

    pub fn role(&self, index: usize) -> SlotRole {
        self.roles.get(index).copied().unwrap_or_default()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn stack_limit(&self) -> u32 {
        self.stack_limit
    }

    pub fn slot(&self, index: usize) -> Option<&ItemStack> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Overwrite a slot. Quantities above the stack limit are clamped and an
    /// empty stack clears the slot. Returns false if the index is out of range.
    pub fn set_slot(&mut self, index: usize, stack: Option<ItemStack>) -> bool {
        let limit = self.stack_limit;
        let Some(slot) = self.slots.get_mut(index) else {
            return false;
        };
        *slot = stack
            .filter(|s| s.quantity > 0)
            .map(|s| ItemStack::new(s.item_type, s.quantity.min(limit)));
        true
    }

    /// Occupied slots in slot order.
    pub fn stacks(&self) -> impl Iterator<Item = (usize, &ItemStack)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (i, s)))
    }

    /// Units of `item_type` that could still be inserted, with every role
    /// taking its default fit.
    pub fn free_capacity(&self, item_type: ItemTypeId) -> u32 {
        self.free_capacity_where(item_type, SlotRole::fits_by_default)
    }

    /// Units of `item_type` that could still be inserted into slots whose
    /// role passes `fits`.
    pub fn free_capacity_where(
        &self,
        item_type: ItemTypeId,
        fits: impl Fn(SlotRole) -> bool,
    ) -> u32 {
        self.slots
            .iter()
            .enumerate()
            .filter(|(i, _)| fits(self.role(*i)))
            .map(|(_, slot)| match slot {
                None => self.stack_limit,
                Some(s) if s.item_type == item_type => {
                    self.stack_limit.saturating_sub(s.quantity)
                }
                Some(_) => 0,
            })
            .fold(0u32, u32::saturating_add)
    }

    /// True when no slot can accept a single unit of anything.
    pub fn is_full(&self) -> bool {
        self.slots
            .iter()
            .all(|slot| matches!(slot, Some(s) if s.quantity >= self.stack_limit))
    }

    /// Insert up to `quantity` units, with every role taking its default fit.
    /// Returns the amount actually inserted.
    #[must_use = "returns the quantity actually inserted, which may be less than requested"]
    pub fn insert(&mut self, item_type: ItemTypeId, quantity: u32) -> u32 {
        self.insert_where(item_type, quantity, SlotRole::fits_by_default)
    }

    /// Insert up to `quantity` units into slots whose role passes `fits`.
    /// Roles are visited in [`SlotRole::INSERT_ORDER`]; within a role, slots
    /// are topped up or filled in slot order. Returns the amount inserted.
    #[must_use = "returns the quantity actually inserted, which may be less than requested"]
    pub fn insert_where(
        &mut self,
        item_type: ItemTypeId,
        quantity: u32,
        fits: impl Fn(SlotRole) -> bool,
    ) -> u32 {
        let limit = self.stack_limit;
        let mut remaining = quantity;
        for role in SlotRole::INSERT_ORDER {
            if !fits(role) {
                continue;
            }
            for i in 0..self.slots.len() {
                if remaining == 0 {
                    return quantity;
                }
                if self.role(i) != role {
                    continue;
                }
                let slot = &mut self.slots[i];
                match slot {
                    Some(s) if s.item_type == item_type => {
                        let add = limit.saturating_sub(s.quantity).min(remaining);
                        s.quantity += add;
                        remaining -= add;
                    }
                    Some(_) => {}
                    None => {
                        let add = limit.min(remaining);
                        if add > 0 {
                            *slot = Some(ItemStack::new(item_type, add));
                            remaining -= add;
                        }
                    }
                }
            }
        }
        quantity - remaining
    }

    /// Remove up to `quantity` units from one slot. Returns the amount removed.
    #[must_use = "returns the quantity actually removed, which may be less than requested"]
    pub fn take_from_slot(&mut self, index: usize, quantity: u32) -> u32 {
        let Some(slot) = self.slots.get_mut(index) else {
            return 0;
        };
        let Some(stack) = slot.as_mut() else {
            return 0;
        };
        let taken = quantity.min(stack.quantity);
        stack.quantity -= taken;
        if stack.quantity == 0 {
            *slot = None;
        }
        taken
    }

    /// Quantity of a specific item type across all slots.
    pub fn quantity(&self, item_type: ItemTypeId) -> u32 {
        self.stacks()
            .filter(|(_, s)| s.item_type == item_type)
            .map(|(_, s)| s.quantity)
            .sum()
    }

    /// Total units across all types.
    pub fn total(&self) -> u32 {
        self.stacks().map(|(_, s)| s.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}
