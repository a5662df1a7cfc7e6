//! The node record: one automated hopper.
//!
//! A [`Node`] is the coordinate, its persisted [`NodeAttributes`] and its
//! runtime [`Clocks`]. Attributes are what the physical storage holds; clocks
//! are rebuilt from `now` whenever a node is loaded.

use crate::clock::{Clocks, Operation};
use crate::filter::{Filter, FilterType};
use crate::fixed::{Millis, Seconds};
use crate::id::{BlockPos, ItemTypeId, PlayerId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// Capped stats
// ---------------------------------------------------------------------------

/// Which way a stat gets better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Improvement {
    /// Larger is better (amounts, radius, link count).
    Increase,
    /// Smaller is better (cooldowns).
    Decrease,
}

impl Improvement {
    /// True if `a` is strictly better than `b`.
    pub fn is_better<T: PartialOrd>(self, a: T, b: T) -> bool {
        match self {
            Improvement::Increase => a > b,
            Improvement::Decrease => a < b,
        }
    }
}

/// An upgradeable stat: its current value and the best value it may reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capped<T> {
    current: T,
    cap: T,
    direction: Improvement,
}

impl<T: PartialOrd + Copy> Capped<T> {
    /// A stat starting at `current`. A current value past the cap is pulled
    /// back to the cap.
    pub fn new(current: T, cap: T, direction: Improvement) -> Self {
        let current = if direction.is_better(current, cap) {
            cap
        } else {
            current
        };
        Self {
            current,
            cap,
            direction,
        }
    }

    /// A stat whose cap is its starting value.
    pub fn fixed(value: T, direction: Improvement) -> Self {
        Self::new(value, value, direction)
    }

    pub fn current(&self) -> T {
        self.current
    }

    pub fn cap(&self) -> T {
        self.cap
    }

    pub fn direction(&self) -> Improvement {
        self.direction
    }

    /// Whether `value` lies on the allowed side of the cap.
    pub fn allows(&self, value: T) -> bool {
        !self.direction.is_better(value, self.cap)
    }

    pub fn is_maxed(&self) -> bool {
        !self.direction.is_better(self.cap, self.current)
    }

    /// Set the current value. Returns false and leaves the stat untouched if
    /// `value` is past the cap.
    pub fn set(&mut self, value: T) -> bool {
        if !self.allows(value) {
            return false;
        }
        self.current = value;
        true
    }
}

/// Every upgradeable stat of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upgrades {
    pub transfer_speed: Capped<Seconds>,
    pub transfer_amount: Capped<u32>,
    pub suction_speed: Capped<Seconds>,
    pub suction_amount: Capped<u32>,
    pub suction_range: Capped<u32>,
    pub max_links: Capped<u32>,
}

// ---------------------------------------------------------------------------
// Links and attributes
// ---------------------------------------------------------------------------

/// A destination container with its own filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub destination: BlockPos,
    pub filter: Filter,
}

impl Link {
    pub fn new(destination: BlockPos) -> Self {
        Self {
            destination,
            filter: Filter::default(),
        }
    }
}

/// The persisted part of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttributes {
    pub enabled: bool,
    pub particles_enabled: bool,
    pub owner: Option<PlayerId>,
    pub members: BTreeSet<PlayerId>,
    pub filter: Filter,
    pub upgrades: Upgrades,
    pub links: Vec<Link>,
}

impl NodeAttributes {
    /// Fresh attributes for a newly placed node.
    pub fn new(upgrades: Upgrades, owner: Option<PlayerId>) -> Self {
        Self {
            enabled: true,
            particles_enabled: true,
            owner,
            members: BTreeSet::new(),
            filter: Filter::default(),
            upgrades,
            links: Vec::new(),
        }
    }
}

/// Errors from node management operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeError {
    #[error("a node cannot link to itself")]
    SelfLink,
    #[error("already linked to {0:?}")]
    AlreadyLinked(BlockPos),
    #[error("link limit of {0} reached")]
    LinkLimit(u32),
    #[error("no link to {0:?}")]
    NotLinked(BlockPos),
    #[error("{0:?} is not a container")]
    NotAContainer(BlockPos),
    #[error("no node at {0:?}")]
    NoSuchNode(BlockPos),
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pos: BlockPos,
    pub attrs: NodeAttributes,
    pub clocks: Clocks,
}

impl Node {
    /// Build a node from stored attributes. Both clocks start one cooldown
    /// after `now`.
    pub fn new(pos: BlockPos, attrs: NodeAttributes, now: Millis) -> Self {
        let clocks = Clocks::starting(
            now,
            attrs.upgrades.suction_speed.current(),
            attrs.upgrades.transfer_speed.current(),
        );
        Self { pos, attrs, clocks }
    }

    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    pub fn upgrades(&self) -> &Upgrades {
        &self.attrs.upgrades
    }

    pub fn links(&self) -> &[Link] {
        &self.attrs.links
    }

    pub fn is_enabled(&self) -> bool {
        self.attrs.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.attrs.enabled = enabled;
    }

    pub fn particles_enabled(&self) -> bool {
        self.attrs.particles_enabled
    }

    pub fn set_particles_enabled(&mut self, enabled: bool) {
        self.attrs.particles_enabled = enabled;
    }

    /// Cooldown length of an operation at the current upgrade level.
    pub fn speed(&self, op: Operation) -> Seconds {
        match op {
            Operation::Suction => self.attrs.upgrades.suction_speed.current(),
            Operation::Transfer => self.attrs.upgrades.transfer_speed.current(),
        }
    }

    /// Units the node may move per attempt of an operation.
    pub fn amount(&self, op: Operation) -> u32 {
        match op {
            Operation::Suction => self.attrs.upgrades.suction_amount.current(),
            Operation::Transfer => self.attrs.upgrades.transfer_amount.current(),
        }
    }

    pub fn is_eligible(&self, op: Operation, now: Millis) -> bool {
        self.clocks.is_eligible(op, now)
    }

    /// Advance an operation's clock by its current cooldown.
    pub fn advance(&mut self, op: Operation, now: Millis) {
        let speed = self.speed(op);
        self.clocks.advance(op, now, speed);
    }

    // -- Links --

    pub fn is_linked(&self, destination: BlockPos) -> bool {
        self.attrs.links.iter().any(|l| l.destination == destination)
    }

    /// Append a link. Container validity is checked by the engine, which can
    /// see the world.
    pub fn link(&mut self, destination: BlockPos) -> Result<(), NodeError> {
        if destination == self.pos {
            return Err(NodeError::SelfLink);
        }
        if self.is_linked(destination) {
            return Err(NodeError::AlreadyLinked(destination));
        }
        let limit = self.attrs.upgrades.max_links.current();
        if self.attrs.links.len() >= limit as usize {
            return Err(NodeError::LinkLimit(limit));
        }
        self.attrs.links.push(Link::new(destination));
        Ok(())
    }

    pub fn unlink(&mut self, destination: BlockPos) -> Result<Link, NodeError> {
        let index = self
            .attrs
            .links
            .iter()
            .position(|l| l.destination == destination)
            .ok_or(NodeError::NotLinked(destination))?;
        Ok(self.attrs.links.remove(index))
    }

    pub fn link_mut(&mut self, destination: BlockPos) -> Result<&mut Link, NodeError> {
        self.attrs
            .links
            .iter_mut()
            .find(|l| l.destination == destination)
            .ok_or(NodeError::NotLinked(destination))
    }

    /// Drop every link to `destination`. Returns true if any were removed.
    pub fn prune_links_to(&mut self, destination: BlockPos) -> bool {
        let before = self.attrs.links.len();
        self.attrs.links.retain(|l| l.destination != destination);
        self.attrs.links.len() != before
    }

    // -- Filters --

    pub fn filter(&self) -> &Filter {
        &self.attrs.filter
    }

    pub fn set_filter_type(&mut self, kind: FilterType) {
        self.attrs.filter.kind = kind;
    }

    pub fn add_filter_item(&mut self, item: ItemTypeId) -> bool {
        self.attrs.filter.add_item(item)
    }

    pub fn remove_filter_item(&mut self, item: ItemTypeId) -> bool {
        self.attrs.filter.remove_item(item)
    }

    // -- Access --

    pub fn owner(&self) -> Option<PlayerId> {
        self.attrs.owner
    }

    pub fn set_owner(&mut self, owner: Option<PlayerId>) {
        self.attrs.owner = owner;
    }

    pub fn members(&self) -> &BTreeSet<PlayerId> {
        &self.attrs.members
    }

    pub fn add_member(&mut self, player: PlayerId) -> bool {
        self.attrs.members.insert(player)
    }

    pub fn remove_member(&mut self, player: PlayerId) -> bool {
        self.attrs.members.remove(&player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::seconds;
    use crate::id::WorldId;

    fn pos(x: i32) -> BlockPos {
        BlockPos::new(WorldId(0), x, 64, 0)
    }

    fn upgrades(max_links: u32) -> Upgrades {
        Upgrades {
            transfer_speed: Capped::new(seconds(1.0), seconds(0.25), Improvement::Decrease),
            transfer_amount: Capped::new(8, 64, Improvement::Increase),
            suction_speed: Capped::new(seconds(2.0), seconds(0.5), Improvement::Decrease),
            suction_amount: Capped::new(4, 64, Improvement::Increase),
            suction_range: Capped::new(3, 8, Improvement::Increase),
            max_links: Capped::new(max_links, 10, Improvement::Increase),
        }
    }

    fn node(max_links: u32) -> Node {
        Node::new(pos(0), NodeAttributes::new(upgrades(max_links), None), 1_000)
    }

    #[test]
    fn capped_respects_direction() {
        let mut speed = Capped::new(seconds(1.0), seconds(0.25), Improvement::Decrease);
        assert!(speed.set(seconds(0.5)));
        assert!(speed.set(seconds(0.25)));
        assert!(speed.is_maxed());
        assert!(!speed.set(seconds(0.1)));
        assert_eq!(speed.current(), seconds(0.25));

        let mut amount = Capped::new(8u32, 16, Improvement::Increase);
        assert!(!amount.set(17));
        assert!(amount.set(16));
        assert!(amount.is_maxed());
    }

    #[test]
    fn capped_new_clamps_to_cap() {
        let amount = Capped::new(99u32, 16, Improvement::Increase);
        assert_eq!(amount.current(), 16);
        let speed = Capped::new(seconds(0.1), seconds(0.5), Improvement::Decrease);
        assert_eq!(speed.current(), seconds(0.5));
    }

    #[test]
    fn new_node_clocks_start_one_cooldown_out() {
        let n = node(2);
        assert_eq!(n.clocks.next(Operation::Suction), 3_000);
        assert_eq!(n.clocks.next(Operation::Transfer), 2_000);
        assert!(n.is_enabled());
        assert!(n.particles_enabled());
    }

    #[test]
    fn link_rules() {
        let mut n = node(2);
        assert_eq!(n.link(pos(0)), Err(NodeError::SelfLink));
        assert_eq!(n.link(pos(1)), Ok(()));
        assert_eq!(n.link(pos(1)), Err(NodeError::AlreadyLinked(pos(1))));
        assert_eq!(n.link(pos(2)), Ok(()));
        assert_eq!(n.link(pos(3)), Err(NodeError::LinkLimit(2)));
        assert_eq!(n.links().len(), 2);
    }

    #[test]
    fn unlink_and_prune() {
        let mut n = node(3);
        n.link(pos(1)).unwrap();
        n.link(pos(2)).unwrap();
        assert_eq!(n.unlink(pos(1)).map(|l| l.destination), Ok(pos(1)));
        assert_eq!(n.unlink(pos(1)), Err(NodeError::NotLinked(pos(1))));
        assert!(n.prune_links_to(pos(2)));
        assert!(!n.prune_links_to(pos(2)));
        assert!(n.links().is_empty());
    }

    #[test]
    fn link_filter_is_independent() {
        let mut n = node(2);
        n.link(pos(1)).unwrap();
        let link = n.link_mut(pos(1)).unwrap();
        link.filter.kind = FilterType::Whitelist;
        link.filter.add_item(ItemTypeId(7));
        assert_eq!(n.filter().kind, FilterType::None);
        assert_eq!(n.links()[0].filter.items().len(), 1);
    }

    #[test]
    fn members_and_owner_may_overlap() {
        let mut n = node(1);
        let p = PlayerId([1; 16]);
        n.set_owner(Some(p));
        assert!(n.add_member(p));
        assert!(!n.add_member(p));
        assert_eq!(n.owner(), Some(p));
        assert!(n.remove_member(p));
    }

    #[test]
    fn advance_uses_current_speed() {
        let mut n = node(1);
        n.advance(Operation::Transfer, 5_000);
        assert_eq!(n.clocks.next(Operation::Transfer), 6_000);
        n.attrs.upgrades.transfer_speed.set(seconds(0.5));
        n.advance(Operation::Transfer, 6_000);
        assert_eq!(n.clocks.next(Operation::Transfer), 6_500);
    }
}
