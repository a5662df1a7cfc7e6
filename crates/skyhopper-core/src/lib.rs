//! SkyHopper Core -- the scheduled suction and transfer engine for automated
//! hoppers.
//!
//! Each node (an upgraded hopper) pulls nearby loose items into itself and
//! pushes its contents into linked containers, both on independent per-node
//! cooldowns and both subject to content filters. The host server drives the
//! engine with a periodic tick and answers world queries through the traits
//! in [`world`].
//!
//! # Three-Pass Tick
//!
//! Each call to [`engine::Engine::step`] runs:
//!
//! 1. **Deferred** -- Resolve moves recorded from native item-move signals on
//!    the previous tick. Each entry runs at most once and is never retried.
//! 2. **Suction** -- Eligible nodes gather loose items in a cube around
//!    themselves.
//! 3. **Transfer** -- Eligible nodes drain their slots into linked
//!    destinations under a shared per-tick budget.
//!
//! A global pause gate turns suction and transfer into no-ops and drops the
//! deferred queue without executing it.
//!
//! # Key Types
//!
//! - [`engine::Engine`] -- Registry owner, pause gate, signal classifier and
//!   tick driver.
//! - [`node::Node`] -- One automated hopper: attributes plus rate-limit clocks.
//! - [`filter::Filter`] -- Filter policy and item set; [`filter::evaluate`] is
//!   the single decision function.
//! - [`mover`] -- Budgeted multi-destination moves.
//! - [`upgrade::UpgradeTable`] -- Upgrade ladders for the six stats.
//! - [`serialize`] -- Versioned attribute records via bitcode.
//! - [`fixed::Seconds`] -- Q32.32 fixed-point cooldown lengths.

pub mod clock;
pub mod config;
pub mod deferred;
pub mod engine;
pub mod filter;
pub mod fixed;
pub mod id;
pub mod item;
pub mod mover;
pub mod node;
pub mod registry;
pub mod serialize;
pub mod sim;
pub mod suction;
pub mod transfer;
pub mod upgrade;
pub mod world;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
