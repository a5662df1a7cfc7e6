//! Per-node rate limiting.
//!
//! Each node carries two independent "next eligible time" clocks, one for
//! suction and one for transfer. An operation is eligible once `now` has
//! reached its clock; attempting it pushes the clock `speed * 1000` ms past
//! `now`.

use crate::fixed::{cooldown_millis, Millis, Seconds};

/// The two scheduled operations a node performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Suction,
    Transfer,
}

/// Next-eligible timestamps for a node's operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Clocks {
    next_suction: Millis,
    next_transfer: Millis,
}

impl Clocks {
    /// Clocks for a node created at `now`: each operation first becomes
    /// eligible one full cooldown later.
    pub fn starting(now: Millis, suction_speed: Seconds, transfer_speed: Seconds) -> Self {
        Self {
            next_suction: now.saturating_add(cooldown_millis(suction_speed)),
            next_transfer: now.saturating_add(cooldown_millis(transfer_speed)),
        }
    }

    pub fn next(&self, op: Operation) -> Millis {
        match op {
            Operation::Suction => self.next_suction,
            Operation::Transfer => self.next_transfer,
        }
    }

    pub fn is_eligible(&self, op: Operation, now: Millis) -> bool {
        now >= self.next(op)
    }

    /// Record an attempt at `now`.
    pub fn advance(&mut self, op: Operation, now: Millis, speed: Seconds) {
        let next = now.saturating_add(cooldown_millis(speed));
        match op {
            Operation::Suction => self.next_suction = next,
            Operation::Transfer => self.next_transfer = next,
        }
    }

    /// Force a clock to a specific timestamp.
    pub fn set(&mut self, op: Operation, at: Millis) {
        match op {
            Operation::Suction => self.next_suction = at,
            Operation::Transfer => self.next_transfer = at,
        }
    }
}
