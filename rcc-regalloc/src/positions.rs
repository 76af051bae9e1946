//! Per-register position table used when choosing registers
//!
//! For each register the allocator records the next position at which it is
//! needed (`UNUSED` when free for the rest of the method), a few sticky tags
//! describing the value last placed there, and whether the register is
//! blocked outright. Blocked registers must not be queried.

use crate::intervals::LiveIntervals;
use crate::types::Register;
use bitvec::vec::BitVec;

/// Position of a register nobody needs again
pub const UNUSED: u32 = u32::MAX;

const INITIAL_SIZE: usize = 16;

/// What kind of value a register holds, for eviction heuristics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterKind {
    /// Used by a monitor enter/exit
    Monitor,
    /// Holds a constant number
    ConstNumber,
    /// None of the above, and not a string allocation pinned to its register
    Other,
    Any,
}

/// Read side of a position table
pub trait RegisterPositions {
    /// Number of registers covered by the table
    fn limit(&self) -> usize;

    fn is_blocked(&self, index: Register) -> bool;

    /// Next use of register `index`; it must not be blocked
    fn get(&self, index: Register) -> u32;

    /// Does register `index` hold a value of `kind`; it must not be blocked
    fn has_type(&self, index: Register, kind: RegisterKind) -> bool;

    /// Wide values also need the register above `index`
    fn is_blocked_wide(&self, index: Register, wide: bool) -> bool {
        self.is_blocked(index) || (wide && self.is_blocked(index + 1))
    }
}

fn bit(bits: &BitVec, index: Register) -> bool {
    bits.get(index as usize).map_or(false, |b| *b)
}

fn set_bit(bits: &mut BitVec, index: Register, value: bool) {
    let index = index as usize;
    if index >= bits.len() {
        if !value {
            return;
        }
        bits.resize(index + 1, false);
    }
    bits.set(index, value);
}

/// The allocator's shared position table
#[derive(Debug, Clone)]
pub struct RegisterPositionsTable {
    limit: usize,
    /// Grows by doubling up to `limit`; entries past the end are `UNUSED`
    backing: Vec<u32>,
    holds_constant: BitVec,
    holds_monitor: BitVec,
    holds_new_string_instance_disallowing_spilling: BitVec,
    blocked: BitVec,
}

impl RegisterPositionsTable {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            backing: vec![UNUSED; INITIAL_SIZE.min(limit)],
            holds_constant: BitVec::new(),
            holds_monitor: BitVec::new(),
            holds_new_string_instance_disallowing_spilling: BitVec::new(),
            blocked: BitVec::new(),
        }
    }

    /// Record the next use of register `index` without touching its tags
    pub fn set_position(&mut self, index: Register, value: u32) {
        let slot = index as usize;
        assert!(
            slot < self.limit,
            "register r{} is outside the table limit {}",
            index,
            self.limit
        );
        if slot >= self.backing.len() {
            self.grow(slot + 1);
        }
        self.backing[slot] = value;
    }

    /// Record the next use of register `index` and what `intervals` put there
    pub fn set(&mut self, index: Register, value: u32, intervals: &LiveIntervals) {
        self.set_position(index, value);
        set_bit(&mut self.holds_constant, index, intervals.is_constant_number_interval());
        set_bit(&mut self.holds_monitor, index, intervals.used_in_monitor_operation());
        set_bit(
            &mut self.holds_new_string_instance_disallowing_spilling,
            index,
            intervals.is_new_string_instance_disallowing_spilling(),
        );
    }

    pub fn set_blocked(&mut self, index: Register) {
        set_bit(&mut self.blocked, index, true);
    }

    /// Current size of the backing store
    pub fn capacity(&self) -> usize {
        self.backing.len()
    }

    fn grow(&mut self, min_size: usize) {
        let mut size = self.backing.len().max(1);
        while size < min_size {
            size *= 2;
        }
        let size = size.min(self.limit);
        self.backing.resize(size, UNUSED);
    }
}

impl RegisterPositions for RegisterPositionsTable {
    fn limit(&self) -> usize {
        self.limit
    }

    fn is_blocked(&self, index: Register) -> bool {
        bit(&self.blocked, index)
    }

    fn get(&self, index: Register) -> u32 {
        assert!(!self.is_blocked(index), "position of blocked register r{} requested", index);
        debug_assert!((index as usize) < self.limit);
        self.backing.get(index as usize).copied().unwrap_or(UNUSED)
    }

    fn has_type(&self, index: Register, kind: RegisterKind) -> bool {
        assert!(!self.is_blocked(index), "type of blocked register r{} requested", index);
        let constant = bit(&self.holds_constant, index);
        let monitor = bit(&self.holds_monitor, index);
        match kind {
            RegisterKind::Monitor => monitor,
            RegisterKind::ConstNumber => constant,
            RegisterKind::Other => {
                !monitor
                    && !constant
                    && !bit(&self.holds_new_string_instance_disallowing_spilling, index)
            }
            RegisterKind::Any => true,
        }
    }
}

/// A view of a position table with some registers blocked on top.
///
/// Lets the allocator try out an assignment without touching the shared
/// table; `reset` drops the extra blocks again.
pub struct RegisterPositionsWithExtraBlockedRegisters<'a, P: RegisterPositions + ?Sized> {
    positions: &'a P,
    extra_blocked: BitVec,
}

impl<'a, P: RegisterPositions + ?Sized> RegisterPositionsWithExtraBlockedRegisters<'a, P> {
    pub fn new(positions: &'a P) -> Self {
        Self {
            positions,
            extra_blocked: BitVec::new(),
        }
    }

    pub fn set_blocked_temporarily(&mut self, index: Register) {
        set_bit(&mut self.extra_blocked, index, true);
    }

    pub fn is_blocked_temporarily(&self, index: Register) -> bool {
        bit(&self.extra_blocked, index)
    }

    pub fn reset(&mut self) {
        self.extra_blocked.clear();
    }
}

impl<P: RegisterPositions + ?Sized> RegisterPositions for RegisterPositionsWithExtraBlockedRegisters<'_, P> {
    fn limit(&self) -> usize {
        self.positions.limit()
    }

    fn is_blocked(&self, index: Register) -> bool {
        self.is_blocked_temporarily(index) || self.positions.is_blocked(index)
    }

    fn get(&self, index: Register) -> u32 {
        assert!(!self.is_blocked(index), "position of blocked register r{} requested", index);
        self.positions.get(index)
    }

    fn has_type(&self, index: Register, kind: RegisterKind) -> bool {
        assert!(!self.is_blocked(index), "type of blocked register r{} requested", index);
        self.positions.has_type(index, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intervals::{LiveIntervalsTable, Value};
    use crate::types::ValueType;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_is_unused() {
        let table = RegisterPositionsTable::new(100);
        assert_eq!(table.get(0), UNUSED);
        assert_eq!(table.get(99), UNUSED);
        assert!(table.has_type(5, RegisterKind::Other));
    }

    #[test]
    fn test_backing_grows_by_doubling_up_to_limit() {
        let mut table = RegisterPositionsTable::new(40);
        assert_eq!(table.capacity(), 16);
        table.set_position(16, 3);
        assert_eq!(table.capacity(), 32);
        table.set_position(39, 7);
        assert_eq!(table.capacity(), 40);
        assert_eq!(table.get(16), 3);
        assert_eq!(table.get(39), 7);
        assert_eq!(table.get(20), UNUSED);

        let small = RegisterPositionsTable::new(4);
        assert_eq!(small.capacity(), 4);
    }

    #[test]
    #[should_panic(expected = "outside the table limit")]
    fn test_set_beyond_limit_panics() {
        let mut table = RegisterPositionsTable::new(8);
        table.set_position(8, 1);
    }

    #[test]
    fn test_tags_follow_last_value() {
        let mut intervals = LiveIntervalsTable::new();
        let constant = intervals.add_value(Value::constant(ValueType::Int, 3), 2);
        let monitor = intervals.add_value(Value::other(ValueType::Object), 2);
        intervals.get_mut(monitor).unwrap().set_used_in_monitor_operation(true);
        let string = intervals.add_value(Value::other(ValueType::Object), 2);
        intervals
            .get_mut(string)
            .unwrap()
            .set_new_string_instance_disallowing_spilling(true);

        let mut table = RegisterPositionsTable::new(16);
        table.set(2, 10, &intervals[constant]);
        assert!(table.has_type(2, RegisterKind::ConstNumber));
        assert!(!table.has_type(2, RegisterKind::Other));

        table.set(2, 12, &intervals[monitor]);
        assert!(table.has_type(2, RegisterKind::Monitor));
        assert!(!table.has_type(2, RegisterKind::ConstNumber));
        assert_eq!(table.get(2), 12);

        table.set(2, 14, &intervals[string]);
        assert!(!table.has_type(2, RegisterKind::Other));
        assert!(table.has_type(2, RegisterKind::Any));

        // A plain position update keeps the tags
        table.set_position(2, 20);
        assert!(!table.has_type(2, RegisterKind::Other));
    }

    #[test]
    fn test_blocked_wide() {
        let mut table = RegisterPositionsTable::new(16);
        table.set_blocked(5);
        assert!(table.is_blocked(5));
        assert!(!table.is_blocked_wide(3, true));
        assert!(table.is_blocked_wide(4, true));
        assert!(!table.is_blocked_wide(4, false));
    }

    #[test]
    #[should_panic(expected = "blocked register r1")]
    fn test_get_blocked_panics() {
        let mut table = RegisterPositionsTable::new(16);
        table.set_blocked(1);
        table.get(1);
    }

    #[test]
    fn test_extra_blocked_registers_leave_base_untouched() {
        let mut table = RegisterPositionsTable::new(16);
        table.set_position(3, 8);
        table.set_blocked(7);

        let mut view = RegisterPositionsWithExtraBlockedRegisters::new(&table);
        view.set_blocked_temporarily(3);
        assert!(view.is_blocked(3));
        assert!(view.is_blocked(7));
        assert!(view.is_blocked_wide(2, true));
        assert!(!table.is_blocked(3));
        assert_eq!(view.limit(), 16);

        view.reset();
        assert!(!view.is_blocked(3));
        assert!(view.is_blocked(7));
        assert_eq!(view.get(3), 8);
    }

    #[test]
    #[should_panic(expected = "blocked register r4")]
    fn test_view_rejects_temporarily_blocked_query() {
        let table = RegisterPositionsTable::new(16);
        let mut view = RegisterPositionsWithExtraBlockedRegisters::new(&table);
        view.set_blocked_temporarily(4);
        view.has_type(4, RegisterKind::Any);
    }
}
