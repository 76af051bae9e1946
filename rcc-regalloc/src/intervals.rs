//! Live intervals as seen by move resolution
//!
//! Liveness and splitting happen upstream. By the time moves are resolved
//! every interval has a register, and the resolver only reads the flags below.

use crate::types::{Register, ValueType};
use std::ops::Index;

/// Handle of an interval inside a `LiveIntervalsTable`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntervalId(pub u32);

/// How an SSA value was defined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueDefinition {
    /// Defined by a constant load
    ConstNumber(i64),
    /// Incoming method argument
    Argument,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Value {
    pub ty: ValueType,
    pub definition: ValueDefinition,
}

impl Value {
    pub fn new(ty: ValueType, definition: ValueDefinition) -> Self {
        Self { ty, definition }
    }

    pub fn constant(ty: ValueType, value: i64) -> Self {
        Self::new(ty, ValueDefinition::ConstNumber(value))
    }

    pub fn argument(ty: ValueType) -> Self {
        Self::new(ty, ValueDefinition::Argument)
    }

    pub fn other(ty: ValueType) -> Self {
        Self::new(ty, ValueDefinition::Other)
    }

    pub fn is_const_number(&self) -> bool {
        matches!(self.definition, ValueDefinition::ConstNumber(_))
    }

    pub fn is_argument(&self) -> bool {
        matches!(self.definition, ValueDefinition::Argument)
    }
}

/// One register assignment of a value over part of its lifetime
#[derive(Debug, Clone)]
pub struct LiveIntervals {
    value: Value,
    register: Register,
    split_parent: IntervalId,

    /// The value lives in its spill slot over this interval
    spilled: bool,

    /// The value can be regenerated instead of being kept alive
    rematerializable: bool,

    used_in_monitor_operation: bool,

    /// String allocation that must stay in a register until its constructor runs
    new_string_instance_disallowing_spilling: bool,
}

impl LiveIntervals {
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn ty(&self) -> ValueType {
        self.value.ty
    }

    pub fn register(&self) -> Register {
        self.register
    }

    pub fn split_parent(&self) -> IntervalId {
        self.split_parent
    }

    pub fn is_argument_interval(&self) -> bool {
        self.value.is_argument()
    }

    pub fn is_constant_number_interval(&self) -> bool {
        self.value.is_const_number()
    }

    pub fn is_spilled(&self) -> bool {
        self.spilled
    }

    pub fn is_rematerializable(&self) -> bool {
        self.rematerializable
    }

    pub fn is_spilled_and_rematerializable(&self) -> bool {
        self.spilled && self.rematerializable
    }

    pub fn used_in_monitor_operation(&self) -> bool {
        self.used_in_monitor_operation
    }

    pub fn is_new_string_instance_disallowing_spilling(&self) -> bool {
        self.new_string_instance_disallowing_spilling
    }

    pub fn set_spilled(&mut self, spilled: bool) {
        self.spilled = spilled;
    }

    pub fn set_rematerializable(&mut self, rematerializable: bool) {
        self.rematerializable = rematerializable;
    }

    pub fn set_used_in_monitor_operation(&mut self, used: bool) {
        self.used_in_monitor_operation = used;
    }

    pub fn set_new_string_instance_disallowing_spilling(&mut self, flag: bool) {
        self.new_string_instance_disallowing_spilling = flag;
    }
}

/// Arena owning all intervals of one method
#[derive(Debug, Default)]
pub struct LiveIntervalsTable {
    intervals: Vec<LiveIntervals>,
}

impl LiveIntervalsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the first interval of `value`, which becomes its split parent.
    ///
    /// Constants and arguments start out rematerializable.
    pub fn add_value(&mut self, value: Value, register: Register) -> IntervalId {
        let id = self.next_id();
        self.intervals.push(LiveIntervals {
            value,
            register,
            split_parent: id,
            spilled: false,
            rematerializable: value.is_const_number() || value.is_argument(),
            used_in_monitor_operation: false,
            new_string_instance_disallowing_spilling: false,
        });
        id
    }

    /// Split off a child of `parent`'s split parent living in `register`
    pub fn split(&mut self, parent: IntervalId, register: Register) -> IntervalId {
        let id = self.next_id();
        let source = &self[parent];
        let child = LiveIntervals {
            register,
            split_parent: source.split_parent,
            spilled: false,
            ..source.clone()
        };
        self.intervals.push(child);
        id
    }

    pub fn get(&self, id: IntervalId) -> Option<&LiveIntervals> {
        self.intervals.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: IntervalId) -> Option<&mut LiveIntervals> {
        self.intervals.get_mut(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    fn next_id(&self) -> IntervalId {
        IntervalId(self.intervals.len() as u32)
    }
}

impl Index<IntervalId> for LiveIntervalsTable {
    type Output = LiveIntervals;

    fn index(&self, id: IntervalId) -> &LiveIntervals {
        match self.get(id) {
            Some(intervals) => intervals,
            None => panic!("unknown live interval {:?}", id),
        }
    }
}
