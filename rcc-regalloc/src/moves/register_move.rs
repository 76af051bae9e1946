//! A single register transfer inside a parallel move

use crate::types::{Register, ValueType};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// What to materialize when a move has no source register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MoveDefinition {
    /// Load the constant directly
    Constant { value: i64 },
    /// Copy from the register the argument arrived in
    Argument { register: Register },
}

/// `dst <- src` for one value.
///
/// Field order is the scheduling order: source, destination, type, definition.
/// Moves without a source register sort first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegisterMove {
    pub src: Option<Register>,
    pub dst: Register,
    pub ty: ValueType,
    pub definition: Option<MoveDefinition>,
}

impl RegisterMove {
    pub fn new(dst: Register, src: Register, ty: ValueType) -> Self {
        Self {
            src: Some(src),
            dst,
            ty,
            definition: None,
        }
    }

    /// A move that regenerates its value instead of copying it
    pub fn materialize(dst: Register, ty: ValueType, definition: MoveDefinition) -> Self {
        Self {
            src: None,
            dst,
            ty,
            definition: Some(definition),
        }
    }

    pub fn is_self_move(&self) -> bool {
        self.src == Some(self.dst)
    }

    /// Does executing this move overwrite `register`?
    pub fn writes(&self, register: Register) -> bool {
        if self.ty.is_wide() && self.dst + 1 == register {
            return true;
        }
        self.dst == register
    }

    /// Registers written by this move
    pub fn destination_registers(&self) -> std::ops::Range<Register> {
        self.dst..self.dst + self.ty.required_registers()
    }

    /// True when some other pending move still has to read a register this
    /// move would overwrite. Sources are looked up through `value_map`, which
    /// tracks where each original source value currently lives.
    pub fn is_blocked(
        &self,
        pending: &BTreeSet<RegisterMove>,
        value_map: &BTreeMap<Register, Register>,
    ) -> bool {
        pending
            .iter()
            .filter(|other| *other != self)
            .any(|other| match other.src {
                None => false,
                Some(src) => {
                    let current = current_location(value_map, src);
                    self.writes(current) || (other.ty.is_wide() && self.writes(current + 1))
                }
            })
    }
}

/// Current home of the value originally in `register`
pub(crate) fn current_location(value_map: &BTreeMap<Register, Register>, register: Register) -> Register {
    value_map.get(&register).copied().unwrap_or(register)
}

impl fmt::Display for RegisterMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.src, self.definition) {
            (Some(src), _) => write!(f, "r{} <- r{} ({})", self.dst, src, self.ty),
            (None, Some(MoveDefinition::Constant { value })) => {
                write!(f, "r{} <- const {} ({})", self.dst, value, self.ty)
            }
            (None, Some(MoveDefinition::Argument { register })) => {
                write!(f, "r{} <- argument r{} ({})", self.dst, register, self.ty)
            }
            (None, None) => write!(f, "r{} <- ? ({})", self.dst, self.ty),
        }
    }
}
