//! Parallel move scheduling
//!
//! All moves handed to one scheduler happen "at the same time": every source
//! is read before any destination is written. The scheduler turns that into a
//! sequence of ordinary moves, emitting a move as soon as nothing pending
//! still needs the registers it overwrites, and breaking cycles by parking
//! values in fresh temporary registers.

use super::register_move::{current_location, MoveDefinition, RegisterMove};
use crate::cursor::InstructionCursor;
use crate::ir::{Instruction, InstructionKind};
use crate::types::{Register, ValueType};
use log::{debug, trace};
use rcc_common::Position;
use smallvec::SmallVec;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

pub struct RegisterMoveScheduler<'a, C: InstructionCursor + ?Sized> {
    /// Moves not yet emitted, kept in a stable order so output is deterministic
    move_set: BTreeSet<RegisterMove>,

    /// Where each original source value lives right now. Starts as identity
    /// and is rewritten as values get copied around.
    value_map: BTreeMap<Register, Register>,

    /// Temporaries handed out so far
    used_temp_registers: u32,

    /// Where the generated instructions go
    insert_at: &'a mut C,

    /// Debug position given to every generated instruction
    position: Position,

    /// First register free for temporaries
    temp_register: Register,
}

impl<'a, C: InstructionCursor + ?Sized> RegisterMoveScheduler<'a, C> {
    pub fn new(insert_at: &'a mut C, temp_register: Register) -> Self {
        Self::with_position(insert_at, temp_register, Position::None)
    }

    pub fn with_position(insert_at: &'a mut C, temp_register: Register, position: Position) -> Self {
        Self {
            move_set: BTreeSet::new(),
            value_map: BTreeMap::new(),
            used_temp_registers: 0,
            insert_at,
            position,
            temp_register,
        }
    }

    pub fn add_move(&mut self, mv: RegisterMove) {
        // A self-move would only ever show up as a spurious cycle participant
        if mv.is_self_move() {
            trace!("Dropping self-move {}", mv);
            return;
        }
        debug_assert!(
            mv.src.is_some() || mv.definition.is_some(),
            "move {} has neither a source nor a definition",
            mv
        );
        if let Some(src) = mv.src {
            self.value_map.insert(src, src);
        }
        self.value_map.insert(mv.dst, mv.dst);
        self.move_set.insert(mv);
    }

    /// Number of temporary registers consumed by `schedule`
    pub fn used_temp_registers(&self) -> u32 {
        self.used_temp_registers
    }

    pub fn schedule(&mut self) {
        self.assert_every_destination_written_once();
        debug!(
            "Scheduling {} parallel moves, temporaries from r{}",
            self.move_set.len(),
            self.temp_register
        );

        let mut worklist: VecDeque<RegisterMove> = VecDeque::new();
        self.take_unblocked_moves(&mut worklist);

        while !worklist.is_empty() || !self.move_set.is_empty() {
            while let Some(mv) = worklist.pop_front() {
                debug_assert!(!mv.is_blocked(&self.move_set, &self.value_map));
                let generated_dest = self.create_move(&mv);
                // The source value is now also available in the destination
                if let Some(src) = mv.src {
                    self.value_map.insert(src, generated_dest);
                }
                self.take_unblocked_moves(&mut worklist);
            }
            if !self.move_set.is_empty() {
                // Everything left is part of a cycle
                let mv = self.pick_move_to_unblock();
                self.create_move_dest_to_temp(&mv);
                worklist.push_back(mv);
            }
        }

        if self.used_temp_registers > 0 {
            debug!("Parallel move needed {} temporary registers", self.used_temp_registers);
        }
    }

    fn assert_every_destination_written_once(&self) {
        let mut written = BTreeSet::new();
        for mv in &self.move_set {
            for register in mv.destination_registers() {
                assert!(
                    written.insert(register),
                    "register r{} is written by more than one move ({})",
                    register,
                    mv
                );
            }
        }
    }

    /// Move every currently unblocked move from the move set to the worklist
    fn take_unblocked_moves(&mut self, worklist: &mut VecDeque<RegisterMove>) {
        let candidates: Vec<RegisterMove> = self.move_set.iter().copied().collect();
        for mv in candidates {
            if !mv.is_blocked(&self.move_set, &self.value_map) {
                self.move_set.remove(&mv);
                worklist.push_back(mv);
            }
        }
    }

    /// Prefer the single-width move with the lowest destination, so the
    /// cycle costs one temporary instead of two
    fn pick_move_to_unblock(&mut self) -> RegisterMove {
        let picked = self
            .move_set
            .iter()
            .filter(|mv| !mv.ty.is_wide())
            .min_by_key(|mv| mv.dst)
            .or_else(|| self.move_set.iter().next_back())
            .copied()
            .expect("pick_move_to_unblock called with no pending moves");
        self.move_set.remove(&picked);
        trace!("Breaking cycle at {}", picked);
        picked
    }

    /// Pending moves whose current source overlaps the `ty`-wide span at `register`
    fn find_moves_with_src(&self, register: Register, ty: ValueType) -> SmallVec<[RegisterMove; 2]> {
        self.move_set
            .iter()
            .filter(|mv| match mv.src {
                None => false,
                Some(src) => {
                    let current = current_location(&self.value_map, src);
                    current == register
                        || (mv.ty.is_wide() && current + 1 == register)
                        || (ty.is_wide() && current == register + 1)
                }
            })
            .copied()
            .collect()
    }

    fn create_move(&mut self, mv: &RegisterMove) -> Register {
        let kind = match (mv.definition, mv.src) {
            (Some(MoveDefinition::Constant { value }), _) => InstructionKind::ConstNumber {
                dest: mv.dst,
                value,
                ty: mv.ty,
            },
            (Some(MoveDefinition::Argument { register }), _) => InstructionKind::Move {
                dest: mv.dst,
                src: register,
                ty: mv.ty,
            },
            (None, Some(src)) => InstructionKind::Move {
                dest: mv.dst,
                src: current_location(&self.value_map, src),
                ty: mv.ty,
            },
            (None, None) => panic!("cannot schedule move {} without a source", mv),
        };
        self.emit(kind);
        mv.dst
    }

    /// Copy every value `mv` is about to overwrite into fresh temporaries.
    ///
    /// With wide values in play this can take more than one copy.
    fn create_move_dest_to_temp(&mut self, mv: &RegisterMove) {
        let moves_with_src = self.find_moves_with_src(mv.dst, mv.ty);
        assert!(!moves_with_src.is_empty(), "move {} picked to unblock is not blocked", mv);
        for blocked in moves_with_src {
            let Some(src) = blocked.src else { continue };
            let temp = self.temp_register + self.used_temp_registers;
            let from = current_location(&self.value_map, src);
            debug!("Parking r{} in temporary r{} to unblock {}", from, temp, mv);
            self.emit(InstructionKind::Move {
                dest: temp,
                src: from,
                ty: blocked.ty,
            });
            self.value_map.insert(src, temp);
            self.used_temp_registers += blocked.ty.required_registers();
        }
    }

    fn emit(&mut self, kind: InstructionKind) {
        let instruction = Instruction::synthetic(kind, self.position.clone());
        trace!("  emit {}", instruction);
        self.insert_at.add(instruction);
    }
}
