//! Insertion cursors
//!
//! The scheduler only ever appends at its insertion point, so it is written
//! against the small `InstructionCursor` trait. `InstructionListCursor` walks a
//! block with list-iterator semantics: the cursor sits *between* two
//! instructions, `next`/`previous` step over one, and `add` inserts at the
//! cursor and leaves it after the new instruction.

use crate::ir::Instruction;

/// Something instructions can be inserted into at a fixed point
pub trait InstructionCursor {
    fn add(&mut self, instruction: Instruction);
}

/// A plain vector is an append-only cursor
impl InstructionCursor for Vec<Instruction> {
    fn add(&mut self, instruction: Instruction) {
        self.push(instruction);
    }
}

pub struct InstructionListCursor<'a> {
    instructions: &'a mut Vec<Instruction>,
    /// Index of the instruction `next` would return
    index: usize,
}

impl<'a> InstructionListCursor<'a> {
    /// Cursor positioned before the first instruction
    pub fn new(instructions: &'a mut Vec<Instruction>) -> Self {
        Self {
            instructions,
            index: 0,
        }
    }

    pub fn has_next(&self) -> bool {
        self.index < self.instructions.len()
    }

    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    pub fn next(&mut self) -> Option<&Instruction> {
        if !self.has_next() {
            return None;
        }
        self.index += 1;
        self.instructions.get(self.index - 1)
    }

    pub fn previous(&mut self) -> Option<&Instruction> {
        if !self.has_previous() {
            return None;
        }
        self.index -= 1;
        self.instructions.get(self.index)
    }

    pub fn peek_next(&self) -> Option<&Instruction> {
        self.instructions.get(self.index)
    }

    pub fn peek_previous(&self) -> Option<&Instruction> {
        self.index
            .checked_sub(1)
            .and_then(|index| self.instructions.get(index))
    }

    /// Step forward until an instruction satisfies `predicate`.
    ///
    /// The cursor ends up right after the returned instruction, or at the end
    /// of the list when nothing matched.
    pub fn next_until<P>(&mut self, mut predicate: P) -> Option<&Instruction>
    where
        P: FnMut(&Instruction) -> bool,
    {
        while self.index < self.instructions.len() {
            let current = self.index;
            self.index += 1;
            if predicate(&self.instructions[current]) {
                return self.instructions.get(current);
            }
        }
        None
    }
}

impl InstructionCursor for InstructionListCursor<'_> {
    fn add(&mut self, instruction: Instruction) {
        self.instructions.insert(self.index, instruction);
        self.index += 1;
    }
}
