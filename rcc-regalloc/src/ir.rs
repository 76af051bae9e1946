//! Minimal instruction model the move resolver writes into
//!
//! Original instructions carry even numbers; the odd number in front of an
//! instruction (`number - 1`) is the gap where moves for it are placed.
//! Instructions created by the resolver are unnumbered.

use crate::types::{Register, ValueType};
use rcc_common::Position;
use std::fmt;

/// Identifier of a basic block within a method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InstructionKind {
    /// Argument pseudo-instruction at the top of the entry block
    Argument { dest: Register, ty: ValueType },

    /// Load an immediate into `dest` (and `dest + 1` when wide)
    ConstNumber { dest: Register, value: i64, ty: ValueType },

    /// Register to register copy
    Move { dest: Register, src: Register, ty: ValueType },

    /// Must be the first instruction of an exception handler block
    MoveException { dest: Register },

    /// Unconditional jump
    Goto { target: BlockId },

    Return,

    /// Anything else; the resolver never looks inside
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Even instruction number, `None` for instructions inserted late
    pub number: Option<u32>,
    pub kind: InstructionKind,
    pub position: Position,
}

impl Instruction {
    pub fn new(number: u32, kind: InstructionKind, position: Position) -> Self {
        debug_assert!(number % 2 == 0, "instruction numbers are even, got {}", number);
        Self {
            number: Some(number),
            kind,
            position,
        }
    }

    /// An unnumbered instruction created by the allocator
    pub fn synthetic(kind: InstructionKind, position: Position) -> Self {
        Self {
            number: None,
            kind,
            position,
        }
    }

    pub fn is_argument(&self) -> bool {
        matches!(self.kind, InstructionKind::Argument { .. })
    }

    pub fn is_move_exception(&self) -> bool {
        matches!(self.kind, InstructionKind::MoveException { .. })
    }

    pub fn goto_target(&self) -> Option<BlockId> {
        match self.kind {
            InstructionKind::Goto { target } => Some(target),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(number) = self.number {
            write!(f, "{:4}: ", number)?;
        } else {
            write!(f, "      ")?;
        }
        match &self.kind {
            InstructionKind::Argument { dest, ty } => write!(f, "r{} <- argument ({})", dest, ty),
            InstructionKind::ConstNumber { dest, value, ty } => {
                write!(f, "r{} <- const {} ({})", dest, value, ty)
            }
            InstructionKind::Move { dest, src, ty } => write!(f, "r{} <- r{} ({})", dest, src, ty),
            InstructionKind::MoveException { dest } => write!(f, "r{} <- move-exception", dest),
            InstructionKind::Goto { target } => write!(f, "goto {}", target),
            InstructionKind::Return => write!(f, "return"),
            InstructionKind::Other(text) => write!(f, "{}", text),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    pub id: BlockId,
    pub instructions: Vec<Instruction>,
}

impl BasicBlock {
    pub fn new(id: BlockId, instructions: Vec<Instruction>) -> Self {
        Self { id, instructions }
    }

    /// First instruction of the block
    pub fn entry(&self) -> Option<&Instruction> {
        self.instructions.first()
    }

    /// Debug position of the block, taken from its first instruction
    pub fn position(&self) -> Position {
        self.entry()
            .map(|instruction| instruction.position.clone())
            .unwrap_or_default()
    }
}

/// The blocks of one method; `blocks[0]` is the entry block
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub blocks: Vec<BasicBlock>,
}

impl Method {
    pub fn new(blocks: Vec<BasicBlock>) -> Self {
        assert!(!blocks.is_empty(), "a method needs an entry block");
        Self { blocks }
    }

    pub fn entry_block(&self) -> &BasicBlock {
        &self.blocks[0]
    }

    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.iter().find(|block| block.id == id)
    }
}
