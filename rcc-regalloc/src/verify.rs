//! Checking emitted move sequences
//!
//! Runs a sequence of moves and constant loads on a symbolic register file and
//! checks that it has the effect of the requested parallel move.

use crate::ir::{Instruction, InstructionKind};
use crate::moves::{MoveDefinition, RegisterMove};
use crate::types::Register;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Symbolic content of one register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterContent {
    /// Whatever the register held before the sequence ran
    Initial(Register),
    /// One half (0 = low) of a loaded constant
    Constant { value: i64, half: u32 },
}

impl fmt::Display for RegisterContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterContent::Initial(register) => write!(f, "initial r{}", register),
            RegisterContent::Constant { value, half: 0 } => write!(f, "const {}", value),
            RegisterContent::Constant { value, half } => write!(f, "const {} (half {})", value, half),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MoveCheckError {
    #[error("Unexpected instruction in move sequence: {0}")]
    UnexpectedInstruction(String),

    #[error("r{register} holds {found} but the parallel move requires {expected}")]
    WrongValue {
        register: Register,
        expected: RegisterContent,
        found: RegisterContent,
    },
}

/// Symbolic register file
#[derive(Debug, Default)]
struct RegisterFile {
    contents: BTreeMap<Register, RegisterContent>,
}

impl RegisterFile {
    fn read(&self, register: Register) -> RegisterContent {
        self.contents
            .get(&register)
            .copied()
            .unwrap_or(RegisterContent::Initial(register))
    }

    fn execute(&mut self, instruction: &Instruction) -> Result<(), MoveCheckError> {
        match instruction.kind {
            InstructionKind::Move { dest, src, ty } => {
                // Read the whole source before writing, the spans may overlap
                let values: Vec<RegisterContent> =
                    (0..ty.required_registers()).map(|k| self.read(src + k)).collect();
                for (k, value) in (0..).zip(values) {
                    self.contents.insert(dest + k, value);
                }
                Ok(())
            }
            InstructionKind::ConstNumber { dest, value, ty } => {
                for half in 0..ty.required_registers() {
                    self.contents.insert(dest + half, RegisterContent::Constant { value, half });
                }
                Ok(())
            }
            _ => Err(MoveCheckError::UnexpectedInstruction(instruction.to_string())),
        }
    }
}

/// Verify that `emitted` realizes all of `requested` as one parallel move
pub fn check_parallel_moves(
    requested: &[RegisterMove],
    emitted: &[Instruction],
) -> Result<(), MoveCheckError> {
    let mut file = RegisterFile::default();
    for instruction in emitted {
        file.execute(instruction)?;
    }

    for mv in requested.iter().filter(|mv| !mv.is_self_move()) {
        for k in 0..mv.ty.required_registers() {
            let expected = match (mv.src, mv.definition) {
                (Some(src), _) => RegisterContent::Initial(src + k),
                (None, Some(MoveDefinition::Constant { value })) => {
                    RegisterContent::Constant { value, half: k }
                }
                (None, Some(MoveDefinition::Argument { register })) => {
                    RegisterContent::Initial(register + k)
                }
                (None, None) => continue,
            };
            let found = file.read(mv.dst + k);
            if found != expected {
                return Err(MoveCheckError::WrongValue {
                    register: mv.dst + k,
                    expected,
                    found,
                });
            }
        }
    }
    Ok(())
}
