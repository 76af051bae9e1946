//! Ripple C99 Compiler - Register Allocation Move Resolution
//!
//! After linear scan has assigned registers, values that were split, spilled
//! or flow into phis still have to be copied between registers. This crate
//! records those copies per gap and lowers each gap's set of copies, which
//! must behave as one simultaneous parallel move, into ordinary moves and
//! constant loads.
//!
//! - `moves`: parallel move scheduling for one gap
//! - `spill`: per-method bookkeeping and insertion of all gaps' moves
//! - `positions`: register position tables consulted while choosing registers

pub mod config;
pub mod cursor;
pub mod intervals;
pub mod ir;
pub mod moves;
pub mod positions;
pub mod spill;
pub mod types;
pub mod verify;

pub use config::{RegisterFrame, ResolverOptions};
pub use cursor::{InstructionCursor, InstructionListCursor};
pub use intervals::{IntervalId, LiveIntervals, LiveIntervalsTable, Value, ValueDefinition};
pub use ir::{BasicBlock, BlockId, Instruction, InstructionKind, Method};
pub use moves::{MoveDefinition, RegisterMove, RegisterMoveScheduler};
pub use positions::{
    RegisterKind, RegisterPositions, RegisterPositionsTable,
    RegisterPositionsWithExtraBlockedRegisters, UNUSED,
};
pub use spill::{SpillMove, SpillMoveKind, SpillMoveSet};
pub use types::{Register, ValueType};
pub use verify::{check_parallel_moves, MoveCheckError, RegisterContent};
