//! Spill, restore, resolution and phi moves for a whole method
//!
//! While intervals are processed the allocator records, per gap, which
//! interval has to be copied into which. `SpillMoveSet` keeps those
//! requirements and, in one final pass over the method, turns every gap's
//! moves into instructions through `RegisterMoveScheduler`.
//!
//! ## Move classes
//!
//! - in moves: spill/restore moves and entry-side resolution moves
//! - out moves: exit-side resolution moves
//! - phi moves: transfers into phi values, scheduled with the out moves
//!
//! In moves and out+phi moves at one gap form two separate parallel moves,
//! the in moves running first.

mod spill_move_set;

pub use self::spill_move_set::{SpillMove, SpillMoveKind, SpillMoveSet};
