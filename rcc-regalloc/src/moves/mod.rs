//! Parallel Move Resolution
//!
//! This module serializes a batch of simultaneous register transfers into
//! ordinary instructions.
//!
//! ## Architecture
//!
//! - `RegisterMove` - one `dst <- src` transfer, or a materialization
//! - `RegisterMoveScheduler` - orders one batch and breaks cycles
//!
//! ## Invariants
//!
//! - Each destination register is written by at most one move of a batch
//! - Wide values are always moved as a unit
//! - Temporaries are numbered upwards from the caller's first free register
//!   and are never reused within one batch

pub use self::register_move::{MoveDefinition, RegisterMove};
pub use self::scheduler::RegisterMoveScheduler;

mod register_move;
mod scheduler;
