use crate::config::{RegisterFrame, ResolverOptions};
use crate::cursor::InstructionListCursor;
use crate::intervals::{IntervalId, LiveIntervals, LiveIntervalsTable, ValueDefinition};
use crate::ir::{BlockId, Instruction, Method};
use crate::moves::{MoveDefinition, RegisterMove, RegisterMoveScheduler};
use crate::types::{Register, ValueType};
use log::{debug, trace};
use rcc_common::Position;
use std::collections::BTreeMap;

/// Constant loads can only target registers below this
const CONST_DESTINATION_LIMIT: Register = 256;

/// Which parallel move a spill move belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpillMoveKind {
    In,
    Out,
    Phi,
}

/// Copy the value of `from` into the register of `to`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpillMove {
    pub ty: ValueType,
    pub to: IntervalId,
    pub from: IntervalId,
}

impl SpillMove {
    /// Two spill moves are the same move when they copy between the same registers
    fn is_same_move(&self, other: &SpillMove, intervals: &LiveIntervalsTable) -> bool {
        self.ty == other.ty
            && intervals[self.from].register() == intervals[other.from].register()
            && intervals[self.to].register() == intervals[other.to].register()
    }
}

/// Pending moves of one gap, each list in insertion order without duplicates
#[derive(Debug, Default)]
struct GapMoves {
    in_moves: Vec<SpillMove>,
    out_moves: Vec<SpillMove>,
    phi_moves: Vec<SpillMove>,
}

impl GapMoves {
    fn moves_mut(&mut self, kind: SpillMoveKind) -> &mut Vec<SpillMove> {
        match kind {
            SpillMoveKind::In => &mut self.in_moves,
            SpillMoveKind::Out => &mut self.out_moves,
            SpillMoveKind::Phi => &mut self.phi_moves,
        }
    }
}

/// Add `mv` to `moves` unless an equal move is already there
fn insert_move(moves: &mut Vec<SpillMove>, mv: SpillMove, intervals: &LiveIntervalsTable) {
    if !moves.iter().any(|other| other.is_same_move(&mv, intervals)) {
        moves.push(mv);
    }
}

pub struct SpillMoveSet<'a> {
    intervals: &'a LiveIntervalsTable,
    frame: RegisterFrame,
    options: ResolverOptions,

    /// Number of the first instruction of each block
    block_starts: BTreeMap<u32, BlockId>,

    /// Pending moves by gap
    moves: BTreeMap<u32, GapMoves>,

    /// Most temporaries any single parallel move needed
    used_temp_registers: u32,
}

impl<'a> SpillMoveSet<'a> {
    pub fn new(
        intervals: &'a LiveIntervalsTable,
        method: &Method,
        frame: RegisterFrame,
        options: ResolverOptions,
    ) -> Self {
        let block_starts = method
            .blocks
            .iter()
            .filter_map(|block| block.entry().and_then(|entry| entry.number).map(|n| (n, block.id)))
            .collect();
        Self {
            intervals,
            frame,
            options,
            block_starts,
            moves: BTreeMap::new(),
            used_temp_registers: 0,
        }
    }

    /// Add a spill or restore move between two parts of a split interval.
    ///
    /// Moves at the very start of a block are left to resolution, which
    /// handles each incoming edge separately.
    pub fn add_spill_or_restore_move(&mut self, gap: u32, to: IntervalId, from: IntervalId) {
        assert_odd_gap(gap);
        self.assert_same_split_parent(to, from);
        if let Some(block) = self.block_starts.get(&(gap + 1)) {
            trace!("Skipping spill move at gap {}, {} starts there", gap, block);
            return;
        }
        self.add_move(SpillMoveKind::In, gap, to, from);
    }

    /// Add a move that reconciles a split value's register on entry to a block
    pub fn add_in_resolution_move(&mut self, gap: u32, to: IntervalId, from: IntervalId) {
        self.assert_same_split_parent(to, from);
        self.add_move(SpillMoveKind::In, gap, to, from);
    }

    /// Add a move that reconciles a split value's register on exit from a block
    pub fn add_out_resolution_move(&mut self, gap: u32, to: IntervalId, from: IntervalId) {
        self.assert_same_split_parent(to, from);
        self.add_move(SpillMoveKind::Out, gap, to, from);
    }

    /// Add a move from an incoming value to the phi it flows into
    pub fn add_phi_move(&mut self, gap: u32, to: IntervalId, from: IntervalId) {
        self.add_move(SpillMoveKind::Phi, gap, to, from);
    }

    fn add_move(&mut self, kind: SpillMoveKind, gap: u32, to: IntervalId, from: IntervalId) {
        assert_odd_gap(gap);
        let mv = SpillMove {
            ty: self.move_type_for_intervals(to, from),
            to,
            from,
        };
        trace!(
            "{:?} move at gap {}: r{} <- r{} ({})",
            kind,
            gap,
            self.intervals[to].register(),
            self.intervals[from].register(),
            mv.ty
        );
        let intervals = self.intervals;
        insert_move(self.moves.entry(gap).or_default().moves_mut(kind), mv, intervals);
    }

    fn move_type_for_intervals(&self, to: IntervalId, from: IntervalId) -> ValueType {
        let to_type = self.intervals[to].ty();
        let from_type = self.intervals[from].ty();
        if to_type.is_reference() || from_type.is_reference() {
            debug_assert!(from_type.is_reference() || from_type.is_single_primitive());
            debug_assert!(to_type.is_reference() || to_type.is_single_primitive());
            return ValueType::Object;
        }
        debug_assert_eq!(to_type, from_type, "move between values of different types");
        to_type
    }

    fn assert_same_split_parent(&self, to: IntervalId, from: IntervalId) {
        assert_eq!(
            self.intervals[to].split_parent(),
            self.intervals[from].split_parent(),
            "spill and resolution moves must stay within one split interval"
        );
    }

    fn has_moves_at(&self, number: u32) -> bool {
        number
            .checked_sub(1)
            .map_or(false, |gap| self.moves.contains_key(&gap))
    }

    fn needs_moves_before_instruction(&self, instruction: &Instruction) -> bool {
        instruction.number.map_or(false, |number| self.has_moves_at(number))
    }

    /// Schedule all recorded moves and insert them into `method`.
    ///
    /// Temporaries are numbered from `temp_register`. Returns the largest
    /// number of temporaries any single parallel move needed.
    pub fn schedule_and_insert_moves(mut self, method: &mut Method, temp_register: Register) -> u32 {
        // Jump targets are looked up before any block is modified
        let block_positions: BTreeMap<BlockId, Position> = method
            .blocks
            .iter()
            .map(|block| (block.id, block.position()))
            .collect();
        let entry = method.entry_block().id;

        for block in method.blocks.iter_mut() {
            let block_id = block.id;
            let mut insert_at = InstructionListCursor::new(&mut block.instructions);

            if block_id == entry {
                // Moves for the arguments go after the last argument
                let mut argument_numbers = Vec::new();
                while let Some(instruction) = insert_at.peek_next() {
                    if !instruction.is_argument() {
                        break;
                    }
                    argument_numbers.extend(instruction.number);
                    insert_at.next();
                }
                for number in argument_numbers {
                    if self.has_moves_at(number) {
                        self.schedule_moves_before_instruction(
                            temp_register,
                            number,
                            true,
                            &mut insert_at,
                            &block_positions,
                        );
                    }
                }
            }

            loop {
                let found = insert_at
                    .next_until(|instruction| self.needs_moves_before_instruction(instruction))
                    .map(|instruction| (instruction.number, instruction.is_move_exception()));
                let Some((Some(number), is_move_exception)) = found else {
                    break;
                };
                // A move-exception has to stay first, its moves go after it
                if !is_move_exception {
                    insert_at.previous();
                }
                self.schedule_moves_before_instruction(
                    temp_register,
                    number,
                    false,
                    &mut insert_at,
                    &block_positions,
                );
            }
        }

        assert!(
            self.moves.is_empty(),
            "pending moves at gaps {:?} have no instruction after them",
            self.moves.keys().collect::<Vec<_>>()
        );
        debug!("Move resolution used {} temporary registers", self.used_temp_registers);
        self.used_temp_registers
    }

    fn schedule_moves_before_instruction(
        &mut self,
        temp_register: Register,
        number: u32,
        is_argument: bool,
        insert_at: &mut InstructionListCursor<'_>,
        block_positions: &BTreeMap<BlockId, Position>,
    ) {
        debug_assert!(self.has_moves_at(number));

        let position = match insert_at.peek_previous() {
            Some(previous) if previous.is_move_exception() => previous.position.clone(),
            _ => match insert_at.peek_next() {
                Some(next) => {
                    debug_assert!(next.number == Some(number) || is_argument);
                    match next.goto_target() {
                        Some(target) if next.position.is_none() => {
                            block_positions.get(&target).cloned().unwrap_or_default()
                        }
                        _ => next.position.clone(),
                    }
                }
                None => Position::None,
            },
        };

        let gap = number - 1;
        let GapMoves {
            mut in_moves,
            mut out_moves,
            phi_moves,
        } = self.moves.remove(&gap).unwrap_or_default();

        self.remove_argument_restores(&mut in_moves);
        self.remove_argument_restores(&mut out_moves);

        self.prune_parallel_move_sets(&mut in_moves, &mut out_moves, &phi_moves);

        // Phi moves run with the out moves at the end of the predecessor
        for phi in phi_moves {
            insert_move(&mut out_moves, phi, self.intervals);
        }

        debug!(
            "Gap {}: {} in moves, {} out/phi moves at {}",
            gap,
            in_moves.len(),
            out_moves.len(),
            position
        );
        self.schedule_moves(temp_register, &in_moves, insert_at, &position);
        self.schedule_moves(temp_register, &out_moves, insert_at, &position);

        debug_assert!(!self.has_moves_at(number));
    }

    /// Drop moves that restore an argument into its original register.
    ///
    /// Argument registers are never reused for an argument's value, so the
    /// register still holds the argument. Writing it again would also lose the
    /// argument's type on the runtime's verifier. The register number alone is
    /// not enough: argument registers can hold other values where the
    /// argument is dead.
    fn remove_argument_restores(&self, moves: &mut Vec<SpillMove>) {
        let intervals = self.intervals;
        let frame = self.frame;
        moves.retain(|mv| {
            let to = &intervals[mv.to];
            let restore = frame.is_argument_register(to.register()) && to.is_argument_interval();
            if restore {
                debug!(
                    "Dropping argument restore r{} <- r{}",
                    to.register(),
                    intervals[mv.from].register()
                );
            }
            !restore
        });
    }

    /// Does `candidate` overwrite any register `mv` reads?
    fn writes_source_register(&self, candidate: &SpillMove, mv: &SpillMove) -> bool {
        let src = self.intervals[mv.from].register();
        let dst = self.intervals[candidate.to].register();
        dst < src + mv.ty.required_registers() && src < dst + candidate.ty.required_registers()
    }

    /// Shortcut chains through the in moves.
    ///
    /// ```text
    /// r1 <- r0 (in)
    /// r2 <- r1 (out)
    /// ```
    ///
    /// becomes the single out move `r2 <- r0`. This is only valid when no
    /// other in move overwrites r0 and no phi move reads r1; otherwise both
    /// moves stay and the in moves are resolved as a parallel move.
    fn prune_parallel_move_sets(
        &self,
        in_moves: &mut Vec<SpillMove>,
        out_moves: &mut [SpillMove],
        phi_moves: &[SpillMove],
    ) {
        let mut index = 0;
        while index < in_moves.len() {
            let in_move = in_moves[index];
            let out_move = out_moves.iter().position(|out| out.from == in_move.to);
            let blocking_in_move = in_moves
                .iter()
                .any(|other| self.writes_source_register(other, &in_move));
            let blocking_phi_move = phi_moves.iter().any(|phi| phi.from == in_move.to);

            match out_move {
                Some(out) if !blocking_in_move && !blocking_phi_move => {
                    debug!(
                        "Shortcut r{} <- r{} <- r{}",
                        self.intervals[out_moves[out].to].register(),
                        self.intervals[in_move.to].register(),
                        self.intervals[in_move.from].register()
                    );
                    out_moves[out].from = in_move.from;
                    in_moves.remove(index);
                }
                _ => index += 1,
            }
        }
    }

    fn schedule_moves(
        &mut self,
        temp_register: Register,
        moves: &[SpillMove],
        insert_at: &mut InstructionListCursor<'_>,
        position: &Position,
    ) {
        if moves.is_empty() {
            return;
        }
        let intervals = self.intervals;
        let mut scheduler = RegisterMoveScheduler::with_position(insert_at, temp_register, position.clone());
        for mv in moves {
            let to = &intervals[mv.to];
            let from = &intervals[mv.from];

            // The value is regenerated wherever it is needed
            if to.is_spilled_and_rematerializable() {
                trace!("No spill needed for rematerializable r{}", from.register());
                continue;
            }

            if from.is_spilled_and_rematerializable() {
                debug_assert!(self.frame.unadjusted_real_register(to.register()) < CONST_DESTINATION_LIMIT);
                match from.value().definition {
                    ValueDefinition::ConstNumber(value) => {
                        scheduler.add_move(RegisterMove::materialize(
                            to.register(),
                            mv.ty,
                            MoveDefinition::Constant { value },
                        ));
                        continue;
                    }
                    // An argument is copied from its register so that the
                    // scheduler sees the register as read and keeps it intact
                    ValueDefinition::Argument => {}
                    ValueDefinition::Other => {
                        panic!("rematerializable value in r{} has no constant or argument definition", from.register())
                    }
                }
            }

            if to.register() != from.register() {
                scheduler.add_move(self.register_move_for(mv.ty, to, from));
            }
        }
        scheduler.schedule();
        self.used_temp_registers = self.used_temp_registers.max(scheduler.used_temp_registers());
    }

    fn register_move_for(&self, ty: ValueType, to: &LiveIntervals, from: &LiveIntervals) -> RegisterMove {
        // Runtimes with the bounds-check elimination bug can lose an index
        // defined by a move; a const instruction keeps it defined.
        if self.options.can_have_bounds_check_elimination_bug
            && ty.is_single_primitive()
            && self.frame.unadjusted_real_register(to.register()) < CONST_DESTINATION_LIMIT
        {
            if let ValueDefinition::ConstNumber(value) = from.value().definition {
                return RegisterMove::materialize(to.register(), ty, MoveDefinition::Constant { value });
            }
        }
        RegisterMove::new(to.register(), from.register(), ty)
    }
}

fn assert_odd_gap(gap: u32) {
    assert!(gap % 2 == 1, "moves are inserted at odd gaps, got {}", gap);
}
