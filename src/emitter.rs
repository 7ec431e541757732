use super::assembler::{Assembler, case_dispatch_size};
use super::buffer::{Buffer, WORD_BYTES};
use super::inst::{Inst, LabelId};
use super::label::{Label};
use super::pool::{LitPool};

//-----------------------------------------------------------------------------

/// The furthest a pool entry may sit from the earliest load that references
/// it, in slots, while no double-precision entry is pending. `LDR` reaches
/// ±4095 bytes; half of that, in words, leaves room for the loads
/// themselves to sit anywhere in the flushed region.
pub const POOL_RANGE: usize = 511;

/// The limit while a double-precision entry is pending: `VLDR` reaches only
/// ±1020 bytes.
pub const POOL_RANGE_STRICT: usize = 127;

/// Slots withheld from the limit when flushing opportunistically at a
/// non-fallthrough point, to cover operand-encoding growth of instructions
/// not yet visited.
///
/// All three constants are calibrated to A32 displacement fields; they do
/// not transfer to another target.
pub const POOL_MARGIN: usize = 64;

//-----------------------------------------------------------------------------

/// Grows `labels` as needed and returns the [`Label`] for `id`.
fn label_mut(labels: &mut Vec<Label>, id: LabelId) -> &mut Label {
    if id.0 >= labels.len() {
        labels.resize_with(id.0 + 1, Label::new);
    }
    &mut labels[id.0]
}

/// Emits one function body's [`Inst`] stream, deciding instruction by
/// instruction when to flush the pending literal pool.
///
/// The scheduler is greedy and conservative: it walks the stream once,
/// keeping a count of slots emitted since the last flush, and flushes as
/// soon as that count approaches the addressing range of the pending loads.
/// It sometimes flushes earlier than strictly necessary; it never lets a
/// load go out of range of its pool entry.
///
/// Most instruction kinds are sized by emitting them, since their final
/// size depends on operand encoding choices made during emission.
/// [`Inst::CaseJump`] is the exception: its table can by itself exceed the
/// range of already-pending loads, so it is sized structurally up front and
/// its words are only written once the flush decision for it has been
/// applied. Flushing after the table instead is exactly the failure mode
/// this ordering exists to rule out.
///
/// One `Emitter` emits one function body; no pool state survives between
/// bodies.
pub struct Emitter<B: Buffer> {
    asm: Assembler<B>,
    pool: LitPool,
    labels: Vec<Label>,
    /// Slots emitted since the last pool flush.
    distance: usize,
    /// Whether the last instruction visited falls through.
    last_fallthrough: bool,
}

impl<B: Buffer> Emitter<B> {
    /// Constructs an `Emitter` that appends to `buffer`.
    pub fn new(buffer: B) -> Self {
        Emitter {
            asm: Assembler::new(buffer),
            pool: LitPool::new(),
            labels: Vec::new(),
            distance: 0,
            last_fallthrough: true,
        }
    }

    /// The current emission position, a byte offset into the code area.
    pub fn pos(&self) -> usize { self.asm.pos() }

    /// Slots emitted since the last pool flush.
    pub fn distance(&self) -> usize { self.distance }

    /// The number of distinct literals awaiting a pool slot.
    pub fn pending_literals(&self) -> usize { self.pool.len() }

    /// Emits every instruction of `code`, in order, flushing the literal
    /// pool wherever the schedule demands it. May be called repeatedly;
    /// call [`finish()`] after the last piece.
    ///
    /// [`finish()`]: Emitter::finish
    pub fn emit(&mut self, code: &[Inst]) {
        for inst in code {
            self.visit(inst);
        }
    }

    /// Flushes any remaining pool entries, checks that every referenced
    /// label was defined, and returns the buffer.
    pub fn finish(mut self) -> B {
        if !self.pool.is_empty() {
            let skip = self.last_fallthrough;
            self.flush(skip);
        }
        for label in &self.labels {
            assert!(label.is_defined(), "a referenced label was never defined");
        }
        self.asm.into_buffer()
    }

    //-------------------------------------------------------------------------

    /// The current flush limit, in slots: the range base for the strictest
    /// pending load form, less the slots the pending entries themselves
    /// will occupy ahead of entries placed after them.
    fn limit(&self) -> usize {
        let base = if self.pool.has_float() { POOL_RANGE_STRICT } else { POOL_RANGE };
        base.saturating_sub(self.pool.pending_slots())
    }

    /// Emits `inst` and returns the number of slots it occupied.
    /// [`Inst::CaseJump`] must not be passed here: it is sized without
    /// emission, and its words are written by [`visit()`] after the flush
    /// decision.
    ///
    /// [`visit()`]: Emitter::visit
    fn emit_fused(&mut self, inst: &Inst) -> usize {
        let start = self.asm.pos();
        match *inst {
            Inst::Unary(op, dest, src) => self.asm.unary(op, dest, src),
            Inst::Binary(op, dest, src1, src2) => self.asm.binary(op, dest, src1, src2),
            Inst::Const(dest, imm) => self.asm.const_(&mut self.pool, dest, imm),
            Inst::ConstF(dest, imm) => self.asm.const_f(&mut self.pool, dest, imm),
            Inst::Mem(op, data, base, offset) => self.asm.mem(op, data, base, offset),
            Inst::Cmp(src1, src2) => self.asm.cmp(src1, src2),
            Inst::Define(id) => self.asm.define(label_mut(&mut self.labels, id)),
            Inst::JumpIf(cond, id) => self.asm.jump_if(cond, label_mut(&mut self.labels, id)),
            Inst::Jump(id) => self.asm.jump(label_mut(&mut self.labels, id)),
            Inst::Call(id) => self.asm.call(label_mut(&mut self.labels, id)),
            Inst::Ret => self.asm.ret(),
            Inst::CaseJump(..) => panic!("case dispatch is sized before emission"),
        }
        (self.asm.pos() - start) / WORD_BYTES
    }

    /// Schedules and emits one instruction.
    fn visit(&mut self, inst: &Inst) {
        // Size first. Ordinary kinds are emitted as a side effect of
        // sizing; the case dispatch is only measured, and its words are
        // withheld until the flush decision below has been applied.
        let size = match inst {
            Inst::CaseJump(_, targets) => case_dispatch_size(targets.len()),
            _ => self.emit_fused(inst),
        };
        self.distance += size;
        let limit = self.limit();
        // The case dispatch must count as falling through: its words are
        // not yet written, and a pool flushed here would land in the middle
        // of its table.
        let fallthrough = match inst {
            Inst::CaseJump(..) => true,
            _ => inst.has_fallthrough(),
        };
        if !fallthrough && self.distance + POOL_MARGIN >= limit {
            self.flush(false);
        } else if !self.pool.is_empty() && self.distance >= limit {
            self.flush(true);
        }
        if let Inst::CaseJump(index, targets) = inst {
            self.asm.case_dispatch(*index);
            for &target in targets {
                self.asm.case_target(label_mut(&mut self.labels, target));
            }
        }
        self.last_fallthrough = inst.has_fallthrough();
    }

    /// Emits every pending pool entry, in first-reference order, patching
    /// the loads that await each one. If `skip` is true the pool is placed
    /// behind an unconditional branch, leaving control flow undisturbed;
    /// pass `skip = false` only where execution cannot reach the pool.
    fn flush(&mut self, skip: bool) {
        if !self.pool.is_empty() {
            let mut around = Label::new();
            if skip {
                self.asm.jump(&mut around);
            }
            for (lit, sites) in self.pool.take() {
                let entry = self.asm.pos();
                self.asm.lit_word(lit);
                for at in sites {
                    self.asm.patch_lit_load(at, entry);
                }
            }
            if skip {
                self.asm.define(&mut around);
            }
        }
        // The flush point is the new origin for pending-load distances.
        self.distance = 0;
    }
}

//-----------------------------------------------------------------------------
