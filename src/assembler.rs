use super::{label};
use super::buffer::{Buffer, WORD_BYTES};
use super::enums::{Register, FRegister, Condition, UnaryOp, BinaryOp, MemOp};
use super::label::{Patch, PatchKind, Label};
use super::pool::{Lit, LitPool};

use Register::{RPC};

//-----------------------------------------------------------------------------

/// Computes the displacement from `from` to `to`.
pub fn disp(from: usize, to: usize) -> i64 {
    if from > i64::MAX as usize || to > i64::MAX as usize {
        panic!("Displacements greater than i64::MAX are not supported");
    }
    (to as i64) - (from as i64)
}

/// Returns a bitmask representing `x` as a `bits`-bit signed integer.
fn signed(x: i64, bits: usize) -> Option<u32> {
    let limit: i64 = 1 << (bits - 1);
    if x >= limit || x < -limit {
        None
    } else {
        Some((x & (2*limit - 1)) as u32)
    }
}

/// An A32 instruction at `at` sees `RPC` as `at + 8`.
pub const PC_AHEAD: usize = 8;

/// Encodes `imm` as an A32 rotated immediate (an 8-bit value rotated right
/// by an even amount), if possible.
pub fn rotated_immediate(imm: u32) -> Option<u32> {
    for rot in 0..16 {
        let value = imm.rotate_left(rot * 2);
        if value < 0x100 {
            return Some((rot << 8) | value);
        }
    }
    None
}

/// Splits `imm` into two rotated immediates, for a `MOV` + `ORR` pair.
/// Only useful when `rotated_immediate(imm)` has already failed.
fn split_immediate(imm: u32) -> Option<(u32, u32)> {
    let align = (imm.trailing_zeros() & !1).min(24);
    let low = imm & (0xFF << align);
    let high = imm & !(0xFF << align);
    if high == 0 {
        return None;
    }
    match (rotated_immediate(low), rotated_immediate(high)) {
        (Some(l), Some(h)) => Some((l, h)),
        _ => None,
    }
}

/// Computes the imm24 field of a branch at `at` targeting `to`. Returns
/// `None` if the displacement is not encodable.
fn branch_offset(at: usize, to: usize) -> Option<u32> {
    let offset = disp(at + PC_AHEAD, to);
    assert_eq!(offset & 3, 0);
    signed(offset >> 2, 24)
}

/// The slot count of a [`case_dispatch()`] with `targets` table entries,
/// computed without emitting anything: the dispatch instruction, the word
/// skipped by the `RPC` read-ahead, and one word per target.
///
/// This is the one instruction kind whose size is knowable in advance and
/// purely structural; every other kind is sized by emitting it. A new kind
/// whose size can likewise exceed the pool addressing range must get the
/// same two-phase treatment explicitly.
///
/// [`case_dispatch()`]: Assembler::case_dispatch
pub fn case_dispatch_size(targets: usize) -> usize {
    2 + targets
}

//-----------------------------------------------------------------------------

/// The fixed `AL` condition field.
const AL: u32 = 0xE000_0000;

/// The `I` bit: operand 2 is a rotated immediate.
const IMMEDIATE: u32 = 1 << 25;

/// `MOV R0, R0`, used for the dead word of a case dispatch.
const NOP: u32 = 0xE1A0_0000;

/// An assembler for the subset of A32 that [`Inst`] needs, writing one
/// 4-byte code word per instruction into a [`Buffer`].
///
/// All addresses are byte offsets into the emitted code area; values that
/// end up in dispatch tables must be relocated by whoever loads the code.
/// Methods that materialize a wide constant do not place it: they emit a
/// pc-relative load with a zero displacement and record the load site in
/// the given [`LitPool`]. The displacement is filled in by
/// [`patch_lit_load()`] when the [`Emitter`] flushes the pool; a pool
/// scheduled out of range of one of its loads is a bug in the scheduler and
/// panics there.
///
/// [`Inst`]: super::Inst
/// [`Emitter`]: super::Emitter
/// [`patch_lit_load()`]: Assembler::patch_lit_load
pub struct Assembler<B: Buffer> {
    /// The memory we're filling with code and literal pools.
    buffer: B,
}

impl<B: Buffer> Assembler<B> {
    /// Constructs an Assembler that appends to `buffer`.
    pub fn new(buffer: B) -> Self {
        Assembler {buffer}
    }

    /// Get the assembly pointer, a byte offset into the code area.
    pub fn pos(&self) -> usize { self.buffer.get_pos() }

    /// Applies `callback` to the contained [`Buffer`].
    pub fn use_buffer<T>(&mut self, callback: impl FnOnce(&mut B) -> T) -> T {
        callback(&mut self.buffer)
    }

    /// Returns the contained [`Buffer`].
    pub fn into_buffer(self) -> B { self.buffer }

    /// Writes a 32-bit instruction.
    fn write(&mut self, opcode: u32) {
        self.buffer.write_word(opcode);
    }

    //-------------------------------------------------------------------------

    /// Rewrites the code word at `patch` to refer to `target`.
    pub fn patch(&mut self, patch: Patch, target: usize) {
        let at = patch.address();
        match patch.kind() {
            PatchKind::Branch24 => {
                let old = self.buffer.read_word(at);
                let offset = branch_offset(at, target).expect("Cannot branch so far");
                self.buffer.patch_word(at, (old & 0xFF00_0000) | offset);
            },
            PatchKind::Word32 => {
                self.buffer.patch_word(at, target as u32);
            },
        }
    }

    /// Writes a word that refers to `label`: immediately patched if the
    /// label is defined, otherwise recorded on the label.
    fn write_ref(&mut self, opcode: u32, kind: PatchKind, label: &mut Label) {
        let patch = Patch::new(kind, self.pos());
        self.write(opcode);
        match label.target() {
            Some(target) => self.patch(patch, target),
            None => label.push(patch),
        }
    }

    /// Sets the target of `label` to the current position, and rewrites all
    /// the words that refer to it. `label` must not already be defined.
    pub fn define(&mut self, label: &mut Label) {
        let target = self.pos();
        label::define(label, target);
        let patches: Vec<Patch> = label.drain().collect();
        for patch in patches {
            self.patch(patch, target);
        }
    }

    //-------------------------------------------------------------------------

    /// Assembles `dest <- op(src)`.
    pub fn unary(&mut self, op: UnaryOp, dest: Register, src: Register) {
        self.write(AL | ((op as u32) << 21) | ((dest as u32) << 12) | (src as u32));
    }

    /// Assembles `dest <- op(src1, src2)`.
    pub fn binary(&mut self, op: BinaryOp, dest: Register, src1: Register, src2: Register) {
        let mut opcode = AL | ((op as u32) << 21);
        opcode |= (src1 as u32) << 16;
        opcode |= (dest as u32) << 12;
        opcode |= src2 as u32;
        self.write(opcode);
    }

    /// Assembles a flag-setting comparison of `src1` and `src2`.
    pub fn cmp(&mut self, src1: Register, src2: Register) {
        // CMP is opcode 0xA with the S bit.
        self.write(AL | (0xA << 21) | (1 << 20) | ((src1 as u32) << 16) | (src2 as u32));
    }

    /// Assembles a load or store of `data` at `base` plus `offset` bytes.
    /// `base` must not be `RPC`; pc-relative loads are reserved for pool
    /// entries. This method will panic if the offset needs more than 12
    /// bits.
    pub fn mem(&mut self, op: MemOp, data: Register, base: Register, offset: i32) {
        assert_ne!(base, RPC);
        let magnitude = offset.unsigned_abs();
        assert!(magnitude < 0x1000);
        let mut opcode = AL | (1 << 26) | (1 << 24);
        if offset >= 0 {
            opcode |= 1 << 23;
        }
        if (op as u32) & 2 != 0 {
            opcode |= 1 << 22;
        }
        if (op as u32) & 1 != 0 {
            opcode |= 1 << 20;
        }
        opcode |= (base as u32) << 16;
        opcode |= (data as u32) << 12;
        self.write(opcode | magnitude);
    }

    //-------------------------------------------------------------------------

    /// Assembles instructions to put `imm` in `dest`: a single `MOV` or
    /// `MVN` when `imm` is a rotated immediate (or the complement of one), a
    /// `MOV` + `ORR` pair when it splits into two, and otherwise a
    /// pc-relative load of a pool entry, recorded in `pool`.
    pub fn const_(&mut self, pool: &mut LitPool, dest: Register, imm: u32) {
        assert_ne!(dest, RPC);
        if let Some(encoding) = rotated_immediate(imm) {
            self.write(AL | IMMEDIATE | ((UnaryOp::MOV as u32) << 21) | ((dest as u32) << 12) | encoding);
        } else if let Some(encoding) = rotated_immediate(!imm) {
            self.write(AL | IMMEDIATE | ((UnaryOp::MVN as u32) << 21) | ((dest as u32) << 12) | encoding);
        } else if let Some((low, high)) = split_immediate(imm) {
            self.write(AL | IMMEDIATE | ((UnaryOp::MOV as u32) << 21) | ((dest as u32) << 12) | low);
            let mut opcode = AL | IMMEDIATE | ((BinaryOp::ORR as u32) << 21);
            opcode |= (dest as u32) << 16;
            opcode |= (dest as u32) << 12;
            self.write(opcode | high);
        } else {
            // LDR dest, [pc, #0]; the displacement is patched at flush time.
            pool.intern(Lit::Word(imm), self.pos());
            self.write(0xE59F_0000 | ((dest as u32) << 12));
        }
    }

    /// Assembles a pc-relative `VLDR` of `imm` into `dest`, recording the
    /// pool entry in `pool`. `VLDR` has the strict displacement range;
    /// interning a double tightens the [`Emitter`]'s flush limit.
    ///
    /// [`Emitter`]: super::Emitter
    pub fn const_f(&mut self, pool: &mut LitPool, dest: FRegister, imm: f64) {
        // VLDR dest, [pc, #0]; the displacement is patched at flush time.
        pool.intern(Lit::Double(imm.to_bits()), self.pos());
        self.write(0xED9F_0B00 | ((dest as u32) << 12));
    }

    /// Writes the pool entry for `lit` at the current position.
    pub fn lit_word(&mut self, lit: Lit) {
        match lit {
            Lit::Word(word) => self.write(word),
            Lit::Double(bits) => {
                self.write(bits as u32);
                self.write((bits >> 32) as u32);
            },
        }
    }

    /// Rewrites the displacement of the pc-relative load at `at` to address
    /// the pool entry placed at `entry`. Panics if the word at `at` is not a
    /// pc-relative load, or if the entry is out of the load's range: the
    /// [`Emitter`] must flush often enough that the latter cannot happen.
    ///
    /// [`Emitter`]: super::Emitter
    pub fn patch_lit_load(&mut self, at: usize, entry: usize) {
        let old = self.buffer.read_word(at);
        let offset = disp(at + PC_AHEAD, entry);
        let (add, magnitude) = if offset >= 0 {
            (1 << 23, offset as u32)
        } else {
            (0, (-offset) as u32)
        };
        let new = if old & 0x0F7F_0000 == 0x051F_0000 {
            // LDR rd, [pc, ±#imm12].
            assert!(magnitude < 0x1000, "pool entry out of range of its load");
            (old & !0x0080_0FFF) | add | magnitude
        } else if old & 0x0F7F_0F00 == 0x0D1F_0B00 {
            // VLDR dd, [pc, ±#imm8*4].
            assert_eq!(offset & 3, 0);
            assert!(magnitude <= 1020, "pool entry out of range of its load");
            (old & !0x0080_00FF) | add | (magnitude >> 2)
        } else {
            panic!("not a pc-relative load");
        };
        self.buffer.patch_word(at, new);
    }

    //-------------------------------------------------------------------------

    /// Assembles a conditional branch to `label`.
    pub fn jump_if(&mut self, cond: Condition, label: &mut Label) {
        self.write_ref(((cond as u32) << 28) | 0x0A00_0000, PatchKind::Branch24, label);
    }

    /// Assembles an unconditional branch to `label`.
    pub fn jump(&mut self, label: &mut Label) {
        self.write_ref(AL | 0x0A00_0000, PatchKind::Branch24, label);
    }

    /// Assembles a call to `label`, setting `RLR`.
    pub fn call(&mut self, label: &mut Label) {
        self.write_ref(AL | 0x0B00_0000, PatchKind::Branch24, label);
    }

    /// Assembles a return: `BX RLR`.
    pub fn ret(&mut self) {
        self.write(0xE12F_FF1E);
    }

    /// Assembles the dispatch instruction of a jump table: an indexed
    /// pc-relative load into `RPC`. The word after it is covered by the
    /// `RPC` read-ahead and never executes. The caller writes one
    /// [`case_target()`] per table entry immediately afterwards; nothing,
    /// in particular no pool, may come between them.
    ///
    /// [`case_target()`]: Assembler::case_target
    pub fn case_dispatch(&mut self, index: Register) {
        assert_ne!(index, RPC);
        // LDR pc, [pc, index, LSL #2].
        self.write(0xE79F_F100 | (index as u32));
        self.write(NOP);
    }

    /// Writes one jump-table entry: the address of `label`.
    pub fn case_target(&mut self, label: &mut Label) {
        self.write_ref(0, PatchKind::Word32, label);
    }
}

//-----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::buffer::{VecU8};
    use super::super::enums::{Register::*, FRegister::*, Condition::*, UnaryOp::*, BinaryOp::*, MemOp::*};

    /// The emitted code so far, as words.
    pub fn words<B: Buffer>(a: &mut Assembler<B>) -> Vec<u32> {
        a.use_buffer(|b| {
            (0..b.get_pos() / WORD_BYTES).map(|i| b.read_word(i * WORD_BYTES)).collect()
        })
    }

    #[test]
    fn rotated() {
        assert_eq!(rotated_immediate(0), Some(0));
        assert_eq!(rotated_immediate(0xFF), Some(0xFF));
        assert_eq!(rotated_immediate(0x3FC), Some(0xFFF));
        assert_eq!(rotated_immediate(0xFF000000), Some(0x4FF));
        assert_eq!(rotated_immediate(0x101), None);
        assert_eq!(rotated_immediate(0x12345678), None);
    }

    #[test]
    fn data_processing() {
        let mut a = Assembler::new(VecU8::new());
        a.unary(MOV, R2, R3);
        a.unary(MVN, R2, R3);
        a.binary(ADD, R0, R1, R2);
        a.binary(SUB, R0, R1, R2);
        a.binary(ORR, R0, R1, R2);
        a.binary(EOR, R0, R1, R2);
        a.cmp(R1, R2);
        assert_eq!(words(&mut a), vec![
            0xE1A02003,
            0xE1E02003,
            0xE0810002,
            0xE0410002,
            0xE1810002,
            0xE0210002,
            0xE1510002,
        ]);
    }

    #[test]
    fn mem() {
        let mut a = Assembler::new(VecU8::new());
        a.mem(LDR, R0, R1, 4);
        a.mem(STR, R0, R1, -4);
        a.mem(LDRB, R4, R2, 0);
        a.mem(STRB, R4, R2, 1);
        assert_eq!(words(&mut a), vec![
            0xE5910004,
            0xE5010004,
            0xE5D24000,
            0xE5C24001,
        ]);
    }

    #[test]
    fn const_() {
        let mut a = Assembler::new(VecU8::new());
        let mut pool = LitPool::new();
        a.const_(&mut pool, R1, 0);
        a.const_(&mut pool, R1, 0xFF000000);
        a.const_(&mut pool, R1, 0xFFFFFF00);
        a.const_(&mut pool, R2, 0x00FF00FF);
        a.const_(&mut pool, R3, 0x12345678);
        a.const_f(&mut pool, D1, 2.5);
        assert_eq!(words(&mut a), vec![
            0xE3A01000,             // MOV R1, #0
            0xE3A014FF,             // MOV R1, #0xFF000000
            0xE3E010FF,             // MVN R1, #0xFF
            0xE3A020FF,             // MOV R2, #0xFF
            0xE38228FF,             // ORR R2, R2, #0xFF0000
            0xE59F3000,             // LDR R3, [pc, #0] (pending)
            0xED9F1B00,             // VLDR D1, [pc, #0] (pending)
        ]);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.pending_slots(), 3);
        assert!(pool.has_float());
    }

    #[test]
    fn patch_lit_loads() {
        let mut a = Assembler::new(VecU8::new());
        let mut pool = LitPool::new();
        a.const_(&mut pool, R3, 0x12345678);    // at 0
        a.const_f(&mut pool, D1, 2.5);          // at 4
        for _ in 0..6 {
            a.ret();
        }
        // Place entries by hand, forwards and backwards.
        a.patch_lit_load(0, 0x100);
        a.patch_lit_load(0, 4);
        a.patch_lit_load(4, 0x20);
        let ws = words(&mut a);
        assert_eq!(ws[0], 0xE51F3004);          // LDR R3, [pc, #-4]
        assert_eq!(ws[1], 0xED9F1B05);          // VLDR D1, [pc, #20]
    }

    #[test]
    #[should_panic]
    fn vldr_out_of_range() {
        let mut a = Assembler::new(VecU8::new());
        let mut pool = LitPool::new();
        a.const_f(&mut pool, D0, 1.5);
        a.patch_lit_load(0, 0x800);
    }

    #[test]
    fn branches() {
        let mut a = Assembler::new(VecU8::new());
        let mut label = Label::new();
        a.jump_if(NE, &mut label);
        a.jump(&mut label);
        a.define(&mut label);
        a.call(&mut label);
        assert_eq!(words(&mut a), vec![
            0x1A000000,             // BNE +0 (to 8)
            0xEAFFFFFF,             // B -4 (to 8)
            0xEBFFFFFE,             // BL -8 (to 8)
        ]);
    }

    #[test]
    fn case_dispatch() {
        let mut a = Assembler::new(VecU8::new());
        let mut early = Label::new();
        let mut late = Label::new();
        a.define(&mut early);
        a.case_dispatch(R2);
        a.case_target(&mut early);
        a.case_target(&mut late);
        a.ret();
        a.define(&mut late);
        assert_eq!(words(&mut a), vec![
            0xE79FF102,             // LDR pc, [pc, R2, LSL #2]
            0xE1A00000,             // (dead word)
            0x00000000,             // -> early
            0x00000014,             // -> late
            0xE12FFF1E,             // BX RLR
        ]);
    }
}
