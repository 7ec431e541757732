use super::enums::{Register, FRegister, Condition, UnaryOp, BinaryOp, MemOp};

/// Names a [`Label`] in the [`Emitter`]'s label table. Ids are allocated by
/// the instruction producer; the table grows on first use.
///
/// [`Label`]: super::Label
/// [`Emitter`]: super::Emitter
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LabelId(pub usize);

/// One target instruction, as selected upstream. Instructions are consumed
/// exactly once, in stream order, by [`Emitter::emit()`], and are immutable
/// during emission.
///
/// This is a closed enum on purpose: the [`Emitter`] matches on it
/// exhaustively, so a new kind whose emitted size is not knowable at the
/// point of the pool-flush decision (as [`CaseJump`]'s is) cannot be added
/// without revisiting those matches.
///
/// [`Emitter`]: super::Emitter
/// [`Emitter::emit()`]: super::Emitter::emit
/// [`CaseJump`]: Inst::CaseJump
#[derive(Debug, Clone)]
pub enum Inst {
    /// `dest <- op(src)`.
    Unary(UnaryOp, Register, Register),
    /// `dest <- op(src1, src2)`.
    Binary(BinaryOp, Register, Register, Register),
    /// `dest <- constant`. May place the constant in the literal pool.
    Const(Register, u32),
    /// `dest <- constant` (double precision). Always places the constant in
    /// the literal pool; `VLDR` has the strict pc-relative range.
    ConstF(FRegister, f64),
    /// Load or store `data` at `base` plus a byte offset.
    Mem(MemOp, Register, Register, i32),
    /// Compare two registers and set the condition flags.
    Cmp(Register, Register),
    /// Define the given label at the current position.
    Define(LabelId),
    /// Branch to the label if the condition holds.
    JumpIf(Condition, LabelId),
    /// Branch to the label unconditionally.
    Jump(LabelId),
    /// Call the label, setting `RLR`.
    Call(LabelId),
    /// Return: `BX RLR`.
    Ret,
    /// Multi-way dispatch: jump to `targets[index]`. The index register must
    /// be in `0..targets.len()`. Emitted as a dispatch instruction followed
    /// by a table of target addresses, one word per target.
    CaseJump(Register, Vec<LabelId>),
}

impl Inst {
    /// Whether execution is guaranteed to continue into the textually next
    /// instruction. A literal pool cannot be placed after a fallthrough
    /// instruction without a branch around it.
    ///
    /// Note that [`Emitter`] deliberately does not consult this for
    /// [`CaseJump`]: at the point of the flush decision the dispatch table
    /// has not been written yet, so the pool must go before it either way.
    ///
    /// [`Emitter`]: super::Emitter
    /// [`CaseJump`]: Inst::CaseJump
    pub fn has_fallthrough(&self) -> bool {
        match self {
            Inst::Jump(_) | Inst::Ret | Inst::CaseJump(..) => false,
            Inst::Unary(..) | Inst::Binary(..) | Inst::Const(..) |
            Inst::ConstF(..) | Inst::Mem(..) | Inst::Cmp(..) |
            Inst::Define(_) | Inst::JumpIf(..) | Inst::Call(_) => true,
        }
    }
}

//-----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::enums::{Register::*, BinaryOp::*, Condition::*};

    #[test]
    fn fallthrough() {
        assert!(Inst::Binary(ADD, R0, R1, R2).has_fallthrough());
        assert!(Inst::JumpIf(NE, LabelId(0)).has_fallthrough());
        assert!(Inst::Call(LabelId(0)).has_fallthrough());
        assert!(!Inst::Jump(LabelId(0)).has_fallthrough());
        assert!(!Inst::Ret.has_fallthrough());
        assert!(!Inst::CaseJump(R0, vec![LabelId(0)]).has_fallthrough());
    }
}
