//! A code-emission back end for 32-bit ARM (A32).
//!
//! A32 has no instruction that materializes an arbitrary 32-bit constant in
//! one step. Wide constants live instead in literal pools interleaved with
//! the code, addressed by pc-relative loads with a small displacement:
//! `LDR` reaches ±4095 bytes, and `VLDR` only ±1020. The [`Emitter`] walks
//! an already-selected instruction stream and decides, instruction by
//! instruction, when to flush the pending pool, so that no load is ever
//! left out of range of its constant — including across jump tables, whose
//! size is counted before their words are written.
//!
//! ```
//! use armlet::{Emitter, Inst, buffer::VecU8};
//! use armlet::Register::*;
//! use armlet::BinaryOp::*;
//!
//! let code = [
//!     Inst::Const(R0, 0xDEADBEEF),     // too wide for an immediate: pooled
//!     Inst::Binary(ADD, R0, R0, R1),
//!     Inst::Ret,
//! ];
//! let mut emitter = Emitter::new(VecU8::new());
//! emitter.emit(&code);
//! let buffer = emitter.finish();
//! assert_eq!(buffer.len(), 4 * 4);     // three instructions + one pool word
//! ```

pub mod buffer;

mod label;
pub use label::{Patch, PatchKind, Label};

mod enums;
pub use enums::{Register, FRegister, Condition, ALL_CONDITIONS, UnaryOp, BinaryOp, MemOp};

mod inst;
pub use inst::{Inst, LabelId};

mod pool;
pub use pool::{Lit, LitPool};

mod assembler;
pub use assembler::{Assembler, disp, rotated_immediate, case_dispatch_size};

mod emitter;
pub use emitter::{Emitter, POOL_RANGE, POOL_RANGE_STRICT, POOL_MARGIN};
