/// All A32 general-purpose registers. `R13` is the stack pointer, `R14` the
/// link register and `R15` the program counter; we name them `RSP`, `RLR`
/// and `RPC` but they encode as ordinary register numbers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(clippy::upper_case_acronyms)]
pub enum Register {
    R0  = 0x0, R1  = 0x1, R2  = 0x2, R3  = 0x3,
    R4  = 0x4, R5  = 0x5, R6  = 0x6, R7  = 0x7,
    R8  = 0x8, R9  = 0x9, R10 = 0xA, R11 = 0xB,
    R12 = 0xC, RSP = 0xD, RLR = 0xE, RPC = 0xF,
}

/// The VFP double-precision registers `D0`-`D15`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(clippy::upper_case_acronyms)]
pub enum FRegister {
    D0  = 0x0, D1  = 0x1, D2  = 0x2, D3  = 0x3,
    D4  = 0x4, D5  = 0x5, D6  = 0x6, D7  = 0x7,
    D8  = 0x8, D9  = 0x9, D10 = 0xA, D11 = 0xB,
    D12 = 0xC, D13 = 0xD, D14 = 0xE, D15 = 0xF,
}

//-----------------------------------------------------------------------------

/// All A32 conditions except `AL` (and `NV`).
/// For `HS`, use `CS`. For `LO`, use `CC`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(clippy::upper_case_acronyms)]
pub enum Condition {
    EQ = 0x0, NE = 0x1,
    CS = 0x2, CC = 0x3,
    MI = 0x4, PL = 0x5,
    VS = 0x6, VC = 0x7,
    HI = 0x8, LS = 0x9,
    GE = 0xA, LT = 0xB,
    GT = 0xC, LE = 0xD,
}

use Condition::*;

/// All `Condition`s.
pub const ALL_CONDITIONS: [Condition; 14] = [EQ, NE, CS, CC, MI, PL, VS, VC, HI, LS, GE, LT, GT, LE];

impl Condition {
    /// Changes `EQ` into `NE` and vice versa, and so on.
    pub fn invert(self) -> Self {
        ALL_CONDITIONS[(self as usize) ^ 1]
    }
}

//-----------------------------------------------------------------------------

/// One-operand data-processing operations. The discriminant is the A32
/// data-processing opcode (bits 24-21).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum UnaryOp {
    /// `dest <- src`.
    MOV = 0xD,
    /// `dest <- !src`.
    MVN = 0xF,
}

/// Two-operand data-processing operations. The discriminant is the A32
/// data-processing opcode (bits 24-21).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(clippy::upper_case_acronyms)]
pub enum BinaryOp {
    AND = 0x0,
    EOR = 0x1,
    SUB = 0x2,
    /// Reverse subtract: `dest <- src2 - src1`.
    RSB = 0x3,
    ADD = 0x4,
    ORR = 0xC,
    /// Bit clear: `dest <- src1 & !src2`.
    BIC = 0xE,
}

/// All memory access operations. The discriminant packs the `L` (load) bit
/// into bit 0 and the `B` (byte) bit into bit 1.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(clippy::upper_case_acronyms)]
pub enum MemOp {
    /// Store a 32-bit word.
    STR = 0,
    /// Load a 32-bit word.
    LDR = 1,
    /// Truncate to 8 bits and store.
    STRB = 2,
    /// Load 8 bits and zero-extend.
    LDRB = 3,
}

//-----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invert() {
        for (i, &cond) in ALL_CONDITIONS.iter().enumerate() {
            assert_eq!(cond.invert().invert(), cond);
            assert_eq!(cond.invert() as usize, i ^ 1);
        }
    }
}
