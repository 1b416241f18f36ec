use num_derive::{FromPrimitive, ToPrimitive};
use tv_util::EnumFromStr;
use tv_util_derive::EnumFromStr;

/// The instruction set. Numbering starts at 1; 0 is reserved so an
/// all-zero word reads as padding rather than a valid instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug, ToPrimitive, FromPrimitive, EnumFromStr)]
pub enum Opcode {
    RET = 1,
    MOV,
    GTO,
    INC,
    DEC,
    CMP,
    JMP,
    JEQ,
    JNE,
    JLT,
    JGT,
    JLE,
    JGE,
    ADD,
    SUB,
    MUL,
    DIV,
    SHR,
    SHL,
    PRG,
    PRI,
}

/// The operand shape an opcode expects, driving both front-end operand
/// validation and which `argv` slot each operand lands in.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OperandShape {
    /// No operands: `RET`, `PRI`.
    None,
    /// A single destination register, `argv[0]` flagged `REG0`: `INC`,
    /// `DEC`, `PRG`.
    RegisterOnly,
    /// A destination register at `argv[0]` (`REG0`) and a source value
    /// at `argv[1]`: `MOV`, `CMP`, `ADD`, `SUB`, `MUL`, `DIV`, `SHR`,
    /// `SHL`.
    RegisterAndSrc,
    /// A single target at `argv[0]`, never a register: `GTO` and the
    /// conditional/unconditional jump family.
    TargetOnly,
}

impl Opcode {
    pub fn operand_shape(self) -> OperandShape {
        match self {
            Opcode::RET | Opcode::PRI => OperandShape::None,
            Opcode::INC | Opcode::DEC | Opcode::PRG => OperandShape::RegisterOnly,
            Opcode::MOV
            | Opcode::CMP
            | Opcode::ADD
            | Opcode::SUB
            | Opcode::MUL
            | Opcode::DIV
            | Opcode::SHR
            | Opcode::SHL => OperandShape::RegisterAndSrc,
            Opcode::GTO
            | Opcode::JMP
            | Opcode::JEQ
            | Opcode::JNE
            | Opcode::JLT
            | Opcode::JGT
            | Opcode::JLE
            | Opcode::JGE => OperandShape::TargetOnly,
        }
    }
}

/// The ten general-purpose registers, `%r0`..`%r9`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, ToPrimitive, FromPrimitive)]
pub enum RegisterId {
    R0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    R8,
    R9,
}

impl RegisterId {
    pub const COUNT: u8 = 10;

    pub fn from_index(i: u8) -> Option<RegisterId> {
        use num_traits::FromPrimitive;
        RegisterId::from_u8(i)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use num_traits::{FromPrimitive, ToPrimitive};

    #[test]
    fn opcode_numbering_starts_at_one() {
        assert_eq!(Opcode::RET.to_u8(), Some(1));
        assert_eq!(Opcode::PRI.to_u8(), Some(21));
    }

    #[test]
    fn opcode_round_trips_through_from_primitive() {
        assert_eq!(Opcode::from_u8(1), Some(Opcode::RET));
        assert_eq!(Opcode::from_u8(0), None);
    }

    #[test]
    fn opcode_mnemonics_parse_case_sensitively() {
        assert_eq!(Opcode::from_str("MOV"), Ok(Opcode::MOV));
        assert!(Opcode::from_str("mov").is_err());
    }

    #[test]
    fn operand_shapes_match_the_instruction_set_table() {
        assert_eq!(Opcode::RET.operand_shape(), OperandShape::None);
        assert_eq!(Opcode::INC.operand_shape(), OperandShape::RegisterOnly);
        assert_eq!(Opcode::MOV.operand_shape(), OperandShape::RegisterAndSrc);
        assert_eq!(Opcode::JMP.operand_shape(), OperandShape::TargetOnly);
    }
}
