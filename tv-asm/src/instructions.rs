use tv_format::Opcode;

use crate::data::DataDeclaration;

/// One instruction operand as the front end sees it, before resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    Register(u8),
    Immediate(u64),
    /// A bare identifier: resolved against local labels, local data
    /// declarations, or the external symbol index, in that order (C4).
    Name(String),
}

/// One instruction as parsed, still carrying a local label index (into
/// its unit's `ParsedUnit::labels`) rather than a merged, global one.
/// `operands` holds 0, 1, or 2 entries depending on `op`'s
/// `OperandShape`; the front end validates the count and kinds against
/// that shape as each instruction is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedInstruction {
    pub op: Opcode,
    pub label: Option<usize>,
    pub operands: Vec<Operand>,
}

/// One translation unit's worth of parsed source: the libraries it
/// declares, its labels in first-defined order (so a label's position
/// in this list is its local id), its data declarations in declaration
/// order, and its instructions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedUnit {
    pub libs: Vec<String>,
    pub labels: Vec<String>,
    pub data: Vec<(String, DataDeclaration)>,
    pub instructions: Vec<ParsedInstruction>,
}
