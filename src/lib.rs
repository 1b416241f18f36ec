//! The TV image format: header and section layout, variable-width
//! instruction encoding, and the plug-in ABI the assembler's
//! shared-library loader binds against.
//!
//! This crate owns the wire format only. Turning assembly source into a
//! linked `Image` is `tv-asm`'s job.

pub mod codec;
pub mod header;
pub mod image;
pub mod instr;
pub mod opcode;
pub mod plugin;
pub mod tables;

pub use codec::{decode_instruction, encode_instruction, DecodeError};
pub use header::{pad16, Header, SectionHeader, SectionKind};
pub use image::{read_code, read_header, read_section_header, Image, ReadError};
pub use instr::{flag, ArgWidth, Instruction, Sizes, MAX_ARGS};
pub use opcode::{Opcode, OperandShape, RegisterId};
pub use plugin::{Callback, ModuleInit, RegisterFile, SymbolTable as PluginSymbol};
pub use tables::{DataSection, ExternalIndex, LibrarySet, StringTable};
