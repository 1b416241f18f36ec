use num_traits::{FromPrimitive, ToPrimitive};
use tv_util::ByteBuffer;

use crate::instr::{flag, ArgWidth, Instruction, Sizes, MAX_ARGS};
use crate::opcode::Opcode;

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum DecodeError {
    UnexpectedEof,
    UnknownOpcode(u8),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DecodeError::UnexpectedEof => write!(f, "instruction stream ended mid-record"),
            DecodeError::UnknownOpcode(b) => write!(f, "unknown opcode byte 0x{:02x}", b),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Appends the encoded form of `ins` to `out`. Every argument must already
/// be resolved (`ins.lname` is ignored); widths are taken from `ins.sizes`.
pub fn encode_instruction(ins: &Instruction, out: &mut ByteBuffer) {
    out.write8(ins.op.to_u8().expect("opcode fits in a byte"));
    out.write8(ins.argc);
    out.write16(ins.flags);
    out.write16(ins.sizes.0);
    if ins.flags & flag::RIDX != 0 {
        out.write8(ins.reg_index.expect("RIDX set implies reg_index is Some"));
    }
    for slot in 0..ins.argc as usize {
        let v = ins.argv[slot];
        match ins.sizes.get(slot) {
            ArgWidth::One => out.write8(v as u8),
            ArgWidth::Two => out.write16(v as u16),
            ArgWidth::Four => out.write32(v as u32),
            ArgWidth::Eight => out.write64(v),
        }
    }
}

fn take<'a>(buf: &'a [u8], pos: &mut usize, n: usize) -> Result<&'a [u8], DecodeError> {
    if *pos + n > buf.len() {
        return Err(DecodeError::UnexpectedEof);
    }
    let slice = &buf[*pos..*pos + n];
    *pos += n;
    Ok(slice)
}

/// Decodes one instruction starting at `*pos`, advancing `*pos` past it.
/// The mechanical inverse of `encode_instruction`.
pub fn decode_instruction(buf: &[u8], pos: &mut usize) -> Result<Instruction, DecodeError> {
    let op_byte = take(buf, pos, 1)?[0];
    let op = Opcode::from_u8(op_byte).ok_or(DecodeError::UnknownOpcode(op_byte))?;
    let argc = take(buf, pos, 1)?[0];
    let flags = u16::from_le_bytes(take(buf, pos, 2)?.try_into().unwrap());
    let sizes = Sizes(u16::from_le_bytes(take(buf, pos, 2)?.try_into().unwrap()));

    let reg_index = if flags & flag::RIDX != 0 {
        Some(take(buf, pos, 1)?[0])
    } else {
        None
    };

    let mut argv = [0u64; MAX_ARGS];
    for (slot, arg) in argv.iter_mut().enumerate().take(argc as usize) {
        *arg = match sizes.get(slot) {
            ArgWidth::One => take(buf, pos, 1)?[0] as u64,
            ArgWidth::Two => u16::from_le_bytes(take(buf, pos, 2)?.try_into().unwrap()) as u64,
            ArgWidth::Four => u32::from_le_bytes(take(buf, pos, 4)?.try_into().unwrap()) as u64,
            ArgWidth::Eight => u64::from_le_bytes(take(buf, pos, 8)?.try_into().unwrap()),
        };
    }

    Ok(Instruction {
        op,
        flags,
        sizes,
        argv,
        argc,
        reg_index,
        lname: None,
    })
}
