use tv_util::ByteBuffer;

use crate::codec::{decode_instruction, encode_instruction, DecodeError};
use crate::header::{pad16, Header, SectionHeader};
use crate::instr::Instruction;
use crate::tables::{DataSection, LibrarySet, StringTable};

/// A fully linked image: resolved code, the data payload, the set of
/// libraries actually needed, and the string table of referenced symbol
/// names. Produced by the linker (C3-C5), consumed by `write`/the C8
/// reader functions below.
#[derive(Clone, Debug, Default)]
pub struct Image {
    pub code: Vec<Instruction>,
    pub data: DataSection,
    pub libraries: LibrarySet,
    pub strings: StringTable,
    /// Index (not byte offset) of the first instruction to execute,
    /// written into the code section header's `entry` field.
    pub entry: u32,
}

fn encode_code(code: &[Instruction]) -> Vec<u8> {
    let mut buf = ByteBuffer::new();
    for ins in code {
        encode_instruction(ins, &mut buf);
    }
    buf.into_vec()
}

impl Image {
    /// Serializes the image to its on-disk byte layout: a 14-byte header
    /// followed by the code, data, symbol, and string sections in that
    /// fixed order, each padded to a 16-byte boundary. Data, symbol, and
    /// string sections are omitted entirely when empty.
    pub fn write(&self) -> Vec<u8> {
        let code_bytes = encode_code(&self.code);
        let data_bytes = self.data.as_slice();
        let symbol_bytes = self.libraries.as_bytes();
        let string_bytes = self.strings.as_slice();

        let mut out = ByteBuffer::new();
        let mut header = Header::default();

        let mut cursor = Header::SIZE as u32;
        cursor += SectionHeader::SIZE as u32;
        cursor += code_bytes.len() as u32 + pad16(code_bytes.len()) as u32;

        if !data_bytes.is_empty() {
            header.data_offset = cursor;
            cursor += SectionHeader::SIZE as u32;
            cursor += data_bytes.len() as u32 + pad16(data_bytes.len()) as u32;
        }
        if !symbol_bytes.is_empty() {
            header.symbol_offset = cursor;
            cursor += SectionHeader::SIZE as u32;
            cursor += symbol_bytes.len() as u32 + pad16(symbol_bytes.len()) as u32;
        }
        if !string_bytes.is_empty() {
            header.string_offset = cursor;
        }

        header.write(&mut out);

        write_section(&mut out, 0, self.entry, &code_bytes);
        if !data_bytes.is_empty() {
            write_section(&mut out, 0, header.data_offset, data_bytes);
        }
        if !symbol_bytes.is_empty() {
            write_section(&mut out, 0, header.symbol_offset, &symbol_bytes);
        }
        if !string_bytes.is_empty() {
            write_section(&mut out, 0, header.string_offset, string_bytes);
        }

        out.into_vec()
    }
}

fn write_section(out: &mut ByteBuffer, flags: u16, entry: u32, payload: &[u8]) {
    let start = out.size() as u32;
    let sh = SectionHeader::for_payload(start, payload.len() as u32, entry, flags);
    sh.write(out);
    out.write_bytes(payload);
    out.fill(pad16(payload.len()), 0);
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ReadError {
    BadMagic,
    Truncated,
    Decode(DecodeError),
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ReadError::BadMagic => write!(f, "missing \"TV\" magic"),
            ReadError::Truncated => write!(f, "image truncated"),
            ReadError::Decode(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ReadError {}

impl From<DecodeError> for ReadError {
    fn from(e: DecodeError) -> Self {
        ReadError::Decode(e)
    }
}

/// Reads the 14-byte header at the start of `buf`.
pub fn read_header(buf: &[u8]) -> Result<Header, ReadError> {
    if buf.len() < Header::SIZE {
        return Err(ReadError::Truncated);
    }
    if &buf[0..2] != b"TV" {
        return Err(ReadError::BadMagic);
    }
    Ok(Header {
        data_offset: u32::from_le_bytes(buf[2..6].try_into().unwrap()),
        string_offset: u32::from_le_bytes(buf[6..10].try_into().unwrap()),
        symbol_offset: u32::from_le_bytes(buf[10..14].try_into().unwrap()),
    })
}

/// Reads the 16-byte section header at absolute offset `at`.
pub fn read_section_header(buf: &[u8], at: usize) -> Result<SectionHeader, ReadError> {
    if at + SectionHeader::SIZE > buf.len() {
        return Err(ReadError::Truncated);
    }
    let b = &buf[at..at + SectionHeader::SIZE];
    Ok(SectionHeader {
        flags: u16::from_le_bytes(b[0..2].try_into().unwrap()),
        align: u16::from_le_bytes(b[2..4].try_into().unwrap()),
        entry: u32::from_le_bytes(b[4..8].try_into().unwrap()),
        size: u32::from_le_bytes(b[8..12].try_into().unwrap()),
        start: u32::from_le_bytes(b[12..16].try_into().unwrap()),
    })
}

/// Decodes every instruction in the code section, the one section
/// guaranteed present in a well-formed image.
pub fn read_code(buf: &[u8]) -> Result<Vec<Instruction>, ReadError> {
    let code_header_at = Header::SIZE;
    let sh = read_section_header(buf, code_header_at)?;
    let start = sh.start as usize + SectionHeader::SIZE;
    let end = start + sh.size as usize;
    if end > buf.len() {
        return Err(ReadError::Truncated);
    }
    let mut out = Vec::new();
    let mut pos = start;
    while pos < end {
        out.push(decode_instruction(buf, &mut pos)?);
    }
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::instr::ArgWidth;
    use crate::opcode::Opcode;

    fn linked_image() -> Image {
        let mut img = Image::default();
        let mut mov = Instruction::new(Opcode::MOV);
        mov.set_reg_index(0);
        mov.push_arg(42);
        mov.sizes.set(0, ArgWidth::One);
        img.code.push(mov);
        img.code.push(Instruction::new(Opcode::RET));
        img
    }

    #[test]
    fn s1_minimal_program_matches_the_literal_expected_bytes() {
        let mut img = Image::default();
        img.code.push(Instruction::new(Opcode::RET));
        let bytes = img.write();

        assert_eq!(
            &bytes[0..14],
            &[0x54, 0x56, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
        );
        let code_sh = read_section_header(&bytes, Header::SIZE).unwrap();
        assert_eq!(code_sh.size, 6);
        assert_eq!(code_sh.entry, 0);
        let payload_start = Header::SIZE + SectionHeader::SIZE;
        assert_eq!(
            &bytes[payload_start..payload_start + 6],
            &[0x01, 0, 0, 0, 0, 0]
        );
        assert_eq!(bytes.len(), 14 + 16 + 6 + 10);
    }

    #[test]
    fn write_then_read_code_round_trips_instructions() {
        let img = linked_image();
        let bytes = img.write();
        let decoded = read_code(&bytes).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].op, Opcode::MOV);
        assert_eq!(decoded[0].argv[0], 42);
        assert_eq!(decoded[1].op, Opcode::RET);
    }

    #[test]
    fn sections_are_padded_to_16_byte_boundaries() {
        let img = linked_image();
        let bytes = img.write();
        let code_sh = read_section_header(&bytes, Header::SIZE).unwrap();
        let section_total = SectionHeader::SIZE + code_sh.size as usize + code_sh.align as usize;
        assert_eq!(section_total % 16, 0);
    }

    #[test]
    fn data_section_is_omitted_when_empty() {
        let img = linked_image();
        let bytes = img.write();
        let header = read_header(&bytes).unwrap();
        assert_eq!(header.data_offset, 0);
    }

    #[test]
    fn data_symbol_and_string_sections_appear_when_present() {
        let mut img = linked_image();
        img.data.push_ascii(b"hi\0");
        img.strings.intern(b"puts");
        img.libraries.insert("tvstdlib");

        let bytes = img.write();
        let header = read_header(&bytes).unwrap();
        assert_ne!(header.data_offset, 0);
        assert_ne!(header.symbol_offset, 0);
        assert_ne!(header.string_offset, 0);
        assert!(header.data_offset < header.symbol_offset);
        assert!(header.symbol_offset < header.string_offset);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let bytes = vec![0u8; Header::SIZE];
        assert_eq!(read_header(&bytes), Err(ReadError::BadMagic));
    }
}
