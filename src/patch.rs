use byteorder::{ByteOrder, LittleEndian};

const JSR: u8 = 0x20;
const JMP: u8 = 0x4C;
const RTS: u8 = 0x60;

/// A single edit to the image. Patches are plain data; a
/// [`PatchScript`](crate::script::PatchScript) applies them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch {
    /// Overwrite the bytes at `address` with `bytes`.
    InsertBytes { address: u16, bytes: Vec<u8> },
    /// Overwrite the bytes at `address` with the contents of the named blob.
    InsertBlob { address: u16, name: String },
    /// Overwrite `count` bytes at `address` with `NOP`.
    InsertFiller { address: u16, count: usize },
    /// Copy `len` bytes from `source` over `dest`.
    ShiftBlock { source: u16, dest: u16, len: usize },
    /// Append the named blob to the end of the image.
    AppendBlob { name: String },
}

impl Patch {
    pub fn bytes(address: u16, bytes: impl Into<Vec<u8>>) -> Self {
        Self::InsertBytes {
            address,
            bytes: bytes.into(),
        }
    }

    pub fn blob(address: u16, name: impl Into<String>) -> Self {
        Self::InsertBlob {
            address,
            name: name.into(),
        }
    }

    pub fn filler(address: u16, count: usize) -> Self {
        Self::InsertFiller { address, count }
    }

    pub fn shift(source: u16, dest: u16, len: usize) -> Self {
        Self::ShiftBlock { source, dest, len }
    }

    pub fn append(name: impl Into<String>) -> Self {
        Self::AppendBlob { name: name.into() }
    }

    /// `JSR target` at `address`.
    pub fn jsr(address: u16, target: u16) -> Self {
        Self::bytes(address, absolute(JSR, target))
    }

    /// `JMP target` at `address`.
    pub fn jmp(address: u16, target: u16) -> Self {
        Self::bytes(address, absolute(JMP, target))
    }

    pub fn rts(address: u16) -> Self {
        Self::bytes(address, [RTS])
    }
}

/// Encode an instruction with an absolute (little-endian) operand.
fn absolute(opcode: u8, target: u16) -> [u8; 3] {
    let mut instruction = [opcode, 0, 0];
    LittleEndian::write_u16(&mut instruction[1..], target);
    instruction
}
