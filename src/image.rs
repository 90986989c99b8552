use std::ops::Range;

use tracing::debug;

use crate::{
    address::AddressMap,
    error::{Error, Result},
    hash::fnv1a,
};

/// 6502 `NOP`, used to blank out instructions left over after a routine has
/// been shortened.
pub const FILLER: u8 = 0xEA;

/// Offsets touched by a single patch primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// A flat executable image as loaded at `load_address`, owned by a single
/// pipeline run.
///
/// The image only ever grows at the tail: a write that starts inside the
/// image (or exactly at its end) and runs past the end extends it, anything
/// starting further out is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryImage {
    bytes: Vec<u8>,
    map: AddressMap,
}

impl MemoryImage {
    pub fn new(bytes: Vec<u8>, load_address: u16) -> Self {
        Self {
            bytes,
            map: AddressMap::new(load_address),
        }
    }

    pub fn map(&self) -> AddressMap {
        self.map
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn fingerprint(&self) -> u32 {
        fnv1a(&self.bytes)
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    fn offset(&self, operation: &'static str, address: u16) -> Result<usize> {
        self.map.offset(address).ok_or(Error::AddressBelowBase {
            operation,
            address,
            load_address: self.map.load_address(),
        })
    }

    /// Resolve `len` bytes at `address` to a range lying entirely inside the
    /// current image.
    pub fn range(&self, operation: &'static str, address: u16, len: usize) -> Result<Range<usize>> {
        let offset = self.offset(operation, address)?;
        match offset.checked_add(len) {
            Some(end) if end <= self.bytes.len() => Ok(offset..end),
            _ => Err(Error::Bounds {
                operation,
                address,
                offset,
                len,
                image_len: self.bytes.len(),
            }),
        }
    }

    fn overwrite(&mut self, operation: &'static str, address: u16, payload: &[u8]) -> Result<Span> {
        let start = self.offset(operation, address)?;
        if start > self.bytes.len() {
            return Err(Error::Bounds {
                operation,
                address,
                offset: start,
                len: payload.len(),
                image_len: self.bytes.len(),
            });
        }

        let in_place = payload.len().min(self.bytes.len() - start);
        let (head, tail) = payload.split_at(in_place);
        self.bytes[start..start + in_place].copy_from_slice(head);
        self.bytes.extend_from_slice(tail);

        debug!(
            "{} {} bytes at 0x{:04X} (offset 0x{:X}..0x{:X})",
            operation,
            payload.len(),
            address,
            start,
            start + payload.len()
        );
        Ok(Span {
            offset: start,
            len: payload.len(),
        })
    }

    /// Overwrite the bytes at `address` with `payload` verbatim.
    pub fn insert_bytes(&mut self, address: u16, payload: &[u8]) -> Result<Span> {
        self.overwrite("insert bytes", address, payload)
    }

    /// Same as [`insert_bytes`](Self::insert_bytes) for payloads read from an
    /// external file.
    pub fn insert_blob(&mut self, address: u16, blob: &[u8]) -> Result<Span> {
        self.overwrite("insert blob", address, blob)
    }

    pub fn insert_filler(&mut self, address: u16, count: usize) -> Result<Span> {
        self.overwrite("insert filler", address, &vec![FILLER; count])
    }

    /// Append `blob` to the end of the image.
    pub fn append(&mut self, blob: &[u8]) -> Span {
        let offset = self.bytes.len();
        self.bytes.extend_from_slice(blob);
        debug!("append {} bytes at offset 0x{:X}", blob.len(), offset);
        Span {
            offset,
            len: blob.len(),
        }
    }

    /// Copy `len` bytes from `source` over the bytes at `dest`. The source is
    /// read in full before the destination is written, so overlapping ranges
    /// behave like a snapshot copy.
    pub fn shift_block(&mut self, source: u16, dest: u16, len: usize) -> Result<Span> {
        let from = self.range("shift block source", source, len)?;
        let to = self.range("shift block destination", dest, len)?;
        self.bytes.copy_within(from.clone(), to.start);

        debug!(
            "shift {} bytes from 0x{:04X} to 0x{:04X} (offset 0x{:X} -> 0x{:X})",
            len, source, dest, from.start, to.start
        );
        Ok(Span {
            offset: to.start,
            len,
        })
    }

    /// Overwrite a single byte that must already exist; never grows the image.
    pub fn poke(&mut self, address: u16, value: u8) -> Result<Span> {
        let range = self.range("poke", address, 1)?;
        self.bytes[range.start] = value;
        debug!("poke 0x{:02X} at 0x{:04X}", value, address);
        Ok(Span {
            offset: range.start,
            len: 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> MemoryImage {
        MemoryImage::new((0..32).collect(), 0x1000)
    }

    #[test]
    fn insert_bytes_replaces_in_place() {
        let mut image = image();
        let before = image.as_bytes().to_vec();
        let span = image.insert_bytes(0x1004, &[0xA0, 0x09]).unwrap();

        assert_eq!(span, Span { offset: 4, len: 2 });
        assert_eq!(image.len(), 32);
        assert_eq!(&image.as_bytes()[span.range()], &[0xA0, 0x09]);
        assert_eq!(&image.as_bytes()[..4], &before[..4]);
        assert_eq!(&image.as_bytes()[6..], &before[6..]);
    }

    #[test]
    fn write_starting_at_end_appends() {
        let mut image = image();
        let before = image.as_bytes().to_vec();
        let span = image.insert_bytes(0x1020, &[0x4C, 0x35, 0xCD]).unwrap();

        assert_eq!(span, Span { offset: 32, len: 3 });
        assert_eq!(image.len(), 35);
        assert_eq!(&image.as_bytes()[..32], before.as_slice());
        assert_eq!(&image.as_bytes()[span.range()], &[0x4C, 0x35, 0xCD]);
    }

    #[test]
    fn insert_filler_touches_only_its_range() {
        let mut image = image();
        let before = image.as_bytes().to_vec();
        image.insert_filler(0x1010, 3).unwrap();

        for (n, (&old, &new)) in before.iter().zip(image.as_bytes()).enumerate() {
            if (16..19).contains(&n) {
                assert_eq!(new, FILLER);
            } else {
                assert_eq!(old, new, "byte {n} changed");
            }
        }
    }

    #[test]
    fn overwrite_past_end_grows_tail() {
        let mut image = image();
        image.insert_bytes(0x101E, &[0xAA, 0xBB, 0xCC, 0xDD]).unwrap();

        assert_eq!(image.len(), 34);
        assert_eq!(&image.as_bytes()[29..], &[29, 0xAA, 0xBB, 0xCC, 0xDD]);
    }

    #[test]
    fn overwrite_starting_beyond_end_is_rejected() {
        let mut image = image();
        let err = image.insert_bytes(0x1021, &[0x60]).unwrap_err();

        assert!(matches!(err, Error::Bounds { offset: 33, image_len: 32, .. }));
        assert_eq!(image.len(), 32);
    }

    #[test]
    fn overwrite_below_load_address_is_rejected() {
        let err = image().insert_filler(0x0FFF, 1).unwrap_err();
        assert!(matches!(err, Error::AddressBelowBase { address: 0x0FFF, .. }));
    }

    #[test]
    fn append_extends_at_tail() {
        let mut image = image();
        let span = image.append(&[1, 2, 3]);

        assert_eq!(span, Span { offset: 32, len: 3 });
        assert_eq!(&image.as_bytes()[30..], &[30, 31, 1, 2, 3]);
    }

    #[test]
    fn shift_block_reads_before_writing() {
        let mut image = image();
        let source = image.as_bytes()[8..28].to_vec();
        image.shift_block(0x1008, 0x1004, 20).unwrap();
        assert_eq!(&image.as_bytes()[4..24], source.as_slice());

        // Shifting up overlaps the other way round.
        let mut image = self::image();
        let source = image.as_bytes()[4..24].to_vec();
        image.shift_block(0x1004, 0x1008, 20).unwrap();
        assert_eq!(&image.as_bytes()[8..28], source.as_slice());
    }

    #[test]
    fn shift_block_outside_image_is_rejected() {
        let mut image = image();
        assert!(matches!(
            image.shift_block(0x1010, 0x1000, 20),
            Err(Error::Bounds { operation: "shift block source", .. })
        ));
        assert_eq!(image, self::image());
    }

    #[test]
    fn poke_never_grows() {
        let mut image = image();
        image.poke(0x101F, 0xD0).unwrap();
        assert_eq!(image.as_bytes()[31], 0xD0);
        assert!(image.poke(0x1020, 0xD0).is_err());
        assert_eq!(image.len(), 32);
    }
}
