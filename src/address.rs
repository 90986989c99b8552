/// Projects absolute 6502 addresses onto offsets into a loaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressMap {
    load_address: u16,
}

impl AddressMap {
    pub const fn new(load_address: u16) -> Self {
        Self { load_address }
    }

    pub const fn load_address(&self) -> u16 {
        self.load_address
    }

    /// Offset of `address` within the image, `None` if it lies below the load
    /// address. Whether the offset falls inside the image is for the caller
    /// to check.
    #[inline]
    pub const fn offset(&self, address: u16) -> Option<usize> {
        match address.checked_sub(self.load_address) {
            Some(offset) => Some(offset as usize),
            None => None,
        }
    }
}
