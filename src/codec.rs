//! The chained scramble applied to the at-rest image.
//!
//! Each byte is stored as the sum of its plain value and the plain value of the
//! byte one address higher; the topmost byte of the window is summed with the
//! seed instead. Decrypting therefore has to walk the window downwards and
//! encrypting upwards, one byte at a time.

use tracing::info;

use crate::{
    error::{Error, Result},
    image::MemoryImage,
};

/// Inclusive address range covered by the scramble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrambleWindow {
    from: u16,
    to: u16,
}

impl ScrambleWindow {
    /// Window over `from..=to`, meant for constants.
    ///
    /// # Panics
    ///
    /// Panics if `from > to`; use [`try_new`](Self::try_new) for windows
    /// that are not known up front.
    pub const fn new(from: u16, to: u16) -> Self {
        assert!(from <= to, "scramble window must not be empty");
        Self { from, to }
    }

    pub fn try_new(from: u16, to: u16) -> Result<Self> {
        if from > to {
            return Err(Error::ReversedWindow { from, to });
        }
        Ok(Self { from, to })
    }

    pub const fn from(&self) -> u16 {
        self.from
    }

    pub const fn to(&self) -> u16 {
        self.to
    }

    pub const fn len(&self) -> usize {
        (self.to - self.from) as usize + 1
    }
}

/// A window together with the seed that chains into its topmost byte. Both
/// passes must be run with the same codec for the round trip to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrambleCodec {
    pub window: ScrambleWindow,
    pub seed: u8,
}

impl ScrambleCodec {
    pub const fn new(window: ScrambleWindow, seed: u8) -> Self {
        Self { window, seed }
    }

    pub fn decrypt(&self, image: &mut MemoryImage) -> Result<()> {
        let range = image.range("decrypt", self.window.from, self.window.len())?;
        image.bytes_mut()[range]
            .iter_mut()
            .rev()
            .fold(self.seed, |seed, byte| {
                *byte = byte.wrapping_sub(seed);
                *byte
            });

        info!(
            "decrypted 0x{:04X}..=0x{:04X} with seed 0x{:02X}",
            self.window.from, self.window.to, self.seed
        );
        Ok(())
    }

    pub fn encrypt(&self, image: &mut MemoryImage) -> Result<()> {
        let range = image.range("encrypt", self.window.from, self.window.len())?;
        let window = &mut image.bytes_mut()[range];

        // Ascending, so window[n + 1] is still plain when window[n] is summed.
        for n in 0..window.len() - 1 {
            window[n] = window[n].wrapping_add(window[n + 1]);
        }
        if let Some(top) = window.last_mut() {
            *top = top.wrapping_add(self.seed);
        }

        info!(
            "encrypted 0x{:04X}..=0x{:04X} with seed 0x{:02X}",
            self.window.from, self.window.to, self.seed
        );
        Ok(())
    }
}
