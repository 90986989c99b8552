//! Disk protection removal for the loader image.

use std::{fmt, str::FromStr};

use tracing::info;

use crate::{
    error::{Error, Result},
    image::{MemoryImage, Span, FILLER},
};

/// Video standard of the release being patched; the two releases keep their
/// protection check at different offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Platform {
    #[default]
    Pal,
    Ntsc,
}

const PAL: &[(u16, u8)] = &[(0x25, FILLER), (0x26, FILLER), (0x27, FILLER), (0x2C, 0xD0)];
const NTSC: &[(u16, u8)] = &[(0x14, FILLER), (0x16, FILLER), (0x15, FILLER)];

impl Platform {
    /// Offset and new value of every byte to change.
    pub const fn overwrites(self) -> &'static [(u16, u8)] {
        match self {
            Self::Pal => PAL,
            Self::Ntsc => NTSC,
        }
    }

    /// Smallest image length that covers every overwrite.
    pub fn required_len(self) -> usize {
        self.overwrites()
            .iter()
            .map(|&(offset, _)| offset as usize + 1)
            .max()
            .unwrap_or(0)
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pal" => Ok(Self::Pal),
            "ntsc" => Ok(Self::Ntsc),
            _ => Err(Error::UnknownPlatform(s.to_owned())),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pal => "PAL",
            Self::Ntsc => "NTSC",
        })
    }
}

/// Apply the platform's overwrites to `image`, which must be loaded at 0 so
/// that addresses and offsets coincide.
pub fn remove_protection(image: &mut MemoryImage, platform: Platform) -> Result<Vec<Span>> {
    let spans = platform
        .overwrites()
        .iter()
        .map(|&(offset, value)| image.poke(offset, value))
        .collect::<Result<Vec<_>>>()?;
    info!("removed {} disk protection ({} bytes)", platform, spans.len());
    Ok(spans)
}
