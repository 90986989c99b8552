use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// An input image or payload is missing, unreadable or too short.
    #[error("input {name}: {reason}")]
    Input { name: String, reason: String },
    #[error("failed to write {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },
    /// A computed range falls outside the current image.
    #[error(
        "{operation} of {len} bytes at 0x{address:04X} (offset 0x{offset:X}) exceeds image of \
         {image_len} bytes"
    )]
    Bounds {
        operation: &'static str,
        address: u16,
        offset: usize,
        len: usize,
        image_len: usize,
    },
    #[error("{operation} at 0x{address:04X} lies below load address 0x{load_address:04X}")]
    AddressBelowBase {
        operation: &'static str,
        address: u16,
        load_address: u16,
    },
    #[error("scramble window 0x{from:04X}..=0x{to:04X} is reversed")]
    ReversedWindow { from: u16, to: u16 },
    #[error("unknown platform {0:?}, expected \"pal\" or \"ntsc\"")]
    UnknownPlatform(String),
}

pub type Result<T> = std::result::Result<T, Error>;
