//! Patch engine for scrambled Commodore 64 program images.
//!
//! An image is descrambled with a [`ScrambleCodec`], edited by a
//! [`PatchScript`] and scrambled again with the same codec.

pub mod address;
pub mod codec;
pub mod error;
pub mod hash;
pub mod image;
pub mod patch;
pub mod protection;
pub mod script;

pub use address::AddressMap;
pub use codec::{ScrambleCodec, ScrambleWindow};
pub use error::{Error, Result};
pub use image::{MemoryImage, Span, FILLER};
pub use patch::Patch;
pub use protection::{remove_protection, Platform};
pub use script::{BlobSource, PatchScript};
