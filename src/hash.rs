const FNV_INIT: u32 = 0x811c9dc5;
const FNV_PRIME: u32 = 0x01000193;

/// Generate the FNV-1a hash of an image, used to fingerprint checkpoints so
/// that two runs can be compared without diffing the files.
///
/// # Arguments
///
/// * `value`: Raw image bytes
///
/// returns: u32
#[inline(always)]
pub const fn fnv1a(value: &[u8]) -> u32 {
    let mut hash = FNV_INIT;
    let mut i = 0;
    while i < value.len() {
        hash ^= value[i] as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}
