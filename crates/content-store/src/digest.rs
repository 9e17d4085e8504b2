//! 64-bit FNV-1a digests rendered as fixed-width hex

const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const PRIME: u64 = 0x00000100000001b3;

/// Digest of an arbitrary byte sequence as 16 lowercase hex digits
pub fn digest(input: impl AsRef<[u8]>) -> String {
    let hash = input.as_ref().iter().fold(OFFSET_BASIS, |acc, byte| {
        (acc ^ u64::from(*byte)).wrapping_mul(PRIME)
    });
    format!("{:016x}", hash)
}

pub fn digest_str(input: &str) -> String {
    digest(input.as_bytes())
}
