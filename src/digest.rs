//! Digest: maps a key to the 32-bit value used for bucket selection.

/// FNV-1a 32-bit offset basis.
pub const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
/// FNV-1a 32-bit prime.
pub const FNV_PRIME: u32 = 0x0100_0193;

/// Fast, deterministic, non-cryptographic FNV-1a over `bytes`.
#[inline]
pub fn fnv1a(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
        (hash ^ u32::from(b)).wrapping_mul(FNV_PRIME)
    })
}

/// Hash function used by a [`ChainMap`](crate::ChainMap) to pick a bucket.
///
/// The bucket index of a key is `digest(key) % capacity`. Implementations
/// must be pure: the same bytes always produce the same value for the
/// lifetime of a table, otherwise entries become unreachable.
pub trait Digest {
    fn digest(&self, key: &[u8]) -> u32;
}

/// Default digest: 32-bit FNV-1a.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Fnv1a;

impl Digest for Fnv1a {
    #[inline]
    fn digest(&self, key: &[u8]) -> u32 {
        fnv1a(key)
    }
}

impl<D: Digest + ?Sized> Digest for &D {
    #[inline]
    fn digest(&self, key: &[u8]) -> u32 {
        (**self).digest(key)
    }
}
