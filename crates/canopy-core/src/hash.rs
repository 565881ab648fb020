//! Hashing primitives behind structural change detection.
//!
//! Every virtual node carries a 64-bit structural hash folded together from
//! its type, its properties and its children. Two nodes with equal hashes are
//! treated as producing identical output, so the fold has to be deterministic
//! for the lifetime of the process. Cross-process stability is not required.

use core::hash::Hash;
use std::hash::Hasher;

#[cfg(feature = "std-hash")]
pub mod default {
    pub use std::collections::hash_map::DefaultHasher;

    #[inline]
    pub fn new() -> DefaultHasher {
        DefaultHasher::new()
    }
}

#[cfg(not(feature = "std-hash"))]
pub mod default {
    pub use ahash::AHasher as DefaultHasher;

    #[inline]
    pub fn new() -> DefaultHasher {
        DefaultHasher::default()
    }
}

/// Seed used for property-hash accumulation.
pub const SEED: u64 = 5381;

/// convenience: hash a single value with whichever default is active
#[inline]
pub fn hash_one<T: Hash + ?Sized>(v: &T) -> u64 {
    let mut h = default::new();
    v.hash(&mut h);
    h.finish()
}

/// Folds `value` into `acc` as `acc * 33 + value`, wrapping on overflow.
#[inline]
pub fn fold(acc: u64, value: u64) -> u64 {
    acc.wrapping_add(acc.wrapping_shl(5)).wrapping_add(value)
}

/// Combines an identity hash with a payload hash as `(identity << 5) + payload`.
///
/// Used for a property entry (path, value) and for a node (type, properties).
#[inline]
pub fn combine(identity: u64, payload: u64) -> u64 {
    identity.wrapping_shl(5).wrapping_add(payload)
}
