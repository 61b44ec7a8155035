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
    use std::hash::BuildHasher;

    use ahash::RandomState;

    pub type DefaultHasher = ahash::AHasher;

    // Fixed seeds: scope keys must hash identically on every build thread.
    #[inline]
    pub fn new() -> DefaultHasher {
        RandomState::with_seeds(0x5c0e, 0xb11d, 0x6e7e, 0x4a1e).build_hasher()
    }
}

/// convenience: hash a single value with whichever default is active
#[inline]
pub fn hash_one<T: Hash + ?Sized>(v: &T) -> u64 {
    let mut h = default::new();
    v.hash(&mut h);
    h.finish()
}
