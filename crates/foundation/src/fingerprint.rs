//! Stable content fingerprints.
//!
//! FNV-1a 64-bit over raw bytes. Deterministic and platform-independent,
//! so a fingerprint computed when an envelope is written can be checked
//! in a different process, on a different architecture, years later.
//! Not cryptographic; it guards against truncation and bit rot, not
//! adversaries.

/// FNV-1a 64-bit offset basis. Initial state of every fingerprint.
pub const FINGERPRINT_SEED: u64 = 0xcbf29ce484222325;

/// FNV-1a 64-bit prime.
const FINGERPRINT_PRIME: u64 = 0x100000001B3;

/// Mix one byte into a fingerprint state.
#[inline]
pub const fn mix(state: u64, byte: u8) -> u64 {
    (state ^ byte as u64).wrapping_mul(FINGERPRINT_PRIME)
}

/// Fingerprint a byte slice in one shot.
pub const fn fingerprint(bytes: &[u8]) -> u64 {
    let mut state = FINGERPRINT_SEED;
    let mut i = 0;
    while i < bytes.len() {
        state = mix(state, bytes[i]);
        i += 1;
    }
    state
}

/// Fingerprint a string's UTF-8 bytes.
pub const fn fingerprint_str(s: &str) -> u64 {
    fingerprint(s.as_bytes())
}

/// Streaming fingerprint over multiple fragments.
///
/// Feeding fragments one at a time produces the same value as hashing
/// their concatenation, so composite keys can be fingerprinted without
/// building an intermediate buffer.
#[derive(Debug, Clone, Copy)]
pub struct Fingerprint {
    state: u64,
}

impl Fingerprint {
    pub const fn new() -> Self {
        Self {
            state: FINGERPRINT_SEED,
        }
    }

    pub const fn update(mut self, bytes: &[u8]) -> Self {
        let mut i = 0;
        while i < bytes.len() {
            self.state = mix(self.state, bytes[i]);
            i += 1;
        }
        self
    }

    pub const fn finish(self) -> u64 {
        self.state
    }
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self::new()
    }
}
