//! Content fingerprints used as cache keys.
//!
//! Small buffers are hashed in full with SHA-256. Buffers above
//! [`FULL_HASH_LIMIT`] bytes are fingerprinted from every line length plus a
//! strided sample of bytes, which keeps the cost flat on large files. A
//! sampled collision can only show a stale mask until the next edit clears the
//! caches; it never touches buffer text.

use sha2::{Digest, Sha256};
use std::fmt;

/// Buffers up to this many bytes are hashed in full
pub const FULL_HASH_LIMIT: usize = 64 * 1024;

/// Distance between sampled bytes for large buffers
pub const SAMPLE_STRIDE: usize = 64;

/// Hex fingerprint of buffer content (or of any other cache-key material)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ContentHash(String);

impl ContentHash {
    /// Fingerprint a buffer given as physical lines
    pub fn of_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let total: usize = lines.iter().map(|l| l.as_ref().len() + 1).sum();
        let mut hasher = Sha256::new();
        hasher.update((lines.len() as u64).to_le_bytes());
        hasher.update((total as u64).to_le_bytes());

        if total <= FULL_HASH_LIMIT {
            for line in lines {
                hasher.update(line.as_ref().as_bytes());
                hasher.update(b"\n");
            }
        } else {
            // Sample positions are global so that shifting text between lines still changes the hash
            let mut offset = 0usize;
            for line in lines {
                let bytes = line.as_ref().as_bytes();
                hasher.update((bytes.len() as u32).to_le_bytes());
                let first = (SAMPLE_STRIDE - offset % SAMPLE_STRIDE) % SAMPLE_STRIDE;
                let mut i = first;
                while i < bytes.len() {
                    hasher.update([bytes[i]]);
                    i += SAMPLE_STRIDE;
                }
                offset += bytes.len() + 1;
            }
        }

        Self::from_digest(hasher)
    }

    /// Fingerprint arbitrary bytes in full
    pub fn of_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self::from_digest(hasher)
    }

    fn from_digest(hasher: Sha256) -> Self {
        let digest = hasher.finalize();
        // 128 bits is plenty for a cache key
        let hex: String = digest[..16].iter().map(|b| format!("{:02x}", b)).collect();
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
