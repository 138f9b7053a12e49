// model = "claude-opus-4-5"
// created = "2026-10-12"
// modified = "2026-10-14"
// driver = "Isaac Clayton"

//! Content hashing for comparing replica state.

use blake3::Hasher;

/// Type constant for a single live document entry.
pub const TYPE_ENTRY: u8 = 0x01;

/// Type constant for the final document digest.
pub const TYPE_DOCUMENT: u8 = 0x02;

/// A blake3 hash, 32 bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest(pub [u8; 32]);

/// Incremental digest over the live entries of a document, in order.
///
/// Paths are length-prefixed so segment boundaries are unambiguous.
pub struct StateHasher {
    hasher: Hasher,
    count: u64,
}

impl StateHasher {
    pub fn new() -> StateHasher {
        let mut hasher = Hasher::new();
        hasher.update(&[TYPE_DOCUMENT]);
        return StateHasher { hasher, count: 0 };
    }

    /// Feed one live entry.
    pub fn entry(&mut self, path: &[u32], character: char) {
        self.hasher.update(&[TYPE_ENTRY]);
        self.hasher.update(&(path.len() as u64).to_le_bytes());
        for segment in path {
            self.hasher.update(&segment.to_le_bytes());
        }
        self.hasher.update(&(character as u32).to_le_bytes());
        self.count += 1;
    }

    pub fn finish(mut self) -> Digest {
        self.hasher.update(&self.count.to_le_bytes());
        return Digest(*self.hasher.finalize().as_bytes());
    }
}

impl Default for StateHasher {
    fn default() -> Self {
        return Self::new();
    }
}

fn hex(bytes: &[u8]) -> String {
    return bytes.iter().map(|b| format!("{:02x}", b)).collect();
}

impl Digest {
    /// Lowercase hex rendering, for logs and the command line.
    pub fn to_hex(&self) -> String {
        return hex(&self.0);
    }
}

impl std::fmt::Debug for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "Digest({})", hex(&self.0));
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "{}", hex(&self.0));
    }
}
