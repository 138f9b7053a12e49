// model = "claude-opus-4-5"
// created = 2026-02-01
// modified = 2026-10-14
// driver = "Isaac Clayton"

//! Identifier types for operations and replicas.
//!
//! # Identifier Hierarchy
//!
//! - `OpId`: identifies an operation (client, counter)
//! - `Site`: a client id encoded as position segments
//!
//! # Design Decisions
//!
//! - Globally unique: a client increments its clock before every
//!   operation, so (client, counter) pairs never repeat
//! - Totally ordered: can be compared deterministically
//! - Hashable: can be used as map keys

use std::cmp::Ordering;

use smallvec::SmallVec;

/// An operation identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OpId {
    /// The client who created this operation.
    pub client_id: String,
    /// The client's clock when the operation was created.
    pub counter: u64,
}

impl OpId {
    pub fn new(client_id: impl Into<String>, counter: u64) -> OpId {
        return OpId { client_id: client_id.into(), counter };
    }
}

impl PartialOrd for OpId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        return Some(self.cmp(other));
    }
}

impl Ord for OpId {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.client_id.cmp(&other.client_id) {
            Ordering::Equal => self.counter.cmp(&other.counter),
            other => other,
        }
    }
}

/// A client id spelled out as path segments.
///
/// The id's bytes are packed big-endian, four to a segment, with the last
/// segment zero-padded. The byte length is not part of the site itself;
/// the allocator writes it as the closing segment of each position, where
/// it tells a reader how many segments the site spans.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Site {
    segments: SmallVec<[u32; 4]>,
    len: u32,
}

impl Site {
    pub fn of(client_id: &str) -> Site {
        let bytes = client_id.as_bytes();
        let segments = bytes
            .chunks(4)
            .map(|chunk| {
                let mut word = [0u8; 4];
                word[..chunk.len()].copy_from_slice(chunk);
                u32::from_be_bytes(word)
            })
            .collect();
        return Site { segments, len: u32::try_from(bytes.len()).unwrap_or(u32::MAX) };
    }

    #[inline]
    pub fn segments(&self) -> &[u32] {
        return &self.segments;
    }

    /// Byte length of the client id.
    #[inline]
    pub fn len(&self) -> u32 {
        return self.len;
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        return self.len == 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_id_ordering() {
        let a = OpId::new("alice", 1);
        let b = OpId::new("alice", 2);
        let c = OpId::new("bob", 1);

        assert!(a < b);
        assert!(a < c); // "alice" < "bob"
        assert!(b < c);
    }

    #[test]
    fn site_packs_bytes() {
        let site = Site::of("alice");
        assert_eq!(site.segments(), &[u32::from_be_bytes(*b"alic"), u32::from_be_bytes([b'e', 0, 0, 0])]);
        assert_eq!(site.len(), 5);
        assert!(Site::of("").is_empty());
    }

    #[test]
    fn sites_keep_every_byte() {
        // These two ids agree on the first bytes of their blake3 hashes.
        assert_ne!(Site::of("client-29392"), Site::of("client-107748"));
        // Zero padding alone does not make two ids equal.
        assert_ne!(Site::of("ab"), Site::of("ab\0"));
    }
}
