//! Content-addressed cache keys for list/read requests.
//!
//! A [`CacheKey`] is a SHA-256 digest derived deterministically from the
//! fields of a normalized filter request. Equal requests yield equal keys;
//! any differing field yields, with overwhelming probability, a different
//! key. The [`KeyEncoder`] feeds each field into the digest with a
//! length prefix so that adjacent variable-length fields can never alias
//! one another (e.g. tags `["ab", "c"]` vs `["a", "bc"]`).

use core::fmt;

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// A 256-bit content digest identifying a normalized filter request.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({})", hex::encode(self.0))
    }
}

/// Incremental builder for a [`CacheKey`].
///
/// Fields must be fed in a fixed order for a given request type; the
/// encoder makes no attempt to tag fields by name.
#[derive(Default)]
pub struct KeyEncoder {
    hasher: Sha256,
}

impl KeyEncoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn prefix(&mut self, len: usize) {
        // usize is platform-dependent; clamp through u32 like the wire side.
        let len = u32::try_from(len).unwrap_or(u32::MAX);
        self.hasher.update(len.to_be_bytes());
    }

    /// Encode a list of UUIDs (count prefix, then 16 raw bytes each).
    pub fn uuids<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = Uuid>,
        I::IntoIter: ExactSizeIterator,
    {
        let iter = ids.into_iter();
        self.prefix(iter.len());
        for id in iter {
            self.hasher.update(id.as_bytes());
        }
    }

    /// Encode a list of strings (count prefix, then each string with its
    /// own length prefix).
    pub fn strings<'a, I>(&mut self, values: I)
    where
        I: IntoIterator<Item = &'a str>,
        I::IntoIter: ExactSizeIterator,
    {
        let iter = values.into_iter();
        self.prefix(iter.len());
        for value in iter {
            self.prefix(value.len());
            self.hasher.update(value.as_bytes());
        }
    }

    /// Encode a tri-state boolean filter (absent, false, true).
    pub fn optional_bool(&mut self, value: Option<bool>) {
        let tag: u8 = match value {
            Some(false) => 0,
            Some(true) => 1,
            None => 2,
        };
        self.hasher.update([tag]);
    }

    /// Encode a fixed-width integer field (limit, offset).
    pub fn u32(&mut self, value: u32) {
        self.hasher.update(value.to_be_bytes());
    }

    /// Finalize the digest.
    #[must_use]
    pub fn finish(self) -> CacheKey {
        CacheKey(self.hasher.finalize().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_input_yields_identical_key() {
        let build = || {
            let mut enc = KeyEncoder::new();
            enc.uuids([Uuid::from_u128(7)]);
            enc.strings(["red", "blue"]);
            enc.optional_bool(Some(true));
            enc.u32(10);
            enc.u32(0);
            enc.finish()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn differing_offset_yields_different_key() {
        let build = |offset: u32| {
            let mut enc = KeyEncoder::new();
            enc.u32(10);
            enc.u32(offset);
            enc.finish()
        };
        assert_ne!(build(0), build(10));
    }

    #[test]
    fn string_boundaries_do_not_alias() {
        let build = |tags: &[&str]| {
            let mut enc = KeyEncoder::new();
            enc.strings(tags.iter().copied());
            enc.finish()
        };
        assert_ne!(build(&["ab", "c"]), build(&["a", "bc"]));
    }

    #[test]
    fn absent_and_false_bool_differ() {
        let build = |v: Option<bool>| {
            let mut enc = KeyEncoder::new();
            enc.optional_bool(v);
            enc.finish()
        };
        assert_ne!(build(None), build(Some(false)));
        assert_ne!(build(Some(true)), build(Some(false)));
    }
}
