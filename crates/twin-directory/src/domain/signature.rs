//! Topic signature codec.
//!
//! Compresses the set of topics a node is interested in into a
//! fixed-width bit vector for cheap replication and existence probing.
//!
//! Invariants:
//! - a signature is a safe over-approximation: `may_match` never returns
//!   false for a topic some local filter matches (no false negatives);
//! - bits are only ever OR-ed in, or the whole signature is replaced by a
//!   full resync; bits never clear incrementally;
//! - there is no decode: the signature never expands back into topic
//!   strings, it only answers "could anyone on this node care?".

use crate::domain::hash_positions::bit_positions;
use bitvec::prelude::*;
use serde::{Deserialize, Serialize};
use shared_types::{TopicFilter, TopicPath};

/// Width and hash count of every signature in the cluster.
///
/// All members must agree on these; two signatures with different
/// parameters never merge (the generation counter picks one wholesale).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureParams {
    /// Bits in the filter (m). Multiple of 8.
    pub width_bits: usize,
    /// Hash functions per key (k).
    pub hash_count: usize,
}

impl Default for SignatureParams {
    fn default() -> Self {
        // Sized for tens of topic prefixes per node at a few percent
        // false-positive probe rate.
        Self {
            width_bits: 1024,
            hash_count: 4,
        }
    }
}

/// Compressed encoding of a node's subscribed topic set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSignature {
    /// Bit array storing the filter state.
    #[serde(with = "bitvec_serde")]
    bits: BitVec<u8, Lsb0>,
    /// Number of hash functions (k).
    hash_count: usize,
}

/// Serde support for BitVec.
mod bitvec_serde {
    use bitvec::prelude::*;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(bits: &BitVec<u8, Lsb0>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let bytes: Vec<u8> = bits.as_raw_slice().to_vec();
        (bytes, bits.len()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BitVec<u8, Lsb0>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (bytes, len): (Vec<u8>, usize) = Deserialize::deserialize(deserializer)?;
        let mut bits = BitVec::<u8, Lsb0>::from_vec(bytes);
        bits.truncate(len);
        Ok(bits)
    }
}

impl TopicSignature {
    /// An empty signature: matches nothing.
    pub fn empty(params: &SignatureParams) -> Self {
        Self {
            bits: bitvec![u8, Lsb0; 0; params.width_bits],
            hash_count: params.hash_count,
        }
    }

    /// Encode a set of subscription filters.
    ///
    /// Deterministic and order-independent. Each filter contributes the
    /// literal prefix before its first wildcard; a filter with a leading
    /// wildcard has no usable prefix and saturates the signature instead,
    /// which keeps it an over-approximation (the node becomes a candidate
    /// for every topic).
    pub fn encode<'a>(
        filters: impl IntoIterator<Item = &'a TopicFilter>,
        params: &SignatureParams,
    ) -> Self {
        let mut signature = Self::empty(params);
        for filter in filters {
            match filter.signature_key() {
                Some(key) => signature.insert(&key),
                None => {
                    signature.saturate();
                    break;
                }
            }
        }
        signature
    }

    /// OR one key into the filter.
    fn insert(&mut self, key: &str) {
        for position in bit_positions(key, self.hash_count, self.bits.len()) {
            self.bits.set(position, true);
        }
    }

    /// Set every bit: the signature now matches all topics.
    fn saturate(&mut self) {
        self.bits.fill(true);
    }

    /// Test whether some subscriber behind this signature could match the
    /// topic.
    ///
    /// Probes the topic and every prefix of it, so prefix and wildcard
    /// subscriptions stay covered. Returns false only when certain no
    /// subscriber matches (guaranteed true negative); true is a
    /// candidate, possibly a false positive. A false positive costs one
    /// wasted remote lookup, never a correctness error.
    pub fn may_match(&self, topic: &TopicPath) -> bool {
        topic.prefixes().any(|prefix| self.contains(&prefix))
    }

    fn contains(&self, key: &str) -> bool {
        bit_positions(key, self.hash_count, self.bits.len())
            .into_iter()
            .all(|position| self.bits[position])
    }

    pub fn width_bits(&self) -> usize {
        self.bits.len()
    }

    pub fn hash_count(&self) -> usize {
        self.hash_count
    }

    pub fn bits_set(&self) -> usize {
        self.bits.count_ones()
    }
}
