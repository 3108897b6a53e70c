//! Entry records and the pure merge function.
//!
//! This module is transport-free on purpose: the whole correctness story
//! of the store rests on `merge_record` being commutative, associative,
//! and idempotent, and that is testable here without a live cluster.

use serde::{Deserialize, Serialize};
use shared_types::NodeAddress;
use std::collections::BTreeMap;

/// A value stamped with its owner's generation counter.
///
/// The owner bumps the generation on every coalesced write, so for a
/// given owner the generation totally orders that owner's own writes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub generation: u64,
    pub value: T,
}

impl<T> Versioned<T> {
    pub fn new(generation: u64, value: T) -> Self {
        Self { generation, value }
    }
}

/// The unit stored per `(shard, owner)` slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryRecord<T> {
    /// The owner's current entry.
    Live(Versioned<T>),
    /// The owner's entry was removed. Carries the generation it dominates:
    /// any put with `generation <= this` stays suppressed, any strictly
    /// newer put from the true owner revives the slot.
    Tombstone { generation: u64 },
}

impl<T> EntryRecord<T> {
    pub fn generation(&self) -> u64 {
        match self {
            EntryRecord::Live(v) => v.generation,
            EntryRecord::Tombstone { generation } => *generation,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, EntryRecord::Live(_))
    }

    pub fn as_live(&self) -> Option<&Versioned<T>> {
        match self {
            EntryRecord::Live(v) => Some(v),
            EntryRecord::Tombstone { .. } => None,
        }
    }
}

/// Per-shard map from owner address to its record.
pub type EntryMap<T> = BTreeMap<NodeAddress, EntryRecord<T>>;

/// Merge two records for the same owner.
///
/// Rules, in order:
/// 1. higher generation wins;
/// 2. equal generations: a tombstone dominates a live record;
/// 3. equal generations, same kind: keep the left operand (records from
///    the same owner at the same generation are identical by the
///    single-writer discipline, so the choice is immaterial).
pub fn merge_record<T: Clone>(a: &EntryRecord<T>, b: &EntryRecord<T>) -> EntryRecord<T> {
    match a.generation().cmp(&b.generation()) {
        std::cmp::Ordering::Greater => a.clone(),
        std::cmp::Ordering::Less => b.clone(),
        std::cmp::Ordering::Equal => {
            if !b.is_live() {
                b.clone()
            } else {
                a.clone()
            }
        }
    }
}

/// Merge `from` into `into`: union of owners, `merge_record` per owner.
pub fn merge_maps<T: Clone>(into: &mut EntryMap<T>, from: &EntryMap<T>) {
    for (owner, record) in from {
        match into.get(owner) {
            Some(existing) => {
                let merged = merge_record(existing, record);
                into.insert(owner.clone(), merged);
            }
            None => {
                into.insert(owner.clone(), record.clone());
            }
        }
    }
}
