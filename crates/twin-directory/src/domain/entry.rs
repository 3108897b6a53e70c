//! The replicated payload each owner publishes into the store.

use crate::domain::signature::TopicSignature;
use serde::{Deserialize, Serialize};
use shared_types::SubscriberRef;
use std::collections::BTreeSet;

/// One node's advertised interest set.
///
/// Replaced wholesale on every flush; remote nodes never mutate it. The
/// signature answers "could this node care about topic T" and the
/// subscriber set tells a remote router whom to address when probing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Compressed encoding of the owner's topic filters.
    pub signature: TopicSignature,
    /// Subscribers alive on the owner at flush time.
    pub subscribers: BTreeSet<SubscriberRef>,
}

impl DirectoryEntry {
    pub fn new(signature: TopicSignature, subscribers: BTreeSet<SubscriberRef>) -> Self {
        Self {
            signature,
            subscribers,
        }
    }
}
