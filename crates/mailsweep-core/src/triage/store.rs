//! In-memory message store partitioned by triage bucket.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::{debug, warn};

use super::model::{Bucket, Message, MessageId, Section};
use crate::{Error, Result};

/// Categorized messages returned by the classification service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Categorized {
    /// Messages suggested for deletion.
    pub to_delete: Vec<Message>,
    /// Important messages.
    pub important: Vec<Message>,
}

/// Aggregate counts derived from the store's partition.
///
/// `total` counts categorized messages only (`to_delete + important`);
/// messages awaiting classification are reported in `unclassified`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Number of categorized messages.
    pub total: usize,
    /// Number of messages suggested for deletion.
    pub to_delete: usize,
    /// Number of important messages.
    pub important: usize,
    /// Number of messages not yet categorized.
    pub unclassified: usize,
}

/// Messages keyed by id, in the order they were first seen.
///
/// Every message lives in exactly one bucket, so the display sections and
/// the counts are projections of a single map and can never disagree.
#[derive(Debug, Clone, Default)]
pub struct EmailStore {
    messages: IndexMap<MessageId, Message>,
}

impl EmailStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the entire store content.
    ///
    /// # Errors
    ///
    /// Returns `InvalidData` if any message lacks an id. The store is left
    /// unchanged in that case.
    pub fn load(&mut self, messages: Vec<Message>) -> Result<()> {
        validate_ids(&messages)?;

        let mut loaded = IndexMap::with_capacity(messages.len());
        for message in messages {
            loaded.insert(message.id.clone(), message);
        }
        debug!("Loaded {} messages into store", loaded.len());
        self.messages = loaded;
        Ok(())
    }

    /// Upserts categorized messages and assigns their buckets.
    ///
    /// Messages absent from both lists keep their prior state. An id present
    /// in both lists ends up `Important`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidData` if any message lacks an id. Nothing is merged in
    /// that case.
    pub fn merge(&mut self, categorized: Categorized) -> Result<()> {
        validate_ids(&categorized.to_delete)?;
        validate_ids(&categorized.important)?;

        let important: HashSet<&MessageId> = categorized.important.iter().map(|m| &m.id).collect();
        for message in &categorized.to_delete {
            if important.contains(&message.id) {
                warn!(
                    "Message {} classified as both important and to-delete, keeping it important",
                    message.id
                );
            }
        }

        let Categorized {
            to_delete,
            important,
        } = categorized;
        for message in to_delete {
            self.upsert(message, Bucket::ToDelete);
        }
        for message in important {
            self.upsert(message, Bucket::Important);
        }
        Ok(())
    }

    fn upsert(&mut self, mut message: Message, bucket: Bucket) {
        message.bucket = bucket;
        self.messages.insert(message.id.clone(), message);
    }

    /// Removes a message. Removing an absent id is a no-op.
    pub fn remove(&mut self, id: &MessageId) -> Option<Message> {
        self.messages.shift_remove(id)
    }

    /// Removes every message.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Looks up a message by id.
    #[must_use]
    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.get(id)
    }

    /// Returns `true` if the store holds `id`.
    #[must_use]
    pub fn contains(&self, id: &MessageId) -> bool {
        self.messages.contains_key(id)
    }

    /// Number of messages in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Iterates over every message in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.values()
    }

    /// Iterates over the messages of one bucket.
    pub fn bucket(&self, bucket: Bucket) -> impl Iterator<Item = &Message> {
        self.messages.values().filter(move |m| m.bucket == bucket)
    }

    /// Iterates over the messages of one display section.
    pub fn section(&self, section: Section) -> impl Iterator<Item = &Message> {
        self.messages
            .values()
            .filter(move |m| section.includes(m.bucket))
    }

    /// Ids of the messages in one display section.
    #[must_use]
    pub fn section_ids(&self, section: Section) -> Vec<MessageId> {
        self.section(section).map(|m| m.id.clone()).collect()
    }

    /// Clones every message, in insertion order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Message> {
        self.messages.values().cloned().collect()
    }

    /// Computes the aggregate counts from the current partition.
    #[must_use]
    pub fn derived_stats(&self) -> Stats {
        let mut stats = Stats::default();
        for message in self.messages.values() {
            match message.bucket {
                Bucket::ToDelete => stats.to_delete += 1,
                Bucket::Important => stats.important += 1,
                Bucket::Unclassified => stats.unclassified += 1,
            }
        }
        stats.total = stats.to_delete + stats.important;
        stats
    }
}

/// Rejects any message without an id.
pub(crate) fn validate_ids(messages: &[Message]) -> Result<()> {
    match messages.iter().position(|m| m.id.is_empty()) {
        Some(index) => Err(Error::InvalidData(format!(
            "message at position {index} has no id"
        ))),
        None => Ok(()),
    }
}
