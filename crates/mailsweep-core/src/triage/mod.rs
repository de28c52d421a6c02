//! Triage state: messages, buckets and selection.
//!
//! This module provides:
//! - **Messages**: The [`Message`] model and its [`Bucket`] label
//! - **Store**: [`EmailStore`], the id-keyed collection and its derived [`Stats`]
//! - **Selection**: [`SelectionSet`], the ids marked for a bulk action
//!
//! # Invariants
//!
//! 1. Each message is in exactly one bucket, so the sections never overlap
//! 2. Stats are recomputed from the partition on every call, never cached
//! 3. A selection only ever names ids present in the collection it selects
//!    from; callers prune it after every removal

mod model;
mod selection;
mod store;

pub use model::{Bucket, Message, MessageId, Section};
pub use selection::SelectionSet;
pub use store::{Categorized, EmailStore, Stats};
