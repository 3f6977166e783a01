use std::collections::BTreeMap;

use serde::Serialize;

use crate::message::{Message, MessageKind};

/// Latest known field values, per message kind.
///
/// A field keeps its last value until a newer message carries it again, so
/// a screen keeps showing stale data when a frame is lost to overflow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    kinds: BTreeMap<String, BTreeMap<String, String>>,
    updates: u64,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a message's fields. Returns the number of fields written.
    pub fn apply(&mut self, message: &Message) -> usize {
        let entry = self
            .kinds
            .entry(message.kind().as_str().to_string())
            .or_default();
        let mut written = 0;
        for (key, value) in message.fields() {
            entry.insert(key.to_string(), value.to_string());
            written += 1;
        }
        self.updates += 1;
        written
    }

    /// Latest value of `key` for messages of `kind`.
    pub fn get(&self, kind: &MessageKind, key: &str) -> Option<&str> {
        self.kinds
            .get(kind.as_str())
            .and_then(|fields| fields.get(key))
            .map(String::as_str)
    }

    /// All fields seen for `kind`, sorted by key.
    pub fn fields(&self, kind: &MessageKind) -> impl Iterator<Item = (&str, &str)> {
        self.kinds
            .get(kind.as_str())
            .into_iter()
            .flat_map(|fields| fields.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    /// Every `(kind, key, value)` entry, grouped by kind.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.kinds.iter().flat_map(|(kind, fields)| {
            fields
                .iter()
                .map(move |(k, v)| (kind.as_str(), k.as_str(), v.as_str()))
        })
    }

    /// Number of messages applied.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// True until a message is applied, or after `clear`.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn clear(&mut self) {
        self.kinds.clear();
        self.updates = 0;
    }
}
