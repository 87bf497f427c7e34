//! Tagged records as handed out by the MPD database.
//!
//! A record is a mapping from tag name to value; a tag may carry several
//! values (multiple performers, say), which are kept in order and joined with
//! `"; "` whenever a scalar comparison needs one string. The `file` tag is a
//! record's identity: records without one are not addressable and every stage
//! of evaluation skips them.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// One tag value: a single string or an ordered sequence of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    One(String),
    Many(Vec<String>),
}

impl TagValue {
    /// Coerce to a single string, joining multiple values with `"; "`.
    pub fn coerce(&self) -> Cow<'_, str> {
        match self {
            TagValue::One(v) => Cow::Borrowed(v),
            TagValue::Many(vs) => Cow::Owned(vs.join("; ")),
        }
    }
}

/// A single tagged record. Tag names are stored lowercase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    tags: BTreeMap<String, TagValue>,
}

impl Record {
    pub fn new() -> Record {
        Record::default()
    }

    /// Convenience constructor from `(tag, value)` pairs.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Record {
        let mut record = Record::new();
        for (name, value) in pairs {
            record.push(name, *value);
        }
        record
    }

    /// Append a value for a tag. A second value for the same tag turns the
    /// entry into an ordered multi-value.
    pub fn push(&mut self, name: &str, value: impl Into<String>) {
        let name = name.to_lowercase();
        match self.tags.remove(&name) {
            None => {
                self.tags.insert(name, TagValue::One(value.into()));
            }
            Some(TagValue::One(first)) => {
                self.tags.insert(name, TagValue::Many(vec![first, value.into()]));
            }
            Some(TagValue::Many(mut vs)) => {
                vs.push(value.into());
                self.tags.insert(name, TagValue::Many(vs));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&TagValue> {
        self.tags.get(&name.to_lowercase())
    }

    /// The identifying filename, if the record has one.
    pub fn file(&self) -> Option<&str> {
        match self.tags.get("file") {
            Some(TagValue::One(v)) => Some(v),
            Some(TagValue::Many(vs)) => vs.first().map(String::as_str),
            None => None,
        }
    }

    /// Iterate over `(tag, value)` pairs in name order.
    pub fn tags(&self) -> impl Iterator<Item = (&str, &TagValue)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
