//! Raw map elements as handed over by the upstream source-format parser.

use serde::{Deserialize, Serialize};

/// Geometric kind of an element.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Point,
    Line,
    Area,
}

/// A single key/value pair describing one property of an element.
///
/// A tag is "cleared" by emptying both strings in place. Cleared tags stay in
/// the sequence so the positions of the remaining tags never shift.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

/// One input map object with its ordered tag sequence.
///
/// Tag order is significant: rule precedence and matching tie-breaks both
/// follow it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(default)]
    pub id: i64,
    pub kind: ElementKind,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Element {
    pub fn new(kind: ElementKind) -> Self {
        Element {
            id: 0,
            kind,
            tags: Vec::new(),
        }
    }

    pub fn add_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.push(Tag {
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut [Tag] {
        &mut self.tags
    }
}
