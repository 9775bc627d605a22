//! Decides which tags are eligible for interpretation at all and provides the
//! filtered iteration the name extractor and type matcher are built on.

use std::collections::BTreeSet;

use crate::element::Element;

/// A tag asserting the absence of a property must not drive classification.
const NEGATIVE_VALUES: [&str; 3] = ["no", "false", "-1"];

/// Keys with a fixed filtering decision, checked before the value.
///
/// `true` rejects the key unconditionally, `false` accepts it even with a
/// negative value.
const PROCESSED_KEYS: [(&str, bool); 6] = [
    ("description", true),
    // [highway=primary][cycleway=lane] would otherwise match as [highway=cycleway]
    ("cycleway", true),
    // [highway=proposed][proposed=primary] would otherwise match as [highway=primary]
    ("proposed", true),
    // [highway=primary][construction=primary] would otherwise match as [highway=construction]
    ("construction", true),
    // process in any case
    ("layer", false),
    ("oneway", false),
];

/// Should this tag be hidden from interpretation?
pub fn ignore(key: &str, value: &str) -> bool {
    if key.is_empty() {
        return true;
    }

    for (fixed, ignored) in PROCESSED_KEYS {
        if key == fixed {
            return ignored;
        }
    }

    NEGATIVE_VALUES.contains(&value)
}

/// Run `to_do` over every admitted tag, mutably, short-circuiting on `Some`.
///
/// The callback may rewrite or clear the tag in place; cleared tags fail the
/// filter on any later pass.
pub fn for_each_tag<R>(
    element: &mut Element,
    mut to_do: impl FnMut(&mut String, &mut String) -> Option<R>,
) -> Option<R> {
    for tag in element.tags_mut() {
        if ignore(&tag.key, &tag.value) {
            continue;
        }
        if let Some(res) = to_do(&mut tag.key, &mut tag.value) {
            return Some(res);
        }
    }
    None
}

/// Like [`for_each_tag`], but also skips positions already in `used` and any
/// key containing `name` (names never drive classification). The position of
/// a tag the callback accepts is added to `used` before short-circuiting.
pub fn for_each_unused_tag<R>(
    element: &Element,
    used: &mut BTreeSet<usize>,
    mut to_do: impl FnMut(&str, &str) -> Option<R>,
) -> Option<R> {
    for (position, tag) in element.tags().iter().enumerate() {
        if ignore(&tag.key, &tag.value) || used.contains(&position) {
            continue;
        }
        if tag.key.contains("name") {
            used.insert(position);
            continue;
        }
        if let Some(res) = to_do(&tag.key, &tag.value) {
            used.insert(position);
            return Some(res);
        }
    }
    None
}
