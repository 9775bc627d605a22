//! The greedy tree matching at the heart of classification.
//!
//! Repeatedly finds a maximal root-to-node path through the classification
//! tree consistent with the element's remaining tags, packs each completed
//! path into a type code and keeps the drawable ones. A tag is consumed by at
//! most one path, even when the path's code is later discarded.

use std::collections::BTreeSet;

use smallvec::SmallVec;

use crate::classificator::draw::DrawRules;
use crate::classificator::{code, ClassifNode, ClassifTree, NodeRef};
use crate::element::Element;
use crate::features::filter;
use crate::features::params::FeatureParams;

type Path<'t> = SmallVec<[NodeRef<'t>; code::MAX_DEPTH]>;

/// Assign all matching type codes of `element` to `params`.
pub fn match_types(
    element: &Element,
    params: &mut FeatureParams,
    tree: &ClassifTree,
    draw: &impl DrawRules,
) {
    let mut used = BTreeSet::new();

    loop {
        let mut path = Path::new();

        // find the first root child matching a tag's key
        let root = tree.root();
        if filter::for_each_unused_tag(element, &mut used, |key, value| {
            descend(root, key, value, &mut path)
        })
        .is_none()
        {
            break;
        }
        assert!(!path.is_empty(), "a started match path cannot be empty");

        loop {
            // continue the path from its last node
            let current = *path.last().expect("the path only ever grows");

            // the next level is matched by value first
            let by_value = filter::for_each_unused_tag(element, &mut used, |key, value| {
                if !need_match_value(key, value) {
                    return None;
                }
                current.node.find(value)
            });
            if let Some(child) = by_value {
                path.push(child);
                continue;
            }

            // if there is none, try by key (in case of k = "area", v = "yes")
            if filter::for_each_unused_tag(element, &mut used, |key, value| {
                descend(current.node, key, value, &mut path)
            })
            .is_none()
            {
                break;
            }
        }

        let mut packed = code::empty();
        for step in &path {
            code::push(&mut packed, step.index);
        }

        // keep only types with drawing rules; the consumed tags stay consumed
        // either way
        if draw.is_drawable(packed) {
            log::debug!(
                "element {} matched {}",
                element.id,
                tree.readable_name(packed).as_deref().unwrap_or("?")
            );
            params.add_type(packed);
        }
    }
}

/// Match a tag against `current`'s children: first by key and, if the value
/// may be matched at all, one further level by value.
fn descend<'t>(
    current: &'t ClassifNode,
    key: &str,
    value: &str,
    path: &mut Path<'t>,
) -> Option<()> {
    let child = current.find(key)?;
    path.push(child);

    if need_match_value(key, value) {
        if let Some(grandchild) = child.node.find(value) {
            path.push(grandchild);
        }
    }
    Some(())
}

/// Bare numbers only classify under "capital" and "admin_level".
///
/// NOTE: a new tree entry with a numeric name under any other key also needs
/// its key added here, otherwise the matcher will never reach it.
fn need_match_value(key: &str, value: &str) -> bool {
    !is_number(value) || key == "admin_level" || key == "capital"
}

fn is_number(value: &str) -> bool {
    value.parse::<i64>().is_ok()
}
