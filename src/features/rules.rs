//! Table-driven tag rules.
//!
//! Preprocessing, address extraction and post-classification refinement all
//! share this one interpreter: a rule binds a tag key and a value pattern to
//! an action. Tags are scanned in stored order and, per tag, rules in table
//! order, so action invocation order is reproducible from the two orderings.

use crate::element::Element;

/// Value patterns a rule can match against.
#[derive(Copy, Clone, Debug)]
pub enum Pattern<'t> {
    /// Take any value
    Any,

    /// Take only negative values
    Negative,

    /// Take only affirmative values
    Affirmative,

    /// Take exactly this value
    Exact(&'t str),
}

/// The literals counting as negative for [`Pattern::Negative`] and
/// [`Pattern::Affirmative`].
pub fn is_negative(value: &str) -> bool {
    matches!(value, "no" | "none" | "false")
}

impl Pattern<'_> {
    fn matches(&self, value: &str) -> bool {
        match self {
            Pattern::Any => true,
            Pattern::Negative => is_negative(value),
            Pattern::Affirmative => !is_negative(value),
            Pattern::Exact(exact) => value == *exact,
        }
    }
}

/// One table entry. The action gets the shared context plus the tag's key and
/// value, which it may rewrite or clear in place.
pub struct Rule<'t, C> {
    pub key: &'t str,
    pub pattern: Pattern<'t>,
    pub action: fn(&mut C, &mut String, &mut String),
}

/// Run a rule table over an element's tags.
///
/// The tag filter deliberately does not apply here: negative-pattern rules
/// must be able to see tags like `foot=no`.
pub fn apply<C>(element: &mut Element, ctx: &mut C, rules: &[Rule<C>]) {
    for tag in element.tags_mut() {
        for rule in rules {
            if tag.key != rule.key {
                continue;
            }
            if rule.pattern.matches(&tag.value) {
                (rule.action)(ctx, &mut tag.key, &mut tag.value);
            }
        }
    }
}
