//! Extraction of `name`/`name:<lang>`/`int_name` tags into the per-language
//! name mapping.

use unicode_normalization::UnicodeNormalization;

use crate::element::Element;
use crate::features::filter;
use crate::features::params::FeatureParams;

/// Pull all name tags out of `element` into `params.names`.
///
/// Handled tags are cleared in place so the type matcher never sees them.
/// The first occurrence per language wins; later duplicates are left
/// untouched. Runs once per element, before type matching.
pub fn extract_names(element: &mut Element, params: &mut FeatureParams) {
    filter::for_each_tag::<()>(element, |key, value| {
        if value.is_empty() {
            return None;
        }
        let Some(lang) = lang_by_key(key) else {
            return None;
        };
        if params.has_name(&lang) {
            return None;
        }

        // Unicode Compatibility Decomposition, followed by Canonical
        // Composition (NFKC). Needed for better search matching.
        let normalized: String = value.nfkc().collect();
        params.add_name(lang, normalized);

        key.clear();
        value.clear();
        None
    });
}

/// Map a tag key onto the language code it names, if any.
fn lang_by_key(key: &str) -> Option<String> {
    let mut tokens = key
        .split(['\t', ' ', ':'])
        .filter(|token| !token.is_empty());

    let first = tokens.next()?;

    // this is an international (latin) name
    if first == "int_name" {
        return Some("int_name".to_string());
    }
    if first != "name" {
        return None;
    }

    let lang = tokens.next().unwrap_or("default");

    // replace the dummy arabian code with the correct one
    Some(if lang == "ar1" { "ar" } else { lang }.to_string())
}
