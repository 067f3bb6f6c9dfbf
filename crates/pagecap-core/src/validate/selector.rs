//! Selector heuristics

use regex::Regex;
use std::sync::LazyLock;

/// One compound selector built only from a tag, an id and structural
/// pseudo-classes, e.g. `ul#nav`, `li:nth-child(2)`, `#main`, `body`.
static STATIC_COMPOUND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[A-Za-z][A-Za-z0-9-]*|\*)?(?:#[A-Za-z_][\w-]*)?(?::(?:first-child|last-child|only-child|first-of-type|last-of-type|only-of-type|root|nth-child\(\d+\)|nth-of-type\(\d+\)|nth-last-child\(\d+\)))*$",
    )
    .expect("Invalid regex")
});

/// Whether a selector is provably present once the document is attached.
///
/// Bare tags, fixed ids and structural selectors joined by descendant, child
/// or sibling combinators qualify. Classes, attributes and text engines do
/// not: they usually target content rendered after load.
#[must_use]
pub fn is_static_selector(selector: &str) -> bool {
    let selector = selector.trim();
    if selector.is_empty() {
        return false;
    }

    selector.split(',').all(|group| {
        let normalized = group.replace(['>', '+', '~'], " ");
        let mut compounds = normalized.split_whitespace().peekable();
        compounds.peek().is_some() && compounds.all(|c| STATIC_COMPOUND.is_match(c))
    })
}
