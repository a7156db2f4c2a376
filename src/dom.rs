//! The small slice of tree querying the resolution pipeline relies on:
//! attributes, parent, closest ancestor, descendant search and tag name.

use crate::error::ResolveError;
use scraper::{ElementRef, Selector};

/// Parse a CSS selector, keeping the offending text in the error.
pub fn selector(css: &str) -> Result<Selector, ResolveError> {
    Selector::parse(css).map_err(|e| ResolveError::InvalidSelector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

pub fn attr<'a>(element: ElementRef<'a>, name: &str) -> Option<&'a str> {
    element.value().attr(name)
}

pub fn tag_name(element: ElementRef<'_>) -> String {
    element.value().name().to_ascii_lowercase()
}

pub fn parent_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.parent().and_then(ElementRef::wrap)
}

/// The element itself followed by its element ancestors, nearest first.
pub fn self_and_ancestors(element: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    std::iter::successors(Some(element), |e| parent_element(*e))
}

/// Nearest inclusive ancestor matching `selector`.
pub fn closest<'a>(element: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    self_and_ancestors(element).find(|e| selector.matches(e))
}

/// Whether `node` is `container` or sits somewhere underneath it.
pub fn contains(container: ElementRef<'_>, node: ElementRef<'_>) -> bool {
    self_and_ancestors(node).any(|e| e.id() == container.id())
}

pub fn same_element(a: ElementRef<'_>, b: ElementRef<'_>) -> bool {
    a.id() == b.id()
}

pub fn child_elements(element: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    element.children().filter_map(ElementRef::wrap)
}

/// Descendants of `scope` matching `selector`, skipping anything that sits
/// inside a nested element matching one of `nested`. `scope` itself is never
/// treated as nested.
pub fn select_outside<'a>(
    scope: ElementRef<'a>,
    selector: &Selector,
    nested: &[Selector],
) -> Vec<ElementRef<'a>> {
    scope
        .select(selector)
        .filter(|found| {
            !self_and_ancestors(*found)
                .take_while(|e| !same_element(*e, scope))
                .any(|e| nested.iter().any(|s| s.matches(&e)))
        })
        .collect()
}

/// Outermost element of the tree `element` lives in.
pub fn root_element(element: ElementRef<'_>) -> ElementRef<'_> {
    self_and_ancestors(element).last().unwrap_or(element)
}
