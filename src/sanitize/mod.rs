//! Allow-list HTML sanitization.
//!
//! Two profiles exist: [`Profile::save`] keeps everything chip markup needs
//! to round-trip (data attributes, inline style, a small SVG subset for the
//! icons), while [`Profile::external_paste`] is the conservative profile for
//! arbitrary clipboard input. Sanitization never fails: unknown tags are
//! unwrapped, dangerous subtrees and unknown attributes are dropped.

use crate::dom::{Dom, NodeId, parse_fragment};
use std::collections::HashSet;
use tracing::debug;

/// Tags both profiles accept: ordinary formatted-text markup.
const BASE_TAGS: &[&str] = &[
    "a", "abbr", "b", "blockquote", "br", "code", "div", "em", "h1", "h2", "h3", "h4", "h5", "h6",
    "hr", "i", "li", "ol", "p", "pre", "s", "small", "span", "strong", "sub", "sup", "u", "ul",
];

/// Extra tags the save profile accepts; chip markup embeds SVG iconography
/// and an optional icon image.
const SAVE_EXTRA_TAGS: &[&str] = &["svg", "path", "rect", "g", "img"];

/// Subtrees removed outright rather than unwrapped; their text content must
/// not leak into the document.
const DROP_SUBTREE_TAGS: &[&str] = &["script", "style", "iframe", "object", "embed", "noscript"];

const EXTERNAL_ATTRS: &[&str] = &["href", "src", "alt", "title"];

const SAVE_ATTRS: &[&str] = &[
    "href",
    "target",
    "rel",
    "class",
    "style",
    "contenteditable",
    // Chip reconstruction data attributes.
    "data-type",
    "data-id",
    "data-number",
    "data-url",
    "data-state",
    "data-source-id",
    "data-author",
    "data-epic",
    "data-badge",
    // SVG subset for chip icons.
    "width",
    "height",
    "viewbox",
    "fill",
    "fill-rule",
    "clip-rule",
    "d",
    "xmlns",
    "stroke",
    "stroke-width",
    "stroke-linecap",
    "stroke-linejoin",
    "rx",
    "x",
    "y",
    // img attributes for document chips.
    "src",
    "alt",
    "loading",
    "decoding",
];

/// A named allow-list of tags and attributes.
#[derive(Debug, Clone)]
pub struct Profile {
    name: &'static str,
    allowed_tags: HashSet<&'static str>,
    allowed_attrs: HashSet<&'static str>,
    drop_subtree: HashSet<&'static str>,
}

impl Profile {
    /// Permissive profile for content entering or leaving `value`.
    pub fn save() -> Self {
        let mut allowed_tags: HashSet<&'static str> = BASE_TAGS.iter().copied().collect();
        allowed_tags.extend(SAVE_EXTRA_TAGS.iter().copied());
        Self {
            name: "save",
            allowed_tags,
            allowed_attrs: SAVE_ATTRS.iter().copied().collect(),
            drop_subtree: DROP_SUBTREE_TAGS.iter().copied().collect(),
        }
    }

    /// Conservative profile for foreign clipboard and drop payloads.
    pub fn external_paste() -> Self {
        Self {
            name: "external-paste",
            allowed_tags: BASE_TAGS.iter().copied().collect(),
            allowed_attrs: EXTERNAL_ATTRS.iter().copied().collect(),
            drop_subtree: DROP_SUBTREE_TAGS.iter().copied().collect(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn allows_tag(&self, tag: &str) -> bool {
        self.allowed_tags.contains(tag)
    }

    pub fn allows_attr(&self, name: &str) -> bool {
        self.allowed_attrs.contains(name)
    }

    pub fn drops_subtree(&self, tag: &str) -> bool {
        self.drop_subtree.contains(tag)
    }
}

/// Applies `profile` to arbitrary markup and returns the cleaned markup.
/// Pure and idempotent per profile.
pub fn sanitize(html: &str, profile: &Profile) -> String {
    let mut dom = Dom::new();
    let root = dom.root();
    for node in parse_fragment(&mut dom, html) {
        // Fresh parse output cannot collide with the root.
        let _ = dom.append_child(root, node);
    }
    let mut dropped = 0usize;
    clean_children(&mut dom, root, profile, &mut dropped);
    if dropped > 0 {
        debug!(profile = profile.name, dropped, "sanitize removed markup");
    }
    dom.inner_html(root)
}

fn clean_children(dom: &mut Dom, node: NodeId, profile: &Profile, dropped: &mut usize) {
    let mut index = 0;
    while index < dom.children(node).len() {
        let child = dom.children(node)[index];
        let Some(tag) = dom.tag(child).map(str::to_string) else {
            index += 1;
            continue;
        };
        if profile.drops_subtree(&tag) {
            let _ = dom.detach(child);
            *dropped += 1;
            continue;
        }
        if !profile.allows_tag(&tag) {
            // Unwrap splices the children into this position; re-examine it.
            let _ = dom.unwrap_element(child);
            *dropped += 1;
            continue;
        }
        let disallowed: Vec<String> = dom
            .attrs(child)
            .iter()
            .filter(|(name, _)| !profile.allows_attr(name))
            .map(|(name, _)| name.clone())
            .collect();
        *dropped += disallowed.len();
        for name in disallowed {
            dom.remove_attr(child, &name);
        }
        clean_children(dom, child, profile, dropped);
        index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_paste_strips_style_and_data_attrs() {
        let out = sanitize(
            "<b style=\"color:red\" data-type=\"pull_request\">hi</b>",
            &Profile::external_paste(),
        );
        assert_eq!(out, "<b>hi</b>");
    }

    #[test]
    fn test_unknown_tags_unwrap_keeping_text() {
        let out = sanitize("<article><p>kept</p></article>", &Profile::external_paste());
        assert_eq!(out, "<p>kept</p>");
    }

    #[test]
    fn test_script_subtree_removed_entirely() {
        let out = sanitize("a<script>alert(1)</script>b", &Profile::save());
        assert_eq!(out, "ab");
    }

    #[test]
    fn test_save_keeps_chip_attributes() {
        let chip = "<a contenteditable=\"false\" data-type=\"pull_request\" \
                    data-number=\"42\" data-url=\"https://x/pull/42\">#42</a>";
        let out = sanitize(chip, &Profile::save());
        assert!(out.contains("data-type=\"pull_request\""));
        assert!(out.contains("contenteditable=\"false\""));
    }
}
