//! Paste/drop payload resolution and caret insertion.
//!
//! Payloads arrive in up to three competing formats and are resolved in
//! fidelity order: rich HTML, structured chip JSON, plain text. Whatever
//! wins is sanitized before it touches the document, and the caret is
//! relocated outside any chip before the fragment lands.

use crate::caret::{Caret, Selection, caret_after, delete_range, split_text_at};
use crate::chip::{chip_html, closest_chip, contains_chip_marker, place_caret_after};
use crate::chip::ChipPayload;
use crate::dom::{Dom, NodeId, escape_html, parse_fragment};
use crate::sanitize::{Profile, sanitize};
use tracing::{debug, trace};

/// The format slots of a clipboard or drag-and-drop transfer.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransferData {
    pub html: Option<String>,
    pub json: Option<String>,
    pub text: Option<String>,
}

impl TransferData {
    pub fn html(html: impl Into<String>) -> Self {
        Self {
            html: Some(html.into()),
            ..Self::default()
        }
    }

    pub fn json(json: impl Into<String>) -> Self {
        Self {
            json: Some(json.into()),
            ..Self::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

/// Resolves a transfer into sanitized markup ready for insertion, or `None`
/// when every slot is empty. Malformed JSON falls through to plain text.
pub fn resolve_transfer(data: &TransferData) -> Option<String> {
    if let Some(html) = data.html.as_deref().filter(|html| !html.is_empty()) {
        if contains_chip_marker(html) {
            debug!("transfer resolved as chip markup");
            return Some(sanitize(html, &Profile::save()));
        }
        debug!("transfer resolved as external markup");
        return Some(sanitize(html, &Profile::external_paste()));
    }

    if let Some(json) = data.json.as_deref().filter(|json| !json.is_empty()) {
        match serde_json::from_str::<ChipPayload>(json) {
            Ok(payload) => {
                debug!(kind = payload.kind().as_str(), "transfer resolved as chip payload");
                return Some(sanitize(&chip_html(&payload), &Profile::save()));
            }
            Err(error) => {
                trace!(%error, "malformed chip payload ignored");
            }
        }
    }

    data.text
        .as_deref()
        .filter(|text| !text.is_empty())
        .map(escape_html)
}

/// Inserts already-sanitized markup at the caret.
///
/// A caret anchored inside a chip is first relocated after the chip so the
/// fragment cannot be injected into chip internals; a stale selection falls
/// back to appending at the end of the surface. Afterwards the selection is
/// collapsed immediately after the last inserted node. Returns whether the
/// document changed.
pub fn insert_html_at_caret(
    dom: &mut Dom,
    root: NodeId,
    selection: &mut Selection,
    html: &str,
) -> bool {
    let fragment = parse_fragment(dom, html);
    if fragment.is_empty() {
        return false;
    }

    if !dom.is_attached(selection.focus.node) || !dom.is_ancestor_or_self(root, selection.focus.node)
    {
        selection.collapse_to(Caret::new(root, dom.children(root).len()));
    } else {
        if let Some(chip) = closest_chip(dom, selection.anchor.node) {
            place_caret_after(dom, chip, selection);
        }
        let caret = delete_range(dom, root, selection);
        selection.collapse_to(caret);
    }

    let caret = selection.focus;
    let (parent, mut index) = if dom.is_text(caret.node) {
        let right = split_text_at(dom, caret.node, caret.offset);
        let Some(parent) = dom.parent(caret.node) else {
            return false;
        };
        let anchor_index = if right == caret.node && caret.offset == 0 {
            // Boundary split at the front: insert before the text node.
            dom.index_in_parent(caret.node).unwrap_or(0)
        } else if right == caret.node {
            dom.index_in_parent(caret.node).map(|i| i + 1).unwrap_or(0)
        } else {
            dom.index_in_parent(right).unwrap_or(0)
        };
        (parent, anchor_index)
    } else {
        (caret.node, caret.offset.min(dom.children(caret.node).len()))
    };

    let mut last = None;
    for node in fragment {
        if dom.insert_child(parent, index, node).is_ok() {
            index += 1;
            last = Some(node);
        }
    }
    let Some(last) = last else {
        return false;
    };
    if let Some(after) = caret_after(dom, last) {
        selection.collapse_to(after);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caret::caret_at_offset;
    use crate::chip::ChipKind;

    fn surface(html: &str) -> (Dom, NodeId) {
        let mut dom = Dom::new();
        let root = dom.root();
        for node in parse_fragment(&mut dom, html) {
            dom.append_child(root, node).unwrap();
        }
        (dom, root)
    }

    #[test]
    fn test_resolution_prefers_html_over_json_and_text() {
        let data = TransferData {
            html: Some("<b>rich</b>".to_string()),
            json: Some("{\"type\":\"task\"}".to_string()),
            text: Some("plain".to_string()),
        };
        assert_eq!(resolve_transfer(&data).unwrap(), "<b>rich</b>");
    }

    #[test]
    fn test_malformed_json_falls_through_to_text() {
        let data = TransferData {
            html: None,
            json: Some("{not json".to_string()),
            text: Some("a < b".to_string()),
        };
        assert_eq!(resolve_transfer(&data).unwrap(), "a &lt; b");
    }

    #[test]
    fn test_json_payload_renders_a_chip() {
        let data = TransferData::json(
            "{\"type\":\"pull_request\",\"number\":42,\"title\":\"Fix bug\",\
             \"url\":\"https://x/pull/42\",\"state\":\"open\"}",
        );
        let html = resolve_transfer(&data).unwrap();
        assert!(html.contains("data-type=\"pull_request\""));
        assert!(html.contains("#42"));
        let refs = crate::chip::extract_chip_references(&html);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].kind, ChipKind::PullRequest);
    }

    #[test]
    fn test_empty_transfer_resolves_to_none() {
        assert_eq!(resolve_transfer(&TransferData::default()), None);
    }

    #[test]
    fn test_insert_splits_text_and_places_caret_after() {
        let (mut dom, root) = surface("hello");
        let mut selection = Selection::caret(caret_at_offset(&dom, root, 2));
        assert!(insert_html_at_caret(&mut dom, root, &mut selection, "<b>X</b>"));
        assert_eq!(dom.inner_html(root), "he<b>X</b>llo");
        // Caret sits right after the inserted element.
        let bold = dom.children(root)[1];
        assert_eq!(selection.focus, caret_after(&dom, bold).unwrap());
    }

    #[test]
    fn test_insert_relocates_caret_out_of_chip() {
        let chip = chip_html(&ChipPayload::Task {
            id: "T-1".to_string(),
            title: "x".to_string(),
            author: "a".to_string(),
            epic: "e".to_string(),
        });
        let (mut dom, root) = surface(&chip);
        let chip_node = dom.children(root)[0];
        let inner_text = dom
            .descendants(chip_node)
            .into_iter()
            .find(|&n| dom.is_text(n))
            .unwrap();
        let mut selection = Selection::caret(Caret::new(inner_text, 0));
        assert!(insert_html_at_caret(&mut dom, root, &mut selection, "zz"));
        // The chip subtree is untouched and the text landed after it.
        assert_eq!(dom.children(root)[0], chip_node);
        assert_eq!(dom.text(dom.children(root)[1]), Some("zz"));
    }

    #[test]
    fn test_insert_with_stale_selection_appends_at_end() {
        let (mut dom, root) = surface("ab");
        let orphan = dom.create_text("gone");
        let mut selection = Selection::caret(Caret::new(orphan, 0));
        assert!(insert_html_at_caret(&mut dom, root, &mut selection, "!"));
        assert_eq!(dom.text_content(root), "ab!");
    }

    #[test]
    fn test_insert_replaces_selected_range() {
        let (mut dom, root) = surface("hello world");
        let mut selection = Selection {
            anchor: caret_at_offset(&dom, root, 5),
            focus: caret_at_offset(&dom, root, 11),
        };
        assert!(insert_html_at_caret(&mut dom, root, &mut selection, "!"));
        assert_eq!(dom.text_content(root), "hello!");
    }
}
