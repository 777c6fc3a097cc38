//! Caret and selection utilities.
//!
//! A caret addresses either a grapheme offset inside a text node or a child
//! index inside an element. Linear offsets count grapheme clusters across
//! the editable text of the surface, skipping non-editable subtrees, so no
//! reachable linear position ever lands inside an atomic chip.

use crate::dom::{Dom, NodeId};
use std::cmp::Ordering;
use unicode_segmentation::UnicodeSegmentation;

/// A collapsed insertion point.
///
/// `offset` is a grapheme offset for text nodes and a child index for
/// elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caret {
    pub node: NodeId,
    pub offset: usize,
}

impl Caret {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// An (anchor, focus) pair over the document. Read per event, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Caret,
    pub focus: Caret,
}

impl Selection {
    pub fn caret(at: Caret) -> Self {
        Self {
            anchor: at,
            focus: at,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn collapse_to(&mut self, at: Caret) {
        self.anchor = at;
        self.focus = at;
    }

    /// Anchor and focus in document order.
    pub fn ordered(&self, dom: &Dom, root: NodeId) -> (Caret, Caret) {
        if compare_positions(dom, root, &self.anchor, &self.focus) == Ordering::Greater {
            (self.focus, self.anchor)
        } else {
            (self.anchor, self.focus)
        }
    }
}

pub fn grapheme_len(text: &str) -> usize {
    text.graphemes(true).count()
}

/// Byte index of the grapheme boundary at `offset`, or `None` when the
/// offset runs past the end of the string.
pub fn grapheme_to_byte(text: &str, offset: usize) -> Option<usize> {
    if offset == 0 {
        return Some(0);
    }
    let mut seen = 0;
    for (byte_index, _) in text.grapheme_indices(true) {
        if seen == offset {
            return Some(byte_index);
        }
        seen += 1;
    }
    if seen == offset { Some(text.len()) } else { None }
}

/// Caret before a node, in its parent's child list.
pub fn caret_before(dom: &Dom, node: NodeId) -> Option<Caret> {
    let parent = dom.parent(node)?;
    let index = dom.index_in_parent(node)?;
    Some(Caret::new(parent, index))
}

/// Caret after a node, in its parent's child list.
pub fn caret_after(dom: &Dom, node: NodeId) -> Option<Caret> {
    let parent = dom.parent(node)?;
    let index = dom.index_in_parent(node)?;
    Some(Caret::new(parent, index + 1))
}

/// Child-index path from `root` to the caret boundary, ending with the
/// caret's own offset. Lexicographic order on paths is document order.
pub fn position_path(dom: &Dom, root: NodeId, caret: &Caret) -> Option<Vec<usize>> {
    if !dom.is_ancestor_or_self(root, caret.node) || !dom.is_attached(caret.node) {
        return None;
    }
    let mut path = Vec::new();
    let mut current = caret.node;
    while current != root {
        path.push(dom.index_in_parent(current)?);
        current = dom.parent(current)?;
    }
    path.reverse();
    path.push(caret.offset);
    Some(path)
}

pub fn compare_positions(dom: &Dom, root: NodeId, left: &Caret, right: &Caret) -> Ordering {
    match (
        position_path(dom, root, left),
        position_path(dom, root, right),
    ) {
        (Some(left_path), Some(right_path)) => left_path.cmp(&right_path),
        _ => Ordering::Equal,
    }
}

/// Linear grapheme offset of `caret` from the start of `root`, counting
/// editable text only.
pub fn text_offset(dom: &Dom, root: NodeId, caret: &Caret) -> usize {
    let mut acc = 0;
    accumulate(dom, root, caret, &mut acc);
    acc
}

fn accumulate(dom: &Dom, node: NodeId, caret: &Caret, acc: &mut usize) -> bool {
    if let Some(text) = dom.text(node) {
        let editable = dom.is_editable(node);
        if caret.node == node {
            if editable {
                *acc += caret.offset.min(grapheme_len(text));
            }
            return true;
        }
        if editable {
            *acc += grapheme_len(text);
        }
        return false;
    }

    let children: Vec<NodeId> = dom.children(node).to_vec();
    for (index, child) in children.iter().enumerate() {
        if caret.node == node && caret.offset == index {
            return true;
        }
        if accumulate(dom, *child, caret, acc) {
            return true;
        }
    }
    caret.node == node
}

/// Inverse of [`text_offset`]: resolves a linear offset back into a caret,
/// walking editable text nodes in document order. Offsets past the end
/// collapse to the end of `root`.
pub fn caret_at_offset(dom: &Dom, root: NodeId, offset: usize) -> Caret {
    let mut remain = offset;
    for node in dom.descendants(root) {
        let Some(text) = dom.text(node) else {
            continue;
        };
        if !dom.is_editable(node) {
            continue;
        }
        let len = grapheme_len(text);
        if remain <= len {
            return Caret::new(node, remain);
        }
        remain -= len;
    }
    Caret::new(root, dom.children(root).len())
}

/// Total editable text length of the surface, in graphemes.
pub fn text_len(dom: &Dom, root: NodeId) -> usize {
    let mut total = 0;
    for node in dom.descendants(root) {
        if let Some(text) = dom.text(node)
            && dom.is_editable(node)
        {
            total += grapheme_len(text);
        }
    }
    total
}

/// Editable text between the start of `root` and `caret`, as a string.
pub fn text_before(dom: &Dom, root: NodeId, caret: &Caret) -> String {
    let mut out = String::new();
    collect_before(dom, root, caret, &mut out);
    out
}

fn collect_before(dom: &Dom, node: NodeId, caret: &Caret, out: &mut String) -> bool {
    if let Some(text) = dom.text(node) {
        let editable = dom.is_editable(node);
        if caret.node == node {
            if editable {
                let byte = grapheme_to_byte(text, caret.offset).unwrap_or(text.len());
                out.push_str(&text[..byte]);
            }
            return true;
        }
        if editable {
            out.push_str(text);
        }
        return false;
    }
    let children: Vec<NodeId> = dom.children(node).to_vec();
    for (index, child) in children.iter().enumerate() {
        if caret.node == node && caret.offset == index {
            return true;
        }
        if collect_before(dom, *child, caret, out) {
            return true;
        }
    }
    caret.node == node
}

/// Inserts plain text at the caret and returns the caret after the inserted
/// run. Splices into an existing text node when possible.
pub fn insert_plain_text(dom: &mut Dom, caret: &Caret, text: &str) -> Caret {
    if text.is_empty() {
        return *caret;
    }
    if let Some(existing) = dom.text(caret.node).map(str::to_string) {
        let byte = grapheme_to_byte(&existing, caret.offset).unwrap_or(existing.len());
        let mut updated = String::with_capacity(existing.len() + text.len());
        updated.push_str(&existing[..byte]);
        updated.push_str(text);
        updated.push_str(&existing[byte..]);
        dom.set_text(caret.node, &updated);
        return Caret::new(caret.node, caret.offset + grapheme_len(text));
    }
    let node = dom.create_text(text);
    let index = caret.offset.min(dom.children(caret.node).len());
    if dom.insert_child(caret.node, index, node).is_err() {
        return *caret;
    }
    Caret::new(node, grapheme_len(text))
}

/// Splits a text node at a grapheme offset and returns the node holding the
/// right half. Returns the node unchanged for boundary offsets.
pub fn split_text_at(dom: &mut Dom, node: NodeId, offset: usize) -> NodeId {
    let Some(text) = dom.text(node).map(str::to_string) else {
        return node;
    };
    let Some(byte) = grapheme_to_byte(&text, offset) else {
        return node;
    };
    if byte == 0 || byte == text.len() {
        return node;
    }
    let right = dom.create_text(&text[byte..]);
    dom.set_text(node, &text[..byte]);
    let _ = dom.insert_after(node, right);
    right
}

/// Removes the content between the selection boundaries and returns the
/// collapsed caret at the start of the removed range. Boundary text nodes
/// are trimmed; wholly covered nodes (chips included) are detached.
pub fn delete_range(dom: &mut Dom, root: NodeId, selection: &Selection) -> Caret {
    let (start, end) = selection.ordered(dom, root);
    if start == end {
        return start;
    }
    let (Some(start_path), Some(end_path)) = (
        position_path(dom, root, &start),
        position_path(dom, root, &end),
    ) else {
        return start;
    };

    // Trim the boundary text nodes first; structural detachment below never
    // touches a partially covered text node.
    if start.node == end.node && dom.is_text(start.node) {
        remove_graphemes(dom, start.node, start.offset, Some(end.offset));
        return start;
    }
    if dom.is_text(start.node) {
        remove_graphemes(dom, start.node, start.offset, None);
    }
    if dom.is_text(end.node) {
        remove_graphemes(dom, end.node, 0, Some(end.offset));
    }

    // Detach every top-most node whose whole span falls inside the range.
    let mut pending = dom.children(root).to_vec();
    let mut index = 0;
    while index < pending.len() {
        let node = pending[index];
        index += 1;
        if node == start.node || node == end.node {
            pending.extend_from_slice(dom.children(node));
            continue;
        }
        let Some(node_start) = caret_before(dom, node).and_then(|c| position_path(dom, root, &c))
        else {
            continue;
        };
        let Some(node_end) = caret_after(dom, node).and_then(|c| position_path(dom, root, &c))
        else {
            continue;
        };
        if start_path <= node_start && node_end <= end_path {
            let _ = dom.detach(node);
        } else if node_end > start_path && node_start < end_path {
            // Straddles a boundary: keep the node, descend into it.
            pending.extend_from_slice(dom.children(node));
        }
    }

    if dom.is_attached(start.node) {
        Caret::new(start.node, start.offset)
    } else {
        caret_at_offset(dom, root, 0)
    }
}

fn remove_graphemes(dom: &mut Dom, node: NodeId, from: usize, to: Option<usize>) {
    let Some(text) = dom.text(node).map(str::to_string) else {
        return;
    };
    let Some(from_byte) = grapheme_to_byte(&text, from) else {
        return;
    };
    let to_byte = to
        .and_then(|offset| grapheme_to_byte(&text, offset))
        .unwrap_or(text.len());
    if from_byte >= to_byte {
        return;
    }
    let mut remaining = String::with_capacity(text.len());
    remaining.push_str(&text[..from_byte]);
    remaining.push_str(&text[to_byte..]);
    dom.set_text(node, &remaining);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_fragment;

    fn build(html: &str) -> (Dom, NodeId) {
        let mut dom = Dom::new();
        let root = dom.root();
        for node in parse_fragment(&mut dom, html) {
            dom.append_child(root, node).unwrap();
        }
        (dom, root)
    }

    #[test]
    fn test_text_offset_round_trip() {
        let (dom, root) = build("ab<b>cd</b>ef");
        for offset in 0..=6 {
            let caret = caret_at_offset(&dom, root, offset);
            assert_eq!(text_offset(&dom, root, &caret), offset);
        }
    }

    #[test]
    fn test_offsets_skip_non_editable_subtrees() {
        let (dom, root) = build("ab<a contenteditable=\"false\">CHIP</a>cd");
        assert_eq!(text_len(&dom, root), 4);
        let caret = caret_at_offset(&dom, root, 3);
        assert!(dom.is_editable(caret.node));
        assert_eq!(dom.text(caret.node), Some("cd"));
    }

    #[test]
    fn test_grapheme_offsets_handle_clusters() {
        let text = "a\u{1F469}\u{200D}\u{1F4BB}b";
        assert_eq!(grapheme_len(text), 3);
        assert_eq!(grapheme_to_byte(text, 2), Some(text.len() - 1));
        assert_eq!(grapheme_to_byte(text, 4), None);
    }

    #[test]
    fn test_compare_positions_document_order() {
        let (dom, root) = build("ab<b>cd</b>");
        let early = caret_at_offset(&dom, root, 1);
        let late = caret_at_offset(&dom, root, 3);
        assert_eq!(compare_positions(&dom, root, &early, &late), Ordering::Less);
        assert_eq!(compare_positions(&dom, root, &late, &early), Ordering::Greater);
    }

    #[test]
    fn test_delete_range_within_one_text_node() {
        let (mut dom, root) = build("hello world");
        let selection = Selection {
            anchor: caret_at_offset(&dom, root, 5),
            focus: caret_at_offset(&dom, root, 11),
        };
        let caret = delete_range(&mut dom, root, &selection);
        assert_eq!(dom.text_content(root), "hello");
        assert_eq!(text_offset(&dom, root, &caret), 5);
    }

    #[test]
    fn test_delete_range_detaches_covered_elements() {
        let (mut dom, root) = build("ab<b>cd</b>ef");
        let bold = dom.children(root)[1];
        let selection = Selection {
            anchor: caret_at_offset(&dom, root, 1),
            focus: caret_at_offset(&dom, root, 5),
        };
        delete_range(&mut dom, root, &selection);
        assert!(!dom.is_attached(bold));
        assert_eq!(dom.text_content(root), "af");
    }

    #[test]
    fn test_split_text_at_interior_offset() {
        let (mut dom, root) = build("abcd");
        let text = dom.children(root)[0];
        let right = split_text_at(&mut dom, text, 2);
        assert_ne!(right, text);
        assert_eq!(dom.text(text), Some("ab"));
        assert_eq!(dom.text(right), Some("cd"));
        assert_eq!(dom.children(root), &[text, right]);
    }
}
