//! Inline formatting over the document model.
//!
//! Replaces the deprecated platform "format command" with an explicit
//! function: boundary text nodes are split at the selection edges and every
//! editable text node covered by the range is wrapped in the format element,
//! unless an ancestor already carries it.

use crate::caret::{Caret, Selection, caret_after, caret_before, position_path, split_text_at};
use crate::dom::{Dom, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    Bold,
    Italic,
}

impl FormatKind {
    pub fn tag(&self) -> &'static str {
        match self {
            FormatKind::Bold => "b",
            FormatKind::Italic => "i",
        }
    }
}

/// Applies an inline format to the selected range and returns the new range
/// spanning the formatted content. Returns `None` (document unchanged) for
/// collapsed, stale, or text-free selections.
pub fn apply_inline_format(
    dom: &mut Dom,
    root: NodeId,
    selection: &Selection,
    kind: FormatKind,
) -> Option<Selection> {
    if selection.is_collapsed() {
        return None;
    }
    let (start, end) = selection.ordered(dom, root);
    position_path(dom, root, &start)?;
    position_path(dom, root, &end)?;

    // Pin both boundaries to node references before splitting, since the
    // splits insert siblings and would shift index-based carets.
    let start_edge = pin_edge(dom, &start);
    let end_edge = pin_edge(dom, &end);

    // Split boundary text nodes so the range covers whole nodes.
    let (start_edge, end_edge) = if start.node == end.node && dom.is_text(start.node) {
        split_text_at(dom, end.node, end.offset);
        let mid = split_text_at(dom, start.node, start.offset);
        (Edge::Before(mid), Edge::After(mid))
    } else {
        let start_edge = if dom.is_text(start.node) {
            let right = split_text_at(dom, start.node, start.offset);
            Edge::Before(right)
        } else {
            start_edge
        };
        let end_edge = if dom.is_text(end.node) {
            split_text_at(dom, end.node, end.offset);
            Edge::After(end.node)
        } else {
            end_edge
        };
        (start_edge, end_edge)
    };

    let start_path = position_path(dom, root, &start_edge.resolve(dom)?)?;
    let end_path = position_path(dom, root, &end_edge.resolve(dom)?)?;

    let covered: Vec<NodeId> = dom
        .descendants(root)
        .into_iter()
        .filter(|&node| dom.is_text(node) && dom.is_editable(node))
        .filter(|&node| {
            let Some(node_start) = caret_before(dom, node)
                .and_then(|caret| position_path(dom, root, &caret))
            else {
                return false;
            };
            let Some(node_end) = caret_after(dom, node)
                .and_then(|caret| position_path(dom, root, &caret))
            else {
                return false;
            };
            start_path <= node_start && node_end <= end_path
        })
        .collect();
    if covered.is_empty() {
        return None;
    }

    for node in &covered {
        if has_format_ancestor(dom, *node, root, kind) {
            continue;
        }
        let wrapper = dom.create_element(kind.tag());
        if dom.insert_before(*node, wrapper).is_err() {
            continue;
        }
        let _ = dom.append_child(wrapper, *node);
    }

    let first = *covered.first()?;
    let last = *covered.last()?;
    Some(Selection {
        anchor: range_edge_before(dom, first)?,
        focus: range_edge_after(dom, last)?,
    })
}

/// A range boundary pinned to a node rather than a child index, stable
/// across sibling insertions.
#[derive(Debug, Clone, Copy)]
enum Edge {
    Before(NodeId),
    After(NodeId),
    At(Caret),
}

impl Edge {
    fn resolve(&self, dom: &Dom) -> Option<Caret> {
        match self {
            Edge::Before(node) => caret_before(dom, *node),
            Edge::After(node) => caret_after(dom, *node),
            Edge::At(caret) => Some(*caret),
        }
    }
}

fn pin_edge(dom: &Dom, caret: &Caret) -> Edge {
    if dom.is_text(caret.node) {
        return Edge::At(*caret);
    }
    let children = dom.children(caret.node);
    if caret.offset > 0 && caret.offset <= children.len() {
        Edge::After(children[caret.offset - 1])
    } else {
        Edge::At(*caret)
    }
}

fn has_format_ancestor(dom: &Dom, node: NodeId, root: NodeId, kind: FormatKind) -> bool {
    let mut current = dom.parent(node);
    while let Some(id) = current {
        if id == root {
            return false;
        }
        if dom.tag(id) == Some(kind.tag()) {
            return true;
        }
        current = dom.parent(id);
    }
    false
}

fn range_edge_before(dom: &Dom, node: NodeId) -> Option<Caret> {
    // Anchor outside the wrapper when the node was just wrapped.
    let boundary = enclosing_wrapper(dom, node);
    caret_before(dom, boundary)
}

fn range_edge_after(dom: &Dom, node: NodeId) -> Option<Caret> {
    let boundary = enclosing_wrapper(dom, node);
    caret_after(dom, boundary)
}

fn enclosing_wrapper(dom: &Dom, node: NodeId) -> NodeId {
    match dom.parent(node) {
        Some(parent) if dom.children(parent).len() == 1 => parent,
        _ => node,
    }
}

/// Breaks the inherited inline context after a format action: a transient
/// zero-width marker is inserted at the caret and removed again, so
/// subsequent typing starts outside the formatted run.
pub fn reset_format_context(dom: &mut Dom, caret: &Caret) -> Caret {
    let marker = dom.create_text("\u{200B}");
    let at = if dom.is_text(caret.node) {
        match caret_after(dom, caret.node) {
            Some(after) => after,
            None => return *caret,
        }
    } else {
        *caret
    };
    let index = at.offset.min(dom.children(at.node).len());
    if dom.insert_child(at.node, index, marker).is_err() {
        return *caret;
    }
    let _ = dom.detach(marker);
    Caret::new(at.node, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caret::caret_at_offset;
    use crate::dom::parse_fragment;

    fn surface(html: &str) -> (Dom, NodeId) {
        let mut dom = Dom::new();
        let root = dom.root();
        for node in parse_fragment(&mut dom, html) {
            dom.append_child(root, node).unwrap();
        }
        (dom, root)
    }

    #[test]
    fn test_bold_wraps_interior_range() {
        let (mut dom, root) = surface("hello world");
        let selection = Selection {
            anchor: caret_at_offset(&dom, root, 6),
            focus: caret_at_offset(&dom, root, 11),
        };
        let out = apply_inline_format(&mut dom, root, &selection, FormatKind::Bold);
        assert!(out.is_some());
        assert_eq!(dom.inner_html(root), "hello <b>world</b>");
    }

    #[test]
    fn test_italic_spans_element_boundaries() {
        let (mut dom, root) = surface("ab<b>cd</b>ef");
        let selection = Selection {
            anchor: caret_at_offset(&dom, root, 1),
            focus: caret_at_offset(&dom, root, 5),
        };
        apply_inline_format(&mut dom, root, &selection, FormatKind::Italic).unwrap();
        assert_eq!(dom.inner_html(root), "a<i>b</i><b><i>cd</i></b><i>e</i>f");
    }

    #[test]
    fn test_existing_format_not_doubled() {
        let (mut dom, root) = surface("<b>bold</b>");
        let selection = Selection {
            anchor: caret_at_offset(&dom, root, 0),
            focus: caret_at_offset(&dom, root, 4),
        };
        apply_inline_format(&mut dom, root, &selection, FormatKind::Bold).unwrap();
        assert_eq!(dom.inner_html(root), "<b>bold</b>");
    }

    #[test]
    fn test_collapsed_selection_is_rejected() {
        let (mut dom, root) = surface("abc");
        let selection = Selection::caret(caret_at_offset(&dom, root, 1));
        assert!(apply_inline_format(&mut dom, root, &selection, FormatKind::Bold).is_none());
        assert_eq!(dom.inner_html(root), "abc");
    }

    #[test]
    fn test_stale_selection_leaves_document_unchanged() {
        let (mut dom, root) = surface("abc");
        let orphan = dom.create_text("x");
        let selection = Selection {
            anchor: Caret::new(orphan, 0),
            focus: Caret::new(orphan, 1),
        };
        assert!(apply_inline_format(&mut dom, root, &selection, FormatKind::Bold).is_none());
        assert_eq!(dom.inner_html(root), "abc");
    }

    #[test]
    fn test_reset_format_context_is_content_neutral() {
        let (mut dom, root) = surface("<b>x</b>");
        let caret = Caret::new(root, 1);
        let out = reset_format_context(&mut dom, &caret);
        assert_eq!(dom.inner_html(root), "<b>x</b>");
        assert_eq!(out, Caret::new(root, 1));
    }
}
