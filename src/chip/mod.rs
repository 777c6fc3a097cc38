//! Atomic reference chips.
//!
//! A chip is a non-editable inline element representing an external artifact
//! (a pull request, a task, or a document reference). This module covers
//! classification, adjacency lookup, caret placement outside chip
//! boundaries, the canonical per-kind renderers, and reference extraction
//! from saved markup.

use crate::caret::{Selection, caret_after, caret_before};
use crate::dom::{Dom, NodeId, escape_html, parse_fragment};
use crate::layout::Layout;
use serde::{Deserialize, Serialize};

pub const CHIP_CLASS: &str = "rn-chip";
pub const CHIP_TYPE_ATTR: &str = "data-type";
pub const CHIP_SOURCE_ID_ATTR: &str = "data-source-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChipKind {
    PullRequest,
    Task,
    DocumentReference,
}

impl ChipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChipKind::PullRequest => "pull_request",
            ChipKind::Task => "task",
            ChipKind::DocumentReference => "document_reference",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "pull_request" => Some(ChipKind::PullRequest),
            "task" => Some(ChipKind::Task),
            "document_reference" => Some(ChipKind::DocumentReference),
            _ => None,
        }
    }
}

/// Structured chip payload as it arrives over `application/json` drops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChipPayload {
    #[serde(rename = "pull_request")]
    PullRequest {
        number: u64,
        title: String,
        url: String,
        #[serde(default)]
        state: Option<String>,
        #[serde(default, alias = "sourceId")]
        source_id: Option<String>,
    },
    #[serde(rename = "task")]
    Task {
        id: String,
        title: String,
        author: String,
        epic: String,
    },
    #[serde(rename = "document_reference")]
    DocumentReference {
        title: String,
        #[serde(default, alias = "iconSrc")]
        icon_src: Option<String>,
    },
}

impl ChipPayload {
    pub fn kind(&self) -> ChipKind {
        match self {
            ChipPayload::PullRequest { .. } => ChipKind::PullRequest,
            ChipPayload::Task { .. } => ChipKind::Task,
            ChipPayload::DocumentReference { .. } => ChipKind::DocumentReference,
        }
    }
}

/// A chip occurrence in saved markup, for linking report entities to the
/// artifacts they cite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChipReference {
    pub kind: ChipKind,
    pub source_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

pub fn is_chip(dom: &Dom, node: NodeId) -> bool {
    dom.attr(node, CHIP_TYPE_ATTR)
        .and_then(ChipKind::from_tag)
        .is_some()
}

pub fn chip_kind(dom: &Dom, node: NodeId) -> Option<ChipKind> {
    dom.attr(node, CHIP_TYPE_ATTR).and_then(ChipKind::from_tag)
}

/// Nearest chip at or above `node`.
pub fn closest_chip(dom: &Dom, node: NodeId) -> Option<NodeId> {
    let mut current = Some(node);
    while let Some(id) = current {
        if is_chip(dom, id) {
            return Some(id);
        }
        current = dom.parent(id);
    }
    None
}

/// Chip immediately adjacent to `node` in the given direction. Checks the
/// direct sibling first; when the node has no sibling on that side the walk
/// retries one level up. A non-chip sibling ends the search.
pub fn adjacent_chip(dom: &Dom, node: NodeId, direction: Direction) -> Option<NodeId> {
    let mut current = Some(node);
    while let Some(id) = current {
        let sibling = match direction {
            Direction::Prev => dom.prev_sibling(id),
            Direction::Next => dom.next_sibling(id),
        };
        if let Some(sib) = sibling {
            return if is_chip(dom, sib) { Some(sib) } else { None };
        }
        current = dom.parent(id);
    }
    None
}

/// Collapses the selection immediately before the chip. No-op when the chip
/// is no longer attached.
pub fn place_caret_before(dom: &Dom, chip: NodeId, selection: &mut Selection) -> bool {
    if !dom.is_attached(chip) {
        return false;
    }
    match caret_before(dom, chip) {
        Some(caret) => {
            selection.collapse_to(caret);
            true
        }
        None => false,
    }
}

/// Collapses the selection immediately after the chip. No-op when the chip
/// is no longer attached.
pub fn place_caret_after(dom: &Dom, chip: NodeId, selection: &mut Selection) -> bool {
    if !dom.is_attached(chip) {
        return false;
    }
    match caret_after(dom, chip) {
        Some(caret) => {
            selection.collapse_to(caret);
            true
        }
        None => false,
    }
}

/// Resolves the node under a surface coordinate; when it is (inside) a chip,
/// places the caret on whichever side of the chip's midpoint the coordinate
/// falls. Returns true when a chip was hit.
pub fn caret_outside_chip_at_point(
    dom: &Dom,
    layout: &dyn Layout,
    x: f32,
    y: f32,
    selection: &mut Selection,
) -> bool {
    let Some(hit) = layout.node_at_point(dom, x, y) else {
        return false;
    };
    let Some(chip) = closest_chip(dom, hit) else {
        return false;
    };
    let Some(rect) = layout.node_rect(dom, chip) else {
        return false;
    };
    if x >= rect.center_x() {
        place_caret_after(dom, chip, selection)
    } else {
        place_caret_before(dom, chip, selection)
    }
}

const COLOR_MERGED: &str = "#7C3AED";
const COLOR_OPEN: &str = "#059669";
const COLOR_CLOSED: &str = "#EF4444";
const COLOR_TASK: &str = "#2563EB";

pub fn state_color(state: &str) -> &'static str {
    match state.to_ascii_lowercase().as_str() {
        "merged" => COLOR_MERGED,
        "open" => COLOR_OPEN,
        _ => COLOR_CLOSED,
    }
}

const CHIP_STYLE: &str = "display:inline-flex;align-items:center;gap:6px;padding:2px 6px;\
                          border-radius:8px;font-size:13px;text-decoration:none;\
                          color:#111827;vertical-align:middle;";
const BADGE_STYLE: &str = "display:inline-flex;align-items:center;padding:2px 8px;\
                           border-radius:6px;background:#F3F4F6;font-size:12px;";

fn merge_icon_svg(color: &str, size: u32) -> String {
    format!(
        "<svg width=\"{size}\" height=\"{size}\" viewbox=\"0 0 16 16\" \
         xmlns=\"http://www.w3.org/2000/svg\" fill=\"{color}\">\
         <path d=\"M5 3.25a1.75 1.75 0 1 1-3.5 0 1.75 1.75 0 0 1 3.5 0zm0 9.5a1.75 1.75 0 1 \
         1-3.5 0 1.75 1.75 0 0 1 3.5 0zm9.5-4.75a1.75 1.75 0 1 1-3.5 0 1.75 1.75 0 0 1 3.5 0z\"/>\
         <path d=\"M3.25 5v6M5 4.5c2.5.5 6 .5 7.25 2\" stroke=\"{color}\" \
         stroke-width=\"1.5\" fill=\"none\"/></svg>"
    )
}

fn task_icon_svg(size: u32) -> String {
    format!(
        "<svg width=\"{size}\" height=\"{size}\" viewbox=\"0 0 24 24\" fill=\"none\" \
         xmlns=\"http://www.w3.org/2000/svg\">\
         <rect x=\"3\" y=\"4\" width=\"18\" height=\"14\" rx=\"2\" stroke=\"{color}\" \
         stroke-width=\"1.5\"/>\
         <path d=\"M7 9h10M7 12h6\" stroke=\"{color}\" stroke-width=\"1.5\" \
         stroke-linecap=\"round\"/></svg>",
        color = COLOR_TASK,
    )
}

fn document_icon_svg(size: u32) -> String {
    format!(
        "<svg width=\"{size}\" height=\"{size}\" viewbox=\"0 0 24 24\" fill=\"none\" \
         xmlns=\"http://www.w3.org/2000/svg\">\
         <path d=\"M6 2h9l5 5v15H6z\" stroke=\"#6B7280\" stroke-width=\"1.5\"/>\
         <path d=\"M9 11h8M9 15h6\" stroke=\"#6B7280\" stroke-width=\"1.5\" \
         stroke-linecap=\"round\"/></svg>"
    )
}

/// Canonical serialized form of a chip: an inline anchor carrying the kind
/// discriminator, a kind-specific id, and enough payload attributes to
/// re-render without a network round-trip. Marked non-editable.
pub fn chip_html(payload: &ChipPayload) -> String {
    match payload {
        ChipPayload::PullRequest {
            number,
            title,
            url,
            state,
            source_id,
        } => {
            let state = state.as_deref().unwrap_or("").to_ascii_lowercase();
            let color = state_color(&state);
            let source_id = source_id.clone().unwrap_or_else(|| number.to_string());
            let badge_label = match state.chars().next() {
                None => "PR".to_string(),
                Some(first) => {
                    let mut label = String::with_capacity(state.len());
                    label.extend(first.to_uppercase());
                    label.push_str(&state[first.len_utf8()..]);
                    label
                }
            };
            format!(
                "<a href=\"{url}\" target=\"_blank\" rel=\"noopener noreferrer\" \
                 contenteditable=\"false\" data-type=\"pull_request\" data-number=\"{number}\" \
                 data-url=\"{url}\" data-state=\"{state}\" data-source-id=\"{source_id}\" \
                 class=\"{CHIP_CLASS}\" style=\"{CHIP_STYLE}\">{icon}\
                 <strong>#{number}</strong> <span>{title}</span>\
                 <span data-badge=\"\" style=\"{BADGE_STYLE}color:{color};\">{badge}</span></a>",
                url = escape_html(url),
                state = escape_html(&state),
                source_id = escape_html(&source_id),
                icon = merge_icon_svg(color, 16),
                title = escape_html(title),
                badge = escape_html(&badge_label),
            )
        }
        ChipPayload::Task {
            id,
            title,
            author,
            epic,
        } => {
            format!(
                "<a contenteditable=\"false\" data-type=\"task\" data-id=\"{id}\" \
                 data-author=\"{author}\" data-epic=\"{epic}\" data-source-id=\"{id}\" \
                 class=\"{CHIP_CLASS}\" style=\"{CHIP_STYLE}\">{icon}\
                 <strong>{id}</strong> <span>{title}</span>\
                 <span data-badge=\"\" style=\"{BADGE_STYLE}color:{color};\">{author} \
                 \u{00B7} {epic}</span></a>",
                id = escape_html(id),
                author = escape_html(author),
                epic = escape_html(epic),
                icon = task_icon_svg(16),
                title = escape_html(title),
                color = COLOR_TASK,
            )
        }
        ChipPayload::DocumentReference { title, icon_src } => {
            let icon = match icon_src {
                Some(src) => format!(
                    "<img src=\"{}\" alt=\"\" width=\"16\" height=\"16\" loading=\"lazy\" \
                     decoding=\"async\">",
                    escape_html(src)
                ),
                None => document_icon_svg(16),
            };
            format!(
                "<a contenteditable=\"false\" data-type=\"document_reference\" \
                 data-source-id=\"{title}\" class=\"{CHIP_CLASS}\" style=\"{CHIP_STYLE}\">\
                 {icon}<span>Doc</span> <span>{title}</span></a>",
                title = escape_html(title),
            )
        }
    }
}

/// True when the markup already carries a chip marker, which routes a rich
/// payload to the `save` sanitization profile instead of `external-paste`.
pub fn contains_chip_marker(html: &str) -> bool {
    [
        ChipKind::PullRequest,
        ChipKind::Task,
        ChipKind::DocumentReference,
    ]
    .iter()
    .any(|kind| html.contains(&format!("data-type=\"{}\"", kind.as_str())))
}

/// Extracts every chip occurrence from saved markup, in document order.
pub fn extract_chip_references(html: &str) -> Vec<ChipReference> {
    let mut dom = Dom::new();
    let root = dom.root();
    for node in parse_fragment(&mut dom, html) {
        let _ = dom.append_child(root, node);
    }
    let mut references = Vec::new();
    for node in dom.descendants(root) {
        let Some(kind) = chip_kind(&dom, node) else {
            continue;
        };
        let source_id = dom
            .attr(node, CHIP_SOURCE_ID_ATTR)
            .or_else(|| dom.attr(node, "data-id"))
            .or_else(|| dom.attr(node, "data-number"));
        if let Some(source_id) = source_id {
            references.push(ChipReference {
                kind,
                source_id: source_id.to_string(),
            });
        }
    }
    references
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caret::Caret;

    fn dom_with(html: &str) -> Dom {
        let mut dom = Dom::new();
        let root = dom.root();
        for node in parse_fragment(&mut dom, html) {
            dom.append_child(root, node).unwrap();
        }
        dom
    }

    fn pr_payload() -> ChipPayload {
        ChipPayload::PullRequest {
            number: 42,
            title: "Fix bug".to_string(),
            url: "https://x/pull/42".to_string(),
            state: Some("open".to_string()),
            source_id: None,
        }
    }

    #[test]
    fn test_closest_chip_walks_ancestors() {
        let dom = dom_with(
            "<a contenteditable=\"false\" data-type=\"task\" data-id=\"T-1\">\
             <span>inner</span></a>",
        );
        let chip = dom.children(dom.root())[0];
        let span = dom.children(chip)[0];
        let text = dom.children(span)[0];
        assert_eq!(closest_chip(&dom, text), Some(chip));
        assert_eq!(closest_chip(&dom, dom.root()), None);
    }

    #[test]
    fn test_adjacent_chip_retries_one_level_up() {
        let dom = dom_with(
            "<span>tail</span><a contenteditable=\"false\" data-type=\"task\" \
             data-id=\"T-1\">x</a>",
        );
        let span = dom.children(dom.root())[0];
        let text = dom.children(span)[0];
        let chip = dom.children(dom.root())[1];
        // The text node has no sibling; the walk resumes from the span.
        assert_eq!(adjacent_chip(&dom, text, Direction::Next), Some(chip));
        assert_eq!(adjacent_chip(&dom, text, Direction::Prev), None);
    }

    #[test]
    fn test_adjacent_non_chip_sibling_ends_search() {
        let dom = dom_with("<b>a</b><i>b</i>");
        let bold = dom.children(dom.root())[0];
        assert_eq!(adjacent_chip(&dom, bold, Direction::Next), None);
    }

    #[test]
    fn test_place_caret_after_detached_chip_is_noop() {
        let mut dom = dom_with(&chip_html(&pr_payload()));
        let chip = dom.children(dom.root())[0];
        let mut selection = Selection::caret(Caret::new(dom.root(), 0));
        dom.detach(chip).unwrap();
        assert!(!place_caret_after(&dom, chip, &mut selection));
        assert_eq!(selection.focus, Caret::new(dom.root(), 0));
    }

    #[test]
    fn test_chip_html_renders_number_and_title() {
        let html = chip_html(&pr_payload());
        assert!(html.contains("#42"));
        assert!(html.contains("Fix bug"));
        assert!(html.contains("contenteditable=\"false\""));
        assert!(html.contains("data-source-id=\"42\""));
        assert!(contains_chip_marker(&html));
    }

    #[test]
    fn test_chip_html_capitalizes_non_ascii_state() {
        let html = chip_html(&ChipPayload::PullRequest {
            number: 9,
            title: "i18n".to_string(),
            url: "https://x/pull/9".to_string(),
            state: Some("öppen".to_string()),
            source_id: None,
        });
        assert!(html.contains("Öppen"));
        assert!(html.contains("data-state=\"öppen\""));
    }

    #[test]
    fn test_payload_json_round_trip_with_aliases() {
        let payload: ChipPayload = serde_json::from_str(
            "{\"type\":\"pull_request\",\"number\":7,\"title\":\"t\",\
             \"url\":\"u\",\"sourceId\":\"abc\"}",
        )
        .unwrap();
        match payload {
            ChipPayload::PullRequest {
                number, source_id, ..
            } => {
                assert_eq!(number, 7);
                assert_eq!(source_id.as_deref(), Some("abc"));
            }
            _ => panic!("expected pull_request payload"),
        }
    }

    #[test]
    fn test_extract_references_document_order() {
        let html = format!(
            "{}<p>and</p>{}",
            chip_html(&pr_payload()),
            chip_html(&ChipPayload::Task {
                id: "T-9".to_string(),
                title: "Ship".to_string(),
                author: "kim".to_string(),
                epic: "Q3".to_string(),
            }),
        );
        let refs = extract_chip_references(&html);
        assert_eq!(
            refs,
            vec![
                ChipReference {
                    kind: ChipKind::PullRequest,
                    source_id: "42".to_string(),
                },
                ChipReference {
                    kind: ChipKind::Task,
                    source_id: "T-9".to_string(),
                },
            ]
        );
    }
}
