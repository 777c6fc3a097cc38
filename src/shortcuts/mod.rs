//! Keyboard shortcut rules.
//!
//! An ordered rule list is evaluated on every keydown until one reports
//! handled. Rules rewrite the document around the caret; structural changes
//! are flagged on the context so the surface can emit and checkpoint.
//! Composition-in-progress (IME) input bypasses the engine entirely.

use crate::caret::{Caret, Selection, grapheme_to_byte, insert_plain_text, text_before};
use crate::dom::{Dom, NodeId};

pub const NBSP: char = '\u{00A0}';
pub const BULLET: char = '\u{2022}';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Delete,
    Escape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
    /// True while an IME composition is in progress.
    pub composing: bool,
}

impl KeyEvent {
    pub fn of(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            meta: false,
            shift: false,
            alt: false,
            composing: false,
        }
    }

    pub fn char(ch: char) -> Self {
        Self::of(Key::Char(ch))
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn composing(mut self) -> Self {
        self.composing = true;
        self
    }

    /// Platform-independent undo/redo modifier (Ctrl or Cmd).
    pub fn modifier(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Keys that force an immediate history checkpoint instead of a debounced
/// one: space, enter, and terminal punctuation.
pub fn is_word_boundary_key(key: &Key) -> bool {
    match key {
        Key::Enter => true,
        Key::Char(ch) => matches!(ch, ' ' | '.' | ',' | '!' | '?' | ';' | ':'),
        _ => false,
    }
}

/// Mutable editing context handed to each rule.
pub struct ShortcutCx<'a> {
    pub dom: &'a mut Dom,
    pub root: NodeId,
    pub selection: &'a mut Selection,
    changed: bool,
}

impl<'a> ShortcutCx<'a> {
    pub fn new(dom: &'a mut Dom, root: NodeId, selection: &'a mut Selection) -> Self {
        Self {
            dom,
            root,
            selection,
            changed: false,
        }
    }

    /// Rules call this after mutating the document; the surface turns it
    /// into an `on_change` emission.
    pub fn notify_changed(&mut self) {
        self.changed = true;
    }

    pub fn changed(&self) -> bool {
        self.changed
    }
}

pub type ShortcutRule = fn(&KeyEvent, &mut ShortcutCx<'_>) -> bool;

pub fn default_shortcuts() -> Vec<ShortcutRule> {
    vec![dash_to_bullet, tab_to_indent]
}

/// Runs rules in order until one handles the event. IME composition skips
/// every rule.
pub fn run_shortcuts(event: &KeyEvent, cx: &mut ShortcutCx<'_>, rules: &[ShortcutRule]) -> bool {
    if event.composing {
        return false;
    }
    rules.iter().any(|rule| rule(event, cx))
}

/// Nearest block-level ancestor of `node`, or the surface root.
pub fn closest_block(dom: &Dom, node: NodeId, root: NodeId) -> NodeId {
    let mut current = Some(node);
    while let Some(id) = current {
        if id == root {
            break;
        }
        if matches!(dom.tag(id), Some("div" | "p" | "li")) {
            return id;
        }
        if dom.parent(id) == Some(root) && dom.is_element(id) {
            return id;
        }
        current = dom.parent(id);
    }
    root
}

/// Typing a space right after a line-initial `-` replaces the dash with a
/// bullet marker: two leading and one trailing non-breaking space.
pub fn dash_to_bullet(event: &KeyEvent, cx: &mut ShortcutCx<'_>) -> bool {
    if event.key != Key::Char(' ') || event.modifier() {
        return false;
    }
    let caret = cx.selection.focus;
    let block = closest_block(cx.dom, caret.node, cx.root);
    let before = text_before(cx.dom, block, &caret);
    let trimmed = before.trim_start_matches([' ', NBSP]);
    if trimmed != "-" {
        return false;
    }
    let caret = match delete_grapheme_before(cx.dom, &caret) {
        Some(caret) => caret,
        None => return false,
    };
    let marker = format!("{NBSP}{NBSP}{BULLET}{NBSP}");
    let caret = insert_plain_text(cx.dom, &caret, &marker);
    cx.selection.collapse_to(caret);
    cx.notify_changed();
    true
}

/// Tab inserts a fixed-width indent marker instead of moving focus.
pub fn tab_to_indent(event: &KeyEvent, cx: &mut ShortcutCx<'_>) -> bool {
    if event.key != Key::Tab {
        return false;
    }
    let caret = cx.selection.focus;
    let caret = insert_plain_text(cx.dom, &caret, &format!("{NBSP}{NBSP}"));
    cx.selection.collapse_to(caret);
    cx.notify_changed();
    true
}

/// Removes the grapheme immediately before a text-node caret, returning the
/// adjusted caret.
fn delete_grapheme_before(dom: &mut Dom, caret: &Caret) -> Option<Caret> {
    let text = dom.text(caret.node)?.to_string();
    if caret.offset == 0 {
        return None;
    }
    let from = grapheme_to_byte(&text, caret.offset - 1)?;
    let to = grapheme_to_byte(&text, caret.offset)?;
    let mut updated = String::with_capacity(text.len());
    updated.push_str(&text[..from]);
    updated.push_str(&text[to..]);
    dom.set_text(caret.node, &updated);
    Some(Caret::new(caret.node, caret.offset - 1))
}
