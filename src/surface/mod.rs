//! The document surface: orchestrates the editable document, selection,
//! history, shortcuts, and toolbar behind the external `value`/`on_change`
//! contract.
//!
//! All mutations happen synchronously inside the event entry points; the
//! only asynchrony is the checkpoint debounce (driven by [`Surface::tick`])
//! and the frame-batched selection tracking (driven by
//! [`Surface::on_frame`]). A surface exclusively owns its document and
//! history; [`Surface::dispose`] cancels pending timers and releases every
//! owned subscription, after which every entry point is a no-op.

use crate::caret::{
    Caret, Selection, caret_at_offset, delete_range, insert_plain_text, text_len, text_offset,
};
use crate::chip::{Direction, adjacent_chip, caret_outside_chip_at_point, closest_chip, is_chip, place_caret_after};
use crate::dom::{Dom, NodeId, parse_fragment};
use crate::history::{History, Snapshot};
use crate::insert::{TransferData, insert_html_at_caret, resolve_transfer};
use crate::layout::Layout;
use crate::sanitize::{Profile, sanitize};
use crate::sched::{Debounce, FramePump, Subscription};
use crate::shortcuts::{
    Key, KeyEvent, ShortcutCx, ShortcutRule, default_shortcuts, is_word_boundary_key,
    run_shortcuts,
};
use crate::toolbar::{Toolbar, ToolbarAction};
use tracing::debug;

mod format;

pub use format::{FormatKind, apply_inline_format, reset_format_context};

/// Quiet period for the typing checkpoint debounce, in milliseconds.
pub const CHECKPOINT_QUIET_MS: u64 = 250;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SurfaceConfig {
    pub value: String,
    pub placeholder: String,
    pub readonly: bool,
}

/// Where a document-level pointer-down landed, as classified by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Toolbar,
    Surface,
    Outside,
}

type ChangeHandler = Box<dyn FnMut(&str)>;

pub struct Surface {
    dom: Dom,
    selection: Selection,
    history: History,
    checkpoint_timer: Debounce,
    selection_pump: FramePump,
    toolbar: Toolbar,
    shortcuts: Vec<ShortcutRule>,
    on_change: Option<ChangeHandler>,
    subscriptions: Vec<Subscription>,
    placeholder: String,
    readonly: bool,
    disposed: bool,
}

impl Surface {
    /// Mounts a surface over the given initial value. The value round-trips
    /// through the `save` sanitization profile before it is accepted, and
    /// an initial history snapshot is taken.
    pub fn new(config: SurfaceConfig) -> Self {
        let mut dom = Dom::new();
        let root = dom.root();
        let clean = sanitize(&config.value, &Profile::save());
        for node in parse_fragment(&mut dom, &clean) {
            let _ = dom.append_child(root, node);
        }
        let selection = Selection::caret(caret_at_offset(&dom, root, 0));
        let mut surface = Self {
            dom,
            selection,
            history: History::new(),
            checkpoint_timer: Debounce::new(CHECKPOINT_QUIET_MS),
            selection_pump: FramePump::new(),
            toolbar: Toolbar::new(),
            shortcuts: default_shortcuts(),
            on_change: None,
            subscriptions: Vec::new(),
            placeholder: config.placeholder,
            readonly: config.readonly,
            disposed: false,
        };
        surface.checkpoint();
        surface
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    fn root(&self) -> NodeId {
        self.dom.root()
    }

    /// Current serialized content. Because every entry path sanitizes,
    /// this is always `save`-profile clean.
    pub fn value(&self) -> String {
        self.dom.inner_html(self.root())
    }

    /// External value sync: replaces the content (no `on_change`) and takes
    /// an immediate checkpoint.
    pub fn set_value(&mut self, value: &str) {
        if self.disposed || self.value() == value {
            return;
        }
        let clean = sanitize(value, &Profile::save());
        self.replace_content(&clean);
        self.checkpoint();
    }

    pub fn set_on_change(&mut self, handler: impl FnMut(&str) + 'static) {
        self.on_change = Some(Box::new(handler));
    }

    /// Hands the surface ownership of a host listener registration, to be
    /// released on dispose.
    pub fn own_subscription(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn placeholder_visible(&self) -> bool {
        !self.readonly && self.dom.children(self.root()).is_empty()
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Accepts a selection read from the platform. Endpoints inside a chip
    /// subtree are relocated after the chip, keeping chips atomic.
    pub fn set_selection(&mut self, selection: Selection) {
        if self.disposed {
            return;
        }
        let anchor = self.clamped(selection.anchor);
        let focus = self.clamped(selection.focus);
        self.selection = Selection { anchor, focus };
        self.selection_changed();
    }

    fn clamped(&self, caret: Caret) -> Caret {
        match closest_chip(&self.dom, caret.node) {
            Some(chip) => {
                let mut fixed = Selection::caret(caret);
                if place_caret_after(&self.dom, chip, &mut fixed) {
                    fixed.focus
                } else {
                    caret
                }
            }
            None => caret,
        }
    }

    pub fn toolbar(&self) -> &Toolbar {
        &self.toolbar
    }

    /// Platform selection-change notification; the actual work is batched
    /// onto the next frame.
    pub fn selection_changed(&mut self) {
        if self.disposed || self.readonly {
            return;
        }
        self.selection_pump.request();
    }

    /// Frame tick: runs at most one batched selection-tracking pass.
    pub fn on_frame(&mut self, layout: &dyn Layout) {
        if self.disposed {
            return;
        }
        if self.selection_pump.take() {
            let root = self.root();
            self.toolbar.update(&self.dom, root, &self.selection, layout);
        }
    }

    /// Clock tick: fires the debounced checkpoint when its quiet period has
    /// elapsed.
    pub fn tick(&mut self, now: u64) {
        if self.disposed {
            return;
        }
        if self.checkpoint_timer.poll(now) {
            self.checkpoint();
        }
    }

    /// Keydown entry point. Returns true when the engine handled the key
    /// (the host must then suppress default processing).
    pub fn key_down(&mut self, event: &KeyEvent, now: u64) -> bool {
        if self.disposed || event.composing {
            return false;
        }
        if event.key == Key::Escape {
            // Consume Escape only when it had a visible toolbar to dismiss.
            if self.toolbar.is_visible() {
                self.toolbar.dismiss();
                return true;
            }
            return false;
        }
        if self.readonly {
            return false;
        }

        if event.modifier() && event.key == Key::Char('z') {
            if event.shift {
                self.redo();
            } else {
                self.undo();
            }
            return true;
        }

        let root = self.root();
        let mut cx = ShortcutCx::new(&mut self.dom, root, &mut self.selection);
        if run_shortcuts(event, &mut cx, &self.shortcuts) {
            let changed = cx.changed();
            if changed {
                self.emit();
            }
            // Structural shortcut actions checkpoint immediately.
            self.checkpoint();
            return true;
        }

        match event.key {
            Key::Backspace => return self.delete_backward(now),
            Key::Delete => return self.delete_forward(now),
            _ => {}
        }

        if is_word_boundary_key(&event.key) {
            self.checkpoint_timer.schedule(now);
        }
        false
    }

    /// Text input entry point (beforeinput). Input targeted inside a chip
    /// is rejected and the caret is relocated after the chip.
    pub fn insert_text(&mut self, text: &str, now: u64) -> bool {
        if self.disposed || self.readonly || text.is_empty() {
            return false;
        }
        if let Some(chip) = closest_chip(&self.dom, self.selection.anchor.node) {
            place_caret_after(&self.dom, chip, &mut self.selection);
            return false;
        }
        let root = self.root();
        if !self.selection.is_collapsed() {
            let caret = delete_range(&mut self.dom, root, &self.selection);
            self.selection.collapse_to(caret);
        }
        let caret = insert_plain_text(&mut self.dom, &self.selection.focus, text);
        self.selection.collapse_to(caret);
        self.emit();
        if text.chars().any(|ch| is_word_boundary_key(&Key::Char(ch))) {
            self.checkpoint_timer.flush();
            self.checkpoint();
        } else {
            self.checkpoint_timer.schedule(now);
        }
        true
    }

    /// Deletes the selection, or the grapheme before a collapsed caret. A
    /// chip immediately before the caret is removed whole instead.
    pub fn delete_backward(&mut self, now: u64) -> bool {
        if self.disposed || self.readonly {
            return false;
        }
        if self.selection.is_collapsed() {
            if let Some(chip) = self.chip_before_caret() {
                self.remove_chip(chip);
                return true;
            }
            let root = self.root();
            let offset = text_offset(&self.dom, root, &self.selection.focus);
            if offset == 0 {
                return false;
            }
            self.selection.anchor = caret_at_offset(&self.dom, root, offset - 1);
        }
        self.delete_selection(now);
        true
    }

    /// Deletes the selection, or the grapheme after a collapsed caret. A
    /// chip immediately after the caret is removed whole instead.
    pub fn delete_forward(&mut self, now: u64) -> bool {
        if self.disposed || self.readonly {
            return false;
        }
        if self.selection.is_collapsed() {
            if let Some(chip) = self.chip_after_caret() {
                self.remove_chip(chip);
                return true;
            }
            let root = self.root();
            let offset = text_offset(&self.dom, root, &self.selection.focus);
            if offset >= text_len(&self.dom, root) {
                return false;
            }
            self.selection.focus = caret_at_offset(&self.dom, root, offset + 1);
        }
        self.delete_selection(now);
        true
    }

    fn delete_selection(&mut self, now: u64) {
        let root = self.root();
        let caret = delete_range(&mut self.dom, root, &self.selection);
        self.selection.collapse_to(caret);
        self.emit();
        self.checkpoint_timer.schedule(now);
    }

    /// Inserts a line break at the caret. Enter is a word boundary, so the
    /// checkpoint is immediate.
    pub fn insert_line_break(&mut self, _now: u64) -> bool {
        if self.disposed || self.readonly {
            return false;
        }
        if let Some(chip) = closest_chip(&self.dom, self.selection.anchor.node) {
            place_caret_after(&self.dom, chip, &mut self.selection);
            return false;
        }
        let root = self.root();
        if !insert_html_at_caret(&mut self.dom, root, &mut self.selection, "<br>") {
            return false;
        }
        self.emit();
        self.checkpoint_timer.flush();
        self.checkpoint();
        true
    }

    /// Paste entry point.
    pub fn paste(&mut self, data: &TransferData, _now: u64) -> bool {
        if self.disposed || self.readonly {
            return false;
        }
        let Some(html) = resolve_transfer(data) else {
            return false;
        };
        let root = self.root();
        if !insert_html_at_caret(&mut self.dom, root, &mut self.selection, &html) {
            return false;
        }
        self.emit();
        self.checkpoint();
        true
    }

    /// Drop entry point: moves the caret to the drop point (snapped outside
    /// any chip), then runs the same payload resolution as paste.
    pub fn drop_at(
        &mut self,
        data: &TransferData,
        x: f32,
        y: f32,
        layout: &dyn Layout,
        now: u64,
    ) -> bool {
        if self.disposed || self.readonly {
            return false;
        }
        self.move_caret_to_point(x, y, layout);
        caret_outside_chip_at_point(&self.dom, layout, x, y, &mut self.selection);
        self.paste(data, now)
    }

    fn move_caret_to_point(&mut self, x: f32, y: f32, layout: &dyn Layout) {
        let root = self.root();
        let caret = match layout.node_at_point(&self.dom, x, y) {
            Some(hit) => {
                let after = layout
                    .node_rect(&self.dom, hit)
                    .is_some_and(|rect| x >= rect.center_x());
                let edge = if after {
                    crate::caret::caret_after(&self.dom, hit)
                } else {
                    crate::caret::caret_before(&self.dom, hit)
                };
                edge.unwrap_or_else(|| Caret::new(root, self.dom.children(root).len()))
            }
            // No hit information: fall back to the end of the surface.
            None => Caret::new(root, self.dom.children(root).len()),
        };
        self.selection.collapse_to(caret);
    }

    /// Document-level pointer-down routing. Returns true when the host must
    /// suppress default handling (pointer-down on the toolbar must not
    /// steal the selection).
    pub fn pointer_down(&mut self, target: PointerTarget) -> bool {
        if self.disposed {
            return false;
        }
        match target {
            PointerTarget::Toolbar => true,
            PointerTarget::Surface => false,
            PointerTarget::Outside => {
                self.toolbar.dismiss();
                false
            }
        }
    }

    /// Applies a toolbar format action to the current selection, collapses
    /// to its end, and resets the inline format context. Stale selections
    /// abort silently.
    pub fn toolbar_action(&mut self, action: ToolbarAction, _now: u64) -> bool {
        if self.disposed || self.readonly {
            return false;
        }
        let kind = match action {
            ToolbarAction::Bold => FormatKind::Bold,
            ToolbarAction::Italic => FormatKind::Italic,
        };
        let root = self.root();
        let Some(range) = apply_inline_format(&mut self.dom, root, &self.selection, kind) else {
            return false;
        };
        let caret = reset_format_context(&mut self.dom, &range.focus);
        self.selection.collapse_to(caret);
        self.emit();
        self.checkpoint();
        self.toolbar.dismiss();
        true
    }

    pub fn undo(&mut self) {
        if self.disposed || self.readonly {
            return;
        }
        if let Some(snapshot) = self.history.undo().cloned() {
            debug!(caret = snapshot.caret, "undo");
            self.restore(&snapshot);
        }
    }

    pub fn redo(&mut self) {
        if self.disposed || self.readonly {
            return;
        }
        if let Some(snapshot) = self.history.redo().cloned() {
            debug!(caret = snapshot.caret, "redo");
            self.restore(&snapshot);
        }
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Unmounts the surface: pending timers are cancelled and owned
    /// subscriptions released. Every entry point no-ops afterwards.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.checkpoint_timer.cancel();
        self.selection_pump.cancel();
        for subscription in &mut self.subscriptions {
            subscription.dispose();
        }
        self.subscriptions.clear();
        self.toolbar.dismiss();
        self.disposed = true;
        debug!("surface disposed");
    }

    fn checkpoint(&mut self) {
        let root = self.root();
        let caret = text_offset(&self.dom, root, &self.selection.focus);
        self.history.push(Snapshot {
            content: self.dom.inner_html(root),
            caret,
        });
    }

    fn restore(&mut self, snapshot: &Snapshot) {
        let content = snapshot.content.clone();
        self.replace_content(&content);
        let root = self.root();
        self.selection = Selection::caret(caret_at_offset(&self.dom, root, snapshot.caret));
        self.emit();
    }

    fn replace_content(&mut self, html: &str) {
        let root = self.root();
        for child in self.dom.children(root).to_vec() {
            let _ = self.dom.detach(child);
        }
        for node in parse_fragment(&mut self.dom, html) {
            let _ = self.dom.append_child(root, node);
        }
        self.selection = Selection::caret(caret_at_offset(&self.dom, root, 0));
    }

    fn emit(&mut self) {
        let html = self.value();
        if let Some(handler) = self.on_change.as_mut() {
            handler(&html);
        }
    }

    fn chip_before_caret(&self) -> Option<NodeId> {
        let caret = self.selection.focus;
        if self.dom.is_text(caret.node) {
            if caret.offset == 0 {
                return adjacent_chip(&self.dom, caret.node, Direction::Prev);
            }
            return None;
        }
        if caret.offset > 0 {
            let child = *self.dom.children(caret.node).get(caret.offset - 1)?;
            return is_chip(&self.dom, child).then_some(child);
        }
        adjacent_chip(&self.dom, caret.node, Direction::Prev)
    }

    fn chip_after_caret(&self) -> Option<NodeId> {
        let caret = self.selection.focus;
        if let Some(text) = self.dom.text(caret.node) {
            if caret.offset >= crate::caret::grapheme_len(text) {
                return adjacent_chip(&self.dom, caret.node, Direction::Next);
            }
            return None;
        }
        let child = *self.dom.children(caret.node).get(caret.offset)?;
        is_chip(&self.dom, child).then_some(child)
    }

    /// Removes a whole chip in one step: one emission, one checkpoint.
    fn remove_chip(&mut self, chip: NodeId) {
        if let Some(before) = crate::caret::caret_before(&self.dom, chip) {
            self.selection.collapse_to(before);
        }
        let _ = self.dom.detach(chip);
        self.emit();
        self.checkpoint();
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("readonly", &self.readonly)
            .field("disposed", &self.disposed)
            .field("history_len", &self.history.len())
            .finish()
    }
}
