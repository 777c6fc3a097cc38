//! rich-note: a rich-text document engine with atomic inline reference chips.
//!
//! This crate implements the editing core behind an in-document note surface.
//! It includes:
//!
//! - **Document model** - an arena-backed element/text tree with a lenient
//!   HTML fragment parser and serializer
//! - **Sanitization** - allow-list cleaning with separate save and
//!   external-paste profiles
//! - **Chips** - atomic, non-editable inline widgets referencing pull
//!   requests, tasks, and documents
//! - **Editing surface** - selection, typing, paste/drop, input shortcuts,
//!   inline formatting, and a bounded undo history
//!
//! # Quick Start
//!
//! ```rust
//! use rich_note::{Surface, SurfaceConfig};
//!
//! let mut surface = Surface::new(SurfaceConfig::default());
//! surface.insert_text("hello world", 0);
//! assert_eq!(surface.value(), "hello world");
//! ```

// Document tree, parser, and serializer
pub mod dom;

// Caret, selection, and grapheme offsets
pub mod caret;

// Atomic inline reference chips
pub mod chip;

// Allow-list HTML sanitization
pub mod sanitize;

// Paste/drop payload resolution and fragment insertion
pub mod insert;

// Bounded undo/redo history
pub mod history;

// Geometry seam to the host (hit testing, node rects)
pub mod layout;

// Debounce, frame batching, and subscriptions
pub mod sched;

// Keystroke shortcut rules
pub mod shortcuts;

// The editing surface and inline formatting
pub mod surface;

// Floating selection toolbar
pub mod toolbar;

// Re-export document types
pub use dom::{Dom, DomError, NodeId, parse_fragment};

// Re-export selection types
pub use caret::{Caret, Selection};

// Re-export chip types
pub use chip::{ChipKind, ChipPayload, ChipReference, chip_html, extract_chip_references};

// Re-export sanitization
pub use sanitize::{Profile, sanitize};

// Re-export the surface
pub use surface::{FormatKind, PointerTarget, Surface, SurfaceConfig};

// Re-export transfer resolution
pub use insert::TransferData;

// Re-export toolbar types
pub use toolbar::{Toolbar, ToolbarAction};

// Re-export shortcut event types
pub use shortcuts::{Key, KeyEvent};

// Re-export geometry seam
pub use layout::{Layout, Rect};
