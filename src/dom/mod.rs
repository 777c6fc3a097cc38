//! Document node arena and HTML fragment parsing.
//!
//! The editable document is an explicit tree of element and text nodes held
//! in a flat arena and addressed by integer [`NodeId`] indices. Detached
//! nodes stay in the arena (their slot is never reused) so stale ids can be
//! recognized cheaply via [`Dom::is_attached`] instead of faulting.

use std::fmt::Write as _;

pub mod parser;

pub use parser::parse_fragment;

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct NodeData {
    parent: Option<NodeId>,
    kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("cannot detach the root node")]
    DetachRoot,
    #[error("insertion would create a cycle")]
    WouldCycle,
    #[error("node is not an element")]
    NotAnElement,
    #[error("child index out of range")]
    IndexOutOfRange,
}

/// A document tree rooted at a single editable container element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dom {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Dom {
    pub fn new() -> Self {
        let root_data = NodeData {
            parent: None,
            kind: NodeKind::Element(ElementData {
                tag: "div".to_string(),
                attrs: Vec::new(),
                children: Vec::new(),
            }),
        };
        Self {
            nodes: vec![root_data],
            root: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push_node(NodeKind::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(NodeKind::Text(text.to_string()))
    }

    fn push_node(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(NodeData { parent: None, kind });
        self.nodes.len() - 1
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id].kind
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id].kind, NodeKind::Element(_))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.nodes[id].kind, NodeKind::Text(_))
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].kind {
            NodeKind::Element(elem) => Some(elem.tag.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id].kind {
            NodeKind::Text(text) => Some(text.as_str()),
            NodeKind::Element(_) => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if let NodeKind::Text(existing) = &mut self.nodes[id].kind {
            existing.clear();
            existing.push_str(text);
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id].kind {
            NodeKind::Element(elem) => elem
                .attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeKind::Element(elem) = &mut self.nodes[id].kind {
            if let Some(entry) = elem.attrs.iter_mut().find(|(key, _)| key == name) {
                entry.1 = value.to_string();
            } else {
                elem.attrs.push((name.to_string(), value.to_string()));
            }
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let NodeKind::Element(elem) = &mut self.nodes[id].kind {
            elem.attrs.retain(|(key, _)| key != name);
        }
    }

    pub fn attrs(&self, id: NodeId) -> &[(String, String)] {
        match &self.nodes[id].kind {
            NodeKind::Element(elem) => &elem.attrs,
            NodeKind::Text(_) => &[],
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.nodes[id].kind {
            NodeKind::Element(elem) => &elem.children,
            NodeKind::Text(_) => &[],
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.nodes[id].parent?;
        self.children(parent).iter().position(|&child| child == id)
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.nodes[id].parent?;
        let index = self.index_in_parent(id)?;
        if index == 0 {
            None
        } else {
            Some(self.children(parent)[index - 1])
        }
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.nodes[id].parent?;
        let index = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// True when walking parent links from `id` reaches the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.nodes[current].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// True when `ancestor` is `id` itself or appears on its parent chain.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.nodes[node].parent;
        }
        false
    }

    pub fn insert_child(
        &mut self,
        parent: NodeId,
        index: usize,
        child: NodeId,
    ) -> Result<(), DomError> {
        if self.is_ancestor_or_self(child, parent) {
            return Err(DomError::WouldCycle);
        }
        if self.nodes[child].parent.is_some() {
            self.detach(child)?;
        }
        match &mut self.nodes[parent].kind {
            NodeKind::Element(elem) => {
                if index > elem.children.len() {
                    return Err(DomError::IndexOutOfRange);
                }
                elem.children.insert(index, child);
            }
            NodeKind::Text(_) => return Err(DomError::NotAnElement),
        }
        self.nodes[child].parent = Some(parent);
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let len = self.children(parent).len();
        self.insert_child(parent, len, child)
    }

    pub fn insert_before(&mut self, sibling: NodeId, child: NodeId) -> Result<(), DomError> {
        let parent = self.nodes[sibling].parent.ok_or(DomError::DetachRoot)?;
        let index = self.index_in_parent(sibling).ok_or(DomError::IndexOutOfRange)?;
        self.insert_child(parent, index, child)
    }

    pub fn insert_after(&mut self, sibling: NodeId, child: NodeId) -> Result<(), DomError> {
        let parent = self.nodes[sibling].parent.ok_or(DomError::DetachRoot)?;
        let index = self.index_in_parent(sibling).ok_or(DomError::IndexOutOfRange)?;
        self.insert_child(parent, index + 1, child)
    }

    /// Removes `id` from its parent. The node and its subtree stay in the
    /// arena as a detached fragment.
    pub fn detach(&mut self, id: NodeId) -> Result<(), DomError> {
        if id == self.root {
            return Err(DomError::DetachRoot);
        }
        if let Some(parent) = self.nodes[id].parent {
            if let NodeKind::Element(elem) = &mut self.nodes[parent].kind {
                elem.children.retain(|&child| child != id);
            }
            self.nodes[id].parent = None;
        }
        Ok(())
    }

    /// Replaces an element with its own children, splicing them into the
    /// former parent at the element's position.
    pub fn unwrap_element(&mut self, id: NodeId) -> Result<(), DomError> {
        if id == self.root {
            return Err(DomError::DetachRoot);
        }
        let parent = match self.nodes[id].parent {
            Some(parent) => parent,
            None => return Ok(()),
        };
        let index = self.index_in_parent(id).ok_or(DomError::IndexOutOfRange)?;
        let children: Vec<NodeId> = self.children(id).to_vec();
        self.detach(id)?;
        for (offset, child) in children.into_iter().enumerate() {
            self.insert_child(parent, index + offset, child)?;
        }
        Ok(())
    }

    /// Pre-order traversal of `id` and its subtree.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            for &child in self.children(node).iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Concatenated text of every text node in the subtree, document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            if let NodeKind::Text(text) = &self.nodes[node].kind {
                out.push_str(text);
            }
        }
        out
    }

    /// True unless the node or one of its ancestors opts out of editing via
    /// `contenteditable="false"`.
    pub fn is_editable(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.attr(node, "contenteditable") == Some("false") {
                return false;
            }
            current = self.nodes[node].parent;
        }
        true
    }

    /// Serialized markup of the node itself (outer HTML).
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        serialize_into(self, id, &mut out);
        out
    }

    /// Serialized markup of the node's children only.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            serialize_into(self, child, &mut out);
        }
        out
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

/// Elements serialized without a closing tag.
pub(crate) fn is_void_tag(tag: &str) -> bool {
    matches!(tag, "br" | "hr" | "img" | "input" | "wbr")
}

fn serialize_into(dom: &Dom, id: NodeId, out: &mut String) {
    match dom.kind(id) {
        NodeKind::Text(text) => out.push_str(&escape_text(text)),
        NodeKind::Element(elem) => {
            let _ = write!(out, "<{}", elem.tag);
            for (name, value) in &elem.attrs {
                let _ = write!(out, " {}=\"{}\"", name, escape_attr(value));
            }
            out.push('>');
            if is_void_tag(&elem.tag) {
                return;
            }
            for &child in &elem.children {
                serialize_into(dom, child, out);
            }
            let _ = write!(out, "</{}>", elem.tag);
        }
    }
}

/// Escapes text for safe inclusion as markup character data, covering the
/// quote forms as well so the result is reusable in attribute position.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
