//! In-memory DOM implementation.
//!
//! Elements live in a shared arena and are addressed by index, so handles are
//! `Copy` and compare by identity like real DOM nodes. Used for tests and for
//! driving the node view outside a browser.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::dom::{Dom, DomError};
use crate::style::InlineStyle;

/// Handle to an element in a [`MemoryDom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryElement(usize);

#[derive(Debug, Clone)]
struct NodeData {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<usize>,
    parent: Option<usize>,
    text: String,
    offset_width: Option<f64>,
}

impl NodeData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
            parent: None,
            text: String::new(),
            offset_width: None,
        }
    }
}

#[derive(Debug)]
struct Arena {
    nodes: Vec<NodeData>,
}

/// Shared in-memory document. Clones refer to the same document.
#[derive(Debug, Clone)]
pub struct MemoryDom {
    arena: Rc<RefCell<Arena>>,
    viewport_width: Rc<Cell<f64>>,
    focus_releases: Rc<Cell<usize>>,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

const ROOT: usize = 0;

impl MemoryDom {
    /// Create a document with an empty `body` root and a 1024px viewport.
    pub fn new() -> Self {
        Self {
            arena: Rc::new(RefCell::new(Arena {
                nodes: vec![NodeData::new("body")],
            })),
            viewport_width: Rc::new(Cell::new(1024.0)),
            focus_releases: Rc::new(Cell::new(0)),
        }
    }

    /// The document body. Elements are connected iff they descend from it.
    pub fn root(&self) -> MemoryElement {
        MemoryElement(ROOT)
    }

    pub fn set_viewport_width(&self, width: f64) {
        self.viewport_width.set(width);
    }

    /// Pin the layout width reported by `offset_width` for an element.
    pub fn set_offset_width(&self, element: &MemoryElement, width: f64) {
        if let Some(node) = self.arena.borrow_mut().nodes.get_mut(element.0) {
            node.offset_width = Some(width);
        }
    }

    /// How many times `release_focus` was called.
    pub fn focus_releases(&self) -> usize {
        self.focus_releases.get()
    }

    /// Serialize an element and its subtree as HTML, attributes in insertion order.
    pub fn outer_html(&self, element: &MemoryElement) -> String {
        let mut out = String::new();
        self.write_html(element.0, &mut out);
        out
    }

    fn write_html(&self, idx: usize, out: &mut String) {
        let (tag, attrs, text, children) = {
            let arena = self.arena.borrow();
            let node = &arena.nodes[idx];
            (
                node.tag.clone(),
                node.attrs.clone(),
                node.text.clone(),
                node.children.clone(),
            )
        };
        out.push('<');
        out.push_str(&tag);
        for (name, value) in attrs {
            out.push_str(&format!(" {name}=\"{value}\""));
        }
        out.push('>');
        if tag == "img" {
            return;
        }
        out.push_str(&text);
        for child in children {
            self.write_html(child, out);
        }
        out.push_str(&format!("</{tag}>"));
    }

    fn detach(arena: &mut Arena, idx: usize) {
        if let Some(parent) = arena.nodes[idx].parent.take() {
            arena.nodes[parent].children.retain(|c| *c != idx);
        }
    }

    fn is_ancestor(arena: &Arena, ancestor: usize, mut node: usize) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match arena.nodes[node].parent {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    fn check(&self, element: &MemoryElement) -> Result<(), DomError> {
        if element.0 < self.arena.borrow().nodes.len() {
            Ok(())
        } else {
            Err(DomError(format!("unknown element {}", element.0)))
        }
    }
}

impl Dom for MemoryDom {
    type Element = MemoryElement;

    fn create_element(&self, tag: &str) -> Result<MemoryElement, DomError> {
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(DomError(format!("invalid tag name {tag:?}")));
        }
        let mut arena = self.arena.borrow_mut();
        arena.nodes.push(NodeData::new(tag));
        Ok(MemoryElement(arena.nodes.len() - 1))
    }

    fn tag_name(&self, element: &MemoryElement) -> String {
        self.arena
            .borrow()
            .nodes
            .get(element.0)
            .map(|n| n.tag.clone())
            .unwrap_or_default()
    }

    fn get_attribute(&self, element: &MemoryElement, name: &str) -> Option<String> {
        let arena = self.arena.borrow();
        let node = arena.nodes.get(element.0)?;
        node.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    fn set_attribute(
        &self,
        element: &MemoryElement,
        name: &str,
        value: &str,
    ) -> Result<(), DomError> {
        self.check(element)?;
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(DomError(format!("invalid attribute name {name:?}")));
        }
        let mut arena = self.arena.borrow_mut();
        let node = &mut arena.nodes[element.0];
        match node.attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => node.attrs.push((name.to_string(), value.to_string())),
        }
        Ok(())
    }

    fn remove_attribute(&self, element: &MemoryElement, name: &str) {
        if let Some(node) = self.arena.borrow_mut().nodes.get_mut(element.0) {
            node.attrs.retain(|(n, _)| n != name);
        }
    }

    fn attribute_names(&self, element: &MemoryElement) -> Vec<String> {
        self.arena
            .borrow()
            .nodes
            .get(element.0)
            .map(|n| n.attrs.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default()
    }

    fn append_child(&self, parent: &MemoryElement, child: &MemoryElement) -> Result<(), DomError> {
        self.check(parent)?;
        self.check(child)?;
        let mut arena = self.arena.borrow_mut();
        if Self::is_ancestor(&arena, child.0, parent.0) {
            return Err("cannot append an element into its own subtree".into());
        }
        Self::detach(&mut arena, child.0);
        arena.nodes[child.0].parent = Some(parent.0);
        arena.nodes[parent.0].children.push(child.0);
        Ok(())
    }

    fn remove_child(&self, parent: &MemoryElement, child: &MemoryElement) -> Result<(), DomError> {
        self.check(child)?;
        let mut arena = self.arena.borrow_mut();
        if arena.nodes[child.0].parent != Some(parent.0) {
            return Err("element is not a child of the given parent".into());
        }
        Self::detach(&mut arena, child.0);
        Ok(())
    }

    fn replace_with(&self, old: &MemoryElement, replacement: &MemoryElement) -> Result<(), DomError> {
        self.check(old)?;
        self.check(replacement)?;
        let mut arena = self.arena.borrow_mut();
        let Some(parent) = arena.nodes[old.0].parent else {
            // Detached elements have nowhere to put the replacement; the DOM
            // treats this as a no-op.
            return Ok(());
        };
        if Self::is_ancestor(&arena, replacement.0, parent) {
            return Err("cannot replace an element with one of its ancestors".into());
        }
        Self::detach(&mut arena, replacement.0);
        match arena.nodes[parent].children.iter().position(|c| *c == old.0) {
            Some(index) => arena.nodes[parent].children[index] = replacement.0,
            None => arena.nodes[parent].children.push(replacement.0),
        }
        arena.nodes[replacement.0].parent = Some(parent);
        arena.nodes[old.0].parent = None;
        Ok(())
    }

    fn children(&self, element: &MemoryElement) -> Vec<MemoryElement> {
        self.arena
            .borrow()
            .nodes
            .get(element.0)
            .map(|n| n.children.iter().copied().map(MemoryElement).collect())
            .unwrap_or_default()
    }

    fn parent(&self, element: &MemoryElement) -> Option<MemoryElement> {
        self.arena
            .borrow()
            .nodes
            .get(element.0)
            .and_then(|n| n.parent)
            .map(MemoryElement)
    }

    fn contains(&self, ancestor: &MemoryElement, node: &MemoryElement) -> bool {
        let arena = self.arena.borrow();
        if ancestor.0 >= arena.nodes.len() || node.0 >= arena.nodes.len() {
            return false;
        }
        Self::is_ancestor(&arena, ancestor.0, node.0)
    }

    fn is_connected(&self, element: &MemoryElement) -> bool {
        self.contains(&self.root(), element)
    }

    fn text_content(&self, element: &MemoryElement) -> String {
        let (mut text, children) = {
            let arena = self.arena.borrow();
            match arena.nodes.get(element.0) {
                Some(node) => (node.text.clone(), node.children.clone()),
                None => return String::new(),
            }
        };
        for child in children {
            text.push_str(&self.text_content(&MemoryElement(child)));
        }
        text
    }

    fn set_text_content(&self, element: &MemoryElement, text: &str) {
        let mut arena = self.arena.borrow_mut();
        if element.0 >= arena.nodes.len() {
            return;
        }
        let children = std::mem::take(&mut arena.nodes[element.0].children);
        for child in children {
            arena.nodes[child].parent = None;
        }
        arena.nodes[element.0].text = text.to_string();
    }

    fn css_text(&self, element: &MemoryElement) -> String {
        self.get_attribute(element, "style")
            .map(|css| InlineStyle::parse(&css).to_css_text())
            .unwrap_or_default()
    }

    fn set_css_text(&self, element: &MemoryElement, css: &str) {
        let style = InlineStyle::parse(css);
        if style.is_empty() {
            self.remove_attribute(element, "style");
        } else {
            let _ = self.set_attribute(element, "style", &style.to_css_text());
        }
    }

    fn set_style_property(
        &self,
        element: &MemoryElement,
        property: &str,
        value: &str,
    ) -> Result<(), DomError> {
        self.check(element)?;
        let mut style = InlineStyle::parse(&self.css_text(element));
        style.set(property, value);
        self.set_css_text(element, &style.to_css_text());
        Ok(())
    }

    fn offset_width(&self, element: &MemoryElement) -> f64 {
        let (pinned, parent) = {
            let arena = self.arena.borrow();
            match arena.nodes.get(element.0) {
                Some(node) => (node.offset_width, node.parent),
                None => return 0.0,
            }
        };
        if let Some(width) = pinned {
            return width;
        }
        let style = InlineStyle::parse(&self.css_text(element));
        if let Some(width) = style
            .get("width")
            .and_then(|w| w.strip_suffix("px"))
            .and_then(|w| w.trim().parse::<f64>().ok())
        {
            return width;
        }
        match parent {
            Some(parent) => self.offset_width(&MemoryElement(parent)),
            None => self.viewport_width.get(),
        }
    }

    fn viewport_width(&self) -> f64 {
        self.viewport_width.get()
    }

    fn release_focus(&self) {
        self.focus_releases.set(self.focus_releases.get() + 1);
    }
}
