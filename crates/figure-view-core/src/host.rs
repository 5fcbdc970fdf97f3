//! Contract with the host editing framework.
//!
//! The host owns the document model: node schema, positions, transactions and
//! selection. The node view reads and writes image nodes only through
//! [`EditorHost`]. Methods take `&self` because hosts dispatch through shared
//! handles and may re-enter rendering while a write is in flight.
//!
//! [`PlainHost`] is a minimal in-memory host: a flat list of blocks where a
//! node's position is its index.

use std::cell::RefCell;
use std::ops::Range;

use smol_str::SmolStr;
use thiserror::Error;

use crate::attrs::ImageAttrs;
use crate::node::{ImageNode, InlineNode};

/// Errors reported by a host when a transaction cannot be applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum HostError {
    /// There is no node at the position.
    #[error("no node at position {0}")]
    NoNode(usize),

    /// The node at the position is not an image node.
    #[error("node at position {0} is not an image")]
    NotAnImage(usize),

    /// The editor is read-only.
    #[error("editor is not editable")]
    ReadOnly,

    /// The host refused the transaction.
    #[error("transaction rejected: {0}")]
    Rejected(String),
}

/// Document operations the node view and commands rely on.
pub trait EditorHost {
    fn is_editable(&self) -> bool;

    /// The image node at `pos`, if there is one.
    fn node_at(&self, pos: usize) -> Option<ImageNode>;

    /// Replace the attributes of the node at `pos`, keeping its type and content.
    fn set_node_attrs(&self, pos: usize, attrs: ImageAttrs) -> Result<(), HostError>;

    /// Replace the inline content of the node at `pos`.
    fn set_node_content(&self, pos: usize, content: Vec<InlineNode>) -> Result<(), HostError>;

    /// Insert a new image node at `pos`.
    fn insert_node(&self, pos: usize, node: ImageNode) -> Result<(), HostError>;

    fn delete_node(&self, pos: usize) -> Result<(), HostError>;

    fn set_node_selection(&self, pos: usize) -> Result<(), HostError>;

    fn focus(&self);

    /// The current selection as a position range.
    fn selection(&self) -> Range<usize>;

    /// Image nodes whose position falls inside `range`, in document order.
    fn image_nodes_between(&self, range: Range<usize>) -> Vec<(usize, ImageNode)>;

    /// Apply any writes the host buffered. Called by platform layers once the
    /// node view has released its own state, so the host can re-render
    /// without re-entering it. The default does nothing.
    fn flush(&self) {}
}

/// A block in a [`PlainHost`] document.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(SmolStr),
    Image(ImageNode),
}

#[derive(Debug, Default)]
struct PlainState {
    blocks: Vec<Block>,
    selection: Range<usize>,
    node_selection: Option<usize>,
    focused: bool,
    transactions: usize,
}

/// In-memory host document.
#[derive(Debug)]
pub struct PlainHost {
    state: RefCell<PlainState>,
    editable: bool,
}

impl Default for PlainHost {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl PlainHost {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            state: RefCell::new(PlainState {
                blocks,
                ..PlainState::default()
            }),
            editable: true,
        }
    }

    pub fn read_only(blocks: Vec<Block>) -> Self {
        Self {
            editable: false,
            ..Self::new(blocks)
        }
    }

    pub fn blocks(&self) -> Vec<Block> {
        self.state.borrow().blocks.clone()
    }

    /// Number of transactions applied so far.
    pub fn transactions(&self) -> usize {
        self.state.borrow().transactions
    }

    pub fn node_selection(&self) -> Option<usize> {
        self.state.borrow().node_selection
    }

    pub fn is_focused(&self) -> bool {
        self.state.borrow().focused
    }

    pub fn set_selection(&self, selection: Range<usize>) {
        let mut state = self.state.borrow_mut();
        state.selection = selection;
        state.node_selection = None;
    }

    fn write<T>(
        &self,
        pos: usize,
        f: impl FnOnce(&mut ImageNode) -> T,
    ) -> Result<T, HostError> {
        if !self.editable {
            return Err(HostError::ReadOnly);
        }
        let mut state = self.state.borrow_mut();
        let result = match state.blocks.get_mut(pos) {
            Some(Block::Image(node)) => f(node),
            Some(Block::Paragraph(_)) => return Err(HostError::NotAnImage(pos)),
            None => return Err(HostError::NoNode(pos)),
        };
        state.transactions += 1;
        Ok(result)
    }
}

impl EditorHost for PlainHost {
    fn is_editable(&self) -> bool {
        self.editable
    }

    fn node_at(&self, pos: usize) -> Option<ImageNode> {
        match self.state.borrow().blocks.get(pos) {
            Some(Block::Image(node)) => Some(node.clone()),
            _ => None,
        }
    }

    fn set_node_attrs(&self, pos: usize, attrs: ImageAttrs) -> Result<(), HostError> {
        self.write(pos, |node| node.attrs = attrs)
    }

    fn set_node_content(&self, pos: usize, content: Vec<InlineNode>) -> Result<(), HostError> {
        self.write(pos, |node| node.content = content)
    }

    fn insert_node(&self, pos: usize, node: ImageNode) -> Result<(), HostError> {
        if !self.editable {
            return Err(HostError::ReadOnly);
        }
        let mut state = self.state.borrow_mut();
        let pos = pos.min(state.blocks.len());
        state.blocks.insert(pos, Block::Image(node));
        state.transactions += 1;
        Ok(())
    }

    fn delete_node(&self, pos: usize) -> Result<(), HostError> {
        if !self.editable {
            return Err(HostError::ReadOnly);
        }
        let mut state = self.state.borrow_mut();
        match state.blocks.get(pos) {
            Some(Block::Image(_)) => {}
            Some(Block::Paragraph(_)) => return Err(HostError::NotAnImage(pos)),
            None => return Err(HostError::NoNode(pos)),
        }
        state.blocks.remove(pos);
        if state.node_selection == Some(pos) {
            state.node_selection = None;
        }
        state.transactions += 1;
        Ok(())
    }

    fn set_node_selection(&self, pos: usize) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        if pos >= state.blocks.len() {
            return Err(HostError::NoNode(pos));
        }
        state.node_selection = Some(pos);
        state.selection = pos..pos + 1;
        Ok(())
    }

    fn focus(&self) {
        self.state.borrow_mut().focused = true;
    }

    fn selection(&self) -> Range<usize> {
        self.state.borrow().selection.clone()
    }

    fn image_nodes_between(&self, range: Range<usize>) -> Vec<(usize, ImageNode)> {
        self.state
            .borrow()
            .blocks
            .iter()
            .enumerate()
            .filter(|(pos, _)| range.contains(pos))
            .filter_map(|(pos, block)| match block {
                Block::Image(node) => Some((pos, node.clone())),
                Block::Paragraph(_) => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> PlainHost {
        PlainHost::new(vec![
            Block::Paragraph("intro".into()),
            Block::Image(ImageNode::image(ImageAttrs::with_src("a.png"))),
        ])
    }

    #[test]
    fn test_write_counts_transactions() {
        let host = doc();
        host.set_node_attrs(1, ImageAttrs::with_src("b.png")).unwrap();
        assert_eq!(host.transactions(), 1);
        assert_eq!(host.node_at(1).unwrap().attrs.src(), Some("b.png"));
    }

    #[test]
    fn test_write_errors() {
        let host = doc();
        assert_eq!(
            host.set_node_attrs(0, ImageAttrs::new()),
            Err(HostError::NotAnImage(0))
        );
        assert_eq!(
            host.set_node_attrs(9, ImageAttrs::new()),
            Err(HostError::NoNode(9))
        );
        assert_eq!(host.transactions(), 0);
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let host = PlainHost::read_only(vec![Block::Image(ImageNode::default())]);
        assert!(!host.is_editable());
        assert_eq!(host.delete_node(0), Err(HostError::ReadOnly));
    }

    #[test]
    fn test_image_nodes_between() {
        let host = doc();
        let found = host.image_nodes_between(0..2);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, 1);
        assert!(host.image_nodes_between(0..1).is_empty());
    }
}
