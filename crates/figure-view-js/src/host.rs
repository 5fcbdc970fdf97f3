//! `EditorHost` over a JavaScript host object.
//!
//! The host object is read once at construction; every method it must
//! provide is checked then. Writes are queued and applied on
//! [`EditorHost::flush`], after the node view has released its own state,
//! so a host that re-renders synchronously never re-enters a view that is
//! still handling the event.

use std::cell::RefCell;
use std::ops::Range;

use figure_view_core::{EditorHost, HostError, ImageAttrs, ImageNode, InlineNode};
use js_sys::{Function, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen::prelude::JsError;

use crate::types::{JsImageAttrs, JsImageNode, JsPositionedNode, JsSelection};

#[derive(Debug)]
enum PendingWrite {
    Attrs(usize, ImageAttrs),
    Content(usize, String),
    Insert(usize, ImageNode),
    Delete(usize),
    SelectNode(usize),
    Focus,
}

#[derive(Debug)]
struct Callbacks {
    is_editable: Function,
    node_at: Function,
    set_node_attrs: Function,
    set_node_content: Function,
    insert_node: Function,
    delete_node: Function,
    set_node_selection: Function,
    focus: Function,
    selection: Function,
    image_nodes_between: Function,
}

/// A host editor implemented in JavaScript.
#[derive(Debug)]
pub struct JsHost {
    this: JsValue,
    callbacks: Callbacks,
    pending: RefCell<Vec<PendingWrite>>,
}

fn method(object: &JsValue, name: &str) -> Result<Function, JsError> {
    Reflect::get(object, &JsValue::from_str(name))
        .ok()
        .and_then(|value| value.dyn_into::<Function>().ok())
        .ok_or_else(|| JsError::new(&format!("host object has no `{name}` method")))
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, HostError> {
    serde_wasm_bindgen::to_value(value).map_err(|e| HostError::Rejected(e.to_string()))
}

impl JsHost {
    pub fn new(object: JsValue) -> Result<Self, JsError> {
        let callbacks = Callbacks {
            is_editable: method(&object, "isEditable")?,
            node_at: method(&object, "nodeAt")?,
            set_node_attrs: method(&object, "setNodeAttrs")?,
            set_node_content: method(&object, "setNodeContent")?,
            insert_node: method(&object, "insertNode")?,
            delete_node: method(&object, "deleteNode")?,
            set_node_selection: method(&object, "setNodeSelection")?,
            focus: method(&object, "focus")?,
            selection: method(&object, "selection")?,
            image_nodes_between: method(&object, "imageNodesBetween")?,
        };
        Ok(Self {
            this: object,
            callbacks,
            pending: RefCell::new(Vec::new()),
        })
    }

    fn queue(&self, write: PendingWrite) {
        self.pending.borrow_mut().push(write);
    }

    fn apply(&self, write: PendingWrite) -> Result<(), HostError> {
        let cb = &self.callbacks;
        let result = match write {
            PendingWrite::Attrs(pos, attrs) => cb.set_node_attrs.call2(
                &self.this,
                &pos.into(),
                &to_js(&JsImageAttrs::from(&attrs))?,
            ),
            PendingWrite::Content(pos, caption) => {
                cb.set_node_content
                    .call2(&self.this, &pos.into(), &JsValue::from_str(&caption))
            }
            PendingWrite::Insert(pos, node) => {
                cb.insert_node
                    .call2(&self.this, &pos.into(), &to_js(&JsImageNode::from(&node))?)
            }
            PendingWrite::Delete(pos) => cb.delete_node.call1(&self.this, &pos.into()),
            PendingWrite::SelectNode(pos) => {
                cb.set_node_selection.call1(&self.this, &pos.into())
            }
            PendingWrite::Focus => cb.focus.call0(&self.this),
        };
        result
            .map(|_| ())
            .map_err(|err| HostError::Rejected(format!("{err:?}")))
    }
}

impl EditorHost for JsHost {
    fn is_editable(&self) -> bool {
        self.callbacks
            .is_editable
            .call0(&self.this)
            .ok()
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }

    fn node_at(&self, pos: usize) -> Option<ImageNode> {
        let value = self.callbacks.node_at.call1(&self.this, &pos.into()).ok()?;
        if value.is_null() || value.is_undefined() {
            return None;
        }
        match serde_wasm_bindgen::from_value::<JsImageNode>(value) {
            Ok(node) => Some(node.into()),
            Err(err) => {
                tracing::warn!(pos, %err, "host returned a malformed image node");
                None
            }
        }
    }

    fn set_node_attrs(&self, pos: usize, attrs: ImageAttrs) -> Result<(), HostError> {
        self.queue(PendingWrite::Attrs(pos, attrs));
        Ok(())
    }

    fn set_node_content(&self, pos: usize, content: Vec<InlineNode>) -> Result<(), HostError> {
        let caption = content.iter().map(InlineNode::as_text).collect();
        self.queue(PendingWrite::Content(pos, caption));
        Ok(())
    }

    fn insert_node(&self, pos: usize, node: ImageNode) -> Result<(), HostError> {
        self.queue(PendingWrite::Insert(pos, node));
        Ok(())
    }

    fn delete_node(&self, pos: usize) -> Result<(), HostError> {
        self.queue(PendingWrite::Delete(pos));
        Ok(())
    }

    fn set_node_selection(&self, pos: usize) -> Result<(), HostError> {
        self.queue(PendingWrite::SelectNode(pos));
        Ok(())
    }

    fn focus(&self) {
        self.queue(PendingWrite::Focus);
    }

    fn selection(&self) -> Range<usize> {
        let selection = self
            .callbacks
            .selection
            .call0(&self.this)
            .ok()
            .and_then(|value| serde_wasm_bindgen::from_value::<JsSelection>(value).ok())
            .unwrap_or_default();
        selection.from..selection.to.max(selection.from)
    }

    fn image_nodes_between(&self, range: Range<usize>) -> Vec<(usize, ImageNode)> {
        let value = match self.callbacks.image_nodes_between.call2(
            &self.this,
            &range.start.into(),
            &range.end.into(),
        ) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(?err, "imageNodesBetween threw");
                return Vec::new();
            }
        };
        match serde_wasm_bindgen::from_value::<Vec<JsPositionedNode>>(value) {
            Ok(nodes) => nodes
                .into_iter()
                .map(|entry| (entry.pos, entry.node.into()))
                .collect(),
            Err(err) => {
                tracing::warn!(%err, "host returned malformed image nodes");
                Vec::new()
            }
        }
    }

    fn flush(&self) {
        let writes = std::mem::take(&mut *self.pending.borrow_mut());
        for write in writes {
            if let Err(err) = self.apply(write) {
                tracing::warn!(%err, "host rejected a write");
            }
        }
    }
}
