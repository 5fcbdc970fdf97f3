//! JsNodeView - the node view handed back to the host editor.

use figure_view_browser::{BrowserNodeView, ImageNode};
use wasm_bindgen::prelude::*;
use web_sys::{HtmlElement, Node};

use crate::host::JsHost;
use crate::types::JsImageNode;

/// One rendered image node.
///
/// Mirrors the host's node-view interface: `dom`, `contentDOM`, `update`,
/// `ignoreMutation` and `destroy`.
#[wasm_bindgen]
pub struct JsNodeView {
    pub(crate) inner: BrowserNodeView<JsHost>,
}

#[wasm_bindgen]
impl JsNodeView {
    /// The outer element of the widget.
    #[wasm_bindgen(getter)]
    pub fn dom(&self) -> HtmlElement {
        self.inner.dom()
    }

    /// The caption element, or `undefined` for a plain image.
    #[wasm_bindgen(getter, js_name = contentDOM)]
    pub fn content_dom(&self) -> Option<HtmlElement> {
        self.inner.content_dom()
    }

    /// Returns `false` when the host must re-create the view.
    #[wasm_bindgen]
    pub fn update(&self, node: JsImageNode) -> bool {
        self.inner.update(ImageNode::from(node))
    }

    #[wasm_bindgen(js_name = ignoreMutation)]
    pub fn ignore_mutation(&self, target: &Node) -> bool {
        self.inner.ignore_mutation(target)
    }

    #[wasm_bindgen(js_name = isActive)]
    pub fn is_active(&self) -> bool {
        self.inner.is_active()
    }

    #[wasm_bindgen]
    pub fn destroy(&self) {
        self.inner.destroy();
    }
}
