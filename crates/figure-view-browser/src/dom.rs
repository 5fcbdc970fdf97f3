//! `web-sys` implementation of the node view's DOM abstraction.

use figure_view_core::{Dom, DomError};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlElement, Node};

/// Live browser DOM. Element handles are `HtmlElement`s; equality is JS
/// identity.
#[derive(Debug, Clone)]
pub struct WebDom {
    document: Document,
}

impl WebDom {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Resolve an event target to an element handle.
    pub fn element_from_target(&self, target: Option<web_sys::EventTarget>) -> Option<HtmlElement> {
        element_for_node(&target?.dyn_into::<Node>().ok()?)
    }
}

/// `node` itself if it is an HTML element, otherwise its nearest HTML
/// ancestor. Text nodes and SVG content resolve this way.
pub fn element_for_node(node: &Node) -> Option<HtmlElement> {
    let mut current = Some(node.clone());
    while let Some(node) = current {
        if let Some(el) = node.dyn_ref::<HtmlElement>() {
            return Some(el.clone());
        }
        current = node.parent_node();
    }
    None
}

impl Default for WebDom {
    fn default() -> Self {
        Self::new(gloo_utils::document())
    }
}

fn js_err(err: JsValue) -> DomError {
    DomError(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

impl Dom for WebDom {
    type Element = HtmlElement;

    fn create_element(&self, tag: &str) -> Result<HtmlElement, DomError> {
        self.document
            .create_element(tag)
            .map_err(js_err)?
            .dyn_into::<HtmlElement>()
            .map_err(|_| DomError(format!("<{tag}> is not an HTML element")))
    }

    fn tag_name(&self, element: &HtmlElement) -> String {
        element.tag_name().to_ascii_lowercase()
    }

    fn get_attribute(&self, element: &HtmlElement, name: &str) -> Option<String> {
        element.get_attribute(name)
    }

    fn set_attribute(&self, element: &HtmlElement, name: &str, value: &str) -> Result<(), DomError> {
        element.set_attribute(name, value).map_err(js_err)
    }

    fn remove_attribute(&self, element: &HtmlElement, name: &str) {
        let _ = element.remove_attribute(name);
    }

    fn attribute_names(&self, element: &HtmlElement) -> Vec<String> {
        element
            .get_attribute_names()
            .iter()
            .filter_map(|name| name.as_string())
            .collect()
    }

    fn append_child(&self, parent: &HtmlElement, child: &HtmlElement) -> Result<(), DomError> {
        parent.append_child(child).map(|_| ()).map_err(js_err)
    }

    fn remove_child(&self, parent: &HtmlElement, child: &HtmlElement) -> Result<(), DomError> {
        parent.remove_child(child).map(|_| ()).map_err(js_err)
    }

    fn replace_with(&self, old: &HtmlElement, replacement: &HtmlElement) -> Result<(), DomError> {
        if old.parent_node().is_none() {
            return Err(DomError::from("cannot replace a detached element"));
        }
        old.replace_with_with_node_1(replacement).map_err(js_err)
    }

    fn children(&self, element: &HtmlElement) -> Vec<HtmlElement> {
        let collection = element.children();
        (0..collection.length())
            .filter_map(|i| collection.item(i))
            .filter_map(|el| el.dyn_into::<HtmlElement>().ok())
            .collect()
    }

    fn parent(&self, element: &HtmlElement) -> Option<HtmlElement> {
        element.parent_element()?.dyn_into::<HtmlElement>().ok()
    }

    fn contains(&self, ancestor: &HtmlElement, node: &HtmlElement) -> bool {
        let node: &Node = node.as_ref();
        ancestor.contains(Some(node))
    }

    fn is_connected(&self, element: &HtmlElement) -> bool {
        element.is_connected()
    }

    fn text_content(&self, element: &HtmlElement) -> String {
        element.text_content().unwrap_or_default()
    }

    fn set_text_content(&self, element: &HtmlElement, text: &str) {
        element.set_text_content(Some(text));
    }

    fn css_text(&self, element: &HtmlElement) -> String {
        element.style().css_text()
    }

    fn set_css_text(&self, element: &HtmlElement, css: &str) {
        element.style().set_css_text(css);
    }

    fn set_style_property(
        &self,
        element: &HtmlElement,
        property: &str,
        value: &str,
    ) -> Result<(), DomError> {
        let style = element.style();
        if value.is_empty() {
            style.remove_property(property).map(|_| ()).map_err(js_err)
        } else {
            style.set_property(property, value).map_err(js_err)
        }
    }

    fn offset_width(&self, element: &HtmlElement) -> f64 {
        f64::from(element.offset_width())
    }

    fn viewport_width(&self) -> f64 {
        self.document
            .default_view()
            .and_then(|window| window.inner_width().ok())
            .and_then(|width| width.as_f64())
            .unwrap_or(0.0)
    }

    fn release_focus(&self) {
        let Some(active) = self.document.active_element() else {
            return;
        };
        if let Some(el) = active.dyn_ref::<HtmlElement>()
            && el.is_content_editable()
        {
            let _ = el.blur();
            tracing::trace!("released editor focus");
        }
    }
}
