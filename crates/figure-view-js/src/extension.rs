//! JsFigureExtension - node-view factory, commands and rules for one editor.

use std::rc::Rc;

use figure_view_browser::{
    BrowserNodeView, EditorHost, FigureOptions, GetPos, HostError, ImageAttrs, ImageNode,
    ViewContext, WebDom, apply_input_rule, convert_to_figure, convert_to_image,
    find_markdown_images, install_stylesheet, parse_element, render_html, render_node, set_image,
    set_image_figure,
};
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

use crate::host::JsHost;
use crate::types::{JsImageAttrs, JsImageNode, JsMarkdownImage};
use crate::view::JsNodeView;

/// Scope used for the overlay stylesheet when the host does not name one.
const DEFAULT_SCOPE: &str = ".ProseMirror";

/// The image extension for one editor instance.
///
/// Owns the options and the active-widget state shared by every node view
/// it creates.
#[wasm_bindgen]
pub struct JsFigureExtension {
    ctx: ViewContext<WebDom>,
    host: Rc<JsHost>,
}

#[wasm_bindgen]
impl JsFigureExtension {
    /// Create the extension for the editor behind `host`.
    ///
    /// `options` may be omitted; every field has a default. `scope` is the
    /// selector of the editor root the overlay stylesheet is scoped to.
    #[wasm_bindgen(constructor)]
    pub fn new(
        host: JsValue,
        options: JsValue,
        scope: Option<String>,
    ) -> Result<JsFigureExtension, JsError> {
        let options: FigureOptions = if options.is_undefined() || options.is_null() {
            FigureOptions::default()
        } else {
            serde_wasm_bindgen::from_value(options)
                .map_err(|e| JsError::new(&format!("Invalid options: {}", e)))?
        };
        let host = JsHost::new(host)?;

        let window = web_sys::window().ok_or_else(|| JsError::new("No window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsError::new("No document"))?;
        let scope = scope.as_deref().unwrap_or(DEFAULT_SCOPE);
        install_stylesheet(&document, scope)
            .map_err(|e| JsError::new(&format!("Failed to install styles: {}", e)))?;

        tracing::debug!(?options, "figure extension created");
        Ok(Self {
            ctx: ViewContext::new(WebDom::new(document), options),
            host: Rc::new(host),
        })
    }

    // === Schema ===

    /// Whether the host should declare the node inline.
    #[wasm_bindgen(getter)]
    pub fn inline(&self) -> bool {
        self.ctx.options.inline
    }

    /// Schema group for the node: `"inline"` or `"block"`.
    #[wasm_bindgen(getter)]
    pub fn group(&self) -> String {
        self.ctx.options.group().to_string()
    }

    // === Node views ===

    /// Create the node view for `node`. `getPos` returns the node's current
    /// position, or `undefined` if the host cannot tell.
    #[wasm_bindgen(js_name = createNodeView)]
    pub fn create_node_view(
        &self,
        node: JsImageNode,
        get_pos: Option<js_sys::Function>,
    ) -> Result<JsNodeView, JsError> {
        let get_pos = get_pos.map(|callback| {
            Rc::new(move || {
                callback
                    .call0(&JsValue::NULL)
                    .ok()
                    .and_then(|value| value.as_f64())
                    .filter(|pos| *pos >= 0.0)
                    .map(|pos| pos as usize)
            }) as GetPos
        });
        let inner = BrowserNodeView::new(
            self.ctx.clone(),
            self.host.clone(),
            ImageNode::from(node),
            get_pos,
        )
        .map_err(|e| JsError::new(&format!("Failed to create node view: {}", e)))?;
        Ok(JsNodeView { inner })
    }

    // === Commands ===

    /// Insert an image at the selection.
    #[wasm_bindgen(js_name = setImage)]
    pub fn set_image(&self, attrs: JsImageAttrs) -> bool {
        let result = set_image(self.host.as_ref(), ImageAttrs::from(attrs));
        self.finish("setImage", result.map(|_| ()))
    }

    /// Insert an image with a caption at the selection.
    #[wasm_bindgen(js_name = setImageFigure)]
    pub fn set_image_figure(&self, attrs: JsImageAttrs, caption: &str) -> bool {
        let result = set_image_figure(
            self.host.as_ref(),
            ImageAttrs::from(attrs),
            caption,
            &self.ctx.options,
        );
        self.finish("setImageFigure", result.map(|_| ()))
    }

    /// Caption every uncaptioned image in the selection. Returns whether any
    /// node changed.
    #[wasm_bindgen(js_name = convertToFigure)]
    pub fn convert_to_figure(&self) -> bool {
        let result = convert_to_figure(self.host.as_ref(), &self.ctx.options);
        self.finish_count("convertToFigure", result)
    }

    /// Drop the caption of every captioned image in the selection.
    #[wasm_bindgen(js_name = convertToImage)]
    pub fn convert_to_image(&self) -> bool {
        let result = convert_to_image(self.host.as_ref());
        self.finish_count("convertToImage", result)
    }

    // === Rules ===

    /// Input rule. `textBefore` is the text of the block up to the cursor;
    /// on a match a node is inserted at `pos` and the matched range is
    /// returned so the host can delete the typed syntax.
    #[wasm_bindgen(js_name = inputRule)]
    pub fn input_rule(&self, pos: usize, text_before: &str) -> Option<JsMarkdownImage> {
        let found = match apply_input_rule(self.host.as_ref(), pos, text_before) {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(%err, "input rule could not insert");
                None
            }
        };
        self.host.flush();
        found.as_ref().map(JsMarkdownImage::from)
    }

    /// Every markdown image in pasted text.
    #[wasm_bindgen(js_name = findMarkdownImages)]
    pub fn find_markdown_images(&self, text: &str) -> Result<JsValue, JsError> {
        let found: Vec<JsMarkdownImage> = find_markdown_images(text)
            .iter()
            .map(JsMarkdownImage::from)
            .collect();
        serde_wasm_bindgen::to_value(&found)
            .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
    }

    /// Parse rule: the node for a `figure` or `img` element, if it matches.
    #[wasm_bindgen(js_name = parseHTML)]
    pub fn parse_html(&self, element: &HtmlElement) -> Option<JsImageNode> {
        parse_element(&self.ctx.dom, element, &self.ctx.options)
            .as_ref()
            .map(JsImageNode::from)
    }

    /// Render rule as a DOM output spec (`["figure", ["img", {..}], ["figcaption", 0]]`).
    #[wasm_bindgen(js_name = renderHTML)]
    pub fn render_spec(&self, node: JsImageNode) -> Result<JsValue, JsError> {
        let spec = render_node(&ImageNode::from(node), &self.ctx.options);
        serde_wasm_bindgen::to_value(&spec)
            .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
    }

    /// Render rule as an HTML string.
    #[wasm_bindgen(js_name = renderHTMLString)]
    pub fn render_html_string(&self, node: JsImageNode) -> String {
        render_html(&ImageNode::from(node), &self.ctx.options)
    }
}

impl JsFigureExtension {
    fn finish(&self, command: &str, result: Result<(), HostError>) -> bool {
        self.host.flush();
        match result {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(command, %err, "command failed");
                false
            }
        }
    }

    fn finish_count(&self, command: &str, result: Result<usize, HostError>) -> bool {
        let changed = matches!(result, Ok(count) if count > 0);
        self.finish(command, result.map(|_| ())) && changed
    }
}
