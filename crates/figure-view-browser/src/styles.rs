//! The overlay stylesheet.
//!
//! Most control styling is inline, set when the controls are mounted. The
//! few rules that inline styles cannot express (hover states, the button
//! reset) live here and are injected once per document, scoped to the
//! editor root so they never leak onto the host page.

use std::sync::LazyLock;

use figure_view_core::DomError;
use regex::{Captures, Regex};
use wasm_bindgen::JsValue;
use web_sys::Document;

/// Id of the injected `<style>` element.
pub const STYLESHEET_ID: &str = "figure-view-styles";

pub const OVERLAY_CSS: &str = r#"
[data-figure-overlay] {
    z-index: 10;
    user-select: none;
}
[data-figure-overlay="alignment"] {
    position: absolute;
    top: 0%;
    left: 50%;
    transform: translate(-50%, -50%);
    display: flex;
    gap: 4px;
    padding: 2px 6px;
    border: 1px solid #6C6C6C;
    border-radius: 6px;
    background: #ffffff;
}
[data-figure-overlay="delete"] {
    position: absolute;
    top: 6px;
    right: 6px;
}
[data-figure-control] {
    cursor: pointer;
    background: none;
    border: none;
    padding: 0;
}
[data-figure-control] img {
    width: 24px;
    height: 24px;
    opacity: 0.6;
}
[data-figure-control]:hover img {
    opacity: 1;
}
[data-figure-overlay="resize-handle"] {
    background: #ffffff;
}
[data-figure-overlay="resize-handle"]:hover {
    background: #6C6C6C;
}
"#;

static RULE_PRELUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^{}]+)\{").expect("static regex is valid"));

/// Prefix every selector in `css` with `scope`, so `.a, .b:hover { .. }`
/// becomes `<scope> .a, <scope> .b:hover { .. }`.
///
/// At-rule preludes (`@media ..`) are left alone; the rules nested in them
/// are scoped like any other.
pub fn scope_css(css: &str, scope: &str) -> String {
    RULE_PRELUDE
        .replace_all(css, |caps: &Captures| {
            let prelude = &caps[1];
            let selectors = prelude.trim();
            if selectors.is_empty() || selectors.starts_with('@') {
                return format!("{prelude}{{");
            }
            let leading = &prelude[..prelude.len() - prelude.trim_start().len()];
            let scoped = selectors
                .split(',')
                .map(|selector| format!("{scope} {}", selector.trim()))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{leading}{scoped} {{")
        })
        .into_owned()
}

/// Add the overlay stylesheet to `document`, scoped to `scope`. Returns
/// `false` if it was already there.
pub fn install_stylesheet(document: &Document, scope: &str) -> Result<bool, DomError> {
    if document.get_element_by_id(STYLESHEET_ID).is_some() {
        return Ok(false);
    }
    let style = document.create_element("style").map_err(js_err)?;
    style.set_id(STYLESHEET_ID);
    style.set_text_content(Some(&scope_css(OVERLAY_CSS, scope)));
    let head = document
        .head()
        .ok_or_else(|| DomError::from("document has no <head>"))?;
    head.append_child(&style).map_err(js_err)?;
    tracing::debug!(scope, "overlay stylesheet installed");
    Ok(true)
}

fn js_err(err: JsValue) -> DomError {
    DomError(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}
