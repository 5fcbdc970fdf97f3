//! Types exposed to JavaScript via wasm-bindgen.

use figure_view_core::{Dimension, ImageAttrs, ImageNode, MarkdownImage};
use serde::{Deserialize, Serialize};
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

/// A width or height: whole pixels, or any other CSS length as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(untagged)]
pub enum JsDimension {
    Px(u32),
    Raw(String),
}

/// Image node attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase", default)]
pub struct JsImageAttrs {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[tsify(optional)]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[tsify(optional)]
    pub alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[tsify(optional)]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[tsify(optional)]
    pub width: Option<JsDimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[tsify(optional)]
    pub height: Option<JsDimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[tsify(optional)]
    pub style: Option<String>,
}

/// An image node as the host sees it. An empty caption means a plain image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct JsImageNode {
    #[serde(default)]
    pub attrs: JsImageAttrs,
    #[serde(default)]
    pub caption: String,
}

/// An image node together with its document position.
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct JsPositionedNode {
    pub pos: usize,
    pub node: JsImageNode,
}

/// The host selection as a position range.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct JsSelection {
    pub from: usize,
    pub to: usize,
}

/// Markdown image syntax found in text. `from`/`to` are byte offsets of the
/// matched syntax.
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct JsMarkdownImage {
    pub attrs: JsImageAttrs,
    pub from: usize,
    pub to: usize,
}

impl From<JsDimension> for Dimension {
    fn from(value: JsDimension) -> Self {
        match value {
            JsDimension::Px(px) => Dimension::Px(px),
            JsDimension::Raw(raw) => Dimension::Raw(raw.into()),
        }
    }
}

impl From<&Dimension> for JsDimension {
    fn from(value: &Dimension) -> Self {
        match value {
            Dimension::Px(px) => JsDimension::Px(*px),
            Dimension::Raw(raw) => JsDimension::Raw(raw.to_string()),
        }
    }
}

impl From<JsImageAttrs> for ImageAttrs {
    fn from(js: JsImageAttrs) -> Self {
        let mut attrs = ImageAttrs::new();
        attrs.set_src(js.src);
        attrs.set_alt(js.alt);
        attrs.set_title(js.title);
        attrs.set_width(js.width.map(Dimension::from));
        attrs.set_height(js.height.map(Dimension::from));
        attrs.set_style(js.style);
        attrs
    }
}

impl From<&ImageAttrs> for JsImageAttrs {
    fn from(attrs: &ImageAttrs) -> Self {
        Self {
            src: attrs.src().map(str::to_string),
            alt: attrs.alt().map(str::to_string),
            title: attrs.title().map(str::to_string),
            width: attrs.width().map(JsDimension::from),
            height: attrs.height().map(JsDimension::from),
            style: attrs.style().map(str::to_string),
        }
    }
}

impl From<JsImageNode> for ImageNode {
    fn from(js: JsImageNode) -> Self {
        ImageNode::figure(js.attrs.into(), &js.caption)
    }
}

impl From<&ImageNode> for JsImageNode {
    fn from(node: &ImageNode) -> Self {
        Self {
            attrs: JsImageAttrs::from(&node.attrs),
            caption: node.caption_text(),
        }
    }
}

impl From<&MarkdownImage> for JsMarkdownImage {
    fn from(found: &MarkdownImage) -> Self {
        Self {
            attrs: JsImageAttrs::from(&found.attrs()),
            from: found.range.start,
            to: found.range.end,
        }
    }
}

#[wasm_bindgen(typescript_custom_section)]
const FIGURE_OPTIONS_TS: &'static str = r#"
export interface FigureOptions {
    inline?: boolean;
    allowBase64?: boolean;
    HTMLAttributes?: Record<string, string>;
    resizable?: boolean;
    alignable?: boolean;
    captionEnabled?: boolean;
    deletable?: boolean;
    captionPlaceholder?: string;
    mobileBreakpoint?: number;
    defaultStyle?: string;
    icons?: {
        alignLeft?: string;
        alignCenter?: string;
        alignRight?: string;
        captionAdd?: string;
        captionRemove?: string;
        delete?: string;
    };
}

export interface FigureHost {
    isEditable(): boolean;
    nodeAt(pos: number): JsImageNode | null | undefined;
    setNodeAttrs(pos: number, attrs: JsImageAttrs): void;
    setNodeContent(pos: number, caption: string): void;
    insertNode(pos: number, node: JsImageNode): void;
    deleteNode(pos: number): void;
    setNodeSelection(pos: number): void;
    focus(): void;
    selection(): JsSelection;
    imageNodesBetween(from: number, to: number): JsPositionedNode[];
}
"#;
