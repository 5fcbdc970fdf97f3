//! Parse, render and input rules for the image node.
//!
//! - Parse: `figure` elements (caption from their `figcaption`) and `img[src]`
//!   elements, optionally refusing base64 data URIs.
//! - Render: a ProseMirror-style output spec, `["img", {..}]` or
//!   `["figure", ["img", {..}], ["figcaption", 0]]`, plus a plain HTML
//!   serializer for the same shape.
//! - Input: markdown image syntax typed at the end of a text block,
//!   `![alt](src "title" =WxH)`.

use std::fmt::Write as _;
use std::ops::Range;
use std::sync::OnceLock;

use markdown_weaver_escape::{FmtWriter, escape_href, escape_html, escape_html_body_text};
use regex::Regex;
use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use smol_str::{SmolStr, ToSmolStr, format_smolstr};

use crate::attrs::{AttrKey, Dimension, ImageAttrs, is_base64_src};
use crate::dom::Dom;
use crate::host::{EditorHost, HostError};
use crate::node::ImageNode;
use crate::options::FigureOptions;

// === Input rule ===

const IMAGE_SYNTAX: &str =
    r#"!\[([^\]]*)\]\((\S+)(?:\s+["']([^"']*)["'])?(?:\s+=(\d+)?x(\d+)?)?\)"#;

/// Image syntax at the end of the text, preceded by whitespace or nothing.
fn input_regex() -> &'static Regex {
    static RE_INPUT: OnceLock<Regex> = OnceLock::new();
    RE_INPUT.get_or_init(|| {
        Regex::new(&format!(r"(?:^|\s)({IMAGE_SYNTAX})$")).expect("image input pattern is valid")
    })
}

/// Image syntax anywhere.
fn paste_regex() -> &'static Regex {
    static RE_PASTE: OnceLock<Regex> = OnceLock::new();
    RE_PASTE.get_or_init(|| Regex::new(IMAGE_SYNTAX).expect("image paste pattern is valid"))
}

/// A markdown image found in text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownImage {
    pub alt: SmolStr,
    pub src: SmolStr,
    pub title: Option<SmolStr>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Byte range of the `![..](..)` text, which the host replaces with the node.
    pub range: Range<usize>,
}

impl MarkdownImage {
    /// `first` is the index of the group holding the whole `![..](..)`.
    fn from_captures(caps: &regex::Captures<'_>, first: usize) -> Option<Self> {
        let group = |offset: usize| caps.get(first + offset);
        Some(Self {
            range: group(0)?.range(),
            alt: group(1).map(|m| m.as_str().to_smolstr()).unwrap_or_default(),
            src: group(2)?.as_str().to_smolstr(),
            title: group(3).map(|m| m.as_str().to_smolstr()),
            width: group(4).and_then(|m| m.as_str().parse().ok()),
            height: group(5).and_then(|m| m.as_str().parse().ok()),
        })
    }

    pub fn attrs(&self) -> ImageAttrs {
        let mut attrs = ImageAttrs::with_src(self.src.clone());
        attrs.set_alt(Some(self.alt.clone()));
        attrs.set_title(self.title.clone());
        attrs.set_width(self.width.map(Dimension::Px));
        attrs.set_height(self.height.map(Dimension::Px));
        attrs
    }
}

/// Match markdown image syntax ending at the end of `text`.
pub fn match_markdown_image(text: &str) -> Option<MarkdownImage> {
    let caps = input_regex().captures(text)?;
    MarkdownImage::from_captures(&caps, 1)
}

/// Every markdown image in `text`, in order. Used for pasted plain text.
pub fn find_markdown_images(text: &str) -> Vec<MarkdownImage> {
    paste_regex()
        .captures_iter(text)
        .filter_map(|caps| MarkdownImage::from_captures(&caps, 0))
        .collect()
}

/// Run the input rule over the text before the cursor. On a match an image
/// node is inserted at `pos` and the match is returned so the host can remove
/// the typed syntax. Anything that does not match inserts nothing.
pub fn apply_input_rule<H: EditorHost + ?Sized>(
    host: &H,
    pos: usize,
    text_before: &str,
) -> Result<Option<MarkdownImage>, HostError> {
    let Some(found) = match_markdown_image(text_before) else {
        return Ok(None);
    };
    host.insert_node(pos, ImageNode::image(found.attrs()))?;
    tracing::debug!(pos, src = %found.src, "image inserted from markdown");
    Ok(Some(found))
}

// === Parse rules ===

/// Parse an element into an image node, if one of the rules matches it.
pub fn parse_element<D: Dom>(dom: &D, element: &D::Element, options: &FigureOptions) -> Option<ImageNode> {
    match dom.tag_name(element).as_str() {
        "figure" => {
            let image = dom.find_descendant(element, "img")?;
            let attrs = parse_image(dom, &image, options)?;
            let caption = dom
                .find_descendant(element, "figcaption")
                .map(|c| dom.text_content(&c))
                .unwrap_or_default();
            Some(ImageNode::figure(attrs, caption.trim()))
        }
        "img" => parse_image(dom, element, options).map(ImageNode::image),
        _ => None,
    }
}

/// Attributes of an `img[src]` element. Base64 sources are refused unless
/// the options allow them.
pub fn parse_image<D: Dom>(dom: &D, element: &D::Element, options: &FigureOptions) -> Option<ImageAttrs> {
    let src = dom.get_attribute(element, "src")?;
    if !options.allow_base64 && is_base64_src(&src) {
        tracing::trace!("refusing base64 image source");
        return None;
    }
    let mut attrs = ImageAttrs::with_src(src);
    for key in [AttrKey::Alt, AttrKey::Title, AttrKey::Width, AttrKey::Height] {
        attrs.set(key, dom.get_attribute(element, key.as_str()).as_deref());
    }
    attrs.set_style(Some(parse_style(
        dom.get_attribute(element, "width").as_deref(),
        &dom.css_text(element),
    )));
    Some(attrs)
}

/// The `style` attribute for a parsed element: an explicit `width` attribute
/// becomes a pixel width, otherwise the element's own style is kept. An empty
/// result leaves the default style in charge.
pub fn parse_style(width_attr: Option<&str>, css_text: &str) -> SmolStr {
    match width_attr.map(str::trim).filter(|w| !w.is_empty()) {
        Some(width) => {
            let width = width.strip_suffix("px").unwrap_or(width);
            format_smolstr!("width: {width}px; height: auto; cursor: pointer;")
        }
        None => css_text.to_smolstr(),
    }
}

// === Render rule ===

/// A ProseMirror DOM output spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSpec {
    Element {
        tag: &'static str,
        attrs: Vec<(SmolStr, SmolStr)>,
        children: Vec<OutputSpec>,
    },
    /// Where the node's content goes (`0` in the serialized form).
    Hole,
}

impl Serialize for OutputSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OutputSpec::Hole => serializer.serialize_u8(0),
            OutputSpec::Element {
                tag,
                attrs,
                children,
            } => {
                let with_attrs = !attrs.is_empty();
                let len = 1 + usize::from(with_attrs) + children.len();
                let mut seq = serializer.serialize_seq(Some(len))?;
                seq.serialize_element(tag)?;
                if with_attrs {
                    seq.serialize_element(&AttrMap(attrs))?;
                }
                for child in children {
                    seq.serialize_element(child)?;
                }
                seq.end()
            }
        }
    }
}

struct AttrMap<'a>(&'a [(SmolStr, SmolStr)]);

impl Serialize for AttrMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

/// Output spec for `node`. Extra `HTMLAttributes` from the options go on the
/// `img` first; the node's own attributes override them.
pub fn render_node(node: &ImageNode, options: &FigureOptions) -> OutputSpec {
    let mut attrs: Vec<(SmolStr, SmolStr)> = options
        .html_attributes
        .iter()
        .filter(|(name, _)| AttrKey::from_name(name).is_none_or(|key| node.attrs.get(key).is_none()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    attrs.extend(node.attrs.iter().map(|(key, value)| (key.as_str().into(), value)));

    let image = OutputSpec::Element {
        tag: "img",
        attrs,
        children: Vec::new(),
    };
    if node.has_caption() {
        OutputSpec::Element {
            tag: "figure",
            attrs: Vec::new(),
            children: vec![
                image,
                OutputSpec::Element {
                    tag: "figcaption",
                    attrs: Vec::new(),
                    children: vec![OutputSpec::Hole],
                },
            ],
        }
    } else {
        image
    }
}

/// Serialize `node` to an HTML string, filling the content hole with the
/// escaped caption text.
pub fn render_html(node: &ImageNode, options: &FigureOptions) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_spec(&mut out, &render_node(node, options), &node.caption_text());
    out
}

fn write_spec(out: &mut String, spec: &OutputSpec, content: &str) -> std::fmt::Result {
    match spec {
        OutputSpec::Hole => escape_html_body_text(FmtWriter(&mut *out), content),
        OutputSpec::Element {
            tag,
            attrs,
            children,
        } => {
            write!(out, "<{tag}")?;
            for (name, value) in attrs {
                write!(out, " {name}=\"")?;
                if name == "src" {
                    escape_href(FmtWriter(&mut *out), value)?;
                } else {
                    escape_html(FmtWriter(&mut *out), value)?;
                }
                out.push('"');
            }
            out.push('>');
            if *tag == "img" {
                return Ok(());
            }
            for child in children {
                write_spec(out, child, content)?;
            }
            write!(out, "</{tag}>")
        }
    }
}
