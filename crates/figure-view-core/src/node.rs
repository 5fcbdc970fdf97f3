//! The structural image node and how its render mode is derived.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::attrs::ImageAttrs;
use crate::dom::Dom;

/// Inline child of an image node. Captions are plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InlineNode {
    Text { text: SmolStr },
}

impl InlineNode {
    pub fn text(text: impl Into<SmolStr>) -> Self {
        InlineNode::Text { text: text.into() }
    }

    pub fn as_text(&self) -> &str {
        match self {
            InlineNode::Text { text } => text,
        }
    }
}

/// How a node renders. There is no stored flag for this: it is always
/// derived from whether the node has content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeMode {
    /// `div` wrapper around a bare image.
    Image,
    /// `figure` wrapper with an image and a `figcaption`.
    Figure,
}

impl NodeMode {
    /// Tag name of the wrapper element for this mode.
    pub fn wrapper_tag(self) -> &'static str {
        match self {
            NodeMode::Image => "div",
            NodeMode::Figure => "figure",
        }
    }
}

/// The persisted document node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageNode {
    pub attrs: ImageAttrs,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<InlineNode>,
}

impl ImageNode {
    /// A plain image node (no content).
    pub fn image(attrs: ImageAttrs) -> Self {
        Self {
            attrs,
            content: Vec::new(),
        }
    }

    /// An image node with a caption. An empty caption yields a plain image.
    pub fn figure(attrs: ImageAttrs, caption: &str) -> Self {
        Self {
            attrs,
            content: caption_content(caption),
        }
    }

    pub fn has_caption(&self) -> bool {
        !self.content.is_empty()
    }

    pub fn mode(&self) -> NodeMode {
        if self.has_caption() {
            NodeMode::Figure
        } else {
            NodeMode::Image
        }
    }

    pub fn caption_text(&self) -> String {
        self.content.iter().map(InlineNode::as_text).collect()
    }
}

/// Content for a caption string. Empty text yields no content at all.
pub fn caption_content(caption: &str) -> Vec<InlineNode> {
    if caption.is_empty() {
        Vec::new()
    } else {
        vec![InlineNode::text(caption)]
    }
}

/// Whether a rendered widget currently shows a caption.
///
/// This is the one place that answers the question from the DOM side: a
/// caption element must exist and hold non-blank text.
pub fn caption_present<D: Dom>(dom: &D, caption: Option<&D::Element>) -> bool {
    caption.is_some_and(|el| !dom.text_content(el).trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDom;

    #[test]
    fn test_mode_follows_content() {
        let attrs = ImageAttrs::with_src("a.png");
        assert_eq!(ImageNode::image(attrs.clone()).mode(), NodeMode::Image);
        assert_eq!(
            ImageNode::figure(attrs.clone(), "A cat").mode(),
            NodeMode::Figure
        );
        assert_eq!(ImageNode::figure(attrs, "").mode(), NodeMode::Image);
    }

    #[test]
    fn test_caption_text_concatenates() {
        let node = ImageNode {
            attrs: ImageAttrs::new(),
            content: vec![InlineNode::text("A "), InlineNode::text("cat")],
        };
        assert_eq!(node.caption_text(), "A cat");
    }

    #[test]
    fn test_caption_present_needs_text() {
        let dom = MemoryDom::new();
        let cap = dom.create_element("figcaption").unwrap();
        assert!(!caption_present(&dom, None));
        assert!(!caption_present(&dom, Some(&cap)));
        dom.set_text_content(&cap, "  ");
        assert!(!caption_present(&dom, Some(&cap)));
        dom.set_text_content(&cap, "Caption");
        assert!(caption_present(&dom, Some(&cap)));
    }

    #[test]
    fn test_serde_shape() {
        let node = ImageNode::figure(ImageAttrs::with_src("a.png"), "hi");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "attrs": { "src": "a.png" },
                "content": [{ "type": "text", "text": "hi" }]
            })
        );
    }
}
