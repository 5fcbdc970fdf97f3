//! Structural conversion of a rendered wrapper between image and figure.
//!
//! Both directions build a fresh wrapper, copy the old wrapper's attributes,
//! move the existing `img` across (so listeners and load state survive) and
//! swap the new wrapper into the old one's place. Overlay controls left in
//! the old wrapper go away with it.

use crate::dom::{Dom, DomError};
use crate::host::EditorHost;
use crate::node::NodeMode;
use crate::overlay::OVERLAY_ATTR;

/// Elements of a wrapper after conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Converted<E> {
    pub wrapper: E,
    /// `None` when the source wrapper held no image. The conversion still
    /// completes, leaving an empty wrapper behind.
    pub image: Option<E>,
    pub caption: Option<E>,
}

/// Turn a `div` wrapper into a `figure` with a caption seeded with `placeholder`.
pub fn image_to_figure<D: Dom>(
    dom: &D,
    wrapper: &D::Element,
    placeholder: &str,
) -> Result<Converted<D::Element>, DomError> {
    let (figure, image) = rewrap(dom, wrapper, NodeMode::Figure)?;
    let caption = dom.create_element("figcaption")?;
    dom.set_text_content(&caption, placeholder);
    dom.append_child(&figure, &caption)?;
    dom.replace_with(wrapper, &figure)?;
    tracing::debug!(old = ?wrapper, new = ?figure, "image converted to figure");
    Ok(Converted {
        wrapper: figure,
        image,
        caption: Some(caption),
    })
}

/// Turn a `figure` wrapper back into a `div`, discarding the caption element.
pub fn figure_to_image<D: Dom>(
    dom: &D,
    wrapper: &D::Element,
) -> Result<Converted<D::Element>, DomError> {
    let (div, image) = rewrap(dom, wrapper, NodeMode::Image)?;
    dom.replace_with(wrapper, &div)?;
    tracing::debug!(old = ?wrapper, new = ?div, "figure converted to image");
    Ok(Converted {
        wrapper: div,
        image,
        caption: None,
    })
}

/// Select the node at its position after a conversion.
///
/// `position` is looked up after the new wrapper is in place. Returns whether
/// a selection was set.
pub fn restore_selection<H: EditorHost + ?Sized>(host: &H, position: Option<usize>) -> bool {
    let Some(pos) = position else {
        tracing::trace!("no position after conversion, leaving selection alone");
        return false;
    };
    match host.set_node_selection(pos) {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(pos, %err, "could not restore selection after conversion");
            false
        }
    }
}

/// The widget's own image inside `wrapper`, skipping overlay subtrees (whose
/// icons are images too).
pub fn widget_image<D: Dom>(dom: &D, wrapper: &D::Element) -> Option<D::Element> {
    for child in dom.children(wrapper) {
        if dom.get_attribute(&child, OVERLAY_ATTR).is_some() {
            continue;
        }
        if dom.tag_name(&child) == "img" {
            return Some(child);
        }
        if let Some(found) = widget_image(dom, &child) {
            return Some(found);
        }
    }
    None
}

fn rewrap<D: Dom>(
    dom: &D,
    wrapper: &D::Element,
    mode: NodeMode,
) -> Result<(D::Element, Option<D::Element>), DomError> {
    let new_wrapper = dom.create_element(mode.wrapper_tag())?;
    dom.copy_attributes(wrapper, &new_wrapper)?;
    let image = widget_image(dom, wrapper);
    match &image {
        Some(image) => dom.append_child(&new_wrapper, image)?,
        None => tracing::warn!(?wrapper, "no image inside wrapper, producing an empty one"),
    }
    Ok((new_wrapper, image))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDom;

    #[test]
    fn test_roundtrip_preserves_attrs_and_image() {
        let dom = MemoryDom::new();
        let wrapper = dom.create_element("div").unwrap();
        dom.set_attribute(&wrapper, "style", "width: 100%;").unwrap();
        dom.set_attribute(&wrapper, "data-id", "7").unwrap();
        let image = dom.create_element("img").unwrap();
        dom.set_attribute(&image, "src", "a.png").unwrap();
        dom.set_attribute(&image, "alt", "x").unwrap();
        dom.append_child(&wrapper, &image).unwrap();
        dom.append_child(&dom.root(), &wrapper).unwrap();
        let before = dom.outer_html(&wrapper);

        let figure = image_to_figure(&dom, &wrapper, "Caption").unwrap();
        assert_eq!(dom.tag_name(&figure.wrapper), "figure");
        assert_eq!(figure.image, Some(image));
        assert_eq!(dom.text_content(figure.caption.as_ref().unwrap()), "Caption");
        assert!(!dom.is_connected(&wrapper));

        let back = figure_to_image(&dom, &figure.wrapper).unwrap();
        assert_eq!(back.image, Some(image));
        assert_eq!(back.caption, None);
        assert_eq!(dom.find_descendant(&back.wrapper, "figcaption"), None);
        assert_eq!(dom.outer_html(&back.wrapper), before);
        assert_eq!(dom.children(&dom.root()), vec![back.wrapper]);
    }

    #[test]
    fn test_missing_image_degrades() {
        let dom = MemoryDom::new();
        let wrapper = dom.create_element("div").unwrap();
        dom.append_child(&dom.root(), &wrapper).unwrap();
        let converted = image_to_figure(&dom, &wrapper, "Caption").unwrap();
        assert_eq!(converted.image, None);
        assert_eq!(dom.children(&converted.wrapper).len(), 1);
        assert!(dom.is_connected(&converted.wrapper));
    }

    #[test]
    fn test_overlay_icons_are_not_moved() {
        let dom = MemoryDom::new();
        let wrapper = dom.create_element("div").unwrap();
        let container = dom.create_element("div").unwrap();
        dom.set_attribute(&container, OVERLAY_ATTR, "alignment").unwrap();
        let icon = dom.create_element("img").unwrap();
        dom.append_child(&container, &icon).unwrap();
        dom.append_child(&wrapper, &container).unwrap();
        let image = dom.create_element("img").unwrap();
        dom.append_child(&wrapper, &image).unwrap();

        let converted = image_to_figure(&dom, &wrapper, "Caption").unwrap();
        assert_eq!(converted.image, Some(image));
        assert_eq!(dom.parent(&icon), Some(container));
    }
}
