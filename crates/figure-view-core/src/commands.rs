//! Editor commands exposed by the extension.
//!
//! Commands operate on the host document directly and never on rendered
//! widgets; the host re-renders whatever they change.

use crate::attrs::ImageAttrs;
use crate::host::{EditorHost, HostError};
use crate::node::{ImageNode, InlineNode, caption_content};
use crate::options::FigureOptions;

/// Insert a plain image at the start of the selection. Returns its position.
pub fn set_image<H: EditorHost + ?Sized>(host: &H, attrs: ImageAttrs) -> Result<usize, HostError> {
    insert_at_selection(host, ImageNode::image(attrs))
}

/// Insert an image with a caption at the start of the selection. An empty
/// caption is replaced by the placeholder so the node is always a figure.
pub fn set_image_figure<H: EditorHost + ?Sized>(
    host: &H,
    attrs: ImageAttrs,
    caption: &str,
    options: &FigureOptions,
) -> Result<usize, HostError> {
    let caption = match caption.trim() {
        "" => options.caption_placeholder.as_str(),
        _ => caption,
    };
    insert_at_selection(host, ImageNode::figure(attrs, caption))
}

/// Give every uncaptioned image in the selection a placeholder caption.
/// Returns how many nodes changed.
pub fn convert_to_figure<H: EditorHost + ?Sized>(
    host: &H,
    options: &FigureOptions,
) -> Result<usize, HostError> {
    convert_selected(host, |node| {
        (!node.has_caption()).then(|| caption_content(&options.caption_placeholder))
    })
}

/// Drop the caption of every captioned image in the selection. Returns how
/// many nodes changed.
pub fn convert_to_image<H: EditorHost + ?Sized>(host: &H) -> Result<usize, HostError> {
    convert_selected(host, |node| node.has_caption().then(Vec::new))
}

fn insert_at_selection<H: EditorHost + ?Sized>(host: &H, node: ImageNode) -> Result<usize, HostError> {
    if !host.is_editable() {
        return Err(HostError::ReadOnly);
    }
    let pos = host.selection().start;
    host.insert_node(pos, node)?;
    if let Err(err) = host.set_node_selection(pos) {
        tracing::warn!(pos, %err, "could not select inserted image");
    }
    tracing::debug!(pos, "image inserted");
    Ok(pos)
}

fn convert_selected<H, F>(host: &H, new_content: F) -> Result<usize, HostError>
where
    H: EditorHost + ?Sized,
    F: Fn(&ImageNode) -> Option<Vec<InlineNode>>,
{
    let selection = host.selection();
    // A collapsed selection still covers the node right after it.
    let range = selection.start..selection.end.max(selection.start + 1);
    let targets = host.image_nodes_between(range);

    let mut changed = Vec::new();
    for (pos, node) in targets.iter().rev() {
        if let Some(content) = new_content(node) {
            host.set_node_content(*pos, content)?;
            changed.push(*pos);
        }
    }
    if let &[pos] = changed.as_slice() {
        if let Err(err) = host.set_node_selection(pos) {
            tracing::warn!(pos, %err, "could not restore selection after conversion");
        }
    }
    tracing::debug!(count = changed.len(), "converted selected images");
    Ok(changed.len())
}
