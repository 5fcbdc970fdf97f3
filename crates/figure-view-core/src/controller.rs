//! The node view: one image widget's DOM subtree and its write-back path.
//!
//! A [`NodeView`] is created per rendered image node. It builds the wrapper,
//! image and optional caption, reacts to clicks, gestures and overlay intents
//! handed to it by a platform layer, and writes every user-visible change back
//! to the host document through [`EditorHost`]. It never registers listeners
//! itself; see the browser crate for that side.

use std::rc::Rc;

use crate::attrs::{AttrKey, Dimension, ImageAttrs};
use crate::coordinator::{Activation, Coordinator, SharedCoordinator};
use crate::dom::{Dom, DomError};
use crate::error::FigureError;
use crate::gesture::{Corner, PointerSource, ResizeOutcome, ResizeSession};
use crate::host::EditorHost;
use crate::mutator::{figure_to_image, image_to_figure, restore_selection, widget_image};
use crate::node::{ImageNode, caption_content, caption_present};
use crate::options::FigureOptions;
use crate::overlay::{self, ControlKind, OverlayConfig, OverlayControls, OverlayIntent};
use crate::style::px;

/// Looks up the node's current document position. `None` when the host
/// cannot tell (the node is being removed, or the host has no positions).
pub type GetPos = Rc<dyn Fn() -> Option<usize>>;

/// What every node view of one editor shares.
#[derive(Clone)]
pub struct ViewContext<D: Dom> {
    pub dom: D,
    pub coordinator: SharedCoordinator<D::Element>,
    pub options: Rc<FigureOptions>,
}

impl<D: Dom> ViewContext<D> {
    pub fn new(dom: D, options: FigureOptions) -> Self {
        Self {
            dom,
            coordinator: Coordinator::shared(),
            options: Rc::new(options),
        }
    }
}

/// Result of a click on the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Read-only editor, destroyed view, or the click was not inside the widget.
    Ignored,
    AlreadyActive,
    /// Controls were mounted.
    Activated,
}

/// Result of handling an overlay intent or finishing a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentOutcome {
    /// The document was updated in place.
    Applied,
    /// The wrapper element was replaced. Listeners bound to the old wrapper
    /// must be moved, and [`NodeView::settle`] should run once the DOM has
    /// settled.
    Rebuilt,
    /// The node was removed from the document.
    Deleted,
    /// Nothing was written.
    Skipped,
}

#[derive(Debug)]
struct ResizeDrag {
    session: ResizeSession,
    wrapper_css: String,
    image_css: String,
}

/// Node view for one image node.
pub struct NodeView<D: Dom> {
    ctx: ViewContext<D>,
    node: ImageNode,
    get_pos: Option<GetPos>,
    editable: bool,
    wrapper: D::Element,
    image: D::Element,
    caption: Option<D::Element>,
    overlay: Option<OverlayControls<D::Element>>,
    drag: Option<ResizeDrag>,
    rebuilt: bool,
    pending_settle: bool,
    destroyed: bool,
}

impl<D: Dom> std::fmt::Debug for NodeView<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeView")
            .field("node", &self.node)
            .field("editable", &self.editable)
            .field("wrapper", &self.wrapper)
            .field("caption", &self.caption)
            .field("resizing", &self.drag.is_some())
            .finish_non_exhaustive()
    }
}

impl<D: Dom> NodeView<D> {
    /// Render `node`. Nothing is attached to the document; the host mounts
    /// [`NodeView::dom`] where it wants it.
    pub fn new<H: EditorHost + ?Sized>(
        ctx: ViewContext<D>,
        host: &H,
        node: ImageNode,
        get_pos: Option<GetPos>,
    ) -> Result<Self, FigureError> {
        let dom = &ctx.dom;
        let wrapper = dom.create_element(node.mode().wrapper_tag())?;
        dom.set_css_text(
            &wrapper,
            node.attrs.style().unwrap_or(ctx.options.default_style.as_str()),
        );

        let image = dom.create_element("img")?;
        apply_image_attrs(dom, &image, &node.attrs, &ctx.options.default_style)?;
        dom.append_child(&wrapper, &image)?;

        let caption = if node.has_caption() {
            let caption = dom.create_element("figcaption")?;
            dom.set_text_content(&caption, &node.caption_text());
            dom.append_child(&wrapper, &caption)?;
            Some(caption)
        } else {
            None
        };

        let editable = host.is_editable();
        tracing::trace!(mode = ?node.mode(), editable, "node view created");
        Ok(Self {
            ctx,
            node,
            get_pos,
            editable,
            wrapper,
            image,
            caption,
            overlay: None,
            drag: None,
            rebuilt: false,
            pending_settle: false,
            destroyed: false,
        })
    }

    /// The outer element of the widget.
    pub fn dom(&self) -> &D::Element {
        &self.wrapper
    }

    /// The editable region the host renders inline content into: the caption
    /// when there is one, otherwise nothing.
    pub fn content_dom(&self) -> Option<&D::Element> {
        self.caption.as_ref()
    }

    pub fn image(&self) -> &D::Element {
        &self.image
    }

    pub fn node(&self) -> &ImageNode {
        &self.node
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn is_resizing(&self) -> bool {
        self.drag.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.ctx
            .coordinator
            .borrow_mut()
            .is_active(&self.ctx.dom, &self.wrapper)
    }

    /// Mounted controls, if this widget is the active one.
    pub fn controls(&self) -> Option<&OverlayControls<D::Element>> {
        if self.is_active() {
            self.overlay.as_ref()
        } else {
            None
        }
    }

    /// Whether a caption toggle is waiting for [`NodeView::settle`].
    pub fn needs_settle(&self) -> bool {
        self.pending_settle
    }

    /// The click intent of the control under `target`, if any.
    pub fn control_intent(&self, target: &D::Element) -> Option<OverlayIntent> {
        self.control_at(target).and_then(ControlKind::click_intent)
    }

    /// The resize handle under `target`, if any.
    pub fn resize_handle(&self, target: &D::Element) -> Option<Corner> {
        match self.control_at(target)? {
            ControlKind::Resize(corner) => Some(corner),
            _ => None,
        }
    }

    fn control_at(&self, target: &D::Element) -> Option<ControlKind> {
        if !self.editable || self.destroyed {
            return None;
        }
        overlay::control_kind(&self.ctx.dom, &self.wrapper, target)
    }

    fn position(&self) -> Option<usize> {
        self.get_pos.as_ref().and_then(|get_pos| get_pos())
    }

    // === Activation ===

    /// Click on `target` inside the widget. Activates it through the
    /// coordinator and mounts controls.
    pub fn click(&mut self, target: &D::Element) -> ClickOutcome {
        if !self.editable || self.destroyed {
            return ClickOutcome::Ignored;
        }
        let dom = self.ctx.dom.clone();
        if !dom.contains(&self.wrapper, target) {
            return ClickOutcome::Ignored;
        }

        let viewport = dom.viewport_width();
        if self.ctx.options.is_small_screen(viewport) {
            dom.release_focus();
        }

        let activation = self
            .ctx
            .coordinator
            .borrow_mut()
            .activate(&dom, &self.wrapper, target);
        match activation {
            Activation::AlreadyActive => ClickOutcome::AlreadyActive,
            Activation::Activated { .. } => {
                self.show_controls(viewport);
                ClickOutcome::Activated
            }
        }
    }

    /// Document-level click. Returns whether this widget was dismissed.
    pub fn document_click(&mut self, target: &D::Element) -> bool {
        if !self.editable || self.destroyed {
            return false;
        }
        let dismissed = self
            .ctx
            .coordinator
            .borrow_mut()
            .dismiss_outside(&self.ctx.dom, target);
        if dismissed.as_ref() == Some(&self.wrapper) {
            self.overlay = None;
            true
        } else {
            false
        }
    }

    /// Re-derive control visibility after a caption toggle. Re-activates the
    /// widget with controls matching its new shape.
    pub fn settle(&mut self) -> bool {
        if !std::mem::take(&mut self.pending_settle) || self.destroyed || !self.editable {
            return false;
        }
        let dom = self.ctx.dom.clone();
        if !dom.is_connected(&self.wrapper) {
            tracing::trace!("widget left the document before settling");
            return false;
        }
        let wrapper = self.wrapper.clone();
        let activation = self
            .ctx
            .coordinator
            .borrow_mut()
            .activate(&dom, &wrapper, &wrapper);
        if let Activation::Activated { .. } = activation {
            self.show_controls(dom.viewport_width());
        }
        true
    }

    fn show_controls(&mut self, viewport: f64) {
        let dom = &self.ctx.dom;
        let config = OverlayConfig::from_options(&self.ctx.options, viewport);
        let mounted = overlay::highlight(dom, &self.wrapper).and_then(|()| {
            overlay::mount(
                dom,
                &self.wrapper,
                caption_present(dom, self.caption.as_ref()),
                &config,
            )
        });
        match mounted {
            Ok(controls) => self.overlay = Some(controls),
            Err(err) => {
                tracing::warn!(%err, "could not mount overlay controls");
                self.ctx.coordinator.borrow_mut().release(dom, &self.wrapper);
                self.overlay = None;
            }
        }
    }

    // === Intents ===

    /// Apply an overlay intent. Failures are logged and reported as
    /// [`IntentOutcome::Skipped`].
    pub fn handle_intent<H: EditorHost + ?Sized>(
        &mut self,
        host: &H,
        intent: OverlayIntent,
    ) -> IntentOutcome {
        if !self.editable || self.destroyed {
            return IntentOutcome::Skipped;
        }
        match self.try_intent(host, intent) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(?intent, %err, "overlay intent failed");
                IntentOutcome::Skipped
            }
        }
    }

    fn try_intent<H: EditorHost + ?Sized>(
        &mut self,
        host: &H,
        intent: OverlayIntent,
    ) -> Result<IntentOutcome, FigureError> {
        match intent {
            OverlayIntent::Align(alignment) => {
                let dom = &self.ctx.dom;
                let before = dom.css_text(&self.image);
                alignment.apply(dom, &self.image)?;
                self.write_or_restore(host, |_| {}, None, before)
            }
            OverlayIntent::Resize { width } => {
                let wrapper_css = self.ctx.dom.css_text(&self.wrapper);
                let image_css = self.ctx.dom.css_text(&self.image);
                self.set_live_width(width)?;
                self.commit_width(host, width, wrapper_css, image_css)
            }
            OverlayIntent::CaptionAdd => self.toggle_caption(host, true),
            OverlayIntent::CaptionRemove => self.toggle_caption(host, false),
            OverlayIntent::Delete => {
                let Some(pos) = self.position() else {
                    tracing::trace!("no position, delete skipped");
                    return Ok(IntentOutcome::Skipped);
                };
                self.ctx
                    .coordinator
                    .borrow_mut()
                    .release(&self.ctx.dom, &self.wrapper);
                self.overlay = None;
                host.delete_node(pos)?;
                tracing::debug!(pos, "image deleted");
                Ok(IntentOutcome::Deleted)
            }
        }
    }

    fn toggle_caption<H: EditorHost + ?Sized>(
        &mut self,
        host: &H,
        add: bool,
    ) -> Result<IntentOutcome, FigureError> {
        let dom = self.ctx.dom.clone();
        if caption_present(&dom, self.caption.as_ref()) == add {
            tracing::trace!(add, "caption already in the requested state");
            return Ok(IntentOutcome::Skipped);
        }
        if widget_image(&dom, &self.wrapper).is_none() {
            return Err(FigureError::MissingImage);
        }
        let Some(pos) = self.position() else {
            tracing::trace!("no position, caption toggle skipped");
            return Ok(IntentOutcome::Skipped);
        };

        self.cancel_resize();
        self.ctx.coordinator.borrow_mut().release(&dom, &self.wrapper);
        self.overlay = None;

        let placeholder = self.ctx.options.caption_placeholder.clone();
        let converted = if add {
            image_to_figure(&dom, &self.wrapper, &placeholder)?
        } else {
            figure_to_image(&dom, &self.wrapper)?
        };
        self.wrapper = converted.wrapper;
        if let Some(image) = converted.image {
            self.image = image;
        }
        self.caption = converted.caption;
        self.rebuilt = true;
        self.pending_settle = true;

        let content = if add {
            caption_content(&placeholder)
        } else {
            Vec::new()
        };
        host.set_node_content(pos, content.clone())?;
        self.node.content = content;
        restore_selection(host, self.position());
        tracing::debug!(pos, add, "caption toggled");
        Ok(IntentOutcome::Rebuilt)
    }

    // === Resize gestures ===

    /// Pointer or touch down on a resize handle at horizontal position `x`.
    pub fn begin_resize(&mut self, corner: Corner, source: PointerSource, x: f64) -> bool {
        if !self.editable || self.destroyed || self.drag.is_some() {
            return false;
        }
        let dom = &self.ctx.dom;
        self.drag = Some(ResizeDrag {
            session: ResizeSession::begin(corner, source, x, dom.offset_width(&self.wrapper)),
            wrapper_css: dom.css_text(&self.wrapper),
            image_css: dom.css_text(&self.image),
        });
        true
    }

    /// Pointer moved during a drag. Applies the width to the DOM only.
    pub fn drag_resize(&mut self, source: PointerSource, x: f64) -> Option<f64> {
        let width = self.drag.as_mut()?.session.update(source, x)?;
        if let Err(err) = self.set_live_width(width) {
            tracing::warn!(%err, "could not apply live width");
        }
        Some(width)
    }

    /// Pointer released. Writes the final width to the document. An `up`
    /// from the other input family is ignored.
    pub fn end_resize<H: EditorHost + ?Sized>(
        &mut self,
        host: &H,
        source: PointerSource,
    ) -> IntentOutcome {
        if self.drag.as_ref().is_none_or(|d| d.session.source() != source) {
            return IntentOutcome::Skipped;
        }
        let Some(drag) = self.drag.take() else {
            return IntentOutcome::Skipped;
        };
        match drag.session.end() {
            ResizeOutcome::Commit { width } => {
                match self.commit_width(host, width, drag.wrapper_css, drag.image_css) {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        tracing::warn!(%err, "resize commit failed");
                        IntentOutcome::Skipped
                    }
                }
            }
            ResizeOutcome::Cancelled { .. } => IntentOutcome::Skipped,
        }
    }

    /// Abandon the drag and put the widget back to its pre-drag styles.
    /// Nothing is written.
    pub fn cancel_resize(&mut self) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        let _ = drag.session.cancel();
        self.ctx.dom.set_css_text(&self.wrapper, &drag.wrapper_css);
        self.ctx.dom.set_css_text(&self.image, &drag.image_css);
        true
    }

    fn set_live_width(&self, width: f64) -> Result<(), DomError> {
        let width = px(width);
        self.ctx.dom.set_style_property(&self.wrapper, "width", &width)?;
        self.ctx.dom.set_style_property(&self.image, "width", &width)
    }

    fn commit_width<H: EditorHost + ?Sized>(
        &mut self,
        host: &H,
        width: f64,
        wrapper_css: String,
        image_css: String,
    ) -> Result<IntentOutcome, FigureError> {
        let px_width = Dimension::Px(width.round().max(0.0) as u32);
        let outcome = self.write_or_restore(
            host,
            move |attrs| attrs.set_width(Some(px_width)),
            Some(wrapper_css),
            image_css,
        )?;
        if outcome == IntentOutcome::Applied {
            tracing::debug!(width, "resize committed");
        }
        Ok(outcome)
    }

    /// Write back, or put the pre-change styles back if nothing could be
    /// written so the DOM never runs ahead of the document.
    fn write_or_restore<H: EditorHost + ?Sized>(
        &mut self,
        host: &H,
        changes: impl FnOnce(&mut ImageAttrs),
        wrapper_css: Option<String>,
        image_css: String,
    ) -> Result<IntentOutcome, FigureError> {
        let written = self.dispatch_node_view(host, changes);
        if !matches!(written, Ok(true)) {
            if let Some(css) = &wrapper_css {
                self.ctx.dom.set_css_text(&self.wrapper, css);
            }
            self.ctx.dom.set_css_text(&self.image, &image_css);
        }
        if written? {
            host.focus();
            Ok(IntentOutcome::Applied)
        } else {
            Ok(IntentOutcome::Skipped)
        }
    }

    /// Write the node's attributes back with `style` re-read from the live
    /// image element and `changes` applied on top. One host write per call.
    /// Returns `false` when the node has no position.
    pub fn dispatch_node_view<H: EditorHost + ?Sized>(
        &mut self,
        host: &H,
        changes: impl FnOnce(&mut ImageAttrs),
    ) -> Result<bool, FigureError> {
        let Some(pos) = self.position() else {
            tracing::trace!("no position, write-back skipped");
            return Ok(false);
        };
        let mut attrs = self.node.attrs.clone();
        attrs.set_style(Some(self.ctx.dom.css_text(&self.image)));
        changes(&mut attrs);
        host.set_node_attrs(pos, attrs.clone())?;
        self.node.attrs = attrs;
        Ok(true)
    }

    // === Host callbacks ===

    /// Whether a DOM mutation on `target` should be hidden from the host.
    /// Only edits inside the caption are real content edits.
    pub fn ignore_mutation(&self, target: &D::Element) -> bool {
        match &self.caption {
            Some(caption) => !self.ctx.dom.contains(caption, target),
            None => true,
        }
    }

    /// The host re-rendered the node. Returns `false` when the view cannot
    /// represent `node` in place and must be re-created: the render mode
    /// flipped, or the wrapper was already replaced by a caption toggle.
    ///
    /// Caption text belongs to the host, which renders it into
    /// [`NodeView::content_dom`].
    pub fn update(&mut self, node: ImageNode) -> bool {
        if self.destroyed || self.rebuilt || node.mode() != self.node.mode() {
            return false;
        }
        if node == self.node {
            return true;
        }
        if node.attrs != self.node.attrs {
            self.cancel_resize();
            let dom = &self.ctx.dom;
            dom.set_css_text(
                &self.wrapper,
                node.attrs.style().unwrap_or(self.ctx.options.default_style.as_str()),
            );
            if self.is_active() {
                if let Err(err) = overlay::highlight(dom, &self.wrapper) {
                    tracing::warn!(%err, "could not restore highlight");
                }
            }
            let fallback = self.ctx.options.default_style.as_str();
            if let Err(err) = apply_image_attrs(dom, &self.image, &node.attrs, fallback) {
                tracing::warn!(%err, "could not apply image attributes");
            }
        }
        self.node = node;
        true
    }

    /// Tear the widget down: drop any drag, release activation.
    pub fn destroy(&mut self) {
        if std::mem::replace(&mut self.destroyed, true) {
            return;
        }
        self.cancel_resize();
        self.ctx
            .coordinator
            .borrow_mut()
            .release(&self.ctx.dom, &self.wrapper);
        self.overlay = None;
        self.pending_settle = false;
        tracing::trace!("node view destroyed");
    }
}

/// Put every present attribute on the image and clear the absent ones. An
/// unstyled node gets `default_style`, so write-back keeps it.
fn apply_image_attrs<D: Dom>(
    dom: &D,
    image: &D::Element,
    attrs: &ImageAttrs,
    default_style: &str,
) -> Result<(), DomError> {
    for key in AttrKey::ALL {
        match (key, attrs.get(key)) {
            (_, Some(value)) => dom.set_attribute(image, key.as_str(), &value)?,
            (AttrKey::Style, None) => dom.set_css_text(image, default_style),
            (_, None) => dom.remove_attribute(image, key.as_str()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::DEFAULT_STYLE;
    use crate::host::{Block, PlainHost};
    use crate::memory::{MemoryDom, MemoryElement};
    use crate::overlay::{Alignment, CaptionAction, OVERLAY_ATTR};
    use crate::style::InlineStyle;

    fn attrs() -> ImageAttrs {
        ImageAttrs::from_pairs([("src", "cat.png"), ("alt", "a cat"), ("title", "Cat")])
    }

    fn host_with(node: ImageNode) -> PlainHost {
        PlainHost::new(vec![Block::Paragraph("intro".into()), Block::Image(node)])
    }

    fn at(pos: usize) -> Option<GetPos> {
        Some(Rc::new(move || Some(pos)))
    }

    fn mounted(ctx: &ViewContext<MemoryDom>, host: &PlainHost, pos: usize) -> NodeView<MemoryDom> {
        let node = host.node_at(pos).unwrap();
        let view = NodeView::new(ctx.clone(), host, node, at(pos)).unwrap();
        ctx.dom.append_child(&ctx.dom.root(), view.dom()).unwrap();
        view
    }

    fn overlay_count(dom: &MemoryDom, wrapper: &MemoryElement) -> usize {
        dom.children(wrapper)
            .iter()
            .filter(|c| dom.get_attribute(c, OVERLAY_ATTR).is_some())
            .count()
    }

    #[test]
    fn test_image_mode_render() {
        let ctx = ViewContext::new(MemoryDom::new(), FigureOptions::default());
        let host = host_with(ImageNode::image(attrs()));
        let view = mounted(&ctx, &host, 1);
        let dom = &ctx.dom;

        assert_eq!(dom.tag_name(view.dom()), "div");
        assert_eq!(dom.css_text(view.dom()), DEFAULT_STYLE);
        assert_eq!(dom.get_attribute(view.image(), "src").as_deref(), Some("cat.png"));
        assert_eq!(dom.get_attribute(view.image(), "width"), None);
        assert_eq!(view.content_dom(), None);
        assert!(view.ignore_mutation(view.image()));
    }

    #[test]
    fn test_figure_mode_render() {
        let ctx = ViewContext::new(MemoryDom::new(), FigureOptions::default());
        let host = host_with(ImageNode::figure(attrs(), "A cat"));
        let view = mounted(&ctx, &host, 1);
        let dom = &ctx.dom;

        assert_eq!(dom.tag_name(view.dom()), "figure");
        let caption = view.content_dom().unwrap();
        assert_eq!(dom.tag_name(caption), "figcaption");
        assert_eq!(dom.text_content(caption), "A cat");
        assert!(!view.ignore_mutation(caption));
        assert!(view.ignore_mutation(view.image()));
    }

    #[test]
    fn test_read_only_never_shows_controls() {
        let ctx = ViewContext::new(MemoryDom::new(), FigureOptions::default());
        let host = PlainHost::read_only(vec![Block::Image(ImageNode::image(attrs()))]);
        let mut view = mounted(&ctx, &host, 0);
        let image = *view.image();

        assert_eq!(view.click(&image), ClickOutcome::Ignored);
        assert!(!view.begin_resize(Corner::TopLeft, PointerSource::Mouse, 0.0));
        assert_eq!(
            view.handle_intent(&host, OverlayIntent::Align(Alignment::Left)),
            IntentOutcome::Skipped
        );
        assert_eq!(overlay_count(&ctx.dom, view.dom()), 0);
    }

    #[test]
    fn test_click_activates_once() {
        let ctx = ViewContext::new(MemoryDom::new(), FigureOptions::default());
        let host = host_with(ImageNode::image(attrs()));
        let mut view = mounted(&ctx, &host, 1);
        let image = *view.image();

        assert_eq!(view.click(&image), ClickOutcome::Activated);
        assert_eq!(view.click(&image), ClickOutcome::AlreadyActive);
        assert_eq!(overlay_count(&ctx.dom, view.dom()), 7);
        let style = InlineStyle::parse(&ctx.dom.css_text(view.dom()));
        assert_eq!(style.get("border"), Some("1px dashed #6C6C6C"));
        assert_eq!(
            view.controls().unwrap().caption_action(),
            Some(CaptionAction::Add)
        );
    }

    #[test]
    fn test_single_active_widget() {
        let ctx = ViewContext::new(MemoryDom::new(), FigureOptions::default());
        let host = PlainHost::new(vec![
            Block::Image(ImageNode::image(attrs())),
            Block::Image(ImageNode::image(attrs())),
            Block::Image(ImageNode::image(attrs())),
        ]);
        let mut views: Vec<_> = (0..3).map(|pos| mounted(&ctx, &host, pos)).collect();

        for i in [0, 2, 1, 1, 0, 2] {
            let image = *views[i].image();
            views[i].click(&image);
            let active: Vec<_> = views.iter().filter(|v| v.is_active()).collect();
            assert_eq!(active.len(), 1);
            let with_overlay = views
                .iter()
                .filter(|v| overlay_count(&ctx.dom, v.dom()) > 0)
                .count();
            assert_eq!(with_overlay, 1);
        }
    }

    #[test]
    fn test_outside_click_dismisses() {
        let ctx = ViewContext::new(MemoryDom::new(), FigureOptions::default());
        let host = host_with(ImageNode::image(attrs()));
        let mut view = mounted(&ctx, &host, 1);
        let outside = ctx.dom.create_element("p").unwrap();
        ctx.dom.append_child(&ctx.dom.root(), &outside).unwrap();

        assert!(!view.document_click(&outside));
        let image = *view.image();
        view.click(&image);
        assert!(!view.document_click(&image));
        assert!(view.document_click(&outside));
        assert!(view.controls().is_none());
        assert_eq!(overlay_count(&ctx.dom, view.dom()), 0);
        assert_eq!(InlineStyle::parse(&ctx.dom.css_text(view.dom())).get("border"), None);
    }

    #[test]
    fn test_center_alignment_only_touches_style() {
        let ctx = ViewContext::new(MemoryDom::new(), FigureOptions::default());
        let host = host_with(ImageNode::image(attrs()));
        let mut view = mounted(&ctx, &host, 1);
        let image = *view.image();
        view.click(&image);

        let button = *view
            .controls()
            .unwrap()
            .find(ControlKind::Align(Alignment::Center))
            .unwrap();
        let intent = view.control_intent(&button).unwrap();
        assert_eq!(view.handle_intent(&host, intent), IntentOutcome::Applied);

        assert_eq!(host.transactions(), 1);
        let written = host.node_at(1).unwrap().attrs;
        assert_eq!(written.src(), Some("cat.png"));
        assert_eq!(written.alt(), Some("a cat"));
        assert_eq!(written.title(), Some("Cat"));
        let style = InlineStyle::parse(written.style().unwrap());
        assert_eq!(Alignment::detect(&style), Some(Alignment::Center));
        assert_eq!(style.get("width"), Some("100%"));
        assert!(host.is_focused());
    }

    #[test]
    fn test_resize_drag_commits_once() {
        let ctx = ViewContext::new(MemoryDom::new(), FigureOptions::default());
        let host = host_with(ImageNode::image(attrs()));
        let mut view = mounted(&ctx, &host, 1);
        ctx.dom.set_offset_width(view.dom(), 200.0);

        assert!(view.begin_resize(Corner::TopLeft, PointerSource::Mouse, 50.0));
        assert!(!view.begin_resize(Corner::TopRight, PointerSource::Mouse, 50.0));
        assert_eq!(view.drag_resize(PointerSource::Touch, 90.0), None);
        assert_eq!(view.drag_resize(PointerSource::Mouse, 60.0), Some(190.0));
        assert_eq!(
            InlineStyle::parse(&ctx.dom.css_text(view.image())).get("width"),
            Some("190px")
        );
        assert_eq!(host.transactions(), 0);

        assert_eq!(view.end_resize(&host, PointerSource::Touch), IntentOutcome::Skipped);
        assert_eq!(view.end_resize(&host, PointerSource::Mouse), IntentOutcome::Applied);
        assert!(!view.is_resizing());
        assert_eq!(host.transactions(), 1);
        let written = host.node_at(1).unwrap().attrs;
        assert_eq!(written.width(), Some(&Dimension::Px(190)));
        assert_eq!(
            InlineStyle::parse(written.style().unwrap()).get("width"),
            Some("190px")
        );
    }

    #[test]
    fn test_bottom_right_handle_grows() {
        let ctx = ViewContext::new(MemoryDom::new(), FigureOptions::default());
        let host = host_with(ImageNode::image(attrs()));
        let mut view = mounted(&ctx, &host, 1);
        ctx.dom.set_offset_width(view.dom(), 200.0);

        view.begin_resize(Corner::BottomRight, PointerSource::Touch, 50.0);
        assert_eq!(view.drag_resize(PointerSource::Touch, 60.0), Some(210.0));
        view.end_resize(&host, PointerSource::Touch);
        assert_eq!(
            host.node_at(1).unwrap().attrs.width(),
            Some(&Dimension::Px(210))
        );
    }

    #[test]
    fn test_unstyled_node_keeps_default_style_on_write_back() {
        let typed = crate::rules::match_markdown_image(r#"![caption](http://x/img.png "t")"#)
            .unwrap()
            .attrs();
        assert_eq!(typed.style(), None);
        let ctx = ViewContext::new(MemoryDom::new(), FigureOptions::default());
        let host = host_with(ImageNode::image(typed));
        let mut view = mounted(&ctx, &host, 1);
        ctx.dom.set_offset_width(view.dom(), 200.0);

        view.begin_resize(Corner::BottomRight, PointerSource::Mouse, 0.0);
        view.drag_resize(PointerSource::Mouse, 10.0);
        assert_eq!(view.end_resize(&host, PointerSource::Mouse), IntentOutcome::Applied);
        let resized = host.node_at(1).unwrap();
        let style = InlineStyle::parse(resized.attrs.style().unwrap());
        assert_eq!(style.get("width"), Some("210px"));
        assert_eq!(style.get("height"), Some("auto"));
        assert_eq!(style.get("cursor"), Some("pointer"));

        assert!(view.update(resized));
        let image = *view.image();
        view.click(&image);
        let button = *view
            .controls()
            .unwrap()
            .find(ControlKind::Align(Alignment::Left))
            .unwrap();
        let intent = view.control_intent(&button).unwrap();
        assert_eq!(view.handle_intent(&host, intent), IntentOutcome::Applied);
        let style = InlineStyle::parse(host.node_at(1).unwrap().attrs.style().unwrap());
        assert_eq!(Alignment::detect(&style), Some(Alignment::Left));
        assert_eq!(style.get("width"), Some("210px"));
        assert_eq!(style.get("cursor"), Some("pointer"));
    }

    #[test]
    fn test_cancel_restores_styles() {
        let ctx = ViewContext::new(MemoryDom::new(), FigureOptions::default());
        let host = host_with(ImageNode::image(attrs()));
        let mut view = mounted(&ctx, &host, 1);
        let before = ctx.dom.css_text(view.image());

        view.begin_resize(Corner::BottomRight, PointerSource::Mouse, 0.0);
        view.drag_resize(PointerSource::Mouse, 80.0);
        assert!(view.cancel_resize());
        assert_eq!(ctx.dom.css_text(view.image()), before);
        assert_eq!(ctx.dom.css_text(view.dom()), DEFAULT_STYLE);
        assert_eq!(host.transactions(), 0);
        assert!(!view.cancel_resize());
    }

    #[test]
    fn test_no_position_skips_write_and_restores() {
        let ctx = ViewContext::new(MemoryDom::new(), FigureOptions::default());
        let host = host_with(ImageNode::image(attrs()));
        let node = host.node_at(1).unwrap();
        let mut view = NodeView::new(ctx.clone(), &host, node, None).unwrap();
        ctx.dom.append_child(&ctx.dom.root(), view.dom()).unwrap();
        let before = ctx.dom.css_text(view.image());

        view.begin_resize(Corner::TopRight, PointerSource::Mouse, 0.0);
        view.drag_resize(PointerSource::Mouse, 30.0);
        assert_eq!(view.end_resize(&host, PointerSource::Mouse), IntentOutcome::Skipped);
        assert_eq!(
            view.handle_intent(&host, OverlayIntent::Align(Alignment::Right)),
            IntentOutcome::Skipped
        );
        assert_eq!(
            view.handle_intent(&host, OverlayIntent::CaptionAdd),
            IntentOutcome::Skipped
        );
        assert_eq!(ctx.dom.css_text(view.image()), before);
        assert_eq!(host.transactions(), 0);
    }

    #[test]
    fn test_caption_add_rebuilds_as_figure() {
        let ctx = ViewContext::new(MemoryDom::new(), FigureOptions::default());
        let host = host_with(ImageNode::image(attrs()));
        let mut view = mounted(&ctx, &host, 1);
        let image = *view.image();
        let old_wrapper = *view.dom();
        view.click(&image);

        let outcome = view.handle_intent(&host, OverlayIntent::CaptionAdd);
        assert_eq!(outcome, IntentOutcome::Rebuilt);
        assert!(!ctx.dom.is_connected(&old_wrapper));
        assert_eq!(ctx.dom.tag_name(view.dom()), "figure");
        assert_eq!(*view.image(), image);
        assert!(!view.is_active());
        assert_eq!(overlay_count(&ctx.dom, view.dom()), 0);

        let caption = *view.content_dom().unwrap();
        assert_eq!(ctx.dom.text_content(&caption), "Caption");
        assert!(!view.ignore_mutation(&caption));
        assert!(view.ignore_mutation(&image));

        let written = host.node_at(1).unwrap();
        assert_eq!(written.caption_text(), "Caption");
        assert_eq!(written.attrs, attrs());
        assert_eq!(host.node_selection(), Some(1));
        assert!(!view.update(written));

        assert!(view.needs_settle());
        assert!(view.settle());
        assert!(view.is_active());
        assert_eq!(
            view.controls().unwrap().caption_action(),
            Some(CaptionAction::Remove)
        );
        assert!(!view.settle());
    }

    #[test]
    fn test_caption_remove_drops_editable_region() {
        let ctx = ViewContext::new(
            MemoryDom::new(),
            FigureOptions {
                caption_placeholder: "Légende".into(),
                ..FigureOptions::default()
            },
        );
        let host = host_with(ImageNode::figure(attrs(), "A cat"));
        let mut view = mounted(&ctx, &host, 1);

        assert_eq!(
            view.handle_intent(&host, OverlayIntent::CaptionAdd),
            IntentOutcome::Skipped
        );
        assert_eq!(
            view.handle_intent(&host, OverlayIntent::CaptionRemove),
            IntentOutcome::Rebuilt
        );
        assert_eq!(ctx.dom.tag_name(view.dom()), "div");
        assert_eq!(view.content_dom(), None);
        assert_eq!(ctx.dom.find_descendant(view.dom(), "figcaption"), None);
        assert!(!host.node_at(1).unwrap().has_caption());

        assert_eq!(
            view.handle_intent(&host, OverlayIntent::CaptionAdd),
            IntentOutcome::Rebuilt
        );
        assert_eq!(
            ctx.dom.text_content(view.content_dom().unwrap()),
            "Légende"
        );
    }

    #[test]
    fn test_delete_removes_node() {
        let ctx = ViewContext::new(MemoryDom::new(), FigureOptions::default());
        let host = host_with(ImageNode::image(attrs()));
        let mut view = mounted(&ctx, &host, 1);
        let image = *view.image();
        view.click(&image);
        let button = *view.controls().unwrap().find(ControlKind::Delete).unwrap();
        let intent = view.control_intent(&button).unwrap();

        assert_eq!(view.handle_intent(&host, intent), IntentOutcome::Deleted);
        assert_eq!(host.blocks().len(), 1);
        assert!(!view.is_active());
    }

    #[test]
    fn test_update_in_place() {
        let ctx = ViewContext::new(MemoryDom::new(), FigureOptions::default());
        let host = host_with(ImageNode::image(attrs()));
        let mut view = mounted(&ctx, &host, 1);
        let image = *view.image();

        assert!(view.update(ImageNode::image(attrs())));

        let mut changed = attrs();
        changed.set_alt(None::<&str>);
        changed.set_style(Some("width: 320px;"));
        assert!(view.update(ImageNode::image(changed)));
        assert_eq!(*view.image(), image);
        assert_eq!(ctx.dom.get_attribute(&image, "alt"), None);
        assert_eq!(ctx.dom.css_text(view.dom()), "width: 320px;");

        assert!(!view.update(ImageNode::figure(attrs(), "now a figure")));
    }

    #[test]
    fn test_update_keeps_highlight_on_active_widget() {
        let ctx = ViewContext::new(MemoryDom::new(), FigureOptions::default());
        let host = host_with(ImageNode::image(attrs()));
        let mut view = mounted(&ctx, &host, 1);
        let image = *view.image();
        view.click(&image);

        let mut changed = attrs();
        changed.set_style(Some("width: 50%;"));
        view.update(ImageNode::image(changed));
        let style = InlineStyle::parse(&ctx.dom.css_text(view.dom()));
        assert_eq!(style.get("width"), Some("50%"));
        assert_eq!(style.get("border"), Some("1px dashed #6C6C6C"));
    }

    #[test]
    fn test_small_screen_uses_touch_layout() {
        let dom = MemoryDom::new();
        dom.set_viewport_width(390.0);
        let ctx = ViewContext::new(dom, FigureOptions::default());
        let host = host_with(ImageNode::image(attrs()));
        let mut view = mounted(&ctx, &host, 1);
        let image = *view.image();

        view.click(&image);
        assert_eq!(ctx.dom.focus_releases(), 1);
        let handle = *view
            .controls()
            .unwrap()
            .find(ControlKind::Resize(Corner::BottomLeft))
            .unwrap();
        assert_eq!(view.resize_handle(&handle), Some(Corner::BottomLeft));
        assert_eq!(
            InlineStyle::parse(&ctx.dom.css_text(&handle)).get("width"),
            Some("16px")
        );
    }

    #[test]
    fn test_destroy_releases_activation() {
        let ctx = ViewContext::new(MemoryDom::new(), FigureOptions::default());
        let host = host_with(ImageNode::image(attrs()));
        let mut view = mounted(&ctx, &host, 1);
        let image = *view.image();
        view.click(&image);
        view.destroy();

        assert!(!ctx.coordinator.borrow_mut().is_visible(&ctx.dom));
        assert_eq!(view.click(&image), ClickOutcome::Ignored);
        assert!(!view.update(ImageNode::image(attrs())));
    }
}
