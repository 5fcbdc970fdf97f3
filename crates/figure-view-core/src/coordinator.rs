//! Arbitration of which widget shows overlay controls.
//!
//! One [`Coordinator`] is owned per editor (extension instance) and shared by
//! every node view it creates. It holds at most one wrapper element. The
//! reference is weak in the DOM sense: the coordinator never keeps a wrapper
//! alive, and a wrapper that has left the document is treated as absent the
//! next time it is looked at.

use std::cell::RefCell;
use std::rc::Rc;

use crate::dom::Dom;
use crate::overlay;

/// Coordinator shared between the node views of one editor.
pub type SharedCoordinator<E> = Rc<RefCell<Coordinator<E>>>;

/// Result of asking to activate a widget.
#[derive(Debug, Clone, PartialEq)]
pub enum Activation<E> {
    /// The click landed inside the widget that is already active. Nothing
    /// was torn down or rebuilt.
    AlreadyActive,
    /// The widget is now active. `previous` is the wrapper whose controls
    /// were torn down to make room, if any.
    Activated { previous: Option<E> },
}

/// `Idle` or `Active(wrapper)`.
#[derive(Debug)]
pub struct Coordinator<E> {
    active: Option<E>,
}

impl<E> Default for Coordinator<E> {
    fn default() -> Self {
        Self { active: None }
    }
}

impl<E: Clone + PartialEq + std::fmt::Debug> Coordinator<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedCoordinator<E> {
        Rc::new(RefCell::new(Self::new()))
    }

    /// The active wrapper, dropping it first if it is no longer in the document.
    pub fn active<D: Dom<Element = E>>(&mut self, dom: &D) -> Option<&E> {
        self.prune(dom);
        self.active.as_ref()
    }

    /// Whether any widget currently shows controls.
    pub fn is_visible<D: Dom<Element = E>>(&mut self, dom: &D) -> bool {
        self.active(dom).is_some()
    }

    pub fn is_active<D: Dom<Element = E>>(&mut self, dom: &D, wrapper: &E) -> bool {
        self.active(dom) == Some(wrapper)
    }

    /// Make `wrapper` the active widget after a click on `target`.
    ///
    /// If another widget was active its controls are removed before this
    /// returns, so callers never observe two widgets with controls. The caller
    /// mounts the new widget's controls.
    pub fn activate<D: Dom<Element = E>>(&mut self, dom: &D, wrapper: &E, target: &E) -> Activation<E> {
        self.prune(dom);
        if let Some(active) = &self.active {
            if active == wrapper || dom.contains(active, target) {
                return Activation::AlreadyActive;
            }
        }
        let previous = self.active.take();
        if let Some(previous) = &previous {
            teardown(dom, previous);
        }
        tracing::debug!(?wrapper, ?previous, "widget activated");
        self.active = Some(wrapper.clone());
        Activation::Activated { previous }
    }

    /// Document-level click. Deactivates the active widget unless `target`
    /// is inside it. Returns the wrapper that was deactivated.
    pub fn dismiss_outside<D: Dom<Element = E>>(&mut self, dom: &D, target: &E) -> Option<E> {
        self.prune(dom);
        let active = self.active.as_ref()?;
        if dom.contains(active, target) {
            return None;
        }
        let active = self.active.take()?;
        teardown(dom, &active);
        tracing::debug!(wrapper = ?active, "widget dismissed by outside click");
        Some(active)
    }

    /// Deactivate `wrapper` if it is the active widget. Used when a widget
    /// rebuilds its DOM or is destroyed.
    pub fn release<D: Dom<Element = E>>(&mut self, dom: &D, wrapper: &E) -> bool {
        if self.active.as_ref() != Some(wrapper) {
            return false;
        }
        self.active = None;
        teardown(dom, wrapper);
        tracing::debug!(?wrapper, "widget released");
        true
    }

    fn prune<D: Dom<Element = E>>(&mut self, dom: &D) {
        if self.active.as_ref().is_some_and(|el| !dom.is_connected(el)) {
            tracing::trace!(wrapper = ?self.active, "dropping detached active widget");
            self.active = None;
        }
    }
}

fn teardown<D: Dom>(dom: &D, wrapper: &D::Element) {
    overlay::unmount(dom, wrapper);
    overlay::clear_highlight(dom, wrapper);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryDom, MemoryElement};
    use crate::overlay::{OverlayConfig, mount};
    use crate::options::FigureOptions;

    fn widget(dom: &MemoryDom) -> (MemoryElement, MemoryElement) {
        let wrapper = dom.create_element("div").unwrap();
        let image = dom.create_element("img").unwrap();
        dom.append_child(&wrapper, &image).unwrap();
        dom.append_child(&dom.root(), &wrapper).unwrap();
        (wrapper, image)
    }

    fn has_overlay(dom: &MemoryDom, wrapper: &MemoryElement) -> bool {
        dom.children(wrapper)
            .iter()
            .any(|c| dom.get_attribute(c, overlay::OVERLAY_ATTR).is_some())
    }

    #[test]
    fn test_activate_from_idle() {
        let dom = MemoryDom::new();
        let (wrapper, image) = widget(&dom);
        let mut coord = Coordinator::new();
        assert_eq!(
            coord.activate(&dom, &wrapper, &image),
            Activation::Activated { previous: None }
        );
        assert!(coord.is_active(&dom, &wrapper));
    }

    #[test]
    fn test_click_inside_active_is_noop() {
        let dom = MemoryDom::new();
        let (wrapper, image) = widget(&dom);
        let mut coord = Coordinator::new();
        coord.activate(&dom, &wrapper, &image);
        let controls = mount(
            &dom,
            &wrapper,
            false,
            &OverlayConfig::from_options(&FigureOptions::default(), 1280.0),
        )
        .unwrap();
        let (button, _) = controls.controls()[0];
        assert_eq!(coord.activate(&dom, &wrapper, &button), Activation::AlreadyActive);
        assert!(has_overlay(&dom, &wrapper));
    }

    #[test]
    fn test_switching_tears_down_previous() {
        let dom = MemoryDom::new();
        let (a, a_img) = widget(&dom);
        let (b, b_img) = widget(&dom);
        let config = OverlayConfig::from_options(&FigureOptions::default(), 1280.0);
        let mut coord = Coordinator::new();

        coord.activate(&dom, &a, &a_img);
        mount(&dom, &a, false, &config).unwrap();
        assert_eq!(
            coord.activate(&dom, &b, &b_img),
            Activation::Activated { previous: Some(a) }
        );
        assert!(!has_overlay(&dom, &a));
    }

    #[test]
    fn test_outside_click_dismisses() {
        let dom = MemoryDom::new();
        let (wrapper, image) = widget(&dom);
        let outside = dom.create_element("p").unwrap();
        dom.append_child(&dom.root(), &outside).unwrap();
        let mut coord = Coordinator::new();
        coord.activate(&dom, &wrapper, &image);

        assert_eq!(coord.dismiss_outside(&dom, &image), None);
        assert_eq!(coord.dismiss_outside(&dom, &outside), Some(wrapper));
        assert!(!coord.is_visible(&dom));
    }

    #[test]
    fn test_outside_click_when_idle() {
        let dom = MemoryDom::new();
        let outside = dom.create_element("p").unwrap();
        let mut coord: Coordinator<MemoryElement> = Coordinator::new();
        assert_eq!(coord.dismiss_outside(&dom, &outside), None);
        assert!(!coord.is_visible(&dom));
    }

    #[test]
    fn test_detached_wrapper_is_absent() {
        let dom = MemoryDom::new();
        let (wrapper, image) = widget(&dom);
        let mut coord = Coordinator::new();
        coord.activate(&dom, &wrapper, &image);
        dom.remove_child(&dom.root(), &wrapper).unwrap();
        assert_eq!(coord.active(&dom), None);
    }

    #[test]
    fn test_release_only_own_wrapper() {
        let dom = MemoryDom::new();
        let (a, a_img) = widget(&dom);
        let (b, _) = widget(&dom);
        let mut coord = Coordinator::new();
        coord.activate(&dom, &a, &a_img);
        assert!(!coord.release(&dom, &b));
        assert!(coord.release(&dom, &a));
        assert!(!coord.is_visible(&dom));
    }
}
