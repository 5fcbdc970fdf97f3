//! The node view bound to browser events.
//!
//! [`BrowserNodeView`] wraps a core [`NodeView`] over [`WebDom`] and installs
//! the listeners that drive it: a click handler and pointer-down handlers on
//! the wrapper, and one document-level click listener for dismissal. All
//! listeners hold weak references, so dropping the view is enough to detach
//! everything.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use figure_view_core::{
    ClickOutcome, Dom, EditorHost, FigureError, GetPos, ImageNode, IntentOutcome, NodeView,
    PointerSource, ViewContext,
};
use gloo_events::{EventListener, EventListenerOptions, EventListenerPhase};
use gloo_timers::callback::Timeout;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventTarget, HtmlElement, MouseEvent, Node, TouchEvent};

use crate::dom::{WebDom, element_for_node};
use crate::gesture::{GestureEvent, GestureGuard, defer_drop, first_touch_x};
use crate::platform::platform;

/// Delay before controls are re-derived after a caption toggle.
const SETTLE_DELAY_MS: u32 = 0;

/// A node view with its browser listeners attached.
pub struct BrowserNodeView<H: EditorHost + 'static> {
    inner: Rc<Inner<H>>,
}

struct Inner<H: EditorHost + 'static> {
    view: RefCell<NodeView<WebDom>>,
    host: Rc<H>,
    dom: WebDom,
    wrapper_listeners: RefCell<Vec<EventListener>>,
    document_listener: RefCell<Option<EventListener>>,
    gesture: RefCell<Option<GestureGuard>>,
    destroyed: Cell<bool>,
}

impl<H: EditorHost + 'static> BrowserNodeView<H> {
    /// Render `node` and, in an editable editor, wire up its listeners.
    pub fn new(
        ctx: ViewContext<WebDom>,
        host: Rc<H>,
        node: ImageNode,
        get_pos: Option<GetPos>,
    ) -> Result<Self, FigureError> {
        let dom = ctx.dom.clone();
        let view = NodeView::new(ctx, host.as_ref(), node, get_pos)?;
        let editable = view.is_editable();
        let inner = Rc::new(Inner {
            view: RefCell::new(view),
            host,
            dom,
            wrapper_listeners: RefCell::new(Vec::new()),
            document_listener: RefCell::new(None),
            gesture: RefCell::new(None),
            destroyed: Cell::new(false),
        });
        if editable {
            inner.bind_wrapper();
            inner.bind_document();
        }
        Ok(Self { inner })
    }

    /// The outer element of the widget.
    pub fn dom(&self) -> HtmlElement {
        self.inner.view.borrow().dom().clone()
    }

    /// The caption, when there is one.
    pub fn content_dom(&self) -> Option<HtmlElement> {
        self.inner.view.borrow().content_dom().cloned()
    }

    /// The host re-rendered the node. `false` asks the host to re-create the
    /// view, which is also the answer while the view is busy handling one of
    /// its own events.
    pub fn update(&self, node: ImageNode) -> bool {
        match self.inner.view.try_borrow_mut() {
            Ok(mut view) => view.update(node),
            Err(_) => {
                tracing::trace!("update during a view callback, asking for a rebuild");
                false
            }
        }
    }

    /// Whether a DOM mutation on `target` should be hidden from the host.
    pub fn ignore_mutation(&self, target: &Node) -> bool {
        let Some(element) = element_for_node(target) else {
            return true;
        };
        match self.inner.view.try_borrow() {
            Ok(view) => view.ignore_mutation(&element),
            Err(_) => true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.inner
            .view
            .try_borrow()
            .is_ok_and(|view| view.is_active())
    }

    /// Detach every listener and release activation.
    pub fn destroy(&self) {
        self.inner.destroy();
    }
}

impl<H: EditorHost + 'static> Inner<H> {
    fn weak(self: &Rc<Self>) -> Weak<Self> {
        Rc::downgrade(self)
    }

    fn bind_wrapper(self: &Rc<Self>) {
        let wrapper = self.view.borrow().dom().clone();
        let target: &EventTarget = wrapper.as_ref();
        let mut listeners = Vec::with_capacity(3);

        let weak = self.weak();
        listeners.push(EventListener::new_with_options(
            target,
            "click",
            bubble(),
            move |event: &Event| {
                // The document listener must never see a widget's own click
                event.stop_propagation();
                if let Some(inner) = weak.upgrade() {
                    inner.on_click(event);
                }
            },
        ));

        let weak = self.weak();
        listeners.push(EventListener::new_with_options(
            target,
            "mousedown",
            bubble(),
            move |event: &Event| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_pointer_down(event, PointerSource::Mouse);
                }
            },
        ));

        if platform().touch {
            let weak = self.weak();
            listeners.push(EventListener::new_with_options(
                target,
                "touchstart",
                bubble(),
                move |event: &Event| {
                    if let Some(inner) = weak.upgrade() {
                        inner.on_pointer_down(event, PointerSource::Touch);
                    }
                },
            ));
        }

        let previous = self.wrapper_listeners.replace(listeners);
        if !previous.is_empty() {
            tracing::trace!("wrapper listeners moved to the rebuilt wrapper");
            defer_drop(previous);
        }
    }

    fn bind_document(self: &Rc<Self>) {
        let weak = self.weak();
        let listener = EventListener::new_with_options(
            self.dom.document(),
            "click",
            bubble(),
            move |event: &Event| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_document_click(event);
                }
            },
        );
        *self.document_listener.borrow_mut() = Some(listener);
    }

    fn on_click(self: &Rc<Self>, event: &Event) {
        if self.destroyed.get() {
            return;
        }
        let Some(target) = self.dom.element_from_target(event.target()) else {
            return;
        };
        let outcome = {
            let Ok(mut view) = self.view.try_borrow_mut() else {
                return;
            };
            match view.control_intent(&target) {
                Some(intent) => {
                    event.prevent_default();
                    Some(view.handle_intent(self.host.as_ref(), intent))
                }
                None => {
                    let activated = view.click(&target) == ClickOutcome::Activated;
                    if activated && platform().mobile {
                        self.dom.release_focus();
                    }
                    None
                }
            }
        };
        self.host.flush();
        if outcome == Some(IntentOutcome::Rebuilt) && !self.destroyed.get() {
            self.bind_wrapper();
            self.schedule_settle();
        }
    }

    fn on_document_click(&self, event: &Event) {
        if self.destroyed.get() {
            return;
        }
        let Some(target) = self.dom.element_from_target(event.target()) else {
            return;
        };
        if let Ok(mut view) = self.view.try_borrow_mut() {
            view.document_click(&target);
        }
    }

    fn on_pointer_down(self: &Rc<Self>, event: &Event, source: PointerSource) {
        if self.destroyed.get() {
            return;
        }
        let Some(target) = self.dom.element_from_target(event.target()) else {
            return;
        };
        let x = match source {
            PointerSource::Mouse => event
                .dyn_ref::<MouseEvent>()
                .map(|event| f64::from(event.client_x())),
            PointerSource::Touch => event.dyn_ref::<TouchEvent>().and_then(first_touch_x),
        };
        let Some(x) = x else {
            return;
        };
        {
            let Ok(mut view) = self.view.try_borrow_mut() else {
                return;
            };
            let Some(corner) = view.resize_handle(&target) else {
                return;
            };
            if !view.begin_resize(corner, source, x) {
                return;
            }
            tracing::trace!(?corner, ?source, "resize drag started");
        }
        event.prevent_default();
        event.stop_propagation();

        let weak = self.weak();
        let guard = GestureGuard::attach(self.dom.document(), source, move |gesture| {
            if let Some(inner) = weak.upgrade() {
                inner.on_gesture(gesture);
            }
        });
        if let Some(stale) = self.gesture.replace(Some(guard)) {
            defer_drop(stale);
        }
    }

    fn on_gesture(&self, gesture: GestureEvent) {
        let finished = {
            let Ok(mut view) = self.view.try_borrow_mut() else {
                return;
            };
            match gesture {
                GestureEvent::Move { source, x } => {
                    view.drag_resize(source, x);
                    false
                }
                GestureEvent::End { source } => {
                    view.end_resize(self.host.as_ref(), source);
                    true
                }
                GestureEvent::Cancel => {
                    if view.cancel_resize() {
                        tracing::debug!("resize drag cancelled");
                    }
                    true
                }
            }
        };
        if finished {
            if let Some(guard) = self.gesture.borrow_mut().take() {
                defer_drop(guard);
            }
            self.host.flush();
        }
    }

    fn schedule_settle(self: &Rc<Self>) {
        let weak = self.weak();
        Timeout::new(SETTLE_DELAY_MS, move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if inner.destroyed.get() {
                return;
            }
            if let Ok(mut view) = inner.view.try_borrow_mut() {
                view.settle();
            }
        })
        .forget();
    }

    fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        match self.view.try_borrow_mut() {
            Ok(mut view) => view.destroy(),
            Err(_) => tracing::warn!("node view destroyed while handling its own event"),
        }
        self.release_listeners();
    }

    fn release_listeners(&self) {
        let wrapper = std::mem::take(&mut *self.wrapper_listeners.borrow_mut());
        let document = self.document_listener.borrow_mut().take();
        let gesture = self.gesture.borrow_mut().take();
        if !wrapper.is_empty() || document.is_some() || gesture.is_some() {
            defer_drop((wrapper, document, gesture));
        }
    }
}

impl<H: EditorHost + 'static> Drop for Inner<H> {
    fn drop(&mut self) {
        // The last strong reference can be the one a listener upgraded, so
        // listeners are never freed synchronously from here.
        self.release_listeners();
    }
}

fn bubble() -> EventListenerOptions {
    EventListenerOptions {
        phase: EventListenerPhase::Bubble,
        passive: false,
    }
}
