//! Document listeners for an in-progress resize drag.
//!
//! A [`GestureGuard`] is created on pointer down over a resize handle and
//! owns the move/up listeners for the drag. Dropping the guard removes them,
//! so a drag can never leave listeners behind.

use std::rc::Rc;

use figure_view_core::PointerSource;
use gloo_events::{EventListener, EventListenerOptions, EventListenerPhase};
use wasm_bindgen::JsCast;
use web_sys::{Event, EventTarget, KeyboardEvent, MouseEvent, TouchEvent};

/// What the guard reports back to its owner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    Move { source: PointerSource, x: f64 },
    End { source: PointerSource },
    /// Escape, or the platform cancelled the touch.
    Cancel,
}

/// Live listeners for one drag.
pub struct GestureGuard {
    source: PointerSource,
    listeners: Vec<EventListener>,
}

impl std::fmt::Debug for GestureGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GestureGuard")
            .field("source", &self.source)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl GestureGuard {
    /// Listen on `target` (normally the document) for the rest of a drag
    /// started by `source`. Only events of that input family are reported.
    pub fn attach(
        target: &EventTarget,
        source: PointerSource,
        on_event: impl Fn(GestureEvent) + 'static,
    ) -> Self {
        let on_event: Rc<dyn Fn(GestureEvent)> = Rc::new(on_event);
        let mut listeners = Vec::with_capacity(4);

        match source {
            PointerSource::Mouse => {
                let handler = on_event.clone();
                listeners.push(listen(target, "mousemove", move |event| {
                    if let Some(event) = event.dyn_ref::<MouseEvent>() {
                        handler(GestureEvent::Move {
                            source,
                            x: f64::from(event.client_x()),
                        });
                    }
                }));
                let handler = on_event.clone();
                listeners.push(listen(target, "mouseup", move |_| {
                    handler(GestureEvent::End { source });
                }));
            }
            PointerSource::Touch => {
                let handler = on_event.clone();
                listeners.push(listen(target, "touchmove", move |event| {
                    let Some(event) = event.dyn_ref::<TouchEvent>() else {
                        return;
                    };
                    // Keep the page from scrolling under the drag
                    event.prevent_default();
                    if let Some(x) = first_touch_x(event) {
                        handler(GestureEvent::Move { source, x });
                    }
                }));
                let handler = on_event.clone();
                listeners.push(listen(target, "touchend", move |_| {
                    handler(GestureEvent::End { source });
                }));
                let handler = on_event.clone();
                listeners.push(listen(target, "touchcancel", move |_| {
                    handler(GestureEvent::Cancel);
                }));
            }
        }

        listeners.push(listen(target, "keydown", move |event| {
            if event
                .dyn_ref::<KeyboardEvent>()
                .is_some_and(|key| key.key() == "Escape")
            {
                on_event(GestureEvent::Cancel);
            }
        }));

        tracing::trace!(?source, "gesture listeners attached");
        Self { source, listeners }
    }

    pub fn source(&self) -> PointerSource {
        self.source
    }
}

impl Drop for GestureGuard {
    fn drop(&mut self) {
        tracing::trace!(source = ?self.source, "gesture listeners removed");
    }
}

/// Horizontal position of the first active touch.
pub fn first_touch_x(event: &TouchEvent) -> Option<f64> {
    event
        .touches()
        .item(0)
        .map(|touch| f64::from(touch.client_x()))
}

/// Drop `value` on the next task.
///
/// Listeners must not be dropped while one of them is running (the closure
/// would be freed under its own call), so anything that may be released from
/// inside an event handler goes through here.
pub(crate) fn defer_drop<T: 'static>(value: T) {
    gloo_timers::callback::Timeout::new(0, move || drop(value)).forget();
}

fn listen(
    target: &EventTarget,
    event_type: &'static str,
    callback: impl FnMut(&Event) + 'static,
) -> EventListener {
    EventListener::new_with_options(
        target,
        event_type,
        EventListenerOptions {
            phase: EventListenerPhase::Capture,
            passive: false,
        },
        callback,
    )
}
