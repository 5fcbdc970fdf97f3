//! Platform abstraction over the DOM the node view renders into.
//!
//! The node view logic only ever talks to elements through this trait, so the
//! same state machine drives the browser (`web-sys`) implementation and the
//! in-memory one used for tests and server-side rendering.

/// Error type for DOM operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomError(pub String);

impl std::fmt::Display for DomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for DomError {}

impl From<&str> for DomError {
    fn from(s: &str) -> Self {
        DomError(s.to_string())
    }
}

impl From<String> for DomError {
    fn from(s: String) -> Self {
        DomError(s)
    }
}

/// Element-level DOM operations needed by the node view.
///
/// Handles are cheap clones referring to live elements. Equality is identity:
/// two handles compare equal only if they refer to the same element.
pub trait Dom: Clone {
    /// Handle to a live element.
    type Element: Clone + PartialEq + std::fmt::Debug;

    /// Create a detached element with the given (lowercase) tag name.
    fn create_element(&self, tag: &str) -> Result<Self::Element, DomError>;

    /// Lowercase tag name of the element.
    fn tag_name(&self, element: &Self::Element) -> String;

    fn get_attribute(&self, element: &Self::Element, name: &str) -> Option<String>;

    fn set_attribute(&self, element: &Self::Element, name: &str, value: &str)
    -> Result<(), DomError>;

    fn remove_attribute(&self, element: &Self::Element, name: &str);

    /// Names of all attributes currently set on the element, in document order.
    fn attribute_names(&self, element: &Self::Element) -> Vec<String>;

    /// Append `child` as the last child of `parent`.
    ///
    /// If `child` is already attached somewhere it is moved, never cloned, so
    /// listeners and state on it survive.
    fn append_child(&self, parent: &Self::Element, child: &Self::Element) -> Result<(), DomError>;

    fn remove_child(&self, parent: &Self::Element, child: &Self::Element) -> Result<(), DomError>;

    /// Put `replacement` where `old` is in the tree. `old` ends up detached.
    fn replace_with(&self, old: &Self::Element, replacement: &Self::Element)
    -> Result<(), DomError>;

    /// Element children, in order. Text nodes are not included.
    fn children(&self, element: &Self::Element) -> Vec<Self::Element>;

    fn parent(&self, element: &Self::Element) -> Option<Self::Element>;

    /// Inclusive descendant test: an element contains itself.
    fn contains(&self, ancestor: &Self::Element, node: &Self::Element) -> bool;

    /// Whether the element is currently part of the rendered document.
    fn is_connected(&self, element: &Self::Element) -> bool;

    fn text_content(&self, element: &Self::Element) -> String;

    fn set_text_content(&self, element: &Self::Element, text: &str);

    /// Serialized inline style of the element (`element.style.cssText`).
    fn css_text(&self, element: &Self::Element) -> String;

    fn set_css_text(&self, element: &Self::Element, css: &str);

    fn set_style_property(
        &self,
        element: &Self::Element,
        property: &str,
        value: &str,
    ) -> Result<(), DomError>;

    /// Rendered width of the element in CSS pixels.
    fn offset_width(&self, element: &Self::Element) -> f64;

    /// Width of the viewport in CSS pixels.
    fn viewport_width(&self) -> f64;

    /// Drop keyboard focus from whatever editable element currently holds it.
    ///
    /// Used on small screens so the on-screen keyboard does not cover the
    /// overlay controls. The default does nothing.
    fn release_focus(&self) {}

    // === Provided ===

    /// First descendant (depth-first, excluding `root` itself) with the given tag.
    fn find_descendant(&self, root: &Self::Element, tag: &str) -> Option<Self::Element> {
        for child in self.children(root) {
            if self.tag_name(&child) == tag {
                return Some(child);
            }
            if let Some(found) = self.find_descendant(&child, tag) {
                return Some(found);
            }
        }
        None
    }

    /// Copy every attribute of `from` onto `to`, overwriting existing values.
    fn copy_attributes(&self, from: &Self::Element, to: &Self::Element) -> Result<(), DomError> {
        for name in self.attribute_names(from) {
            if let Some(value) = self.get_attribute(from, &name) {
                self.set_attribute(to, &name, &value)?;
            }
        }
        Ok(())
    }
}
