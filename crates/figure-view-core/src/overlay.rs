//! Overlay controls shown on the active widget.
//!
//! [`mount`] builds the control elements inside a wrapper and reports which
//! element is which control; it does not attach listeners and never touches
//! the document model. The platform layer wires each control to an
//! [`OverlayIntent`] and hands the intent to the node view.

use smol_str::SmolStr;

use crate::dom::{Dom, DomError};
use crate::gesture::Corner;
use crate::options::{ControlIcons, FigureOptions};
use crate::style::InlineStyle;

/// Marks every element the overlay adds, so teardown never touches the
/// image or the caption.
pub const OVERLAY_ATTR: &str = "data-figure-overlay";

/// Identifies the control an element (or its ancestor) belongs to.
pub const CONTROL_ATTR: &str = "data-figure-control";

const HIGHLIGHT_BORDER: &str = "1px dashed #6C6C6C";

const CAPTION_CONTAINER_STYLE: &str = "position: absolute; bottom: 2.5%; left: 50%; \
    width: 20px; height: 25px; z-index: 999; background-color: rgba(255, 255, 255, 0.7); \
    border-radius: 4px; border: 2px solid #6C6C6C; cursor: pointer; \
    transform: translate(-50%, -50%); display: flex; justify-content: space-between; \
    align-items: center; padding: 0 10px;";

/// Horizontal placement of the image inside its wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Alignment {
    pub const ALL: [Alignment; 3] = [Alignment::Left, Alignment::Center, Alignment::Right];

    pub fn as_str(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Alignment::ALL.into_iter().find(|a| a.as_str() == s)
    }

    /// Margin declarations that place the image.
    pub fn margin_rule(self) -> [(&'static str, &'static str); 3] {
        let (left, right) = match self {
            Alignment::Left => ("0", "auto"),
            Alignment::Center => ("auto", "auto"),
            Alignment::Right => ("auto", "0"),
        };
        [
            ("display", "block"),
            ("margin-left", left),
            ("margin-right", right),
        ]
    }

    /// Apply the margin rule to the image's inline style.
    pub fn apply<D: Dom>(self, dom: &D, image: &D::Element) -> Result<(), DomError> {
        for (property, value) in self.margin_rule() {
            dom.set_style_property(image, property, value)?;
        }
        Ok(())
    }

    /// Alignment encoded in a style, if it matches one of the rules.
    pub fn detect(style: &InlineStyle) -> Option<Self> {
        Alignment::ALL.into_iter().find(|a| {
            a.margin_rule()
                .iter()
                .all(|(p, v)| style.get(p) == Some(*v))
        })
    }

    fn label(self) -> &'static str {
        match self {
            Alignment::Left => "Align left",
            Alignment::Center => "Align center",
            Alignment::Right => "Align right",
        }
    }

    fn icon(self, icons: &ControlIcons) -> &str {
        match self {
            Alignment::Left => &icons.align_left,
            Alignment::Center => &icons.align_center,
            Alignment::Right => &icons.align_right,
        }
    }
}

/// What the single caption toggle does right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptionAction {
    Add,
    Remove,
}

impl CaptionAction {
    /// The toggle offers to remove a caption that is there and add one that
    /// is not.
    pub fn for_state(caption_present: bool) -> Self {
        if caption_present {
            CaptionAction::Remove
        } else {
            CaptionAction::Add
        }
    }
}

/// A control element's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Align(Alignment),
    Resize(Corner),
    Caption(CaptionAction),
    Delete,
}

impl ControlKind {
    pub fn as_str(self) -> SmolStr {
        match self {
            ControlKind::Align(a) => smol_str::format_smolstr!("align-{}", a.as_str()),
            ControlKind::Resize(c) => smol_str::format_smolstr!("resize-{}", c.as_str()),
            ControlKind::Caption(CaptionAction::Add) => SmolStr::new_static("caption-add"),
            ControlKind::Caption(CaptionAction::Remove) => SmolStr::new_static("caption-remove"),
            ControlKind::Delete => SmolStr::new_static("delete"),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        if let Some(align) = s.strip_prefix("align-") {
            return Alignment::parse(align).map(ControlKind::Align);
        }
        if let Some(corner) = s.strip_prefix("resize-") {
            return Corner::ALL
                .into_iter()
                .find(|c| c.as_str() == corner)
                .map(ControlKind::Resize);
        }
        match s {
            "caption-add" => Some(ControlKind::Caption(CaptionAction::Add)),
            "caption-remove" => Some(ControlKind::Caption(CaptionAction::Remove)),
            "delete" => Some(ControlKind::Delete),
            _ => None,
        }
    }

    /// The intent a click on this control expresses. Resize handles express
    /// theirs through a gesture instead.
    pub fn click_intent(self) -> Option<OverlayIntent> {
        match self {
            ControlKind::Align(a) => Some(OverlayIntent::Align(a)),
            ControlKind::Caption(CaptionAction::Add) => Some(OverlayIntent::CaptionAdd),
            ControlKind::Caption(CaptionAction::Remove) => Some(OverlayIntent::CaptionRemove),
            ControlKind::Delete => Some(OverlayIntent::Delete),
            ControlKind::Resize(_) => None,
        }
    }
}

/// Semantic requests coming out of the overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayIntent {
    Align(Alignment),
    Resize { width: f64 },
    CaptionAdd,
    CaptionRemove,
    Delete,
}

/// Size and placement of the resize handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayLayout {
    pub handle_size: u32,
    pub handle_offset: i32,
}

impl OverlayLayout {
    pub const POINTER: OverlayLayout = OverlayLayout {
        handle_size: 9,
        handle_offset: -4,
    };

    /// Larger targets for fingers.
    pub const TOUCH: OverlayLayout = OverlayLayout {
        handle_size: 16,
        handle_offset: -8,
    };

    pub fn for_viewport(options: &FigureOptions, viewport_width: f64) -> Self {
        if options.is_small_screen(viewport_width) {
            Self::TOUCH
        } else {
            Self::POINTER
        }
    }
}

/// Which control groups to mount, and how.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayConfig {
    pub alignable: bool,
    pub resizable: bool,
    pub caption_enabled: bool,
    pub deletable: bool,
    pub layout: OverlayLayout,
    pub icons: ControlIcons,
}

impl OverlayConfig {
    pub fn from_options(options: &FigureOptions, viewport_width: f64) -> Self {
        Self {
            alignable: options.alignable,
            resizable: options.resizable,
            caption_enabled: options.caption_enabled,
            deletable: options.deletable,
            layout: OverlayLayout::for_viewport(options, viewport_width),
            icons: options.icons.clone(),
        }
    }
}

/// Handles to a mounted control set.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayControls<E> {
    roots: Vec<E>,
    controls: Vec<(E, ControlKind)>,
}

impl<E> Default for OverlayControls<E> {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            controls: Vec::new(),
        }
    }
}

impl<E: Clone + PartialEq> OverlayControls<E> {
    /// Top-level overlay elements appended to the wrapper.
    pub fn roots(&self) -> &[E] {
        &self.roots
    }

    /// Every interactive control and its role.
    pub fn controls(&self) -> &[(E, ControlKind)] {
        &self.controls
    }

    pub fn find(&self, kind: ControlKind) -> Option<&E> {
        self.controls
            .iter()
            .find(|(_, k)| *k == kind)
            .map(|(el, _)| el)
    }

    /// The current caption toggle action, if the toggle is mounted.
    pub fn caption_action(&self) -> Option<CaptionAction> {
        self.controls.iter().find_map(|(_, k)| match k {
            ControlKind::Caption(action) => Some(*action),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    fn add_root(&mut self, root: E) {
        self.roots.push(root);
    }

    fn add_control(&mut self, el: E, kind: ControlKind) {
        self.controls.push((el, kind));
    }
}

/// Build the control set inside `wrapper`.
///
/// Any control set already mounted there is removed first, so repeated
/// activation never stacks duplicates.
pub fn mount<D: Dom>(
    dom: &D,
    wrapper: &D::Element,
    caption_present: bool,
    config: &OverlayConfig,
) -> Result<OverlayControls<D::Element>, DomError> {
    unmount(dom, wrapper);
    let mut controls = OverlayControls::default();

    if config.alignable {
        let container = overlay_root(dom, "div", "alignment")?;
        dom.set_attribute(&container, "class", "figure-view-alignment")?;
        for alignment in Alignment::ALL {
            let button = control_button(
                dom,
                ControlKind::Align(alignment),
                alignment.label(),
                alignment.icon(&config.icons),
            )?;
            dom.set_attribute(&button, "class", "figure-view-alignment-control")?;
            dom.append_child(&container, &button)?;
            controls.add_control(button, ControlKind::Align(alignment));
        }
        dom.append_child(wrapper, &container)?;
        controls.add_root(container);
    }

    if config.resizable {
        let OverlayLayout {
            handle_size,
            handle_offset,
        } = config.layout;
        let offset = format!("{handle_offset}px");
        for corner in Corner::ALL {
            let handle = overlay_root(dom, "div", "resize-handle")?;
            dom.set_attribute(&handle, CONTROL_ATTR, &ControlKind::Resize(corner).as_str())?;
            dom.set_attribute(
                &handle,
                "style",
                &format!(
                    "position: absolute; width: {handle_size}px; height: {handle_size}px; \
                     border: 1.5px solid #6C6C6C; border-radius: 50%; touch-action: none; {}",
                    corner.position_css(&offset)
                ),
            )?;
            dom.append_child(wrapper, &handle)?;
            controls.add_control(handle.clone(), ControlKind::Resize(corner));
            controls.add_root(handle);
        }
    }

    if config.caption_enabled {
        let action = CaptionAction::for_state(caption_present);
        let container = overlay_root(dom, "div", "caption")?;
        dom.set_attribute(&container, "style", CAPTION_CONTAINER_STYLE)?;
        let (label, icon) = match action {
            CaptionAction::Add => ("Add caption", &config.icons.caption_add),
            CaptionAction::Remove => ("Remove caption", &config.icons.caption_remove),
        };
        let kind = ControlKind::Caption(action);
        let button = control_button(dom, kind, label, icon)?;
        dom.set_attribute(&button, "class", "figure-view-caption-control")?;
        dom.append_child(&container, &button)?;
        dom.append_child(wrapper, &container)?;
        controls.add_control(button, kind);
        controls.add_root(container);
    }

    if config.deletable {
        let container = overlay_root(dom, "div", "delete")?;
        dom.set_attribute(&container, "class", "figure-view-delete")?;
        let button = control_button(dom, ControlKind::Delete, "Delete image", &config.icons.delete)?;
        dom.set_attribute(&button, "class", "figure-view-delete-control")?;
        dom.append_child(&container, &button)?;
        dom.append_child(wrapper, &container)?;
        controls.add_control(button, ControlKind::Delete);
        controls.add_root(container);
    }

    Ok(controls)
}

/// Remove every overlay element from `wrapper`. Returns how many were removed.
pub fn unmount<D: Dom>(dom: &D, wrapper: &D::Element) -> usize {
    let mut removed = 0;
    for child in dom.children(wrapper) {
        if dom.get_attribute(&child, OVERLAY_ATTR).is_some()
            && dom.remove_child(wrapper, &child).is_ok()
        {
            removed += 1;
        }
    }
    removed
}

/// Outline the wrapper to show it is selected.
pub fn highlight<D: Dom>(dom: &D, wrapper: &D::Element) -> Result<(), DomError> {
    dom.set_style_property(wrapper, "border", HIGHLIGHT_BORDER)?;
    dom.set_style_property(wrapper, "position", "relative")
}

pub fn clear_highlight<D: Dom>(dom: &D, wrapper: &D::Element) {
    let _ = dom.set_style_property(wrapper, "border", "");
    let _ = dom.set_style_property(wrapper, "position", "");
}

/// The control `target` belongs to, looking up through its ancestors until
/// `wrapper` is reached.
pub fn control_kind<D: Dom>(dom: &D, wrapper: &D::Element, target: &D::Element) -> Option<ControlKind> {
    if !dom.contains(wrapper, target) {
        return None;
    }
    let mut current = Some(target.clone());
    while let Some(el) = current {
        if let Some(kind) = dom
            .get_attribute(&el, CONTROL_ATTR)
            .and_then(|s| ControlKind::parse(&s))
        {
            return Some(kind);
        }
        if el == *wrapper {
            return None;
        }
        current = dom.parent(&el);
    }
    None
}

fn overlay_root<D: Dom>(dom: &D, tag: &str, role: &str) -> Result<D::Element, DomError> {
    let el = dom.create_element(tag)?;
    dom.set_attribute(&el, OVERLAY_ATTR, role)?;
    dom.set_attribute(&el, "contenteditable", "false")?;
    Ok(el)
}

fn control_button<D: Dom>(
    dom: &D,
    kind: ControlKind,
    label: &str,
    icon: &str,
) -> Result<D::Element, DomError> {
    let button = dom.create_element("button")?;
    dom.set_attribute(&button, "type", "button")?;
    dom.set_attribute(&button, CONTROL_ATTR, &kind.as_str())?;
    dom.set_attribute(&button, "title", label)?;
    dom.set_attribute(&button, "aria-label", label)?;
    if icon.is_empty() {
        dom.set_text_content(&button, label);
    } else {
        let img = dom.create_element("img")?;
        dom.set_attribute(&img, "src", icon)?;
        dom.set_attribute(&img, "alt", "")?;
        dom.set_attribute(&img, "draggable", "false")?;
        dom.append_child(&button, &img)?;
    }
    Ok(button)
}
