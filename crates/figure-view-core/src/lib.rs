//! figure-view-core: node view logic for resizable, alignable, captioned
//! images, without platform dependencies.
//!
//! This crate provides:
//! - `Dom` trait for element access, with `MemoryDom` for tests and headless use
//! - `EditorHost` trait for the host document, with `PlainHost`
//! - `NodeView<D>` - one image widget, generic over the DOM
//! - Overlay controls, resize sessions, the active-widget coordinator
//! - Commands and parse/render/input rules

pub mod attrs;
pub mod commands;
pub mod controller;
pub mod coordinator;
pub mod dom;
pub mod error;
pub mod gesture;
pub mod host;
pub mod memory;
pub mod mutator;
pub mod node;
pub mod options;
pub mod overlay;
pub mod rules;
pub mod style;

pub use attrs::{AttrKey, DEFAULT_STYLE, Dimension, ImageAttrs, is_base64_src};
pub use commands::{convert_to_figure, convert_to_image, set_image, set_image_figure};
pub use controller::{ClickOutcome, GetPos, IntentOutcome, NodeView, ViewContext};
pub use coordinator::{Activation, Coordinator, SharedCoordinator};
pub use dom::{Dom, DomError};
pub use error::FigureError;
pub use gesture::{Corner, MIN_RESIZE_WIDTH, PointerSource, ResizeOutcome, ResizeSession, resolve_width};
pub use host::{Block, EditorHost, HostError, PlainHost};
pub use memory::{MemoryDom, MemoryElement};
pub use mutator::{Converted, figure_to_image, image_to_figure, restore_selection, widget_image};
pub use node::{ImageNode, InlineNode, NodeMode, caption_content, caption_present};
pub use options::{ControlIcons, FigureOptions};
pub use overlay::{
    Alignment, CaptionAction, ControlKind, OverlayConfig, OverlayControls, OverlayIntent,
    OverlayLayout,
};
pub use rules::{
    MarkdownImage, OutputSpec, apply_input_rule, find_markdown_images, match_markdown_image,
    parse_element, render_html, render_node,
};
pub use smol_str::SmolStr;
pub use style::InlineStyle;
