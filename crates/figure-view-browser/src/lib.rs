//! Browser DOM layer for the figure node view.
//!
//! This crate binds the platform-agnostic node view to real DOM elements
//! and browser events. It assumes a `wasm32-unknown-unknown` target
//! environment.
//!
//! # Architecture
//!
//! - `dom`: `WebDom`, the `web-sys` implementation of the `Dom` trait
//! - `gesture`: document listeners that live exactly as long as a resize drag
//! - `view`: `BrowserNodeView`, the node view with its listeners attached
//! - `styles`: the scoped overlay stylesheet
//! - `platform`: Browser/OS detection for touch handling
//!
//! # Re-exports
//!
//! This crate re-exports `figure-view-core` for convenience, so consumers
//! only need to depend on `figure-view-browser`.

// Re-export core crate
pub use figure_view_core;
pub use figure_view_core::*;

pub mod dom;
pub mod gesture;
pub mod platform;
pub mod styles;
pub mod view;

pub use dom::WebDom;
pub use gesture::GestureGuard;
pub use platform::{Platform, platform};
pub use styles::{OVERLAY_CSS, STYLESHEET_ID, install_stylesheet, scope_css};
pub use view::BrowserNodeView;
