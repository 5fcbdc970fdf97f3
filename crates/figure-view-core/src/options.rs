//! Extension options.
//!
//! Every field has a default, so hosts can pass a partial object (or none).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::attrs::DEFAULT_STYLE;

/// Screen width (CSS px) at or below which touch-sized handles are used.
pub const DEFAULT_MOBILE_BREAKPOINT: f64 = 768.0;

/// Text seeded into a newly added caption.
pub const DEFAULT_CAPTION_PLACEHOLDER: &str = "Caption";

/// Options for the image extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FigureOptions {
    /// Declare the node inline rather than as a block in the host schema.
    /// See [`FigureOptions::group`].
    pub inline: bool,
    /// Accept `data:` base64 sources when parsing HTML.
    pub allow_base64: bool,
    /// Extra attributes merged onto the rendered `img`.
    #[serde(rename = "HTMLAttributes", alias = "htmlAttributes")]
    pub html_attributes: BTreeMap<SmolStr, SmolStr>,
    pub resizable: bool,
    pub alignable: bool,
    pub caption_enabled: bool,
    pub deletable: bool,
    pub caption_placeholder: SmolStr,
    pub mobile_breakpoint: f64,
    /// Style used for nodes without one.
    pub default_style: SmolStr,
    pub icons: ControlIcons,
}

impl Default for FigureOptions {
    fn default() -> Self {
        Self {
            inline: false,
            allow_base64: false,
            html_attributes: BTreeMap::new(),
            resizable: true,
            alignable: true,
            caption_enabled: true,
            deletable: true,
            caption_placeholder: SmolStr::new_static(DEFAULT_CAPTION_PLACEHOLDER),
            mobile_breakpoint: DEFAULT_MOBILE_BREAKPOINT,
            default_style: SmolStr::new_static(DEFAULT_STYLE),
            icons: ControlIcons::default(),
        }
    }
}

impl FigureOptions {
    /// Whether a viewport this wide gets touch-sized controls.
    pub fn is_small_screen(&self, viewport_width: f64) -> bool {
        viewport_width <= self.mobile_breakpoint
    }

    /// Schema group the host registers the node under.
    pub fn group(&self) -> &'static str {
        if self.inline { "inline" } else { "block" }
    }
}

/// Icon URLs for the overlay controls. Empty strings render text-only buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControlIcons {
    pub align_left: SmolStr,
    pub align_center: SmolStr,
    pub align_right: SmolStr,
    pub caption_add: SmolStr,
    pub caption_remove: SmolStr,
    pub delete: SmolStr,
}
