//! Attribute schema of the image node.
//!
//! The node carries a fixed set of attributes. Anything else that shows up
//! (from a pasted element, a host serializer, a JS caller) is ignored
//! explicitly instead of being forwarded onto the DOM.

use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, ToSmolStr};

/// Style applied to the wrapper when a node has no `style` of its own.
pub const DEFAULT_STYLE: &str = "width: 100%; height: auto; cursor: pointer;";

/// The attributes an image node knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrKey {
    Src,
    Alt,
    Title,
    Width,
    Height,
    Style,
}

impl AttrKey {
    pub const ALL: [AttrKey; 6] = [
        AttrKey::Src,
        AttrKey::Alt,
        AttrKey::Title,
        AttrKey::Width,
        AttrKey::Height,
        AttrKey::Style,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AttrKey::Src => "src",
            AttrKey::Alt => "alt",
            AttrKey::Title => "title",
            AttrKey::Width => "width",
            AttrKey::Height => "height",
            AttrKey::Style => "style",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        AttrKey::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl std::fmt::Display for AttrKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A width or height: either whole pixels or whatever string the source had.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dimension {
    Px(u32),
    Raw(SmolStr),
}

impl Dimension {
    /// Parse an attribute value. Plain integers (optionally suffixed `px`)
    /// become pixels, everything else is kept verbatim.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        let digits = value.strip_suffix("px").unwrap_or(value).trim();
        match digits.parse::<u32>() {
            Ok(px) => Some(Dimension::Px(px)),
            Err(_) => Some(Dimension::Raw(value.to_smolstr())),
        }
    }

    pub fn as_px(&self) -> Option<u32> {
        match self {
            Dimension::Px(px) => Some(*px),
            Dimension::Raw(_) => None,
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dimension::Px(px) => write!(f, "{px}"),
            Dimension::Raw(raw) => f.write_str(raw),
        }
    }
}

/// Attributes of an image node. Absent attributes are `None` and never
/// rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageAttrs {
    #[serde(skip_serializing_if = "Option::is_none")]
    src: Option<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alt: Option<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<SmolStr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<SmolStr>,
}

impl ImageAttrs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attributes for an image at `src`.
    pub fn with_src(src: impl Into<SmolStr>) -> Self {
        Self {
            src: Some(src.into()),
            ..Self::default()
        }
    }

    /// Build from loose `name -> value` pairs. Unknown names and empty values
    /// are dropped.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut attrs = Self::new();
        for (name, value) in pairs {
            match AttrKey::from_name(name) {
                Some(key) => attrs.set(key, Some(value)),
                None => tracing::trace!(name, "ignoring unknown image attribute"),
            }
        }
        attrs
    }

    pub fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    pub fn alt(&self) -> Option<&str> {
        self.alt.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn width(&self) -> Option<&Dimension> {
        self.width.as_ref()
    }

    pub fn height(&self) -> Option<&Dimension> {
        self.height.as_ref()
    }

    pub fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }

    /// The wrapper style, falling back to [`DEFAULT_STYLE`].
    pub fn style_or_default(&self) -> &str {
        self.style().unwrap_or(DEFAULT_STYLE)
    }

    pub fn set_src(&mut self, src: Option<impl Into<SmolStr>>) {
        self.src = src.map(Into::into).filter(|s: &SmolStr| !s.is_empty());
    }

    pub fn set_alt(&mut self, alt: Option<impl Into<SmolStr>>) {
        self.alt = alt.map(Into::into).filter(|s: &SmolStr| !s.is_empty());
    }

    pub fn set_title(&mut self, title: Option<impl Into<SmolStr>>) {
        self.title = title.map(Into::into).filter(|s: &SmolStr| !s.is_empty());
    }

    pub fn set_width(&mut self, width: Option<Dimension>) {
        self.width = width;
    }

    pub fn set_height(&mut self, height: Option<Dimension>) {
        self.height = height;
    }

    pub fn set_style(&mut self, style: Option<impl Into<SmolStr>>) {
        self.style = style
            .map(Into::into)
            .filter(|s: &SmolStr| !s.trim().is_empty());
    }

    /// String form of one attribute, as it would appear on the DOM.
    pub fn get(&self, key: AttrKey) -> Option<SmolStr> {
        match key {
            AttrKey::Src => self.src.clone(),
            AttrKey::Alt => self.alt.clone(),
            AttrKey::Title => self.title.clone(),
            AttrKey::Width => self.width.as_ref().map(|w| w.to_smolstr()),
            AttrKey::Height => self.height.as_ref().map(|h| h.to_smolstr()),
            AttrKey::Style => self.style.clone(),
        }
    }

    /// Set one attribute from its string form. `None` or empty clears it.
    pub fn set(&mut self, key: AttrKey, value: Option<&str>) {
        let value = value.filter(|v| !v.is_empty());
        match key {
            AttrKey::Src => self.set_src(value),
            AttrKey::Alt => self.set_alt(value),
            AttrKey::Title => self.set_title(value),
            AttrKey::Width => self.set_width(value.and_then(Dimension::parse)),
            AttrKey::Height => self.set_height(value.and_then(Dimension::parse)),
            AttrKey::Style => self.set_style(value),
        }
    }

    /// Present attributes in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (AttrKey, SmolStr)> + '_ {
        AttrKey::ALL
            .into_iter()
            .filter_map(|key| self.get(key).map(|value| (key, value)))
    }

    /// Whether the `src` is an inline base64 data URI.
    pub fn is_base64(&self) -> bool {
        self.src().is_some_and(is_base64_src)
    }
}

/// Whether a `src` value is an inline base64 data URI.
pub fn is_base64_src(src: &str) -> bool {
    let src = src.trim_start();
    src.get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
        && src.split_once(',').is_some_and(|(head, _)| head.contains(";base64"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs_ignores_unknown() {
        let attrs = ImageAttrs::from_pairs([
            ("src", "a.png"),
            ("alt", "x"),
            ("onerror", "alert(1)"),
            ("data-id", "7"),
        ]);
        let keys: Vec<_> = attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![AttrKey::Src, AttrKey::Alt]);
    }

    #[test]
    fn test_dimension_parse() {
        assert_eq!(Dimension::parse("320"), Some(Dimension::Px(320)));
        assert_eq!(Dimension::parse("320px"), Some(Dimension::Px(320)));
        assert_eq!(
            Dimension::parse("50%"),
            Some(Dimension::Raw(SmolStr::new("50%")))
        );
        assert_eq!(Dimension::parse("  "), None);
    }

    #[test]
    fn test_empty_values_clear() {
        let mut attrs = ImageAttrs::with_src("a.png");
        attrs.set(AttrKey::Alt, Some("cat"));
        attrs.set(AttrKey::Alt, Some(""));
        assert_eq!(attrs.alt(), None);
        attrs.set_style(Some("   "));
        assert_eq!(attrs.style(), None);
        assert_eq!(attrs.style_or_default(), DEFAULT_STYLE);
    }

    #[test]
    fn test_serde_camel_case_and_skip() {
        let mut attrs = ImageAttrs::with_src("a.png");
        attrs.set_width(Some(Dimension::Px(200)));
        let json = serde_json::to_value(&attrs).unwrap();
        assert_eq!(json, serde_json::json!({ "src": "a.png", "width": 200 }));

        let back: ImageAttrs =
            serde_json::from_value(serde_json::json!({ "src": "b.png", "height": "auto" })).unwrap();
        assert_eq!(back.src(), Some("b.png"));
        assert_eq!(back.height(), Some(&Dimension::Raw(SmolStr::new("auto"))));
    }

    #[test]
    fn test_base64_detection() {
        assert!(is_base64_src("data:image/png;base64,iVBORw0KGgo="));
        assert!(is_base64_src("DATA:image/gif;base64,R0lGOD"));
        assert!(!is_base64_src("data:image/svg+xml,<svg/>"));
        assert!(!is_base64_src("https://x/img.png"));
    }
}
