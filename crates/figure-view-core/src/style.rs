//! Inline style (`cssText`) helpers.
//!
//! Only the subset a `style` attribute needs: a flat list of
//! `property: value` declarations. Serialization matches what browsers
//! produce for `element.style.cssText`, so text written by the in-memory DOM
//! compares equal to text read back from a real one.

use smol_str::SmolStr;

/// Ordered list of inline style declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    decls: Vec<(SmolStr, SmolStr)>,
}

impl InlineStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `cssText`. Declarations without a colon are dropped, later
    /// duplicates replace earlier ones in place.
    pub fn parse(css: &str) -> Self {
        let mut style = Self::new();
        for decl in css.split(';') {
            let Some((property, value)) = decl.split_once(':') else {
                continue;
            };
            let property = property.trim();
            let value = value.trim();
            if property.is_empty() || value.is_empty() {
                continue;
            }
            style.set(property, value);
        }
        style
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        let property = property.to_ascii_lowercase();
        self.decls
            .iter()
            .find(|(p, _)| *p == property)
            .map(|(_, v)| v.as_str())
    }

    /// Set a property, keeping its position if it already exists.
    /// An empty value removes the property.
    pub fn set(&mut self, property: &str, value: &str) {
        let property = property.trim().to_ascii_lowercase();
        let value = value.trim();
        if value.is_empty() {
            self.remove(&property);
            return;
        }
        match self.decls.iter_mut().find(|(p, _)| *p == property) {
            Some((_, v)) => *v = SmolStr::new(value),
            None => self.decls.push((SmolStr::new(property), SmolStr::new(value))),
        }
    }

    pub fn remove(&mut self, property: &str) {
        let property = property.to_ascii_lowercase();
        self.decls.retain(|(p, _)| *p != property);
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.decls.iter().map(|(p, v)| (p.as_str(), v.as_str()))
    }

    /// Serialize back to `cssText`, e.g. `width: 100%; height: auto;`.
    pub fn to_css_text(&self) -> String {
        self.decls
            .iter()
            .map(|(p, v)| format!("{p}: {v};"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl std::fmt::Display for InlineStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_css_text())
    }
}

/// Format a pixel length the way `cssText` does (`120px`, `120.5px`).
pub fn px(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}px", value as i64)
    } else {
        format!("{value}px")
    }
}
