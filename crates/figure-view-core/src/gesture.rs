//! Resize gestures.
//!
//! A drag on one of the four corner handles is modelled as a
//! [`ResizeSession`]: begun on pointer/touch down, fed positions while the
//! pointer moves, and consumed exactly once by [`ResizeSession::end`] or
//! [`ResizeSession::cancel`]. The session never touches the DOM or the
//! document; the platform layer owns listener registration and the node view
//! applies the widths it returns.

/// Narrowest width a drag can shrink an image to, in CSS pixels.
pub const MIN_RESIZE_WIDTH: f64 = 16.0;

/// A resize handle, indexed clockwise from the top-left in handle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft = 0,
    TopRight = 1,
    BottomLeft = 2,
    BottomRight = 3,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Corner::ALL.get(index).copied()
    }

    /// Left-hand handles grow the image when dragged left, so the horizontal
    /// delta is negated for them.
    pub fn inverts(self) -> bool {
        self.index() % 2 == 0
    }

    /// CSS cursor shown over the handle.
    pub fn cursor(self) -> &'static str {
        match self {
            Corner::TopLeft | Corner::BottomRight => "nwse-resize",
            Corner::TopRight | Corner::BottomLeft => "nesw-resize",
        }
    }

    /// Absolute-position declarations placing the handle on its corner.
    pub fn position_css(self, offset: &str) -> String {
        let (vertical, horizontal) = match self {
            Corner::TopLeft => ("top", "left"),
            Corner::TopRight => ("top", "right"),
            Corner::BottomLeft => ("bottom", "left"),
            Corner::BottomRight => ("bottom", "right"),
        };
        format!(
            "{vertical}: {offset}; {horizontal}: {offset}; cursor: {};",
            self.cursor()
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Corner::TopLeft => "top-left",
            Corner::TopRight => "top-right",
            Corner::BottomLeft => "bottom-left",
            Corner::BottomRight => "bottom-right",
        }
    }
}

/// Which input family started a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerSource {
    Mouse,
    Touch,
}

/// Width produced by dragging `corner` from `start_x` to `current_x`.
pub fn resolve_width(corner: Corner, start_width: f64, start_x: f64, current_x: f64) -> f64 {
    let delta = current_x - start_x;
    let delta = if corner.inverts() { -delta } else { delta };
    (start_width + delta).max(MIN_RESIZE_WIDTH)
}

/// How a resize session finished.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeOutcome {
    /// Pointer released: write this width to the document.
    Commit { width: f64 },
    /// Gesture abandoned: put the element back to its starting width.
    Cancelled { start_width: f64 },
}

/// State of one in-progress drag on a resize handle.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSession {
    corner: Corner,
    source: PointerSource,
    start_x: f64,
    start_width: f64,
    current_width: f64,
}

impl ResizeSession {
    pub fn begin(corner: Corner, source: PointerSource, start_x: f64, start_width: f64) -> Self {
        tracing::trace!(corner = corner.as_str(), ?source, start_x, start_width, "resize begin");
        Self {
            corner,
            source,
            start_x,
            start_width,
            current_width: start_width,
        }
    }

    pub fn corner(&self) -> Corner {
        self.corner
    }

    pub fn source(&self) -> PointerSource {
        self.source
    }

    pub fn start_width(&self) -> f64 {
        self.start_width
    }

    pub fn current_width(&self) -> f64 {
        self.current_width
    }

    /// Feed a pointer position. Events from the other input family are
    /// ignored and return `None`.
    pub fn update(&mut self, source: PointerSource, x: f64) -> Option<f64> {
        if source != self.source {
            return None;
        }
        self.current_width = resolve_width(self.corner, self.start_width, self.start_x, x);
        Some(self.current_width)
    }

    /// Pointer released. Always commits, even if the pointer never moved.
    pub fn end(self) -> ResizeOutcome {
        tracing::trace!(width = self.current_width, "resize commit");
        ResizeOutcome::Commit {
            width: self.current_width,
        }
    }

    pub fn cancel(self) -> ResizeOutcome {
        tracing::trace!(start_width = self.start_width, "resize cancelled");
        ResizeOutcome::Cancelled {
            start_width: self.start_width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_rule() {
        // Dragging right by 10px.
        assert_eq!(resolve_width(Corner::TopLeft, 200.0, 50.0, 60.0), 190.0);
        assert_eq!(resolve_width(Corner::BottomLeft, 200.0, 50.0, 60.0), 190.0);
        assert_eq!(resolve_width(Corner::TopRight, 200.0, 50.0, 60.0), 210.0);
        assert_eq!(resolve_width(Corner::BottomRight, 200.0, 50.0, 60.0), 210.0);
    }

    #[test]
    fn test_width_floor() {
        assert_eq!(
            resolve_width(Corner::BottomRight, 100.0, 300.0, 0.0),
            MIN_RESIZE_WIDTH
        );
    }

    #[test]
    fn test_corner_indices() {
        for (i, corner) in Corner::ALL.into_iter().enumerate() {
            assert_eq!(corner.index(), i);
            assert_eq!(Corner::from_index(i), Some(corner));
        }
        assert_eq!(Corner::from_index(4), None);
    }

    #[test]
    fn test_session_ignores_other_source() {
        let mut session = ResizeSession::begin(Corner::BottomRight, PointerSource::Touch, 0.0, 100.0);
        assert_eq!(session.update(PointerSource::Mouse, 40.0), None);
        assert_eq!(session.current_width(), 100.0);
        assert_eq!(session.update(PointerSource::Touch, 40.0), Some(140.0));
        assert_eq!(session.end(), ResizeOutcome::Commit { width: 140.0 });
    }

    #[test]
    fn test_release_without_move_commits_start_width() {
        let session = ResizeSession::begin(Corner::TopLeft, PointerSource::Mouse, 10.0, 300.0);
        assert_eq!(session.end(), ResizeOutcome::Commit { width: 300.0 });
    }

    #[test]
    fn test_cancel_reports_start() {
        let mut session = ResizeSession::begin(Corner::TopRight, PointerSource::Mouse, 0.0, 80.0);
        session.update(PointerSource::Mouse, 25.0);
        assert_eq!(session.cancel(), ResizeOutcome::Cancelled { start_width: 80.0 });
    }

    #[test]
    fn test_position_css() {
        assert_eq!(
            Corner::BottomLeft.position_css("-4px"),
            "bottom: -4px; left: -4px; cursor: nesw-resize;"
        );
    }
}
