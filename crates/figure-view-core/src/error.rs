//! Error types for node view operations.

use thiserror::Error;

use crate::dom::DomError;
use crate::host::HostError;

/// Errors that can occur while a node view updates its DOM or writes back.
///
/// These never escape the node view's event entry points: they are logged and
/// the widget carries on in a degraded state.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum FigureError {
    /// A DOM operation failed.
    #[error("dom error: {0}")]
    Dom(#[from] DomError),

    /// The host refused a document write.
    #[error("host error: {0}")]
    Host(#[from] HostError),

    /// The widget has no image element to operate on.
    #[error("widget has no image element")]
    MissingImage,
}
