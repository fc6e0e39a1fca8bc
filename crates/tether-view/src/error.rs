//! Error types for the Tether view layer

use thiserror::Error;

use tether_core::BindingError;

/// View-related errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewError {
    /// An element declares a binding the wrapper cannot satisfy
    #[error("Unsupported element '{element}': {reason}")]
    UnsupportedElement { element: String, reason: String },

    /// Operation invoked after the view was disposed
    #[error("View has been disposed")]
    Disposed,

    /// `configure` called on a view that is already configured
    #[error("View is already configured")]
    AlreadyConfigured,

    /// Operation requires a configured view
    #[error("View is not configured")]
    NotConfigured,

    /// The object provider is bound to a different view-model instance
    #[error("Object provider is bound to a different view-model")]
    ProviderMismatch,

    /// The validation pass found defects in the declared bindings
    #[error("{} invalid binding(s): {}", .0.len(), join(.0))]
    Validation(Vec<BindingError>),

    /// Resolution error
    #[error(transparent)]
    Binding(#[from] BindingError),
}

impl ViewError {
    pub(crate) fn unsupported(element: &str, reason: impl Into<String>) -> Self {
        Self::UnsupportedElement {
            element: element.to_string(),
            reason: reason.into(),
        }
    }
}

fn join(errors: &[BindingError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for view operations
pub type ViewResult<T> = Result<T, ViewError>;
