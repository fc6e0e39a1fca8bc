//! Error types for property resolution and value conversion

use std::fmt;

use thiserror::Error;

use crate::value::{Value, ValueKind};

/// Errors raised while resolving bindings against a view-model
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindingError {
    /// The view-model declares no property with this name
    #[error("Property '{property}' not found on {view_model}")]
    PropertyNotFound {
        property: String,
        view_model: &'static str,
    },

    /// The view-model declares no command with this name
    #[error("Command '{command}' not found on {view_model}")]
    CommandNotFound {
        command: String,
        view_model: &'static str,
    },

    /// A binding selected a converter that is not registered
    #[error("Converter '{0}' is not registered")]
    ConverterNotFound(String),

    /// No converter bridges the property type and the element type
    #[error("Type mismatch on '{property}': expected {expected}, got {actual}")]
    TypeMismatch {
        property: String,
        expected: ValueKind,
        actual: ValueKind,
    },

    /// A two-way binding targets a property without a setter
    #[error("Property '{0}' is read-only")]
    ReadOnlyProperty(String),

    /// A view-model declares the same member name twice
    #[error("Member '{member}' declared twice on {view_model}")]
    DuplicateMember {
        member: String,
        view_model: &'static str,
    },

    /// Conversion error
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// Result type alias for binding operations
pub type BindingResult<T> = Result<T, BindingError>;

/// A value could not be converted.
///
/// Conversion errors are absorbed by the binding engine: the target's
/// default value is used instead and the error is reported through the
/// configured policy.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionError {
    /// Name of the converter that failed
    pub converter: String,
    /// The rejected input
    pub input: Value,
    /// The kind the input was being converted to
    pub target: ValueKind,
}

impl ConversionError {
    /// Create a new conversion error
    #[must_use]
    pub fn new(converter: impl Into<String>, input: Value, target: ValueKind) -> Self {
        Self {
            converter: converter.into(),
            input,
            target,
        }
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cannot convert {} '{}' to {}",
            self.converter,
            self.input.type_name(),
            self.input,
            self.target
        )
    }
}

impl std::error::Error for ConversionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_error_display() {
        let err = ConversionError::new("IntToStr", Value::text("abc"), ValueKind::Int);
        assert_eq!(err.to_string(), "IntToStr cannot convert Text 'abc' to Int");
    }

    #[test]
    fn test_binding_error_wraps_conversion() {
        let err: BindingError =
            ConversionError::new("FloatToStr", Value::text("x"), ValueKind::Float).into();
        assert!(matches!(err, BindingError::Conversion(_)));
        assert!(err.to_string().contains("FloatToStr"));
    }

    #[test]
    fn test_property_not_found_message() {
        let err = BindingError::PropertyNotFound {
            property: "Count".to_string(),
            view_model: "CounterViewModel",
        };
        assert_eq!(err.to_string(), "Property 'Count' not found on CounterViewModel");
    }
}
