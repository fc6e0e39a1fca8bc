//! Tether Core - view-model side of the Tether binding engine
//!
//! This crate provides everything the binding engine needs to know about a
//! view-model, independent of any UI toolkit:
//! - Value: the dynamic value type that crosses the binding boundary
//! - Converter: bidirectional, lenient value converters
//! - Notify: synchronous property change notification with explicit
//!   unsubscribe handles
//! - View model: the trait view-models implement to declare their members
//! - Provider: name-based resolution of properties, commands and converters
//!
//! Everything here is single-threaded. View-models are shared through `Rc`
//! and mutated through `&self` setters backed by [`ObservableValue`].

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error types for resolution and conversion
pub mod error;

/// Dynamic values and bindable types
pub mod value;

/// Value converters
pub mod converter;

/// Property change notification
pub mod notify;

/// View-model contract and member declarations
pub mod view_model;

/// Name-based member resolution
pub mod provider;

pub use converter::{
    BoolToStrConverter, ConvertedBack, ConverterSet, FloatToStrConverter, IntToFloatConverter,
    IntToStrConverter, PropertyValueConverter, ValueConverter,
};
pub use error::{BindingError, BindingResult, ConversionError};
pub use notify::{ObservableValue, PropertyNotifier, Subscription};
pub use provider::{BindingRequest, ObjectProvider, ResolvedProperty};
pub use value::{BindableValue, Value, ValueKind};
pub use view_model::{Command, PropertyAccessor, ViewModel, ViewModelDescriptor};
