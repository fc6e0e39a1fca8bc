//! Tether View - element binding for the Tether engine
//!
//! This crate connects a tree of visual elements to a view-model from
//! `tether-core`:
//! - Element: a minimal host element tree with attributes and listeners
//! - Wrapper: reads binding declarations from element attributes
//! - Adapter: pushes converted values into an element and writes user
//!   edits back
//! - View: the registry routing property changes to bound adapters
//! - Controller: drives a view through the host's lifecycle
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use tether_core::{ObservableValue, PropertyNotifier, ViewModel, ViewModelDescriptor};
//! use tether_view::element::{input_text, VisualElement, VALUE_PATH};
//! use tether_view::ViewController;
//!
//! struct Counter {
//!     notifier: PropertyNotifier,
//!     count: ObservableValue<i64>,
//! }
//!
//! impl ViewModel for Counter {
//!     fn notifier(&self) -> &PropertyNotifier {
//!         &self.notifier
//!     }
//!
//!     fn describe(members: &mut ViewModelDescriptor<Self>) {
//!         members.property(
//!             "Count",
//!             |vm: &Counter| vm.count.get(),
//!             |vm: &Counter, v| {
//!                 vm.notifier.set_property(&vm.count, "Count", v);
//!             },
//!         );
//!     }
//! }
//!
//! let vm = Rc::new(Counter {
//!     notifier: PropertyNotifier::new(),
//!     count: ObservableValue::new(5),
//! });
//! let field = VisualElement::text_field("count")
//!     .with_attribute(VALUE_PATH, "Count")
//!     .into_handle();
//!
//! let mut controller = ViewController::new(Rc::clone(&field), Rc::clone(&vm));
//! controller.on_enable().unwrap();
//! assert_eq!(field.borrow().text(), "5");
//!
//! input_text(&field, "12");
//! assert_eq!(vm.count.get(), 12);
//! ```

/// Error types for the view layer
pub mod error;

/// Binding configuration
pub mod config;

/// Absorbed failure reporting
pub mod diagnostics;

/// Host element tree
pub mod element;

/// Bindable element adapters
pub mod adapter;

/// Attribute-driven element wrapping
pub mod wrapper;

/// The binding registry
pub mod view;

/// Host lifecycle driver
pub mod controller;

pub use adapter::{AdapterId, AdapterKind, BindingAdapter, BindingDirection, PropertySlot};
pub use config::{BindingConfig, ConfigError, ConversionErrorPolicy};
pub use controller::{ProviderFactory, ViewController, ViewControllerBuilder};
pub use diagnostics::{BindingDiagnostic, DiagnosticSink, FlowDirection};
pub use element::{ElementEvent, ElementHandle, ElementKind, ElementTarget, ListenerId, VisualElement};
pub use error::{ViewError, ViewResult};
pub use view::{BindingView, ViewPhase};
pub use wrapper::{BindingDeclaration, DefaultElementWrapper, ElementBindings, ElementWrapper};
