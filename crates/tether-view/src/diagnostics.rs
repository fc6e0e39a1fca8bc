//! Reporting of absorbed binding failures
//!
//! A push or write-back that fails never interrupts the bindings around
//! it. The failure is handed to a [`DiagnosticSink`], which applies the
//! view's [`ConversionErrorPolicy`].

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tether_core::BindingError;

use crate::config::ConversionErrorPolicy;

/// Which way a failed value was travelling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowDirection {
    /// View-model to element
    ToElement,
    /// Element to view-model
    ToViewModel,
}

impl fmt::Display for FlowDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToElement => f.write_str("to element"),
            Self::ToViewModel => f.write_str("to view-model"),
        }
    }
}

/// One absorbed failure
#[derive(Debug, Clone, PartialEq)]
pub struct BindingDiagnostic {
    /// Name of the element involved
    pub element: String,
    /// Property being transferred
    pub property: String,
    /// Direction of the transfer
    pub direction: FlowDirection,
    /// What went wrong
    pub error: BindingError,
}

/// Shared receiver for absorbed failures
#[derive(Clone, Default)]
pub struct DiagnosticSink {
    policy: ConversionErrorPolicy,
    pending: Rc<RefCell<Vec<BindingDiagnostic>>>,
}

impl DiagnosticSink {
    /// Create a sink with the given policy
    #[must_use]
    pub fn new(policy: ConversionErrorPolicy) -> Self {
        Self {
            policy,
            pending: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// The active policy
    #[must_use]
    pub fn policy(&self) -> ConversionErrorPolicy {
        self.policy
    }

    /// Report a failure
    pub fn report(&self, diagnostic: BindingDiagnostic) {
        match self.policy {
            ConversionErrorPolicy::Ignore => {
                tracing::trace!(
                    element = %diagnostic.element,
                    property = %diagnostic.property,
                    "Ignoring binding failure"
                );
            }
            ConversionErrorPolicy::Log => log(&diagnostic),
            ConversionErrorPolicy::Report => {
                log(&diagnostic);
                self.pending.borrow_mut().push(diagnostic);
            }
        }
    }

    /// Take all queued diagnostics
    pub fn take(&self) -> Vec<BindingDiagnostic> {
        std::mem::take(&mut *self.pending.borrow_mut())
    }

    /// Number of queued diagnostics
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }
}

fn log(diagnostic: &BindingDiagnostic) {
    tracing::warn!(
        element = %diagnostic.element,
        property = %diagnostic.property,
        direction = %diagnostic.direction,
        error = %diagnostic.error,
        "Binding value could not be transferred"
    );
}

impl fmt::Debug for DiagnosticSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticSink")
            .field("policy", &self.policy)
            .field("pending", &self.pending())
            .finish()
    }
}
