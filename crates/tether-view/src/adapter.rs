//! Bindable element adapters
//!
//! A [`BindingAdapter`] pairs one element with the view-model members it
//! declares. It pulls property values, converts them and pushes them into
//! the element without firing the element's own listeners. While attached
//! it listens for user input and writes converted values back, or invokes
//! the bound command on click.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tether_core::{BindingError, Command, ResolvedProperty, Value, ViewModel};

use crate::diagnostics::{BindingDiagnostic, DiagnosticSink, FlowDirection};
use crate::element::{ElementEvent, ElementHandle, ElementKind, ElementTarget, ListenerId};

static NEXT_ADAPTER_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier of an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AdapterId(u64);

impl AdapterId {
    fn next() -> Self {
        Self(NEXT_ADAPTER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// The element families the default wrapper knows how to bind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    Label,
    TextField,
    Toggle,
    Slider,
    Button,
    /// Elements with nothing but visibility and enabled state to bind
    Passive,
}

impl From<ElementKind> for AdapterKind {
    fn from(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Label => Self::Label,
            ElementKind::TextField => Self::TextField,
            ElementKind::Toggle => Self::Toggle,
            ElementKind::Slider => Self::Slider,
            ElementKind::Button => Self::Button,
            ElementKind::Container => Self::Passive,
        }
    }
}

/// Whether user edits flow back into the view-model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingDirection {
    /// View-model to element only
    OneWay,
    /// Both ways
    TwoWay,
}

impl BindingDirection {
    #[must_use]
    pub fn is_two_way(self) -> bool {
        self == Self::TwoWay
    }
}

/// One property bound to one element target
pub struct PropertySlot<VM> {
    target: ElementTarget,
    direction: BindingDirection,
    property: ResolvedProperty<VM>,
}

impl<VM> PropertySlot<VM> {
    /// Create a slot
    #[must_use]
    pub fn new(target: ElementTarget, direction: BindingDirection, property: ResolvedProperty<VM>) -> Self {
        Self {
            target,
            direction,
            property,
        }
    }

    #[must_use]
    pub fn target(&self) -> ElementTarget {
        self.target
    }

    #[must_use]
    pub fn direction(&self) -> BindingDirection {
        self.direction
    }

    #[must_use]
    pub fn property(&self) -> &ResolvedProperty<VM> {
        &self.property
    }

    /// Name of the bound property
    #[must_use]
    pub fn name(&self) -> &str {
        self.property.name()
    }
}

impl<VM> fmt::Debug for PropertySlot<VM> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertySlot")
            .field("target", &self.target)
            .field("direction", &self.direction)
            .field("property", &self.property)
            .finish()
    }
}

/// An element together with its resolved bindings
pub struct BindingAdapter<VM: ViewModel> {
    id: AdapterId,
    kind: AdapterKind,
    element: ElementHandle,
    element_name: String,
    view_model: Rc<VM>,
    slots: Vec<PropertySlot<VM>>,
    command: Option<Command<VM>>,
    listener: Cell<Option<ListenerId>>,
}

impl<VM: ViewModel> BindingAdapter<VM> {
    /// Create an adapter for `element`
    #[must_use]
    pub fn new(element: ElementHandle, view_model: Rc<VM>, slots: Vec<PropertySlot<VM>>, command: Option<Command<VM>>) -> Self {
        let (kind, element_name) = {
            let el = element.borrow();
            (AdapterKind::from(el.kind()), el.name().to_string())
        };
        Self {
            id: AdapterId::next(),
            kind,
            element,
            element_name,
            view_model,
            slots,
            command,
            listener: Cell::new(None),
        }
    }

    #[must_use]
    pub fn id(&self) -> AdapterId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> AdapterKind {
        self.kind
    }

    /// The wrapped element
    #[must_use]
    pub fn element(&self) -> &ElementHandle {
        &self.element
    }

    #[must_use]
    pub fn element_name(&self) -> &str {
        &self.element_name
    }

    #[must_use]
    pub fn slots(&self) -> &[PropertySlot<VM>] {
        &self.slots
    }

    /// The bound command, if any
    #[must_use]
    pub fn command(&self) -> Option<&Command<VM>> {
        self.command.as_ref()
    }

    /// Names of the properties this adapter displays, without repeats
    #[must_use]
    pub fn bound_properties(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::with_capacity(self.slots.len());
        for slot in &self.slots {
            if !names.contains(&slot.name()) {
                names.push(slot.name());
            }
        }
        names
    }

    /// Whether any slot binds `property`
    #[must_use]
    pub fn binds(&self, property: &str) -> bool {
        self.slots.iter().any(|slot| slot.name() == property)
    }

    /// Whether the adapter is listening to its element
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.listener.get().is_some()
    }

    /// Pull, convert and push every bound property
    pub fn update_values(&self, sink: &DiagnosticSink) {
        for slot in &self.slots {
            self.push(slot, sink);
        }
    }

    /// Pull, convert and push the slots bound to `property`
    pub fn update_property(&self, property: &str, sink: &DiagnosticSink) {
        for slot in self.slots.iter().filter(|slot| slot.name() == property) {
            self.push(slot, sink);
        }
    }

    /// Start listening for user input on the element.
    ///
    /// Adapters with nothing to write back stay detached. Attaching twice is
    /// a no-op.
    pub fn attach(self: &Rc<Self>, sink: &DiagnosticSink) {
        if self.is_attached() || !self.accepts_input() {
            return;
        }

        let adapter = Rc::downgrade(self);
        let sink = sink.clone();
        let id = self.element.borrow_mut().add_listener(move |event| {
            if let Some(adapter) = adapter.upgrade() {
                adapter.handle_event(event, &sink);
            }
        });
        self.listener.set(Some(id));
        tracing::trace!(element = %self.element_name, "Attached input listener");
    }

    /// Stop listening for user input
    pub fn detach(&self) {
        if let Some(id) = self.listener.take() {
            if let Ok(mut el) = self.element.try_borrow_mut() {
                el.remove_listener(id);
            }
            tracing::trace!(element = %self.element_name, "Detached input listener");
        }
    }

    fn accepts_input(&self) -> bool {
        self.command.is_some() || self.slots.iter().any(|slot| slot.direction.is_two_way())
    }

    fn push(&self, slot: &PropertySlot<VM>, sink: &DiagnosticSink) {
        let value = match slot.property.pull(&self.view_model) {
            Ok(value) => value,
            Err(err) => {
                let fallback = err.target.default_value();
                self.report(slot, FlowDirection::ToElement, err.into(), sink);
                fallback
            }
        };

        let Ok(mut el) = self.element.try_borrow_mut() else {
            tracing::warn!(element = %self.element_name, property = slot.name(), "Element busy, push skipped");
            return;
        };
        if !el.set_value_without_notify(slot.target, &value) {
            let expected = el.kind().value_kind(slot.target).unwrap_or(value.kind());
            drop(el);
            let err = BindingError::TypeMismatch {
                property: slot.name().to_string(),
                expected,
                actual: value.kind(),
            };
            self.report(slot, FlowDirection::ToElement, err, sink);
        }
    }

    fn handle_event(&self, event: &ElementEvent, sink: &DiagnosticSink) {
        match event {
            ElementEvent::Changed(value) => self.write_back(value, sink),
            ElementEvent::Clicked => {
                if let Some(command) = &self.command {
                    tracing::trace!(element = %self.element_name, command = command.name(), "Invoking command");
                    command.execute(&self.view_model);
                }
            }
        }
    }

    fn write_back(&self, value: &Value, sink: &DiagnosticSink) {
        for slot in self.slots.iter().filter(|slot| slot.direction.is_two_way()) {
            match slot.property.write_back(&self.view_model, value) {
                Ok(None) => {}
                Ok(Some(err)) => self.report(slot, FlowDirection::ToViewModel, err.into(), sink),
                Err(err) => self.report(slot, FlowDirection::ToViewModel, err, sink),
            }
        }
    }

    fn report(&self, slot: &PropertySlot<VM>, direction: FlowDirection, error: BindingError, sink: &DiagnosticSink) {
        sink.report(BindingDiagnostic {
            element: self.element_name.clone(),
            property: slot.name().to_string(),
            direction,
            error,
        });
    }
}

impl<VM: ViewModel> Drop for BindingAdapter<VM> {
    fn drop(&mut self) {
        self.detach();
    }
}

impl<VM: ViewModel> fmt::Debug for BindingAdapter<VM> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingAdapter")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("element", &self.element_name)
            .field("slots", &self.slots)
            .field("command", &self.command.as_ref().map(Command::name))
            .field("attached", &self.is_attached())
            .finish()
    }
}
