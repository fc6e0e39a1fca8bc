//! Host element tree
//!
//! A minimal retained element model standing in for a UI toolkit's visual
//! tree. Elements carry string attributes (where binding declarations
//! live), a small set of displayable values, and change listeners.
//!
//! Values written by the binding engine go through the
//! `set_*_without_notify` family and never fire listeners. Simulated user
//! input goes through [`input_text`], [`input_checked`], [`input_number`]
//! and [`click`], which update the element and then fire its listeners
//! after the element borrow has been released.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tether_core::{Value, ValueKind};

/// Shared, mutable handle to an element
pub type ElementHandle = Rc<RefCell<VisualElement>>;

/// Attribute declaring the property bound to an element's text
pub const TEXT_PATH: &str = "binding-text-path";
/// Attribute declaring the property bound to an element's editable value
pub const VALUE_PATH: &str = "binding-value-path";
/// Attribute declaring the property bound to an element's visibility
pub const VISIBLE_PATH: &str = "binding-visible-path";
/// Attribute declaring the property bound to an element's enabled state
pub const ENABLED_PATH: &str = "binding-enabled-path";
/// Attribute naming the command a button invokes
pub const COMMAND: &str = "command";
/// Attribute selecting a converter for the text or value binding
pub const CONVERTER: &str = "converter";
/// Attribute overriding the direction of the text or value binding
pub const BINDING_MODE: &str = "binding-mode";

/// The kind of element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Groups children, displays nothing
    Container,
    /// Read-only text
    Label,
    /// Editable text
    TextField,
    /// Checkbox-style boolean
    Toggle,
    /// Numeric range input
    Slider,
    /// Clickable button with a caption
    Button,
}

impl ElementKind {
    /// Whether elements of this kind expose `target`
    #[must_use]
    pub fn hosts(self, target: ElementTarget) -> bool {
        match target {
            ElementTarget::Visible | ElementTarget::Enabled => true,
            ElementTarget::Text => matches!(self, Self::Label | Self::TextField | Self::Button),
            ElementTarget::Value => matches!(self, Self::TextField | Self::Toggle | Self::Slider),
        }
    }

    /// Kind of the values `target` holds on this element
    #[must_use]
    pub fn value_kind(self, target: ElementTarget) -> Option<ValueKind> {
        if !self.hosts(target) {
            return None;
        }
        Some(match target {
            ElementTarget::Visible | ElementTarget::Enabled => ValueKind::Bool,
            ElementTarget::Text => ValueKind::Text,
            ElementTarget::Value => match self {
                Self::Toggle => ValueKind::Bool,
                Self::Slider => ValueKind::Float,
                _ => ValueKind::Text,
            },
        })
    }

    /// Whether the user can change `target` on this element
    #[must_use]
    pub fn is_editable(self, target: ElementTarget) -> bool {
        match self {
            Self::TextField => matches!(target, ElementTarget::Text | ElementTarget::Value),
            Self::Toggle | Self::Slider => target == ElementTarget::Value,
            _ => false,
        }
    }

    /// Kind name as used in diagnostics
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Container => "Container",
            Self::Label => "Label",
            Self::TextField => "TextField",
            Self::Toggle => "Toggle",
            Self::Slider => "Slider",
            Self::Button => "Button",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A bindable facet of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementTarget {
    /// Displayed text
    Text,
    /// The user-editable value
    Value,
    /// Visibility
    Visible,
    /// Whether the element accepts input
    Enabled,
}

impl ElementTarget {
    /// All targets, in declaration order
    pub const ALL: [Self; 4] = [Self::Text, Self::Value, Self::Visible, Self::Enabled];

    /// The attribute that declares a binding to this target
    #[must_use]
    pub fn attribute(self) -> &'static str {
        match self {
            Self::Text => TEXT_PATH,
            Self::Value => VALUE_PATH,
            Self::Visible => VISIBLE_PATH,
            Self::Enabled => ENABLED_PATH,
        }
    }

    /// Look up the target declared by an attribute name
    #[must_use]
    pub fn from_attribute(attribute: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.attribute() == attribute)
    }
}

impl fmt::Display for ElementTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Value => f.write_str("value"),
            Self::Visible => f.write_str("visible"),
            Self::Enabled => f.write_str("enabled"),
        }
    }
}

/// Something that happened to an element
#[derive(Debug, Clone, PartialEq)]
pub enum ElementEvent {
    /// The user changed the element's value
    Changed(Value),
    /// The user clicked the element
    Clicked,
}

/// Identifies a listener registered on an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn(&ElementEvent)>;

/// A node in the element tree
pub struct VisualElement {
    name: String,
    kind: ElementKind,
    attributes: BTreeMap<String, String>,
    children: Vec<ElementHandle>,
    text: String,
    checked: bool,
    number: f64,
    visible: bool,
    enabled: bool,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl VisualElement {
    /// Create an element of the given kind
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            name: name.into(),
            kind,
            attributes: BTreeMap::new(),
            children: Vec::new(),
            text: String::new(),
            checked: false,
            number: 0.0,
            visible: true,
            enabled: true,
            listeners: Vec::new(),
            next_listener: 1,
        }
    }

    /// Create a container
    #[must_use]
    pub fn container(name: impl Into<String>) -> Self {
        Self::new(name, ElementKind::Container)
    }

    /// Create a label
    #[must_use]
    pub fn label(name: impl Into<String>) -> Self {
        Self::new(name, ElementKind::Label)
    }

    /// Create a text field
    #[must_use]
    pub fn text_field(name: impl Into<String>) -> Self {
        Self::new(name, ElementKind::TextField)
    }

    /// Create a toggle
    #[must_use]
    pub fn toggle(name: impl Into<String>) -> Self {
        Self::new(name, ElementKind::Toggle)
    }

    /// Create a slider
    #[must_use]
    pub fn slider(name: impl Into<String>) -> Self {
        Self::new(name, ElementKind::Slider)
    }

    /// Create a button
    #[must_use]
    pub fn button(name: impl Into<String>) -> Self {
        Self::new(name, ElementKind::Button)
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Set the initial text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Append a child
    #[must_use]
    pub fn with_child(mut self, child: ElementHandle) -> Self {
        self.children.push(child);
        self
    }

    /// Wrap into a shared handle
    #[must_use]
    pub fn into_handle(self) -> ElementHandle {
        Rc::new(RefCell::new(self))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Get an attribute value
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// All attributes, sorted by key
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set an attribute after construction
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn children(&self) -> &[ElementHandle] {
        &self.children
    }

    /// Append a child
    pub fn add_child(&mut self, child: ElementHandle) {
        self.children.push(child);
    }

    /// Whether any attribute declares a binding or a command
    #[must_use]
    pub fn is_bindable(&self) -> bool {
        self.attributes
            .keys()
            .any(|key| key.starts_with("binding-") || key == COMMAND)
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_checked(&self) -> bool {
        self.checked
    }

    #[must_use]
    pub fn number(&self) -> f64 {
        self.number
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Read the current value of `target`
    #[must_use]
    pub fn read(&self, target: ElementTarget) -> Option<Value> {
        let kind = self.kind.value_kind(target)?;
        Some(match (target, kind) {
            (ElementTarget::Visible, _) => Value::Bool(self.visible),
            (ElementTarget::Enabled, _) => Value::Bool(self.enabled),
            (_, ValueKind::Bool) => Value::Bool(self.checked),
            (_, ValueKind::Float) => Value::Float(self.number),
            _ => Value::text(self.text.clone()),
        })
    }

    /// Write `value` into `target` without firing listeners.
    ///
    /// Returns `false` when the element does not host `target` or the value
    /// has the wrong kind.
    pub fn set_value_without_notify(&mut self, target: ElementTarget, value: &Value) -> bool {
        if self.kind.value_kind(target) != Some(value.kind()) {
            return false;
        }
        match (target, value) {
            (ElementTarget::Visible, Value::Bool(b)) => self.visible = *b,
            (ElementTarget::Enabled, Value::Bool(b)) => self.enabled = *b,
            (_, Value::Bool(b)) => self.checked = *b,
            (_, Value::Float(n)) => self.number = *n,
            (_, Value::Text(s)) => s.clone_into(&mut self.text),
            _ => return false,
        }
        true
    }

    /// Replace the text without firing listeners
    pub fn set_text_without_notify(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Replace the checked state without firing listeners
    pub fn set_checked_without_notify(&mut self, checked: bool) {
        self.checked = checked;
    }

    /// Replace the numeric value without firing listeners
    pub fn set_number_without_notify(&mut self, number: f64) {
        self.number = number;
    }

    /// Show or hide the element
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Enable or disable the element
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Register a listener for user events
    pub fn add_listener(&mut self, listener: impl Fn(&ElementEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Rc::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Number of registered listeners
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn snapshot_listeners(&self) -> Vec<Listener> {
        self.listeners.iter().map(|(_, l)| Rc::clone(l)).collect()
    }
}

impl fmt::Debug for VisualElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisualElement")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("attributes", &self.attributes)
            .field("children", &self.children.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Simulate the user typing `text` into a text field
pub fn input_text(element: &ElementHandle, text: &str) -> bool {
    input(element, Value::text(text))
}

/// Simulate the user flipping a toggle
pub fn input_checked(element: &ElementHandle, checked: bool) -> bool {
    input(element, Value::Bool(checked))
}

/// Simulate the user dragging a slider
pub fn input_number(element: &ElementHandle, number: f64) -> bool {
    input(element, Value::Float(number))
}

/// Apply a user edit to the element's value and fire its listeners.
///
/// Ignored, returning `false`, when the element is disabled, not editable,
/// the value has the wrong kind, or nothing changed.
pub fn input(element: &ElementHandle, value: Value) -> bool {
    let listeners = {
        let mut el = element.borrow_mut();
        if !el.enabled || !el.kind.is_editable(ElementTarget::Value) {
            return false;
        }
        if el.read(ElementTarget::Value).as_ref() == Some(&value) {
            return false;
        }
        if !el.set_value_without_notify(ElementTarget::Value, &value) {
            return false;
        }
        el.snapshot_listeners()
    };

    let event = ElementEvent::Changed(value);
    for listener in listeners {
        listener(&event);
    }
    true
}

/// Simulate a click. Disabled elements ignore clicks.
pub fn click(element: &ElementHandle) -> bool {
    let listeners = {
        let el = element.borrow();
        if !el.enabled {
            return false;
        }
        el.snapshot_listeners()
    };

    for listener in listeners {
        listener(&ElementEvent::Clicked);
    }
    true
}

/// Collect every element under `root` (inclusive) that declares a binding,
/// in depth-first document order.
#[must_use]
pub fn query_bindable(root: &ElementHandle) -> Vec<ElementHandle> {
    let mut found = Vec::new();
    collect(root, &mut |el: &VisualElement| el.is_bindable(), &mut found);
    found
}

/// Find the first element named `name` under `root` (inclusive)
#[must_use]
pub fn find_by_name(root: &ElementHandle, name: &str) -> Option<ElementHandle> {
    let mut found = Vec::new();
    collect(root, &mut |el: &VisualElement| el.name == name, &mut found);
    found.into_iter().next()
}

fn collect(element: &ElementHandle, matches: &mut impl FnMut(&VisualElement) -> bool, found: &mut Vec<ElementHandle>) {
    let children = {
        let el = element.borrow();
        if matches(&el) {
            found.push(Rc::clone(element));
        }
        el.children.clone()
    };
    for child in &children {
        collect(child, matches, found);
    }
}
