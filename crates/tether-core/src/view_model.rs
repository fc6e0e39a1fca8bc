//! The view-model contract
//!
//! A view-model exposes a [`PropertyNotifier`] and declares its bindable
//! members once, through [`ViewModel::describe`]. Declarations are typed:
//! getters and setters are ordinary closures over the view-model's own
//! fields. The descriptor erases them into string-keyed accessors that the
//! object provider validates when it is built.
//!
//! ```ignore
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
//!         members
//!             .property("Count", |vm| vm.count.get(), |vm, v| vm.set_count(v))
//!             .command("Increment", |vm| vm.set_count(vm.count.get() + 1));
//!     }
//! }
//! ```

use std::fmt;
use std::rc::Rc;

use crate::error::{BindingError, BindingResult};
use crate::notify::{PropertyNotifier, Subscription};
use crate::value::{BindableValue, Value, ValueKind};

/// An observable object that UI elements can bind to
pub trait ViewModel: 'static {
    /// The change stream of this view-model
    fn notifier(&self) -> &PropertyNotifier;

    /// Declare the bindable properties and commands
    fn describe(members: &mut ViewModelDescriptor<Self>)
    where
        Self: Sized;

    /// Subscribe to property changes
    fn subscribe(&self, handler: impl Fn(&str) + 'static) -> Subscription
    where
        Self: Sized,
    {
        self.notifier().subscribe(handler)
    }

    /// Short type name used in diagnostics
    fn type_name() -> &'static str
    where
        Self: Sized,
    {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }
}

type Getter<VM> = Rc<dyn Fn(&VM) -> Value>;
type Setter<VM> = Rc<dyn Fn(&VM, &Value) -> bool>;

/// Typed get/set access to one named property, erased over [`Value`]
pub struct PropertyAccessor<VM> {
    name: Rc<str>,
    kind: ValueKind,
    getter: Getter<VM>,
    setter: Option<Setter<VM>>,
}

impl<VM> Clone for PropertyAccessor<VM> {
    fn clone(&self) -> Self {
        Self {
            name: Rc::clone(&self.name),
            kind: self.kind,
            getter: Rc::clone(&self.getter),
            setter: self.setter.clone(),
        }
    }
}

impl<VM> PropertyAccessor<VM> {
    /// Property name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared value kind
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Whether the property has no setter
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.setter.is_none()
    }

    /// Read the current value
    pub fn get(&self, view_model: &VM) -> Value {
        (self.getter)(view_model)
    }

    /// Write a value of the declared kind
    pub fn set(&self, view_model: &VM, value: &Value) -> BindingResult<()> {
        let setter = self
            .setter
            .as_ref()
            .ok_or_else(|| BindingError::ReadOnlyProperty(self.name.to_string()))?;
        if setter(view_model, value) {
            Ok(())
        } else {
            Err(BindingError::TypeMismatch {
                property: self.name.to_string(),
                expected: self.kind,
                actual: value.kind(),
            })
        }
    }
}

impl<VM> fmt::Debug for PropertyAccessor<VM> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyAccessor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("read_only", &self.is_read_only())
            .finish()
    }
}

/// A view-model action that UI elements can trigger
pub struct Command<VM> {
    name: Rc<str>,
    execute: Rc<dyn Fn(&VM)>,
    can_execute: Option<Rc<dyn Fn(&VM) -> bool>>,
}

impl<VM> Clone for Command<VM> {
    fn clone(&self) -> Self {
        Self {
            name: Rc::clone(&self.name),
            execute: Rc::clone(&self.execute),
            can_execute: self.can_execute.clone(),
        }
    }
}

impl<VM> Command<VM> {
    /// Command name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the command may run right now
    pub fn can_execute(&self, view_model: &VM) -> bool {
        self.can_execute.as_ref().map_or(true, |can| can(view_model))
    }

    /// Run the command if allowed. Returns whether it ran.
    pub fn execute(&self, view_model: &VM) -> bool {
        if !self.can_execute(view_model) {
            tracing::trace!(command = %self.name, "Command not executable");
            return false;
        }
        (self.execute)(view_model);
        true
    }
}

impl<VM> fmt::Debug for Command<VM> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("guarded", &self.can_execute.is_some())
            .finish()
    }
}

/// Collects the member declarations of a view-model
pub struct ViewModelDescriptor<VM> {
    pub(crate) properties: Vec<PropertyAccessor<VM>>,
    pub(crate) commands: Vec<Command<VM>>,
    pub(crate) converters: Vec<(String, String)>,
}

impl<VM: ViewModel> ViewModelDescriptor<VM> {
    /// Run `VM::describe` and collect its declarations
    #[must_use]
    pub fn of() -> Self {
        let mut descriptor = Self {
            properties: Vec::new(),
            commands: Vec::new(),
            converters: Vec::new(),
        };
        VM::describe(&mut descriptor);
        descriptor
    }
}

impl<VM: 'static> ViewModelDescriptor<VM> {
    /// Declare a read-write property
    pub fn property<T: BindableValue>(
        &mut self,
        name: &str,
        get: impl Fn(&VM) -> T + 'static,
        set: impl Fn(&VM, T) + 'static,
    ) -> &mut Self {
        let setter: Setter<VM> = Rc::new(move |vm, value| match T::from_value(value) {
            Some(v) => {
                set(vm, v);
                true
            }
            None => false,
        });
        self.push_property::<T>(name, get, Some(setter))
    }

    /// Declare a property without a setter
    pub fn read_only<T: BindableValue>(&mut self, name: &str, get: impl Fn(&VM) -> T + 'static) -> &mut Self {
        self.push_property::<T>(name, get, None)
    }

    /// Declare the converter used for `property` when a binding selects none
    pub fn default_converter(&mut self, property: &str, converter: &str) -> &mut Self {
        self.converters
            .push((property.to_string(), converter.to_string()));
        self
    }

    /// Declare a command
    pub fn command(&mut self, name: &str, execute: impl Fn(&VM) + 'static) -> &mut Self {
        self.commands.push(Command {
            name: Rc::from(name),
            execute: Rc::new(execute),
            can_execute: None,
        });
        self
    }

    /// Declare a command guarded by a predicate
    pub fn command_when(
        &mut self,
        name: &str,
        execute: impl Fn(&VM) + 'static,
        can_execute: impl Fn(&VM) -> bool + 'static,
    ) -> &mut Self {
        self.commands.push(Command {
            name: Rc::from(name),
            execute: Rc::new(execute),
            can_execute: Some(Rc::new(can_execute)),
        });
        self
    }

    fn push_property<T: BindableValue>(
        &mut self,
        name: &str,
        get: impl Fn(&VM) -> T + 'static,
        setter: Option<Setter<VM>>,
    ) -> &mut Self {
        self.properties.push(PropertyAccessor {
            name: Rc::from(name),
            kind: T::KIND,
            getter: Rc::new(move |vm| get(vm).into_value()),
            setter,
        });
        self
    }

    /// Declared property names, in declaration order
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(PropertyAccessor::name)
    }

    /// Declared command names, in declaration order
    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(Command::name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ObservableValue;

    struct Profile {
        notifier: PropertyNotifier,
        name: ObservableValue<String>,
        age: ObservableValue<i64>,
    }

    impl Profile {
        fn new() -> Self {
            Self {
                notifier: PropertyNotifier::new(),
                name: ObservableValue::new("Ada".to_string()),
                age: ObservableValue::new(36),
            }
        }
    }

    impl ViewModel for Profile {
        fn notifier(&self) -> &PropertyNotifier {
            &self.notifier
        }

        fn describe(members: &mut ViewModelDescriptor<Self>) {
            members
                .property(
                    "Name",
                    |vm: &Profile| vm.name.get(),
                    |vm: &Profile, v| {
                        vm.notifier.set_property(&vm.name, "Name", v);
                    },
                )
                .read_only("Age", |vm: &Profile| vm.age.get())
                .command("Birthday", |vm: &Profile| {
                    let next = vm.age.get() + 1;
                    vm.notifier.set_property(&vm.age, "Age", next);
                })
                .command_when("Rename", |_: &Profile| {}, |vm: &Profile| vm.age.get() > 40);
        }
    }

    #[test]
    fn test_descriptor_collects_members() {
        let descriptor = ViewModelDescriptor::<Profile>::of();
        assert_eq!(descriptor.property_names().collect::<Vec<_>>(), vec!["Name", "Age"]);
        assert_eq!(
            descriptor.command_names().collect::<Vec<_>>(),
            vec!["Birthday", "Rename"]
        );
    }

    #[test]
    fn test_accessor_get_and_set() {
        let vm = Profile::new();
        let descriptor = ViewModelDescriptor::<Profile>::of();
        let name = &descriptor.properties[0];

        assert_eq!(name.kind(), ValueKind::Text);
        assert_eq!(name.get(&vm), Value::text("Ada"));

        name.set(&vm, &Value::text("Grace")).unwrap();
        assert_eq!(vm.name.get(), "Grace");
    }

    #[test]
    fn test_accessor_rejects_wrong_kind() {
        let vm = Profile::new();
        let descriptor = ViewModelDescriptor::<Profile>::of();
        let err = descriptor.properties[0].set(&vm, &Value::Int(1)).unwrap_err();
        assert!(matches!(
            err,
            BindingError::TypeMismatch {
                expected: ValueKind::Text,
                actual: ValueKind::Int,
                ..
            }
        ));
    }

    #[test]
    fn test_read_only_accessor() {
        let vm = Profile::new();
        let descriptor = ViewModelDescriptor::<Profile>::of();
        let age = &descriptor.properties[1];
        assert!(age.is_read_only());
        assert_eq!(
            age.set(&vm, &Value::Int(1)),
            Err(BindingError::ReadOnlyProperty("Age".to_string()))
        );
    }

    #[test]
    fn test_command_guard() {
        let vm = Profile::new();
        let descriptor = ViewModelDescriptor::<Profile>::of();

        assert!(descriptor.commands[0].execute(&vm));
        assert_eq!(vm.age.get(), 37);

        assert!(!descriptor.commands[1].can_execute(&vm));
        assert!(!descriptor.commands[1].execute(&vm));
    }

    #[test]
    fn test_subscribe_through_trait() {
        let vm = Profile::new();
        let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = vm.subscribe(move |name| s.borrow_mut().push(name.to_string()));

        vm.notifier.set_property(&vm.name, "Name", "Linus".to_string());
        assert_eq!(*seen.borrow(), vec!["Name"]);
    }

    #[test]
    fn test_type_name_is_short() {
        assert_eq!(Profile::type_name(), "Profile");
    }
}
