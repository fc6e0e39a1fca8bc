//! Integration tests for resolving and driving a view-model by name

use std::cell::RefCell;
use std::rc::Rc;

use tether_core::{
    BindingError, BindingRequest, ConverterSet, ObjectProvider, ObservableValue, PropertyNotifier, Value,
    ValueKind, ViewModel, ViewModelDescriptor,
};

struct Thermostat {
    notifier: PropertyNotifier,
    target: ObservableValue<i64>,
    heating: ObservableValue<bool>,
    humidity: ObservableValue<f64>,
}

impl Thermostat {
    fn shared() -> Rc<Self> {
        Rc::new(Self {
            notifier: PropertyNotifier::new(),
            target: ObservableValue::new(20),
            heating: ObservableValue::new(false),
            humidity: ObservableValue::new(0.4),
        })
    }
}

impl ViewModel for Thermostat {
    fn notifier(&self) -> &PropertyNotifier {
        &self.notifier
    }

    fn describe(members: &mut ViewModelDescriptor<Self>) {
        members
            .property(
                "Target",
                |vm: &Thermostat| vm.target.get(),
                |vm: &Thermostat, v| {
                    vm.notifier.set_property(&vm.target, "Target", v);
                },
            )
            .property(
                "Heating",
                |vm: &Thermostat| vm.heating.get(),
                |vm: &Thermostat, v| {
                    vm.notifier.set_property(&vm.heating, "Heating", v);
                },
            )
            .read_only("Humidity", |vm: &Thermostat| vm.humidity.get())
            .command_when(
                "Boost",
                |vm: &Thermostat| {
                    let next = vm.target.get() + 2;
                    vm.notifier.set_property(&vm.target, "Target", next);
                },
                |vm: &Thermostat| !vm.heating.get(),
            );
    }
}

fn provider() -> ObjectProvider<Thermostat> {
    ObjectProvider::new(Thermostat::shared(), ConverterSet::standard()).unwrap()
}

#[test]
fn test_write_back_notifies_once_per_change() {
    let provider = provider();
    let vm = Rc::clone(provider.view_model());
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);
    let _subscription = vm.subscribe(move |name| log.borrow_mut().push(name.to_string()));

    let target = provider.resolve_for("Target", ValueKind::Text, None).unwrap();
    target.write_back(&vm, &Value::text("23")).unwrap();
    target.write_back(&vm, &Value::text(" 23 ")).unwrap();

    assert_eq!(vm.target.get(), 23);
    assert_eq!(*seen.borrow(), vec!["Target".to_string()]);
}

#[test]
fn test_text_binding_to_bool_property() {
    let provider = provider();
    let vm = Rc::clone(provider.view_model());
    let heating = provider.resolve_for("Heating", ValueKind::Text, None).unwrap();

    assert_eq!(heating.pull(&vm), Ok(Value::text("false")));
    assert_eq!(heating.write_back(&vm, &Value::text("TRUE")), Ok(None));
    assert!(vm.heating.get());

    let error = heating.write_back(&vm, &Value::text("maybe")).unwrap();
    assert_eq!(error.map(|e| e.converter), Some("BoolToStr".to_string()));
    assert!(!vm.heating.get());
}

#[test]
fn test_slider_binding_to_int_property() {
    let provider = provider();
    let vm = Rc::clone(provider.view_model());
    let target = provider
        .resolve_for("Target", ValueKind::Float, None)
        .unwrap();

    assert_eq!(target.pull(&vm), Ok(Value::Float(20.0)));
    target.write_back(&vm, &Value::Float(21.6)).unwrap();
    assert_eq!(vm.target.get(), 22);
}

#[test]
fn test_guarded_command() {
    let provider = provider();
    let vm = Rc::clone(provider.view_model());
    let boost = provider.resolve_command("Boost").unwrap();

    assert!(boost.execute(&vm));
    assert_eq!(vm.target.get(), 22);

    vm.heating.set_silently(true);
    assert!(!boost.can_execute(&vm));
    assert!(!boost.execute(&vm));
    assert_eq!(vm.target.get(), 22);
}

#[test]
fn test_validate_whole_view() {
    let provider = provider();
    let requests = [
        BindingRequest::Property {
            name: "Humidity".to_string(),
            target: ValueKind::Text,
            converter: Some("IntToStr".to_string()),
            two_way: false,
        },
        BindingRequest::Property {
            name: "Humidity".to_string(),
            target: ValueKind::Float,
            converter: None,
            two_way: true,
        },
        BindingRequest::Command {
            name: "Boost".to_string(),
        },
    ];

    let errors = provider.validate(&requests).unwrap_err();
    assert_eq!(
        errors,
        vec![
            BindingError::TypeMismatch {
                property: "Humidity".to_string(),
                expected: ValueKind::Int,
                actual: ValueKind::Float,
            },
            BindingError::ReadOnlyProperty("Humidity".to_string()),
        ]
    );
}
