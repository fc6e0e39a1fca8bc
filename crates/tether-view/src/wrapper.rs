//! Turning declared elements into adapters
//!
//! Binding declarations live in element attributes:
//!
//! | attribute              | binds                       |
//! |------------------------|-----------------------------|
//! | `binding-text-path`    | displayed text              |
//! | `binding-value-path`   | the user-editable value     |
//! | `binding-visible-path` | visibility (bool)           |
//! | `binding-enabled-path` | enabled state (bool)        |
//! | `command`              | command invoked on click    |
//! | `converter`            | converter for text or value |
//! | `binding-mode`         | `one-way` or `two-way`      |
//!
//! Text and value bindings on editable elements default to two-way; all
//! other bindings are one-way.

use std::rc::Rc;

use tether_core::{BindingError, BindingRequest, ObjectProvider, ValueKind, ViewModel};

use crate::adapter::{BindingAdapter, BindingDirection, PropertySlot};
use crate::element::{
    ElementHandle, ElementKind, ElementTarget, VisualElement, BINDING_MODE, COMMAND, CONVERTER,
};
use crate::error::{ViewError, ViewResult};

/// Builds adapters from elements
pub trait ElementWrapper<VM: ViewModel> {
    /// The member references `element` declares, for up-front validation
    fn requests(&self, element: &VisualElement) -> ViewResult<Vec<BindingRequest>>;

    /// Resolve the element's declarations against `provider`
    fn wrap(&self, element: &ElementHandle, provider: &ObjectProvider<VM>) -> ViewResult<BindingAdapter<VM>>;
}

/// One declared property binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingDeclaration {
    pub target: ElementTarget,
    /// Kind of the values the element holds at `target`
    pub kind: ValueKind,
    pub property: String,
    pub converter: Option<String>,
    pub direction: BindingDirection,
}

/// Everything an element declares
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementBindings {
    /// Property bindings, ordered by target
    pub properties: Vec<BindingDeclaration>,
    pub command: Option<String>,
}

impl ElementBindings {
    /// Read the binding attributes of `element`
    pub fn parse(element: &VisualElement) -> ViewResult<Self> {
        let name = element.name();
        let kind = element.kind();

        let mode = match element.attribute(BINDING_MODE) {
            None => None,
            Some("one-way") => Some(BindingDirection::OneWay),
            Some("two-way") => Some(BindingDirection::TwoWay),
            Some(other) => {
                return Err(ViewError::unsupported(name, format!("unknown binding mode '{other}'")));
            }
        };

        let mut properties = Vec::new();
        for (key, path) in element.attributes() {
            if key == BINDING_MODE || !key.starts_with("binding-") {
                continue;
            }
            let target = ElementTarget::from_attribute(key)
                .ok_or_else(|| ViewError::unsupported(name, format!("unknown binding attribute '{key}'")))?;
            let value_kind = kind
                .value_kind(target)
                .ok_or_else(|| ViewError::unsupported(name, format!("{kind} has no {target} to bind")))?;
            let property = path.trim();
            if property.is_empty() {
                return Err(ViewError::unsupported(name, format!("'{key}' names no property")));
            }

            let primary = matches!(target, ElementTarget::Text | ElementTarget::Value);
            let direction = match mode {
                Some(mode) if primary => mode,
                _ if primary && kind.is_editable(target) => BindingDirection::TwoWay,
                _ => BindingDirection::OneWay,
            };
            if direction.is_two_way() && !kind.is_editable(target) {
                return Err(ViewError::unsupported(name, format!("{target} of a {kind} cannot be two-way")));
            }

            properties.push(BindingDeclaration {
                target,
                kind: value_kind,
                property: property.to_string(),
                converter: if primary {
                    element.attribute(CONVERTER).map(str::to_string)
                } else {
                    None
                },
                direction,
            });
        }
        properties.sort_by_key(|d| d.target);

        let primaries = properties
            .iter()
            .filter(|d| matches!(d.target, ElementTarget::Text | ElementTarget::Value))
            .count();
        if primaries > 1 {
            return Err(ViewError::unsupported(name, "declares both text and value bindings"));
        }
        if primaries == 0 && element.attribute(CONVERTER).is_some() {
            return Err(ViewError::unsupported(name, "converter without a text or value binding"));
        }

        let command = match element.attribute(COMMAND).map(str::trim) {
            None => None,
            Some("") => return Err(ViewError::unsupported(name, "'command' names no command")),
            Some(_) if kind != ElementKind::Button => {
                return Err(ViewError::unsupported(name, format!("a {kind} cannot invoke commands")));
            }
            Some(command) => Some(command.to_string()),
        };

        Ok(Self { properties, command })
    }

    /// The member references to validate
    #[must_use]
    pub fn requests(&self) -> Vec<BindingRequest> {
        let mut requests: Vec<BindingRequest> = self
            .properties
            .iter()
            .map(|d| BindingRequest::Property {
                name: d.property.clone(),
                target: d.kind,
                converter: d.converter.clone(),
                two_way: d.direction.is_two_way(),
            })
            .collect();
        if let Some(command) = &self.command {
            requests.push(BindingRequest::Command { name: command.clone() });
        }
        requests
    }

    /// Whether nothing is declared
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.command.is_none()
    }
}

/// Attribute-driven wrapper for the built-in element kinds
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultElementWrapper;

impl<VM: ViewModel> ElementWrapper<VM> for DefaultElementWrapper {
    fn requests(&self, element: &VisualElement) -> ViewResult<Vec<BindingRequest>> {
        Ok(ElementBindings::parse(element)?.requests())
    }

    fn wrap(&self, element: &ElementHandle, provider: &ObjectProvider<VM>) -> ViewResult<BindingAdapter<VM>> {
        let bindings = ElementBindings::parse(&element.borrow())?;

        let mut slots = Vec::with_capacity(bindings.properties.len());
        for declaration in &bindings.properties {
            let property = provider.resolve_for(
                &declaration.property,
                declaration.kind,
                declaration.converter.as_deref(),
            )?;
            if declaration.direction.is_two_way() && property.accessor().is_read_only() {
                return Err(BindingError::ReadOnlyProperty(declaration.property.clone()).into());
            }
            slots.push(PropertySlot::new(declaration.target, declaration.direction, property));
        }

        let command = bindings
            .command
            .as_deref()
            .map(|name| provider.resolve_command(name))
            .transpose()?;

        Ok(BindingAdapter::new(
            Rc::clone(element),
            Rc::clone(provider.view_model()),
            slots,
            command,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::AdapterKind;
    use crate::element::{ENABLED_PATH, TEXT_PATH, VALUE_PATH, VISIBLE_PATH};
    use tether_core::{ConverterSet, ObservableValue, PropertyNotifier, ViewModelDescriptor};

    struct Account {
        notifier: PropertyNotifier,
        balance: ObservableValue<i64>,
        owner: ObservableValue<String>,
        active: ObservableValue<bool>,
    }

    impl ViewModel for Account {
        fn notifier(&self) -> &PropertyNotifier {
            &self.notifier
        }

        fn describe(members: &mut ViewModelDescriptor<Self>) {
            members
                .property(
                    "Balance",
                    |vm: &Account| vm.balance.get(),
                    |vm: &Account, v| {
                        vm.notifier.set_property(&vm.balance, "Balance", v);
                    },
                )
                .read_only("Owner", |vm: &Account| vm.owner.get())
                .read_only("Active", |vm: &Account| vm.active.get())
                .command("Close", |vm: &Account| {
                    vm.notifier.set_property(&vm.active, "Active", false);
                });
        }
    }

    fn provider() -> ObjectProvider<Account> {
        let vm = Rc::new(Account {
            notifier: PropertyNotifier::new(),
            balance: ObservableValue::new(100),
            owner: ObservableValue::new("ada".to_string()),
            active: ObservableValue::new(true),
        });
        ObjectProvider::new(vm, ConverterSet::standard()).unwrap()
    }

    fn unsupported(element: VisualElement) -> String {
        match ElementBindings::parse(&element) {
            Err(ViewError::UnsupportedElement { reason, .. }) => reason,
            other => panic!("expected unsupported element, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_defaults_direction_by_editability() {
        let field = VisualElement::text_field("f")
            .with_attribute(VALUE_PATH, "Balance")
            .with_attribute(VISIBLE_PATH, "Active");
        let bindings = ElementBindings::parse(&field).unwrap();
        assert_eq!(bindings.properties.len(), 2);
        assert_eq!(bindings.properties[0].target, ElementTarget::Value);
        assert_eq!(bindings.properties[0].direction, BindingDirection::TwoWay);
        assert_eq!(bindings.properties[1].target, ElementTarget::Visible);
        assert_eq!(bindings.properties[1].direction, BindingDirection::OneWay);

        let label = VisualElement::label("l").with_attribute(TEXT_PATH, "Owner");
        let bindings = ElementBindings::parse(&label).unwrap();
        assert_eq!(bindings.properties[0].direction, BindingDirection::OneWay);
    }

    #[test]
    fn test_parse_mode_and_converter() {
        let field = VisualElement::text_field("f")
            .with_attribute(TEXT_PATH, " Balance ")
            .with_attribute(BINDING_MODE, "one-way")
            .with_attribute(CONVERTER, "IntToStr");
        let bindings = ElementBindings::parse(&field).unwrap();
        let declaration = &bindings.properties[0];
        assert_eq!(declaration.property, "Balance");
        assert_eq!(declaration.direction, BindingDirection::OneWay);
        assert_eq!(declaration.converter.as_deref(), Some("IntToStr"));
    }

    #[test]
    fn test_parse_rejects_unsupported_declarations() {
        assert_eq!(
            unsupported(VisualElement::label("l").with_attribute(VALUE_PATH, "Balance")),
            "Label has no value to bind"
        );
        assert_eq!(
            unsupported(VisualElement::label("l").with_attribute("binding-color-path", "Balance")),
            "unknown binding attribute 'binding-color-path'"
        );
        assert_eq!(
            unsupported(
                VisualElement::label("l")
                    .with_attribute(TEXT_PATH, "Owner")
                    .with_attribute(BINDING_MODE, "two-way")
            ),
            "text of a Label cannot be two-way"
        );
        assert_eq!(
            unsupported(VisualElement::label("l").with_attribute(COMMAND, "Close")),
            "a Label cannot invoke commands"
        );
        assert_eq!(
            unsupported(VisualElement::container("c").with_attribute(BINDING_MODE, "sideways")),
            "unknown binding mode 'sideways'"
        );
        assert_eq!(
            unsupported(
                VisualElement::text_field("f")
                    .with_attribute(TEXT_PATH, "Owner")
                    .with_attribute(VALUE_PATH, "Owner")
            ),
            "declares both text and value bindings"
        );
        assert_eq!(
            unsupported(VisualElement::container("c").with_attribute(CONVERTER, "IntToStr")),
            "converter without a text or value binding"
        );
        assert_eq!(
            unsupported(VisualElement::label("l").with_attribute(TEXT_PATH, "  ")),
            "'binding-text-path' names no property"
        );
    }

    #[test]
    fn test_requests_include_command() {
        let button = VisualElement::button("b")
            .with_attribute(COMMAND, "Close")
            .with_attribute(ENABLED_PATH, "Active");
        let requests = ElementBindings::parse(&button).unwrap().requests();
        assert_eq!(
            requests,
            vec![
                BindingRequest::Property {
                    name: "Active".to_string(),
                    target: ValueKind::Bool,
                    converter: None,
                    two_way: false,
                },
                BindingRequest::Command {
                    name: "Close".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_wrap_resolves_slots() {
        let provider = provider();
        let field = VisualElement::text_field("balance")
            .with_attribute(VALUE_PATH, "Balance")
            .into_handle();
        let adapter = DefaultElementWrapper.wrap(&field, &provider).unwrap();
        assert_eq!(adapter.kind(), AdapterKind::TextField);
        assert_eq!(adapter.slots().len(), 1);
        assert_eq!(
            adapter.slots()[0]
                .property()
                .converter()
                .map(|c| c.converter_name().to_string()),
            Some("IntToStr".to_string())
        );
    }

    #[test]
    fn test_wrap_two_way_read_only_fails() {
        let provider = provider();
        let field = VisualElement::text_field("owner")
            .with_attribute(TEXT_PATH, "Owner")
            .into_handle();
        let err = DefaultElementWrapper.wrap(&field, &provider).unwrap_err();
        assert_eq!(
            err,
            ViewError::Binding(BindingError::ReadOnlyProperty("Owner".to_string()))
        );

        let one_way = VisualElement::text_field("owner")
            .with_attribute(TEXT_PATH, "Owner")
            .with_attribute(BINDING_MODE, "one-way")
            .into_handle();
        assert!(DefaultElementWrapper.wrap(&one_way, &provider).is_ok());
    }

    #[test]
    fn test_wrap_unknown_members() {
        let provider = provider();
        let label = VisualElement::label("l")
            .with_attribute(TEXT_PATH, "Missing")
            .into_handle();
        assert!(matches!(
            DefaultElementWrapper.wrap(&label, &provider),
            Err(ViewError::Binding(BindingError::PropertyNotFound { .. }))
        ));

        let button = VisualElement::button("b")
            .with_attribute(COMMAND, "Open")
            .into_handle();
        assert!(matches!(
            DefaultElementWrapper.wrap(&button, &provider),
            Err(ViewError::Binding(BindingError::CommandNotFound { .. }))
        ));
    }

    #[test]
    fn test_wrap_passive_container() {
        let provider = provider();
        let panel = VisualElement::container("panel")
            .with_attribute(VISIBLE_PATH, "Active")
            .into_handle();
        let adapter = DefaultElementWrapper.wrap(&panel, &provider).unwrap();
        assert_eq!(adapter.kind(), AdapterKind::Passive);
        assert_eq!(adapter.bound_properties(), vec!["Active"]);
    }
}
