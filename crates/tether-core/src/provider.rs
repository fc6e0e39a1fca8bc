//! Resolution of named view-model members
//!
//! The [`ObjectProvider`] turns the string names carried by binding
//! declarations into typed accessors, commands and converters. The member
//! table is built from [`ViewModel::describe`] once, when the provider is
//! created, so duplicate or inconsistent declarations surface before any
//! element is bound. [`ObjectProvider::validate`] checks a whole set of
//! binding requests up front and reports every failure at once.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::converter::{ConverterSet, ValueConverter};
use crate::error::{BindingError, BindingResult, ConversionError};
use crate::value::{Value, ValueKind};
use crate::view_model::{Command, PropertyAccessor, ViewModel, ViewModelDescriptor};

const IDENTITY: &str = "Identity";

/// A property accessor paired with the converter that applies to it
pub struct ResolvedProperty<VM> {
    accessor: PropertyAccessor<VM>,
    converter: Option<Rc<dyn ValueConverter>>,
}

impl<VM> Clone for ResolvedProperty<VM> {
    fn clone(&self) -> Self {
        Self {
            accessor: self.accessor.clone(),
            converter: self.converter.clone(),
        }
    }
}

impl<VM> ResolvedProperty<VM> {
    /// The typed accessor
    #[must_use]
    pub fn accessor(&self) -> &PropertyAccessor<VM> {
        &self.accessor
    }

    /// The converter, if values need converting
    #[must_use]
    pub fn converter(&self) -> Option<&Rc<dyn ValueConverter>> {
        self.converter.as_ref()
    }

    /// Property name
    #[must_use]
    pub fn name(&self) -> &str {
        self.accessor.name()
    }

    /// Kind of the values handed to the element
    #[must_use]
    pub fn target_kind(&self) -> ValueKind {
        self.converter
            .as_ref()
            .map_or(self.accessor.kind(), |c| c.target_kind())
    }

    /// Read the property and convert it for display
    pub fn pull(&self, view_model: &VM) -> Result<Value, ConversionError> {
        let raw = self.accessor.get(view_model);
        match &self.converter {
            Some(converter) => converter.convert_value(&raw),
            None => Ok(raw),
        }
    }

    /// Convert an element value back and write it into the view-model.
    ///
    /// Malformed input is replaced by the property's default value; the
    /// conversion error is returned alongside a successful write so the
    /// caller can report it. Only structural failures (read-only property)
    /// are errors.
    pub fn write_back(&self, view_model: &VM, element_value: &Value) -> BindingResult<Option<ConversionError>> {
        let (value, error) = match &self.converter {
            Some(converter) => {
                let back = converter.convert_value_back(element_value);
                (back.value, back.error)
            }
            None if element_value.kind() == self.accessor.kind() => (element_value.clone(), None),
            None => {
                let kind = self.accessor.kind();
                let err = ConversionError::new(IDENTITY, element_value.clone(), kind);
                (kind.default_value(), Some(err))
            }
        };
        let kind = self.accessor.kind();
        match self.accessor.set(view_model, &value) {
            // Right kind but out of range for the property's type
            Err(BindingError::TypeMismatch { actual, .. }) if actual == kind => {
                self.accessor.set(view_model, &kind.default_value())?;
                let name = self.converter.as_ref().map_or(IDENTITY, |c| c.converter_name());
                Ok(Some(
                    error.unwrap_or_else(|| ConversionError::new(name, element_value.clone(), kind)),
                ))
            }
            result => result.map(|()| error),
        }
    }
}

impl<VM> fmt::Debug for ResolvedProperty<VM> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedProperty")
            .field("name", &self.accessor.name())
            .field("kind", &self.accessor.kind())
            .field(
                "converter",
                &self.converter.as_ref().map(|c| c.converter_name().to_string()),
            )
            .finish()
    }
}

/// A member reference to check during validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingRequest {
    /// A property binding to an element value of kind `target`
    Property {
        name: String,
        target: ValueKind,
        converter: Option<String>,
        two_way: bool,
    },
    /// A command binding
    Command { name: String },
}

type ResolveKey = (String, ValueKind, Option<String>);

/// Resolves named properties and commands on a bound view-model
pub struct ObjectProvider<VM: ViewModel> {
    view_model: Rc<VM>,
    converters: ConverterSet,
    properties: HashMap<String, PropertyAccessor<VM>>,
    declared_converters: HashMap<String, Rc<dyn ValueConverter>>,
    commands: HashMap<String, Command<VM>>,
    cache: RefCell<HashMap<ResolveKey, ResolvedProperty<VM>>>,
}

impl<VM: ViewModel> ObjectProvider<VM> {
    /// Build the member table for `view_model`.
    ///
    /// Fails when a member is declared twice or a declared default
    /// converter is unknown or does not fit its property.
    pub fn new(view_model: Rc<VM>, converters: ConverterSet) -> BindingResult<Self> {
        let descriptor = ViewModelDescriptor::<VM>::of();
        let view_model_name = VM::type_name();

        let mut properties = HashMap::with_capacity(descriptor.properties.len());
        for accessor in descriptor.properties {
            let name = accessor.name().to_string();
            if properties.insert(name.clone(), accessor).is_some() {
                return Err(BindingError::DuplicateMember {
                    member: name,
                    view_model: view_model_name,
                });
            }
        }

        let mut commands = HashMap::with_capacity(descriptor.commands.len());
        for command in descriptor.commands {
            let name = command.name().to_string();
            if commands.insert(name.clone(), command).is_some() {
                return Err(BindingError::DuplicateMember {
                    member: name,
                    view_model: view_model_name,
                });
            }
        }

        let mut declared_converters = HashMap::new();
        for (property, converter_name) in descriptor.converters {
            let accessor = properties
                .get(&property)
                .ok_or_else(|| BindingError::PropertyNotFound {
                    property: property.clone(),
                    view_model: view_model_name,
                })?;
            let converter = converters
                .get(&converter_name)
                .ok_or(BindingError::ConverterNotFound(converter_name))?;
            if converter.source_kind() != accessor.kind() {
                return Err(BindingError::TypeMismatch {
                    property,
                    expected: converter.source_kind(),
                    actual: accessor.kind(),
                });
            }
            declared_converters.insert(property, converter);
        }

        tracing::debug!(
            view_model = view_model_name,
            properties = properties.len(),
            commands = commands.len(),
            "Built object provider"
        );

        Ok(Self {
            view_model,
            converters,
            properties,
            declared_converters,
            commands,
            cache: RefCell::new(HashMap::new()),
        })
    }

    /// The bound view-model
    #[must_use]
    pub fn view_model(&self) -> &Rc<VM> {
        &self.view_model
    }

    /// The converters available to bindings
    #[must_use]
    pub fn converters(&self) -> &ConverterSet {
        &self.converters
    }

    /// Resolve a property to its accessor and declared converter
    pub fn resolve(&self, name: &str) -> BindingResult<ResolvedProperty<VM>> {
        let accessor = self.accessor(name)?;
        Ok(ResolvedProperty {
            accessor: accessor.clone(),
            converter: self.declared_converters.get(name).cloned(),
        })
    }

    /// Resolve a property for an element value of kind `target`.
    ///
    /// The converter is chosen in order: the explicit `selector`, the
    /// property's declared converter, no converter when the kinds already
    /// match, then the converter set's fallback for the kind pair.
    pub fn resolve_for(&self, name: &str, target: ValueKind, selector: Option<&str>) -> BindingResult<ResolvedProperty<VM>> {
        let key = (name.to_string(), target, selector.map(str::to_string));
        if let Some(hit) = self.cache.borrow().get(&key) {
            tracing::trace!(property = name, %target, "Resolved property from cache");
            return Ok(hit.clone());
        }

        let accessor = self.accessor(name)?;
        let converter = self.select_converter(accessor, target, selector)?;
        let resolved = ResolvedProperty {
            accessor: accessor.clone(),
            converter,
        };
        self.cache.borrow_mut().insert(key, resolved.clone());
        Ok(resolved)
    }

    /// Resolve a command by name
    pub fn resolve_command(&self, name: &str) -> BindingResult<Command<VM>> {
        self.commands
            .get(name)
            .cloned()
            .ok_or_else(|| BindingError::CommandNotFound {
                command: name.to_string(),
                view_model: VM::type_name(),
            })
    }

    /// Check every request, collecting all failures
    pub fn validate<'a>(&self, requests: impl IntoIterator<Item = &'a BindingRequest>) -> Result<(), Vec<BindingError>> {
        let errors: Vec<BindingError> = requests
            .into_iter()
            .filter_map(|request| self.check(request).err())
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Names of all declared properties
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Number of cached resolutions
    #[must_use]
    pub fn cached_resolutions(&self) -> usize {
        self.cache.borrow().len()
    }

    fn accessor(&self, name: &str) -> BindingResult<&PropertyAccessor<VM>> {
        self.properties
            .get(name)
            .ok_or_else(|| BindingError::PropertyNotFound {
                property: name.to_string(),
                view_model: VM::type_name(),
            })
    }

    fn select_converter(
        &self,
        accessor: &PropertyAccessor<VM>,
        target: ValueKind,
        selector: Option<&str>,
    ) -> BindingResult<Option<Rc<dyn ValueConverter>>> {
        let source = accessor.kind();
        let mismatch = |expected, actual| BindingError::TypeMismatch {
            property: accessor.name().to_string(),
            expected,
            actual,
        };

        if let Some(selector) = selector {
            let converter = self
                .converters
                .get(selector)
                .ok_or_else(|| BindingError::ConverterNotFound(selector.to_string()))?;
            if converter.source_kind() != source {
                return Err(mismatch(converter.source_kind(), source));
            }
            if converter.target_kind() != target {
                return Err(mismatch(target, converter.target_kind()));
            }
            return Ok(Some(converter));
        }

        if let Some(declared) = self.declared_converters.get(accessor.name()) {
            if declared.target_kind() == target {
                return Ok(Some(Rc::clone(declared)));
            }
        }

        if source == target {
            return Ok(None);
        }

        self.converters
            .default_for(source, target)
            .map(Some)
            .ok_or_else(|| mismatch(target, source))
    }

    fn check(&self, request: &BindingRequest) -> BindingResult<()> {
        match request {
            BindingRequest::Property {
                name,
                target,
                converter,
                two_way,
            } => {
                let resolved = self.resolve_for(name, *target, converter.as_deref())?;
                if *two_way && resolved.accessor().is_read_only() {
                    return Err(BindingError::ReadOnlyProperty(name.clone()));
                }
                Ok(())
            }
            BindingRequest::Command { name } => self.resolve_command(name).map(|_| ()),
        }
    }
}

impl<VM: ViewModel> fmt::Debug for ObjectProvider<VM> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectProvider")
            .field("view_model", &VM::type_name())
            .field("properties", &self.properties.len())
            .field("commands", &self.commands.len())
            .field("converters", &self.converters)
            .finish()
    }
}
