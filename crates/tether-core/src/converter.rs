//! Value converters between view-model types and UI-representable types
//!
//! A converter is a stateless pair of pure functions. `convert` maps a
//! view-model value to what an element displays; `convert_back` maps an
//! edited element value back into the view-model. Malformed input on the
//! way back never fails: it produces the source type's default value, so a
//! half-typed number in a text field does not break the UI.
//!
//! Converters are written against [`PropertyValueConverter`] with concrete
//! types and used by the engine through the erased [`ValueConverter`].

use std::fmt;
use std::rc::Rc;

use crate::error::ConversionError;
use crate::value::{BindableValue, Value, ValueKind};

/// A typed, bidirectional value converter
pub trait PropertyValueConverter: 'static {
    /// View-model side type
    type Source: BindableValue;
    /// Element side type
    type Target: BindableValue;

    /// Name used to select this converter from a binding declaration
    fn name(&self) -> &str;

    /// Convert a view-model value for display
    fn convert(&self, value: Self::Source) -> Self::Target;

    /// Convert an element value back, reporting malformed input
    fn try_convert_back(&self, value: Self::Target) -> Result<Self::Source, ConversionError>;

    /// Convert an element value back, falling back to the default on malformed input
    fn convert_back(&self, value: Self::Target) -> Self::Source {
        self.try_convert_back(value).unwrap_or_default()
    }
}

/// Result of an erased back-conversion.
///
/// `value` is always usable; `error` is set when it is a fallback default.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedBack {
    pub value: Value,
    pub error: Option<ConversionError>,
}

impl ConvertedBack {
    fn ok(value: Value) -> Self {
        Self { value, error: None }
    }

    fn fallback(value: Value, error: ConversionError) -> Self {
        Self {
            value,
            error: Some(error),
        }
    }
}

/// Object-safe converter over dynamic [`Value`]s.
///
/// Every [`PropertyValueConverter`] implements this automatically.
pub trait ValueConverter {
    /// Converter name
    fn converter_name(&self) -> &str;

    /// Kind of the view-model side
    fn source_kind(&self) -> ValueKind;

    /// Kind of the element side
    fn target_kind(&self) -> ValueKind;

    /// Convert a view-model value for display.
    ///
    /// Fails only when `value` is not of the source kind.
    fn convert_value(&self, value: &Value) -> Result<Value, ConversionError>;

    /// Convert an element value back into the view-model kind
    fn convert_value_back(&self, value: &Value) -> ConvertedBack;
}

impl<C: PropertyValueConverter> ValueConverter for C {
    fn converter_name(&self) -> &str {
        self.name()
    }

    fn source_kind(&self) -> ValueKind {
        C::Source::KIND
    }

    fn target_kind(&self) -> ValueKind {
        C::Target::KIND
    }

    fn convert_value(&self, value: &Value) -> Result<Value, ConversionError> {
        let source = C::Source::from_value(value)
            .ok_or_else(|| ConversionError::new(self.name(), value.clone(), C::Target::KIND))?;
        Ok(self.convert(source).into_value())
    }

    fn convert_value_back(&self, value: &Value) -> ConvertedBack {
        let fallback = || C::Source::default().into_value();
        let Some(target) = C::Target::from_value(value) else {
            let err = ConversionError::new(self.name(), value.clone(), C::Source::KIND);
            return ConvertedBack::fallback(fallback(), err);
        };
        match self.try_convert_back(target) {
            Ok(source) => ConvertedBack::ok(source.into_value()),
            Err(err) => ConvertedBack::fallback(fallback(), err),
        }
    }
}

/// Integer to text
#[derive(Debug, Clone, Copy, Default)]
pub struct IntToStrConverter;

impl PropertyValueConverter for IntToStrConverter {
    type Source = i64;
    type Target = String;

    fn name(&self) -> &str {
        "IntToStr"
    }

    fn convert(&self, value: i64) -> String {
        value.to_string()
    }

    fn try_convert_back(&self, value: String) -> Result<i64, ConversionError> {
        value
            .trim()
            .parse()
            .map_err(|_| ConversionError::new(self.name(), Value::Text(value), ValueKind::Int))
    }
}

/// Float to text.
///
/// Formats with the shortest representation that parses back to the same
/// `f32`, so non-lossy round trips are exact.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatToStrConverter;

impl PropertyValueConverter for FloatToStrConverter {
    type Source = f32;
    type Target = String;

    fn name(&self) -> &str {
        "FloatToStr"
    }

    fn convert(&self, value: f32) -> String {
        value.to_string()
    }

    fn try_convert_back(&self, value: String) -> Result<f32, ConversionError> {
        value
            .trim()
            .parse()
            .map_err(|_| ConversionError::new(self.name(), Value::Text(value), ValueKind::Float))
    }
}

/// Boolean to text (`true` / `false`, parsed case-insensitively)
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolToStrConverter;

impl PropertyValueConverter for BoolToStrConverter {
    type Source = bool;
    type Target = String;

    fn name(&self) -> &str {
        "BoolToStr"
    }

    fn convert(&self, value: bool) -> String {
        value.to_string()
    }

    fn try_convert_back(&self, value: String) -> Result<bool, ConversionError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(ConversionError::new(
                self.name(),
                Value::Text(value),
                ValueKind::Bool,
            )),
        }
    }
}

/// Integer to float, for sliders bound to integer properties.
///
/// Back-conversion rounds to the nearest integer, saturating at the
/// `i64` range.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntToFloatConverter;

impl PropertyValueConverter for IntToFloatConverter {
    type Source = i64;
    type Target = f64;

    fn name(&self) -> &str {
        "IntToFloat"
    }

    #[allow(clippy::cast_precision_loss)]
    fn convert(&self, value: i64) -> f64 {
        value as f64
    }

    #[allow(clippy::cast_possible_truncation)]
    fn try_convert_back(&self, value: f64) -> Result<i64, ConversionError> {
        if value.is_nan() {
            return Err(ConversionError::new(
                self.name(),
                Value::Float(value),
                ValueKind::Int,
            ));
        }
        Ok(value.round() as i64)
    }
}

/// A named collection of converters available to a view.
///
/// Bindings select a converter explicitly by name; when they don't, the
/// first registered converter for the needed kind pair is the fallback.
#[derive(Clone, Default)]
pub struct ConverterSet {
    converters: Vec<Rc<dyn ValueConverter>>,
}

impl ConverterSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A set holding the built-in converters
    #[must_use]
    pub fn standard() -> Self {
        Self::new()
            .with(IntToStrConverter)
            .with(FloatToStrConverter)
            .with(BoolToStrConverter)
            .with(IntToFloatConverter)
    }

    /// Add a converter, builder style
    #[must_use]
    pub fn with(mut self, converter: impl ValueConverter + 'static) -> Self {
        self.register(Rc::new(converter));
        self
    }

    /// Add a converter. A converter with the same name is replaced.
    pub fn register(&mut self, converter: Rc<dyn ValueConverter>) {
        if let Some(existing) = self
            .converters
            .iter_mut()
            .find(|c| c.converter_name() == converter.converter_name())
        {
            tracing::debug!(
                converter = converter.converter_name(),
                "Replacing registered converter"
            );
            *existing = converter;
        } else {
            self.converters.push(converter);
        }
    }

    /// Look up a converter by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Rc<dyn ValueConverter>> {
        self.converters
            .iter()
            .find(|c| c.converter_name() == name)
            .cloned()
    }

    /// The fallback converter for a kind pair
    #[must_use]
    pub fn default_for(&self, source: ValueKind, target: ValueKind) -> Option<Rc<dyn ValueConverter>> {
        self.converters
            .iter()
            .find(|c| c.source_kind() == source && c.target_kind() == target)
            .cloned()
    }

    /// Names of all registered converters, in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.converters.iter().map(|c| c.converter_name())
    }

    /// Number of registered converters
    #[must_use]
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    /// Whether the set is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}

impl fmt::Debug for ConverterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
