//! Host lifecycle driver
//!
//! A [`ViewController`] connects a root element and a view-model to a
//! [`BindingView`] and forwards the host's lifecycle callbacks to it:
//! `init` binds every declared element, `on_enable` and `on_disable`
//! toggle change delivery, `on_destroy` tears everything down.

use std::fmt;
use std::rc::Rc;

use tether_core::{BindingResult, ConverterSet, ObjectProvider, ValueConverter, ViewModel};

use crate::config::BindingConfig;
use crate::diagnostics::BindingDiagnostic;
use crate::element::{query_bindable, ElementHandle};
use crate::error::{ViewError, ViewResult};
use crate::view::{BindingView, ViewPhase};
use crate::wrapper::{DefaultElementWrapper, ElementWrapper};

/// Builds the provider a controller binds through, from the binding
/// context and the configured converters
pub type ProviderFactory<VM> = Rc<dyn Fn(&Rc<VM>, &ConverterSet) -> BindingResult<ObjectProvider<VM>>>;

/// Drives a [`BindingView`] through the host's lifecycle
pub struct ViewController<VM: ViewModel> {
    root: ElementHandle,
    view_model: Rc<VM>,
    converters: ConverterSet,
    provider_factory: Option<ProviderFactory<VM>>,
    wrapper: Rc<dyn ElementWrapper<VM>>,
    config: BindingConfig,
    view: BindingView<VM>,
}

impl<VM: ViewModel> ViewController<VM> {
    /// Controller with the standard converters, default wrapper and config
    #[must_use]
    pub fn new(root: ElementHandle, view_model: Rc<VM>) -> Self {
        Self::builder(root, view_model).build()
    }

    /// Start building a controller
    #[must_use]
    pub fn builder(root: ElementHandle, view_model: Rc<VM>) -> ViewControllerBuilder<VM> {
        ViewControllerBuilder::new(root, view_model)
    }

    /// Bind every declared element under the root.
    ///
    /// With `validate_before_bind`, all declarations are checked first and
    /// every defect is reported together; nothing is registered unless all
    /// of them resolve. Returns the number of bound elements.
    pub fn init(&mut self) -> ViewResult<usize> {
        match self.view.phase() {
            ViewPhase::Unconfigured => {}
            ViewPhase::Disposed => return Err(ViewError::Disposed),
            _ => return Err(ViewError::AlreadyConfigured),
        }

        let provider = Rc::new(self.provider()?);
        let elements = query_bindable(&self.root);

        if self.config.validate_before_bind {
            self.validate(&provider, &elements)?;
        }

        self.view
            .configure(&self.view_model, provider, Rc::clone(&self.wrapper))?;
        for element in &elements {
            self.view
                .register_element(element, self.config.push_initial_values)?;
        }

        tracing::info!(
            view_model = VM::type_name(),
            elements = elements.len(),
            properties = self.view.bound_properties().len(),
            "View initialized"
        );
        Ok(elements.len())
    }

    /// Host enable callback. Initializes first if needed.
    pub fn on_enable(&mut self) -> ViewResult<()> {
        if self.view.phase() == ViewPhase::Unconfigured {
            self.init()?;
        }
        self.view.enable()
    }

    /// Host disable callback
    pub fn on_disable(&mut self) {
        self.view.disable();
    }

    /// Host destroy callback. Safe to call more than once.
    pub fn on_destroy(&mut self) {
        self.view.dispose();
    }

    #[must_use]
    pub fn root(&self) -> &ElementHandle {
        &self.root
    }

    /// The view-model the elements are bound to
    #[must_use]
    pub fn binding_context(&self) -> &Rc<VM> {
        &self.view_model
    }

    #[must_use]
    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    #[must_use]
    pub fn view(&self) -> &BindingView<VM> {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut BindingView<VM> {
        &mut self.view
    }

    /// Take the diagnostics queued by the view
    pub fn take_diagnostics(&self) -> Vec<BindingDiagnostic> {
        self.view.take_diagnostics()
    }

    fn provider(&self) -> BindingResult<ObjectProvider<VM>> {
        match &self.provider_factory {
            Some(factory) => factory(&self.view_model, &self.converters),
            None => ObjectProvider::new(Rc::clone(&self.view_model), self.converters.clone()),
        }
    }

    fn validate(&self, provider: &ObjectProvider<VM>, elements: &[ElementHandle]) -> ViewResult<()> {
        let mut requests = Vec::new();
        for element in elements {
            requests.extend(self.wrapper.requests(&element.borrow())?);
        }
        provider.validate(&requests).map_err(|errors| {
            tracing::warn!(count = errors.len(), "Binding validation failed");
            ViewError::Validation(errors)
        })
    }
}

impl<VM: ViewModel> fmt::Debug for ViewController<VM> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewController")
            .field("root", &self.root.borrow().name())
            .field("converters", &self.converters)
            .field("config", &self.config)
            .field("view", &self.view)
            .finish()
    }
}

/// Builder for [`ViewController`]
pub struct ViewControllerBuilder<VM: ViewModel> {
    root: ElementHandle,
    view_model: Rc<VM>,
    converters: ConverterSet,
    provider_factory: Option<ProviderFactory<VM>>,
    wrapper: Option<Rc<dyn ElementWrapper<VM>>>,
    config: BindingConfig,
}

impl<VM: ViewModel> ViewControllerBuilder<VM> {
    /// Create a builder using the standard converters
    #[must_use]
    pub fn new(root: ElementHandle, view_model: Rc<VM>) -> Self {
        Self {
            root,
            view_model,
            converters: ConverterSet::standard(),
            provider_factory: None,
            wrapper: None,
            config: BindingConfig::default(),
        }
    }

    /// Replace the converter set
    #[must_use]
    pub fn converters(mut self, converters: ConverterSet) -> Self {
        self.converters = converters;
        self
    }

    /// Add one converter to the set
    #[must_use]
    pub fn converter(mut self, converter: impl ValueConverter + 'static) -> Self {
        self.converters = self.converters.with(converter);
        self
    }

    /// Build the object provider with `factory` instead of
    /// [`ObjectProvider::new`]. The provider must resolve against the
    /// binding context it is handed.
    #[must_use]
    pub fn provider_factory(
        mut self,
        factory: impl Fn(&Rc<VM>, &ConverterSet) -> BindingResult<ObjectProvider<VM>> + 'static,
    ) -> Self {
        self.provider_factory = Some(Rc::new(factory));
        self
    }

    /// Use a custom element wrapper
    #[must_use]
    pub fn wrapper(mut self, wrapper: impl ElementWrapper<VM> + 'static) -> Self {
        self.wrapper = Some(Rc::new(wrapper));
        self
    }

    #[must_use]
    pub fn config(mut self, config: BindingConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the controller. Nothing is bound until `init` or `on_enable`.
    #[must_use]
    pub fn build(self) -> ViewController<VM> {
        let wrapper = self
            .wrapper
            .unwrap_or_else(|| Rc::new(DefaultElementWrapper));
        ViewController {
            root: self.root,
            view_model: self.view_model,
            converters: self.converters,
            provider_factory: self.provider_factory,
            wrapper,
            view: BindingView::with_policy(self.config.conversion_errors),
            config: self.config,
        }
    }
}
