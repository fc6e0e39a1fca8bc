//! The binding registry
//!
//! A [`BindingView`] owns the adapters of one view and routes property
//! change notifications to exactly the adapters bound to the changed
//! property. It moves through a fixed set of phases:
//!
//! ```text
//! Unconfigured -> Configured -> Enabled <-> Disabled
//!                      \            \          /
//!                       +------------+--> Disposed
//! ```
//!
//! Only an enabled view is subscribed to its view-model and listening to
//! its elements. Disposal is terminal and idempotent.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use tether_core::{ObjectProvider, Subscription, ViewModel};

use crate::adapter::{AdapterId, BindingAdapter};
use crate::config::ConversionErrorPolicy;
use crate::diagnostics::{BindingDiagnostic, DiagnosticSink};
use crate::element::ElementHandle;
use crate::error::{ViewError, ViewResult};
use crate::wrapper::ElementWrapper;

/// Lifecycle phase of a view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPhase {
    /// Created, no view-model yet
    Unconfigured,
    /// View-model attached, not yet enabled
    Configured,
    /// Subscribed and listening
    Enabled,
    /// Temporarily detached
    Disabled,
    /// Torn down for good
    Disposed,
}

type SharedAdapter<VM> = Rc<BindingAdapter<VM>>;

struct Registry<VM: ViewModel> {
    adapters: BTreeMap<AdapterId, SharedAdapter<VM>>,
    by_property: HashMap<String, BTreeMap<AdapterId, SharedAdapter<VM>>>,
}

impl<VM: ViewModel> Default for Registry<VM> {
    fn default() -> Self {
        Self {
            adapters: BTreeMap::new(),
            by_property: HashMap::new(),
        }
    }
}

impl<VM: ViewModel> Registry<VM> {
    fn insert(&mut self, adapter: &SharedAdapter<VM>) {
        self.adapters.insert(adapter.id(), Rc::clone(adapter));
        for property in adapter.bound_properties() {
            self.by_property
                .entry(property.to_string())
                .or_default()
                .insert(adapter.id(), Rc::clone(adapter));
        }
    }

    fn subscribers(&self, property: &str) -> Vec<SharedAdapter<VM>> {
        self.by_property
            .get(property)
            .map(|set| set.values().cloned().collect())
            .unwrap_or_default()
    }

    fn all(&self) -> Vec<SharedAdapter<VM>> {
        self.adapters.values().cloned().collect()
    }
}

struct Context<VM: ViewModel> {
    provider: Rc<ObjectProvider<VM>>,
    wrapper: Rc<dyn ElementWrapper<VM>>,
}

/// Registry of the adapters bound to one view-model
pub struct BindingView<VM: ViewModel> {
    phase: ViewPhase,
    context: Option<Context<VM>>,
    registry: Rc<RefCell<Registry<VM>>>,
    subscription: Option<Subscription>,
    sink: DiagnosticSink,
}

impl<VM: ViewModel> BindingView<VM> {
    /// Create an unconfigured view that logs conversion failures
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(ConversionErrorPolicy::default())
    }

    /// Create an unconfigured view with the given conversion error policy
    #[must_use]
    pub fn with_policy(policy: ConversionErrorPolicy) -> Self {
        Self {
            phase: ViewPhase::Unconfigured,
            context: None,
            registry: Rc::new(RefCell::new(Registry::default())),
            subscription: None,
            sink: DiagnosticSink::new(policy),
        }
    }

    /// Attach the view-model, its provider and the element wrapper.
    ///
    /// The provider must be bound to `view_model`.
    pub fn configure(
        &mut self,
        view_model: &Rc<VM>,
        provider: Rc<ObjectProvider<VM>>,
        wrapper: Rc<dyn ElementWrapper<VM>>,
    ) -> ViewResult<()> {
        match self.phase {
            ViewPhase::Unconfigured => {}
            ViewPhase::Disposed => return Err(ViewError::Disposed),
            _ => return Err(ViewError::AlreadyConfigured),
        }
        if !Rc::ptr_eq(view_model, provider.view_model()) {
            return Err(ViewError::ProviderMismatch);
        }

        self.context = Some(Context { provider, wrapper });
        self.phase = ViewPhase::Configured;
        tracing::debug!(view_model = VM::type_name(), "View configured");
        Ok(())
    }

    /// Wrap `element` and register the resulting adapter.
    ///
    /// Declarations that name unknown members fail here, before anything is
    /// registered.
    pub fn register_element(&mut self, element: &ElementHandle, push_initial: bool) -> ViewResult<SharedAdapter<VM>> {
        let context = self.context()?;
        let adapter = Rc::new(context.wrapper.wrap(element, &context.provider)?);
        self.register_adapter(Rc::clone(&adapter), push_initial)?;
        Ok(adapter)
    }

    /// Register an adapter under each property it binds.
    ///
    /// Registering the same adapter again changes nothing.
    pub fn register_adapter(&mut self, adapter: SharedAdapter<VM>, push_initial: bool) -> ViewResult<()> {
        self.context()?;

        self.registry.borrow_mut().insert(&adapter);
        if self.phase == ViewPhase::Enabled {
            adapter.attach(&self.sink);
        }
        if push_initial {
            adapter.update_values(&self.sink);
        }

        tracing::debug!(
            element = adapter.element_name(),
            properties = ?adapter.bound_properties(),
            "Registered element"
        );
        Ok(())
    }

    /// Subscribe to the view-model and start listening to elements
    pub fn enable(&mut self) -> ViewResult<()> {
        if self.phase == ViewPhase::Enabled {
            return Ok(());
        }
        let view_model = Rc::clone(self.context()?.provider.view_model());

        let registry = Rc::downgrade(&self.registry);
        let sink = self.sink.clone();
        self.subscription = Some(view_model.subscribe(move |property| {
            if let Some(registry) = registry.upgrade() {
                dispatch(&registry, property, &sink);
            }
        }));

        let adapters = self.registry.borrow().all();
        for adapter in &adapters {
            adapter.attach(&self.sink);
        }

        self.phase = ViewPhase::Enabled;
        tracing::debug!(adapters = adapters.len(), "View enabled");
        Ok(())
    }

    /// Unsubscribe and stop listening. Does nothing unless enabled.
    pub fn disable(&mut self) {
        if self.phase != ViewPhase::Enabled {
            return;
        }
        self.detach_all();
        self.phase = ViewPhase::Disabled;
        tracing::debug!("View disabled");
    }

    /// Push the current value of `property` into every adapter bound to it.
    /// Does nothing unless enabled.
    pub fn on_property_changed(&self, property: &str) {
        if self.phase != ViewPhase::Enabled {
            return;
        }
        dispatch(&self.registry, property, &self.sink);
    }

    /// Push every bound property into every adapter
    pub fn refresh(&self) {
        let adapters = self.registry.borrow().all();
        for adapter in adapters {
            adapter.update_values(&self.sink);
        }
    }

    /// Release the view-model, all adapters and all listeners
    pub fn dispose(&mut self) {
        if self.phase == ViewPhase::Disposed {
            return;
        }
        self.detach_all();
        let released = std::mem::take(&mut *self.registry.borrow_mut());
        self.context = None;
        self.phase = ViewPhase::Disposed;
        tracing::debug!(adapters = released.adapters.len(), "View disposed");
    }

    #[must_use]
    pub fn phase(&self) -> ViewPhase {
        self.phase
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.phase == ViewPhase::Enabled
    }

    /// The bound view-model, until disposal
    #[must_use]
    pub fn view_model(&self) -> Option<&Rc<VM>> {
        self.context.as_ref().map(|c| c.provider.view_model())
    }

    /// The object provider, until disposal
    #[must_use]
    pub fn provider(&self) -> Option<&Rc<ObjectProvider<VM>>> {
        self.context.as_ref().map(|c| &c.provider)
    }

    /// Properties with at least one bound adapter, sorted
    #[must_use]
    pub fn bound_properties(&self) -> Vec<String> {
        let registry = self.registry.borrow();
        let mut names: Vec<String> = registry
            .by_property
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Number of adapters bound to `property`
    #[must_use]
    pub fn subscriber_count(&self, property: &str) -> usize {
        self.registry
            .borrow()
            .by_property
            .get(property)
            .map_or(0, BTreeMap::len)
    }

    /// Number of registered adapters
    #[must_use]
    pub fn adapter_count(&self) -> usize {
        self.registry.borrow().adapters.len()
    }

    /// Take the diagnostics queued under [`ConversionErrorPolicy::Report`]
    pub fn take_diagnostics(&self) -> Vec<BindingDiagnostic> {
        self.sink.take()
    }

    fn context(&self) -> ViewResult<&Context<VM>> {
        match self.phase {
            ViewPhase::Disposed => Err(ViewError::Disposed),
            _ => self.context.as_ref().ok_or(ViewError::NotConfigured),
        }
    }

    fn detach_all(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        let adapters = self.registry.borrow().all();
        for adapter in adapters {
            adapter.detach();
        }
    }
}

fn dispatch<VM: ViewModel>(registry: &RefCell<Registry<VM>>, property: &str, sink: &DiagnosticSink) {
    let subscribers = registry.borrow().subscribers(property);
    if subscribers.is_empty() {
        return;
    }
    tracing::trace!(property, adapters = subscribers.len(), "Dispatching property change");
    for adapter in subscribers {
        adapter.update_property(property, sink);
    }
}

impl<VM: ViewModel> Default for BindingView<VM> {
    fn default() -> Self {
        Self::new()
    }
}

impl<VM: ViewModel> Drop for BindingView<VM> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<VM: ViewModel> fmt::Debug for BindingView<VM> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingView")
            .field("view_model", &VM::type_name())
            .field("phase", &self.phase)
            .field("adapters", &self.adapter_count())
            .field("properties", &self.bound_properties())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::element::{input_text, VisualElement, CONVERTER, TEXT_PATH, VALUE_PATH};
    use crate::wrapper::DefaultElementWrapper;
    use tether_core::{
        ConversionError, ConverterSet, ObservableValue, PropertyNotifier, PropertyValueConverter, ViewModelDescriptor,
    };

    struct Person {
        notifier: PropertyNotifier,
        name: ObservableValue<String>,
        age: ObservableValue<i64>,
    }

    impl Person {
        fn set_name(&self, name: &str) {
            self.notifier.set_property(&self.name, "Name", name.to_string());
        }

        fn set_age(&self, age: i64) {
            self.notifier.set_property(&self.age, "Age", age);
        }
    }

    impl ViewModel for Person {
        fn notifier(&self) -> &PropertyNotifier {
            &self.notifier
        }

        fn describe(members: &mut ViewModelDescriptor<Self>) {
            members
                .property("Name", |vm: &Person| vm.name.get(), |vm: &Person, v: String| vm.set_name(&v))
                .property("Age", |vm: &Person| vm.age.get(), |vm: &Person, v| vm.set_age(v));
        }
    }

    fn person() -> Rc<Person> {
        Rc::new(Person {
            notifier: PropertyNotifier::new(),
            name: ObservableValue::new("Ada".to_string()),
            age: ObservableValue::new(36),
        })
    }

    fn configured(vm: &Rc<Person>) -> BindingView<Person> {
        let provider = Rc::new(ObjectProvider::new(Rc::clone(vm), ConverterSet::standard()).unwrap());
        let mut view = BindingView::new();
        view.configure(vm, provider, Rc::new(DefaultElementWrapper)).unwrap();
        view
    }

    fn label(property: &str) -> ElementHandle {
        VisualElement::label(property.to_lowercase())
            .with_attribute(TEXT_PATH, property)
            .into_handle()
    }

    #[test]
    fn test_phases() {
        let vm = person();
        let mut view = configured(&vm);
        assert_eq!(view.phase(), ViewPhase::Configured);

        view.enable().unwrap();
        assert!(view.is_enabled());
        view.disable();
        assert_eq!(view.phase(), ViewPhase::Disabled);
        view.enable().unwrap();
        assert_eq!(view.phase(), ViewPhase::Enabled);

        view.dispose();
        assert_eq!(view.phase(), ViewPhase::Disposed);
        view.dispose();
        assert_eq!(view.phase(), ViewPhase::Disposed);
    }

    #[test]
    fn test_configure_errors() {
        let vm = person();
        let mut view = configured(&vm);
        let provider = Rc::new(ObjectProvider::new(Rc::clone(&vm), ConverterSet::standard()).unwrap());
        assert_eq!(
            view.configure(&vm, provider, Rc::new(DefaultElementWrapper)),
            Err(ViewError::AlreadyConfigured)
        );

        let other = person();
        let provider = Rc::new(ObjectProvider::new(Rc::clone(&other), ConverterSet::standard()).unwrap());
        let mut fresh = BindingView::new();
        assert_eq!(
            fresh.configure(&vm, provider, Rc::new(DefaultElementWrapper)),
            Err(ViewError::ProviderMismatch)
        );
    }

    #[test]
    fn test_register_requires_configured_view() {
        let mut view: BindingView<Person> = BindingView::new();
        assert_eq!(
            view.register_element(&label("Name"), true).unwrap_err(),
            ViewError::NotConfigured
        );
        assert_eq!(view.enable(), Err(ViewError::NotConfigured));

        let vm = person();
        let mut view = configured(&vm);
        view.dispose();
        assert_eq!(
            view.register_element(&label("Name"), true).unwrap_err(),
            ViewError::Disposed
        );
        assert_eq!(view.enable(), Err(ViewError::Disposed));
    }

    #[test]
    fn test_register_pushes_initial_value() {
        let vm = person();
        let mut view = configured(&vm);

        let pushed = label("Name");
        view.register_element(&pushed, true).unwrap();
        assert_eq!(pushed.borrow().text(), "Ada");

        let untouched = label("Age");
        view.register_element(&untouched, false).unwrap();
        assert_eq!(untouched.borrow().text(), "");
    }

    #[test]
    fn test_register_same_adapter_twice() {
        let vm = person();
        let mut view = configured(&vm);
        let adapter = view.register_element(&label("Name"), true).unwrap();
        view.register_adapter(adapter, true).unwrap();
        assert_eq!(view.subscriber_count("Name"), 1);
        assert_eq!(view.adapter_count(), 1);
    }

    /// Text passthrough that counts conversions
    struct Echo {
        hits: Rc<Cell<usize>>,
    }

    impl PropertyValueConverter for Echo {
        type Source = String;
        type Target = String;

        fn name(&self) -> &str {
            "Echo"
        }

        fn convert(&self, value: String) -> String {
            self.hits.set(self.hits.get() + 1);
            value
        }

        fn try_convert_back(&self, value: String) -> Result<String, ConversionError> {
            Ok(value)
        }
    }

    #[test]
    fn test_register_same_element_twice() {
        let vm = person();
        let hits = Rc::new(Cell::new(0));
        let converters = ConverterSet::standard().with(Echo { hits: Rc::clone(&hits) });
        let provider = Rc::new(ObjectProvider::new(Rc::clone(&vm), converters).unwrap());
        let mut view = BindingView::new();
        view.configure(&vm, provider, Rc::new(DefaultElementWrapper)).unwrap();

        let name = VisualElement::label("name")
            .with_attribute(TEXT_PATH, "Name")
            .with_attribute(CONVERTER, "Echo")
            .into_handle();
        let first = view.register_element(&name, false).unwrap();
        let second = view.register_element(&name, false).unwrap();
        assert_ne!(first.id(), second.id());
        assert_eq!(view.subscriber_count("Name"), 2);
        assert_eq!(view.adapter_count(), 2);

        view.enable().unwrap();
        vm.set_name("Grace");
        assert_eq!(hits.get(), 2);
        assert_eq!(name.borrow().text(), "Grace");
    }

    #[test]
    fn test_busy_element_does_not_block_siblings() {
        let vm = person();
        let mut view = configured(&vm);
        let busy = label("Name");
        let sibling = VisualElement::label("caption")
            .with_attribute(TEXT_PATH, "Name")
            .into_handle();
        view.register_element(&busy, true).unwrap();
        view.register_element(&sibling, true).unwrap();
        view.enable().unwrap();

        {
            let _held = busy.borrow();
            vm.set_name("Grace");
        }
        assert_eq!(busy.borrow().text(), "Ada");
        assert_eq!(sibling.borrow().text(), "Grace");

        vm.set_name("Grace Hopper");
        assert_eq!(busy.borrow().text(), "Grace Hopper");
    }

    #[test]
    fn test_manual_change_ignored_unless_enabled() {
        let vm = person();
        let mut view = configured(&vm);
        let name = label("Name");
        view.register_element(&name, true).unwrap();

        vm.name.set_silently("Grace".to_string());
        view.on_property_changed("Name");
        assert_eq!(name.borrow().text(), "Ada");

        view.enable().unwrap();
        view.on_property_changed("Name");
        assert_eq!(name.borrow().text(), "Grace");

        view.disable();
        vm.name.set_silently("Ada".to_string());
        view.on_property_changed("Name");
        assert_eq!(name.borrow().text(), "Grace");
    }

    #[test]
    fn test_changes_routed_only_when_enabled() {
        let vm = person();
        let mut view = configured(&vm);
        let name = label("Name");
        let age = label("Age");
        view.register_element(&name, true).unwrap();
        view.register_element(&age, true).unwrap();

        vm.set_name("Grace");
        assert_eq!(name.borrow().text(), "Ada");

        view.enable().unwrap();
        vm.set_name("Grace Hopper");
        assert_eq!(name.borrow().text(), "Grace Hopper");
        assert_eq!(age.borrow().text(), "36");

        view.disable();
        assert_eq!(vm.notifier.subscriber_count(), 0);
        vm.set_age(40);
        assert_eq!(age.borrow().text(), "36");

        view.enable().unwrap();
        vm.set_age(41);
        assert_eq!(age.borrow().text(), "41");
    }

    #[test]
    fn test_enable_twice_subscribes_once() {
        let vm = person();
        let mut view = configured(&vm);
        view.enable().unwrap();
        view.enable().unwrap();
        assert_eq!(vm.notifier.subscriber_count(), 1);
    }

    #[test]
    fn test_register_while_enabled_attaches() {
        let vm = person();
        let mut view = configured(&vm);
        view.enable().unwrap();

        let field = VisualElement::text_field("age")
            .with_attribute(VALUE_PATH, "Age")
            .into_handle();
        view.register_element(&field, true).unwrap();
        input_text(&field, "50");
        assert_eq!(vm.age.get(), 50);
    }

    #[test]
    fn test_unbound_property_is_noop() {
        let vm = person();
        let mut view = configured(&vm);
        view.register_element(&label("Name"), true).unwrap();
        view.on_property_changed("Nickname");
        view.on_property_changed("");
        assert_eq!(view.bound_properties(), vec!["Name".to_string()]);
    }

    #[test]
    fn test_refresh_catches_up() {
        let vm = person();
        let mut view = configured(&vm);
        let name = label("Name");
        view.register_element(&name, true).unwrap();

        vm.set_name("Lin");
        view.refresh();
        assert_eq!(name.borrow().text(), "Lin");
    }

    #[test]
    fn test_dispose_releases_everything() {
        let vm = person();
        let mut view = configured(&vm);
        let field = VisualElement::text_field("name")
            .with_attribute(VALUE_PATH, "Name")
            .into_handle();
        view.register_element(&field, true).unwrap();
        view.enable().unwrap();
        assert_eq!(field.borrow().listener_count(), 1);

        view.dispose();
        assert_eq!(field.borrow().listener_count(), 0);
        assert_eq!(vm.notifier.subscriber_count(), 0);
        assert!(view.bound_properties().is_empty());
        assert!(view.view_model().is_none());
        assert_eq!(Rc::strong_count(&vm), 1);

        view.on_property_changed("Name");
    }

    #[test]
    fn test_drop_unsubscribes() {
        let vm = person();
        {
            let mut view = configured(&vm);
            view.enable().unwrap();
            assert_eq!(vm.notifier.subscriber_count(), 1);
        }
        assert_eq!(vm.notifier.subscriber_count(), 0);
    }
}
