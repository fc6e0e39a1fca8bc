//! Counter example: a text field, a label and two buttons bound to one
//! view-model, driven through a full host lifecycle
//!
//! Run with: cargo run --package tether-view --example counter

use std::rc::Rc;

use anyhow::Context;
use tether_core::{ObservableValue, PropertyNotifier, ViewModel, ViewModelDescriptor};
use tether_view::element::{click, find_by_name, input_text, VisualElement, COMMAND, TEXT_PATH, VALUE_PATH};
use tether_view::{BindingConfig, ConversionErrorPolicy, ElementHandle, ViewController};

struct CounterViewModel {
    notifier: PropertyNotifier,
    count: ObservableValue<i64>,
}

impl CounterViewModel {
    fn set_count(&self, count: i64) {
        if self.notifier.set_property(&self.count, "Count", count) {
            self.notifier.notify("Summary");
        }
    }
}

impl ViewModel for CounterViewModel {
    fn notifier(&self) -> &PropertyNotifier {
        &self.notifier
    }

    fn describe(members: &mut ViewModelDescriptor<Self>) {
        members
            .property("Count", |vm: &Self| vm.count.get(), |vm: &Self, v| vm.set_count(v))
            .read_only("Summary", |vm: &Self| format!("Clicked {} times", vm.count.get()))
            .command("Increment", |vm: &Self| vm.set_count(vm.count.get() + 1))
            .command_when(
                "Reset",
                |vm: &Self| vm.set_count(0),
                |vm: &Self| vm.count.get() != 0,
            );
    }
}

fn layout() -> ElementHandle {
    VisualElement::container("counter")
        .with_child(
            VisualElement::text_field("count")
                .with_attribute(VALUE_PATH, "Count")
                .into_handle(),
        )
        .with_child(
            VisualElement::label("summary")
                .with_attribute(TEXT_PATH, "Summary")
                .into_handle(),
        )
        .with_child(
            VisualElement::button("increment")
                .with_text("+")
                .with_attribute(COMMAND, "Increment")
                .into_handle(),
        )
        .with_child(
            VisualElement::button("reset")
                .with_text("Reset")
                .with_attribute(COMMAND, "Reset")
                .into_handle(),
        )
        .into_handle()
}

fn show(root: &ElementHandle) -> anyhow::Result<()> {
    let count = find_by_name(root, "count").context("count field missing")?;
    let summary = find_by_name(root, "summary").context("summary label missing")?;
    println!("[{}] {}", count.borrow().text(), summary.borrow().text());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let root = layout();
    let vm = Rc::new(CounterViewModel {
        notifier: PropertyNotifier::new(),
        count: ObservableValue::new(0),
    });

    let config = BindingConfig::default().with_conversion_errors(ConversionErrorPolicy::Report);
    let mut controller = ViewController::builder(Rc::clone(&root), Rc::clone(&vm))
        .config(config)
        .build();
    controller.on_enable().context("binding the counter view")?;
    show(&root)?;

    let increment = find_by_name(&root, "increment").context("increment button missing")?;
    for _ in 0..3 {
        click(&increment);
    }
    show(&root)?;

    let field = find_by_name(&root, "count").context("count field missing")?;
    input_text(&field, "41");
    click(&increment);
    show(&root)?;

    input_text(&field, "forty-two");
    show(&root)?;
    for diagnostic in controller.take_diagnostics() {
        println!("rejected input on '{}': {}", diagnostic.element, diagnostic.error);
    }

    controller.on_disable();
    controller.on_destroy();
    Ok(())
}
