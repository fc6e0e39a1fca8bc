//! Benchmarks for property change dispatch
//!
//! Measures the cost of a view-model change reaching its bound elements as
//! the number of bound elements grows, and the cost of binding a view.

use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use tether_core::{ObservableValue, PropertyNotifier, ViewModel, ViewModelDescriptor};
use tether_view::element::{VisualElement, TEXT_PATH};
use tether_view::{ElementHandle, ViewController};

struct Ticker {
    notifier: PropertyNotifier,
    ticks: ObservableValue<i64>,
    label: ObservableValue<String>,
}

impl ViewModel for Ticker {
    fn notifier(&self) -> &PropertyNotifier {
        &self.notifier
    }

    fn describe(members: &mut ViewModelDescriptor<Self>) {
        members
            .property(
                "Ticks",
                |vm: &Ticker| vm.ticks.get(),
                |vm: &Ticker, v| {
                    vm.notifier.set_property(&vm.ticks, "Ticks", v);
                },
            )
            .read_only("Label", |vm: &Ticker| vm.label.get());
    }
}

fn ticker() -> Rc<Ticker> {
    Rc::new(Ticker {
        notifier: PropertyNotifier::new(),
        ticks: ObservableValue::new(0),
        label: ObservableValue::new("ticks".to_string()),
    })
}

/// A tree where half the labels show `Ticks` and half show `Label`
fn tree(labels: usize) -> ElementHandle {
    let mut root = VisualElement::container("root");
    for i in 0..labels {
        let property = if i % 2 == 0 { "Ticks" } else { "Label" };
        root = root.with_child(
            VisualElement::label(format!("label-{i}"))
                .with_attribute(TEXT_PATH, property)
                .into_handle(),
        );
    }
    root.into_handle()
}

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");

    for labels in [10, 100, 1_000] {
        let vm = ticker();
        let mut controller = ViewController::new(tree(labels), Rc::clone(&vm));
        controller.on_enable().expect("bind benchmark view");

        group.throughput(Throughput::Elements((labels / 2) as u64));
        group.bench_with_input(BenchmarkId::new("set_property", labels), &labels, |b, _| {
            let mut next = 0_i64;
            b.iter(|| {
                next += 1;
                vm.notifier.set_property(&vm.ticks, "Ticks", black_box(next));
            });
        });
    }

    group.finish();
}

fn bench_bind(c: &mut Criterion) {
    let mut group = c.benchmark_group("bind");

    for labels in [10, 100, 1_000] {
        group.bench_with_input(BenchmarkId::new("on_enable", labels), &labels, |b, &labels| {
            b.iter(|| {
                let mut controller = ViewController::new(tree(labels), ticker());
                controller.on_enable().expect("bind benchmark view");
                black_box(controller.view().adapter_count())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_dispatch, bench_bind);
criterion_main!(benches);
