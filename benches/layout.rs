use cloud_diagram_renderer::config::Config;
use cloud_diagram_renderer::graph::{Graph, Task};
use cloud_diagram_renderer::layout::pack_rects;
use cloud_diagram_renderer::{Resource, convert, default_registry};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

const VNET: &str = "microsoft.network/virtualnetworks";
const SUBNET: &str = "microsoft.network/virtualnetworks/subnets";
const NIC: &str = "microsoft.network/networkinterfaces";
const PIP: &str = "microsoft.network/publicipaddresses";
const VM: &str = "microsoft.compute/virtualmachines";

/// Virtual networks with two subnets each, every subnet holding `vms` machines
/// with a NIC and every other NIC carrying a public IP.
fn synthetic_estate(vnets: usize, vms: usize) -> Vec<Resource> {
    let mut out = Vec::new();
    for v in 0..vnets {
        let vnet = format!("vnet{v}");
        out.push(Resource::new(&vnet, VNET));
        for s in 0..2 {
            let subnet = format!("{vnet}/subnet{s}");
            out.push(Resource::new(&subnet, SUBNET).depends_on(&vnet));
            for m in 0..vms {
                let nic = format!("{subnet}/nic{m}");
                let mut nic_resource = Resource::new(&nic, NIC).depends_on(&subnet);
                if m % 2 == 0 {
                    let pip = format!("{subnet}/pip{m}");
                    out.push(Resource::new(&pip, PIP).attached_to(&nic));
                    nic_resource = nic_resource.depends_on(&pip);
                }
                out.push(nic_resource);
                out.push(Resource::new(&format!("{subnet}/vm{m}"), VM).depends_on(&nic));
            }
        }
    }
    out
}

/// A layered chain where every task depends on up to `fan` tasks of the
/// previous layer.
fn layered_labels(layers: usize, width: usize, fan: usize) -> Vec<(String, Vec<String>)> {
    let mut out = Vec::new();
    for layer in 0..layers {
        for i in 0..width {
            let refs = if layer == 0 {
                Vec::new()
            } else {
                (0..fan.min(width))
                    .map(|k| format!("t{}_{}", layer - 1, (i + k) % width))
                    .collect()
            };
            out.push((format!("t{layer}_{i}"), refs));
        }
    }
    out
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    for (layers, width) in [(10, 10), (20, 50), (50, 100)] {
        let labels = layered_labels(layers, width, 3);
        let name = format!("{layers}x{width}");
        group.bench_with_input(BenchmarkId::from_parameter(&name), &labels, |b, labels| {
            b.iter(|| {
                let mut count = 0usize;
                {
                    let counter = std::cell::Cell::new(0usize);
                    let tasks: Vec<Task<'_>> = labels
                        .iter()
                        .map(|(label, refs)| {
                            let counter = &counter;
                            Task::new(label.clone(), refs.clone(), move || {
                                counter.set(counter.get() + 1)
                            })
                        })
                        .collect();
                    let mut graph = Graph::new(tasks).expect("graph build failed");
                    graph.resolve_all();
                    count += counter.get();
                }
                black_box(count);
            });
        });
    }
    group.finish();
}

fn bench_packing(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack_rects");
    for n in [16usize, 256, 4096] {
        let sizes: Vec<(f32, f32)> = (0..n)
            .map(|i| (32.0 + (i % 7) as f32 * 11.0, 24.0 + (i % 5) as f32 * 13.0))
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &sizes, |b, sizes| {
            b.iter(|| {
                let packed = pack_rects(black_box(sizes), 20.0);
                black_box((packed.width, packed.height));
            });
        });
    }
    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_to_end");
    let config = Config::default();
    let registry = default_registry(&config).expect("registry build failed");
    for (vnets, vms) in [(1, 4), (4, 10), (10, 25)] {
        let resources = synthetic_estate(vnets, vms);
        let name = format!("{vnets}vnets_{vms}vms");
        group.bench_with_input(BenchmarkId::from_parameter(&name), &resources, |b, resources| {
            b.iter(|| {
                let converted = convert(
                    black_box(resources.clone()),
                    &registry,
                    &config.theme,
                    &config.layout,
                )
                .expect("conversion failed");
                black_box(converted.diagram.len());
            });
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_resolve, bench_packing, bench_end_to_end
);
criterion_main!(benches);
