//! Allocation benchmarks
//!
//! Compares the precomputed-plan and generic field initialization loops and
//! measures array and multi-array creation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use guest_heap::{
    AllocatorConfig, ClassBuilder, ClassDescriptor, CountingTracker, GuestAllocator, Meta, PrimitiveKind,
    SlotSpec, Specialization,
};
use std::sync::Arc;

fn allocator() -> (Arc<Meta>, GuestAllocator) {
    let meta = Meta::bootstrap();
    let allocator = GuestAllocator::new(
        Arc::clone(&meta),
        Arc::new(CountingTracker::new()),
        AllocatorConfig::default(),
    );
    (meta, allocator)
}

fn class_with_fields(count: usize) -> Arc<ClassDescriptor> {
    (0..count)
        .fold(ClassBuilder::new(format!("Bench{count}")), |builder, i| {
            let spec = match i % 3 {
                0 => SlotSpec::reference(format!("r{i}")),
                1 => SlotSpec::primitive(format!("p{i}"), PrimitiveKind::Long),
                _ => SlotSpec::reference(format!("h{i}")).hidden(),
            };
            builder.field(spec)
        })
        .build()
}

fn bench_instances(c: &mut Criterion) {
    let (_, allocator) = allocator();
    let mut group = c.benchmark_group("instances");

    for fields in [4, 16, 64, 256] {
        let class = class_with_fields(fields);
        allocator.create_instance(&class);

        group.bench_with_input(BenchmarkId::new("unrolled", fields), &class, |b, class| {
            b.iter(|| black_box(allocator.create_instance_specialized(class, Specialization::Unrolled)))
        });
        group.bench_with_input(BenchmarkId::new("generic", fields), &class, |b, class| {
            b.iter(|| black_box(allocator.create_instance_specialized(class, Specialization::Generic)))
        });
    }

    group.finish();
}

fn bench_arrays(c: &mut Criterion) {
    let (meta, allocator) = allocator();
    let mut group = c.benchmark_group("arrays");

    for length in [16, 1024, 65536] {
        group.bench_with_input(BenchmarkId::new("int", length), &length, |b, &length| {
            b.iter(|| black_box(allocator.create_primitive_array(PrimitiveKind::Int, length)))
        });
        group.bench_with_input(BenchmarkId::new("reference", length), &length, |b, &length| {
            b.iter(|| black_box(allocator.create_reference_array(&meta.object, length)))
        });
    }

    let int_2d = meta.primitive(PrimitiveKind::Int).array_class().array_class();
    group.bench_function("multi_8x8x8", |b| {
        b.iter(|| black_box(allocator.create_multi_array(&int_2d, &[8, 8, 8])))
    });

    group.finish();
}

criterion_group!(benches, bench_instances, bench_arrays);
criterion_main!(benches);
