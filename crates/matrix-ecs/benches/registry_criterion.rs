//! Registry benchmarks using criterion for historical comparison.

use std::hint::black_box;

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use matrix_ecs::{Capacities, DefaultType, Entity, IdentifierAllocator, Manager, TypeHandle};

#[derive(Clone, Copy, Default)]
struct Position {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Clone, Copy, Default)]
struct Velocity {
    x: f32,
    y: f32,
    z: f32,
}

fn manager_for(count: u64) -> Manager {
    let count = count as usize;
    Manager::new(Capacities {
        entities: count,
        components: count * 2,
        ..Capacities::default()
    })
    .unwrap()
}

/// Manager with `count` entities carrying Position and Velocity.
fn populated(count: u64) -> (Manager, TypeHandle, TypeHandle, Vec<Entity>) {
    let mut manager = manager_for(count);
    let position = manager.add_type(DefaultType::<Position>::shared()).unwrap();
    let velocity = manager.add_type(DefaultType::<Velocity>::shared()).unwrap();
    let entities: Vec<Entity> = (0..count)
        .map(|_| {
            let entity = manager.create_entity().unwrap();
            manager.create_component(entity, position).unwrap();
            manager.create_component(entity, velocity).unwrap();
            entity
        })
        .collect();
    (manager, position, velocity, entities)
}

fn allocator_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("identifier");

    for count in [100, 1000, 10000] {
        group.throughput(Throughput::Elements(count));

        group.bench_with_input(BenchmarkId::new("fill", count), &count, |b, &count| {
            b.iter(|| {
                let mut ids = IdentifierAllocator::new(count as usize);
                while let Some(id) = ids.next() {
                    black_box(ids.add(id));
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("churn", count), &count, |b, &count| {
            b.iter_batched(
                || {
                    let mut ids = IdentifierAllocator::new(count as usize);
                    for id in 0..count as usize {
                        ids.add(id);
                    }
                    ids
                },
                |mut ids| {
                    for id in (0..count as usize).step_by(2) {
                        ids.delete(id);
                    }
                    while let Some(id) = ids.next() {
                        black_box(ids.add(id));
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn entity_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("entity");

    for count in [100, 1000, 10000] {
        group.throughput(Throughput::Elements(count));

        group.bench_with_input(BenchmarkId::new("create", count), &count, |b, &count| {
            b.iter(|| {
                let mut manager = manager_for(count);
                for _ in 0..count {
                    black_box(manager.create_entity().unwrap());
                }
            });
        });

        group.bench_with_input(
            BenchmarkId::new("delete_cascade", count),
            &count,
            |b, &count| {
                b.iter_batched(
                    || populated(count),
                    |(mut manager, _, _, entities)| {
                        for entity in entities {
                            manager.delete_entity(entity).unwrap();
                        }
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

fn component_access_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("component_access");

    for count in [100, 1000, 10000] {
        group.throughput(Throughput::Elements(count));

        let (manager, position, _, entities) = populated(count);
        group.bench_with_input(
            BenchmarkId::new("component_data", count),
            &entities,
            |b, entities| {
                b.iter(|| {
                    for &entity in entities {
                        black_box(manager.component_data::<Position>(entity, position).unwrap());
                    }
                });
            },
        );

        let (mut manager, position, velocity, entities) = populated(count);
        group.bench_with_input(BenchmarkId::new("integrate", count), &entities, |b, entities| {
            b.iter(|| {
                for &entity in entities {
                    let step = *manager.component_data::<Velocity>(entity, velocity).unwrap();
                    let pos = manager
                        .component_data_mut::<Position>(entity, position)
                        .unwrap();
                    pos.x += step.x;
                    pos.y += step.y;
                    pos.z += step.z;
                }
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    allocator_benchmarks,
    entity_benchmarks,
    component_access_benchmarks,
);

criterion_main!(benches);
