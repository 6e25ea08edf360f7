//! CRUD operation benchmarks

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use tessera_bench::data_gen::{employee_descriptor, generate_employee, generate_employees};
use tessera_bench::stores::backends;

fn bench_add_single(c: &mut Criterion) {
    let mut group = c.benchmark_group("CRUD/Add Single");

    for size in [100, 1_000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        for (backend, open) in backends() {
            group.bench_with_input(BenchmarkId::new(backend, size), size, |b, &size| {
                b.iter_batched(
                    || {
                        let ctx = open().unwrap();
                        let collection = ctx.db().collection(&employee_descriptor()).unwrap();
                        (ctx, collection)
                    },
                    |(_ctx, collection)| {
                        for i in 0..size {
                            collection.add(generate_employee(i)).unwrap();
                        }
                        black_box(collection.count().unwrap())
                    },
                    BatchSize::PerIteration,
                );
            });
        }
    }

    group.finish();
}

fn bench_add_many(c: &mut Criterion) {
    let mut group = c.benchmark_group("CRUD/Add Many");

    for size in [100, 1_000].iter() {
        let employees = generate_employees(*size);
        group.throughput(Throughput::Elements(*size as u64));
        for (backend, open) in backends() {
            group.bench_with_input(BenchmarkId::new(backend, size), &employees, |b, employees| {
                b.iter_batched(
                    || {
                        let ctx = open().unwrap();
                        let collection = ctx.db().collection(&employee_descriptor()).unwrap();
                        (ctx, collection, employees.clone())
                    },
                    |(_ctx, collection, employees)| {
                        black_box(collection.add_many(employees).unwrap())
                    },
                    BatchSize::PerIteration,
                );
            });
        }
    }

    group.finish();
}

fn bench_find_by_id(c: &mut Criterion) {
    let mut group = c.benchmark_group("CRUD/Find By Id");
    let size = 1_000;

    for (backend, open) in backends() {
        let ctx = open().unwrap();
        let collection = ctx.db().collection(&employee_descriptor()).unwrap();
        collection.add_many(generate_employees(size)).unwrap();

        let mut next = 0i64;
        group.bench_function(backend, |b| {
            b.iter(|| {
                next = (next + 7) % size as i64;
                black_box(collection.find(next).unwrap())
            })
        });
    }

    group.finish();
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("CRUD/Update");
    let size = 1_000;

    for (backend, open) in backends() {
        let ctx = open().unwrap();
        let collection = ctx.db().collection(&employee_descriptor()).unwrap();
        collection.add_many(generate_employees(size)).unwrap();

        let mut next = 0i64;
        group.bench_function(backend, |b| {
            b.iter(|| {
                next = (next + 13) % size as i64;
                black_box(
                    collection
                        .update(next, |mut e| {
                            e.salary += 1.0;
                            e.active = !e.active;
                            e
                        })
                        .unwrap(),
                )
            })
        });
    }

    group.finish();
}

fn bench_delete(c: &mut Criterion) {
    let mut group = c.benchmark_group("CRUD/Delete All");

    for size in [100, 1_000].iter() {
        let employees = generate_employees(*size);
        group.throughput(Throughput::Elements(*size as u64));
        for (backend, open) in backends() {
            group.bench_with_input(BenchmarkId::new(backend, size), &employees, |b, employees| {
                b.iter_batched(
                    || {
                        let ctx = open().unwrap();
                        let collection = ctx.db().collection(&employee_descriptor()).unwrap();
                        collection.add_many(employees.clone()).unwrap();
                        (ctx, collection)
                    },
                    |(_ctx, collection)| black_box(collection.delete_all().unwrap()),
                    BatchSize::PerIteration,
                );
            });
        }
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_add_single,
    bench_add_many,
    bench_find_by_id,
    bench_update,
    bench_delete
);
criterion_main!(benches);
