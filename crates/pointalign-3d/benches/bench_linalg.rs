use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use glam::{DMat3, DVec3};
use pointalign_3d::{linalg, svd::svd3, transforms::se3_from_rt};

fn create_random_points(num_points: usize) -> Vec<[f64; 3]> {
    (0..num_points)
        .map(|_| {
            [
                rand::random::<f64>(),
                rand::random::<f64>(),
                rand::random::<f64>(),
            ]
        })
        .collect()
}

fn bench_transform_points(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform_points");

    for num_points in [1000, 10000, 100000, 500000].iter() {
        group.throughput(criterion::Throughput::Elements(*num_points as u64));
        let parameter_string = format!("{}", num_points);

        let src_points = create_random_points(*num_points);
        let rotation = DMat3::from_rotation_z(0.5);
        let translation = DVec3::new(0.1, 0.2, 0.3);

        group.bench_with_input(
            BenchmarkId::new("transform_points", &parameter_string),
            &src_points,
            |b, src| {
                let mut dst = vec![[0.0; 3]; src.len()];
                b.iter(|| {
                    linalg::transform_points(src, &rotation, &translation, &mut dst);
                    black_box(());
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("transform_points_inplace", &parameter_string),
            &src_points,
            |b, src| {
                let transform = se3_from_rt(&rotation, &translation);
                let mut points = src.clone();
                b.iter(|| {
                    linalg::transform_points_inplace(&mut points, &transform);
                    black_box(());
                });
            },
        );
    }
}

fn bench_svd3(c: &mut Criterion) {
    let mut group = c.benchmark_group("svd3");

    let a = DMat3::from_cols(
        DVec3::new(1.0, 4.0, 7.0),
        DVec3::new(2.0, 5.0, 8.0),
        DVec3::new(3.0, 6.0, 10.0),
    );

    group.bench_function(BenchmarkId::new("svd3", ""), |b| {
        b.iter(|| {
            black_box(svd3(&a));
        });
    });
}

criterion_group!(benches, bench_transform_points, bench_svd3);
criterion_main!(benches);
