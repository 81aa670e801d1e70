use criterion::{black_box, criterion_group, criterion_main, Criterion};
use line_geom::{intersect_lines, IntrinsicModel, RigidTransform};
use nalgebra::Vector3;

fn criterion_benchmark(c: &mut Criterion) {
    let mut camera = IntrinsicModel::<f64>::new(100.0, 102.0, 32.0, 24.0, 64, 48).unwrap();
    camera.skew = 0.1;
    camera.distortion = [0.05, -0.01, 0.001];

    let rays = camera.generate_rays();
    println!("{} rays", rays.len());

    let mut left_to_world = RigidTransform::<f64>::identity();
    left_to_world.set_translation(Vector3::new(-50.0, 0.0, 0.0));
    let mut right_to_world = RigidTransform::<f64>::identity();
    right_to_world.set_euler_degrees(Vector3::new(0.0, 5.0, 0.0));
    right_to_world.set_translation(Vector3::new(50.0, 0.0, 0.0));

    let left_rays = rays.transform(&left_to_world);
    let right_rays = rays.transform(&right_to_world);

    c.bench_function("generate_rays", |b| {
        b.iter(|| black_box(&camera).generate_rays());
    });

    c.bench_function("transform_rays", |b| {
        b.iter(|| black_box(&rays).transform(&left_to_world));
    });

    c.bench_function("intersect_lines", |b| {
        b.iter(|| intersect_lines(black_box(&left_rays), black_box(&right_rays)).unwrap());
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
