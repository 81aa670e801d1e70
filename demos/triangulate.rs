// Two-camera triangulation: generate per-pixel rays for a stereo pair, move
// them into the world frame, and intersect corresponding rays.

fn main() {
    use line_geom::{intersect_lines, IntrinsicModel, RigidTransform};
    use nalgebra::Vector3;

    // A small shared camera model.
    let camera = IntrinsicModel::<f64>::new(50.0, 50.0, 8.0, 6.0, 16, 12).unwrap();
    let rays = camera.generate_rays();

    // Left camera 100 mm left of the world origin, right camera 100 mm right
    // and toed in by 5 degrees.
    let mut left_to_world = RigidTransform::identity();
    left_to_world.set_translation(Vector3::new(-100.0, 0.0, 0.0));
    left_to_world.set_frames("left-camera", "world");

    let mut right_to_world = RigidTransform::identity();
    right_to_world.set_euler_degrees(Vector3::new(0.0, -5.0, 0.0));
    right_to_world.set_translation(Vector3::new(100.0, 0.0, 0.0));
    right_to_world.set_frames("right-camera", "world");

    let left_rays = rays.transform(&left_to_world);
    let right_rays = rays.transform(&right_to_world);

    // Intersect corresponding rays pairwise.
    let result = intersect_lines(&left_rays, &right_rays).unwrap();
    if result.any_parallel() {
        println!("warning: some ray pairs were parallel");
    }

    let center = left_rays.len() / 2;
    println!(
        "center pair midpoint: ({:.2}, {:.2}, {:.2}), separation {:.3}",
        result.midpoints[(center, 0)],
        result.midpoints[(center, 1)],
        result.midpoints[(center, 2)],
        result.distances[center],
    );
}
