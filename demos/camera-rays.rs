// Generate rays for a distorted camera and inspect their angles to the
// optical axis.

fn main() {
    use line_geom::IntrinsicModel;

    let mut camera = IntrinsicModel::<f64>::new(400.0, 400.0, 320.0, 240.0, 640, 480).unwrap();
    camera.distortion = [-0.2, 0.05, 0.0];
    camera.pixel_size = 0.0048;
    camera.info = "demo camera".to_string();

    let (f_mm, _) = camera.focal_length_mm();
    let (fov_h, fov_v) = camera.perspective_angle();
    println!(
        "focal length {:.2} mm, field of view {:.1} x {:.1} degrees",
        f_mm,
        fov_h.to_degrees(),
        fov_v.to_degrees()
    );

    let rays = camera.generate_rays();
    let angles = rays.angle_to_z_axis();

    // Corner pixels carry the widest angles.
    let corner = rays.len() - 1;
    println!(
        "{} rays; center angle {:.3} deg, corner angle {:.3} deg",
        rays.len(),
        angles[(240 * 640) + 320],
        angles[corner],
    );
}
