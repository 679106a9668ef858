use glam::{Mat4, Vec3, Vec4};
use planar_reflection::reflection::{reflect_matrix, translate_matrix, MirrorMatrices};

const EPSILON: f32 = 1e-4;

const HEIGHTS: [f32; 5] = [-3.5, -0.25, 0.0, 1.0, 12.75];

fn sample_points(height: f32) -> Vec<Vec3> {
    let mut points = Vec::new();
    for x in [-4.0, 0.0, 2.5] {
        for z in [-6.0, 0.0, 3.0] {
            points.push(Vec3::new(x, height, z));
        }
    }
    points
}

#[test]
fn plane_points_are_fixed_without_thickness() {
    for h in HEIGHTS {
        let mirror = MirrorMatrices::new(h, 0.0);
        for p in sample_points(h) {
            let reflected = mirror.reflect_point(p);
            assert!(
                reflected.abs_diff_eq(p, EPSILON),
                "h={h}: {p:?} moved to {reflected:?}"
            );
        }
    }
}

#[test]
fn points_are_reflected_about_the_plane() {
    for h in HEIGHTS {
        let mirror = MirrorMatrices::new(h, 0.0);
        for d in [0.5, 1.0, 3.0, -2.0] {
            let p = Vec3::new(1.5, h + d, -2.0);
            let reflected = mirror.reflect_point(p);
            assert!(reflected.abs_diff_eq(Vec3::new(1.5, h - d, -2.0), EPSILON));
        }
    }
}

#[test]
fn thickness_lowers_the_effective_plane() {
    let mirror = MirrorMatrices::new(1.0, 0.25);
    // Reflection about y = h - t.
    let reflected = mirror.reflect_point(Vec3::new(0.0, 2.0, 0.0));
    assert!(reflected.abs_diff_eq(Vec3::new(0.0, -0.5, 0.0), EPSILON));
}

#[test]
fn reflect_is_an_involution() {
    let reflect = reflect_matrix();
    assert!((reflect * reflect).abs_diff_eq(Mat4::IDENTITY, 1e-6));
    assert_eq!(reflect.determinant(), -1.0);
}

#[test]
fn translations_compose_additively() {
    for (h1, t1, h2, t2) in [(1.0, 0.0, 2.0, 0.5), (-3.0, 0.25, 0.0, 0.0), (0.5, 1.0, -0.5, 2.0)] {
        let composed = translate_matrix(h1, t1) * translate_matrix(h2, t2);
        let summed = translate_matrix(h1 + h2, t1 + t2);
        assert!(composed.abs_diff_eq(summed, 1e-5));
    }
}

#[test]
fn translation_only_moves_y() {
    let m = translate_matrix(2.0, 0.5);
    let p = m.transform_point3(Vec3::new(1.0, 1.0, 1.0));
    assert!(p.abs_diff_eq(Vec3::new(1.0, -0.5, 1.0), 1e-6));
    assert_eq!(m.x_axis, Vec4::X);
    assert_eq!(m.z_axis, Vec4::Z);
}

#[test]
fn mirrored_view_translates_before_reflecting() {
    let base = Mat4::look_at_rh(Vec3::new(0.0, 3.0, 6.0), Vec3::ZERO, Vec3::Y);
    let mirror = MirrorMatrices::new(1.0, 0.0);
    let view = mirror.mirrored_view(base);
    assert!(view.abs_diff_eq(base * reflect_matrix() * translate_matrix(1.0, 0.0), 1e-6));

    // A point above the plane is seen where its mirror image would be, after
    // the plane has been moved to the origin.
    let p = Vec3::new(0.5, 2.0, 0.0);
    let seen = view.transform_point3(p);
    let expected = base.transform_point3(Vec3::new(0.5, -1.0, 0.0));
    assert!(seen.abs_diff_eq(expected, EPSILON));
}

#[test]
fn matrices_follow_settings() {
    let settings = planar_reflection::ReflectionSettings {
        plane_height: 2.0,
        plane_thickness: 0.5,
        ..Default::default()
    };
    let m = MirrorMatrices::from_settings(&settings);
    assert_eq!(m, MirrorMatrices::new(2.0, 0.5));
    assert!(m.translate.abs_diff_eq(translate_matrix(2.0, 0.5), 0.0));
}
