// tests/conversion.rs
mod common;

use common::sphere;
use glam::{Quat, Vec3};
use simplan_bridge::{
    BridgeError, CollisionGeometry, Pose, SimActor, SimGeometry, SimLink, SimShape, convert_body,
};
use std::f32::consts::FRAC_PI_2;

fn actor(shapes: Vec<SimShape>) -> SimActor {
    SimActor {
        name: "crate".into(),
        per_scene_id: 7,
        pose: Pose::from_translation(Vec3::new(1.0, 2.0, 3.0)),
        collision_shapes: shapes,
    }
}

#[test]
fn test_body_without_shapes_has_no_entry() {
    let entry = convert_body(&actor(Vec::new())).unwrap();
    assert!(entry.is_none(), "Shapeless bodies are not collision participants");
}

#[test]
fn test_shapes_keep_count_and_order() {
    let shapes = vec![
        sphere(0.1),
        SimShape::new(
            SimGeometry::Box {
                half_size: Vec3::splat(0.5),
            },
            Pose::from_translation(Vec3::X),
        ),
        SimShape::new(
            SimGeometry::Capsule {
                radius: 0.05,
                half_length: 0.2,
            },
            Pose::IDENTITY,
        ),
    ];
    let entry = convert_body(&actor(shapes)).unwrap().unwrap();

    assert_eq!(entry.name, "crate_7");
    assert_eq!(entry.pose.p, Vec3::new(1.0, 2.0, 3.0), "Entry takes the body pose");
    assert_eq!(entry.shapes.len(), 3);
    let kinds: Vec<_> = entry.shapes.iter().map(|s| s.geometry.kind()).collect();
    assert_eq!(kinds, ["sphere", "box", "capsule"]);
    assert_eq!(entry.shapes[1].local_pose.p, Vec3::X);
}

#[test]
fn test_capsule_axis_fixup() {
    let entry = convert_body(&actor(vec![SimShape::new(
        SimGeometry::Capsule {
            radius: 0.05,
            half_length: 0.2,
        },
        Pose::IDENTITY,
    )]))
    .unwrap()
    .unwrap();
    let shape = &entry.shapes[0];

    assert_eq!(
        *shape.geometry,
        CollisionGeometry::Capsule {
            radius: 0.05,
            lz: 0.4
        }
    );
    let expected = Pose::from_rotation(Quat::from_rotation_y(FRAC_PI_2));
    assert!(shape.local_pose.abs_diff_eq(&expected, 1e-6));
    // The planning height axis (local Z) now lies along the engine height axis (X).
    assert!(shape.local_pose.z_axis().abs_diff_eq(Vec3::X, 1e-6));
    assert!(shape.local_pose.x_axis().abs_diff_eq(-Vec3::Z, 1e-6));
}

#[test]
fn test_fixup_composes_with_local_pose() {
    let local = Pose::from_rotation(Quat::from_rotation_z(FRAC_PI_2));
    let entry = convert_body(&actor(vec![SimShape::new(
        SimGeometry::Cylinder {
            radius: 0.05,
            half_length: 0.2,
        },
        local,
    )]))
    .unwrap()
    .unwrap();
    // Engine X axis after a 90 degree yaw is world Y.
    assert!(entry.shapes[0].local_pose.z_axis().abs_diff_eq(Vec3::Y, 1e-6));
}

#[test]
fn test_plane_becomes_halfspace() {
    let d = 0.75;
    // Local X mapped onto world Z, translated along it.
    let plane_pose = Pose::new(Vec3::Z * d, Quat::from_rotation_y(-FRAC_PI_2));
    assert!(plane_pose.x_axis().abs_diff_eq(Vec3::Z, 1e-6));

    let entry = convert_body(&actor(vec![SimShape::new(SimGeometry::Plane, plane_pose)]))
        .unwrap()
        .unwrap();
    let shape = &entry.shapes[0];

    match shape.geometry.as_ref() {
        CollisionGeometry::Halfspace { n, d: offset } => {
            assert!(n.abs_diff_eq(Vec3::Z, 1e-6), "normal was {n}");
            assert!((offset - d).abs() < 1e-6, "offset was {offset}");
        }
        other => panic!("Expected a half-space, got {}", other.kind()),
    }
    assert_eq!(shape.local_pose, Pose::IDENTITY);
}

#[test]
fn test_triangle_mesh_builds_bvh() {
    let entry = convert_body(&actor(vec![SimShape::new(
        SimGeometry::TriangleMesh {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z],
            triangles: vec![[0, 1, 2], [0, 1, 3]],
        },
        Pose::IDENTITY,
    )]))
    .unwrap()
    .unwrap();

    match entry.shapes[0].geometry.as_ref() {
        CollisionGeometry::Bvh(model) => {
            assert!(model.is_ready());
            assert_eq!(model.num_vertices(), 4);
            assert_eq!(model.num_triangles(), 2);
        }
        other => panic!("Expected a BVH, got {}", other.kind()),
    }
}

#[test]
fn test_bad_triangle_mesh_fails() {
    let err = convert_body(&actor(vec![SimShape::new(
        SimGeometry::TriangleMesh {
            vertices: vec![Vec3::ZERO, Vec3::X],
            triangles: vec![[0, 1, 2]],
        },
        Pose::IDENTITY,
    )]))
    .unwrap_err();
    assert!(matches!(err, BridgeError::InvalidGeometry(_)), "got {err}");
}

#[test]
fn test_link_entry_uses_plain_name() {
    let link = SimLink {
        name: "panda_hand".into(),
        per_scene_id: 42,
        pose: Pose::IDENTITY,
        collision_shapes: vec![sphere(0.05)],
    };
    let entry = convert_body(&link).unwrap().unwrap();
    assert_eq!(entry.name, "panda_hand");
}

#[test]
fn test_unsupported_shape_is_not_dropped() {
    let err = convert_body(&actor(vec![
        sphere(0.1),
        SimShape::new(
            SimGeometry::Unsupported {
                kind: "sdf".into(),
            },
            Pose::IDENTITY,
        ),
    ]))
    .unwrap_err();
    match err {
        BridgeError::UnsupportedShape { kind, body } => {
            assert_eq!(kind, "sdf");
            assert_eq!(body, "crate");
        }
        other => panic!("Unexpected error: {other}"),
    }
}
