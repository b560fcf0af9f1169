//! Conversion of simulation collision shapes into planning-world entries.
//!
//! # Conventions
//!
//! The engine and the planning geometry disagree on two things:
//!
//! - **Round shapes.** Engine capsules and cylinders extend along their local
//!   X axis, planning ones along Z. The stored local pose is post-multiplied by
//!   a +90 degree rotation about Y, which maps the planning Z axis onto the
//!   engine X axis.
//! - **Planes.** An engine plane is a half-space whose outward normal is the X
//!   axis of its pose. The planning half-space stores normal and offset
//!   directly, so its local pose becomes the identity.

use crate::collision::{CollisionShape, FclObject};
use crate::error::{BridgeError, Result};
use crate::geometry::{BvhModel, CollisionGeometry};
use crate::identity::{EntityRef, unique_name};
use crate::pose::Pose;
use crate::sim::{CollisionBody, SimGeometry, SimShape};
use glam::Quat;
use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

/// Rotation taking planning round shapes (along Z) onto engine ones (along X).
pub fn round_shape_fixup() -> Pose {
    Pose::from_rotation(Quat::from_rotation_y(FRAC_PI_2))
}

/// Converts every collision shape of `body` into one planning entry.
///
/// Returns `Ok(None)` when the body has no collision shapes; such bodies do
/// not take part in collision checking. Shape order is preserved.
pub fn convert_body<B: CollisionBody + ?Sized>(body: &B) -> Result<Option<FclObject>> {
    let shapes = body.collision_shapes();
    if shapes.is_empty() {
        return Ok(None);
    }

    let converted = shapes
        .iter()
        .map(|shape| convert_shape(shape, body.body_name()))
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(FclObject::new(
        entry_name(body)?,
        body.world_pose(),
        converted,
    )))
}

/// Links keep their plain name (unique within an articulation); free bodies
/// get their unique name.
fn entry_name<B: CollisionBody + ?Sized>(body: &B) -> Result<String> {
    match body.entity() {
        EntityRef::Link(link) => Ok(link.name.clone()),
        entity => unique_name(entity),
    }
}

/// Converts a single shape. `body` is only used for error messages.
pub fn convert_shape(shape: &SimShape, body: &str) -> Result<CollisionShape> {
    let mut local_pose = shape.local_pose;

    let geometry = match &shape.geometry {
        SimGeometry::Box { half_size } => CollisionGeometry::Box {
            side: *half_size * 2.0,
        },
        SimGeometry::Sphere { radius } => CollisionGeometry::Sphere { radius: *radius },
        SimGeometry::Capsule {
            radius,
            half_length,
        } => {
            local_pose *= round_shape_fixup();
            CollisionGeometry::Capsule {
                radius: *radius,
                lz: half_length * 2.0,
            }
        }
        SimGeometry::Cylinder {
            radius,
            half_length,
        } => {
            local_pose *= round_shape_fixup();
            CollisionGeometry::Cylinder {
                radius: *radius,
                lz: half_length * 2.0,
            }
        }
        SimGeometry::ConvexMesh {
            vertices,
            triangles,
            scale,
        } => CollisionGeometry::Convex {
            vertices: vertices.iter().map(|v| *v * *scale).collect(),
            faces: triangles.clone(),
        },
        SimGeometry::TriangleMesh {
            vertices,
            triangles,
        } => {
            let mut model = BvhModel::new();
            model.begin_model()?;
            model.add_sub_model(vertices, triangles)?;
            model.end_model()?;
            CollisionGeometry::bvh(model)?
        }
        SimGeometry::Plane => {
            let n = local_pose.x_axis();
            let d = n.dot(local_pose.p);
            local_pose = Pose::IDENTITY;
            CollisionGeometry::Halfspace { n, d }
        }
        SimGeometry::Unsupported { kind } => {
            return Err(BridgeError::unsupported_shape(kind.as_str(), body));
        }
    };

    Ok(CollisionShape {
        geometry: Arc::new(geometry),
        local_pose,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn shape(geometry: SimGeometry) -> SimShape {
        SimShape::new(geometry, Pose::IDENTITY)
    }

    #[test]
    fn box_half_extents_double() {
        let converted = convert_shape(
            &shape(SimGeometry::Box {
                half_size: Vec3::new(0.1, 0.2, 0.3),
            }),
            "crate",
        )
        .unwrap();
        assert_eq!(
            *converted.geometry,
            CollisionGeometry::Box {
                side: Vec3::new(0.2, 0.4, 0.6)
            }
        );
        assert_eq!(converted.local_pose, Pose::IDENTITY);
    }

    #[test]
    fn cylinder_gets_full_length_and_fixup() {
        let converted = convert_shape(
            &shape(SimGeometry::Cylinder {
                radius: 0.05,
                half_length: 0.25,
            }),
            "can",
        )
        .unwrap();
        assert_eq!(
            *converted.geometry,
            CollisionGeometry::Cylinder {
                radius: 0.05,
                lz: 0.5
            }
        );
        // Planning height axis (Z) lands on the engine height axis (X).
        assert!(converted.local_pose.z_axis().abs_diff_eq(Vec3::X, 1e-6));
    }

    #[test]
    fn convex_vertices_scaled_faces_kept() {
        let converted = convert_shape(
            &shape(SimGeometry::ConvexMesh {
                vertices: vec![Vec3::new(1.0, 1.0, 1.0), Vec3::new(-1.0, 0.5, 2.0)],
                triangles: vec![[0, 1, 0]],
                scale: Vec3::new(2.0, 3.0, 0.5),
            }),
            "rock",
        )
        .unwrap();
        match converted.geometry.as_ref() {
            CollisionGeometry::Convex { vertices, faces } => {
                assert_eq!(vertices[0], Vec3::new(2.0, 3.0, 0.5));
                assert_eq!(vertices[1], Vec3::new(-2.0, 1.5, 1.0));
                assert_eq!(faces, &vec![[0, 1, 0]]);
            }
            other => panic!("expected convex, got {}", other.kind()),
        }
    }

    #[test]
    fn unsupported_shape_fails() {
        let err = convert_shape(
            &shape(SimGeometry::Unsupported {
                kind: "heightfield".into(),
            }),
            "terrain",
        )
        .unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedShape { .. }));
    }
}
